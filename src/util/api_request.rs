use crate::error::DeviceError;

pub enum Method {
    Get,
    /// contains request body
    Put(serde_json::Value)
}

/// send a request and parse the response as json.
/// non-success status codes are errors.
pub async fn send(client: &reqwest::Client, method: Method, url: &str) -> Result<serde_json::Value, DeviceError> {
    let request = match method {
        Method::Get        => client.get(url),
        Method::Put(body)  => client.put(url).json(&body)
    };

    let response = request.send().await?;
    let status = response.status();
    if !status.is_success() {
        return Err(DeviceError::Status(status));
    }

    Ok(response.json::<serde_json::Value>().await?)
}
