use std::future::Future;

use futures::future::join_all;

use crate::config::BridgeConfig;
use crate::constants::hue::{brightness, color_temperature};
use crate::control::phase::LightOutput;
use crate::error::DeviceError;
use crate::util::api_request::{send, Method};

/// body of `PUT /lights/<id>/state`
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub struct LightState {
    pub on: bool,
    /// from 1 to 254
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bri: Option<u8>,
    /// mireds from 153 (cool) to 500 (warm)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ct: Option<u16>,
}

impl LightState {
    pub const OFF: Self = Self { on: false, bri: None, ct: None };

    /// brightness of exactly 0 turns the light off instead of dimming it to 1
    #[allow(clippy::cast_sign_loss, clippy::cast_possible_truncation)]
    pub fn from_output(output: LightOutput) -> Self {
        if output.brightness == 0.0 {
            return Self::OFF;
        }

        let bri = (output.brightness * brightness::MAX)
            .clamp(brightness::MIN, brightness::MAX)
            .round() as u8;

        let range = color_temperature::WARMEST - color_temperature::COOLEST;
        let ct = output.coolness.mul_add(-range, color_temperature::WARMEST)
            .clamp(color_temperature::COOLEST, color_temperature::WARMEST)
            .round() as u16;

        Self { on: true, bri: Some(bri), ct: Some(ct) }
    }
}

/// how many lights took the last output
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ApplyReport {
    pub updated: usize,
    pub failed: usize,
}

/// local hue bridge, v1 api
#[derive(Debug, Clone)]
pub struct HueBridge {
    client: reqwest::Client,
    /// `http://<host>/api/<username>`
    base_url: String,
}

impl HueBridge {
    pub fn new(config: &BridgeConfig) -> Result<Self, DeviceError> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()?;
        Ok(Self {
            client,
            base_url: format!("http://{}/api/{}", config.host, config.username),
        })
    }

    /// ids of every light known to the bridge
    pub async fn list_lights(&self) -> Result<Vec<String>, DeviceError> {
        let url = format!("{}/lights", self.base_url);
        let json = send(&self.client, Method::Get, url.as_str()).await?;
        if let Some(error) = bridge_error(&json) {
            return Err(error);
        }

        let Some(lights) = json.as_object() else {
            return Err(DeviceError::UnexpectedResponse(json.to_string()));
        };
        Ok(lights.keys().cloned().collect())
    }

    /// only logs the state instead of setting it if the `hue_debug` feature is enabled
    pub async fn set_light_state(&self, id: &str, state: LightState) -> Result<(), DeviceError> {
        if cfg!(feature = "hue_debug") {
            tracing::debug!("not setting light {id} to {state:?}, hue_debug is enabled");
            return Ok(());
        }

        let url = format!("{}/lights/{id}/state", self.base_url);
        let body = serde_json::to_value(state)
            .map_err(|error| DeviceError::UnexpectedResponse(error.to_string()))?;
        let json = send(&self.client, Method::Put(body), url.as_str()).await?;
        bridge_error(&json).map_or(Ok(()), Err)
    }

    /// set every light to `output`. failing lights are logged and don't affect the others.
    /// only fails if the lights can't be listed.
    pub async fn apply_output(&self, output: LightOutput) -> Result<ApplyReport, DeviceError> {
        let ids = self.list_lights().await?;
        let state = LightState::from_output(output);

        let results = apply_to_all(ids, move |id| async move {
            self.set_light_state(&id, state).await
        }).await;
        Ok(report(&results))
    }
}

/// run `apply` for every id concurrently and gather every result, failures included
pub async fn apply_to_all<F, Fut>(ids: Vec<String>, apply: F) -> Vec<(String, Result<(), DeviceError>)>
where
    F: Fn(String) -> Fut,
    Fut: Future<Output = Result<(), DeviceError>>,
{
    join_all(ids.into_iter().map(|id| {
        let request = apply(id.clone());
        async move { (id, request.await) }
    })).await
}

/// log failures and count results
pub fn report(results: &[(String, Result<(), DeviceError>)]) -> ApplyReport {
    let mut report = ApplyReport::default();
    for (id, result) in results {
        match result {
            Ok(()) => report.updated += 1,
            Err(error) => {
                tracing::warn!("setting state of light {id} failed: {error}");
                report.failed += 1;
            }
        }
    }
    report
}

/// hue reports errors as `[{"error": {"type": 1, "description": "..."}}]`, even with status 200
fn bridge_error(json: &serde_json::Value) -> Option<DeviceError> {
    json.as_array()?
        .iter()
        .find_map(|entry| entry.get("error"))
        .map(|error| DeviceError::Bridge {
            kind: error["type"].as_u64().unwrap_or_default(),
            description: error["description"].as_str().unwrap_or("unknown").to_owned(),
        })
}
