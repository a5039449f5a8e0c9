pub mod clock;
pub mod hue_api;
pub mod api_request;
