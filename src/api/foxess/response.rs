use serde::Deserialize;

use crate::prelude::*;

/// Generic API response envelope.
///
/// The result is kept as [`serde_json::Value`] so that the envelope can be checked
/// before the caller commits to a particular result structure.
#[derive(Deserialize)]
pub struct Response {
    /// Error code (when the result is not equal to zero, the request failed).
    #[serde(rename = "errno")]
    error_code: i32,

    #[serde(rename = "msg")]
    message: Option<String>,

    #[serde(rename = "result", default)]
    result: serde_json::Value,
}

impl Response {
    pub fn from_value(value: serde_json::Value) -> Result<Self> {
        serde_json::from_value(value).context("the response is not a FoxESS Cloud envelope")
    }
}

impl From<Response> for Result<serde_json::Value> {
    fn from(response: Response) -> Self {
        if response.error_code == 0 {
            Ok(response.result)
        } else if let Some(message) = response.message {
            bail!(
                r#"FoxESS Cloud error {error_code} ("{message}")"#,
                error_code = response.error_code,
            )
        } else {
            bail!("FoxESS Cloud error {error_code}", error_code = response.error_code)
        }
    }
}
