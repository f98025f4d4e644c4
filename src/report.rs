//! Chat reports built from FoxESS Cloud responses.
//!
//! Each report owns exactly one vendor call. Whatever goes wrong while calling or rendering,
//! the user only ever sees the report's fixed [`Report::FAILURE`] text.

mod energy;
mod history;
mod real_time;
mod samples;
mod status;

use chrono::{DateTime, Local};
use reqwest::Method;
use serde::de::DeserializeOwned;

pub use self::{energy::Energy, history::History, real_time::RealTime, status::Status};
use crate::{
    api::foxess::{Cloud, Response},
    prelude::*,
};

/// Rendered in place of anything the response did not contain.
pub const NOT_AVAILABLE: &str = "N/A";

pub trait Report {
    const NAME: &'static str;

    /// Reply sent instead of the report when it could not be produced.
    const FAILURE: &'static str;

    const METHOD: Method;
    const PATH: &'static str;

    /// Expected structure of the envelope's `result`.
    type Payload: DeserializeOwned;

    fn params(serial_number: &str, now: DateTime<Local>) -> Result<serde_json::Value>;

    fn render(result: Self::Payload) -> Result<String>;
}

/// Check the envelope, parse the result, and render it.
pub fn format<R: Report>(response: serde_json::Value) -> Result<String> {
    let result = Result::<serde_json::Value>::from(Response::from_value(response)?)?;
    let result = serde_json::from_value::<R::Payload>(result)
        .with_context(|| format!("unexpected `{}` result structure", R::PATH))?;
    R::render(result)
}

pub async fn fetch<R: Report, C: Cloud + ?Sized>(
    cloud: &C,
    serial_number: &str,
    now: DateTime<Local>,
) -> Result<String> {
    let params = R::params(serial_number, now)?;
    let response = cloud.call(R::METHOD, R::PATH, params).await?;
    format::<R>(response)
}

/// Produce the report text, falling back to the fixed failure text.
#[instrument(skip_all, fields(report = R::NAME))]
pub async fn produce<R: Report, C: Cloud + ?Sized>(
    cloud: &C,
    serial_number: &str,
    now: DateTime<Local>,
) -> String {
    match fetch::<R, C>(cloud, serial_number, now).await {
        Ok(text) => text,
        Err(error) => {
            error!("failed to produce the report: {error:#}");
            R::FAILURE.to_owned()
        }
    }
}

/// Round to hundredths for display, never yielding a negative zero.
fn round(value: f64) -> f64 {
    (value * 100.0).round() / 100.0 + 0.0
}

const fn yes_no(value: bool) -> &'static str {
    if value { "Sim" } else { "Não" }
}
