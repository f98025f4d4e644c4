use std::collections::HashMap;

use super::{NOT_AVAILABLE, round};
use crate::api::foxess::RealTimeRawVariable;

/// Real-time samples keyed by their variable name.
pub struct Samples(HashMap<String, Reading>);

impl FromIterator<RealTimeRawVariable> for Samples {
    fn from_iter<T: IntoIterator<Item = RealTimeRawVariable>>(variables: T) -> Self {
        Self(variables.into_iter().map(|variable| (variable.name, Reading(variable.value))).collect())
    }
}

impl Samples {
    pub fn get(&self, name: &str) -> Option<&Reading> {
        self.0.get(name)
    }

    /// Value followed by the `suffix`, or [`NOT_AVAILABLE`] when the sample is absent.
    pub fn display(&self, name: &str, suffix: &str) -> String {
        self.get(name)
            .and_then(Reading::to_text)
            .map_or_else(|| NOT_AVAILABLE.to_owned(), |text| format!("{text}{suffix}"))
    }
}

/// Raw sample value: cloud reports numbers for most variables, and strings for some.
pub struct Reading(serde_json::Value);

impl Reading {
    pub fn to_text(&self) -> Option<String> {
        match &self.0 {
            serde_json::Value::Number(number) if number.is_f64() => {
                number.as_f64().map(|value| round(value).to_string())
            }
            serde_json::Value::Number(number) => Some(number.to_string()),
            serde_json::Value::String(text) if !text.is_empty() => Some(text.clone()),
            serde_json::Value::Bool(value) => Some(value.to_string()),
            _ => None,
        }
    }
}
