use std::collections::HashMap;

use chrono::{DateTime, Datelike, Local};
use itertools::Itertools;
use reqwest::Method;

use super::{NOT_AVAILABLE, Report, round};
use crate::{
    api::foxess::{self, Dimension, ReportRequest, ReportVariable},
    prelude::*,
};

/// Requested report variables along with their labels, in the rendering order.
const VARIABLES: [(&str, &str); 5] = [
    ("generation", "🔆 Geração"),
    ("feedin", "📤 Injetada na rede"),
    ("gridConsumption", "📥 Consumida da rede"),
    ("chargeEnergyToTal", "🔋 Carga da bateria"),
    ("dischargeEnergyToTal", "🪫 Descarga da bateria"),
];

const DEFAULT_UNIT: &str = "kWh";

pub struct Energy;

impl Report for Energy {
    const NAME: &'static str = "energy";
    const FAILURE: &'static str = "Erro ao buscar dados de energia.";
    const METHOD: Method = Method::POST;
    const PATH: &'static str = foxess::REPORT_PATH;

    type Payload = Vec<ReportVariable>;

    fn params(serial_number: &str, now: DateTime<Local>) -> Result<serde_json::Value> {
        let variables = VARIABLES.map(|(name, _)| name);
        Ok(serde_json::to_value(ReportRequest {
            serial_number,
            year: now.year(),
            month: now.month(),
            day: now.day(),
            dimension: Dimension::Day,
            variables: &variables,
        })?)
    }

    fn render(result: Self::Payload) -> Result<String> {
        let by_name: HashMap<_, _> =
            result.iter().map(|variable| (variable.name.as_str(), variable)).collect();
        let lines = VARIABLES
            .iter()
            .map(|(name, label)| {
                let value = by_name
                    .get(name)
                    .and_then(|variable| Some((variable.values.first()?, &variable.unit)))
                    .map_or_else(
                        || NOT_AVAILABLE.to_owned(),
                        |(value, unit)| {
                            format!("{} {}", round(*value), unit.as_deref().unwrap_or(DEFAULT_UNIT))
                        },
                    );
                format!("{label}: {value}")
            })
            .join("\n");
        Ok(format!("⚡ Produção de Energia (hoje)\n{lines}"))
    }
}
