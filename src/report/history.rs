use std::collections::HashMap;

use chrono::{DateTime, Local, TimeZone};
use reqwest::Method;

use super::{NOT_AVAILABLE, Report, round};
use crate::{
    api::foxess::{self, DeviceHistory, HistoryPoint, HistoryRequest},
    prelude::*,
};

const SOLAR_POWER: &str = "pvPower";
const LOAD_POWER: &str = "loadsPower";
const FEED_IN_POWER: &str = "feedinPower";
const AMBIENT_TEMPERATURE: &str = "ambientTemperation";
const PV1_VOLTAGE: &str = "pv1Volt";
const PV1_CURRENT: &str = "pv1Current";

const TRACKED: [&str; 6] =
    [SOLAR_POWER, LOAD_POWER, FEED_IN_POWER, AMBIENT_TEMPERATURE, PV1_VOLTAGE, PV1_CURRENT];

pub struct History;

impl Report for History {
    const NAME: &'static str = "history";
    const FAILURE: &'static str = "Erro ao buscar histórico do dia.";
    const METHOD: Method = Method::POST;
    const PATH: &'static str = foxess::HISTORY_PATH;

    type Payload = Vec<DeviceHistory>;

    fn params(serial_number: &str, now: DateTime<Local>) -> Result<serde_json::Value> {
        let (begin, end) = day_window(&now)?;
        Ok(serde_json::to_value(HistoryRequest { serial_number, variables: &TRACKED, begin, end })?)
    }

    fn render(result: Self::Payload) -> Result<String> {
        let device = result.into_iter().next().context("the response contains no devices")?;
        let summaries: HashMap<_, _> = device
            .series
            .into_iter()
            .filter(|series| TRACKED.contains(&series.name.as_str()))
            .map(|series| (series.name, SeriesSummary::from_points(series.points)))
            .collect();

        let display = |value: Option<f64>, unit: &str| {
            value.map_or_else(|| NOT_AVAILABLE.to_owned(), |value| format!("{} {unit}", round(value)))
        };
        let total = |name: &str, unit: &str| {
            display(summaries.get(name).map(|summary| summary.total), unit)
        };
        let last = |name: &str, unit: &str| {
            let last = summaries.get(name).and_then(|summary| summary.last.as_ref());
            display(last.map(|point| point.value), unit)
        };
        let updated_at = summaries
            .get(SOLAR_POWER)
            .and_then(|summary| summary.last.as_ref())
            .map_or(NOT_AVAILABLE, |point| point.time.as_str());

        Ok(format!(
            "📈 Histórico do Dia\n\
             \n\
             Σ Soma das amostras de potência:\n\
             ☀️ Potência Solar: {solar_power}\n\
             🔌 Potência de Carga: {load_power}\n\
             📤 Potência Injetada: {feed_in_power}\n\
             \n\
             Última leitura:\n\
             🌡️ Temperatura Ambiente: {temperature}\n\
             🔆 Tensão PV1: {pv1_voltage}\n\
             ⚡ Corrente PV1: {pv1_current}\n\
             \n\
             ⏱️ Última Atualização: {updated_at}",
            solar_power = total(SOLAR_POWER, "kW"),
            load_power = total(LOAD_POWER, "kW"),
            feed_in_power = total(FEED_IN_POWER, "kW"),
            temperature = last(AMBIENT_TEMPERATURE, "℃"),
            pv1_voltage = last(PV1_VOLTAGE, "V"),
            pv1_current = last(PV1_CURRENT, "A"),
        ))
    }
}

/// Sum and last sample of a single day series.
pub struct SeriesSummary {
    pub total: f64,
    pub last: Option<HistoryPoint>,
}

impl SeriesSummary {
    pub fn from_points(points: Vec<HistoryPoint>) -> Self {
        let total = points.iter().fold(0.0, |total, point| total + point.value);
        Self { total, last: points.into_iter().last() }
    }
}

/// Calendar day of `now`: from `00:00:00` till `23:59:59` in the same time zone.
pub fn day_window<Tz: TimeZone>(now: &DateTime<Tz>) -> Result<(DateTime<Tz>, DateTime<Tz>)> {
    let date = now.date_naive();
    let start = date
        .and_hms_opt(0, 0, 0)
        .and_then(|start| start.and_local_timezone(now.timezone()).earliest())
        .with_context(|| format!("`{date}` has no start in the local time zone"))?;
    let end = date
        .and_hms_opt(23, 59, 59)
        .and_then(|end| end.and_local_timezone(now.timezone()).latest())
        .with_context(|| format!("`{date}` has no end in the local time zone"))?;
    Ok((start, end))
}
