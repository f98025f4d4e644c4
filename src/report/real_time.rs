use chrono::{DateTime, Local};
use reqwest::Method;

use super::{NOT_AVAILABLE, Report, samples::Samples};
use crate::{
    api::foxess::{self, DeviceRealTimeData, DeviceRequest},
    prelude::*,
};

pub struct RealTime;

impl Report for RealTime {
    const NAME: &'static str = "real_time";
    const FAILURE: &'static str = "Erro ao buscar dados em tempo real.";
    const METHOD: Method = Method::POST;
    const PATH: &'static str = foxess::REAL_TIME_PATH;

    type Payload = Vec<DeviceRealTimeData>;

    fn params(serial_number: &str, _now: DateTime<Local>) -> Result<serde_json::Value> {
        Ok(serde_json::to_value(DeviceRequest { serial_number })?)
    }

    fn render(result: Self::Payload) -> Result<String> {
        let device = result.into_iter().next().context("the response contains no devices")?;
        let samples: Samples = device.variables.into_iter().collect();
        Ok(format!(
            "📡 Dados em Tempo Real\n\
             🔋 Tensão da Rede: {grid_voltage}\n\
             ⚡ Potência Solar: {solar_power}\n\
             🔌 Potência de Carga: {load_power}\n\
             🌡️ Temperatura Ambiente: {temperature}\n\
             🔄 Frequência: {frequency}\n\
             ⏱️ Última Atualização: {time}",
            grid_voltage = samples.display("RVolt", "V"),
            solar_power = samples.display("pvPower", " kW"),
            load_power = samples.display("loadsPower", " kW"),
            temperature = samples.display("ambientTemperation", " ℃"),
            frequency = samples.display("RFreq", " Hz"),
            time = device.time.as_deref().unwrap_or(NOT_AVAILABLE),
        ))
    }
}
