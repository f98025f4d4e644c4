use chrono::{DateTime, Local};
use reqwest::Method;

use super::{NOT_AVAILABLE, Report, yes_no};
use crate::{
    api::foxess::{self, DeviceDetails, DeviceRequest},
    prelude::*,
};

pub struct Status;

impl Report for Status {
    const NAME: &'static str = "status";
    const FAILURE: &'static str = "Erro ao buscar status do sistema.";
    const METHOD: Method = Method::GET;
    const PATH: &'static str = foxess::DEVICE_DETAIL_PATH;

    type Payload = DeviceDetails;

    fn params(serial_number: &str, _now: DateTime<Local>) -> Result<serde_json::Value> {
        Ok(serde_json::to_value(DeviceRequest { serial_number })?)
    }

    fn render(details: Self::Payload) -> Result<String> {
        let or_na = |field: Option<&str>| field.unwrap_or(NOT_AVAILABLE).to_owned();
        Ok(format!(
            "✅ Status do Sistema\n\
             ⚙️ Estado: {state}\n\
             🏷️ Modelo: {device_type}\n\
             🧩 Versão master: {master}\n\
             🧩 Versão slave: {slave}\n\
             🧩 Versão manager: {manager}\n\
             🔋 Bateria: {battery}\n\
             ☀️ Painéis solares: {pv}",
            state = if details.is_online() { "Online" } else { "Offline" },
            device_type = or_na(details.device_type.as_deref()),
            master = or_na(details.master_version.as_deref()),
            slave = or_na(details.slave_version.as_deref()),
            manager = or_na(details.manager_version.as_deref()),
            battery = yes_no(details.has_battery),
            pv = yes_no(details.has_pv),
        ))
    }
}
