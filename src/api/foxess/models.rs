use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use serde_with::serde_as;

#[derive(Serialize)]
pub struct DeviceRequest<'a> {
    #[serde(rename = "sn")]
    pub serial_number: &'a str,
}

#[derive(Serialize)]
pub struct ReportRequest<'a> {
    #[serde(rename = "sn")]
    pub serial_number: &'a str,

    pub year: i32,

    /// 1-based.
    pub month: u32,

    pub day: u32,

    pub dimension: Dimension,

    pub variables: &'a [&'a str],
}

#[derive(Copy, Clone, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Dimension {
    Day,
}

#[serde_as]
#[derive(Serialize)]
pub struct HistoryRequest<'a> {
    #[serde(rename = "sn")]
    pub serial_number: &'a str,

    pub variables: &'a [&'a str],

    #[serde_as(as = "serde_with::TimestampMilliSeconds<i64>")]
    pub begin: DateTime<Local>,

    #[serde_as(as = "serde_with::TimestampMilliSeconds<i64>")]
    pub end: DateTime<Local>,
}

#[derive(Deserialize)]
pub struct RealTimeRawVariable {
    #[serde(rename = "variable")]
    pub name: String,

    #[serde(default)]
    pub value: serde_json::Value,
}

#[derive(Deserialize)]
pub struct DeviceRealTimeData {
    #[serde(rename = "datas")]
    pub variables: Vec<RealTimeRawVariable>,

    /// Sample time as reported by the cloud, for example `2025-01-14 12:00:00 CET+0100`.
    #[serde(rename = "time")]
    pub time: Option<String>,
}

#[derive(Deserialize)]
pub struct ReportVariable {
    #[serde(rename = "variable")]
    pub name: String,

    pub unit: Option<String>,

    pub values: Vec<f64>,
}

#[derive(Deserialize)]
pub struct DeviceDetails {
    #[serde(rename = "deviceType")]
    pub device_type: Option<String>,

    /// `1` means online, anything else is treated as offline.
    pub status: i32,

    #[serde(rename = "masterVersion")]
    pub master_version: Option<String>,

    #[serde(rename = "slaveVersion")]
    pub slave_version: Option<String>,

    #[serde(rename = "managerVersion")]
    pub manager_version: Option<String>,

    #[serde(rename = "hasBattery")]
    pub has_battery: bool,

    #[serde(rename = "hasPV")]
    pub has_pv: bool,
}

impl DeviceDetails {
    pub const fn is_online(&self) -> bool {
        self.status == 1
    }
}

#[derive(Deserialize)]
pub struct DeviceHistory {
    #[serde(rename = "datas")]
    pub series: Vec<HistorySeries>,
}

#[derive(Deserialize)]
pub struct HistorySeries {
    #[serde(rename = "variable")]
    pub name: String,

    #[serde(rename = "data")]
    pub points: Vec<HistoryPoint>,
}

#[derive(Deserialize)]
pub struct HistoryPoint {
    pub time: String,
    pub value: f64,
}
