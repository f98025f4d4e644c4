use std::time::Duration;

use clap::{Parser, builder::NonEmptyStringValueParser};
use reqwest::Url;

#[derive(Parser)]
#[command(author, version, about, propagate_version = true)]
pub struct Args {
    /// Telegram Bot API token.
    #[clap(
        long = "telegram-token",
        env = "TELEGRAM_TOKEN",
        value_parser = NonEmptyStringValueParser::new(),
    )]
    pub telegram_token: String,

    /// Long polling timeout in seconds.
    #[clap(
        long = "polling-timeout",
        env = "TELEGRAM_POLLING_TIMEOUT",
        default_value = "30",
        value_parser = clap::value_parser!(u64).range(1..=600),
    )]
    pub polling_timeout_secs: u64,

    #[clap(flatten)]
    pub fox_ess_api: FoxEssApiArgs,
}

impl Args {
    pub const fn polling_timeout(&self) -> Duration {
        Duration::from_secs(self.polling_timeout_secs)
    }
}

#[derive(Parser)]
pub struct FoxEssApiArgs {
    #[clap(
        long = "api-key",
        env = "FOXESS_API_KEY",
        value_parser = NonEmptyStringValueParser::new(),
    )]
    pub api_key: String,

    #[clap(
        long,
        alias = "serial",
        env = "DEVICE_SN",
        value_parser = NonEmptyStringValueParser::new(),
    )]
    pub serial_number: String,

    /// FoxESS Cloud base URL.
    #[clap(
        long = "base-url",
        env = "FOXESS_BASE_URL",
        default_value = "https://portal.foxesscloud.us:30004"
    )]
    pub base_url: Url,
}
