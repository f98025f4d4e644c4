#![allow(clippy::doc_markdown)]
#![doc = include_str!("../README.md")]

mod api;
mod bot;
mod cli;
mod prelude;
mod report;
mod router;

use clap::{Parser, crate_version};

use crate::{
    api::{foxess, telegram},
    bot::Bot,
    cli::Args,
    prelude::*,
};

#[tokio::main]
async fn main() -> Result {
    let _ = dotenvy::dotenv();
    tracing_subscriber::fmt().without_time().compact().init();
    info!(version = crate_version!(), "starting…");

    let args = Args::parse();
    let telegram = telegram::Api::new(&args.telegram_token, args.polling_timeout())?;
    let fox_ess = foxess::Api::new(args.fox_ess_api.api_key, args.fox_ess_api.base_url)?;
    Bot::new(telegram, fox_ess, args.fox_ess_api.serial_number).run().await?;

    info!("done!");
    Ok(())
}
