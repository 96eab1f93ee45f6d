use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use dotenvy::dotenv;

use tracing::info;

use starhub_proxy::{
    AppConfig, ApplicationServer, Logger, server::utils::metrics_utils::MetricsUtil,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    let config = Arc::new(AppConfig::parse());

    // guards are kept alive to flush logs and keep sentry connected
    let _guards = Logger::init(&config);

    info!("logger and env prepped...");

    let metrics = MetricsUtil::install()?;

    info!("metrics recorder ok, starting relay server...");

    ApplicationServer::serve(config, metrics)
        .await
        .context("relay server failed to start")?;

    Ok(())
}
