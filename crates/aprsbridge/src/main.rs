#![doc = include_str!("../readme.md")]

mod adsb;
mod ais;
mod aprs;
mod cli;
mod geo;
mod metadata;
mod sbs;
mod snapshot;
mod web;

use aprs::AprsClient;
use clap::Parser;
use cli::BridgeConfig;
use snapshot::Monitor;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(
    name = "aprsbridge",
    version,
    about = "Bridge live AIS and ADS-B traffic to an APRS-IS server"
)]
struct Options {
    /// Path to a TOML configuration file
    #[arg(short, long, default_value = None)]
    config: Option<PathBuf>,

    /// Port for the monitor endpoints (on 0.0.0.0)
    #[arg(long, default_value = None)]
    serve_port: Option<u16>,

    /// Host running dump1090 (overrides the configuration file)
    #[arg(long, default_value = None)]
    dump1090_host: Option<String>,

    /// APRS-IS endpoint (overrides the configuration file)
    #[arg(long, default_value = None)]
    aprs_server: Option<String>,

    /// Callsign for the APRS-IS login (overrides the configuration file)
    #[arg(long, default_value = None)]
    callsign: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let options = Options::parse();
    let mut config = BridgeConfig::load(options.config.as_deref())?;
    if let Some(serve_port) = options.serve_port {
        config.serve_port = Some(serve_port);
    }
    if let Some(dump1090_host) = options.dump1090_host {
        config.dump1090_host = dump1090_host;
    }
    if let Some(aprs_server) = options.aprs_server {
        config.aprs_server = aprs_server;
    }
    if let Some(callsign) = options.callsign {
        config.callsign = callsign;
    }
    info!(
        "bridging AIS ({}) and ADS-B ({}) to APRS-IS at {}",
        config.ais_bind, config.dump1090_host, config.aprs_server
    );

    let monitor = Arc::new(Monitor::default());

    // Each pipeline owns its APRS-IS connection and rate bucket.
    let ais_client = AprsClient::new(
        &config.aprs_server,
        &config.callsign,
        &config.passcode,
    );
    let adsb_client = AprsClient::new(
        &config.aprs_server,
        &config.callsign,
        &config.passcode,
    );

    let ais = tokio::spawn(ais::run(
        config.ais_bind.clone(),
        (config.center_lat, config.center_lon),
        monitor.clone(),
        ais_client,
    ));
    let adsb = tokio::spawn(adsb::run(
        config.dump1090_host.clone(),
        config.symbol_tags,
        monitor.clone(),
        adsb_client,
    ));
    if let Some(port) = config.serve_port {
        tokio::spawn(web::serve(monitor.clone(), port));
    }

    // The pipelines run until the process is killed.
    let _ = tokio::join!(ais, adsb);
    Ok(())
}
