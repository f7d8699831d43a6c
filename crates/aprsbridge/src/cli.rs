use serde::{Deserialize, Serialize};
use std::path::Path;

/// Endpoints and identity of the bridge. Pipeline thresholds (ranges,
/// epsilons, TTLs) are compile-time constants in their modules.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BridgeConfig {
    /// APRS-IS injection server
    pub aprs_server: String,
    /// Callsign used in the login line and as packet source
    pub callsign: String,
    /// APRS-IS passcode (not validated by the injection path)
    pub passcode: String,
    /// Listener for AIS-catcher NMEA sentences
    pub ais_bind: String,
    /// Host running dump1090 (SBS on 30003, JSON on 8080)
    pub dump1090_host: String,
    /// Center of the AIS range gate
    pub center_lat: f64,
    pub center_lon: f64,
    /// Append `SYM <tag>` to ADS-B object comments
    pub symbol_tags: bool,
    /// Port for the monitor endpoints (on 0.0.0.0)
    pub serve_port: Option<u16>,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        BridgeConfig {
            aprs_server: "127.0.0.1:14580".to_string(),
            callsign: "N0CALL".to_string(),
            passcode: "-1".to_string(),
            ais_bind: "0.0.0.0:10110".to_string(),
            dump1090_host: "localhost".to_string(),
            center_lat: 42.9405,
            center_lon: -78.7322,
            symbol_tags: true,
            serve_port: None,
        }
    }
}

impl BridgeConfig {
    pub fn load(
        path: Option<&Path>,
    ) -> Result<BridgeConfig, Box<dyn std::error::Error>> {
        match path {
            Some(path) => {
                let content = std::fs::read_to_string(path)?;
                Ok(toml::from_str(&content)?)
            }
            None => Ok(BridgeConfig::default()),
        }
    }
}
