//! Shared view model consumed by the monitor endpoints.
//!
//! The track managers are the only writers; readers poll at about 1 Hz and
//! copy the tables out, so entries hold pre-formatted strings and the locks
//! stay cheap.

use serde::Serialize;
use std::collections::BTreeMap;
use tokio::sync::Mutex;

#[derive(Debug, Default)]
pub struct Monitor {
    pub vessels: Mutex<VesselBoard>,
    pub aircraft: Mutex<BTreeMap<String, AircraftSnapshot>>,
}

/// Vessel table and the static-message name cache, updated together under
/// one lock.
#[derive(Debug, Default)]
pub struct VesselBoard {
    pub vessels: BTreeMap<String, VesselSnapshot>,
    /// MMSI to vessel name, populated by types 5 and 24, kept for the
    /// process lifetime
    pub names: BTreeMap<u32, String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct VesselSnapshot {
    pub object_name: String,
    pub mmsi: String,
    pub kind: &'static str,
    pub display_name: String,
    pub latitude: String,
    pub longitude: String,
    pub sog: String,
    pub cog: String,
    pub heading: String,
    pub last_seen: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct AircraftSnapshot {
    pub object_name: String,
    pub icao: String,
    pub callsign: String,
    pub category: String,
    pub actype: String,
    pub symbol: String,
    pub latitude: String,
    pub longitude: String,
    pub altitude: String,
    pub groundspeed: String,
    pub track: String,
    pub last_seen: String,
}
