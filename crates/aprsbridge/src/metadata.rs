//! Periodic poll of the dump1090 JSON endpoint for aircraft metadata
//! (emitter category, type designator, callsign), merged into a per-ICAO
//! cache consumed by the ADS-B track manager.

use serde_json::Value;
use std::collections::HashMap;
use std::time::Duration;
use tracing::{debug, info, warn};

pub const JSON_REFRESH_SEC: u64 = 5;

const FETCH_TIMEOUT: Duration = Duration::from_millis(1500);
/// Fetch status is reported on change, or at most this often
const STATUS_REPORT_SEC: u64 = 60;
/// Entries unseen in the feed for this long are evicted
const ENTRY_TTL_SEC: u64 = 3600;

#[derive(Debug, Clone, Default)]
pub struct AircraftMeta {
    /// Emitter category string, `A1`..`A7`, `B1`..`B4`, ...
    pub category: Option<String>,
    /// ICAO aircraft type designator, e.g. `B738`
    pub actype: Option<String>,
    pub callsign: Option<String>,
    last_seen: u64,
}

pub struct MetadataCache {
    url: String,
    client: reqwest::Client,
    entries: HashMap<String, AircraftMeta>,
    last_status: Option<bool>,
    last_report: u64,
}

impl MetadataCache {
    pub fn new(host: &str) -> Self {
        MetadataCache {
            url: format!("http://{}:8080/data.json", host),
            client: reqwest::Client::builder()
                .timeout(FETCH_TIMEOUT)
                .build()
                .unwrap_or_default(),
            entries: HashMap::new(),
            last_status: None,
            last_report: 0,
        }
    }

    pub fn get(&self, icao: &str) -> Option<&AircraftMeta> {
        self.entries.get(icao)
    }

    pub async fn refresh(&mut self, now: u64) {
        let result = async {
            let response = self.client.get(&self.url).send().await?;
            response.error_for_status()?.json::<Value>().await
        }
        .await;
        match result {
            Ok(value) => {
                let merged = self.merge(&value, now);
                self.report(true, &format!("{} aircraft", merged), now);
            }
            Err(e) => self.report(false, &e.to_string(), now),
        }
        self.evict(now);
    }

    /// Accepts either `{"aircraft": [...]}` or a bare array; merges the
    /// latest non-empty values per uppercased hex. Returns the number of
    /// entries touched.
    fn merge(&mut self, value: &Value, now: u64) -> usize {
        let entries = match value.get("aircraft").and_then(Value::as_array) {
            Some(entries) => entries,
            None => match value.as_array() {
                Some(entries) => entries,
                None => return 0,
            },
        };
        let mut merged = 0;
        for entry in entries {
            let hex = match entry.get("hex").and_then(Value::as_str) {
                Some(hex) if !hex.trim().is_empty() => {
                    hex.trim().to_uppercase()
                }
                _ => continue,
            };
            let meta = self.entries.entry(hex).or_default();
            meta.last_seen = now;
            if let Some(category) = string_field(entry, &["category"]) {
                meta.category = Some(category);
            }
            if let Some(actype) = string_field(entry, &["type", "t"]) {
                meta.actype = Some(actype);
            }
            if let Some(callsign) =
                string_field(entry, &["flight", "call", "flightnumber"])
            {
                meta.callsign = Some(callsign);
            }
            merged += 1;
        }
        merged
    }

    fn report(&mut self, ok: bool, detail: &str, now: u64) {
        let changed = self.last_status != Some(ok);
        if changed || now >= self.last_report + STATUS_REPORT_SEC {
            if ok {
                info!("dump1090 json poll: {}", detail);
            } else {
                warn!("dump1090 json poll failed: {}", detail);
            }
            self.last_status = Some(ok);
            self.last_report = now;
        }
    }

    fn evict(&mut self, now: u64) {
        let before = self.entries.len();
        self.entries
            .retain(|_, meta| now < meta.last_seen + ENTRY_TTL_SEC);
        if self.entries.len() < before {
            debug!("evicted {} stale metadata entries", before - self.entries.len());
        }
    }
}

fn string_field(entry: &Value, keys: &[&str]) -> Option<String> {
    for key in keys {
        if let Some(value) = entry.get(key).and_then(Value::as_str) {
            let value = value.trim();
            if !value.is_empty() {
                return Some(value.to_string());
            }
        }
    }
    None
}
