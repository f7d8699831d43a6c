//! ADS-B pipeline: SBS ingestion, JSON metadata enrichment, and the
//! aircraft track state machine driving APRS object emission.

use crate::aprs::{epoch_now, AprsObject, ObjectSink};
use crate::geo;
use crate::metadata::{AircraftMeta, MetadataCache, JSON_REFRESH_SEC};
use crate::sbs::{self, SbsRecord};
use crate::snapshot::{AircraftSnapshot, Monitor};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::net::TcpStream;
use tokio::time::{interval, sleep, Duration};
use tracing::{debug, info, warn};

/// Reference point: Buffalo Niagara International
pub const KBUF_LAT: f64 = 42.9405;
pub const KBUF_LON: f64 = -78.7322;
/// New tracks are admitted only inside this radius
pub const ADD_DISTANCE_MI: f64 = 35.0;
/// Existing tracks are cleared beyond this radius; between the two radii a
/// track is retained but not re-admitted
pub const CLEAR_DISTANCE_MI: f64 = 40.0;
pub const LANDED_ALT_FT: f64 = 1000.0;
pub const LANDED_WAIT_SEC: u64 = 180;
pub const LAND_CLEAR_ALT: f64 = 1500.0;
/// Any movement beyond this distance forces an update
pub const MIN_MOVE_MI: f64 = 0.50;
pub const MIN_UPDATE_SEC: u64 = 5;
pub const OBJECT_TTL_SEC: u64 = 300;

const EPS_POSITION_DEG: f64 = 0.00015;
const EPS_ALTITUDE_FT: f64 = 25.0;
const EPS_GROUNDSPEED_KT: f64 = 2.0;
const EPS_TRACK_DEG: f64 = 3.0;

const RECONNECT_DELAY: Duration = Duration::from_secs(2);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AircraftClass {
    Plane,
    Helicopter,
    Glider,
    Balloon,
}

impl AircraftClass {
    /// The emitter category wins over the type designator: an `A*` category
    /// other than `A7` is a plane no matter what the designator suggests.
    pub fn from_meta(
        category: Option<&str>,
        actype: Option<&str>,
    ) -> AircraftClass {
        if let Some(category) = category.filter(|c| !c.is_empty()) {
            return match category {
                "A7" => AircraftClass::Helicopter,
                "B2" => AircraftClass::Balloon,
                "B1" | "B4" => AircraftClass::Glider,
                _ => AircraftClass::Plane,
            };
        }
        let Some(actype) = actype else {
            return AircraftClass::Plane;
        };
        let actype = actype.trim().to_uppercase();
        const ROTORCRAFT: &[&str] =
            &["EC", "UH", "AH", "CH", "MH", "R22", "R44", "BELL", "BK"];
        const GLIDERS: &[&str] = &["DG", "ASW", "ASK", "LS", "G1", "G2", "G3"];
        const BALLOONS: &[&str] = &["BAL", "BLN", "HAB"];
        if actype.starts_with('H')
            || actype.contains("HELI")
            || ROTORCRAFT.iter().any(|p| actype.starts_with(p))
        {
            AircraftClass::Helicopter
        } else if actype.contains("GLID")
            || GLIDERS.iter().any(|p| actype.starts_with(p))
        {
            AircraftClass::Glider
        } else if BALLOONS.iter().any(|p| actype.starts_with(p)) {
            AircraftClass::Balloon
        } else {
            AircraftClass::Plane
        }
    }

    pub fn symbol(&self) -> (char, char) {
        match self {
            AircraftClass::Plane => ('/', '^'),
            AircraftClass::Helicopter => ('/', 'X'),
            AircraftClass::Glider => ('/', 'g'),
            AircraftClass::Balloon => ('/', 'O'),
        }
    }

    pub fn tag(&self) -> &'static str {
        match self {
            AircraftClass::Plane => "PLANE",
            AircraftClass::Helicopter => "HELI",
            AircraftClass::Glider => "GLIDER",
            AircraftClass::Balloon => "BALLOON",
        }
    }
}

fn normalize_callsign(callsign: &str) -> String {
    callsign
        .to_uppercase()
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .collect()
}

/// Derive the 9-character APRS object name from the callsign when one is
/// known, from the ICAO hex otherwise.
pub fn object_name(callsign: Option<&str>, icao: &str) -> String {
    let normalized =
        callsign.map(normalize_callsign).unwrap_or_default();
    let base = if !normalized.is_empty() {
        normalized
    } else if !icao.is_empty() {
        icao.to_string()
    } else {
        "AIRCRAFT".to_string()
    };
    format!("{:<9}", base.chars().take(9).collect::<String>())
}

/// Both directions of the ICAO hex to object name mapping, kept consistent
/// through renames.
#[derive(Debug, Default)]
struct NameRegistry {
    hex_to_name: HashMap<String, String>,
    name_to_hex: HashMap<String, String>,
}

impl NameRegistry {
    fn insert(&mut self, icao: &str, name: &str) {
        if let Some(old) =
            self.hex_to_name.insert(icao.to_string(), name.to_string())
        {
            if old != name {
                self.name_to_hex.remove(&old);
            }
        }
        self.name_to_hex.insert(name.to_string(), icao.to_string());
    }

    fn remove(&mut self, icao: &str) {
        if let Some(old) = self.hex_to_name.remove(icao) {
            self.name_to_hex.remove(&old);
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct SentState {
    latitude: f64,
    longitude: f64,
    altitude: Option<f64>,
    groundspeed: Option<f64>,
    track: Option<f64>,
    at: u64,
}

#[derive(Debug)]
struct Track {
    icao: String,
    name: String,
    callsign: Option<String>,
    latitude: f64,
    longitude: f64,
    altitude: Option<f64>,
    groundspeed: Option<f64>,
    track: Option<f64>,
    class: AircraftClass,
    category: Option<String>,
    actype: Option<String>,
    last_seen: u64,
    last_sent: Option<SentState>,
    /// Start of the current low-altitude dwell, if any
    low_since: Option<u64>,
}

impl Track {
    fn new(icao: &str, record: &SbsRecord, now: u64) -> Track {
        Track {
            icao: icao.to_string(),
            name: object_name(None, icao),
            callsign: None,
            latitude: record.latitude,
            longitude: record.longitude,
            altitude: None,
            groundspeed: None,
            track: None,
            class: AircraftClass::Plane,
            category: None,
            actype: None,
            last_seen: now,
            last_sent: None,
            low_since: None,
        }
    }
}

fn option_delta(prev: Option<f64>, cur: Option<f64>, eps: f64) -> bool {
    match (prev, cur) {
        (Some(prev), Some(cur)) => (prev - cur).abs() >= eps,
        (None, None) => false,
        // presence-to-absence transitions always count
        _ => true,
    }
}

fn option_angle(prev: Option<f64>, cur: Option<f64>, eps: f64) -> bool {
    match (prev, cur) {
        (Some(prev), Some(cur)) => {
            let delta = (prev - cur).abs() % 360.;
            delta.min(360. - delta) >= eps
        }
        (None, None) => false,
        _ => true,
    }
}

fn epsilon_crossed(prev: &SentState, track: &Track) -> bool {
    (track.latitude - prev.latitude).abs() >= EPS_POSITION_DEG
        || (track.longitude - prev.longitude).abs() >= EPS_POSITION_DEG
        || option_delta(prev.altitude, track.altitude, EPS_ALTITUDE_FT)
        || option_delta(prev.groundspeed, track.groundspeed, EPS_GROUNDSPEED_KT)
        || option_angle(prev.track, track.track, EPS_TRACK_DEG)
}

pub struct AircraftTracker {
    show_symbol_tag: bool,
    tracks: HashMap<String, Track>,
    names: NameRegistry,
    /// ICAO addresses silenced after a landing, until they climb back above
    /// [`LAND_CLEAR_ALT`]
    suppressed: HashSet<String>,
}

impl AircraftTracker {
    pub fn new(show_symbol_tag: bool) -> Self {
        AircraftTracker {
            show_symbol_tag,
            tracks: HashMap::new(),
            names: NameRegistry::default(),
            suppressed: HashSet::new(),
        }
    }

    pub async fn observe<S: ObjectSink>(
        &mut self,
        record: &SbsRecord,
        meta: Option<&AircraftMeta>,
        sink: &mut S,
        monitor: &Monitor,
        now: u64,
    ) {
        let icao = record.icao.clone();
        if self.suppressed.contains(&icao) {
            match record.altitude {
                Some(altitude) if altitude > LAND_CLEAR_ALT => {
                    info!("{}: climbed out, suppression cleared", icao);
                    self.suppressed.remove(&icao);
                }
                _ => return,
            }
        }

        let distance = geo::distance_mi(
            KBUF_LAT,
            KBUF_LON,
            record.latitude,
            record.longitude,
        );
        let mut track = match self.tracks.remove(&icao) {
            Some(track) => {
                if distance > CLEAR_DISTANCE_MI {
                    info!("{}: {:.0} mi out, clearing", icao, distance);
                    self.delete_track(track, sink, monitor, now).await;
                    return;
                }
                track
            }
            None => {
                if distance > ADD_DISTANCE_MI {
                    debug!(
                        "{}: {:.1} mi outside admission radius",
                        icao, distance
                    );
                    return;
                }
                Track::new(&icao, record, now)
            }
        };

        track.latitude = record.latitude;
        track.longitude = record.longitude;
        track.altitude = record.altitude;
        track.groundspeed = record.groundspeed;
        track.track = record.track;
        track.last_seen = now;
        let callsign = record
            .callsign
            .as_deref()
            .or(meta.and_then(|m| m.callsign.as_deref()))
            .map(normalize_callsign)
            .filter(|c| !c.is_empty());
        if callsign.is_some() {
            track.callsign = callsign;
        }
        if let Some(meta) = meta {
            if meta.category.is_some() {
                track.category = meta.category.clone();
            }
            if meta.actype.is_some() {
                track.actype = meta.actype.clone();
            }
        }
        track.class = AircraftClass::from_meta(
            track.category.as_deref(),
            track.actype.as_deref(),
        );

        match track.altitude {
            Some(altitude) if altitude <= LANDED_ALT_FT => {
                let since = *track.low_since.get_or_insert(now);
                if now >= since + LANDED_WAIT_SEC {
                    info!("{}: landed, deleting and suppressing", icao);
                    self.delete_track(track, sink, monitor, now).await;
                    self.suppressed.insert(icao);
                    return;
                }
            }
            _ => track.low_since = None,
        }

        let desired = object_name(track.callsign.as_deref(), &icao);
        if track.name != desired {
            if let Some(last_sent) = track.last_sent {
                info!(
                    "{}: renaming {:?} -> {:?}",
                    icao, track.name, desired
                );
                let delete =
                    self.build_object(&track, Some(&last_sent), now, true);
                sink.send_object(&delete).await;
            }
            monitor.aircraft.lock().await.remove(&track.name);
            track.name = desired;
        }
        self.names.insert(&icao, &track.name);

        let force = match &track.last_sent {
            None => true,
            Some(prev) => {
                let moved = geo::distance_mi(
                    prev.latitude,
                    prev.longitude,
                    track.latitude,
                    track.longitude,
                );
                moved >= MIN_MOVE_MI
                    || (now >= prev.at + MIN_UPDATE_SEC
                        && epsilon_crossed(prev, &track))
            }
        };
        if force {
            let object = self.build_object(&track, None, now, false);
            if sink.send_object(&object).await {
                track.last_sent = Some(SentState {
                    latitude: track.latitude,
                    longitude: track.longitude,
                    altitude: track.altitude,
                    groundspeed: track.groundspeed,
                    track: track.track,
                    at: now,
                });
                self.publish(&track, monitor, now).await;
            }
        }
        self.tracks.insert(icao, track);
    }

    /// Delete every track not heard from within the TTL.
    pub async fn sweep<S: ObjectSink>(
        &mut self,
        sink: &mut S,
        monitor: &Monitor,
        now: u64,
    ) {
        let expired: Vec<String> = self
            .tracks
            .iter()
            .filter(|(_, track)| now > track.last_seen + OBJECT_TTL_SEC)
            .map(|(icao, _)| icao.clone())
            .collect();
        for icao in expired {
            if let Some(track) = self.tracks.remove(&icao) {
                info!("{}: silent, expiring", icao);
                self.delete_track(track, sink, monitor, now).await;
            }
        }
    }

    /// Emit the APRS delete (when the object ever made it to the wire) and
    /// clear every per-track entry.
    async fn delete_track<S: ObjectSink>(
        &mut self,
        track: Track,
        sink: &mut S,
        monitor: &Monitor,
        now: u64,
    ) {
        self.names.remove(&track.icao);
        if let Some(last_sent) = track.last_sent {
            let delete = self.build_object(&track, Some(&last_sent), now, true);
            sink.send_object(&delete).await;
        }
        monitor.aircraft.lock().await.remove(&track.name);
    }

    fn build_object(
        &self,
        track: &Track,
        sent: Option<&SentState>,
        now: u64,
        delete: bool,
    ) -> AprsObject {
        let (latitude, longitude) = match sent {
            Some(sent) => (sent.latitude, sent.longitude),
            None => (track.latitude, track.longitude),
        };
        let (symbol_table, symbol_code) = track.class.symbol();
        AprsObject {
            name: track.name.clone(),
            timestamp: geo::aprs_timestamp(now),
            latitude,
            longitude,
            symbol_table,
            symbol_code,
            comment: self.build_comment(track, delete),
        }
    }

    fn build_comment(&self, track: &Track, delete: bool) -> String {
        let mut parts: Vec<String> = Vec::new();
        if let Some(trk) = track.track {
            parts.push(format!("TRK {:03}", (trk as i64).rem_euclid(360)));
        }
        if let Some(groundspeed) = track.groundspeed {
            parts.push(format!("GS {}kt", groundspeed as i64));
        }
        if let Some(altitude) = track.altitude {
            parts.push(format!("ALT {}ft", altitude as i64));
        }
        if let Some(callsign) = &track.callsign {
            parts.push(format!("FLT {}", callsign));
        }
        if !track.icao.is_empty() {
            parts.push(format!("ICAO {}", track.icao));
        }
        if self.show_symbol_tag {
            parts.push(format!("SYM {}", track.class.tag()));
        }
        if delete {
            parts.push("DEL".to_string());
        }
        if parts.is_empty() {
            "ADS-B".to_string()
        } else {
            parts.join(" ")
        }
    }

    async fn publish(&self, track: &Track, monitor: &Monitor, now: u64) {
        let mut aircraft = monitor.aircraft.lock().await;
        aircraft.insert(
            track.name.clone(),
            AircraftSnapshot {
                object_name: track.name.clone(),
                icao: track.icao.clone(),
                callsign: track.callsign.clone().unwrap_or_default(),
                category: track.category.clone().unwrap_or_default(),
                actype: track.actype.clone().unwrap_or_default(),
                symbol: track.class.tag().to_string(),
                latitude: format!("{:.5}", track.latitude),
                longitude: format!("{:.5}", track.longitude),
                altitude: track
                    .altitude
                    .map(|v| format!("{}", v as i64))
                    .unwrap_or_default(),
                groundspeed: track
                    .groundspeed
                    .map(|v| format!("{}", v as i64))
                    .unwrap_or_default(),
                track: track
                    .track
                    .map(|v| format!("{:03}", (v as i64).rem_euclid(360)))
                    .unwrap_or_default(),
                last_seen: geo::clock_hms(now),
            },
        );
    }
}

/// Connects to the dump1090 SBS feed and runs the tracker; the JSON
/// metadata poll and the expiry sweep interleave with socket reads on the
/// same loop.
pub async fn run<S: ObjectSink>(
    host: String,
    show_symbol_tag: bool,
    monitor: Arc<Monitor>,
    mut sink: S,
) {
    let mut tracker = AircraftTracker::new(show_symbol_tag);
    let mut metadata = MetadataCache::new(&host);
    let mut ticker = interval(Duration::from_secs(JSON_REFRESH_SEC));
    let address = format!("{}:30003", host);
    loop {
        let stream = match TcpStream::connect(&address).await {
            Ok(stream) => {
                info!("connected to SBS feed at {}", address);
                stream
            }
            Err(e) => {
                warn!("SBS connect {} failed: {}", address, e);
                tracker.sweep(&mut sink, &monitor, epoch_now()).await;
                sleep(RECONNECT_DELAY).await;
                continue;
            }
        };
        let mut lines = BufReader::new(stream).lines();
        loop {
            tokio::select! {
                line = lines.next_line() => match line {
                    Ok(Some(line)) => {
                        let now = epoch_now();
                        if let Some(record) = sbs::parse_line(&line) {
                            let meta = metadata.get(&record.icao);
                            tracker
                                .observe(&record, meta, &mut sink, &monitor, now)
                                .await;
                        }
                        tracker.sweep(&mut sink, &monitor, now).await;
                    }
                    Ok(None) => {
                        warn!("SBS feed closed");
                        break;
                    }
                    Err(e) => {
                        warn!("SBS read error: {}", e);
                        break;
                    }
                },
                _ = ticker.tick() => {
                    let now = epoch_now();
                    metadata.refresh(now).await;
                    tracker.sweep(&mut sink, &monitor, now).await;
                }
            }
        }
        sleep(RECONNECT_DELAY).await;
    }
}
