//! AIS pipeline: TCP listener for AIS-catcher, vessel track management and
//! APRS object emission.

use crate::aprs::{epoch_now, AprsObject, ObjectSink};
use crate::geo;
use crate::snapshot::{Monitor, VesselSnapshot};
use rsais::decode::Message;
use rsais::nmea::Assembler;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::net::TcpListener;
use tokio::time::{sleep, Duration};
use tracing::{debug, info, warn};

/// Vessels farther than this from the center are ignored
pub const MAX_RANGE_NM: f64 = 250.0;
/// A jump larger than this within [`TELEPORT_TIME_SEC`] is a decode or
/// source error, not a vessel
pub const TELEPORT_MOVE_NM: f64 = 150.0;
pub const TELEPORT_TIME_SEC: u64 = 900;

const ACCEPT_RETRY_DELAY: Duration = Duration::from_secs(2);

#[derive(Debug, Clone, Copy)]
struct LastFix {
    latitude: f64,
    longitude: f64,
    at: u64,
}

pub struct VesselTracker {
    center: (f64, f64),
    /// Last fix per MMSI that made it to the APRS-IS server
    last_fix: HashMap<u32, LastFix>,
}

impl VesselTracker {
    pub fn new(center: (f64, f64)) -> Self {
        VesselTracker {
            center,
            last_fix: HashMap::new(),
        }
    }

    pub async fn handle<S: ObjectSink>(
        &mut self,
        msg: &Message,
        sink: &mut S,
        monitor: &Monitor,
        now: u64,
    ) {
        match msg {
            Message::PositionReport(report) => {
                self.position(
                    report.mmsi,
                    report.latitude,
                    report.longitude,
                    report.sog,
                    report.cog,
                    report.heading,
                    false,
                    sink,
                    monitor,
                    now,
                )
                .await
            }
            Message::ClassBPositionReport(report) => {
                self.position(
                    report.mmsi,
                    report.latitude,
                    report.longitude,
                    report.sog,
                    report.cog,
                    report.heading,
                    false,
                    sink,
                    monitor,
                    now,
                )
                .await
            }
            Message::LongRangePositionReport(report) => {
                self.position(
                    report.mmsi,
                    report.latitude,
                    report.longitude,
                    None,
                    None,
                    None,
                    false,
                    sink,
                    monitor,
                    now,
                )
                .await
            }
            Message::BaseStationReport(report) => {
                self.position(
                    report.mmsi,
                    report.latitude,
                    report.longitude,
                    Some(0.),
                    Some(0.),
                    None,
                    true,
                    sink,
                    monitor,
                    now,
                )
                .await
            }
            Message::StaticAndVoyageData(report) => {
                self.vessel_name(report.mmsi, &report.name, monitor).await
            }
            Message::StaticDataReport(report) => {
                if let Some(name) = &report.name {
                    self.vessel_name(report.mmsi, name, monitor).await
                }
            }
        }
    }

    #[allow(clippy::too_many_arguments)]
    async fn position<S: ObjectSink>(
        &mut self,
        mmsi: u32,
        latitude: Option<f64>,
        longitude: Option<f64>,
        sog: Option<f64>,
        cog: Option<f64>,
        heading: Option<u16>,
        base_station: bool,
        sink: &mut S,
        monitor: &Monitor,
        now: u64,
    ) {
        let (Some(latitude), Some(longitude)) = (latitude, longitude) else {
            return;
        };
        if !(-90. ..=90.).contains(&latitude)
            || !(-180. ..=180.).contains(&longitude)
        {
            return;
        }
        if latitude.abs() < 0.001 && longitude.abs() < 0.001 {
            debug!("{}: null island fix dropped", mmsi);
            return;
        }
        let range = geo::distance_nm(
            self.center.0,
            self.center.1,
            latitude,
            longitude,
        );
        if range > MAX_RANGE_NM {
            debug!("{}: {:.0} nm out of range", mmsi, range);
            return;
        }
        if let Some(prev) = self.last_fix.get(&mmsi) {
            let jump = geo::distance_nm(
                prev.latitude,
                prev.longitude,
                latitude,
                longitude,
            );
            if now <= prev.at + TELEPORT_TIME_SEC && jump > TELEPORT_MOVE_NM {
                debug!("{}: teleport of {:.0} nm rejected", mmsi, jump);
                return;
            }
        }

        let object_name = format!("{:09}", mmsi);
        let display_name = {
            let board = monitor.vessels.lock().await;
            board.names.get(&mmsi).cloned()
        };

        let mut comment = String::new();
        if let Some(name) = &display_name {
            comment.push_str(&format!("NAME {} ", name));
        }
        comment.push_str(&format!("SOG {}kt ", sog.unwrap_or(0.) as i64));
        comment.push_str(&format!("COG {:03} ", cog.unwrap_or(0.) as i64));
        if let Some(heading) = heading {
            comment.push_str(&format!("HDG {} ", heading));
        }
        comment.push_str(&format!("MMSI {}", object_name));

        let object = AprsObject {
            name: object_name.clone(),
            timestamp: geo::aprs_timestamp(now),
            latitude,
            longitude,
            symbol_table: '/',
            symbol_code: if base_station { 'r' } else { 's' },
            comment,
        };
        if !sink.send_object(&object).await {
            return;
        }

        self.last_fix.insert(
            mmsi,
            LastFix {
                latitude,
                longitude,
                at: now,
            },
        );
        let mut board = monitor.vessels.lock().await;
        board.vessels.insert(
            object_name.clone(),
            VesselSnapshot {
                object_name,
                mmsi: format!("{:09}", mmsi),
                kind: if base_station { "base station" } else { "vessel" },
                display_name: display_name.unwrap_or_default(),
                latitude: format!("{:.5}", latitude),
                longitude: format!("{:.5}", longitude),
                sog: sog.map(|v| format!("{:.1}", v)).unwrap_or_default(),
                cog: cog.map(|v| format!("{:.1}", v)).unwrap_or_default(),
                heading: heading.map(|v| v.to_string()).unwrap_or_default(),
                last_seen: geo::clock_hms(now),
            },
        );
    }

    /// Static messages never emit an APRS line: they feed the name cache
    /// and refresh the display name of a vessel already on the board.
    async fn vessel_name(&mut self, mmsi: u32, name: &str, monitor: &Monitor) {
        if name.is_empty() {
            return;
        }
        let mut board = monitor.vessels.lock().await;
        board.names.insert(mmsi, name.to_string());
        let object_name = format!("{:09}", mmsi);
        if let Some(snapshot) = board.vessels.get_mut(&object_name) {
            snapshot.display_name = name.to_string();
        }
    }
}

/// Accepts one AIS-catcher client at a time and feeds its sentences through
/// reassembly, decoding and the vessel tracker.
pub async fn run<S: ObjectSink>(
    bind: String,
    center: (f64, f64),
    monitor: Arc<Monitor>,
    mut sink: S,
) {
    let listener = loop {
        match TcpListener::bind(&bind).await {
            Ok(listener) => break listener,
            Err(e) => {
                warn!("cannot bind AIS listener {}: {}", bind, e);
                sleep(ACCEPT_RETRY_DELAY).await;
            }
        }
    };
    info!("listening for AIS sentences on {}", bind);

    let mut tracker = VesselTracker::new(center);
    let mut assembler = Assembler::default();
    loop {
        let (stream, peer) = match listener.accept().await {
            Ok(accepted) => accepted,
            Err(e) => {
                warn!("AIS accept failed: {}", e);
                sleep(ACCEPT_RETRY_DELAY).await;
                continue;
            }
        };
        info!("AIS feed connected from {}", peer);
        let mut lines = BufReader::new(stream).lines();
        loop {
            match lines.next_line().await {
                Ok(Some(line)) => {
                    let now = epoch_now();
                    let Some((payload, fill_bits)) =
                        assembler.push(&line, now)
                    else {
                        continue;
                    };
                    let Some(msg) = Message::from_payload(&payload, fill_bits)
                    else {
                        continue;
                    };
                    tracker.handle(&msg, &mut sink, &monitor, now).await;
                }
                Ok(None) => {
                    info!("AIS feed disconnected");
                    break;
                }
                Err(e) => {
                    warn!("AIS read error: {}", e);
                    break;
                }
            }
        }
    }
}
