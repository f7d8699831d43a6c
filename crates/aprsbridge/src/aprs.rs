//! APRS-IS client: login, reconnection and rate-limited object injection.

use crate::geo;
use std::time::{SystemTime, UNIX_EPOCH};
use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;
use tokio::time::{sleep, Duration};
use tracing::{info, warn};

/// Lines on the wire per pipeline per wall-clock second
pub const MAX_PKTS_PER_SEC: u32 = 5;

const RECONNECT_DELAY: Duration = Duration::from_secs(3);

pub fn epoch_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("SystemTime before unix epoch")
        .as_secs()
}

/// One APRS Object report.
///
/// The name is exactly 9 characters, space padded; the packet body is
/// `;NAME9    *HHMMSSz<lat><tbl><lon><code><comment>`.
#[derive(Debug, Clone, PartialEq)]
pub struct AprsObject {
    pub name: String,
    pub timestamp: String,
    pub latitude: f64,
    pub longitude: f64,
    pub symbol_table: char,
    pub symbol_code: char,
    pub comment: String,
}

impl AprsObject {
    pub fn packet(&self) -> String {
        format!(
            ";{}*{}{}{}{}{}{}",
            self.name,
            self.timestamp,
            geo::aprs_latitude(self.latitude),
            self.symbol_table,
            geo::aprs_longitude(self.longitude),
            self.symbol_code,
            self.comment
        )
    }
}

/// Seam between the track managers and the APRS-IS connection.
#[allow(async_fn_in_trait)]
pub trait ObjectSink {
    /// Returns true once the line is on the wire. A false return means the
    /// line was dropped (rate cap or transport failure) and must not be
    /// recorded as sent.
    async fn send_object(&mut self, object: &AprsObject) -> bool;
}

/// Counts lines per wall-clock second, refilled when the second rolls over.
#[derive(Debug)]
pub struct RateBucket {
    capacity: u32,
    second: u64,
    sent: u32,
}

impl RateBucket {
    pub fn new(capacity: u32) -> Self {
        RateBucket {
            capacity,
            second: 0,
            sent: 0,
        }
    }

    pub fn admit(&mut self, now: u64) -> bool {
        if now != self.second {
            self.second = now;
            self.sent = 0;
        }
        if self.sent >= self.capacity {
            return false;
        }
        self.sent += 1;
        true
    }
}

pub struct AprsClient {
    server: String,
    callsign: String,
    passcode: String,
    stream: Option<TcpStream>,
    bucket: RateBucket,
}

impl AprsClient {
    pub fn new(server: &str, callsign: &str, passcode: &str) -> Self {
        AprsClient {
            server: server.to_string(),
            callsign: callsign.to_string(),
            passcode: passcode.to_string(),
            stream: None,
            bucket: RateBucket::new(MAX_PKTS_PER_SEC),
        }
    }

    /// Connect and log in, retrying until the server accepts the TCP
    /// connection. Credentials are not validated: APRS-IS replies on its
    /// own time and the injection path is write-only.
    async fn connect(&mut self) -> TcpStream {
        loop {
            match TcpStream::connect(&self.server).await {
                Ok(mut stream) => {
                    let login = format!(
                        "user {} pass {} vers aprsbridge {} filter m/500\n",
                        self.callsign,
                        self.passcode,
                        env!("CARGO_PKG_VERSION"),
                    );
                    match stream.write_all(login.as_bytes()).await {
                        Ok(()) => {
                            info!("logged in to APRS-IS at {}", self.server);
                            return stream;
                        }
                        Err(e) => warn!("APRS-IS login failed: {}", e),
                    }
                }
                Err(e) => {
                    warn!("APRS-IS connect {} failed: {}", self.server, e)
                }
            }
            sleep(RECONNECT_DELAY).await;
        }
    }

    async fn send_line(&mut self, line: &str) -> bool {
        if self.stream.is_none() {
            self.stream = Some(self.connect().await);
        }
        let stream = self.stream.as_mut().unwrap();
        match stream.write_all(line.as_bytes()).await {
            Ok(()) => true,
            Err(e) => {
                // The line is lost; the next send reconnects.
                warn!("APRS-IS send failed, dropping connection: {}", e);
                self.stream = None;
                false
            }
        }
    }
}

impl ObjectSink for AprsClient {
    async fn send_object(&mut self, object: &AprsObject) -> bool {
        if !self.bucket.admit(epoch_now()) {
            return false;
        }
        let line =
            format!("{}>APRS,TCPIP*:{}\n", self.callsign, object.packet());
        self.send_line(&line).await
    }
}

/// Records objects instead of sending them; `accept = false` emulates a
/// saturated rate bucket or a dead connection.
#[cfg(test)]
pub(crate) struct RecordingSink {
    pub sent: Vec<AprsObject>,
    pub accept: bool,
}

#[cfg(test)]
impl RecordingSink {
    pub fn new() -> Self {
        RecordingSink {
            sent: Vec::new(),
            accept: true,
        }
    }
}

#[cfg(test)]
impl ObjectSink for RecordingSink {
    async fn send_object(&mut self, object: &AprsObject) -> bool {
        if self.accept {
            self.sent.push(object.clone());
        }
        self.accept
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_packet_format() {
        let object = AprsObject {
            name: "366053209".to_string(),
            timestamp: "120045z".to_string(),
            latitude: 37.810205,
            longitude: -122.341618,
            symbol_table: '/',
            symbol_code: 's',
            comment: "SOG 0kt COG 175 MMSI 366053209".to_string(),
        };
        assert_eq!(
            object.packet(),
            ";366053209*120045z3748.61N/12220.50Ws\
             SOG 0kt COG 175 MMSI 366053209"
        );
        // Name field is exactly 9 characters wide
        assert_eq!(object.packet().find('*'), Some(10));
    }

    #[test]
    fn test_rate_bucket() {
        let mut bucket = RateBucket::new(5);
        for _ in 0..5 {
            assert!(bucket.admit(100));
        }
        assert!(!bucket.admit(100));
        // refills on the next wall-clock second
        assert!(bucket.admit(101));
    }
}
