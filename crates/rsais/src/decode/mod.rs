//! An AIS payload is transmitted in NMEA sentences as "armored" ASCII: each
//! character carries 6 bits of the original binary message.
//!
//! After unarmoring, all messages share a common 38-bit header:
//!
//! | type | repeat | MMSI |
//! | ---- | ------ | ---- |
//! | 6    | 2      | 30   |
//!
//! The remaining layout depends on the message type, decoded in [`Message`].

use deku::bitvec::{BitSlice, BitVec, Msb0};
use deku::prelude::*;
use serde::Serialize;

/// Map one armored character back to its 6-bit value.
///
/// Values 0..=39 are carried by characters 48..=87, values 40..=63 by
/// characters 96..=119.
fn unarmor(c: u8) -> Option<u8> {
    match c {
        48..=87 => Some(c - 48),
        96..=119 => Some(c - 56),
        _ => None,
    }
}

/// Expand an armored payload into a bit buffer, dropping the trailing
/// `fill_bits` padding of the last character.
pub fn sixbit_unarmor(
    payload: &str,
    fill_bits: u8,
) -> Option<BitVec<u8, Msb0>> {
    let mut bits = BitVec::with_capacity(payload.len() * 6);
    for c in payload.bytes() {
        let value = unarmor(c)?;
        for shift in (0..6).rev() {
            bits.push(value >> shift & 1 == 1);
        }
    }
    let fill_bits = fill_bits as usize;
    if fill_bits > 5 || fill_bits > bits.len() {
        return None;
    }
    bits.truncate(bits.len() - fill_bits);
    Some(bits)
}

#[derive(Debug, PartialEq, Serialize, DekuRead, Clone)]
#[deku(type = "u8", bits = "6")]
#[serde(tag = "type")]
pub enum Message {
    /// Types 1, 2 and 3: Class A position report
    #[deku(id_pat = "1..=3")]
    PositionReport(PositionReport),

    /// Type 4: base station report
    #[deku(id_pat = "4")]
    BaseStationReport(BaseStationReport),

    /// Type 5: static and voyage related data
    #[deku(id_pat = "5")]
    StaticAndVoyageData(StaticAndVoyageData),

    /// Types 18 and 19: Class B position report
    #[deku(id_pat = "18 | 19")]
    ClassBPositionReport(ClassBPositionReport),

    /// Type 24: static data report (only part A carries the name)
    #[deku(id_pat = "24")]
    StaticDataReport(StaticDataReport),

    /// Type 27: long-range broadcast position report
    #[deku(id_pat = "27")]
    LongRangePositionReport(LongRangePositionReport),
}

impl Message {
    /// Decode an armored payload as released by the frame assembler.
    ///
    /// Unsupported message types and truncated or otherwise undecodable
    /// payloads yield `None`.
    pub fn from_payload(payload: &str, fill_bits: u8) -> Option<Message> {
        let bits = sixbit_unarmor(payload, fill_bits)?;
        let msgtype = payload.bytes().next().and_then(unarmor)?;
        // Static messages are only meaningful when the text fields are
        // complete; short variants seen in the wild are dropped.
        let min_bits = match msgtype {
            5 => 424,
            24 => 160,
            _ => 38,
        };
        if bits.len() < min_bits {
            return None;
        }
        match Message::read(&bits, ()) {
            Ok((_rest, msg)) => Some(msg),
            Err(_) => None,
        }
    }

    pub fn mmsi(&self) -> u32 {
        match self {
            Message::PositionReport(msg) => msg.mmsi,
            Message::BaseStationReport(msg) => msg.mmsi,
            Message::StaticAndVoyageData(msg) => msg.mmsi,
            Message::ClassBPositionReport(msg) => msg.mmsi,
            Message::StaticDataReport(msg) => msg.mmsi,
            Message::LongRangePositionReport(msg) => msg.mmsi,
        }
    }
}

/**
 * ## Class A position report (types 1, 2, 3)
 *
 * | type | repeat | MMSI | status | turn | SOG | acc | lon | lat | COG | HDG |
 * | ---- | ------ | ---- | ------ | ---- | --- | --- | --- | --- | --- | --- |
 * | 6    | 2      | 30   | 4      | 8    | 10  | 1   | 28  | 27  | 12  | 9   |
 */
#[derive(Debug, PartialEq, Serialize, DekuRead, Clone)]
pub struct PositionReport {
    #[deku(bits = "2")]
    #[serde(skip)]
    pub repeat: u8,

    #[deku(bits = "30", endian = "big")]
    pub mmsi: u32,

    /// Navigation status (0 = under way using engine, 15 = undefined)
    #[deku(bits = "4")]
    #[serde(skip)]
    pub status: u8,

    /// Rate of turn, raw AIS encoding
    #[deku(bits = "8")]
    #[serde(skip)]
    pub turn: u8,

    /// Speed over ground in knots, None if not available
    #[deku(reader = "read_sog(deku::rest)")]
    pub sog: Option<f64>,

    #[deku(bits = "1")]
    #[serde(skip)]
    pub accuracy: u8,

    /// Longitude in degrees, None if not available
    #[deku(reader = "read_lon28(deku::rest)")]
    pub longitude: Option<f64>,

    /// Latitude in degrees, None if not available
    #[deku(reader = "read_lat27(deku::rest)")]
    pub latitude: Option<f64>,

    /// Course over ground in degrees, None if not available
    #[deku(reader = "read_cog(deku::rest)")]
    pub cog: Option<f64>,

    /// True heading in degrees, None if not available
    #[deku(reader = "read_heading(deku::rest)")]
    pub heading: Option<u16>,
}

/**
 * ## Base station report (type 4)
 *
 * The UTC date fields are decoded but a fixed station has no motion: the
 * position is the only payload of interest downstream.
 */
#[derive(Debug, PartialEq, Serialize, DekuRead, Clone)]
pub struct BaseStationReport {
    #[deku(bits = "2")]
    #[serde(skip)]
    pub repeat: u8,

    #[deku(bits = "30", endian = "big")]
    pub mmsi: u32,

    #[deku(bits = "14", endian = "big")]
    #[serde(skip)]
    pub year: u16,
    #[deku(bits = "4")]
    #[serde(skip)]
    pub month: u8,
    #[deku(bits = "5")]
    #[serde(skip)]
    pub day: u8,
    #[deku(bits = "5")]
    #[serde(skip)]
    pub hour: u8,
    #[deku(bits = "6")]
    #[serde(skip)]
    pub minute: u8,
    #[deku(bits = "6")]
    #[serde(skip)]
    pub second: u8,

    #[deku(bits = "1")]
    #[serde(skip)]
    pub accuracy: u8,

    #[deku(reader = "read_lon28(deku::rest)")]
    pub longitude: Option<f64>,

    #[deku(reader = "read_lat27(deku::rest)")]
    pub latitude: Option<f64>,
}

/**
 * ## Static and voyage related data (type 5)
 *
 * | type | repeat | MMSI | version | IMO | callsign | name     |
 * | ---- | ------ | ---- | ------- | --- | -------- | -------- |
 * | 6    | 2      | 30   | 2       | 30  | 42 (7ch) | 120 (20ch) |
 *
 * The remaining voyage fields (ship type, dimensions, ETA, destination) are
 * not decoded.
 */
#[derive(Debug, PartialEq, Serialize, DekuRead, Clone)]
pub struct StaticAndVoyageData {
    #[deku(bits = "2")]
    #[serde(skip)]
    pub repeat: u8,

    #[deku(bits = "30", endian = "big")]
    pub mmsi: u32,

    #[deku(bits = "2")]
    #[serde(skip)]
    pub ais_version: u8,

    #[deku(bits = "30", endian = "big")]
    pub imo: u32,

    #[deku(reader = "read_text(deku::rest, 7)")]
    pub callsign: String,

    /// Vessel name, right-trimmed
    #[deku(reader = "read_text(deku::rest, 20)")]
    pub name: String,
}

/**
 * ## Class B position report (types 18, 19)
 *
 * Same fields as Class A with a reserved byte in place of status and turn.
 */
#[derive(Debug, PartialEq, Serialize, DekuRead, Clone)]
pub struct ClassBPositionReport {
    #[deku(bits = "2")]
    #[serde(skip)]
    pub repeat: u8,

    #[deku(bits = "30", endian = "big")]
    pub mmsi: u32,

    #[deku(bits = "8")]
    #[serde(skip)]
    pub reserved: u8,

    #[deku(reader = "read_sog(deku::rest)")]
    pub sog: Option<f64>,

    #[deku(bits = "1")]
    #[serde(skip)]
    pub accuracy: u8,

    #[deku(reader = "read_lon28(deku::rest)")]
    pub longitude: Option<f64>,

    #[deku(reader = "read_lat27(deku::rest)")]
    pub latitude: Option<f64>,

    #[deku(reader = "read_cog(deku::rest)")]
    pub cog: Option<f64>,

    #[deku(reader = "read_heading(deku::rest)")]
    pub heading: Option<u16>,
}

/// ## Static data report (type 24)
///
/// Part A (`part_no` 0 or 1) carries the vessel name. Part B carries the
/// callsign and dimensions and is skipped.
#[derive(Debug, PartialEq, Serialize, DekuRead, Clone)]
pub struct StaticDataReport {
    #[deku(bits = "2")]
    #[serde(skip)]
    pub repeat: u8,

    #[deku(bits = "30", endian = "big")]
    pub mmsi: u32,

    #[deku(bits = "2")]
    #[serde(skip)]
    pub part_no: u8,

    #[deku(reader = "read_part_a_name(deku::rest, *part_no)")]
    pub name: Option<String>,
}

/**
 * ## Long-range broadcast position report (type 27)
 *
 * Reduced-precision position on 18 + 17 bits, scaled by 1/600 degree.
 */
#[derive(Debug, PartialEq, Serialize, DekuRead, Clone)]
pub struct LongRangePositionReport {
    #[deku(bits = "2")]
    #[serde(skip)]
    pub repeat: u8,

    #[deku(bits = "30", endian = "big")]
    pub mmsi: u32,

    #[deku(bits = "1")]
    #[serde(skip)]
    pub accuracy: u8,

    #[deku(bits = "1")]
    #[serde(skip)]
    pub raim: u8,

    #[deku(bits = "4")]
    #[serde(skip)]
    pub status: u8,

    #[deku(reader = "read_lon18(deku::rest)")]
    pub longitude: Option<f64>,

    #[deku(reader = "read_lat17(deku::rest)")]
    pub latitude: Option<f64>,
}

fn read_sog(
    rest: &BitSlice<u8, Msb0>,
) -> Result<(&BitSlice<u8, Msb0>, Option<f64>), DekuError> {
    let (rest, raw) =
        u16::read(rest, (deku::ctx::Endian::Big, deku::ctx::BitSize(10)))?;
    let sog = match raw {
        1023 => None,
        raw => Some(raw as f64 / 10.),
    };
    Ok((rest, sog))
}

fn read_cog(
    rest: &BitSlice<u8, Msb0>,
) -> Result<(&BitSlice<u8, Msb0>, Option<f64>), DekuError> {
    let (rest, raw) =
        u16::read(rest, (deku::ctx::Endian::Big, deku::ctx::BitSize(12)))?;
    let cog = match raw {
        raw if raw >= 3600 => None,
        raw => Some(raw as f64 / 10.),
    };
    Ok((rest, cog))
}

fn read_heading(
    rest: &BitSlice<u8, Msb0>,
) -> Result<(&BitSlice<u8, Msb0>, Option<u16>), DekuError> {
    let (rest, raw) =
        u16::read(rest, (deku::ctx::Endian::Big, deku::ctx::BitSize(9)))?;
    let heading = match raw {
        511 => None,
        raw => Some(raw),
    };
    Ok((rest, heading))
}

/// Longitude on 28 bits, two's complement, 1/600000 degree.
/// The all-but-sentinel range check also covers the 181° "not available"
/// value.
fn read_lon28(
    rest: &BitSlice<u8, Msb0>,
) -> Result<(&BitSlice<u8, Msb0>, Option<f64>), DekuError> {
    let (rest, raw) =
        u32::read(rest, (deku::ctx::Endian::Big, deku::ctx::BitSize(28)))?;
    let raw = if raw & (1 << 27) != 0 {
        raw as i64 - (1 << 28)
    } else {
        raw as i64
    };
    let lon = match raw.abs() {
        value if value >= 108_600_000 => None,
        _ => Some(raw as f64 / 600_000.),
    };
    Ok((rest, lon))
}

/// Latitude on 27 bits, two's complement, 1/600000 degree.
fn read_lat27(
    rest: &BitSlice<u8, Msb0>,
) -> Result<(&BitSlice<u8, Msb0>, Option<f64>), DekuError> {
    let (rest, raw) =
        u32::read(rest, (deku::ctx::Endian::Big, deku::ctx::BitSize(27)))?;
    let raw = if raw & (1 << 26) != 0 {
        raw as i64 - (1 << 27)
    } else {
        raw as i64
    };
    let lat = match raw.abs() {
        value if value >= 54_600_000 => None,
        _ => Some(raw as f64 / 600_000.),
    };
    Ok((rest, lat))
}

/// Longitude on 18 bits, two's complement, 1/600 degree (type 27)
fn read_lon18(
    rest: &BitSlice<u8, Msb0>,
) -> Result<(&BitSlice<u8, Msb0>, Option<f64>), DekuError> {
    let (rest, raw) =
        u32::read(rest, (deku::ctx::Endian::Big, deku::ctx::BitSize(18)))?;
    if raw == 0x1FFFF {
        return Ok((rest, None));
    }
    let raw = if raw & (1 << 17) != 0 {
        raw as i64 - (1 << 18)
    } else {
        raw as i64
    };
    Ok((rest, Some(raw as f64 / 600.)))
}

/// Latitude on 17 bits, two's complement, 1/600 degree (type 27)
fn read_lat17(
    rest: &BitSlice<u8, Msb0>,
) -> Result<(&BitSlice<u8, Msb0>, Option<f64>), DekuError> {
    let (rest, raw) =
        u32::read(rest, (deku::ctx::Endian::Big, deku::ctx::BitSize(17)))?;
    if raw == 0x1FFFF {
        return Ok((rest, None));
    }
    let raw = if raw & (1 << 16) != 0 {
        raw as i64 - (1 << 17)
    } else {
        raw as i64
    };
    Ok((rest, Some(raw as f64 / 600.)))
}

/// Six-bit ASCII text: each value maps to `value + 0x20`, `@` stands for a
/// padding space, trailing spaces are trimmed.
fn read_text(
    rest: &BitSlice<u8, Msb0>,
    count: usize,
) -> Result<(&BitSlice<u8, Msb0>, String), DekuError> {
    let mut inside_rest = rest;
    let mut text = String::with_capacity(count);
    for _ in 0..count {
        let (for_rest, value) = <u8>::read(inside_rest, deku::ctx::BitSize(6))?;
        let c = (value + 0x20) as char;
        text.push(if c == '@' { ' ' } else { c });
        inside_rest = for_rest;
    }
    Ok((inside_rest, text.trim_end().to_string()))
}

fn read_part_a_name(
    rest: &BitSlice<u8, Msb0>,
    part_no: u8,
) -> Result<(&BitSlice<u8, Msb0>, Option<String>), DekuError> {
    if part_no > 1 {
        return Ok((rest, None));
    }
    let (rest, name) = read_text(rest, 20)?;
    Ok((rest, Some(name)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    /// Append `width` bits of `value`, most significant first
    fn push_bits(bits: &mut BitVec<u8, Msb0>, value: u64, width: usize) {
        for shift in (0..width).rev() {
            bits.push(value >> shift & 1 == 1);
        }
    }

    fn push_text(bits: &mut BitVec<u8, Msb0>, text: &str, count: usize) {
        for i in 0..count {
            let value = match text.as_bytes().get(i) {
                Some(c) => (c - 0x20) as u64,
                None => 0, // padding space
            };
            push_bits(bits, value, 6);
        }
    }

    /// Inverse of [`sixbit_unarmor`]: pad to a 6-bit boundary and armor
    fn armor(bits: &BitVec<u8, Msb0>) -> (String, u8) {
        let fill = (6 - bits.len() % 6) % 6;
        let mut bits = bits.clone();
        for _ in 0..fill {
            bits.push(false);
        }
        let payload = bits
            .chunks(6)
            .map(|chunk| {
                let value =
                    chunk.iter().fold(0u8, |acc, b| acc << 1 | *b as u8);
                (if value < 40 { value + 48 } else { value + 56 }) as char
            })
            .collect();
        (payload, fill as u8)
    }

    fn twos(value: i64, width: usize) -> u64 {
        (value & ((1 << width) - 1)) as u64
    }

    #[test]
    fn test_sixbit_roundtrip() {
        let mut bits = BitVec::new();
        push_bits(&mut bits, 0b110100101100111, 15);
        let (payload, fill) = armor(&bits);
        assert_eq!(fill, 3);
        let decoded = sixbit_unarmor(&payload, fill).unwrap();
        assert_eq!(decoded, bits);
    }

    #[test]
    fn test_position_report() {
        // Live sample from AIS-catcher: a Class A vessel in San Francisco Bay
        let msg = Message::from_payload("15M67FC000G?ufbE`abnoL0081P00", 0)
            .unwrap();
        let Message::PositionReport(report) = msg else {
            panic!("expected a position report");
        };
        assert_eq!(report.mmsi, 366053209);
        assert_eq!(report.sog, Some(0.));
        assert_relative_eq!(
            report.longitude.unwrap(),
            -122.341618,
            epsilon = 1e-5
        );
        assert_relative_eq!(
            report.latitude.unwrap(),
            37.810205,
            epsilon = 1e-5
        );
        assert_relative_eq!(report.cog.unwrap(), 175.7, epsilon = 1e-5);
    }

    #[test]
    fn test_synthetic_position() {
        let mut bits = BitVec::new();
        push_bits(&mut bits, 1, 6); // type
        push_bits(&mut bits, 0, 2);
        push_bits(&mut bits, 366123456, 30); // MMSI
        push_bits(&mut bits, 0, 4);
        push_bits(&mut bits, 0, 8);
        push_bits(&mut bits, 123, 10); // SOG 12.3 kt
        push_bits(&mut bits, 1, 1);
        push_bits(&mut bits, twos(-47_220_000, 28), 28); // -78.7
        push_bits(&mut bits, twos(25_740_000, 27), 27); // 42.9
        push_bits(&mut bits, 2450, 12); // COG 245.0
        push_bits(&mut bits, 87, 9); // HDG
        push_bits(&mut bits, 0, 31); // timestamp and flags
        assert_eq!(bits.len(), 168);
        let (payload, fill) = armor(&bits);
        let msg = Message::from_payload(&payload, fill).unwrap();
        let Message::PositionReport(report) = msg else {
            panic!("expected a position report");
        };
        assert_eq!(report.mmsi, 366123456);
        assert_relative_eq!(report.sog.unwrap(), 12.3);
        assert_relative_eq!(report.longitude.unwrap(), -78.7, epsilon = 1e-6);
        assert_relative_eq!(report.latitude.unwrap(), 42.9, epsilon = 1e-6);
        assert_relative_eq!(report.cog.unwrap(), 245.);
        assert_eq!(report.heading, Some(87));
    }

    #[test]
    fn test_sentinel_fields() {
        let mut bits = BitVec::new();
        push_bits(&mut bits, 2, 6);
        push_bits(&mut bits, 0, 2);
        push_bits(&mut bits, 123456789, 30);
        push_bits(&mut bits, 0, 12);
        push_bits(&mut bits, 1023, 10); // SOG not available
        push_bits(&mut bits, 0, 1);
        push_bits(&mut bits, twos(181 * 600_000, 28), 28); // lon n/a
        push_bits(&mut bits, twos(91 * 600_000, 27), 27); // lat n/a
        push_bits(&mut bits, 3600, 12); // COG n/a
        push_bits(&mut bits, 511, 9); // HDG n/a
        push_bits(&mut bits, 0, 31);
        let (payload, fill) = armor(&bits);
        let msg = Message::from_payload(&payload, fill).unwrap();
        let Message::PositionReport(report) = msg else {
            panic!("expected a position report");
        };
        assert_eq!(report.sog, None);
        assert_eq!(report.longitude, None);
        assert_eq!(report.latitude, None);
        assert_eq!(report.cog, None);
        assert_eq!(report.heading, None);
    }

    #[test]
    fn test_class_b() {
        let mut bits = BitVec::new();
        push_bits(&mut bits, 18, 6);
        push_bits(&mut bits, 0, 2);
        push_bits(&mut bits, 338000001, 30);
        push_bits(&mut bits, 0, 8); // reserved
        push_bits(&mut bits, 57, 10); // SOG 5.7 kt
        push_bits(&mut bits, 0, 1);
        push_bits(&mut bits, twos(-47_239_200, 28), 28);
        push_bits(&mut bits, twos(25_764_000, 27), 27);
        push_bits(&mut bits, 912, 12);
        push_bits(&mut bits, 91, 9);
        push_bits(&mut bits, 0, 35);
        let (payload, fill) = armor(&bits);
        let msg = Message::from_payload(&payload, fill).unwrap();
        let Message::ClassBPositionReport(report) = msg else {
            panic!("expected a Class B position report");
        };
        assert_eq!(report.mmsi, 338000001);
        assert_relative_eq!(report.sog.unwrap(), 5.7);
        assert_relative_eq!(report.longitude.unwrap(), -78.732, epsilon = 1e-6);
        assert_relative_eq!(report.latitude.unwrap(), 42.94, epsilon = 1e-6);
        assert_eq!(report.heading, Some(91));
    }

    #[test]
    fn test_base_station() {
        let mut bits = BitVec::new();
        push_bits(&mut bits, 4, 6);
        push_bits(&mut bits, 0, 2);
        push_bits(&mut bits, 3669999, 30);
        push_bits(&mut bits, 2024, 14);
        push_bits(&mut bits, 6, 4);
        push_bits(&mut bits, 15, 5);
        push_bits(&mut bits, 12, 5);
        push_bits(&mut bits, 30, 6);
        push_bits(&mut bits, 0, 6);
        push_bits(&mut bits, 1, 1);
        push_bits(&mut bits, twos(-47_220_000, 28), 28);
        push_bits(&mut bits, twos(25_740_000, 27), 27);
        push_bits(&mut bits, 0, 34);
        let (payload, fill) = armor(&bits);
        let msg = Message::from_payload(&payload, fill).unwrap();
        let Message::BaseStationReport(report) = msg else {
            panic!("expected a base station report");
        };
        assert_eq!(report.mmsi, 3669999);
        assert_relative_eq!(report.longitude.unwrap(), -78.7, epsilon = 1e-6);
        assert_relative_eq!(report.latitude.unwrap(), 42.9, epsilon = 1e-6);
    }

    #[test]
    fn test_static_and_voyage() {
        let mut bits = BitVec::new();
        push_bits(&mut bits, 5, 6);
        push_bits(&mut bits, 0, 2);
        push_bits(&mut bits, 366999999, 30);
        push_bits(&mut bits, 0, 2);
        push_bits(&mut bits, 9074729, 30); // IMO
        push_text(&mut bits, "WDA1234", 7);
        push_text(&mut bits, "EXAMPLE", 20);
        push_bits(&mut bits, 0, 192); // voyage fields, not decoded
        assert_eq!(bits.len(), 424);
        let (payload, fill) = armor(&bits);
        let msg = Message::from_payload(&payload, fill).unwrap();
        let Message::StaticAndVoyageData(report) = msg else {
            panic!("expected static and voyage data");
        };
        assert_eq!(report.mmsi, 366999999);
        assert_eq!(report.imo, 9074729);
        assert_eq!(report.callsign, "WDA1234");
        assert_eq!(report.name, "EXAMPLE");
    }

    #[test]
    fn test_static_too_short() {
        let mut bits = BitVec::new();
        push_bits(&mut bits, 5, 6);
        push_bits(&mut bits, 0, 2);
        push_bits(&mut bits, 366999999, 30);
        push_bits(&mut bits, 0, 2);
        push_bits(&mut bits, 0, 30);
        push_text(&mut bits, "WDA1234", 7);
        push_text(&mut bits, "EXAMPLE", 20);
        // 232 bits: name present but the message is truncated
        let (payload, fill) = armor(&bits);
        assert_eq!(Message::from_payload(&payload, fill), None);
    }

    #[test]
    fn test_static_data_report() {
        let mut bits = BitVec::new();
        push_bits(&mut bits, 24, 6);
        push_bits(&mut bits, 0, 2);
        push_bits(&mut bits, 338123456, 30);
        push_bits(&mut bits, 0, 2); // part A
        push_text(&mut bits, "SEA DUCK", 20);
        assert_eq!(bits.len(), 160);
        let (payload, fill) = armor(&bits);
        let msg = Message::from_payload(&payload, fill).unwrap();
        let Message::StaticDataReport(report) = msg else {
            panic!("expected a static data report");
        };
        assert_eq!(report.part_no, 0);
        assert_eq!(report.name.as_deref(), Some("SEA DUCK"));
    }

    #[test]
    fn test_long_range() {
        let mut bits = BitVec::new();
        push_bits(&mut bits, 27, 6);
        push_bits(&mut bits, 0, 2);
        push_bits(&mut bits, 367000000, 30);
        push_bits(&mut bits, 0, 2);
        push_bits(&mut bits, 0, 4);
        push_bits(&mut bits, twos(-47_220, 18), 18); // -78.7
        push_bits(&mut bits, twos(25_740, 17), 17); // 42.9
        push_bits(&mut bits, 0, 17);
        let (payload, fill) = armor(&bits);
        let msg = Message::from_payload(&payload, fill).unwrap();
        let Message::LongRangePositionReport(report) = msg else {
            panic!("expected a long-range report");
        };
        assert_relative_eq!(report.longitude.unwrap(), -78.7, epsilon = 1e-6);
        assert_relative_eq!(report.latitude.unwrap(), 42.9, epsilon = 1e-6);

        // 0x1FFFF marks either field as not available
        let mut bits = BitVec::new();
        push_bits(&mut bits, 27, 6);
        push_bits(&mut bits, 0, 2);
        push_bits(&mut bits, 367000000, 30);
        push_bits(&mut bits, 0, 6);
        push_bits(&mut bits, 0x1FFFF, 18);
        push_bits(&mut bits, 0x1FFFF, 17);
        push_bits(&mut bits, 0, 17);
        let (payload, fill) = armor(&bits);
        let msg = Message::from_payload(&payload, fill).unwrap();
        let Message::LongRangePositionReport(report) = msg else {
            panic!("expected a long-range report");
        };
        assert_eq!(report.longitude, None);
        assert_eq!(report.latitude, None);
    }

    #[test]
    fn test_serialize() {
        let msg = Message::from_payload("15M67FC000G?ufbE`abnoL0081P00", 0)
            .unwrap();
        let json = serde_json::to_string(&msg).unwrap();
        assert!(json.contains("\"type\":\"PositionReport\""));
        assert!(json.contains("\"mmsi\":366053209"));
    }

    #[test]
    fn test_unsupported_type() {
        let mut bits = BitVec::new();
        push_bits(&mut bits, 21, 6); // aid-to-navigation, not decoded
        push_bits(&mut bits, 0, 2);
        push_bits(&mut bits, 993672085, 30);
        push_bits(&mut bits, 0, 234);
        let (payload, fill) = armor(&bits);
        assert_eq!(Message::from_payload(&payload, fill), None);
    }
}
