//! SBS (BaseStation) line decoding for the dump1090 feed on port 30003.
//!
//! Only `MSG,3` (airborne position) and `MSG,4` (airborne velocity) records
//! are considered. Reference for the field layout:
//! <http://woodair.net/sbs/article/barebones42_socket_data.htm>

/// One positional SBS record. Motion fields are absent when the
/// corresponding CSV field is empty.
#[derive(Debug, Clone, PartialEq)]
pub struct SbsRecord {
    pub icao: String,
    pub callsign: Option<String>,
    pub altitude: Option<f64>,
    pub groundspeed: Option<f64>,
    pub track: Option<f64>,
    pub latitude: f64,
    pub longitude: f64,
}

fn non_empty(field: &str) -> Option<&str> {
    let field = field.trim();
    if field.is_empty() {
        None
    } else {
        Some(field)
    }
}

/// Parse one line from the SBS feed. Records without both latitude and
/// longitude never propagate.
pub fn parse_line(line: &str) -> Option<SbsRecord> {
    let fields: Vec<&str> = line.trim().split(',').collect();
    if fields.len() < 16 || fields[0] != "MSG" {
        return None;
    }
    match fields[1] {
        "3" | "4" => {}
        _ => return None,
    }
    let icao = non_empty(fields[4])?.to_uppercase();
    let latitude: f64 = non_empty(fields[14])?.parse().ok()?;
    let longitude: f64 = non_empty(fields[15])?.parse().ok()?;
    if !(-90. ..=90.).contains(&latitude)
        || !(-180. ..=180.).contains(&longitude)
    {
        return None;
    }
    Some(SbsRecord {
        icao,
        callsign: non_empty(fields[10]).map(|s| s.to_string()),
        altitude: non_empty(fields[11]).and_then(|s| s.parse().ok()),
        groundspeed: non_empty(fields[12]).and_then(|s| s.parse().ok()),
        track: non_empty(fields[13]).and_then(|s| s.parse().ok()),
        latitude,
        longitude,
    })
}
