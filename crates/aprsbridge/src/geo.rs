//! Great-circle distances and APRS position formatting.

pub const EARTH_RADIUS_MI: f64 = 3958.8;
pub const EARTH_RADIUS_NM: f64 = 3440.1;

fn haversine(lat1: f64, lon1: f64, lat2: f64, lon2: f64, radius: f64) -> f64 {
    let d_lat = (lat2 - lat1).to_radians();
    let d_lon = (lon2 - lon1).to_radians();
    let a = (d_lat / 2.0).sin() * (d_lat / 2.0).sin()
        + lat1.to_radians().cos()
            * lat2.to_radians().cos()
            * (d_lon / 2.0).sin()
            * (d_lon / 2.0).sin();
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());
    radius * c
}

pub fn distance_mi(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    haversine(lat1, lon1, lat2, lon2, EARTH_RADIUS_MI)
}

pub fn distance_nm(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    haversine(lat1, lon1, lat2, lon2, EARTH_RADIUS_NM)
}

/// APRS latitude, degrees and decimal minutes: `4256.43N`
pub fn aprs_latitude(lat: f64) -> String {
    let hemisphere = if lat < 0. { 'S' } else { 'N' };
    let lat = lat.abs();
    let degrees = lat.trunc();
    let minutes = (lat - degrees) * 60.;
    format!("{:02}{:05.2}{}", degrees as u32, minutes, hemisphere)
}

/// APRS longitude, degrees and decimal minutes: `07843.93W`
pub fn aprs_longitude(lon: f64) -> String {
    let hemisphere = if lon < 0. { 'W' } else { 'E' };
    let lon = lon.abs();
    let degrees = lon.trunc();
    let minutes = (lon - degrees) * 60.;
    format!("{:03}{:05.2}{}", degrees as u32, minutes, hemisphere)
}

/// APRS object timestamp for an epoch second: `012345z`
pub fn aprs_timestamp(now: u64) -> String {
    match chrono::DateTime::from_timestamp(now as i64, 0) {
        Some(datetime) => datetime.format("%H%M%Sz").to_string(),
        None => "000000z".to_string(),
    }
}

/// `HH:MM:SS` wall clock used by the monitor snapshots
pub fn clock_hms(now: u64) -> String {
    match chrono::DateTime::from_timestamp(now as i64, 0) {
        Some(datetime) => datetime.format("%H:%M:%S").to_string(),
        None => "--:--:--".to_string(),
    }
}
