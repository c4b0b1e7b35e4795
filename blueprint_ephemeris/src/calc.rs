use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::orbits;
use crate::points;

/// Julian Day of the J2000.0 epoch (2000-01-01 12:00).
pub const J2000: f64 = 2_451_545.0;

/// Days per Julian century.
pub const JULIAN_CENTURY: f64 = 36_525.0;

/// One Earth equatorial radius in astronomical units.
pub const EARTH_RADIUS_AU: f64 = 4.263_52e-5;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum EphemerisError {
    #[error("julian day {0} is not a finite number")]
    NonFiniteJulianDay(f64),

    #[error("calendar date {year}-{month}-{day} is out of range")]
    InvalidDate { year: i32, month: u32, day: u32 },
}

#[repr(i32)]
#[derive(Debug, PartialEq, Eq, Hash, Copy, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Body {
    Sun = 0,
    Moon = 1,
    Mercury = 2,
    Venus = 3,
    Mars = 4,
    Jupiter = 5,
    Saturn = 6,
    Uranus = 7,
    Neptune = 8,
    Pluto = 9,
    TrueNode = 11,
    Chiron = 15,
}

impl Body {
    pub const ALL: [Body; 12] = [
        Body::Sun,
        Body::Moon,
        Body::Mercury,
        Body::Venus,
        Body::Mars,
        Body::Jupiter,
        Body::Saturn,
        Body::Uranus,
        Body::Neptune,
        Body::Pluto,
        Body::TrueNode,
        Body::Chiron,
    ];

    pub fn iter() -> impl Iterator<Item = Body> {
        Body::ALL.iter().copied()
    }

    pub fn name(&self) -> &'static str {
        match self {
            Body::Sun => "Sun",
            Body::Moon => "Moon",
            Body::Mercury => "Mercury",
            Body::Venus => "Venus",
            Body::Mars => "Mars",
            Body::Jupiter => "Jupiter",
            Body::Saturn => "Saturn",
            Body::Uranus => "Uranus",
            Body::Neptune => "Neptune",
            Body::Pluto => "Pluto",
            Body::TrueNode => "True Node",
            Body::Chiron => "Chiron",
        }
    }
}

impl fmt::Display for Body {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Geocentric ecliptic coordinates, equinox of date.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BodyResult {
    /// Longitude in degrees, 0..360.
    pub longitude: f64,
    /// Latitude in degrees.
    pub latitude: f64,
    /// Distance in AU. Zero for the lunar node, which is a point, not a body.
    pub distance: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CalendarDate {
    pub year: i32,
    pub month: u32,
    pub day: u32,
    /// Hours past midnight, fractional.
    pub hour: f64,
}

/// Gregorian calendar date to Julian Day (Meeus, ch. 7).
pub fn julday(year: i32, month: u32, day: u32, hour: f64) -> Result<f64, EphemerisError> {
    if !(1..=12).contains(&month) || !(1..=31).contains(&day) {
        return Err(EphemerisError::InvalidDate { year, month, day });
    }
    let (y, m) = if month <= 2 {
        (year as f64 - 1.0, month as f64 + 12.0)
    } else {
        (year as f64, month as f64)
    };
    let a = (y / 100.0).floor();
    let b = 2.0 - a + (a / 4.0).floor();
    Ok((365.25 * (y + 4716.0)).floor() + (30.6001 * (m + 1.0)).floor() + day as f64 + b - 1524.5
        + hour / 24.0)
}

/// Julian Day back to a Gregorian calendar date.
pub fn revjul(jd: f64) -> Result<CalendarDate, EphemerisError> {
    ensure_finite(jd)?;
    let jd = jd + 0.5;
    let z = jd.floor();
    let f = jd - z;
    let a = if z < 2_299_161.0 {
        z
    } else {
        let alpha = ((z - 1_867_216.25) / 36_524.25).floor();
        z + 1.0 + alpha - (alpha / 4.0).floor()
    };
    let b = a + 1524.0;
    let c = ((b - 122.1) / 365.25).floor();
    let d = (365.25 * c).floor();
    let e = ((b - d) / 30.6001).floor();

    let day_with_fraction = b - d - (30.6001 * e).floor() + f;
    let month = if e < 14.0 { e - 1.0 } else { e - 13.0 };
    let year = if month > 2.0 { c - 4716.0 } else { c - 4715.0 };

    Ok(CalendarDate {
        year: year as i32,
        month: month as u32,
        day: day_with_fraction.floor() as u32,
        hour: day_with_fraction.fract() * 24.0,
    })
}

/// Julian centuries since J2000.0.
pub fn centuries_since_j2000(jd: f64) -> f64 {
    (jd - J2000) / JULIAN_CENTURY
}

/// Mean obliquity of the ecliptic in degrees (Meeus 22.2).
pub fn obliquity(jd: f64) -> f64 {
    let t = centuries_since_j2000(jd);
    23.439_291_1 - 0.013_004_2 * t - 1.64e-7 * t * t + 5.04e-7 * t * t * t
}

/// Local sidereal time in degrees for an east-positive geographic longitude.
pub fn sidereal_time(jd: f64, east_longitude: f64) -> f64 {
    let t = centuries_since_j2000(jd);
    let gmst = 280.460_618_37 + 360.985_647_366_29 * (jd - J2000) + 0.000_387_933 * t * t
        - t * t * t / 38_710_000.0;
    normalize_degrees(gmst + east_longitude)
}

/// Geocentric position of `body` at the given Julian Day (UT).
pub fn calc_ut(jd: f64, body: Body) -> Result<BodyResult, EphemerisError> {
    ensure_finite(jd)?;
    let d = orbits::day_number(jd);
    let result = match body {
        Body::Sun => orbits::sun(d),
        Body::Moon => orbits::moon(d),
        Body::Pluto => orbits::pluto(d),
        Body::TrueNode => points::true_node(jd),
        Body::Chiron => points::chiron(jd),
        planet => orbits::planet(d, planet),
    };
    Ok(result)
}

/// Longitudes for every body in [`Body::ALL`] order.
pub fn calc_all(jd: f64) -> Result<Vec<(Body, BodyResult)>, EphemerisError> {
    Body::iter().map(|body| calc_ut(jd, body).map(|r| (body, r))).collect()
}

pub fn normalize_degrees(value: f64) -> f64 {
    let normalized = value.rem_euclid(360.0);
    // rem_euclid can return exactly 360.0 for tiny negative inputs
    if normalized >= 360.0 {
        0.0
    } else {
        normalized
    }
}

fn ensure_finite(jd: f64) -> Result<(), EphemerisError> {
    if jd.is_finite() {
        Ok(())
    } else {
        Err(EphemerisError::NonFiniteJulianDay(jd))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_julday_j2000() {
        let jd = julday(2000, 1, 1, 12.0).unwrap();
        assert_relative_eq!(jd, J2000, epsilon = 1e-9);
    }

    #[test]
    fn test_julday_meeus_example() {
        // Meeus example 7.a: 1957 October 4.81
        let jd = julday(1957, 10, 4, 0.81 * 24.0).unwrap();
        assert_relative_eq!(jd, 2_436_116.31, epsilon = 1e-6);
    }

    #[test]
    fn test_revjul_round_trip() {
        let date = revjul(2_436_116.31).unwrap();
        assert_eq!((date.year, date.month, date.day), (1957, 10, 4));
        assert_relative_eq!(date.hour, 0.81 * 24.0, epsilon = 1e-4);
    }

    #[test]
    fn test_invalid_month() {
        assert!(julday(2000, 13, 1, 0.0).is_err());
    }

    #[test]
    fn test_non_finite_jd() {
        assert!(matches!(
            calc_ut(f64::NAN, Body::Sun),
            Err(EphemerisError::NonFiniteJulianDay(_))
        ));
        assert!(calc_ut(f64::INFINITY, Body::Mars).is_err());
    }

    #[test]
    fn test_sun_position() {
        // Meeus example 25.a: 1992 October 13.0 TD, true longitude 199.90895
        let jd = julday(1992, 10, 13, 0.0).unwrap();
        let sun = calc_ut(jd, Body::Sun).unwrap();
        assert_relative_eq!(sun.longitude, 199.909, epsilon = 0.05);
        assert_relative_eq!(sun.distance, 0.99766, epsilon = 0.001);
    }

    #[test]
    fn test_moon_position() {
        // Meeus example 47.a: 1992 April 12.0 TD
        let jd = julday(1992, 4, 12, 0.0).unwrap();
        let moon = calc_ut(jd, Body::Moon).unwrap();
        assert_relative_eq!(moon.longitude, 133.163, epsilon = 0.3);
        assert_relative_eq!(moon.latitude, -3.229, epsilon = 0.3);
    }

    #[test]
    fn test_venus_position() {
        // Meeus example 33.a: 1992 December 20.0 TD
        let jd = julday(1992, 12, 20, 0.0).unwrap();
        let venus = calc_ut(jd, Body::Venus).unwrap();
        assert_relative_eq!(venus.longitude, 313.08, epsilon = 0.25);
    }

    #[test]
    fn test_all_bodies_normalized() {
        let jd = julday(1985, 6, 1, 6.5).unwrap();
        for (body, result) in calc_all(jd).unwrap() {
            assert!(
                (0.0..360.0).contains(&result.longitude),
                "{} longitude {} out of range",
                body,
                result.longitude
            );
        }
    }

    #[test]
    fn test_obliquity_j2000() {
        assert_relative_eq!(obliquity(J2000), 23.4393, epsilon = 1e-4);
    }

    #[test]
    fn test_sidereal_time_meeus() {
        // Meeus example 12.a: 1987 April 10, 0h UT, GMST 13h10m46.3668s
        let jd = julday(1987, 4, 10, 0.0).unwrap();
        let expected = (13.0 + 10.0 / 60.0 + 46.3668 / 3600.0) * 15.0;
        assert_relative_eq!(sidereal_time(jd, 0.0), expected, epsilon = 1e-3);
    }
}
