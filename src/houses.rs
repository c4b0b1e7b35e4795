//! House cusps and chart angles.
//!
//! Every quadrant system here is built from one projection: the ecliptic
//! longitude whose oblique ascension under pole `P` equals `R`,
//! `λ = atan2(sin R, cos R·cos ε − tan P·sin ε)`. With `P = φ` and
//! `R = RAMC + 90°` this is the Ascendant; with `P = 0`, `R = RAMC` the
//! Midheaven.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use blueprint_ephemeris::{normalize_degrees, obliquity, sidereal_time};

use crate::error::{BlueprintError, Result};

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum HouseSystem {
    Placidus,
    Koch,
    WholeSign,
    Equal,
    Regiomontanus,
    Porphyry,
}

impl HouseSystem {
    pub const ALL: [HouseSystem; 6] = [
        HouseSystem::Placidus,
        HouseSystem::Koch,
        HouseSystem::WholeSign,
        HouseSystem::Equal,
        HouseSystem::Regiomontanus,
        HouseSystem::Porphyry,
    ];

    /// Single-letter code as used by Swiss Ephemeris front ends.
    pub fn code(&self) -> char {
        match self {
            HouseSystem::Placidus => 'P',
            HouseSystem::Koch => 'K',
            HouseSystem::WholeSign => 'W',
            HouseSystem::Equal => 'E',
            HouseSystem::Regiomontanus => 'R',
            HouseSystem::Porphyry => 'O',
        }
    }

    pub fn id(&self) -> &'static str {
        match self {
            HouseSystem::Placidus => "placidus",
            HouseSystem::Koch => "koch",
            HouseSystem::WholeSign => "whole-sign",
            HouseSystem::Equal => "equal",
            HouseSystem::Regiomontanus => "regiomontanus",
            HouseSystem::Porphyry => "porphyry",
        }
    }

    /// Placidus and Koch have no solution inside the polar circles.
    pub fn needs_temperate_latitude(&self) -> bool {
        matches!(self, HouseSystem::Placidus | HouseSystem::Koch)
    }
}

impl FromStr for HouseSystem {
    type Err = BlueprintError;

    fn from_str(value: &str) -> Result<Self> {
        let trimmed = value.trim();
        if trimmed.len() == 1 {
            let code = trimmed.to_ascii_uppercase();
            if let Some(system) = HouseSystem::ALL
                .iter()
                .find(|s| s.code().to_string() == code)
            {
                return Ok(*system);
            }
        }
        let normalized = trimmed.to_ascii_lowercase().replace(['_', ' '], "-");
        match normalized.as_str() {
            "placidus" => Ok(HouseSystem::Placidus),
            "koch" => Ok(HouseSystem::Koch),
            "whole-sign" | "wholesign" => Ok(HouseSystem::WholeSign),
            "equal" => Ok(HouseSystem::Equal),
            "regiomontanus" => Ok(HouseSystem::Regiomontanus),
            "porphyry" | "porphyrius" => Ok(HouseSystem::Porphyry),
            _ => Err(BlueprintError::UnknownHouseSystem(value.to_string())),
        }
    }
}

impl TryFrom<String> for HouseSystem {
    type Error = BlueprintError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<HouseSystem> for String {
    fn from(system: HouseSystem) -> String {
        system.id().to_string()
    }
}

impl fmt::Display for HouseSystem {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.id())
    }
}

/// Twelve cusps plus the angles they were derived from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HouseCusps {
    /// The system actually used, which differs from the request after a
    /// polar fallback.
    pub system: HouseSystem,
    /// `cusps[0]` is the 1st house cusp.
    pub cusps: [f64; 12],
    pub ascendant: f64,
    pub midheaven: f64,
    pub ramc: f64,
    pub obliquity: f64,
}

impl HouseCusps {
    pub fn cusp(&self, house: u8) -> Option<f64> {
        if (1..=12).contains(&house) {
            Some(self.cusps[house as usize - 1])
        } else {
            None
        }
    }

    pub fn house_of(&self, longitude: f64) -> u8 {
        house_of(longitude, &self.cusps)
    }
}

pub fn midheaven(ramc: f64, obliquity: f64) -> f64 {
    oblique_point(ramc, 0.0, obliquity)
}

pub fn ascendant(ramc: f64, obliquity: f64, latitude: f64) -> f64 {
    oblique_point(ramc + 90.0, latitude, obliquity)
}

fn oblique_point(ra: f64, pole: f64, obliquity: f64) -> f64 {
    let r = ra.to_radians();
    let p = pole.to_radians();
    let e = obliquity.to_radians();
    let lambda = r.sin().atan2(r.cos() * e.cos() - p.tan() * e.sin());
    normalize_degrees(lambda.to_degrees())
}

fn declination(longitude: f64, obliquity: f64) -> f64 {
    (obliquity.to_radians().sin() * longitude.to_radians().sin())
        .asin()
        .to_degrees()
}

/// Ascensional difference; `None` when the point is circumpolar.
fn ascensional_difference(declination: f64, latitude: f64) -> Option<f64> {
    let x = latitude.to_radians().tan() * declination.to_radians().tan();
    if x.abs() > 1.0 {
        None
    } else {
        Some(x.asin().to_degrees())
    }
}

/// House cusps for an instant (Julian Day, UT) and a place.
pub fn calculate_houses(
    jd: f64,
    latitude: f64,
    east_longitude: f64,
    system: HouseSystem,
) -> Result<HouseCusps> {
    if !jd.is_finite() || !latitude.is_finite() || !east_longitude.is_finite() {
        return Err(BlueprintError::InvalidInput(
            "house calculation needs finite time and coordinates".to_string(),
        ));
    }
    if !(-90.0..=90.0).contains(&latitude) {
        return Err(BlueprintError::InvalidInput(format!(
            "latitude {} outside -90..=90",
            latitude
        )));
    }
    let ramc = sidereal_time(jd, east_longitude);
    let eps = obliquity(jd);
    Ok(houses_from_ramc(ramc, eps, latitude, system))
}

pub fn houses_from_ramc(ramc: f64, eps: f64, latitude: f64, system: HouseSystem) -> HouseCusps {
    let asc = ascendant(ramc, eps, latitude);
    let mc = midheaven(ramc, eps);

    let polar = latitude.abs() > 90.0 - eps;
    let quadrant = match system {
        HouseSystem::Placidus if !polar => placidus(ramc, eps, latitude),
        HouseSystem::Koch if !polar => koch(ramc, eps, latitude, mc),
        _ => None,
    };

    let (used, cusps) = match (system, quadrant) {
        (HouseSystem::Placidus, Some(cusps)) | (HouseSystem::Koch, Some(cusps)) => (system, cusps),
        (HouseSystem::Placidus, None) | (HouseSystem::Koch, None) => {
            tracing::warn!(
                latitude,
                requested = %system,
                "house system undefined at this latitude, using porphyry"
            );
            (HouseSystem::Porphyry, porphyry(asc, mc))
        }
        (HouseSystem::WholeSign, _) => (system, whole_sign(asc)),
        (HouseSystem::Equal, _) => (system, equal(asc)),
        (HouseSystem::Regiomontanus, _) => (system, regiomontanus(ramc, eps, latitude, asc, mc)),
        (HouseSystem::Porphyry, _) => (system, porphyry(asc, mc)),
    };

    HouseCusps {
        system: used,
        cusps,
        ascendant: asc,
        midheaven: mc,
        ramc,
        obliquity: eps,
    }
}

/// Fill houses 4-9 as the opposites of 10-3.
fn with_opposites(mut cusps: [f64; 12]) -> [f64; 12] {
    for house in [10usize, 11, 12, 1, 2, 3] {
        let opposite = (house + 6 - 1) % 12;
        cusps[opposite] = normalize_degrees(cusps[house - 1] + 180.0);
    }
    cusps
}

fn equal(asc: f64) -> [f64; 12] {
    let mut cusps = [0.0; 12];
    for (i, cusp) in cusps.iter_mut().enumerate() {
        *cusp = normalize_degrees(asc + 30.0 * i as f64);
    }
    cusps
}

fn whole_sign(asc: f64) -> [f64; 12] {
    equal((asc / 30.0).floor() * 30.0)
}

fn porphyry(asc: f64, mc: f64) -> [f64; 12] {
    let upper = normalize_degrees(asc - mc);
    let lower = 180.0 - upper;
    let mut cusps = [0.0; 12];
    cusps[9] = mc;
    cusps[10] = normalize_degrees(mc + upper / 3.0);
    cusps[11] = normalize_degrees(mc + 2.0 * upper / 3.0);
    cusps[0] = asc;
    cusps[1] = normalize_degrees(asc + lower / 3.0);
    cusps[2] = normalize_degrees(asc + 2.0 * lower / 3.0);
    with_opposites(cusps)
}

fn regiomontanus(ramc: f64, eps: f64, latitude: f64, asc: f64, mc: f64) -> [f64; 12] {
    let tan_lat = latitude.to_radians().tan();
    let pole = |fraction: f64| (tan_lat * fraction.to_radians().sin()).atan().to_degrees();
    let mut cusps = [0.0; 12];
    cusps[9] = mc;
    cusps[10] = oblique_point(ramc + 30.0, pole(30.0), eps);
    cusps[11] = oblique_point(ramc + 60.0, pole(60.0), eps);
    cusps[0] = asc;
    cusps[1] = oblique_point(ramc + 120.0, pole(60.0), eps);
    cusps[2] = oblique_point(ramc + 150.0, pole(30.0), eps);
    with_opposites(cusps)
}

fn koch(ramc: f64, eps: f64, latitude: f64, mc: f64) -> Option<[f64; 12]> {
    let mc_declination = declination(mc, eps);
    let semi_arc = 90.0 + ascensional_difference(mc_declination, latitude)?;
    let third = semi_arc / 3.0;
    let mut cusps = [0.0; 12];
    cusps[9] = mc;
    cusps[10] = ascendant(ramc - 2.0 * third, eps, latitude);
    cusps[11] = ascendant(ramc - third, eps, latitude);
    cusps[0] = ascendant(ramc, eps, latitude);
    cusps[1] = ascendant(ramc + third, eps, latitude);
    cusps[2] = ascendant(ramc + 2.0 * third, eps, latitude);
    Some(with_opposites(cusps))
}

const PLACIDUS_ITERATIONS: usize = 50;
const PLACIDUS_TOLERANCE: f64 = 1e-7;

/// Placidus cusp: the ecliptic degree whose right ascension sits the given
/// fraction of its own semi-arc away from the meridian.
fn placidus_cusp(ramc: f64, eps: f64, latitude: f64, fraction: f64, above: bool) -> Option<f64> {
    let right_ascension = |ad: f64| {
        if above {
            ramc + fraction * (90.0 + ad)
        } else {
            ramc + 180.0 - fraction * (90.0 - ad)
        }
    };

    let mut lambda = oblique_point(right_ascension(0.0), 0.0, eps);
    for _ in 0..PLACIDUS_ITERATIONS {
        let ad = ascensional_difference(declination(lambda, eps), latitude)?;
        let next = oblique_point(right_ascension(ad), 0.0, eps);
        let step = (next - lambda + 540.0).rem_euclid(360.0) - 180.0;
        lambda = next;
        if step.abs() < PLACIDUS_TOLERANCE {
            break;
        }
    }
    Some(lambda)
}

fn placidus(ramc: f64, eps: f64, latitude: f64) -> Option<[f64; 12]> {
    let mut cusps = [0.0; 12];
    cusps[9] = midheaven(ramc, eps);
    cusps[10] = placidus_cusp(ramc, eps, latitude, 1.0 / 3.0, true)?;
    cusps[11] = placidus_cusp(ramc, eps, latitude, 2.0 / 3.0, true)?;
    cusps[0] = ascendant(ramc, eps, latitude);
    cusps[1] = placidus_cusp(ramc, eps, latitude, 2.0 / 3.0, false)?;
    cusps[2] = placidus_cusp(ramc, eps, latitude, 1.0 / 3.0, false)?;
    Some(with_opposites(cusps))
}

/// House (1..=12) whose cusp interval contains `longitude`.
pub fn house_of(longitude: f64, cusps: &[f64; 12]) -> u8 {
    let lon = normalize_degrees(longitude);
    for i in 0..12 {
        let start = cusps[i];
        let span = normalize_degrees(cusps[(i + 1) % 12] - start);
        if normalize_degrees(lon - start) < span {
            return i as u8 + 1;
        }
    }
    1
}
