//! Sky conditions for a date and their contacts with a natal chart.

use std::cmp::Ordering;

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::aspects::{AspectDefinition, AspectNature};
use crate::ephemeris::{is_retrograde, PlanetaryPositions, PositionSource};
use crate::error::{BlueprintError, Result};
use crate::natal::{natal_name, NatalPlacement};
use crate::time::{julian_day, local_to_utc};
use crate::zodiac::{angular_distance, round_to, sign_position_to_longitude, Planet, SignPosition, ZodiacSign, TRANSIT_PLANETS};

const fn transit_aspect(name: &'static str, angle: f64, max_orb: f64, nature: AspectNature) -> AspectDefinition {
    AspectDefinition {
        id: name,
        name,
        angle,
        max_orb,
        nature,
    }
}

/// Aspects between transiting planets. A pair takes the first entry that fits.
pub const SKY_ASPECTS: [AspectDefinition; 5] = [
    transit_aspect("Conjunction", 0.0, 8.0, AspectNature::Neutral),
    transit_aspect("Sextile", 60.0, 6.0, AspectNature::Harmonious),
    transit_aspect("Square", 90.0, 8.0, AspectNature::Challenging),
    transit_aspect("Trine", 120.0, 8.0, AspectNature::Harmonious),
    transit_aspect("Opposition", 180.0, 8.0, AspectNature::Challenging),
];

/// Aspects from a transiting planet to a natal point. Every fitting entry counts.
pub const TRANSIT_NATAL_ASPECTS: [AspectDefinition; 5] = [
    transit_aspect("Conjunction", 0.0, 8.0, AspectNature::Neutral),
    transit_aspect("Sextile", 60.0, 4.0, AspectNature::Harmonious),
    transit_aspect("Square", 90.0, 6.0, AspectNature::Challenging),
    transit_aspect("Trine", 120.0, 6.0, AspectNature::Harmonious),
    transit_aspect("Opposition", 180.0, 8.0, AspectNature::Challenging),
];

pub const SIGNIFICANT_ORB: f64 = 3.0;
pub const SIGNIFICANT_LIMIT: usize = 5;
pub const MAJOR_DAY_ORB: f64 = 2.0;

// ---------------------------
// ## Positions and aspects
// ---------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransitPosition {
    pub planet_id: String,
    pub planet_name: String,
    pub sign_id: String,
    pub sign_name: String,
    /// Ecliptic longitude.
    pub degree: f64,
    pub formatted_degree: String,
    pub is_retrograde: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransitAspect {
    pub planet1: String,
    pub planet2: String,
    pub aspect_type: String,
    pub orb: f64,
    pub is_applying: bool,
    pub nature: AspectNature,
}

/// Applying when the orb was wider a day earlier.
fn applying(definition: &AspectDefinition, orb_now: f64, a_before: f64, b_before: f64) -> bool {
    let orb_before = (angular_distance(a_before, b_before) - definition.angle).abs();
    orb_now < orb_before
}

fn by_orb(a: f64, b: f64) -> Ordering {
    a.partial_cmp(&b).unwrap_or(Ordering::Equal)
}

pub fn transit_positions<S: PositionSource + ?Sized>(
    source: &S,
    positions: &PlanetaryPositions,
) -> Result<Vec<TransitPosition>> {
    let mut out = Vec::with_capacity(TRANSIT_PLANETS.len());
    for planet in TRANSIT_PLANETS {
        let longitude = match positions.longitude(planet) {
            Some(longitude) => longitude,
            None => continue,
        };
        let position = SignPosition::from_longitude(longitude);
        out.push(TransitPosition {
            planet_id: planet.id().to_string(),
            planet_name: planet.name().to_string(),
            sign_id: position.sign.id().to_string(),
            sign_name: position.sign.name().to_string(),
            degree: longitude,
            formatted_degree: position.formatted_degree(),
            is_retrograde: is_retrograde(source, planet, positions.julian_day)?,
        });
    }
    Ok(out)
}

/// Aspects among the transit planets, tightest first.
pub fn sky_aspects(now: &PlanetaryPositions, before: &PlanetaryPositions) -> Vec<TransitAspect> {
    let mut aspects = Vec::new();
    for (i, first) in TRANSIT_PLANETS.iter().enumerate() {
        for second in &TRANSIT_PLANETS[i + 1..] {
            let (a, b) = match (now.longitude(*first), now.longitude(*second)) {
                (Some(a), Some(b)) => (a, b),
                _ => continue,
            };
            let diff = angular_distance(a, b);
            let found = SKY_ASPECTS
                .iter()
                .map(|definition| (definition, (diff - definition.angle).abs()))
                .find(|(definition, orb)| *orb <= definition.max_orb);
            if let Some((definition, orb)) = found {
                let is_applying = match (before.longitude(*first), before.longitude(*second)) {
                    (Some(a0), Some(b0)) => applying(definition, orb, a0, b0),
                    _ => false,
                };
                aspects.push(TransitAspect {
                    planet1: first.name().to_string(),
                    planet2: second.name().to_string(),
                    aspect_type: definition.name.to_string(),
                    orb: round_to(orb, 1),
                    is_applying,
                    nature: definition.nature,
                });
            }
        }
    }
    aspects.sort_by(|a, b| by_orb(a.orb, b.orb));
    aspects
}

// ---------------------------
// ## Moon phase
// ---------------------------

pub const MOON_PHASES: [&str; 8] = [
    "New Moon",
    "Waxing Crescent",
    "First Quarter",
    "Waxing Gibbous",
    "Full Moon",
    "Waning Gibbous",
    "Last Quarter",
    "Waning Crescent",
];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MoonPhase {
    pub name: String,
    /// Lit fraction of the disc, percent.
    pub illumination: u32,
    /// Moon's elongation east of the Sun, 0..360.
    pub phase_angle: f64,
    pub moon_sign: String,
    pub moon_degree: String,
}

/// Phase name for an elongation. Each phase spans 45° centred on a multiple
/// of 45°, so New Moon covers 337.5° through 22.5°.
pub fn phase_name(phase_angle: f64) -> &'static str {
    let angle = phase_angle.rem_euclid(360.0);
    let index = ((angle + 22.5) / 45.0).floor() as usize % 8;
    MOON_PHASES[index]
}

pub fn illumination(phase_angle: f64) -> u32 {
    ((1.0 - phase_angle.to_radians().cos()) / 2.0 * 100.0).round() as u32
}

pub fn moon_phase(sun: f64, moon: f64) -> MoonPhase {
    let phase_angle = (moon - sun).rem_euclid(360.0);
    let position = SignPosition::from_longitude(moon);
    MoonPhase {
        name: phase_name(phase_angle).to_string(),
        illumination: illumination(phase_angle),
        phase_angle: round_to(phase_angle, 2),
        moon_sign: position.sign.name().to_string(),
        moon_degree: position.formatted_degree(),
    }
}

// ---------------------------
// ## Cosmic weather
// ---------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CosmicWeather {
    pub date: DateTime<Utc>,
    pub moon_phase: MoonPhase,
    pub positions: Vec<TransitPosition>,
    pub significant_aspects: Vec<TransitAspect>,
    pub retrograde_count: usize,
}

pub fn cosmic_weather<S: PositionSource + ?Sized>(source: &S, date: DateTime<Utc>) -> Result<CosmicWeather> {
    let jd = julian_day(&date);
    let now = PlanetaryPositions::compute(source, jd)?;
    let before = PlanetaryPositions::compute(source, jd - 1.0)?;

    let positions = transit_positions(source, &now)?;
    let significant_aspects: Vec<TransitAspect> = sky_aspects(&now, &before)
        .into_iter()
        .filter(|a| a.orb < SIGNIFICANT_ORB)
        .take(SIGNIFICANT_LIMIT)
        .collect();
    let retrograde_count = positions.iter().filter(|p| p.is_retrograde).count();

    Ok(CosmicWeather {
        date,
        moon_phase: moon_phase(now.sun(), now.moon()),
        positions,
        significant_aspects,
        retrograde_count,
    })
}

fn days_in_month(year: i32, month: u32) -> Result<u32> {
    let first = NaiveDate::from_ymd_opt(year, month, 1)
        .ok_or_else(|| BlueprintError::InvalidInput(format!("no such month {}-{:02}", year, month)))?;
    let next = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)
    };
    next.map(|n| n.signed_duration_since(first).num_days() as u32)
        .ok_or_else(|| BlueprintError::InvalidInput(format!("no month after {}-{:02}", year, month)))
}

fn local_noon(date: NaiveDate, tz: Tz) -> Result<DateTime<Utc>> {
    let noon = NaiveTime::from_hms_opt(12, 0, 0)
        .ok_or_else(|| BlueprintError::InvalidInput("noon".to_string()))?;
    local_to_utc(date.and_time(noon), tz)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DayWeather {
    pub day: u32,
    pub weather: CosmicWeather,
}

/// Weather at local noon for every day of `month` (1-12).
pub fn transits_for_month<S: PositionSource + ?Sized>(
    source: &S,
    year: i32,
    month: u32,
    tz: Tz,
) -> Result<Vec<DayWeather>> {
    let days = days_in_month(year, month)?;
    debug!(year, month, days, "month transits");
    (1..=days)
        .map(|day| {
            let date = NaiveDate::from_ymd_opt(year, month, day)
                .ok_or_else(|| BlueprintError::InvalidInput(format!("no day {}", day)))?;
            Ok(DayWeather {
                day,
                weather: cosmic_weather(source, local_noon(date, tz)?)?,
            })
        })
        .collect()
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DayNature {
    Harmonious,
    Challenging,
    Mixed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MajorAspectDay {
    pub day: u32,
    pub nature: DayNature,
    pub aspect_count: usize,
}

/// Classifies a day from its tight significant aspects; `None` when there
/// are none. Conjunctions count toward neither side.
pub fn classify_day(day: u32, weather: &CosmicWeather) -> Option<MajorAspectDay> {
    let tight: Vec<&TransitAspect> = weather
        .significant_aspects
        .iter()
        .filter(|a| a.orb < MAJOR_DAY_ORB)
        .collect();
    if tight.is_empty() {
        return None;
    }
    let harmonious = tight.iter().any(|a| a.nature == AspectNature::Harmonious);
    let challenging = tight.iter().any(|a| a.nature == AspectNature::Challenging);
    let nature = match (harmonious, challenging) {
        (true, true) => DayNature::Mixed,
        (true, false) => DayNature::Harmonious,
        _ => DayNature::Challenging,
    };
    Some(MajorAspectDay {
        day,
        nature,
        aspect_count: tight.len(),
    })
}

pub fn major_aspect_days<S: PositionSource + ?Sized>(
    source: &S,
    year: i32,
    month: u32,
    tz: Tz,
) -> Result<Vec<MajorAspectDay>> {
    Ok(transits_for_month(source, year, month, tz)?
        .iter()
        .filter_map(|day| classify_day(day.day, &day.weather))
        .collect())
}

// ---------------------------
// ## Transits to the natal chart
// ---------------------------

pub fn transit_weight(planet_id: &str) -> u32 {
    match planet_id {
        "pluto" => 10,
        "neptune" => 9,
        "uranus" => 8,
        "saturn" => 7,
        "jupiter" => 6,
        "mars" => 5,
        "sun" => 4,
        "venus" => 3,
        "mercury" => 2,
        "moon" => 1,
        _ => 1,
    }
}

pub fn natal_weight(planet_id: &str) -> u32 {
    match planet_id {
        "sun" => 10,
        "moon" => 9,
        "ascendant" => 8,
        "midheaven" => 7,
        "mercury" => 6,
        "venus" | "mars" => 5,
        "jupiter" | "saturn" => 4,
        "uranus" | "neptune" | "pluto" => 3,
        "north-node" | "south-node" | "chiron" => 2,
        _ => 1,
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransitNatalAspect {
    pub transit_planet: String,
    pub transit_planet_id: String,
    pub transit_degree: f64,
    pub transit_sign: String,
    pub natal_planet: String,
    pub natal_planet_id: String,
    pub natal_degree: f64,
    pub natal_sign: String,
    pub aspect_type: String,
    pub aspect_angle: f64,
    pub orb: f64,
    pub is_applying: bool,
    pub nature: AspectNature,
    pub importance: u32,
}

fn natal_display_name(planet_id: &str) -> String {
    match Planet::from_id(planet_id) {
        Some(planet) => natal_name(planet).to_string(),
        None => {
            let mut chars = planet_id.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        }
    }
}

/// Every transit-to-natal aspect at `date`, most important first and
/// tightest first within equal importance.
pub fn calculate_transit_natal_aspects<S: PositionSource + ?Sized>(
    source: &S,
    date: DateTime<Utc>,
    natal: &[NatalPlacement],
) -> Result<Vec<TransitNatalAspect>> {
    let jd = julian_day(&date);
    let now = PlanetaryPositions::compute(source, jd)?;
    let before = PlanetaryPositions::compute(source, jd - 1.0)?;

    let natal_points: Vec<(&NatalPlacement, f64)> = natal
        .iter()
        .filter_map(|placement| {
            let sign = ZodiacSign::from_id(&placement.sign_id)?;
            let longitude =
                sign_position_to_longitude(sign, placement.degree as f64, placement.minute as f64);
            Some((placement, longitude))
        })
        .collect();

    let mut aspects = Vec::new();
    for planet in TRANSIT_PLANETS {
        let (longitude, previous) = match (now.longitude(planet), before.longitude(planet)) {
            (Some(now), Some(before)) => (now, before),
            _ => continue,
        };
        let transit_sign = ZodiacSign::from_longitude(longitude);
        for (placement, natal_longitude) in &natal_points {
            let diff = angular_distance(longitude, *natal_longitude);
            for definition in TRANSIT_NATAL_ASPECTS.iter() {
                let orb = (diff - definition.angle).abs();
                if orb > definition.max_orb {
                    continue;
                }
                aspects.push(TransitNatalAspect {
                    transit_planet: planet.name().to_string(),
                    transit_planet_id: planet.id().to_string(),
                    transit_degree: round_to(longitude, 2),
                    transit_sign: transit_sign.id().to_string(),
                    natal_planet: natal_display_name(&placement.planet_id),
                    natal_planet_id: placement.planet_id.clone(),
                    natal_degree: *natal_longitude,
                    natal_sign: placement.sign_id.clone(),
                    aspect_type: definition.name.to_string(),
                    aspect_angle: definition.angle,
                    orb: round_to(orb, 2),
                    is_applying: applying(definition, orb, previous, *natal_longitude),
                    nature: definition.nature,
                    importance: transit_weight(planet.id()) + natal_weight(&placement.planet_id),
                });
            }
        }
    }

    aspects.sort_by(|a, b| {
        b.importance
            .cmp(&a.importance)
            .then_with(|| by_orb(a.orb, b.orb))
    });
    Ok(aspects)
}

pub fn top_transit_aspects(aspects: &[TransitNatalAspect], limit: usize) -> Vec<TransitNatalAspect> {
    aspects.iter().take(limit).cloned().collect()
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TransitAspectsByNature {
    pub harmonious: Vec<TransitNatalAspect>,
    pub challenging: Vec<TransitNatalAspect>,
    pub neutral: Vec<TransitNatalAspect>,
}

pub fn group_transit_aspects_by_nature(aspects: &[TransitNatalAspect]) -> TransitAspectsByNature {
    let mut groups = TransitAspectsByNature::default();
    for aspect in aspects {
        let bucket = match aspect.nature {
            AspectNature::Harmonious => &mut groups.harmonious,
            AspectNature::Challenging => &mut groups.challenging,
            AspectNature::Neutral => &mut groups.neutral,
        };
        bucket.push(aspect.clone());
    }
    groups
}

pub fn aspects_to_natal_planet(aspects: &[TransitNatalAspect], natal_planet_id: &str) -> Vec<TransitNatalAspect> {
    aspects
        .iter()
        .filter(|a| a.natal_planet_id == natal_planet_id)
        .cloned()
        .collect()
}

pub fn aspects_from_transit_planet(
    aspects: &[TransitNatalAspect],
    transit_planet_id: &str,
) -> Vec<TransitNatalAspect> {
    aspects
        .iter()
        .filter(|a| a.transit_planet_id == transit_planet_id)
        .cloned()
        .collect()
}
