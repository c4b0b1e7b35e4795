use std::cmp::Reverse;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::zodiac::{angular_distance, round_to, Planet};

// ---------------------------
// ## Aspect definitions
// ---------------------------

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AspectNature {
    Harmonious,
    Challenging,
    Neutral,
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct AspectDefinition {
    pub id: &'static str,
    pub name: &'static str,
    pub angle: f64,
    pub max_orb: f64,
    pub nature: AspectNature,
}

const fn aspect(
    id: &'static str,
    name: &'static str,
    angle: f64,
    max_orb: f64,
    nature: AspectNature,
) -> AspectDefinition {
    AspectDefinition {
        id,
        name,
        angle,
        max_orb,
        nature,
    }
}

/// Natal aspects in match order. A pair takes the first entry whose orb fits.
pub const NATAL_ASPECTS: [AspectDefinition; 10] = [
    aspect("conjunction", "conjunction", 0.0, 8.0, AspectNature::Neutral),
    aspect("opposition", "opposition", 180.0, 8.0, AspectNature::Challenging),
    aspect("trine", "trine", 120.0, 6.0, AspectNature::Harmonious),
    aspect("square", "square", 90.0, 6.0, AspectNature::Challenging),
    aspect("sextile", "sextile", 60.0, 4.0, AspectNature::Harmonious),
    aspect("quincunx", "quincunx", 150.0, 2.5, AspectNature::Challenging),
    aspect("semi-sextile", "semisextile", 30.0, 1.5, AspectNature::Harmonious),
    aspect("semi-square", "semisquare", 45.0, 1.5, AspectNature::Challenging),
    aspect("sesquiquadrate", "sesquiquadrate", 135.0, 1.5, AspectNature::Challenging),
    aspect("quintile", "quintile", 72.0, 1.5, AspectNature::Harmonious),
];

pub const MAJOR_ASPECT_IDS: [&str; 5] = ["conjunction", "sextile", "square", "trine", "opposition"];

pub const MINOR_ASPECT_IDS: [&str; 6] = [
    "quincunx",
    "semi-sextile",
    "semi-square",
    "sesquiquadrate",
    "quintile",
    "biquintile",
];

pub fn nature_of(aspect_id: &str) -> Option<AspectNature> {
    match aspect_id {
        "square" | "opposition" | "quincunx" | "semi-square" | "sesquiquadrate"
        | "sesqui-square" => Some(AspectNature::Challenging),
        "trine" | "sextile" | "semi-sextile" | "quintile" | "biquintile" => {
            Some(AspectNature::Harmonious)
        }
        "conjunction" => Some(AspectNature::Neutral),
        _ => None,
    }
}

/// First aspect in `table` whose orb admits the arc between two longitudes.
/// Returns the definition and the signed orbit `arc - angle`.
pub fn match_aspect<'a>(
    table: &'a [AspectDefinition],
    a: f64,
    b: f64,
) -> Option<(&'a AspectDefinition, f64)> {
    let diff = angular_distance(a, b);
    table
        .iter()
        .map(|definition| (definition, diff - definition.angle))
        .find(|(definition, orbit)| orbit.abs() <= definition.max_orb)
}

// ---------------------------
// ## Natal aspects
// ---------------------------

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum AspectDirection {
    Applying,
    Separating,
}

impl fmt::Display for AspectDirection {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            AspectDirection::Applying => write!(f, "Applying"),
            AspectDirection::Separating => write!(f, "Separating"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NatalAspect {
    pub id: String,
    pub profile_id: String,
    pub aspect_id: String,
    pub planet1_id: String,
    pub placement1_id: String,
    pub planet2_id: String,
    pub placement2_id: String,
    pub orb_degree: u32,
    pub orb_minute: u32,
    /// Signed `arc - exact angle`, four decimals.
    pub orbit: f64,
    pub direction: AspectDirection,
    pub nature: AspectNature,
    pub full_name: String,
}

/// A chart point taking part in aspect detection.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct AspectPoint {
    pub planet: Planet,
    pub longitude: f64,
    /// Longitude one day earlier, used to tell applying from separating.
    pub previous_longitude: f64,
}

fn orb_parts(orbit: f64) -> (u32, u32) {
    let orb = orbit.abs();
    let degree = orb.floor();
    let mut minute = ((orb - degree) * 60.0).round() as u32;
    let mut degree = degree as u32;
    if minute == 60 {
        degree += 1;
        minute = 0;
    }
    (degree, minute)
}

/// Aspects between every unordered pair of `points`, in input order.
///
/// The aspect is applying when its orb was wider a day earlier.
pub fn find_natal_aspects(profile_id: &str, points: &[AspectPoint]) -> Vec<NatalAspect> {
    let mut aspects = Vec::new();
    for (i, first) in points.iter().enumerate() {
        for second in &points[i + 1..] {
            let (definition, orbit) =
                match match_aspect(&NATAL_ASPECTS, first.longitude, second.longitude) {
                    Some(found) => found,
                    None => continue,
                };

            let previous_arc = angular_distance(first.previous_longitude, second.previous_longitude);
            let previous_orb = (previous_arc - definition.angle).abs();
            let direction = if orbit.abs() < previous_orb {
                AspectDirection::Applying
            } else {
                AspectDirection::Separating
            };

            let orbit = round_to(orbit, 4);
            let (orb_degree, orb_minute) = orb_parts(orbit);
            let planet1_id = first.planet.placement_id();
            let planet2_id = second.planet.placement_id();

            aspects.push(NatalAspect {
                id: format!("{}-aspect-{}", profile_id, aspects.len()),
                profile_id: profile_id.to_string(),
                aspect_id: definition.id.to_string(),
                planet1_id: planet1_id.to_string(),
                placement1_id: format!("{}-{}", profile_id, planet1_id),
                planet2_id: planet2_id.to_string(),
                placement2_id: format!("{}-{}", profile_id, planet2_id),
                orb_degree,
                orb_minute,
                orbit,
                direction,
                nature: definition.nature,
                full_name: format!(
                    "{} {} {}",
                    first.planet.name(),
                    definition.name,
                    second.planet.name()
                ),
            });
        }
    }
    aspects
}

// ---------------------------
// ## Priority
// ---------------------------

const LUMINARY_WEIGHT: u32 = 30;
const ANGLE_WEIGHT: u32 = 25;
const PERSONAL_WEIGHT: u32 = 5;
const MAX_ORB_SCORE: u32 = 10;

const LUMINARIES: [&str; 2] = ["sun", "moon"];
const ANGLES: [&str; 4] = ["ascendant", "midheaven", "mc", "asc"];
const PERSONAL_PLANETS: [&str; 3] = ["mercury", "venus", "mars"];

fn aspect_type_weight(aspect_id: &str) -> u32 {
    match aspect_id {
        "conjunction" => 20,
        "opposition" => 18,
        "square" => 16,
        "trine" => 14,
        "sextile" => 12,
        "quincunx" => 8,
        "semi-square" | "sesquiquadrate" | "sesqui-square" => 6,
        "semi-sextile" | "quintile" | "biquintile" => 4,
        _ => 0,
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PriorityTier {
    High,
    Medium,
    Low,
}

pub fn calculate_aspect_priority(aspect: &NatalAspect) -> u32 {
    let planets = [aspect.planet1_id.as_str(), aspect.planet2_id.as_str()];
    let mut priority = 0;
    for planet in planets {
        if LUMINARIES.contains(&planet) {
            priority += LUMINARY_WEIGHT;
        }
        if ANGLES.contains(&planet) {
            priority += ANGLE_WEIGHT;
        }
        if PERSONAL_PLANETS.contains(&planet) {
            priority += PERSONAL_WEIGHT;
        }
    }
    priority += aspect_type_weight(&aspect.aspect_id);
    priority += MAX_ORB_SCORE.saturating_sub(aspect.orb_degree);
    priority
}

pub fn aspect_priority_tier(aspect: &NatalAspect) -> PriorityTier {
    match calculate_aspect_priority(aspect) {
        p if p >= 50 => PriorityTier::High,
        p if p >= 25 => PriorityTier::Medium,
        _ => PriorityTier::Low,
    }
}

/// Highest priority first; equal priorities keep their input order.
pub fn sort_aspects_by_priority(aspects: &[NatalAspect]) -> Vec<NatalAspect> {
    let mut sorted = aspects.to_vec();
    sorted.sort_by_key(|aspect| Reverse(calculate_aspect_priority(aspect)));
    sorted
}

pub fn top_aspects(aspects: &[NatalAspect], count: usize) -> Vec<NatalAspect> {
    let mut sorted = sort_aspects_by_priority(aspects);
    sorted.truncate(count);
    sorted
}

pub fn filter_aspects_by_planets(aspects: &[NatalAspect], planet_ids: &[&str]) -> Vec<NatalAspect> {
    aspects
        .iter()
        .filter(|a| {
            planet_ids.contains(&a.planet1_id.as_str()) || planet_ids.contains(&a.planet2_id.as_str())
        })
        .cloned()
        .collect()
}

pub fn luminary_aspects(aspects: &[NatalAspect]) -> Vec<NatalAspect> {
    filter_aspects_by_planets(aspects, &LUMINARIES)
}

pub fn angle_aspects(aspects: &[NatalAspect]) -> Vec<NatalAspect> {
    filter_aspects_by_planets(aspects, &ANGLES)
}

pub fn filter_aspects_by_type(aspects: &[NatalAspect], aspect_ids: &[&str]) -> Vec<NatalAspect> {
    aspects
        .iter()
        .filter(|a| aspect_ids.contains(&a.aspect_id.as_str()))
        .cloned()
        .collect()
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AspectsByNature {
    pub challenging: Vec<NatalAspect>,
    pub harmonious: Vec<NatalAspect>,
    pub neutral: Vec<NatalAspect>,
}

pub fn group_aspects_by_nature(aspects: &[NatalAspect]) -> AspectsByNature {
    let mut groups = AspectsByNature::default();
    for aspect in aspects {
        match nature_of(&aspect.aspect_id) {
            Some(AspectNature::Challenging) => groups.challenging.push(aspect.clone()),
            Some(AspectNature::Harmonious) => groups.harmonious.push(aspect.clone()),
            Some(AspectNature::Neutral) => groups.neutral.push(aspect.clone()),
            None => {}
        }
    }
    groups
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AspectsByTier {
    pub high: Vec<NatalAspect>,
    pub medium: Vec<NatalAspect>,
    pub low: Vec<NatalAspect>,
}

pub fn group_aspects_by_priority_tier(aspects: &[NatalAspect]) -> AspectsByTier {
    let sorted = sort_aspects_by_priority(aspects);
    let mut tiers = AspectsByTier::default();
    for aspect in sorted {
        match aspect_priority_tier(&aspect) {
            PriorityTier::High => tiers.high.push(aspect),
            PriorityTier::Medium => tiers.medium.push(aspect),
            PriorityTier::Low => tiers.low.push(aspect),
        }
    }
    tiers
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn point(planet: Planet, longitude: f64, previous_longitude: f64) -> AspectPoint {
        AspectPoint {
            planet,
            longitude,
            previous_longitude,
        }
    }

    fn synthetic(aspect_id: &str, p1: &str, p2: &str, orb_degree: u32) -> NatalAspect {
        NatalAspect {
            id: format!("{}-{}-{}", p1, aspect_id, p2),
            profile_id: "p".to_string(),
            aspect_id: aspect_id.to_string(),
            planet1_id: p1.to_string(),
            placement1_id: format!("p-{}", p1),
            planet2_id: p2.to_string(),
            placement2_id: format!("p-{}", p2),
            orb_degree,
            orb_minute: 0,
            orbit: orb_degree as f64,
            direction: AspectDirection::Separating,
            nature: nature_of(aspect_id).unwrap_or(AspectNature::Neutral),
            full_name: String::new(),
        }
    }

    #[test]
    fn test_first_match_wins() {
        // 121° is a trine (orb 1), never checked against later entries
        let (definition, orbit) = match_aspect(&NATAL_ASPECTS, 10.0, 131.0).unwrap();
        assert_eq!(definition.id, "trine");
        assert_relative_eq!(orbit, 1.0, epsilon = 1e-9);
    }

    #[test]
    fn test_match_uses_shortest_arc() {
        let (definition, orbit) = match_aspect(&NATAL_ASPECTS, 355.0, 3.0).unwrap();
        assert_eq!(definition.id, "conjunction");
        assert_relative_eq!(orbit, 8.0, epsilon = 1e-9);
    }

    #[test]
    fn test_minor_aspect_orbs() {
        assert_eq!(match_aspect(&NATAL_ASPECTS, 0.0, 151.0).unwrap().0.id, "quincunx");
        assert_eq!(match_aspect(&NATAL_ASPECTS, 0.0, 73.4).unwrap().0.id, "quintile");
        assert!(match_aspect(&NATAL_ASPECTS, 0.0, 75.0).is_none());
    }

    #[test]
    fn test_find_natal_aspects_ids_and_direction() {
        let points = [
            point(Planet::Sun, 100.0, 99.0),
            point(Planet::Moon, 218.0, 205.0),
            point(Planet::TrueNode, 305.0, 296.0),
        ];
        let aspects = find_natal_aspects("me", &points);
        let sun_moon = aspects.iter().find(|a| a.planet2_id == "moon").unwrap();
        assert_eq!(sun_moon.aspect_id, "trine");
        assert_eq!(sun_moon.orb_degree, 2);
        assert_eq!(sun_moon.orb_minute, 0);
        // Yesterday the arc was 106°, today 118°: closing on 120°
        assert_eq!(sun_moon.direction, AspectDirection::Applying);
        assert_eq!(sun_moon.placement1_id, "me-sun");
        assert_eq!(sun_moon.full_name, "Sun trine Moon");
        assert_eq!(sun_moon.id, "me-aspect-0");

        let moon_node = aspects.iter().find(|a| a.planet2_id == "north-node").unwrap();
        assert_eq!(moon_node.aspect_id, "square");
        assert_eq!(moon_node.direction, AspectDirection::Separating);
    }

    #[test]
    fn test_orb_minutes_round_up_to_degree() {
        assert_eq!(orb_parts(1.9999), (2, 0));
        assert_eq!(orb_parts(-0.5), (0, 30));
    }

    #[test]
    fn test_priority_scoring() {
        // 30 + 30 + 20 + (10 - 1)
        let sun_moon = synthetic("conjunction", "sun", "moon", 1);
        assert_eq!(calculate_aspect_priority(&sun_moon), 89);
        assert_eq!(aspect_priority_tier(&sun_moon), PriorityTier::High);

        // 5 + 5 + 14 + 7
        let venus_mars = synthetic("trine", "venus", "mars", 3);
        assert_eq!(calculate_aspect_priority(&venus_mars), 31);
        assert_eq!(aspect_priority_tier(&venus_mars), PriorityTier::Medium);

        // 4 + 9
        let outer = synthetic("quintile", "uranus", "pluto", 1);
        assert_eq!(calculate_aspect_priority(&outer), 13);
        assert_eq!(aspect_priority_tier(&outer), PriorityTier::Low);

        let angle = synthetic("square", "ascendant", "saturn", 12);
        assert_eq!(calculate_aspect_priority(&angle), 41);
    }

    #[test]
    fn test_sort_is_stable_and_descending() {
        let a = synthetic("trine", "jupiter", "saturn", 2);
        let b = synthetic("trine", "uranus", "neptune", 2);
        let c = synthetic("opposition", "sun", "pluto", 0);
        let sorted = sort_aspects_by_priority(&[a.clone(), b.clone(), c.clone()]);
        assert_eq!(sorted[0].id, c.id);
        assert_eq!(sorted[1].id, a.id);
        assert_eq!(sorted[2].id, b.id);
        assert_eq!(top_aspects(&sorted, 1).len(), 1);
    }

    #[test]
    fn test_grouping_and_filters() {
        let aspects = vec![
            synthetic("square", "sun", "mars", 1),
            synthetic("trine", "moon", "venus", 1),
            synthetic("conjunction", "jupiter", "saturn", 1),
            synthetic("sesquiquadrate", "uranus", "chiron", 1),
        ];
        let by_nature = group_aspects_by_nature(&aspects);
        assert_eq!(by_nature.challenging.len(), 2);
        assert_eq!(by_nature.harmonious.len(), 1);
        assert_eq!(by_nature.neutral.len(), 1);

        assert_eq!(luminary_aspects(&aspects).len(), 2);
        assert_eq!(filter_aspects_by_type(&aspects, &MAJOR_ASPECT_IDS).len(), 3);
        assert_eq!(filter_aspects_by_type(&aspects, &MINOR_ASPECT_IDS).len(), 1);
        assert!(angle_aspects(&aspects).is_empty());

        let tiers = group_aspects_by_priority_tier(&aspects);
        assert_eq!(tiers.high.len() + tiers.medium.len() + tiers.low.len(), 4);
        assert_eq!(tiers.high[0].aspect_id, "square");
    }
}
