//! Western natal chart: placements, house cusps, aspects, configurations,
//! elemental balance and chart rulers.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::aspects::{find_natal_aspects, AspectPoint, NatalAspect};
use crate::configurations::{detect_configurations, NatalConfiguration};
use crate::ephemeris::{PlanetaryPositions, PositionSource};
use crate::error::Result;
use crate::houses::{calculate_houses, HouseCusps, HouseSystem};
use crate::zodiac::{signed_difference, Element, Planet, SignPosition, ZodiacSign};

/// Bodies placed in a natal chart, in display order.
pub const NATAL_PLANETS: [Planet; 12] = [
    Planet::Sun,
    Planet::Moon,
    Planet::Mercury,
    Planet::Venus,
    Planet::Mars,
    Planet::Jupiter,
    Planet::Saturn,
    Planet::Uranus,
    Planet::Neptune,
    Planet::Pluto,
    Planet::TrueNode,
    Planet::Chiron,
];

// ---------------------------
// ## Dignities
// ---------------------------

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dignity {
    Domicile,
    Exaltation,
    Detriment,
    Fall,
}

impl Dignity {
    pub fn id(&self) -> &'static str {
        match self {
            Dignity::Domicile => "domicile",
            Dignity::Exaltation => "exaltation",
            Dignity::Detriment => "detriment",
            Dignity::Fall => "fall",
        }
    }
}

fn exaltation_sign(planet: Planet) -> Option<ZodiacSign> {
    match planet {
        Planet::Sun => Some(ZodiacSign::Aries),
        Planet::Moon => Some(ZodiacSign::Taurus),
        Planet::Mercury => Some(ZodiacSign::Virgo),
        Planet::Venus => Some(ZodiacSign::Pisces),
        Planet::Mars => Some(ZodiacSign::Capricorn),
        Planet::Jupiter => Some(ZodiacSign::Cancer),
        Planet::Saturn => Some(ZodiacSign::Libra),
        _ => None,
    }
}

fn rules(planet: Planet, sign: ZodiacSign) -> bool {
    sign.traditional_ruler() == planet || sign.modern_ruler() == planet
}

/// Essential dignity of a planet in a sign; domicile wins over exaltation.
pub fn dignity_of(planet: Planet, sign: ZodiacSign) -> Option<Dignity> {
    if rules(planet, sign) {
        Some(Dignity::Domicile)
    } else if exaltation_sign(planet) == Some(sign) {
        Some(Dignity::Exaltation)
    } else if rules(planet, sign.opposite()) {
        Some(Dignity::Detriment)
    } else if exaltation_sign(planet) == Some(sign.opposite()) {
        Some(Dignity::Fall)
    } else {
        None
    }
}

/// `decan-1` (0-10° Aries) through `decan-36` (20-30° Pisces).
pub fn decan_id(longitude: f64) -> String {
    let position = SignPosition::from_longitude(longitude);
    let decan = position.sign.index() * 3 + (position.degree / 10).min(2) as usize + 1;
    format!("decan-{}", decan)
}

// ---------------------------
// ## Chart entities
// ---------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NatalPlacement {
    pub id: String,
    pub profile_id: String,
    pub planet_id: String,
    pub sign_id: String,
    pub house_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub decan_id: Option<String>,
    pub degree: u32,
    pub minute: u32,
    pub retrograde: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dignity_id: Option<String>,
    /// `traditional` or `modern` when this planet rules the Ascendant sign.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_chart_ruler: Option<String>,
    pub full_name: String,
    pub short_name: String,
}

impl NatalPlacement {
    pub fn house_number(&self) -> Option<u8> {
        self.house_id.strip_prefix("house-")?.parse().ok()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HousePosition {
    pub id: String,
    pub profile_id: String,
    pub house_id: String,
    pub sign_id: String,
    pub degree: u32,
    pub minute: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChartAspects {
    pub planetary: Vec<NatalAspect>,
    /// Aspects to the Ascendant or Midheaven.
    pub other: Vec<NatalAspect>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ElementalAnalysis {
    pub id: String,
    pub profile_id: String,
    pub fire: u32,
    pub earth: u32,
    pub air: u32,
    pub water: u32,
    pub fire_planet_ids: Vec<String>,
    pub earth_planet_ids: Vec<String>,
    pub air_planet_ids: Vec<String>,
    pub water_planet_ids: Vec<String>,
    pub dominant: String,
    pub deficient: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChartRulers {
    pub traditional: String,
    pub modern: String,
}

impl ChartRulers {
    pub fn for_sign(sign: ZodiacSign) -> Self {
        ChartRulers {
            traditional: sign.traditional_ruler().id().to_string(),
            modern: sign.modern_ruler().id().to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NatalChart {
    pub placements: Vec<NatalPlacement>,
    pub house_positions: Vec<HousePosition>,
    pub aspects: ChartAspects,
    pub configurations: Vec<NatalConfiguration>,
    pub elemental_analysis: ElementalAnalysis,
    pub chart_rulers: ChartRulers,
    pub houses: HouseCusps,
}

// ---------------------------
// ## Builders
// ---------------------------

/// Display name in a natal chart, where the node is the North Node.
pub fn natal_name(planet: Planet) -> &'static str {
    match planet {
        Planet::TrueNode => "North Node",
        other => other.name(),
    }
}

fn abbreviate(name: &str) -> String {
    name.chars().take(3).collect()
}

pub fn build_placement(
    profile_id: &str,
    planet: Planet,
    longitude: f64,
    house: u8,
    retrograde: bool,
    ascendant_sign: ZodiacSign,
) -> NatalPlacement {
    let position = SignPosition::from_longitude(longitude);
    let planet_id = planet.placement_id();
    let name = natal_name(planet);
    let is_chart_ruler = if ascendant_sign.traditional_ruler() == planet {
        Some("traditional".to_string())
    } else if ascendant_sign.modern_ruler() == planet {
        Some("modern".to_string())
    } else {
        None
    };
    NatalPlacement {
        id: format!("{}-{}", profile_id, planet_id),
        profile_id: profile_id.to_string(),
        planet_id: planet_id.to_string(),
        sign_id: position.sign.id().to_string(),
        house_id: format!("house-{}", house),
        decan_id: Some(decan_id(longitude)),
        degree: position.degree,
        minute: position.minute,
        retrograde,
        dignity_id: dignity_of(planet, position.sign).map(|d| d.id().to_string()),
        is_chart_ruler,
        full_name: format!("{} in {}", name, position.sign.name()),
        short_name: format!("{} {}", abbreviate(name), abbreviate(position.sign.name())),
    }
}

pub fn house_positions(profile_id: &str, houses: &HouseCusps) -> Vec<HousePosition> {
    houses
        .cusps
        .iter()
        .enumerate()
        .map(|(i, cusp)| {
            let position = SignPosition::from_longitude(*cusp);
            let house = i + 1;
            HousePosition {
                id: format!("{}-house-{}", profile_id, house),
                profile_id: profile_id.to_string(),
                house_id: format!("house-{}", house),
                sign_id: position.sign.id().to_string(),
                degree: position.degree,
                minute: position.minute,
            }
        })
        .collect()
}

/// Counts per element. Dominant is the first highest and deficient the last
/// lowest when elements are ranked in fire, earth, air, water order.
pub fn elemental_analysis(profile_id: &str, placements: &[NatalPlacement]) -> ElementalAnalysis {
    let mut lists: [Vec<String>; 4] = Default::default();
    for placement in placements {
        if let Some(sign) = ZodiacSign::from_id(&placement.sign_id) {
            let slot = Element::ALL
                .iter()
                .position(|e| *e == sign.element())
                .unwrap_or(0);
            lists[slot].push(placement.planet_id.clone());
        }
    }

    let mut ranked: Vec<(Element, usize)> = Element::ALL
        .iter()
        .zip(lists.iter())
        .map(|(element, list)| (*element, list.len()))
        .collect();
    // stable, so ties keep element order
    ranked.sort_by(|a, b| b.1.cmp(&a.1));
    let dominant = ranked.first().map(|(e, _)| e.id()).unwrap_or_default();
    let deficient = ranked.last().map(|(e, _)| e.id()).unwrap_or_default();

    let [fire, earth, air, water] = lists;
    ElementalAnalysis {
        id: format!("{}-elemental", profile_id),
        profile_id: profile_id.to_string(),
        fire: fire.len() as u32,
        earth: earth.len() as u32,
        air: air.len() as u32,
        water: water.len() as u32,
        fire_planet_ids: fire,
        earth_planet_ids: earth,
        air_planet_ids: air,
        water_planet_ids: water,
        dominant: dominant.to_string(),
        deficient: deficient.to_string(),
    }
}

/// Natal chart for the instant of `positions` at a place.
///
/// Positions one day earlier decide retrograde flags and whether each
/// aspect is applying.
pub fn calculate_natal_chart<S: PositionSource + ?Sized>(
    source: &S,
    profile_id: &str,
    positions: &PlanetaryPositions,
    latitude: f64,
    east_longitude: f64,
    system: HouseSystem,
) -> Result<NatalChart> {
    let jd = positions.julian_day;
    let previous = PlanetaryPositions::compute(source, jd - 1.0)?;
    let houses = calculate_houses(jd, latitude, east_longitude, system)?;
    let previous_houses = calculate_houses(jd - 1.0, latitude, east_longitude, system)?;
    let ascendant_sign = ZodiacSign::from_longitude(houses.ascendant);

    let mut placements = Vec::with_capacity(NATAL_PLANETS.len());
    let mut points = Vec::with_capacity(NATAL_PLANETS.len() + 2);
    for planet in NATAL_PLANETS {
        let (longitude, before) = match (positions.longitude(planet), previous.longitude(planet)) {
            (Some(now), Some(before)) => (now, before),
            _ => continue,
        };
        let retrograde = planet.can_retrograde() && signed_difference(longitude, before) < 0.0;
        placements.push(build_placement(
            profile_id,
            planet,
            longitude,
            houses.house_of(longitude),
            retrograde,
            ascendant_sign,
        ));
        points.push(AspectPoint {
            planet,
            longitude,
            previous_longitude: before,
        });
    }
    points.push(AspectPoint {
        planet: Planet::Ascendant,
        longitude: houses.ascendant,
        previous_longitude: previous_houses.ascendant,
    });
    points.push(AspectPoint {
        planet: Planet::Midheaven,
        longitude: houses.midheaven,
        previous_longitude: previous_houses.midheaven,
    });

    let (other, planetary): (Vec<NatalAspect>, Vec<NatalAspect>) = find_natal_aspects(profile_id, &points)
        .into_iter()
        .partition(|aspect| is_angle_id(&aspect.planet1_id) || is_angle_id(&aspect.planet2_id));

    let configurations = detect_configurations(profile_id, &placements, &planetary);
    let elemental_analysis = elemental_analysis(profile_id, &placements);
    let first_house_sign = ZodiacSign::from_longitude(houses.cusps[0]);

    debug!(
        profile_id,
        system = %houses.system,
        aspects = planetary.len() + other.len(),
        configurations = configurations.len(),
        "natal chart"
    );

    Ok(NatalChart {
        house_positions: house_positions(profile_id, &houses),
        placements,
        aspects: ChartAspects { planetary, other },
        configurations,
        elemental_analysis,
        chart_rulers: ChartRulers::for_sign(first_house_sign),
        houses,
    })
}

fn is_angle_id(planet_id: &str) -> bool {
    Planet::from_id(planet_id).map_or(false, |p| p.is_angle())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ephemeris::AnalyticEphemeris;
    use crate::time::julian_day;
    use chrono::{TimeZone, Utc};

    fn placement(planet: &str, sign: &str) -> NatalPlacement {
        NatalPlacement {
            id: String::new(),
            profile_id: "p".to_string(),
            planet_id: planet.to_string(),
            sign_id: sign.to_string(),
            house_id: "house-1".to_string(),
            decan_id: None,
            degree: 0,
            minute: 0,
            retrograde: false,
            dignity_id: None,
            is_chart_ruler: None,
            full_name: String::new(),
            short_name: String::new(),
        }
    }

    #[test]
    fn test_dignities() {
        assert_eq!(dignity_of(Planet::Sun, ZodiacSign::Leo), Some(Dignity::Domicile));
        assert_eq!(dignity_of(Planet::Sun, ZodiacSign::Aries), Some(Dignity::Exaltation));
        assert_eq!(dignity_of(Planet::Sun, ZodiacSign::Aquarius), Some(Dignity::Detriment));
        assert_eq!(dignity_of(Planet::Sun, ZodiacSign::Libra), Some(Dignity::Fall));
        assert_eq!(dignity_of(Planet::Pluto, ZodiacSign::Scorpio), Some(Dignity::Domicile));
        assert_eq!(dignity_of(Planet::Mars, ZodiacSign::Gemini), None);
    }

    #[test]
    fn test_decans() {
        assert_eq!(decan_id(0.0), "decan-1");
        assert_eq!(decan_id(25.0), "decan-3");
        assert_eq!(decan_id(359.9), "decan-36");
    }

    #[test]
    fn test_placement_names() {
        let p = build_placement("prof", Planet::Sun, 215.5, 10, false, ZodiacSign::Aries);
        assert_eq!(p.id, "prof-sun");
        assert_eq!(p.sign_id, "scorpio");
        assert_eq!(p.degree, 5);
        assert_eq!(p.minute, 30);
        assert_eq!(p.full_name, "Sun in Scorpio");
        assert_eq!(p.short_name, "Sun Sco");
        assert_eq!(p.house_number(), Some(10));
        assert_eq!(p.is_chart_ruler, None);

        let node = build_placement("prof", Planet::TrueNode, 130.0, 5, true, ZodiacSign::Aries);
        assert_eq!(node.planet_id, "north-node");
        assert_eq!(node.full_name, "North Node in Leo");
        assert_eq!(node.short_name, "Nor Leo");

        let ruler = build_placement("prof", Planet::Pluto, 130.0, 5, true, ZodiacSign::Scorpio);
        assert_eq!(ruler.is_chart_ruler.as_deref(), Some("modern"));
    }

    #[test]
    fn test_elemental_ties_keep_order() {
        let empty = elemental_analysis("p", &[]);
        assert_eq!(empty.dominant, "fire");
        assert_eq!(empty.deficient, "water");

        let placements = vec![
            placement("sun", "taurus"),
            placement("moon", "cancer"),
            placement("mars", "virgo"),
            placement("venus", "pisces"),
            placement("jupiter", "leo"),
        ];
        let analysis = elemental_analysis("p", &placements);
        assert_eq!(analysis.earth, 2);
        assert_eq!(analysis.water, 2);
        assert_eq!(analysis.air, 0);
        assert_eq!(analysis.dominant, "earth");
        assert_eq!(analysis.deficient, "air");
        assert_eq!(analysis.water_planet_ids, vec!["moon", "venus"]);
        assert_eq!(analysis.id, "p-elemental");
    }

    #[test]
    fn test_natal_chart_shape() {
        let instant = Utc.with_ymd_and_hms(1990, 6, 15, 12, 0, 0).unwrap();
        let positions = PlanetaryPositions::compute(&AnalyticEphemeris, julian_day(&instant)).unwrap();
        let chart = calculate_natal_chart(
            &AnalyticEphemeris,
            "p",
            &positions,
            51.5,
            -0.12,
            HouseSystem::Placidus,
        )
        .unwrap();

        assert_eq!(chart.placements.len(), 12);
        assert_eq!(chart.house_positions.len(), 12);
        assert_eq!(chart.house_positions[0].id, "p-house-1");
        assert!(chart.placements.iter().all(|p| (1..=12).contains(&p.house_number().unwrap())));
        assert!(!chart.placements[0].retrograde);
        assert!(chart
            .aspects
            .other
            .iter()
            .all(|a| a.planet1_id == "ascendant"
                || a.planet1_id == "midheaven"
                || a.planet2_id == "ascendant"
                || a.planet2_id == "midheaven"));
        assert!(chart
            .aspects
            .planetary
            .iter()
            .all(|a| !is_angle_id(&a.planet1_id) && !is_angle_id(&a.planet2_id)));

        let first = ZodiacSign::from_id(&chart.house_positions[0].sign_id).unwrap();
        assert_eq!(chart.chart_rulers.traditional, first.traditional_ruler().id());
        let counted = chart.elemental_analysis.fire
            + chart.elemental_analysis.earth
            + chart.elemental_analysis.air
            + chart.elemental_analysis.water;
        assert_eq!(counted, 12);
    }
}
