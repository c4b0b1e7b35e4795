use std::fmt;

use serde::{Deserialize, Serialize};

use blueprint_ephemeris::{normalize_degrees, Body};

// ---------------------------
// ## Signs
// ---------------------------

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ZodiacSign {
    Aries = 0,
    Taurus,
    Gemini,
    Cancer,
    Leo,
    Virgo,
    Libra,
    Scorpio,
    Sagittarius,
    Capricorn,
    Aquarius,
    Pisces,
}

impl ZodiacSign {
    pub const ALL: [ZodiacSign; 12] = [
        ZodiacSign::Aries,
        ZodiacSign::Taurus,
        ZodiacSign::Gemini,
        ZodiacSign::Cancer,
        ZodiacSign::Leo,
        ZodiacSign::Virgo,
        ZodiacSign::Libra,
        ZodiacSign::Scorpio,
        ZodiacSign::Sagittarius,
        ZodiacSign::Capricorn,
        ZodiacSign::Aquarius,
        ZodiacSign::Pisces,
    ];

    pub fn from_longitude(longitude: f64) -> Self {
        let sign_index = (normalize_degrees(longitude) / 30.0).floor() as usize;
        ZodiacSign::from_index(sign_index)
    }

    /// Wraps indices past Pisces back to Aries.
    pub fn from_index(index: usize) -> Self {
        ZodiacSign::ALL[index % 12]
    }

    pub fn from_id(id: &str) -> Option<Self> {
        ZodiacSign::ALL
            .iter()
            .copied()
            .find(|sign| sign.id().eq_ignore_ascii_case(id) || sign.abbreviation().eq_ignore_ascii_case(id))
    }

    pub fn index(&self) -> usize {
        *self as usize
    }

    pub fn start_degree(&self) -> f64 {
        self.index() as f64 * 30.0
    }

    pub fn opposite(&self) -> Self {
        ZodiacSign::from_index(self.index() + 6)
    }

    pub fn id(&self) -> &'static str {
        match self {
            ZodiacSign::Aries => "aries",
            ZodiacSign::Taurus => "taurus",
            ZodiacSign::Gemini => "gemini",
            ZodiacSign::Cancer => "cancer",
            ZodiacSign::Leo => "leo",
            ZodiacSign::Virgo => "virgo",
            ZodiacSign::Libra => "libra",
            ZodiacSign::Scorpio => "scorpio",
            ZodiacSign::Sagittarius => "sagittarius",
            ZodiacSign::Capricorn => "capricorn",
            ZodiacSign::Aquarius => "aquarius",
            ZodiacSign::Pisces => "pisces",
        }
    }

    pub fn abbreviation(&self) -> &'static str {
        &self.name()[..3]
    }

    pub fn name(&self) -> &'static str {
        match self {
            ZodiacSign::Aries => "Aries",
            ZodiacSign::Taurus => "Taurus",
            ZodiacSign::Gemini => "Gemini",
            ZodiacSign::Cancer => "Cancer",
            ZodiacSign::Leo => "Leo",
            ZodiacSign::Virgo => "Virgo",
            ZodiacSign::Libra => "Libra",
            ZodiacSign::Scorpio => "Scorpio",
            ZodiacSign::Sagittarius => "Sagittarius",
            ZodiacSign::Capricorn => "Capricorn",
            ZodiacSign::Aquarius => "Aquarius",
            ZodiacSign::Pisces => "Pisces",
        }
    }

    pub fn element(&self) -> Element {
        match self.index() % 4 {
            0 => Element::Fire,
            1 => Element::Earth,
            2 => Element::Air,
            _ => Element::Water,
        }
    }

    pub fn modality(&self) -> Modality {
        match self.index() % 3 {
            0 => Modality::Cardinal,
            1 => Modality::Fixed,
            _ => Modality::Mutable,
        }
    }

    pub fn traditional_ruler(&self) -> Planet {
        match self {
            ZodiacSign::Aries | ZodiacSign::Scorpio => Planet::Mars,
            ZodiacSign::Taurus | ZodiacSign::Libra => Planet::Venus,
            ZodiacSign::Gemini | ZodiacSign::Virgo => Planet::Mercury,
            ZodiacSign::Cancer => Planet::Moon,
            ZodiacSign::Leo => Planet::Sun,
            ZodiacSign::Sagittarius | ZodiacSign::Pisces => Planet::Jupiter,
            ZodiacSign::Capricorn | ZodiacSign::Aquarius => Planet::Saturn,
        }
    }

    pub fn modern_ruler(&self) -> Planet {
        match self {
            ZodiacSign::Scorpio => Planet::Pluto,
            ZodiacSign::Aquarius => Planet::Uranus,
            ZodiacSign::Pisces => Planet::Neptune,
            other => other.traditional_ruler(),
        }
    }
}

impl fmt::Display for ZodiacSign {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Element {
    Fire,
    Earth,
    Air,
    Water,
}

impl Element {
    pub const ALL: [Element; 4] = [Element::Fire, Element::Earth, Element::Air, Element::Water];

    pub fn id(&self) -> &'static str {
        match self {
            Element::Fire => "fire",
            Element::Earth => "earth",
            Element::Air => "air",
            Element::Water => "water",
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Modality {
    Cardinal,
    Fixed,
    Mutable,
}

// ---------------------------
// ## Planets and points
// ---------------------------

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Planet {
    Sun,
    Earth,
    Moon,
    Mercury,
    Venus,
    Mars,
    Jupiter,
    Saturn,
    Uranus,
    Neptune,
    Pluto,
    TrueNode,
    Chiron,
    Ascendant,
    Midheaven,
}

/// The thirteen bodies of the Human Design model, in activation order.
pub const HD_BODIES: [Planet; 13] = [
    Planet::Sun,
    Planet::Earth,
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

/// The ten classical transit planets.
pub const TRANSIT_PLANETS: [Planet; 10] = [
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
];

impl Planet {
    pub fn id(&self) -> &'static str {
        match self {
            Planet::Sun => "sun",
            Planet::Earth => "earth",
            Planet::Moon => "moon",
            Planet::Mercury => "mercury",
            Planet::Venus => "venus",
            Planet::Mars => "mars",
            Planet::Jupiter => "jupiter",
            Planet::Saturn => "saturn",
            Planet::Uranus => "uranus",
            Planet::Neptune => "neptune",
            Planet::Pluto => "pluto",
            Planet::TrueNode => "true-node",
            Planet::Chiron => "chiron",
            Planet::Ascendant => "ascendant",
            Planet::Midheaven => "midheaven",
        }
    }

    /// Identifier used for natal placements, where the node is `north-node`.
    pub fn placement_id(&self) -> &'static str {
        match self {
            Planet::TrueNode => "north-node",
            other => other.id(),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Planet::Sun => "Sun",
            Planet::Earth => "Earth",
            Planet::Moon => "Moon",
            Planet::Mercury => "Mercury",
            Planet::Venus => "Venus",
            Planet::Mars => "Mars",
            Planet::Jupiter => "Jupiter",
            Planet::Saturn => "Saturn",
            Planet::Uranus => "Uranus",
            Planet::Neptune => "Neptune",
            Planet::Pluto => "Pluto",
            Planet::TrueNode => "True Node",
            Planet::Chiron => "Chiron",
            Planet::Ascendant => "Ascendant",
            Planet::Midheaven => "Midheaven",
        }
    }

    pub fn from_id(id: &str) -> Option<Planet> {
        let planet = match id.to_ascii_lowercase().as_str() {
            "sun" => Planet::Sun,
            "earth" => Planet::Earth,
            "moon" => Planet::Moon,
            "mercury" => Planet::Mercury,
            "venus" => Planet::Venus,
            "mars" => Planet::Mars,
            "jupiter" => Planet::Jupiter,
            "saturn" => Planet::Saturn,
            "uranus" => Planet::Uranus,
            "neptune" => Planet::Neptune,
            "pluto" => Planet::Pluto,
            "true-node" | "north-node" | "northnode" | "true node" => Planet::TrueNode,
            "chiron" => Planet::Chiron,
            "ascendant" | "asc" => Planet::Ascendant,
            "midheaven" | "mc" => Planet::Midheaven,
            _ => return None,
        };
        Some(planet)
    }

    /// Ephemeris body for this planet. Earth and the angles are derived.
    pub fn body(&self) -> Option<Body> {
        match self {
            Planet::Sun => Some(Body::Sun),
            Planet::Moon => Some(Body::Moon),
            Planet::Mercury => Some(Body::Mercury),
            Planet::Venus => Some(Body::Venus),
            Planet::Mars => Some(Body::Mars),
            Planet::Jupiter => Some(Body::Jupiter),
            Planet::Saturn => Some(Body::Saturn),
            Planet::Uranus => Some(Body::Uranus),
            Planet::Neptune => Some(Body::Neptune),
            Planet::Pluto => Some(Body::Pluto),
            Planet::TrueNode => Some(Body::TrueNode),
            Planet::Chiron => Some(Body::Chiron),
            Planet::Earth | Planet::Ascendant | Planet::Midheaven => None,
        }
    }

    pub fn is_luminary(&self) -> bool {
        matches!(self, Planet::Sun | Planet::Moon)
    }

    pub fn is_personal(&self) -> bool {
        matches!(self, Planet::Mercury | Planet::Venus | Planet::Mars)
    }

    pub fn is_angle(&self) -> bool {
        matches!(self, Planet::Ascendant | Planet::Midheaven)
    }

    /// Sun, Moon, Earth and the angles never station.
    pub fn can_retrograde(&self) -> bool {
        !matches!(
            self,
            Planet::Sun | Planet::Moon | Planet::Earth | Planet::Ascendant | Planet::Midheaven
        )
    }
}

impl fmt::Display for Planet {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

// ---------------------------
// ## Longitude helpers
// ---------------------------

/// A longitude expressed as sign, whole degree and whole minute.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignPosition {
    pub sign: ZodiacSign,
    pub degree: u32,
    pub minute: u32,
}

impl SignPosition {
    pub fn from_longitude(longitude: f64) -> Self {
        let normalized = normalize_degrees(longitude);
        let in_sign = normalized % 30.0;
        let degree = in_sign.floor();
        let minute = ((in_sign - degree) * 60.0).floor();
        SignPosition {
            sign: ZodiacSign::from_longitude(normalized),
            degree: degree as u32,
            minute: (minute as u32).min(59),
        }
    }

    pub fn to_longitude(&self) -> f64 {
        sign_position_to_longitude(self.sign, self.degree as f64, self.minute as f64)
    }

    /// `12°05'`
    pub fn formatted_degree(&self) -> String {
        format!("{}°{:02}'", self.degree, self.minute)
    }
}

impl fmt::Display for SignPosition {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{} {}", self.formatted_degree(), self.sign)
    }
}

pub fn sign_position_to_longitude(sign: ZodiacSign, degree: f64, minute: f64) -> f64 {
    normalize_degrees(sign.start_degree() + degree + minute / 60.0)
}

/// Shortest arc between two longitudes, always within 0..=180.
pub fn angular_distance(a: f64, b: f64) -> f64 {
    let diff = (a - b).abs() % 360.0;
    if diff <= 180.0 {
        diff
    } else {
        360.0 - diff
    }
}

/// `target - value` wrapped into -180..=180.
pub fn signed_difference(target: f64, value: f64) -> f64 {
    let mut diff = (target - value) % 360.0;
    if diff > 180.0 {
        diff -= 360.0;
    }
    if diff < -180.0 {
        diff += 360.0;
    }
    diff
}

pub fn earth_longitude(sun_longitude: f64) -> f64 {
    normalize_degrees(sun_longitude + 180.0)
}

pub fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round() / factor
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_sign_from_longitude() {
        assert_eq!(ZodiacSign::from_longitude(0.0), ZodiacSign::Aries);
        assert_eq!(ZodiacSign::from_longitude(29.999), ZodiacSign::Aries);
        assert_eq!(ZodiacSign::from_longitude(30.0), ZodiacSign::Taurus);
        assert_eq!(ZodiacSign::from_longitude(359.9), ZodiacSign::Pisces);
        assert_eq!(ZodiacSign::from_longitude(-15.0), ZodiacSign::Pisces);
        assert_eq!(ZodiacSign::from_longitude(725.0), ZodiacSign::Aries);
    }

    #[test]
    fn test_sign_position_degree_and_minute() {
        let position = SignPosition::from_longitude(205.5);
        assert_eq!(position.sign, ZodiacSign::Libra);
        assert_eq!(position.degree, 25);
        assert_eq!(position.minute, 30);
        assert_eq!(position.formatted_degree(), "25°30'");
    }

    #[test]
    fn test_sign_position_back_to_longitude() {
        let longitude = sign_position_to_longitude(ZodiacSign::Scorpio, 12.0, 30.0);
        assert_relative_eq!(longitude, 222.5);
    }

    #[test]
    fn test_elements_and_modalities() {
        assert_eq!(ZodiacSign::Leo.element(), Element::Fire);
        assert_eq!(ZodiacSign::Capricorn.element(), Element::Earth);
        assert_eq!(ZodiacSign::Aquarius.element(), Element::Air);
        assert_eq!(ZodiacSign::Pisces.element(), Element::Water);
        assert_eq!(ZodiacSign::Libra.modality(), Modality::Cardinal);
        assert_eq!(ZodiacSign::Scorpio.modality(), Modality::Fixed);
        assert_eq!(ZodiacSign::Gemini.modality(), Modality::Mutable);
    }

    #[test]
    fn test_rulers() {
        assert_eq!(ZodiacSign::Scorpio.traditional_ruler(), Planet::Mars);
        assert_eq!(ZodiacSign::Scorpio.modern_ruler(), Planet::Pluto);
        assert_eq!(ZodiacSign::Aquarius.modern_ruler(), Planet::Uranus);
        assert_eq!(ZodiacSign::Taurus.modern_ruler(), Planet::Venus);
    }

    #[test]
    fn test_sign_from_id_accepts_abbreviations() {
        assert_eq!(ZodiacSign::from_id("Sag"), Some(ZodiacSign::Sagittarius));
        assert_eq!(ZodiacSign::from_id("pisces"), Some(ZodiacSign::Pisces));
        assert_eq!(ZodiacSign::from_id("ophiuchus"), None);
    }

    #[test]
    fn test_angular_distance_wraps() {
        assert_relative_eq!(angular_distance(350.0, 10.0), 20.0);
        assert_relative_eq!(angular_distance(10.0, 190.0), 180.0);
        assert_relative_eq!(angular_distance(-30.0, 30.0), 60.0);
    }

    #[test]
    fn test_signed_difference() {
        assert_relative_eq!(signed_difference(10.0, 350.0), 20.0);
        assert_relative_eq!(signed_difference(350.0, 10.0), -20.0);
    }

    #[test]
    fn test_earth_opposes_sun() {
        assert_relative_eq!(earth_longitude(200.0), 20.0);
        assert_relative_eq!(earth_longitude(90.0), 270.0);
    }

    #[test]
    fn test_planet_ids_round_trip() {
        for planet in HD_BODIES {
            assert_eq!(Planet::from_id(planet.id()), Some(planet));
        }
        assert_eq!(Planet::from_id("north-node"), Some(Planet::TrueNode));
        assert_eq!(Planet::TrueNode.placement_id(), "north-node");
    }
}
