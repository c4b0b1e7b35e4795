//! Human Design bodygraph derived from natal (personality) and design positions.
//!
//! Gates come from the mandala wheel in [`gates`]; channels and center
//! connectivity live in [`channels`]. This module combines both into type,
//! strategy, authority, profile, definition and incarnation cross.

pub mod channels;
pub mod gates;

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::ephemeris::{find_position, PlanetaryPosition};
use crate::error::{BlueprintError, Result};
use crate::zodiac::{Planet, HD_BODIES};

pub use channels::{Center, Channel, CHANNELS};
pub use gates::{gate_at, gate_id, GateLine};

// ---------------------------
// ## Classification enums
// ---------------------------

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HdType {
    Generator,
    #[serde(rename = "Manifesting Generator")]
    ManifestingGenerator,
    Projector,
    Manifestor,
    Reflector,
}

impl HdType {
    pub fn name(&self) -> &'static str {
        match self {
            HdType::Generator => "Generator",
            HdType::ManifestingGenerator => "Manifesting Generator",
            HdType::Projector => "Projector",
            HdType::Manifestor => "Manifestor",
            HdType::Reflector => "Reflector",
        }
    }

    pub fn strategy(&self) -> Strategy {
        match self {
            HdType::Generator | HdType::ManifestingGenerator => Strategy::WaitToRespond,
            HdType::Projector => Strategy::WaitForInvitation,
            HdType::Manifestor => Strategy::InformThenAct,
            HdType::Reflector => Strategy::WaitForLunarCycle,
        }
    }
}

impl fmt::Display for HdType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Strategy {
    #[serde(rename = "Wait to Respond")]
    WaitToRespond,
    #[serde(rename = "Inform then Act")]
    InformThenAct,
    #[serde(rename = "Wait for Invitation")]
    WaitForInvitation,
    #[serde(rename = "Wait for Lunar Cycle")]
    WaitForLunarCycle,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Authority {
    Emotional,
    Sacral,
    Splenic,
    #[serde(rename = "Ego/Heart")]
    Ego,
    #[serde(rename = "Self/G")]
    SelfProjected,
    #[serde(rename = "Mental/None")]
    Mental,
    Lunar,
}

impl Authority {
    /// First defined center in precedence order decides the authority.
    pub fn from_centers(defined: &[Center]) -> Authority {
        let has = |center: Center| defined.contains(&center);
        if has(Center::SolarPlexus) {
            Authority::Emotional
        } else if has(Center::Sacral) {
            Authority::Sacral
        } else if has(Center::Spleen) {
            Authority::Splenic
        } else if has(Center::Heart) {
            Authority::Ego
        } else if has(Center::G) {
            Authority::SelfProjected
        } else if has(Center::Head) || has(Center::Ajna) {
            Authority::Mental
        } else {
            Authority::Lunar
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Definition {
    Single,
    Split,
    #[serde(rename = "Triple Split")]
    TripleSplit,
    #[serde(rename = "Quadruple Split")]
    QuadrupleSplit,
    #[serde(rename = "No Definition")]
    NoDefinition,
}

impl Definition {
    pub fn from_components(components: usize) -> Definition {
        match components {
            0 => Definition::NoDefinition,
            1 => Definition::Single,
            2 => Definition::Split,
            3 => Definition::TripleSplit,
            _ => Definition::QuadrupleSplit,
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CrossAngle {
    #[serde(rename = "Right Angle")]
    RightAngle,
    Juxtaposition,
    #[serde(rename = "Left Angle")]
    LeftAngle,
}

/// The twelve profiles, written `personality/design` Sun line.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Profile {
    #[serde(rename = "1/3")]
    P13,
    #[serde(rename = "1/4")]
    P14,
    #[serde(rename = "2/4")]
    P24,
    #[serde(rename = "2/5")]
    P25,
    #[serde(rename = "3/5")]
    P35,
    #[serde(rename = "3/6")]
    P36,
    #[serde(rename = "4/6")]
    P46,
    #[serde(rename = "4/1")]
    P41,
    #[serde(rename = "5/1")]
    P51,
    #[serde(rename = "5/2")]
    P52,
    #[serde(rename = "6/2")]
    P62,
    #[serde(rename = "6/3")]
    P63,
}

impl Profile {
    pub const ALL: [Profile; 12] = [
        Profile::P13,
        Profile::P14,
        Profile::P24,
        Profile::P25,
        Profile::P35,
        Profile::P36,
        Profile::P46,
        Profile::P41,
        Profile::P51,
        Profile::P52,
        Profile::P62,
        Profile::P63,
    ];

    pub fn lines(&self) -> (u8, u8) {
        match self {
            Profile::P13 => (1, 3),
            Profile::P14 => (1, 4),
            Profile::P24 => (2, 4),
            Profile::P25 => (2, 5),
            Profile::P35 => (3, 5),
            Profile::P36 => (3, 6),
            Profile::P46 => (4, 6),
            Profile::P41 => (4, 1),
            Profile::P51 => (5, 1),
            Profile::P52 => (5, 2),
            Profile::P62 => (6, 2),
            Profile::P63 => (6, 3),
        }
    }

    pub fn from_lines(personality: u8, design: u8) -> Option<Profile> {
        Profile::ALL
            .iter()
            .copied()
            .find(|profile| profile.lines() == (personality, design))
    }

    /// Like [`Profile::from_lines`] but falls back to 5/1 for an impossible pair.
    pub fn from_lines_or_default(personality: u8, design: u8) -> Profile {
        match Profile::from_lines(personality, design) {
            Some(profile) => profile,
            None => {
                warn!(
                    personality_line = personality,
                    design_line = design,
                    "non-standard profile, using 5/1"
                );
                Profile::P51
            }
        }
    }

    pub fn cross_angle(&self) -> CrossAngle {
        match self {
            Profile::P41 => CrossAngle::Juxtaposition,
            Profile::P51 | Profile::P52 | Profile::P62 | Profile::P63 => CrossAngle::LeftAngle,
            _ => CrossAngle::RightAngle,
        }
    }
}

impl fmt::Display for Profile {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let (personality, design) = self.lines();
        write!(f, "{}/{}", personality, design)
    }
}

// ---------------------------
// ## Activations
// ---------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HdGateActivation {
    pub gate_id: String,
    pub gate_number: u8,
    pub line: u8,
    pub is_personality: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub planet: Option<String>,
}

/// Gate activations for the thirteen bodies present in `positions`, in
/// activation order. Bodies missing from `positions` are skipped.
pub fn to_gate_activations(positions: &[PlanetaryPosition], is_personality: bool) -> Vec<HdGateActivation> {
    HD_BODIES
        .iter()
        .filter_map(|planet| {
            let position = find_position(positions, *planet)?;
            let gate_line = gate_at(position.longitude);
            Some(HdGateActivation {
                gate_id: gate_line.gate_id(),
                gate_number: gate_line.gate,
                line: gate_line.line,
                is_personality,
                planet: Some(planet.name().to_string()),
            })
        })
        .collect()
}

fn activation_for<'a>(activations: &'a [HdGateActivation], planet: Planet) -> Option<&'a HdGateActivation> {
    activations
        .iter()
        .find(|a| a.planet.as_deref() == Some(planet.name()))
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HdCoreGate {
    pub gate_id: String,
    pub gate_number: u8,
    pub line: u8,
    pub center_name: String,
}

impl HdCoreGate {
    fn from_gate_line(gate_line: GateLine) -> Self {
        HdCoreGate {
            gate_id: gate_line.gate_id(),
            gate_number: gate_line.gate,
            line: gate_line.line,
            center_name: gate_line
                .center()
                .map(|center| center.name().to_string())
                .unwrap_or_default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HdCoreIdentity {
    pub sun: HdCoreGate,
    pub moon: HdCoreGate,
    pub mercury: HdCoreGate,
    pub ascendant: HdCoreGate,
}

// ---------------------------
// ## Profile
// ---------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HumanDesignProfile {
    #[serde(rename = "type")]
    pub hd_type: HdType,
    pub strategy: Strategy,
    pub authority: Authority,
    pub profile: Profile,
    pub definition: Definition,
    pub incarnation_cross: String,
    pub cross_angle: CrossAngle,
    pub personality_gates: Vec<HdGateActivation>,
    pub design_gates: Vec<HdGateActivation>,
    pub defined_center_ids: Vec<String>,
    pub defined_channel_ids: Vec<String>,
    pub core_identity: HdCoreIdentity,
}

impl HumanDesignProfile {
    pub fn defined_centers(&self) -> Vec<Center> {
        self.defined_center_ids
            .iter()
            .filter_map(|id| Center::from_id(id))
            .collect()
    }

    pub fn is_center_defined(&self, center: Center) -> bool {
        self.defined_center_ids.iter().any(|id| id == center.id())
    }
}

pub fn determine_type(defined_centers: &[Center], defined_channels: &[Channel]) -> HdType {
    if defined_centers.is_empty() {
        return HdType::Reflector;
    }
    let sacral = defined_centers.contains(&Center::Sacral);
    let motor_to_throat = channels::motor_connected_to_throat(defined_channels);
    match (sacral, motor_to_throat) {
        (true, true) => HdType::ManifestingGenerator,
        (true, false) => HdType::Generator,
        (false, true) => HdType::Manifestor,
        (false, false) => HdType::Projector,
    }
}

fn required_gate(activations: &[HdGateActivation], planet: Planet, chart: &str) -> Result<GateLine> {
    activation_for(activations, planet)
        .map(|a| GateLine {
            gate: a.gate_number,
            line: a.line,
        })
        .ok_or_else(|| BlueprintError::InvalidInput(format!("{} chart has no {} position", chart, planet.id())))
}

fn natal_gate(positions: &[PlanetaryPosition], planet: Planet) -> Result<GateLine> {
    find_position(positions, planet)
        .map(|p| gate_at(p.longitude))
        .ok_or_else(|| BlueprintError::InvalidInput(format!("natal chart has no {} position", planet.id())))
}

/// Human Design profile from natal and design positions plus the natal
/// Ascendant longitude.
pub fn calculate_human_design_profile(
    natal_positions: &[PlanetaryPosition],
    design_positions: &[PlanetaryPosition],
    ascendant_longitude: f64,
) -> Result<HumanDesignProfile> {
    let personality_gates = to_gate_activations(natal_positions, true);
    let design_gates = to_gate_activations(design_positions, false);

    let personality_sun = required_gate(&personality_gates, Planet::Sun, "natal")?;
    let personality_earth = required_gate(&personality_gates, Planet::Earth, "natal")?;
    let design_sun = required_gate(&design_gates, Planet::Sun, "design")?;
    let design_earth = required_gate(&design_gates, Planet::Earth, "design")?;

    let active: BTreeSet<u8> = personality_gates
        .iter()
        .chain(design_gates.iter())
        .map(|a| a.gate_number)
        .collect();
    let defined_channels = channels::defined_channels(&active);
    let defined_centers = channels::defined_centers(&defined_channels);

    let hd_type = determine_type(&defined_centers, &defined_channels);
    let authority = Authority::from_centers(&defined_centers);
    let profile = Profile::from_lines_or_default(personality_sun.line, design_sun.line);
    let definition = Definition::from_components(channels::connected_components(&defined_channels));
    let incarnation_cross = format!(
        "Cross of {}/{} | {}/{}",
        personality_sun.gate, personality_earth.gate, design_sun.gate, design_earth.gate
    );

    debug!(
        hd_type = hd_type.name(),
        profile = %profile,
        channels = defined_channels.len(),
        centers = defined_centers.len(),
        "human design profile"
    );

    let core_identity = HdCoreIdentity {
        sun: HdCoreGate::from_gate_line(personality_sun),
        moon: HdCoreGate::from_gate_line(natal_gate(natal_positions, Planet::Moon)?),
        mercury: HdCoreGate::from_gate_line(natal_gate(natal_positions, Planet::Mercury)?),
        ascendant: HdCoreGate::from_gate_line(gate_at(ascendant_longitude)),
    };

    Ok(HumanDesignProfile {
        hd_type,
        strategy: hd_type.strategy(),
        authority,
        profile,
        definition,
        incarnation_cross,
        cross_angle: profile.cross_angle(),
        personality_gates,
        design_gates,
        defined_center_ids: defined_centers.iter().map(|c| c.id().to_string()).collect(),
        defined_channel_ids: defined_channels.iter().map(Channel::id).collect(),
        core_identity,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Middle of `line` within `gate`.
    fn longitude_of(gate: u8, line: u8) -> f64 {
        let (start, _) = gates::gate_range(gate).unwrap();
        start + (line as f64 - 0.5) * gates::LINE_SPAN
    }

    fn chart(placements: &[(Planet, u8, u8)]) -> Vec<PlanetaryPosition> {
        placements
            .iter()
            .map(|(planet, gate, line)| PlanetaryPosition::new(*planet, longitude_of(*gate, *line), None, false))
            .collect()
    }

    fn base(sun: (u8, u8), earth: u8) -> Vec<(Planet, u8, u8)> {
        vec![
            (Planet::Sun, sun.0, sun.1),
            (Planet::Earth, earth, 1),
            (Planet::Moon, 1, 1),
            (Planet::Mercury, 2, 1),
        ]
    }

    #[test]
    fn test_gate_activation_order_and_names() {
        let natal = chart(&[
            (Planet::Chiron, 10, 2),
            (Planet::Sun, 41, 3),
            (Planet::TrueNode, 19, 4),
        ]);
        let activations = to_gate_activations(&natal, true);
        let names: Vec<_> = activations.iter().map(|a| a.planet.clone().unwrap()).collect();
        assert_eq!(names, vec!["Sun", "True Node", "Chiron"]);
        assert_eq!(activations[0].gate_id, "gate-41");
        assert_eq!(activations[0].line, 3);
        assert!(activations.iter().all(|a| a.is_personality));
    }

    #[test]
    fn test_reflector_without_channels() {
        // Sun 41 / Earth 31, Moon 1, Mercury 2 complete no channel
        let natal = chart(&base((41, 1), 31));
        let design = chart(&base((13, 3), 26));
        let profile = calculate_human_design_profile(&natal, &design, 10.0).unwrap();
        assert_eq!(profile.hd_type, HdType::Reflector);
        assert_eq!(profile.strategy, Strategy::WaitForLunarCycle);
        assert_eq!(profile.authority, Authority::Lunar);
        assert_eq!(profile.definition, Definition::NoDefinition);
        assert!(profile.defined_center_ids.is_empty());
    }

    #[test]
    fn test_manifesting_generator_through_g_center() {
        // 5-15 (Sacral-G) and 7-31 (G-Throat)
        let mut natal = base((5, 2), 35);
        natal.push((Planet::Venus, 7, 1));
        let mut design = base((15, 4), 10);
        design.push((Planet::Mars, 31, 6));
        let profile =
            calculate_human_design_profile(&chart(&natal), &chart(&design), 0.0).unwrap();
        assert_eq!(profile.hd_type, HdType::ManifestingGenerator);
        assert_eq!(profile.authority, Authority::Sacral);
        assert_eq!(profile.profile, Profile::P24);
        assert_eq!(profile.definition, Definition::Single);
        assert!(profile.defined_channel_ids.contains(&"channel-5-15".to_string()));
        assert!(profile.defined_channel_ids.contains(&"channel-7-31".to_string()));
    }

    #[test]
    fn test_generator_and_emotional_authority() {
        // 59-6 (Sacral-Solar Plexus), no Throat
        let mut natal = base((59, 3), 55);
        natal.push((Planet::Venus, 6, 1));
        let design = chart(&base((41, 5), 31));
        let profile = calculate_human_design_profile(&chart(&natal), &design, 0.0).unwrap();
        assert_eq!(profile.hd_type, HdType::Generator);
        assert_eq!(profile.authority, Authority::Emotional);
        assert_eq!(profile.profile, Profile::P35);
    }

    #[test]
    fn test_manifestor_and_projector() {
        let mut manifestor = base((21, 1), 48);
        manifestor.push((Planet::Venus, 45, 1));
        let design = chart(&base((41, 3), 31));
        let profile = calculate_human_design_profile(&chart(&manifestor), &design, 0.0).unwrap();
        assert_eq!(profile.hd_type, HdType::Manifestor);
        assert_eq!(profile.strategy, Strategy::InformThenAct);
        assert_eq!(profile.authority, Authority::Ego);

        let mut projector = base((17, 1), 18);
        projector.push((Planet::Venus, 62, 1));
        let profile = calculate_human_design_profile(&chart(&projector), &design, 0.0).unwrap();
        assert_eq!(profile.hd_type, HdType::Projector);
        assert_eq!(profile.authority, Authority::Mental);
    }

    #[test]
    fn test_split_definition() {
        let mut natal = base((47, 1), 22);
        natal.push((Planet::Venus, 64, 1));
        natal.push((Planet::Mars, 42, 1));
        natal.push((Planet::Jupiter, 53, 1));
        let design = chart(&base((41, 1), 31));
        let profile = calculate_human_design_profile(&chart(&natal), &design, 0.0).unwrap();
        assert_eq!(profile.definition, Definition::Split);
    }

    #[test]
    fn test_invalid_profile_falls_back() {
        assert_eq!(Profile::from_lines(1, 6), None);
        assert_eq!(Profile::from_lines_or_default(1, 6), Profile::P51);
        assert_eq!(Profile::P41.cross_angle(), CrossAngle::Juxtaposition);
        assert_eq!(Profile::P63.cross_angle(), CrossAngle::LeftAngle);
        assert_eq!(Profile::P46.cross_angle(), CrossAngle::RightAngle);
    }

    #[test]
    fn test_cross_and_core_identity() {
        let natal = chart(&base((41, 1), 31));
        let design = chart(&base((13, 3), 26));
        let ascendant = longitude_of(44, 4);
        let profile = calculate_human_design_profile(&natal, &design, ascendant).unwrap();
        assert_eq!(profile.incarnation_cross, "Cross of 41/31 | 13/26");
        assert_eq!(profile.core_identity.sun.center_name, "Root");
        assert_eq!(profile.core_identity.moon.gate_id, "gate-1");
        assert_eq!(profile.core_identity.mercury.center_name, "G");
        assert_eq!(profile.core_identity.ascendant.gate_number, 44);
        assert_eq!(profile.core_identity.ascendant.line, 4);
        assert_eq!(profile.core_identity.ascendant.center_name, "Spleen");
    }

    #[test]
    fn test_missing_sun_is_error() {
        let natal = chart(&[(Planet::Moon, 1, 1)]);
        let design = chart(&base((13, 3), 26));
        assert!(calculate_human_design_profile(&natal, &design, 0.0).is_err());
    }

    #[test]
    fn test_serialized_names() {
        let json = serde_json::to_string(&HdType::ManifestingGenerator).unwrap();
        assert_eq!(json, "\"Manifesting Generator\"");
        let json = serde_json::to_string(&Authority::Ego).unwrap();
        assert_eq!(json, "\"Ego/Heart\"");
        let json = serde_json::to_string(&Profile::P41).unwrap();
        assert_eq!(json, "\"4/1\"");
        let json = serde_json::to_string(&Definition::NoDefinition).unwrap();
        assert_eq!(json, "\"No Definition\"");
    }
}
