//! Chakra activations by sign and the alchemical balance they imply.

use serde::{Deserialize, Serialize};

use crate::natal::NatalPlacement;
use crate::zodiac::ZodiacSign;

// ---------------------------
// ## Chakras
// ---------------------------

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Chakra {
    Root,
    Sacral,
    SolarPlexus,
    Heart,
    Throat,
    ThirdEye,
    Crown,
}

impl Chakra {
    pub const ALL: [Chakra; 7] = [
        Chakra::Root,
        Chakra::Sacral,
        Chakra::SolarPlexus,
        Chakra::Heart,
        Chakra::Throat,
        Chakra::ThirdEye,
        Chakra::Crown,
    ];

    pub fn id(&self) -> &'static str {
        match self {
            Chakra::Root => "chakra-1-root",
            Chakra::Sacral => "chakra-2-sacral",
            Chakra::SolarPlexus => "chakra-3-solar-plexus",
            Chakra::Heart => "chakra-4-heart",
            Chakra::Throat => "chakra-5-throat",
            Chakra::ThirdEye => "chakra-6-third-eye",
            Chakra::Crown => "chakra-7-crown",
        }
    }

    pub fn related_signs(&self) -> &'static [ZodiacSign] {
        use ZodiacSign::*;
        match self {
            Chakra::Root => &[Capricorn, Aquarius],
            Chakra::Sacral => &[Sagittarius, Pisces],
            Chakra::SolarPlexus => &[Aries, Scorpio],
            Chakra::Heart => &[Taurus, Libra],
            Chakra::Throat => &[Gemini, Virgo],
            Chakra::ThirdEye => &[Cancer],
            Chakra::Crown => &[Leo],
        }
    }

    pub fn alchemical_substance(&self) -> &'static str {
        match self {
            Chakra::Root => "Sal",
            Chakra::Sacral => "Sal-Mercurius",
            Chakra::SolarPlexus => "Sulphur",
            Chakra::Heart => "Mercurius",
            Chakra::Throat => "Mercurius",
            Chakra::ThirdEye => "Sulphur-Sal",
            Chakra::Crown => "Sulphur",
        }
    }

    pub fn governs(&self, sign_id: &str) -> bool {
        self.related_signs().iter().any(|sign| sign.id() == sign_id)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChakraActivation {
    pub chakra_id: String,
    pub activating_planet_ids: Vec<String>,
    pub primary_sign_id: String,
    pub alchemical_substance: String,
}

/// One activation per chakra that has at least one placement in its signs,
/// in chakra order. The primary sign is that of the first matching placement.
pub fn calculate_chakra_activations(placements: &[NatalPlacement]) -> Vec<ChakraActivation> {
    Chakra::ALL
        .iter()
        .filter_map(|chakra| {
            let matching: Vec<&NatalPlacement> = placements
                .iter()
                .filter(|p| chakra.governs(&p.sign_id))
                .collect();
            let first = matching.first()?;
            Some(ChakraActivation {
                chakra_id: chakra.id().to_string(),
                activating_planet_ids: matching.iter().map(|p| p.planet_id.clone()).collect(),
                primary_sign_id: first.sign_id.clone(),
                alchemical_substance: chakra.alchemical_substance().to_string(),
            })
        })
        .collect()
}

// ---------------------------
// ## Alchemy
// ---------------------------

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Substance {
    Sulphur,
    Mercury,
    Salt,
}

impl Substance {
    /// Compound names count toward the first substance they mention.
    pub fn classify(substance: &str) -> Substance {
        let lower = substance.to_lowercase();
        if lower.contains("sulphur") {
            Substance::Sulphur
        } else if lower.contains("sal-mercurius") || lower == "sal" || lower.starts_with("sal ") {
            Substance::Salt
        } else if lower.contains("mercurius") {
            Substance::Mercury
        } else {
            Substance::Salt
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlchemicalProfile {
    pub dominant_substance: Substance,
    pub sulphur_count: u32,
    pub mercury_count: u32,
    pub salt_count: u32,
    pub activating_planet_ids: Vec<String>,
}

pub fn calculate_alchemical_profile(activations: &[ChakraActivation]) -> AlchemicalProfile {
    let (mut sulphur, mut mercury, mut salt) = (0u32, 0u32, 0u32);
    let mut planet_ids: Vec<String> = Vec::new();

    for activation in activations {
        let count = activation.activating_planet_ids.len() as u32;
        match Substance::classify(&activation.alchemical_substance) {
            Substance::Sulphur => sulphur += count,
            Substance::Mercury => mercury += count,
            Substance::Salt => salt += count,
        }
        for id in &activation.activating_planet_ids {
            if !planet_ids.contains(id) {
                planet_ids.push(id.clone());
            }
        }
    }

    // strict maximum wins, any tie goes to salt
    let dominant_substance = if sulphur > mercury && sulphur > salt {
        Substance::Sulphur
    } else if mercury > sulphur && mercury > salt {
        Substance::Mercury
    } else {
        Substance::Salt
    };

    AlchemicalProfile {
        dominant_substance,
        sulphur_count: sulphur,
        mercury_count: mercury,
        salt_count: salt,
        activating_planet_ids: planet_ids,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn placement(planet: &str, sign: &str) -> NatalPlacement {
        NatalPlacement {
            id: format!("p-{}", planet),
            profile_id: "p".to_string(),
            planet_id: planet.to_string(),
            sign_id: sign.to_string(),
            house_id: "house-1".to_string(),
            degree: 10,
            minute: 0,
            retrograde: false,
            full_name: String::new(),
            short_name: String::new(),
            decan_id: None,
            dignity_id: None,
            is_chart_ruler: None,
        }
    }

    #[test]
    fn test_activations_follow_chakra_order() {
        let placements = vec![
            placement("sun", "leo"),
            placement("moon", "capricorn"),
            placement("mars", "aquarius"),
            placement("venus", "gemini"),
        ];
        let activations = calculate_chakra_activations(&placements);
        let ids: Vec<_> = activations.iter().map(|a| a.chakra_id.as_str()).collect();
        assert_eq!(ids, vec!["chakra-1-root", "chakra-5-throat", "chakra-7-crown"]);
        assert_eq!(activations[0].activating_planet_ids, vec!["moon", "mars"]);
        assert_eq!(activations[0].primary_sign_id, "capricorn");
        assert_eq!(activations[0].alchemical_substance, "Sal");
    }

    #[test]
    fn test_classify_substance() {
        assert_eq!(Substance::classify("Sulphur-Sal"), Substance::Sulphur);
        assert_eq!(Substance::classify("Sal-Mercurius"), Substance::Salt);
        assert_eq!(Substance::classify("Sal"), Substance::Salt);
        assert_eq!(Substance::classify("Mercurius"), Substance::Mercury);
        assert_eq!(Substance::classify("Aether"), Substance::Salt);
    }

    #[test]
    fn test_alchemical_counts_and_dominant() {
        let placements = vec![
            placement("sun", "leo"),
            placement("moon", "aries"),
            placement("mars", "scorpio"),
            placement("venus", "taurus"),
        ];
        let activations = calculate_chakra_activations(&placements);
        let profile = calculate_alchemical_profile(&activations);
        assert_eq!(profile.sulphur_count, 3);
        assert_eq!(profile.mercury_count, 1);
        assert_eq!(profile.salt_count, 0);
        assert_eq!(profile.dominant_substance, Substance::Sulphur);
        assert_eq!(profile.activating_planet_ids.len(), 4);
    }

    #[test]
    fn test_tie_goes_to_salt() {
        let placements = vec![placement("sun", "leo"), placement("venus", "taurus")];
        let profile = calculate_alchemical_profile(&calculate_chakra_activations(&placements));
        assert_eq!(profile.dominant_substance, Substance::Salt);
        assert_eq!(profile.salt_count, 0);
    }

    #[test]
    fn test_empty() {
        let profile = calculate_alchemical_profile(&[]);
        assert_eq!(profile.dominant_substance, Substance::Salt);
        assert!(profile.activating_planet_ids.is_empty());
    }
}
