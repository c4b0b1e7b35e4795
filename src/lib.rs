//! Birth-data calculations: tropical natal charts, Human Design, Gene Keys,
//! numerology, chakra and alchemy correspondences, and daily transits.

pub mod aspects;
pub mod chakras;
pub mod config;
pub mod configurations;
pub mod ephemeris;
pub mod error;
pub mod gene_keys;
pub mod houses;
pub mod human_design;
pub mod natal;
pub mod numerology;
pub mod profile;
pub mod time;
pub mod transits;
pub mod validation;
pub mod zodiac;

pub use config::BlueprintConfig;
pub use ephemeris::{source_from_config, AnalyticEphemeris, EphemerisTable, PlanetaryPositions, PositionSource};
pub use error::{BlueprintError, Result};
pub use gene_keys::GeneKeysProfile;
pub use houses::HouseSystem;
pub use human_design::HumanDesignProfile;
pub use natal::NatalChart;
pub use profile::{calculate_full_chart, calculate_profiles_from_birth_data, CalculatedChart, CosmicProfile, ProfileMeta};
pub use time::BirthData;
pub use transits::{calculate_transit_natal_aspects, cosmic_weather, CosmicWeather};
pub use validation::{format_validation_report, validate_gene_keys_profile, StoredProfile, ValidationReport};
pub use zodiac::{Planet, ZodiacSign};
