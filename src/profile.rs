//! The full calculation pipeline: birth data in, cosmic profile out.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::chakras::{calculate_alchemical_profile, calculate_chakra_activations, AlchemicalProfile, ChakraActivation};
use crate::config::BlueprintConfig;
use crate::configurations::NatalConfiguration;
use crate::ephemeris::{calculate_design_date, to_planetary_positions, PlanetaryPosition, PlanetaryPositions, PositionSource};
use crate::error::Result;
use crate::gene_keys::{calculate_gene_keys_profile, GeneKeysProfile};
use crate::human_design::{calculate_human_design_profile, to_gate_activations, HdGateActivation, HumanDesignProfile};
use crate::natal::{calculate_natal_chart, ChartAspects, ChartRulers, ElementalAnalysis, HousePosition, NatalPlacement};
use crate::numerology::{calculate_numerology_profile, NumerologyProfile};
use crate::time::{from_julian_day, iso_string, julian_day, BirthData};

pub const CALCULATION_VERSION: &str = "1.0.0";
pub const CALCULATION_SOURCE: &str = "local";
pub const PROFILE_VERSION: u32 = 2;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalculatedChart {
    pub calculated_at: String,
    pub calculation_version: String,
    pub source: String,
    pub natal_date: String,
    pub design_date: String,
    pub natal_positions: Vec<PlanetaryPosition>,
    pub design_positions: Vec<PlanetaryPosition>,
    pub natal_gates: Vec<HdGateActivation>,
    pub design_gates: Vec<HdGateActivation>,
}

/// The serializable chart plus the raw natal positions the later
/// steps build on.
struct ChartComputation {
    chart: CalculatedChart,
    natal: PlanetaryPositions,
}

fn compute_chart<S: PositionSource + ?Sized>(
    source: &S,
    config: &BlueprintConfig,
    birth: &BirthData,
    now: DateTime<Utc>,
) -> Result<ChartComputation> {
    let natal_date = birth.to_utc()?;
    let natal_jd = julian_day(&natal_date);
    let natal = PlanetaryPositions::compute(source, natal_jd)?;

    let design_jd = calculate_design_date(source, natal_jd, natal.sun(), config.design_arc_degrees)?;
    let design = PlanetaryPositions::compute(source, design_jd)?;
    let design_date = from_julian_day(design_jd)?;

    let natal_positions = to_planetary_positions(source, &natal)?;
    let design_positions = to_planetary_positions(source, &design)?;

    debug!(
        natal = %iso_string(&natal_date),
        design = %iso_string(&design_date),
        source = source.name(),
        "calculated chart moments"
    );

    let chart = CalculatedChart {
        calculated_at: iso_string(&now),
        calculation_version: CALCULATION_VERSION.to_string(),
        source: CALCULATION_SOURCE.to_string(),
        natal_date: iso_string(&natal_date),
        design_date: iso_string(&design_date),
        natal_gates: to_gate_activations(&natal_positions, true),
        design_gates: to_gate_activations(&design_positions, false),
        natal_positions,
        design_positions,
    };
    Ok(ChartComputation { chart, natal })
}

/// Natal and design positions plus their gate activations.
pub fn calculate_full_chart<S: PositionSource + ?Sized>(
    source: &S,
    config: &BlueprintConfig,
    birth: &BirthData,
) -> Result<CalculatedChart> {
    Ok(compute_chart(source, config, birth, Utc::now())?.chart)
}

// ---------------------------
// ## Cosmic profile
// ---------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileMeta {
    pub id: String,
    pub name: String,
    pub relationship: String,
    pub date_of_birth: String,
    pub created_at: String,
    pub last_viewed_at: String,
}

impl ProfileMeta {
    pub fn new(id: &str, name: &str, relationship: &str, birth: &BirthData) -> Self {
        let now = iso_string(&Utc::now());
        ProfileMeta {
            id: id.to_string(),
            name: name.to_string(),
            relationship: relationship.to_string(),
            date_of_birth: birth.date_of_birth.clone(),
            created_at: now.clone(),
            last_viewed_at: now,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CosmicProfile {
    pub profile_version: u32,
    pub meta: ProfileMeta,
    pub birth_data: BirthData,
    pub calculated_chart: CalculatedChart,
    pub gene_keys_profile: GeneKeysProfile,
    pub human_design_profile: HumanDesignProfile,
    pub numerology_profile: NumerologyProfile,
    pub chakra_activations: Vec<ChakraActivation>,
    pub alchemical_profile: AlchemicalProfile,
    pub placements: Vec<NatalPlacement>,
    pub house_positions: Vec<HousePosition>,
    pub aspects: ChartAspects,
    pub configurations: Vec<NatalConfiguration>,
    pub elemental_analysis: ElementalAnalysis,
    pub chart_rulers: ChartRulers,
}

/// Every layer of the profile for `birth`.
///
/// Human Design and Gene Keys take their Ascendant from the natal houses
/// in the configured system; placements and aspects use the same houses.
pub fn calculate_profiles_from_birth_data<S: PositionSource + ?Sized>(
    source: &S,
    config: &BlueprintConfig,
    birth: &BirthData,
    meta: ProfileMeta,
) -> Result<CosmicProfile> {
    let ChartComputation { chart, natal } = compute_chart(source, config, birth, Utc::now())?;

    let natal_chart = calculate_natal_chart(
        source,
        &meta.id,
        &natal,
        birth.latitude,
        birth.longitude,
        config.house_system,
    )?;
    let ascendant = natal_chart.houses.ascendant;
    let human_design_profile =
        calculate_human_design_profile(&chart.natal_positions, &chart.design_positions, ascendant)?;
    let gene_keys_profile = calculate_gene_keys_profile(&chart.natal_positions, &chart.design_positions, ascendant)?;
    let numerology_profile = calculate_numerology_profile(birth.date()?);
    let chakra_activations = calculate_chakra_activations(&natal_chart.placements);
    let alchemical_profile = calculate_alchemical_profile(&chakra_activations);

    info!(
        profile = %meta.id,
        hd_type = human_design_profile.hd_type.name(),
        life_path = numerology_profile.life_path_number,
        "profile calculated"
    );

    Ok(CosmicProfile {
        profile_version: PROFILE_VERSION,
        meta,
        birth_data: birth.clone(),
        calculated_chart: chart,
        gene_keys_profile,
        human_design_profile,
        numerology_profile,
        chakra_activations,
        alchemical_profile,
        placements: natal_chart.placements,
        house_positions: natal_chart.house_positions,
        aspects: natal_chart.aspects,
        configurations: natal_chart.configurations,
        elemental_analysis: natal_chart.elemental_analysis,
        chart_rulers: natal_chart.chart_rulers,
    })
}
