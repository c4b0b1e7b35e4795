//! Re-derives Gene Keys spheres from a stored profile's birth data and
//! compares them with the values the profile carries.

use std::collections::BTreeMap;
use std::fmt::Write as _;

use chrono::DateTime;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use crate::config::BlueprintConfig;
use crate::ephemeris::{PlanetaryPosition, PositionSource};
use crate::error::{BlueprintError, Result};
use crate::gene_keys::{ChartSide, GeneKeysProfile, Sphere};
use crate::human_design::gate_at;
use crate::profile::{calculate_profiles_from_birth_data, ProfileMeta};
use crate::time::BirthData;
use crate::zodiac::ZodiacSign;

const RULE_WIDTH: usize = 60;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoredMeta {
    #[serde(default)]
    name: String,
}

/// The parts of a saved profile that validation reads. Unknown fields are
/// ignored so any saved profile shape with `birthData` loads.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredProfile {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    meta: Option<StoredMeta>,
    pub birth_data: BirthData,
    #[serde(default)]
    pub gene_keys_profile: BTreeMap<String, Value>,
}

impl StoredProfile {
    pub fn from_json(content: &str) -> Result<Self> {
        Ok(serde_json::from_str(content)?)
    }

    pub fn name(&self) -> &str {
        self.name
            .as_deref()
            .or_else(|| self.meta.as_ref().map(|m| m.name.as_str()))
            .unwrap_or("")
    }

    /// Stored key and line for a sphere. A sphere without a key number
    /// counts as absent; a missing line reads as 0.
    pub fn stored_sphere(&self, sphere: Sphere) -> Option<GeneKeyValue> {
        #[derive(Deserialize)]
        #[serde(rename_all = "camelCase")]
        struct StoredSphere {
            #[serde(default)]
            gene_key_number: Option<u8>,
            #[serde(default)]
            line: Option<u8>,
        }

        let value = self.gene_keys_profile.get(sphere.key())?;
        let stored: StoredSphere = serde_json::from_value(value.clone()).ok()?;
        Some(GeneKeyValue {
            gene_key_number: stored.gene_key_number?,
            line: stored.line.unwrap_or(0),
        })
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneKeyValue {
    pub gene_key_number: u8,
    pub line: u8,
}

impl std::fmt::Display for GeneKeyValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "GK-{}.{}", self.gene_key_number, self.line)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SphereValidation {
    pub sphere_name: String,
    pub sphere_id: String,
    pub planetary_source: String,
    pub is_design: bool,
    pub calculated: GeneKeyValue,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stored: Option<GeneKeyValue>,
    #[serde(rename = "match")]
    pub matches: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub discrepancy: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationReport {
    pub profile_name: String,
    pub birth_data: BirthData,
    pub natal_date: String,
    pub design_date: String,
    pub design_days_before_birth: i64,
    pub natal_positions: Vec<PlanetaryPosition>,
    pub design_positions: Vec<PlanetaryPosition>,
    pub sphere_validations: Vec<SphereValidation>,
    pub total_spheres: usize,
    pub matching_spheres: usize,
    pub mismatching_spheres: usize,
    pub validation_passed: bool,
}

fn short_source(sphere: Sphere) -> String {
    let (side, planet) = sphere.source();
    match side {
        ChartSide::Natal => format!("Natal {}", planet.name()),
        ChartSide::Design => format!("Design {}", planet.name()),
    }
}

/// One entry per sphere. A sphere matches only when a stored value
/// exists and both key and line agree.
pub fn compare_spheres(calculated: &GeneKeysProfile, stored: &StoredProfile) -> Vec<SphereValidation> {
    Sphere::ALL
        .iter()
        .map(|sphere| {
            let current = calculated.sphere(*sphere);
            let calculated = GeneKeyValue {
                gene_key_number: current.gene_key_number,
                line: current.line,
            };
            let stored = stored.stored_sphere(*sphere);
            let matches = stored == Some(calculated);
            let discrepancy = match stored {
                None => Some("No stored value".to_string()),
                Some(value) if !matches => Some(format!("Expected {}, stored {}", calculated, value)),
                Some(_) => None,
            };
            SphereValidation {
                sphere_name: sphere.name().to_string(),
                sphere_id: sphere.key().to_string(),
                planetary_source: short_source(*sphere),
                is_design: sphere.source().0 == ChartSide::Design,
                calculated,
                stored,
                matches,
                discrepancy,
            }
        })
        .collect()
}

fn days_between(natal: &str, design: &str) -> Result<i64> {
    let parse = |s: &str| {
        DateTime::parse_from_rfc3339(s)
            .map_err(|e| BlueprintError::InvalidInput(format!("timestamp {}: {}", s, e)))
    };
    let seconds = parse(natal)?.signed_duration_since(parse(design)?).num_seconds();
    Ok((seconds as f64 / 86_400.0).round() as i64)
}

/// Recalculates the chart for the stored birth data with the local
/// timezone applied, then checks every Gene Keys sphere.
pub fn validate_gene_keys_profile<S: PositionSource + ?Sized>(
    source: &S,
    config: &BlueprintConfig,
    stored: &StoredProfile,
) -> Result<ValidationReport> {
    let meta = ProfileMeta::new("validation", stored.name(), "", &stored.birth_data);
    let profile = calculate_profiles_from_birth_data(source, config, &stored.birth_data, meta)?;
    let chart = profile.calculated_chart;

    let sphere_validations = compare_spheres(&profile.gene_keys_profile, stored);
    let matching_spheres = sphere_validations.iter().filter(|s| s.matches).count();
    let mismatching_spheres = sphere_validations.len() - matching_spheres;

    if mismatching_spheres > 0 {
        warn!(profile = stored.name(), mismatching_spheres, "gene keys validation failed");
    } else {
        debug!(profile = stored.name(), "gene keys validation passed");
    }

    Ok(ValidationReport {
        profile_name: stored.name().to_string(),
        birth_data: stored.birth_data.clone(),
        design_days_before_birth: days_between(&chart.natal_date, &chart.design_date)?,
        natal_date: chart.natal_date,
        design_date: chart.design_date,
        natal_positions: chart.natal_positions,
        design_positions: chart.design_positions,
        total_spheres: sphere_validations.len(),
        sphere_validations,
        matching_spheres,
        mismatching_spheres,
        validation_passed: mismatching_spheres == 0,
    })
}

// ---------------------------
// ## Report text
// ---------------------------

fn position_line(out: &mut String, position: &PlanetaryPosition) {
    let sign = ZodiacSign::from_id(&position.sign_id).map_or(position.sign_id.as_str(), |s| s.name());
    let zodiac = format!("{} {}°{}'", sign, position.degree, position.minute);
    let gate = gate_at(position.longitude);
    let _ = writeln!(
        out,
        "  {:<10} {:<20} Gate {}.{}",
        position.planet_id, zodiac, gate.gate, gate.line
    );
}

fn heading(out: &mut String, rule: char, title: &str) {
    let line = rule.to_string().repeat(RULE_WIDTH);
    let _ = writeln!(out, "{}", line);
    let _ = writeln!(out, "{}", title);
    let _ = writeln!(out, "{}", line);
}

pub fn format_validation_report(report: &ValidationReport) -> String {
    let mut out = String::new();
    let birth = &report.birth_data;

    heading(&mut out, '=', "PROFILE VALIDATION REPORT");
    out.push('\n');
    let _ = writeln!(out, "Profile: {}", report.profile_name);
    let _ = writeln!(out, "Birth Date: {} {}", birth.date_of_birth, birth.time_of_birth);
    let _ = writeln!(out, "Location: {}", birth.city_of_birth);
    let _ = writeln!(out, "Timezone: {}", birth.timezone);
    let _ = writeln!(out, "Coordinates: {}, {}", birth.latitude, birth.longitude);
    out.push('\n');
    let _ = writeln!(out, "Natal Date (UTC): {}", report.natal_date);
    let _ = writeln!(out, "Design Date (UTC): {}", report.design_date);
    let _ = writeln!(out, "Design Days Before Birth: {}", report.design_days_before_birth);
    out.push('\n');

    heading(&mut out, '-', "NATAL PLANETARY POSITIONS");
    for position in &report.natal_positions {
        position_line(&mut out, position);
    }
    out.push('\n');

    heading(&mut out, '-', "DESIGN PLANETARY POSITIONS");
    for position in &report.design_positions {
        position_line(&mut out, position);
    }
    out.push('\n');

    heading(&mut out, '-', "GENE KEYS SPHERE VALIDATION");
    for sphere in &report.sphere_validations {
        let status = if sphere.matches { '✓' } else { '✗' };
        let stored = sphere.stored.map_or("N/A".to_string(), |s| s.to_string());
        let _ = writeln!(out, "  {} {:<15} ({:<15})", status, sphere.sphere_name, sphere.planetary_source);
        let _ = writeln!(
            out,
            "      Calculated: {:<10} Stored: {}",
            sphere.calculated.to_string(),
            stored
        );
        if let Some(discrepancy) = &sphere.discrepancy {
            let _ = writeln!(out, "      ⚠ {}", discrepancy);
        }
    }
    out.push('\n');

    heading(&mut out, '=', "SUMMARY");
    let _ = writeln!(out, "Total Spheres: {}", report.total_spheres);
    let _ = writeln!(out, "Matching: {}", report.matching_spheres);
    let _ = writeln!(out, "Mismatching: {}", report.mismatching_spheres);
    let verdict = if report.validation_passed { "PASSED ✓" } else { "FAILED ✗" };
    let _ = writeln!(out, "Validation: {}", verdict);
    out
}
