use std::io::Write;
use std::path::Path;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;

use blueprint_ephemeris::{calc_ut, normalize_degrees, Body, BodyResult};

use crate::config::BlueprintConfig;
use crate::error::{BlueprintError, Result};
use crate::time::{julian_day, julian_day_for_date};
use crate::zodiac::{earth_longitude, signed_difference, Planet, SignPosition, HD_BODIES};

// ---------------------------
// ## Position sources
// ---------------------------

/// Anything that can answer "where was this body at this Julian Day".
pub trait PositionSource {
    fn position(&self, jd: f64, body: Body) -> Result<BodyResult>;

    fn name(&self) -> &'static str;

    fn longitude(&self, jd: f64, body: Body) -> Result<f64> {
        Ok(self.position(jd, body)?.longitude)
    }
}

/// Computes every position on demand through `blueprint_ephemeris`.
#[derive(Debug, Default, Copy, Clone)]
pub struct AnalyticEphemeris;

impl PositionSource for AnalyticEphemeris {
    fn position(&self, jd: f64, body: Body) -> Result<BodyResult> {
        Ok(calc_ut(jd, body)?)
    }

    fn name(&self) -> &'static str {
        "analytic"
    }
}

impl<S: PositionSource + ?Sized> PositionSource for Box<S> {
    fn position(&self, jd: f64, body: Body) -> Result<BodyResult> {
        (**self).position(jd, body)
    }

    fn name(&self) -> &'static str {
        (**self).name()
    }
}

/// Pick the source the configuration asks for. A configured table that does
/// not exist yet is not an error; positions are then computed analytically.
pub fn source_from_config(config: &BlueprintConfig) -> Result<Box<dyn PositionSource>> {
    match &config.ephemeris_table {
        Some(path) if path.exists() => {
            let table = EphemerisTable::load(path)?;
            tracing::info!(
                path = %path.display(),
                days = table.len(),
                "using pre-computed ephemeris table"
            );
            Ok(Box::new(table))
        }
        Some(path) => {
            tracing::warn!(
                path = %path.display(),
                "ephemeris table not found, falling back to analytic positions"
            );
            Ok(Box::new(AnalyticEphemeris))
        }
        None => Ok(Box::new(AnalyticEphemeris)),
    }
}

// ---------------------------
// ## Pre-computed table
// ---------------------------

const TABLE_MAGIC: [u8; 4] = *b"CBET";
const TABLE_VERSION: u32 = 1;
const TABLE_STEP_DAYS: f64 = 1.0;

#[derive(Debug, Clone, Serialize, Deserialize)]
struct TableFile {
    magic: [u8; 4],
    version: u32,
    start_jd: f64,
    step_days: f64,
    /// One row per day, each row in `Body::ALL` order.
    rows: Vec<Vec<BodyResult>>,
}

/// Daily positions for a fixed date range, stored with bincode.
///
/// Lookups inside the range interpolate linearly between the two bracketing
/// samples, unwrapping longitudes across 0°/360°. Lookups outside the range
/// are answered by the analytic ephemeris.
#[derive(Debug, Clone)]
pub struct EphemerisTable {
    start_jd: f64,
    step_days: f64,
    rows: Vec<Vec<BodyResult>>,
    fallback: AnalyticEphemeris,
}

impl EphemerisTable {
    /// Sample every body at 00:00 UTC for each day in `start..=end`.
    pub fn generate(start: NaiveDate, end: NaiveDate) -> Result<Self> {
        if end < start {
            return Err(BlueprintError::Table(format!(
                "end date {} precedes start date {}",
                end, start
            )));
        }
        let start_jd = julian_day_for_date(start);
        let days = (end - start).num_days() as usize + 1;
        tracing::info!(%start, %end, days, "generating ephemeris table");

        let mut rows = Vec::with_capacity(days);
        for day in 0..days {
            let jd = start_jd + day as f64 * TABLE_STEP_DAYS;
            let row = Body::iter()
                .map(|body| calc_ut(jd, body))
                .collect::<std::result::Result<Vec<_>, _>>()?;
            rows.push(row);
        }

        Ok(EphemerisTable {
            start_jd,
            step_days: TABLE_STEP_DAYS,
            rows,
            fallback: AnalyticEphemeris,
        })
    }

    /// Write the table atomically: encode into a temporary file next to
    /// `path`, then rename over it.
    pub fn save(&self, path: &Path) -> Result<()> {
        let file = TableFile {
            magic: TABLE_MAGIC,
            version: TABLE_VERSION,
            start_jd: self.start_jd,
            step_days: self.step_days,
            rows: self.rows.clone(),
        };
        let encoded = bincode::serialize(&file)?;

        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        let mut temp_file = NamedTempFile::new_in(dir)?;
        temp_file.write_all(&encoded)?;
        temp_file.flush()?;
        temp_file.persist(path).map_err(|e| BlueprintError::Io(e.error))?;

        tracing::info!(path = %path.display(), bytes = encoded.len(), "ephemeris table written");
        Ok(())
    }

    pub fn load(path: &Path) -> Result<Self> {
        let bytes = std::fs::read(path)?;
        Self::from_bytes(&bytes)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let file: TableFile = bincode::deserialize(bytes)?;
        if file.magic != TABLE_MAGIC {
            return Err(BlueprintError::Table("not an ephemeris table".to_string()));
        }
        if file.version != TABLE_VERSION {
            return Err(BlueprintError::Table(format!(
                "unsupported table version {}",
                file.version
            )));
        }
        if file.rows.is_empty() || !(file.step_days > 0.0) {
            return Err(BlueprintError::Table("table has no samples".to_string()));
        }
        if let Some(bad) = file.rows.iter().position(|row| row.len() != Body::ALL.len()) {
            return Err(BlueprintError::Table(format!("row {} is truncated", bad)));
        }
        Ok(EphemerisTable {
            start_jd: file.start_jd,
            step_days: file.step_days,
            rows: file.rows,
            fallback: AnalyticEphemeris,
        })
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn start_jd(&self) -> f64 {
        self.start_jd
    }

    pub fn end_jd(&self) -> f64 {
        self.start_jd + (self.rows.len().saturating_sub(1)) as f64 * self.step_days
    }

    pub fn covers(&self, jd: f64) -> bool {
        jd >= self.start_jd && jd <= self.end_jd()
    }

    fn interpolate(&self, jd: f64, body: Body) -> Option<BodyResult> {
        let column = Body::ALL.iter().position(|b| *b == body)?;
        let offset = (jd - self.start_jd) / self.step_days;
        let index = offset.floor() as usize;
        let fraction = offset - index as f64;

        let before = self.rows.get(index)?.get(column)?;
        let after = match self.rows.get(index + 1) {
            Some(row) => row.get(column)?,
            None => return Some(*before),
        };

        let delta = signed_difference(after.longitude, before.longitude);
        Some(BodyResult {
            longitude: normalize_degrees(before.longitude + delta * fraction),
            latitude: before.latitude + (after.latitude - before.latitude) * fraction,
            distance: before.distance + (after.distance - before.distance) * fraction,
        })
    }
}

impl PositionSource for EphemerisTable {
    fn position(&self, jd: f64, body: Body) -> Result<BodyResult> {
        if jd.is_finite() && self.covers(jd) {
            if let Some(result) = self.interpolate(jd, body) {
                return Ok(result);
            }
        }
        tracing::trace!(jd, %body, "outside ephemeris table range");
        self.fallback.position(jd, body)
    }

    fn name(&self) -> &'static str {
        "table"
    }
}

// ---------------------------
// ## Planetary positions
// ---------------------------

/// Longitudes (and latitudes) of the thirteen Human Design bodies at one instant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanetaryPositions {
    pub julian_day: f64,
    longitudes: [f64; 13],
    latitudes: [f64; 13],
}

impl PlanetaryPositions {
    pub fn compute<S: PositionSource + ?Sized>(source: &S, jd: f64) -> Result<Self> {
        let mut longitudes = [0.0; 13];
        let mut latitudes = [0.0; 13];
        for (slot, planet) in HD_BODIES.iter().enumerate() {
            if let Some(body) = planet.body() {
                let result = source.position(jd, body)?;
                longitudes[slot] = result.longitude;
                latitudes[slot] = result.latitude;
            }
        }
        // Earth sits opposite the Sun on the ecliptic
        longitudes[1] = earth_longitude(longitudes[0]);
        Ok(PlanetaryPositions {
            julian_day: jd,
            longitudes,
            latitudes,
        })
    }

    pub fn at<S: PositionSource + ?Sized>(source: &S, instant: &DateTime<Utc>) -> Result<Self> {
        Self::compute(source, julian_day(instant))
    }

    fn slot(planet: Planet) -> Option<usize> {
        HD_BODIES.iter().position(|p| *p == planet)
    }

    pub fn longitude(&self, planet: Planet) -> Option<f64> {
        Self::slot(planet).map(|slot| self.longitudes[slot])
    }

    pub fn latitude(&self, planet: Planet) -> Option<f64> {
        Self::slot(planet).map(|slot| self.latitudes[slot])
    }

    pub fn sun(&self) -> f64 {
        self.longitudes[0]
    }

    pub fn moon(&self) -> f64 {
        self.longitudes[2]
    }

    /// `(planet, longitude)` in Human Design activation order.
    pub fn iter(&self) -> impl Iterator<Item = (Planet, f64)> + '_ {
        HD_BODIES.iter().copied().zip(self.longitudes.iter().copied())
    }
}

/// A single body's place in the zodiac, as stored in a calculated chart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanetaryPosition {
    pub planet_id: String,
    pub longitude: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latitude: Option<f64>,
    pub sign_id: String,
    pub degree: u32,
    pub minute: u32,
    pub retrograde: bool,
}

impl PlanetaryPosition {
    pub fn new(planet: Planet, longitude: f64, latitude: Option<f64>, retrograde: bool) -> Self {
        let sign_position = SignPosition::from_longitude(longitude);
        PlanetaryPosition {
            planet_id: planet.id().to_string(),
            longitude: normalize_degrees(longitude),
            latitude,
            sign_id: sign_position.sign.id().to_string(),
            degree: sign_position.degree,
            minute: sign_position.minute,
            retrograde,
        }
    }

    pub fn planet(&self) -> Option<Planet> {
        Planet::from_id(&self.planet_id)
    }
}

/// Chart positions for all thirteen bodies, retrograde flags included.
pub fn to_planetary_positions<S: PositionSource + ?Sized>(
    source: &S,
    positions: &PlanetaryPositions,
) -> Result<Vec<PlanetaryPosition>> {
    positions
        .iter()
        .map(|(planet, longitude)| {
            let retrograde = is_retrograde(source, planet, positions.julian_day)?;
            let latitude = match planet {
                Planet::Earth => None,
                other => positions.latitude(other),
            };
            Ok(PlanetaryPosition::new(planet, longitude, latitude, retrograde))
        })
        .collect()
}

pub fn find_position(positions: &[PlanetaryPosition], planet: Planet) -> Option<&PlanetaryPosition> {
    positions.iter().find(|p| p.planet_id == planet.id())
}

// ---------------------------
// ## Motion
// ---------------------------

/// Apparent backward motion over the preceding day.
pub fn is_retrograde<S: PositionSource + ?Sized>(source: &S, planet: Planet, jd: f64) -> Result<bool> {
    if !planet.can_retrograde() {
        return Ok(false);
    }
    let body = match planet.body() {
        Some(body) => body,
        None => return Ok(false),
    };
    let today = source.longitude(jd, body)?;
    let yesterday = source.longitude(jd - 1.0, body)?;
    Ok(signed_difference(today, yesterday) < 0.0)
}

const DESIGN_SEARCH_EARLIEST_DAYS: f64 = 100.0;
const DESIGN_SEARCH_LATEST_DAYS: f64 = 80.0;
const DESIGN_SEARCH_ITERATIONS: usize = 20;
const DESIGN_SEARCH_TOLERANCE: f64 = 0.001;

/// Julian Day when the Sun stood `arc_degrees` behind its birth longitude.
///
/// Bisects between 100 and 80 days before birth; the Sun only moves
/// forward, so the sign of the wrapped difference picks the half.
pub fn calculate_design_date<S: PositionSource + ?Sized>(
    source: &S,
    birth_jd: f64,
    birth_sun_longitude: f64,
    arc_degrees: f64,
) -> Result<f64> {
    let target = normalize_degrees(birth_sun_longitude - arc_degrees);
    let mut low = birth_jd - DESIGN_SEARCH_EARLIEST_DAYS;
    let mut high = birth_jd - DESIGN_SEARCH_LATEST_DAYS;

    for _ in 0..DESIGN_SEARCH_ITERATIONS {
        let mid = (low + high) / 2.0;
        let sun = source.longitude(mid, Body::Sun)?;
        let diff = signed_difference(target, sun);
        if diff.abs() < DESIGN_SEARCH_TOLERANCE {
            return Ok(mid);
        }
        if diff > 0.0 {
            low = mid;
        } else {
            high = mid;
        }
    }

    Ok((low + high) / 2.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use blueprint_ephemeris::{julday, J2000};
    use crate::zodiac::angular_distance;

    #[test]
    fn test_positions_include_earth_opposite_sun() {
        let positions = PlanetaryPositions::compute(&AnalyticEphemeris, J2000).unwrap();
        let sun = positions.sun();
        let earth = positions.longitude(Planet::Earth).unwrap();
        assert_relative_eq!(angular_distance(sun, earth), 180.0, epsilon = 1e-9);
        assert_eq!(positions.iter().count(), 13);
        assert!(positions.longitude(Planet::Ascendant).is_none());
    }

    #[test]
    fn test_sun_at_j2000_in_capricorn() {
        let positions = PlanetaryPositions::compute(&AnalyticEphemeris, J2000).unwrap();
        assert_relative_eq!(positions.sun(), 280.37, epsilon = 0.1);
    }

    #[test]
    fn test_sun_and_moon_never_retrograde() {
        for offset in [0.0, 100.0, 200.0, 300.0] {
            let jd = J2000 + offset;
            assert!(!is_retrograde(&AnalyticEphemeris, Planet::Sun, jd).unwrap());
            assert!(!is_retrograde(&AnalyticEphemeris, Planet::Moon, jd).unwrap());
            assert!(!is_retrograde(&AnalyticEphemeris, Planet::Earth, jd).unwrap());
        }
    }

    #[test]
    fn test_mercury_retrograde_station() {
        // Mercury was retrograde 2023-08-23 .. 2023-09-15
        let inside = julday(2023, 9, 1, 12.0).unwrap();
        let outside = julday(2023, 10, 15, 12.0).unwrap();
        assert!(is_retrograde(&AnalyticEphemeris, Planet::Mercury, inside).unwrap());
        assert!(!is_retrograde(&AnalyticEphemeris, Planet::Mercury, outside).unwrap());
    }

    #[test]
    fn test_design_date_is_88_solar_degrees_back() {
        let birth_jd = julday(1994, 10, 18, 10.0).unwrap();
        let sun = AnalyticEphemeris.longitude(birth_jd, Body::Sun).unwrap();
        let design_jd = calculate_design_date(&AnalyticEphemeris, birth_jd, sun, 88.0).unwrap();
        let design_sun = AnalyticEphemeris.longitude(design_jd, Body::Sun).unwrap();

        assert_relative_eq!(angular_distance(sun, design_sun), 88.0, epsilon = 0.01);
        let days_before = birth_jd - design_jd;
        assert!(days_before > 85.0 && days_before < 93.0, "{} days", days_before);
    }

    #[test]
    fn test_design_date_across_aries_point() {
        // Sun near 20° Aries; the design Sun sits in late Capricorn
        let birth_jd = julday(2001, 4, 10, 0.0).unwrap();
        let sun = AnalyticEphemeris.longitude(birth_jd, Body::Sun).unwrap();
        let design_jd = calculate_design_date(&AnalyticEphemeris, birth_jd, sun, 88.0).unwrap();
        let design_sun = AnalyticEphemeris.longitude(design_jd, Body::Sun).unwrap();
        assert_relative_eq!(
            design_sun,
            normalize_degrees(sun - 88.0),
            epsilon = 0.01
        );
    }

    #[test]
    fn test_table_interpolates_close_to_analytic() {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let end = NaiveDate::from_ymd_opt(2024, 1, 31).unwrap();
        let table = EphemerisTable::generate(start, end).unwrap();
        assert_eq!(table.len(), 31);

        let jd = julian_day_for_date(start) + 10.4;
        for body in Body::iter() {
            let expected = AnalyticEphemeris.longitude(jd, body).unwrap();
            let actual = table.longitude(jd, body).unwrap();
            assert!(
                angular_distance(expected, actual) < 0.05,
                "{} table {} analytic {}",
                body,
                actual,
                expected
            );
        }
    }

    #[test]
    fn test_table_interpolation_wraps_through_aries() {
        // The Sun crosses 0° around 2024-03-20
        let start = NaiveDate::from_ymd_opt(2024, 3, 15).unwrap();
        let end = NaiveDate::from_ymd_opt(2024, 3, 25).unwrap();
        let table = EphemerisTable::generate(start, end).unwrap();
        for step in 0..40 {
            let jd = table.start_jd() + step as f64 * 0.25;
            let sun = table.longitude(jd, Body::Sun).unwrap();
            let expected = AnalyticEphemeris.longitude(jd, Body::Sun).unwrap();
            assert!(angular_distance(sun, expected) < 0.01);
        }
    }

    #[test]
    fn test_table_falls_back_outside_range() {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let end = NaiveDate::from_ymd_opt(2024, 1, 3).unwrap();
        let table = EphemerisTable::generate(start, end).unwrap();
        assert!(!table.covers(J2000));
        let expected = AnalyticEphemeris.longitude(J2000, Body::Mars).unwrap();
        assert_relative_eq!(table.longitude(J2000, Body::Mars).unwrap(), expected);
    }

    #[test]
    fn test_table_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("table.bin");
        let start = NaiveDate::from_ymd_opt(2030, 6, 1).unwrap();
        let end = NaiveDate::from_ymd_opt(2030, 6, 10).unwrap();
        let table = EphemerisTable::generate(start, end).unwrap();
        table.save(&path).unwrap();

        let loaded = EphemerisTable::load(&path).unwrap();
        assert_eq!(loaded.len(), 10);
        assert_relative_eq!(loaded.start_jd(), table.start_jd());
        let jd = table.start_jd() + 3.5;
        assert_relative_eq!(
            loaded.longitude(jd, Body::Venus).unwrap(),
            table.longitude(jd, Body::Venus).unwrap()
        );
    }

    #[test]
    fn test_table_rejects_garbage() {
        assert!(EphemerisTable::from_bytes(b"definitely not a table").is_err());
    }

    #[test]
    fn test_table_rejects_reversed_range() {
        let start = NaiveDate::from_ymd_opt(2030, 6, 10).unwrap();
        let end = NaiveDate::from_ymd_opt(2030, 6, 1).unwrap();
        assert!(matches!(
            EphemerisTable::generate(start, end),
            Err(BlueprintError::Table(_))
        ));
    }

    #[test]
    fn test_missing_table_falls_back_to_analytic() {
        let config = BlueprintConfig {
            ephemeris_table: Some("/nonexistent/blueprint/table.bin".into()),
            ..BlueprintConfig::default()
        };
        let source = source_from_config(&config).unwrap();
        assert_eq!(source.name(), "analytic");
    }

    #[test]
    fn test_chart_positions_carry_sign_and_retrograde() {
        let positions = PlanetaryPositions::compute(&AnalyticEphemeris, J2000).unwrap();
        let chart = to_planetary_positions(&AnalyticEphemeris, &positions).unwrap();
        assert_eq!(chart.len(), 13);
        let sun = find_position(&chart, Planet::Sun).unwrap();
        assert_eq!(sun.sign_id, "capricorn");
        assert_eq!(sun.degree, 10);
        assert!(!sun.retrograde);
        let earth = find_position(&chart, Planet::Earth).unwrap();
        assert_eq!(earth.sign_id, "cancer");
        assert!(earth.latitude.is_none());
    }
}
