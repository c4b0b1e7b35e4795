use std::path::{Path, PathBuf};
use std::process::ExitCode;

use chrono::{NaiveDate, NaiveTime, Utc};
use cosmic_blueprint::{
    calculate_profiles_from_birth_data, calculate_transit_natal_aspects, cosmic_weather, format_validation_report,
    source_from_config, validate_gene_keys_profile, BirthData, BlueprintConfig, BlueprintError, CosmicProfile, CosmicWeather,
    EphemerisTable, ProfileMeta, Result, StoredProfile,
};
use cosmic_blueprint::time::parse_timezone;
use cosmic_blueprint::transits::{major_aspect_days, top_transit_aspects, TransitNatalAspect};
use serde::Serialize;
use tracing_subscriber::EnvFilter;

const LOG_ENV: &str = "BLUEPRINT_LOG";
const TOP_TRANSITS: usize = 10;

const USAGE: &str = "usage: cosmic_blueprint [--config <file>] <command>

commands:
  profile <birth.json> [name]                 cosmic profile for saved birth data
  chart <date> <time> <timezone> <lat> <lon>  cosmic profile from arguments
  transits [YYYY-MM-DD] [--natal <profile.json>]
                                              sky at noon UTC, optionally against a natal chart
  calendar <year> <month> [timezone]          major aspect days of a month
  ephemeris-table <start> <end> <out>         pre-compute daily positions
  validate <profile.json>                     check stored Gene Keys spheres";

fn init_tracing() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn usage() -> BlueprintError {
    BlueprintError::InvalidInput(USAGE.to_string())
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn parse_date(value: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map_err(|e| BlueprintError::InvalidInput(format!("date '{}': {}", value, e)))
}

fn parse_number<T: std::str::FromStr>(value: &str, what: &str) -> Result<T> {
    value
        .parse()
        .map_err(|_| BlueprintError::InvalidInput(format!("{} '{}' is not a number", what, value)))
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
    let content = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&content)?)
}

fn profile_for(config: &BlueprintConfig, birth: &BirthData, name: &str) -> Result<CosmicProfile> {
    let source = source_from_config(config)?;
    let meta = ProfileMeta::new("profile", name, "self", birth);
    calculate_profiles_from_birth_data(&source, config, birth, meta)
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct TransitReport {
    weather: CosmicWeather,
    #[serde(skip_serializing_if = "Option::is_none")]
    natal_aspects: Option<Vec<TransitNatalAspect>>,
}

fn run(args: Vec<String>) -> Result<()> {
    let mut config_path: Option<PathBuf> = None;
    let mut rest: Vec<String> = Vec::new();
    let mut iter = args.into_iter();
    while let Some(arg) = iter.next() {
        if arg == "--config" {
            config_path = Some(iter.next().map(PathBuf::from).ok_or_else(usage)?);
        } else {
            rest.push(arg);
        }
    }
    let config = BlueprintConfig::load(config_path.as_deref())?;
    tracing::debug!(?config, "configuration");

    let command = rest.first().map(String::as_str).ok_or_else(usage)?;
    let params = &rest[1..];
    match (command, params) {
        ("profile", [path, name @ ..]) => {
            let birth: BirthData = read_json(Path::new(path))?;
            let name = name.first().map(String::as_str).unwrap_or("");
            print_json(&profile_for(&config, &birth, name)?)
        }
        ("chart", [date, time, timezone, lat, lon]) => {
            let birth = BirthData::new(
                date,
                time,
                timezone,
                parse_number(lat, "latitude")?,
                parse_number(lon, "longitude")?,
            );
            print_json(&profile_for(&config, &birth, "")?)
        }
        ("transits", params) => {
            let mut date = None;
            let mut natal_path = None;
            let mut params = params.iter();
            while let Some(param) = params.next() {
                if param == "--natal" {
                    natal_path = Some(params.next().ok_or_else(usage)?);
                } else {
                    date = Some(parse_date(param)?);
                }
            }
            let instant = match date {
                Some(date) => date.and_time(NaiveTime::from_hms_opt(12, 0, 0).ok_or_else(usage)?).and_utc(),
                None => Utc::now(),
            };
            let source = source_from_config(&config)?;
            let weather = cosmic_weather(&source, instant)?;
            let natal_aspects = match natal_path {
                Some(path) => {
                    let natal: CosmicProfile = read_json(Path::new(path))?;
                    let aspects = calculate_transit_natal_aspects(&source, instant, &natal.placements)?;
                    Some(top_transit_aspects(&aspects, TOP_TRANSITS))
                }
                None => None,
            };
            print_json(&TransitReport { weather, natal_aspects })
        }
        ("calendar", [year, month, zone @ ..]) => {
            let tz = parse_timezone(zone.first().map(String::as_str).unwrap_or("UTC"))?;
            let source = source_from_config(&config)?;
            let days = major_aspect_days(&source, parse_number(year, "year")?, parse_number(month, "month")?, tz)?;
            print_json(&days)
        }
        ("ephemeris-table", [start, end, out]) => {
            let table = EphemerisTable::generate(parse_date(start)?, parse_date(end)?)?;
            table.save(Path::new(out))?;
            tracing::info!(days = table.len(), path = %out, "ephemeris table written");
            Ok(())
        }
        ("validate", [path]) => {
            let content = std::fs::read_to_string(path)?;
            let stored = StoredProfile::from_json(&content)?;
            let source = source_from_config(&config)?;
            let report = validate_gene_keys_profile(&source, &config, &stored)?;
            print!("{}", format_validation_report(&report));
            if report.validation_passed {
                Ok(())
            } else {
                Err(BlueprintError::InvalidInput(format!(
                    "{} of {} spheres differ",
                    report.mismatching_spheres, report.total_spheres
                )))
            }
        }
        _ => Err(usage()),
    }
}

fn main() -> ExitCode {
    init_tracing();
    match run(std::env::args().skip(1).collect()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{}", err);
            ExitCode::FAILURE
        }
    }
}

