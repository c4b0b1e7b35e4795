use std::str::FromStr;

use chrono::offset::LocalResult;
use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::error::{BlueprintError, Result};

/// Julian Day of the Unix epoch, 1970-01-01T00:00:00Z.
pub const UNIX_EPOCH_JD: f64 = 2_440_587.5;

const MILLIS_PER_DAY: f64 = 86_400_000.0;

// ---------------------------
// ## Birth data
// ---------------------------

/// Immutable birth input: local civil date and time plus where it happened.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BirthData {
    /// `YYYY-MM-DD`
    pub date_of_birth: String,
    /// `HH:MM` (24h), seconds optional
    pub time_of_birth: String,
    /// IANA zone name, e.g. `America/Sao_Paulo`
    pub timezone: String,
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default)]
    pub city_of_birth: String,
}

impl BirthData {
    pub fn new(
        date_of_birth: &str,
        time_of_birth: &str,
        timezone: &str,
        latitude: f64,
        longitude: f64,
    ) -> Self {
        BirthData {
            date_of_birth: date_of_birth.to_string(),
            time_of_birth: time_of_birth.to_string(),
            timezone: timezone.to_string(),
            latitude,
            longitude,
            city_of_birth: String::new(),
        }
    }

    pub fn with_city(mut self, city: &str) -> Self {
        self.city_of_birth = city.to_string();
        self
    }

    pub fn date(&self) -> Result<NaiveDate> {
        let date = NaiveDate::parse_from_str(self.date_of_birth.trim(), "%Y-%m-%d").map_err(|e| {
            BlueprintError::InvalidBirthData(format!(
                "date '{}' is not YYYY-MM-DD: {}",
                self.date_of_birth, e
            ))
        })?;
        if !(1..=9999).contains(&date.year()) {
            return Err(BlueprintError::InvalidBirthData(format!(
                "year {} outside 1..=9999",
                date.year()
            )));
        }
        Ok(date)
    }

    pub fn time(&self) -> Result<NaiveTime> {
        let raw = self.time_of_birth.trim();
        NaiveTime::parse_from_str(raw, "%H:%M")
            .or_else(|_| NaiveTime::parse_from_str(raw, "%H:%M:%S"))
            .map_err(|e| {
                BlueprintError::InvalidBirthData(format!("time '{}' is not HH:MM: {}", raw, e))
            })
    }

    pub fn tz(&self) -> Result<Tz> {
        parse_timezone(&self.timezone)
    }

    pub fn local_datetime(&self) -> Result<NaiveDateTime> {
        Ok(self.date()?.and_time(self.time()?))
    }

    /// Check every field without computing anything.
    pub fn validate(&self) -> Result<()> {
        self.date()?;
        self.time()?;
        self.tz()?;
        if !self.latitude.is_finite() || !(-90.0..=90.0).contains(&self.latitude) {
            return Err(BlueprintError::InvalidBirthData(format!(
                "latitude {} outside -90..=90",
                self.latitude
            )));
        }
        if !self.longitude.is_finite() || !(-180.0..=180.0).contains(&self.longitude) {
            return Err(BlueprintError::InvalidBirthData(format!(
                "longitude {} outside -180..=180",
                self.longitude
            )));
        }
        Ok(())
    }

    /// The UTC instant of birth.
    pub fn to_utc(&self) -> Result<DateTime<Utc>> {
        self.validate()?;
        local_to_utc(self.local_datetime()?, self.tz()?)
    }
}

// ---------------------------
// ## Time zones
// ---------------------------

pub fn parse_timezone(name: &str) -> Result<Tz> {
    Tz::from_str(name.trim()).map_err(|_| BlueprintError::UnknownTimezone(name.to_string()))
}

/// Resolve a wall-clock time in `tz`. A repeated hour resolves to the
/// earlier instant; a skipped hour is an error.
pub fn local_to_utc(local: NaiveDateTime, tz: Tz) -> Result<DateTime<Utc>> {
    match tz.from_local_datetime(&local) {
        LocalResult::Single(dt) => Ok(dt.with_timezone(&Utc)),
        LocalResult::Ambiguous(first, second) => {
            let earlier = if first <= second { first } else { second };
            tracing::debug!(%local, timezone = %tz, "ambiguous local time, using earlier instant");
            Ok(earlier.with_timezone(&Utc))
        }
        LocalResult::None => Err(BlueprintError::NonexistentLocalTime {
            time: local.to_string(),
            timezone: tz.name().to_string(),
        }),
    }
}

// ---------------------------
// ## Julian Day
// ---------------------------

pub fn julian_day(instant: &DateTime<Utc>) -> f64 {
    instant.timestamp_millis() as f64 / MILLIS_PER_DAY + UNIX_EPOCH_JD
}

pub fn from_julian_day(jd: f64) -> Result<DateTime<Utc>> {
    if !jd.is_finite() {
        return Err(BlueprintError::InvalidInput(format!("julian day {} is not finite", jd)));
    }
    let millis = ((jd - UNIX_EPOCH_JD) * MILLIS_PER_DAY).round() as i64;
    Utc.timestamp_millis_opt(millis)
        .single()
        .ok_or_else(|| BlueprintError::InvalidInput(format!("julian day {} out of range", jd)))
}

/// Midnight UTC of a calendar date, as a Julian Day.
pub fn julian_day_for_date(date: NaiveDate) -> f64 {
    julian_day(&date.and_time(NaiveTime::MIN).and_utc())
}

/// `2024-03-05T12:00:00.000Z`
pub fn iso_string(instant: &DateTime<Utc>) -> String {
    instant.format("%Y-%m-%dT%H:%M:%S%.3fZ").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use chrono::Timelike;

    fn sample() -> BirthData {
        BirthData::new("1994-10-18", "08:10", "America/Sao_Paulo", -23.55, -46.63)
    }

    #[test]
    fn test_birth_data_camel_case_json() {
        let json = r#"{
            "dateOfBirth": "1994-10-18",
            "timeOfBirth": "08:10",
            "timezone": "America/Sao_Paulo",
            "latitude": -23.55,
            "longitude": -46.63,
            "cityOfBirth": "São Paulo"
        }"#;
        let birth: BirthData = serde_json::from_str(json).unwrap();
        assert_eq!(birth.date_of_birth, "1994-10-18");
        assert_eq!(birth.city_of_birth, "São Paulo");
    }

    #[test]
    fn test_to_utc_applies_offset() {
        // Brazilian summer time began 1994-10-16, so Sao Paulo was on UTC-2
        let utc = sample().to_utc().unwrap();
        assert_eq!(utc.hour(), 10);
        assert_eq!(utc.minute(), 10);
    }

    #[test]
    fn test_utc_zone() {
        let birth = BirthData::new("2000-01-01", "12:00", "UTC", 0.0, 0.0);
        let utc = birth.to_utc().unwrap();
        assert_relative_eq!(julian_day(&utc), 2_451_545.0, epsilon = 1e-9);
    }

    #[test]
    fn test_seconds_accepted() {
        let birth = BirthData::new("2000-01-01", "12:00:30", "UTC", 0.0, 0.0);
        assert_eq!(birth.time().unwrap().second(), 30);
    }

    #[test]
    fn test_unknown_timezone() {
        let birth = BirthData::new("2000-01-01", "12:00", "Mars/Olympus_Mons", 0.0, 0.0);
        assert!(matches!(birth.to_utc(), Err(BlueprintError::UnknownTimezone(_))));
    }

    #[test]
    fn test_invalid_fields() {
        let bad_date = BirthData::new("2000-13-01", "12:00", "UTC", 0.0, 0.0);
        assert!(matches!(bad_date.validate(), Err(BlueprintError::InvalidBirthData(_))));
        let bad_time = BirthData::new("2000-01-01", "25:00", "UTC", 0.0, 0.0);
        assert!(bad_time.validate().is_err());
        let bad_lat = BirthData::new("2000-01-01", "12:00", "UTC", 91.0, 0.0);
        assert!(bad_lat.validate().is_err());
        let bad_lon = BirthData::new("2000-01-01", "12:00", "UTC", 0.0, -181.0);
        assert!(bad_lon.validate().is_err());
    }

    #[test]
    fn test_nonexistent_local_time_is_error() {
        // 2021-03-14 02:30 never happened in New York
        let birth = BirthData::new("2021-03-14", "02:30", "America/New_York", 40.7, -74.0);
        assert!(matches!(
            birth.to_utc(),
            Err(BlueprintError::NonexistentLocalTime { .. })
        ));
    }

    #[test]
    fn test_ambiguous_local_time_takes_earlier() {
        // 2021-11-07 01:30 happened twice in New York; first as EDT (UTC-4)
        let birth = BirthData::new("2021-11-07", "01:30", "America/New_York", 40.7, -74.0);
        let utc = birth.to_utc().unwrap();
        assert_eq!(utc.hour(), 5);
        assert_eq!(utc.minute(), 30);
    }

    #[test]
    fn test_julian_day_round_trip() {
        let instant = Utc.with_ymd_and_hms(1987, 4, 10, 19, 21, 0).unwrap();
        let jd = julian_day(&instant);
        assert_relative_eq!(jd, 2_446_896.306_25, epsilon = 1e-6);
        assert_eq!(from_julian_day(jd).unwrap(), instant);
    }

    #[test]
    fn test_from_julian_day_rejects_nan() {
        assert!(from_julian_day(f64::NAN).is_err());
    }

    #[test]
    fn test_iso_string() {
        let instant = Utc.with_ymd_and_hms(2024, 3, 5, 12, 0, 0).unwrap();
        assert_eq!(iso_string(&instant), "2024-03-05T12:00:00.000Z");
    }
}
