//! Calculation settings resolved from defaults, a TOML file and the environment.
//!
//! Resolution order (highest priority first):
//! 1. Environment variables (`BLUEPRINT_*`)
//! 2. TOML file (explicit path, else `BLUEPRINT_CONFIG`)
//! 3. Compiled defaults

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{BlueprintError, Result};
use crate::houses::HouseSystem;

pub const CONFIG_ENV: &str = "BLUEPRINT_CONFIG";
pub const HOUSE_SYSTEM_ENV: &str = "BLUEPRINT_HOUSE_SYSTEM";
pub const EPHEMERIS_TABLE_ENV: &str = "BLUEPRINT_EPHEMERIS_TABLE";

/// Solar arc between the personality and design charts.
pub const DEFAULT_DESIGN_ARC: f64 = 88.0;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Zodiac {
    #[default]
    Tropical,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BlueprintConfig {
    pub house_system: HouseSystem,
    pub design_arc_degrees: f64,
    pub ephemeris_table: Option<PathBuf>,
    pub zodiac: Zodiac,
}

impl Default for BlueprintConfig {
    fn default() -> Self {
        BlueprintConfig {
            house_system: HouseSystem::Placidus,
            design_arc_degrees: DEFAULT_DESIGN_ARC,
            ephemeris_table: None,
            zodiac: Zodiac::Tropical,
        }
    }
}

impl BlueprintConfig {
    /// Load the configuration. An explicit `path` wins over `BLUEPRINT_CONFIG`;
    /// with neither, compiled defaults are used.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let file = path
            .map(Path::to_path_buf)
            .or_else(|| std::env::var_os(CONFIG_ENV).map(PathBuf::from));

        let mut config = match file {
            Some(file) => {
                let content = std::fs::read_to_string(&file)?;
                tracing::debug!(path = %file.display(), "loading configuration file");
                Self::from_toml(&content)?
            }
            None => Self::default(),
        };

        config.apply_env_overrides(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        let config: BlueprintConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Apply `BLUEPRINT_*` overrides read through `lookup`.
    pub fn apply_env_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(value) = lookup(HOUSE_SYSTEM_ENV) {
            self.house_system = value.parse()?;
        }
        if let Some(value) = lookup(EPHEMERIS_TABLE_ENV) {
            if !value.trim().is_empty() {
                self.ephemeris_table = Some(PathBuf::from(value));
            }
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        let arc = self.design_arc_degrees;
        if !arc.is_finite() || arc <= 0.0 || arc >= 360.0 {
            return Err(BlueprintError::InvalidInput(format!(
                "design_arc_degrees must lie in (0, 360), got {}",
                arc
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_defaults() {
        let config = BlueprintConfig::default();
        assert_eq!(config.house_system, HouseSystem::Placidus);
        assert_relative_eq!(config.design_arc_degrees, 88.0);
        assert!(config.ephemeris_table.is_none());
        assert_eq!(config.zodiac, Zodiac::Tropical);
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = BlueprintConfig::from_toml("house_system = \"whole-sign\"\n").unwrap();
        assert_eq!(config.house_system, HouseSystem::WholeSign);
        assert_relative_eq!(config.design_arc_degrees, 88.0);
    }

    #[test]
    fn test_full_toml() {
        let toml_str = r#"
            house_system = "K"
            design_arc_degrees = 88.0
            ephemeris_table = "/var/lib/blueprint/table.bin"
            zodiac = "tropical"
        "#;
        let config = BlueprintConfig::from_toml(toml_str).unwrap();
        assert_eq!(config.house_system, HouseSystem::Koch);
        assert_eq!(
            config.ephemeris_table.as_deref(),
            Some(Path::new("/var/lib/blueprint/table.bin"))
        );
    }

    #[test]
    fn test_rejects_bad_arc() {
        assert!(BlueprintConfig::from_toml("design_arc_degrees = 400.0").is_err());
        assert!(BlueprintConfig::from_toml("design_arc_degrees = 0.0").is_err());
    }

    #[test]
    fn test_rejects_sidereal_zodiac() {
        assert!(BlueprintConfig::from_toml("zodiac = \"sidereal\"").is_err());
    }

    #[test]
    fn test_env_overrides() {
        let mut config = BlueprintConfig::default();
        config
            .apply_env_overrides(|key| match key {
                HOUSE_SYSTEM_ENV => Some("E".to_string()),
                EPHEMERIS_TABLE_ENV => Some("table.bin".to_string()),
                _ => None,
            })
            .unwrap();
        assert_eq!(config.house_system, HouseSystem::Equal);
        assert_eq!(config.ephemeris_table, Some(PathBuf::from("table.bin")));
    }

    #[test]
    fn test_env_override_rejects_unknown_house_system() {
        let mut config = BlueprintConfig::default();
        let result = config.apply_env_overrides(|key| {
            (key == HOUSE_SYSTEM_ENV).then(|| "Z".to_string())
        });
        assert!(matches!(result, Err(BlueprintError::UnknownHouseSystem(_))));
    }
}
