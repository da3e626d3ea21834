//! # Application Configuration
//!
//! Configuration for pricing defaults, the business profile and document
//! rendering.
//!
//! ## Configuration Sources
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Configuration Priority                               │
//! │                                                                         │
//! │  1. Environment Variables (highest priority)                           │
//! │     COTIZA_DB_PATH=./data/cotiza.db                                    │
//! │     COTIZA_NEGATIVE_TOTAL_POLICY=clamp                                 │
//! │                                                                         │
//! │  2. TOML Config File                                                   │
//! │     ~/.config/cotiza/cotiza.toml (Linux)                               │
//! │     ~/Library/Application Support/com.cotiza.cotiza/cotiza.toml (macOS)│
//! │                                                                         │
//! │  3. Default Values (lowest priority)                                   │
//! │     numbering from 3001, 5 validity days, allow negative totals        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration File Format
//! ```toml
//! # cotiza.toml
//! [database]
//! path = "/var/lib/cotiza/cotiza.db"
//!
//! [pricing]
//! negative_total_policy = "allow"  # allow | clamp
//! numbering_start = 3001
//! default_validity_days = 5
//! retefuente_percent = "2.5"
//! reteiva_percent = "15"
//! ica_percent = "0.966"
//! reteica_percent = "0.966"
//!
//! [business]
//! name = "Suministros del Caribe"
//! address = "Calle 22 # 4-15, Santa Marta"
//! phone = "605 421 0000"
//! country_code = "57"
//!
//! [documents]
//! image_timeout_ms = 8000
//! ```

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::{debug, info, warn};

use cotiza_core::validation::validate_validity_days;
use cotiza_core::{
    BusinessProfile, NegativeTotalPolicy, Rate, WithholdingKind, Withholdings,
    DEFAULT_NUMBERING_START, DEFAULT_VALIDITY_DAYS,
};

use crate::error::{ConfigError, ConfigResult};

const CONFIG_FILE_NAME: &str = "cotiza.toml";
const DB_FILE_NAME: &str = "cotiza.db";

// =============================================================================
// Database Section
// =============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DatabaseSettings {
    /// SQLite file. Defaults to the platform data directory.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
}

// =============================================================================
// Pricing Section
// =============================================================================

/// Pricing defaults applied to every new draft.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PricingSettings {
    #[serde(default)]
    pub negative_total_policy: NegativeTotalPolicy,

    /// First number handed out per seller.
    #[serde(default = "default_numbering_start")]
    pub numbering_start: u32,

    #[serde(default = "default_validity_days")]
    pub default_validity_days: i64,

    /// Percents that seed each withholding input. Withholdings still start
    /// disabled.
    #[serde(default = "default_retefuente")]
    pub retefuente_percent: Rate,
    #[serde(default = "default_reteiva")]
    pub reteiva_percent: Rate,
    #[serde(default = "default_ica")]
    pub ica_percent: Rate,
    #[serde(default = "default_reteica")]
    pub reteica_percent: Rate,
}

fn default_numbering_start() -> u32 {
    DEFAULT_NUMBERING_START
}

fn default_validity_days() -> i64 {
    DEFAULT_VALIDITY_DAYS
}

fn default_retefuente() -> Rate {
    WithholdingKind::Retefuente.default_percent()
}

fn default_reteiva() -> Rate {
    WithholdingKind::Reteiva.default_percent()
}

fn default_ica() -> Rate {
    WithholdingKind::Ica.default_percent()
}

fn default_reteica() -> Rate {
    WithholdingKind::Reteica.default_percent()
}

impl Default for PricingSettings {
    fn default() -> Self {
        PricingSettings {
            negative_total_policy: NegativeTotalPolicy::default(),
            numbering_start: default_numbering_start(),
            default_validity_days: default_validity_days(),
            retefuente_percent: default_retefuente(),
            reteiva_percent: default_reteiva(),
            ica_percent: default_ica(),
            reteica_percent: default_reteica(),
        }
    }
}

impl PricingSettings {
    /// Disabled withholdings seeded with the configured percents.
    pub fn withholdings(&self) -> Withholdings {
        let mut withholdings = Withholdings::default();
        withholdings.set_percent(WithholdingKind::Retefuente, self.retefuente_percent);
        withholdings.set_percent(WithholdingKind::Reteiva, self.reteiva_percent);
        withholdings.set_percent(WithholdingKind::Ica, self.ica_percent);
        withholdings.set_percent(WithholdingKind::Reteica, self.reteica_percent);
        withholdings
    }
}

// =============================================================================
// Business Section
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BusinessSettings {
    #[serde(default = "default_business_name")]
    pub name: String,

    #[serde(default)]
    pub address: String,

    #[serde(default)]
    pub phone: String,

    /// Dialing prefix, digits only.
    #[serde(default = "default_country_code")]
    pub country_code: String,
}

fn default_business_name() -> String {
    "Cotiza".to_string()
}

fn default_country_code() -> String {
    "57".to_string()
}

impl Default for BusinessSettings {
    fn default() -> Self {
        BusinessSettings {
            name: default_business_name(),
            address: String::new(),
            phone: String::new(),
            country_code: default_country_code(),
        }
    }
}

impl BusinessSettings {
    pub fn profile(&self) -> BusinessProfile {
        BusinessProfile {
            name: self.name.clone(),
            address: self.address.clone(),
            phone: self.phone.clone(),
            country_code: self.country_code.clone(),
        }
    }
}

// =============================================================================
// Documents Section
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentSettings {
    /// Upper bound for each product image fetch.
    #[serde(default = "default_image_timeout")]
    pub image_timeout_ms: u64,
}

fn default_image_timeout() -> u64 {
    8_000
}

impl Default for DocumentSettings {
    fn default() -> Self {
        DocumentSettings {
            image_timeout_ms: default_image_timeout(),
        }
    }
}

// =============================================================================
// App Config
// =============================================================================

/// Complete application configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub database: DatabaseSettings,

    #[serde(default)]
    pub pricing: PricingSettings,

    #[serde(default)]
    pub business: BusinessSettings,

    #[serde(default)]
    pub documents: DocumentSettings,
}

impl AppConfig {
    /// Creates a configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads configuration from file and environment.
    ///
    /// ## Loading Order
    /// 1. Start with defaults
    /// 2. Override with config file (if exists)
    /// 3. Override with `COTIZA_*` environment variables
    /// 4. Validate
    pub fn load(config_path: Option<PathBuf>) -> ConfigResult<Self> {
        let mut config = Self::default();

        if let Some(path) = config_path.or_else(Self::default_config_path) {
            if path.exists() {
                info!(?path, "Loading config from file");
                let contents = std::fs::read_to_string(&path)?;
                config = toml::from_str(&contents)?;
            } else {
                debug!(?path, "Config file not found, using defaults");
            }
        }

        config.apply_env_overrides();
        config.validate()?;

        Ok(config)
    }

    /// Loads configuration, falling back to defaults on error.
    pub fn load_or_default(config_path: Option<PathBuf>) -> Self {
        Self::load(config_path).unwrap_or_else(|e| {
            warn!(error = %e, "Failed to load config, using defaults");
            Self::default()
        })
    }

    /// Writes the configuration as TOML.
    pub fn save(&self, config_path: Option<PathBuf>) -> ConfigResult<()> {
        let path = config_path
            .or_else(Self::default_config_path)
            .ok_or_else(|| ConfigError::SaveFailed("Could not determine config path".into()))?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| ConfigError::SaveFailed(e.to_string()))?;
        }

        let contents = toml::to_string_pretty(self)?;
        std::fs::write(&path, contents).map_err(|e| ConfigError::SaveFailed(e.to_string()))?;

        info!(?path, "Saved config");
        Ok(())
    }

    pub fn validate(&self) -> ConfigResult<()> {
        if self.pricing.numbering_start == 0 {
            return Err(ConfigError::InvalidConfig(
                "numbering_start must be greater than 0".into(),
            ));
        }

        validate_validity_days(self.pricing.default_validity_days)
            .map_err(|e| ConfigError::InvalidConfig(e.to_string()))?;

        let code = &self.business.country_code;
        if code.is_empty() || !code.chars().all(|c| c.is_ascii_digit()) {
            return Err(ConfigError::InvalidConfig(format!(
                "country_code must be digits only, got: '{}'",
                code
            )));
        }

        if self.business.name.trim().is_empty() {
            return Err(ConfigError::InvalidConfig("business name is required".into()));
        }

        if self.documents.image_timeout_ms == 0 {
            return Err(ConfigError::InvalidConfig(
                "image_timeout_ms must be greater than 0".into(),
            ));
        }

        Ok(())
    }

    fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    /// Applies `COTIZA_*` overrides from any key lookup.
    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(path) = lookup("COTIZA_DB_PATH") {
            debug!(path = %path, "Overriding database path from environment");
            self.database.path = Some(PathBuf::from(path));
        }

        if let Some(policy) = lookup("COTIZA_NEGATIVE_TOTAL_POLICY") {
            match policy.parse() {
                Ok(parsed) => self.pricing.negative_total_policy = parsed,
                Err(_) => warn!(policy = %policy, "Unknown negative total policy in environment"),
            }
        }

        if let Some(start) = lookup("COTIZA_NUMBERING_START") {
            if let Ok(n) = start.parse::<u32>() {
                self.pricing.numbering_start = n;
            }
        }

        if let Some(days) = lookup("COTIZA_VALIDITY_DAYS") {
            if let Ok(d) = days.parse::<i64>() {
                self.pricing.default_validity_days = d;
            }
        }

        if let Some(name) = lookup("COTIZA_BUSINESS_NAME") {
            self.business.name = name;
        }

        if let Some(phone) = lookup("COTIZA_BUSINESS_PHONE") {
            self.business.phone = phone;
        }

        if let Some(code) = lookup("COTIZA_COUNTRY_CODE") {
            self.business.country_code = code.trim_start_matches('+').to_string();
        }

        if let Some(timeout) = lookup("COTIZA_IMAGE_TIMEOUT_MS") {
            if let Ok(ms) = timeout.parse::<u64>() {
                self.documents.image_timeout_ms = ms;
            }
        }
    }

    fn default_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("com", "cotiza", "cotiza")
            .map(|dirs| dirs.config_dir().join(CONFIG_FILE_NAME))
    }

    /// Database file to open: configured path, else the platform data
    /// directory, else the working directory.
    pub fn database_path(&self) -> PathBuf {
        if let Some(path) = &self.database.path {
            return path.clone();
        }
        directories::ProjectDirs::from("com", "cotiza", "cotiza")
            .map(|dirs| dirs.data_dir().join(DB_FILE_NAME))
            .unwrap_or_else(|| PathBuf::from(DB_FILE_NAME))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.pricing.numbering_start, 3001);
        assert_eq!(config.pricing.default_validity_days, 5);
        assert_eq!(config.pricing.negative_total_policy, NegativeTotalPolicy::Allow);
        assert_eq!(config.pricing.ica_percent, Rate::percent("0.966").unwrap());
        assert_eq!(config.business.country_code, "57");
        assert_eq!(config.documents.image_timeout_ms, 8000);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_parse_partial_toml() {
        let toml_str = r#"
            [pricing]
            negative_total_policy = "clamp"
            numbering_start = 100
            retefuente_percent = "3.5"

            [business]
            name = "Suministros del Caribe"
        "#;

        let config: AppConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.pricing.negative_total_policy, NegativeTotalPolicy::Clamp);
        assert_eq!(config.pricing.numbering_start, 100);
        assert_eq!(config.pricing.retefuente_percent, Rate::percent("3.5").unwrap());
        // Untouched keys keep their defaults
        assert_eq!(config.pricing.default_validity_days, 5);
        assert_eq!(config.pricing.reteiva_percent, Rate::percent("15").unwrap());
        assert_eq!(config.business.country_code, "57");
    }

    #[test]
    fn test_percent_out_of_range_rejected() {
        let toml_str = r#"
            [pricing]
            ica_percent = "120"
        "#;
        assert!(toml::from_str::<AppConfig>(toml_str).is_err());
    }

    #[test]
    fn test_validation() {
        let mut config = AppConfig::default();
        config.business.country_code = "+57".into();
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.pricing.default_validity_days = 0;
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.pricing.numbering_start = 0;
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.documents.image_timeout_ms = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_overrides() {
        let vars: HashMap<&str, &str> = [
            ("COTIZA_DB_PATH", "/tmp/cotiza-test.db"),
            ("COTIZA_NEGATIVE_TOTAL_POLICY", "clamp"),
            ("COTIZA_NUMBERING_START", "500"),
            ("COTIZA_COUNTRY_CODE", "+58"),
            ("COTIZA_IMAGE_TIMEOUT_MS", "not-a-number"),
        ]
        .into_iter()
        .collect();

        let mut config = AppConfig::default();
        config.apply_overrides(|key| vars.get(key).map(|v| v.to_string()));

        assert_eq!(config.database_path(), PathBuf::from("/tmp/cotiza-test.db"));
        assert_eq!(config.pricing.negative_total_policy, NegativeTotalPolicy::Clamp);
        assert_eq!(config.pricing.numbering_start, 500);
        assert_eq!(config.business.country_code, "58");
        // Unparsable values are ignored
        assert_eq!(config.documents.image_timeout_ms, 8000);
    }

    #[test]
    fn test_withholdings_seeded_disabled() {
        let mut config = AppConfig::default();
        config.pricing.retefuente_percent = Rate::percent("4").unwrap();

        let withholdings = config.pricing.withholdings();
        assert!(!withholdings.any_enabled());
        assert_eq!(withholdings.retefuente.percent, Rate::percent("4").unwrap());
        assert_eq!(withholdings.reteiva.percent, Rate::percent("15").unwrap());
    }

    #[test]
    fn test_save_and_load_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("cotiza.toml");

        let mut config = AppConfig::default();
        config.pricing.numbering_start = 42;
        config.pricing.ica_percent = Rate::percent("1.1").unwrap();
        config.business.name = "Ferretería Central".into();
        config.save(Some(path.clone())).unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        let loaded: AppConfig = toml::from_str(&contents).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_load_missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = AppConfig::load_or_default(Some(dir.path().join("absent.toml")));
        assert_eq!(config.pricing.numbering_start, 3001);
    }

    #[test]
    fn test_load_invalid_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cotiza.toml");
        std::fs::write(&path, "[pricing\nnumbering_start = ").unwrap();

        let err = AppConfig::load(Some(path)).unwrap_err();
        assert!(matches!(err, ConfigError::LoadFailed(_)));
    }
}
