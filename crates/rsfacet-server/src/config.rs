//! Configuration management for rsfacet.
//!
//! This module provides configuration loading with multiple sources:
//! 1. Default values (hardcoded)
//! 2. Configuration file (YAML)
//! 3. Environment variables (override)
//!
//! # Configuration Hierarchy
//!
//! Environment variables take precedence over config file values,
//! which take precedence over defaults.
//!
//! # Example
//!
//! ```ignore
//! use rsfacet_server::config::AppConfig;
//!
//! // Load from file with env overrides
//! let config = AppConfig::load("facets.yaml")?;
//!
//! // Or load from environment only
//! let config = AppConfig::from_env()?;
//! ```
//!
//! # Example YAML Configuration
//!
//! Section, field and rule names are case-sensitive. The `config` crate
//! lowercases map keys, so these names are always written as values.
//!
//! ```yaml
//! cache:
//!   ttl_secs: 600
//!
//! facets:
//!   defaults:
//!     limit: 30
//!   sections:
//!     - name: Results
//!       fields:
//!         - { field: building, label: Library }
//!         - { field: format, label: Format }
//!       overrides:
//!         - { field: format, operator: or }
//!
//! permissions:
//!   facets:
//!     - { field: building, value: "Staff Library", rule: staff }
//!   rules:
//!     - name: staff
//!       role: [staff]
//!       ip_range: ["10.0.0.0-10.0.255.255"]
//! ```

use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

use config::{Config, ConfigError, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};

use rsfacet_domain::cache::FacetCacheConfig;
use rsfacet_domain::decoder::PositionalSchema;
use rsfacet_domain::params::FacetSettings;
use rsfacet_domain::permission::{
    AuthorizationFailurePolicy, PermissionConfig, PermissionRule, RuleRef,
};
use rsfacet_domain::record::RecordFieldNames;

/// Environment variable prefix.
pub const ENV_PREFIX: &str = "RSFACET";

/// Application configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
pub struct AppConfig {
    /// Logging settings
    #[serde(default)]
    pub logging: LoggingSettings,

    /// Facet result cache settings
    #[serde(default)]
    pub cache: CacheSettings,

    /// Facet defaults and per-context sections
    #[serde(default)]
    pub facets: FacetSettings,

    /// Facet value permissions and the rules they reference
    #[serde(default)]
    pub permissions: PermissionSettings,

    /// Related record field names and layouts
    #[serde(default)]
    pub records: RecordSettings,
}

/// Logging settings.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct LoggingSettings {
    /// Log level: "trace", "debug", "info", "warn", "error"
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Use JSON format (true for production, false for development)
    #[serde(default)]
    pub json: bool,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Facet result cache settings.
///
/// - `RSFACET_CACHE__ENABLED=false` - Query the backend on every call
/// - `RSFACET_CACHE__MAX_CAPACITY=50000` - Maximum cached facet sets
/// - `RSFACET_CACHE__TTL_SECS=60` - Entry lifetime
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct CacheSettings {
    #[serde(default = "default_true")]
    pub enabled: bool,

    #[serde(default = "default_max_capacity")]
    pub max_capacity: u64,

    #[serde(default = "default_ttl_secs")]
    pub ttl_secs: u64,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            max_capacity: default_max_capacity(),
            ttl_secs: default_ttl_secs(),
        }
    }
}

impl CacheSettings {
    pub fn to_cache_config(&self) -> FacetCacheConfig {
        FacetCacheConfig::default()
            .with_enabled(self.enabled)
            .with_max_capacity(self.max_capacity)
            .with_ttl(Duration::from_secs(self.ttl_secs))
    }
}

fn default_true() -> bool {
    true
}

fn default_max_capacity() -> u64 {
    10_000
}

fn default_ttl_secs() -> u64 {
    300
}

/// Facet value permissions.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
pub struct PermissionSettings {
    /// Restricted values per facet field
    #[serde(default)]
    pub facets: PermissionConfig,

    /// Named rules referenced from `facets`
    #[serde(default, with = "named_rules")]
    pub rules: BTreeMap<RuleRef, PermissionRule>,

    /// What to do with a value whose rules cannot be evaluated
    #[serde(default)]
    pub on_authorization_error: AuthorizationFailurePolicy,
}

/// Serde adapter for `permissions.rules`: a list of rules carrying their
/// `name`, keyed by that name once loaded.
mod named_rules {
    use std::collections::BTreeMap;

    use serde::de::Error as _;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    use rsfacet_domain::permission::{PermissionRule, RuleRef};

    #[derive(Deserialize, Serialize)]
    struct NamedRule {
        name: RuleRef,
        #[serde(flatten)]
        rule: PermissionRule,
    }

    pub fn serialize<S>(
        rules: &BTreeMap<RuleRef, PermissionRule>,
        serializer: S,
    ) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_seq(rules.iter().map(|(name, rule)| NamedRule {
            name: name.clone(),
            rule: rule.clone(),
        }))
    }

    pub fn deserialize<'de, D>(
        deserializer: D,
    ) -> Result<BTreeMap<RuleRef, PermissionRule>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let mut rules = BTreeMap::new();
        for NamedRule { name, rule } in Vec::<NamedRule>::deserialize(deserializer)? {
            if rules.contains_key(&name) {
                return Err(D::Error::custom(format!(
                    "permission rule '{name}' is defined twice"
                )));
            }
            rules.insert(name, rule);
        }
        Ok(rules)
    }
}

/// Related record settings.
///
/// Schemas left unset use the built-in parent, child and relation layouts.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
pub struct RecordSettings {
    #[serde(default)]
    pub fields: RecordFieldNames,

    #[serde(default)]
    pub parent_schema: Option<PositionalSchema>,

    #[serde(default)]
    pub child_schema: Option<PositionalSchema>,

    #[serde(default)]
    pub relation_schema: Option<PositionalSchema>,
}

/// Error type for configuration loading.
#[derive(Debug, thiserror::Error)]
pub enum ConfigLoadError {
    #[error("failed to load configuration: {0}")]
    Load(#[from] ConfigError),

    #[error("configuration file not found: {path}")]
    FileNotFound { path: String },

    #[error("invalid configuration: {message}")]
    Invalid { message: String },
}

impl AppConfig {
    /// Load configuration from a YAML file with environment variable overrides.
    ///
    /// Environment variables are prefixed with `RSFACET_` and use `__` as separator.
    /// For example:
    /// - `RSFACET_CACHE__TTL_SECS=60` overrides `cache.ttl_secs`
    /// - `RSFACET_LOGGING__LEVEL=debug` overrides `logging.level`
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigLoadError> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(ConfigLoadError::FileNotFound {
                path: path.display().to_string(),
            });
        }

        let config = Config::builder()
            .add_source(Config::try_from(&AppConfig::default())?)
            .add_source(File::from(path).format(FileFormat::Yaml))
            .add_source(environment())
            .build()?;

        let app_config: AppConfig = config.try_deserialize()?;
        app_config.validate()?;

        Ok(app_config)
    }

    /// Load configuration from environment variables only.
    pub fn from_env() -> Result<Self, ConfigLoadError> {
        let config = Config::builder()
            .add_source(Config::try_from(&AppConfig::default())?)
            .add_source(environment())
            .build()?;

        let app_config: AppConfig = config.try_deserialize()?;
        app_config.validate()?;

        Ok(app_config)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigLoadError> {
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.logging.level.to_lowercase().as_str()) {
            return Err(ConfigLoadError::Invalid {
                message: format!(
                    "logging.level must be one of: {:?}, got: {}",
                    valid_levels, self.logging.level
                ),
            });
        }

        if self.cache.enabled && self.cache.max_capacity == 0 {
            return Err(ConfigLoadError::Invalid {
                message: "cache.max_capacity must be greater than 0 when the cache is enabled"
                    .to_string(),
            });
        }

        self.facets
            .validate()
            .map_err(|err| ConfigLoadError::Invalid {
                message: format!("facets: {err}"),
            })?;

        if let Some(undefined) = self
            .permissions
            .facets
            .referenced_rules()
            .find(|rule| !self.permissions.rules.contains_key(*rule))
        {
            return Err(ConfigLoadError::Invalid {
                message: format!(
                    "permissions.facets references undefined rule '{undefined}'"
                ),
            });
        }

        Ok(())
    }
}

fn environment() -> Environment {
    // RSFACET_CACHE__TTL_SECS -> cache.ttl_secs
    Environment::with_prefix(ENV_PREFIX)
        .prefix_separator("_")
        .separator("__")
}
