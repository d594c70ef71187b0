//! Executor configuration
//!
//! Settings that influence evaluation (datetime parsing, equality mode,
//! recursion limit) and parallelism. Loaded from TOML, with environment
//! overrides for the settings tuned per host:
//!
//! - `TABVIEW_CPU` - worker cap
//! - `TABVIEW_TIMEZONE` - `UTC`, `Local` or `+HH:MM`
//! - `TABVIEW_DATETIME_FORMAT` - comma separated chrono layouts
//! - `TABVIEW_STRICT_EQUAL` - `true` / `false`
//! - `TABVIEW_LIMIT_RECURSION` - negative disables the check
//! - `TABVIEW_MIN_UNITS_PER_WORKER`

use std::{fs, path::Path};

use serde::{Deserialize, Serialize};
use tabview_types::Timezone;

use crate::{
    errors::{ExecutorError, Result},
    limits::{DEFAULT_LIMIT_RECURSION, MIN_UNITS_PER_WORKER},
};

/// Read-only settings shared by every operator of a query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutorConfig {
    /// Maximum number of workers per operator
    #[serde(default = "default_cpu")]
    pub cpu: usize,

    /// Extra datetime layouts (chrono strftime syntax), tried before the
    /// built-in ones
    #[serde(default)]
    pub datetime_formats: Vec<String>,

    /// Offset applied to datetime strings without one
    #[serde(default)]
    pub timezone: Timezone,

    /// Compare values by exact type and text instead of loose equivalence
    #[serde(default)]
    pub strict_equal: bool,

    /// Iteration cap for recursive queries; negative means unlimited
    #[serde(default = "default_limit_recursion")]
    pub limit_recursion: i64,

    /// Smallest share of work worth handing to a separate worker
    #[serde(default = "default_min_units_per_worker")]
    pub min_units_per_worker: usize,
}

fn default_cpu() -> usize {
    rayon::current_num_threads().max(1)
}

fn default_limit_recursion() -> i64 {
    DEFAULT_LIMIT_RECURSION
}

fn default_min_units_per_worker() -> usize {
    MIN_UNITS_PER_WORKER
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        ExecutorConfig {
            cpu: default_cpu(),
            datetime_formats: Vec::new(),
            timezone: Timezone::default(),
            strict_equal: false,
            limit_recursion: default_limit_recursion(),
            min_units_per_worker: default_min_units_per_worker(),
        }
    }
}

impl ExecutorConfig {
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: ExecutorConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from a TOML file; a missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            log::debug!("config file {} not found, using defaults", path.display());
            return Ok(Self::default());
        }
        let content = fs::read_to_string(path).map_err(|e| {
            ExecutorConfig::invalid(format!("failed to read {}: {}", path.display(), e))
        })?;
        Self::from_toml_str(&content)
    }

    /// Apply `TABVIEW_*` environment overrides.
    pub fn with_env_overrides(self) -> Result<Self> {
        self.with_overrides(|key| std::env::var(key).ok())
    }

    fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        if let Some(cpu) = lookup("TABVIEW_CPU") {
            self.cpu = parse_setting("TABVIEW_CPU", &cpu)?;
        }
        if let Some(tz) = lookup("TABVIEW_TIMEZONE") {
            self.timezone = tz.parse()?;
        }
        if let Some(formats) = lookup("TABVIEW_DATETIME_FORMAT") {
            self.datetime_formats = formats
                .split(',')
                .map(str::trim)
                .filter(|f| !f.is_empty())
                .map(String::from)
                .collect();
        }
        if let Some(strict) = lookup("TABVIEW_STRICT_EQUAL") {
            self.strict_equal = parse_setting("TABVIEW_STRICT_EQUAL", &strict)?;
        }
        if let Some(limit) = lookup("TABVIEW_LIMIT_RECURSION") {
            self.limit_recursion = parse_setting("TABVIEW_LIMIT_RECURSION", &limit)?;
        }
        if let Some(min) = lookup("TABVIEW_MIN_UNITS_PER_WORKER") {
            self.min_units_per_worker = parse_setting("TABVIEW_MIN_UNITS_PER_WORKER", &min)?;
        }
        self.validate()?;
        Ok(self)
    }

    pub fn validate(&self) -> Result<()> {
        if self.cpu == 0 {
            return Err(Self::invalid("cpu must be at least 1"));
        }
        if self.min_units_per_worker == 0 {
            return Err(Self::invalid("min_units_per_worker must be at least 1"));
        }
        Ok(())
    }

    fn invalid(message: impl Into<String>) -> ExecutorError {
        ExecutorError::InvalidConfiguration(message.into())
    }
}

fn parse_setting<T: std::str::FromStr>(key: &str, value: &str) -> Result<T> {
    value
        .trim()
        .parse()
        .map_err(|_| ExecutorConfig::invalid(format!("{} has an invalid value {:?}", key, value)))
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    #[test]
    fn test_defaults_from_empty_toml() {
        let config = ExecutorConfig::from_toml_str("").unwrap();
        assert_eq!(config.limit_recursion, DEFAULT_LIMIT_RECURSION);
        assert_eq!(config.min_units_per_worker, MIN_UNITS_PER_WORKER);
        assert!(!config.strict_equal);
        assert!(config.cpu >= 1);
    }

    #[test]
    fn test_toml_values() {
        let config = ExecutorConfig::from_toml_str(
            r#"
            cpu = 2
            timezone = "+09:00"
            strict_equal = true
            datetime_formats = ["%d.%m.%Y"]
            limit_recursion = -1
            "#,
        )
        .unwrap();
        assert_eq!(config.cpu, 2);
        assert_eq!(config.timezone.offset().local_minus_utc(), 9 * 3600);
        assert!(config.strict_equal);
        assert_eq!(config.datetime_formats, vec!["%d.%m.%Y".to_string()]);
        assert_eq!(config.limit_recursion, -1);
    }

    #[test]
    fn test_invalid_timezone_rejected() {
        let err = ExecutorConfig::from_toml_str(r#"timezone = "nowhere""#).unwrap_err();
        assert!(matches!(err, ExecutorError::InvalidConfiguration(_)));
    }

    #[test]
    fn test_zero_cpu_rejected() {
        assert!(ExecutorConfig::from_toml_str("cpu = 0").is_err());
    }

    #[test]
    fn test_overrides() {
        let env: HashMap<&str, &str> = [
            ("TABVIEW_CPU", "3"),
            ("TABVIEW_DATETIME_FORMAT", "%d.%m.%Y, %Y%m%d"),
            ("TABVIEW_STRICT_EQUAL", "true"),
        ]
        .into_iter()
        .collect();
        let config = ExecutorConfig::default()
            .with_overrides(|key| env.get(key).map(|v| v.to_string()))
            .unwrap();
        assert_eq!(config.cpu, 3);
        assert_eq!(config.datetime_formats.len(), 2);
        assert!(config.strict_equal);

        let bad = ExecutorConfig::default()
            .with_overrides(|key| (key == "TABVIEW_CPU").then(|| "many".to_string()));
        assert!(bad.is_err());
    }
}
