//! Search configuration.
//!
//! Every field has a default, so a config file only needs the values it
//! overrides. The confidence values and age thresholds are heuristics, not
//! clinical dosing rules.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::MatchStrength;

/// Environment override for [`SearchConfig::default_limit`].
pub const ENV_DEFAULT_LIMIT: &str = "RX_SEARCH_DEFAULT_LIMIT";
/// Environment override for [`SearchConfig::max_limit`].
pub const ENV_MAX_LIMIT: &str = "RX_SEARCH_MAX_LIMIT";

/// Configuration errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid config: {0}")]
    Invalid(String),
}

pub type ConfigResult<T> = Result<T, ConfigError>;

/// Base confidence per match strength.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ConfidenceTable {
    pub exact: f64,
    pub name_partial: f64,
    pub alias_partial: f64,
    pub category_partial: f64,
    pub neutral: f64,
}

impl Default for ConfidenceTable {
    fn default() -> Self {
        Self {
            exact: 0.95,
            name_partial: 0.8,
            alias_partial: 0.7,
            category_partial: 0.55,
            neutral: 0.5,
        }
    }
}

impl ConfidenceTable {
    pub fn for_strength(&self, strength: MatchStrength) -> f64 {
        match strength {
            MatchStrength::Exact => self.exact,
            MatchStrength::NamePartial => self.name_partial,
            MatchStrength::AliasPartial => self.alias_partial,
            MatchStrength::CategoryPartial => self.category_partial,
            MatchStrength::Neutral => self.neutral,
        }
    }

    /// Values must lie in [0, 1] and strictly decrease from exact to neutral.
    pub fn validate(&self) -> ConfigResult<()> {
        let ordered = [
            ("exact", self.exact),
            ("name_partial", self.name_partial),
            ("alias_partial", self.alias_partial),
            ("category_partial", self.category_partial),
            ("neutral", self.neutral),
        ];

        for (name, value) in ordered {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::Invalid(format!(
                    "confidence.{name} must be within [0, 1], got {value}"
                )));
            }
        }

        for pair in ordered.windows(2) {
            let (stronger, stronger_value) = pair[0];
            let (weaker, weaker_value) = pair[1];
            if stronger_value <= weaker_value {
                return Err(ConfigError::Invalid(format!(
                    "confidence.{stronger} ({stronger_value}) must be greater than confidence.{weaker} ({weaker_value})"
                )));
            }
        }

        Ok(())
    }
}

/// Tunables for matching limits and suggestion shaping.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SearchConfig {
    /// Result count when the caller gives no limit
    pub default_limit: usize,
    /// Upper bound applied to caller-supplied limits
    pub max_limit: usize,
    pub confidence: ConfidenceTable,
    /// Ages strictly below this are labelled pediatric
    pub pediatric_age_below: u32,
    /// Ages strictly above this are labelled geriatric
    pub geriatric_age_above: u32,
    /// Confidence multiplier for a pediatric or geriatric label
    pub age_multiplier: f64,
    /// Confidence multiplier when a reported allergy overlaps the record
    pub allergy_multiplier: f64,
    pub max_alternatives: usize,
    pub max_precautions: usize,
    /// Result count for name completions
    pub completion_limit: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            default_limit: 10,
            max_limit: 50,
            confidence: ConfidenceTable::default(),
            pediatric_age_below: 12,
            geriatric_age_above: 65,
            age_multiplier: 0.9,
            allergy_multiplier: 0.5,
            max_alternatives: 3,
            max_precautions: 3,
            completion_limit: 10,
        }
    }
}

impl SearchConfig {
    /// Parse and validate a JSON config.
    pub fn from_json_str(json: &str) -> ConfigResult<Self> {
        let config: SearchConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse, and validate a JSON config file.
    pub fn from_path<P: AsRef<Path>>(path: P) -> ConfigResult<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json_str(&json)
    }

    /// Apply `RX_SEARCH_DEFAULT_LIMIT` / `RX_SEARCH_MAX_LIMIT` from the
    /// process environment.
    pub fn with_env_overrides(self) -> ConfigResult<Self> {
        self.with_overrides(|key| std::env::var(key).ok())
    }

    /// Apply overrides from an arbitrary key lookup.
    pub fn with_overrides<F>(mut self, lookup: F) -> ConfigResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(raw) = lookup(ENV_DEFAULT_LIMIT) {
            self.default_limit = parse_limit(ENV_DEFAULT_LIMIT, &raw)?;
        }
        if let Some(raw) = lookup(ENV_MAX_LIMIT) {
            self.max_limit = parse_limit(ENV_MAX_LIMIT, &raw)?;
        }
        self.validate()?;
        Ok(self)
    }

    pub fn validate(&self) -> ConfigResult<()> {
        self.confidence.validate()?;

        if self.max_limit == 0 {
            return Err(ConfigError::Invalid("max_limit must be at least 1".into()));
        }
        if self.default_limit > self.max_limit {
            return Err(ConfigError::Invalid(format!(
                "default_limit ({}) exceeds max_limit ({})",
                self.default_limit, self.max_limit
            )));
        }
        if self.pediatric_age_below > self.geriatric_age_above {
            return Err(ConfigError::Invalid(format!(
                "pediatric_age_below ({}) exceeds geriatric_age_above ({})",
                self.pediatric_age_below, self.geriatric_age_above
            )));
        }
        for (name, value) in [
            ("age_multiplier", self.age_multiplier),
            ("allergy_multiplier", self.allergy_multiplier),
        ] {
            if !(value > 0.0 && value <= 1.0) {
                return Err(ConfigError::Invalid(format!(
                    "{name} must be within (0, 1], got {value}"
                )));
            }
        }

        Ok(())
    }

    /// Resolve a caller-supplied limit: default when absent, capped at
    /// `max_limit`. Zero stays zero.
    pub fn effective_limit(&self, requested: Option<usize>) -> usize {
        requested
            .unwrap_or(self.default_limit)
            .min(self.max_limit)
    }
}

fn parse_limit(key: &str, raw: &str) -> ConfigResult<usize> {
    raw.trim().parse::<usize>().map_err(|_| {
        ConfigError::Invalid(format!("{key} must be a non-negative integer, got {raw:?}"))
    })
}
