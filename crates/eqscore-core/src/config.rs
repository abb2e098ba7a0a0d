//! Scoring configuration.
//!
//! Rating thresholds are data, not constants: they live in `eqscore.toml`
//! alongside batch settings.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::rating::RatingTable;

/// Top-level eqscore configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoringConfig {
    /// Bands for the overall EQ rating.
    #[serde(default = "RatingTable::eq_default")]
    pub eq_rating: RatingTable,
    /// Bands for the inconsistency rating.
    #[serde(default = "RatingTable::inconsistency_default")]
    pub inconsistency_rating: RatingTable,
    /// Max concurrent submissions in a batch run.
    #[serde(default = "default_parallelism")]
    pub parallelism: usize,
    /// Output directory for reports.
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
}

fn default_parallelism() -> usize {
    4
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("./eqscore-results")
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            eq_rating: RatingTable::eq_default(),
            inconsistency_rating: RatingTable::inconsistency_default(),
            parallelism: default_parallelism(),
            output_dir: default_output_dir(),
        }
    }
}

impl ScoringConfig {
    /// Validate both rating tables and the batch settings.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.eq_rating.validate("eq_rating")?;
        self.inconsistency_rating.validate("inconsistency_rating")?;
        if self.parallelism == 0 {
            return Err(ConfigError::ZeroParallelism);
        }
        Ok(())
    }
}

/// Load configuration from well-known paths.
///
/// Search order:
/// 1. `eqscore.toml` in the current directory
/// 2. `~/.config/eqscore/config.toml`
///
/// Environment variable overrides: `EQSCORE_PARALLELISM`, `EQSCORE_OUTPUT_DIR`.
pub fn load_config() -> Result<ScoringConfig> {
    load_config_from(None)
}

/// Load config from an explicit path, or search the default locations.
pub fn load_config_from(path: Option<&Path>) -> Result<ScoringConfig> {
    let config_path = if let Some(p) = path {
        if p.exists() {
            Some(p.to_path_buf())
        } else {
            anyhow::bail!("config file not found: {}", p.display());
        }
    } else {
        let local = PathBuf::from("eqscore.toml");
        if local.exists() {
            Some(local)
        } else {
            dirs_path()
                .map(|home| home.join("config.toml"))
                .filter(|global| global.exists())
        }
    };

    let mut config = match config_path {
        Some(path) => {
            tracing::debug!("loading config from {}", path.display());
            parse_config_file(&path)?
        }
        None => ScoringConfig::default(),
    };

    apply_env_overrides(&mut config)?;
    config.validate().context("invalid scoring configuration")?;

    Ok(config)
}

fn parse_config_file(path: &Path) -> Result<ScoringConfig> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config: {}", path.display()))?;
    toml::from_str::<ScoringConfig>(&content)
        .with_context(|| format!("failed to parse config: {}", path.display()))
}

fn apply_env_overrides(config: &mut ScoringConfig) -> Result<()> {
    if let Ok(raw) = std::env::var("EQSCORE_PARALLELISM") {
        config.parallelism = raw
            .trim()
            .parse()
            .with_context(|| format!("EQSCORE_PARALLELISM is not a number: '{raw}'"))?;
    }
    if let Ok(dir) = std::env::var("EQSCORE_OUTPUT_DIR") {
        config.output_dir = PathBuf::from(dir);
    }
    Ok(())
}

fn dirs_path() -> Option<PathBuf> {
    std::env::var("HOME")
        .ok()
        .map(|h| PathBuf::from(h).join(".config").join("eqscore"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rating::BandDirection;

    #[test]
    fn default_config() {
        let config = ScoringConfig::default();
        assert_eq!(config.parallelism, 4);
        assert_eq!(config.eq_rating.fallback, "Low");
        assert_eq!(config.inconsistency_rating.direction, BandDirection::AtMost);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn partial_config_keeps_defaults() {
        let toml_str = r#"
parallelism = 8

[eq_rating]
direction = "at_least"
fallback = "Emerging"

[[eq_rating.bands]]
bound = 75.0
label = "Advanced"
"#;
        let config: ScoringConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.parallelism, 8);
        assert_eq!(config.eq_rating.classify(80.0), "Advanced");
        assert_eq!(config.eq_rating.classify(50.0), "Emerging");
        assert_eq!(config.inconsistency_rating, RatingTable::inconsistency_default());
    }

    #[test]
    fn load_explicit_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("eqscore.toml");
        std::fs::write(&path, "output_dir = \"out\"\n").unwrap();

        let config = parse_config_file(&path).unwrap();
        assert_eq!(config.output_dir, PathBuf::from("out"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn missing_explicit_file_is_an_error() {
        let err = load_config_from(Some(Path::new("/nonexistent/eqscore.toml"))).unwrap_err();
        assert!(err.to_string().contains("config file not found"));
    }

    #[test]
    fn zero_parallelism_rejected() {
        let config = ScoringConfig {
            parallelism: 0,
            ..Default::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::ZeroParallelism));
    }
}
