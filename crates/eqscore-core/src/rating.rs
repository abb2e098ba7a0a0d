//! Qualitative rating tables.
//!
//! A table is an ordered list of `(bound, label)` bands checked from the top
//! down; the first band whose bound the value satisfies wins, otherwise the
//! fallback label applies.

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// How a band bound is compared against the value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BandDirection {
    /// Band matches when `value >= bound`. Bands are listed highest first.
    AtLeast,
    /// Band matches when `value <= bound`. Bands are listed lowest first.
    AtMost,
}

/// A single `(bound, label)` entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RatingBand {
    pub bound: f64,
    pub label: String,
}

impl RatingBand {
    fn new(bound: f64, label: &str) -> Self {
        Self {
            bound,
            label: label.to_string(),
        }
    }
}

/// Maps a numeric score onto a qualitative label.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RatingTable {
    pub direction: BandDirection,
    pub bands: Vec<RatingBand>,
    /// Label used when no band matches.
    pub fallback: String,
}

impl RatingTable {
    /// Overall EQ rating: higher scores are better.
    pub fn eq_default() -> Self {
        Self {
            direction: BandDirection::AtLeast,
            bands: vec![
                RatingBand::new(80.0, "Very High"),
                RatingBand::new(65.0, "High"),
                RatingBand::new(45.0, "Average"),
                RatingBand::new(30.0, "Below Average"),
            ],
            fallback: "Low".to_string(),
        }
    }

    /// Inconsistency rating: lower indices are better.
    pub fn inconsistency_default() -> Self {
        Self {
            direction: BandDirection::AtMost,
            bands: vec![
                RatingBand::new(10.0, "Excellent"),
                RatingBand::new(25.0, "Good"),
                RatingBand::new(45.0, "Moderate"),
            ],
            fallback: "Poor".to_string(),
        }
    }

    /// Label for `value`.
    pub fn classify(&self, value: f64) -> &str {
        self.bands
            .iter()
            .find(|band| match self.direction {
                BandDirection::AtLeast => value >= band.bound,
                BandDirection::AtMost => value <= band.bound,
            })
            .map(|band| band.label.as_str())
            .unwrap_or(&self.fallback)
    }

    /// The most favourable label (first band, or the fallback for an empty table).
    pub fn best_label(&self) -> &str {
        self.bands
            .first()
            .map(|band| band.label.as_str())
            .unwrap_or(&self.fallback)
    }

    /// The least favourable label.
    pub fn worst_label(&self) -> &str {
        &self.fallback
    }

    /// Check that labels are present and bounds are finite and strictly
    /// ordered in the evaluation direction.
    pub fn validate(&self, table: &str) -> Result<(), ConfigError> {
        if self.fallback.trim().is_empty() {
            return Err(ConfigError::EmptyLabel {
                table: table.to_string(),
            });
        }

        let mut previous: Option<f64> = None;
        for band in &self.bands {
            if band.label.trim().is_empty() {
                return Err(ConfigError::EmptyLabel {
                    table: table.to_string(),
                });
            }
            if !band.bound.is_finite() {
                return Err(ConfigError::NonFiniteBound {
                    table: table.to_string(),
                    label: band.label.clone(),
                });
            }
            if let Some(prev) = previous {
                let ordered = match self.direction {
                    BandDirection::AtLeast => band.bound < prev,
                    BandDirection::AtMost => band.bound > prev,
                };
                if !ordered {
                    return Err(ConfigError::UnorderedBands {
                        table: table.to_string(),
                        label: band.label.clone(),
                    });
                }
            }
            previous = Some(band.bound);
        }

        Ok(())
    }
}
