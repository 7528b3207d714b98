//! Mapping from icon distance to a 0-5 confidence score.

use crate::error::ConfigError;
use std::fmt;
use std::str::FromStr;

/// Strictly increasing distance cut-offs for confidence 5 down to 1.
///
/// A mean distance below `cutoffs[0]` scores 5, below `cutoffs[1]` scores 4,
/// and so on; anything at or above `cutoffs[4]` scores 0.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConfidenceThresholds {
    cutoffs: [f64; 5],
}

impl ConfidenceThresholds {
    pub fn new(cutoffs: [f64; 5]) -> Result<Self, ConfigError> {
        let valid = cutoffs.iter().all(|c| c.is_finite() && *c > 0.0)
            && cutoffs.windows(2).all(|w| w[0] < w[1]);
        if !valid {
            return Err(ConfigError::InvalidThresholds {
                values: cutoffs.to_vec(),
            });
        }
        Ok(Self { cutoffs })
    }

    pub fn cutoffs(&self) -> [f64; 5] {
        self.cutoffs
    }

    /// Score a mean icon distance.
    ///
    /// Non-decreasing distance never raises the score. NaN scores 0.
    pub fn confidence(&self, mean_distance: f64) -> u8 {
        let mut score = 5u8;
        for cutoff in self.cutoffs {
            if mean_distance < cutoff {
                return score;
            }
            score -= 1;
        }
        0
    }
}

impl Default for ConfidenceThresholds {
    fn default() -> Self {
        Self {
            cutoffs: [2000.0, 5000.0, 8000.0, 11000.0, 14000.0],
        }
    }
}

impl fmt::Display for ConfidenceThresholds {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.cutoffs.iter().map(|c| c.to_string()).collect();
        write!(f, "{}", parts.join(","))
    }
}

/// Parses five comma-separated numbers, e.g. `2000,5000,8000,11000,14000`
impl FromStr for ConfidenceThresholds {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let values: Vec<f64> = s
            .split(',')
            .map(|part| part.trim().parse::<f64>().unwrap_or(f64::NAN))
            .collect();

        let cutoffs: [f64; 5] = values
            .clone()
            .try_into()
            .map_err(|_| ConfigError::InvalidThresholds { values })?;
        Self::new(cutoffs)
    }
}
