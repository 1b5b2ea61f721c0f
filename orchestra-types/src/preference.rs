//! Caller-supplied trade-off parameters.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Invalid preference values.
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PreferenceError {
    /// A scalar was NaN or outside `[0, 1]`.
    #[error("{field} must be within [0, 1], got {value}")]
    OutOfRange {
        /// Which preference was rejected.
        field: &'static str,
        /// The rejected value.
        value: f64,
    },
}

/// Budget, privacy, speed and quality preferences for one query.
///
/// Fields are private so a vector can only be built through
/// [`PreferenceVector::new`], which rejects values outside `[0, 1]`.
/// Once built it is never mutated.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawPreferences")]
pub struct PreferenceVector {
    budget: f64,
    privacy: bool,
    speed: f64,
    quality: f64,
}

#[derive(Deserialize)]
struct RawPreferences {
    #[serde(default = "half")]
    budget: f64,
    #[serde(default)]
    privacy: bool,
    #[serde(default = "half")]
    speed: f64,
    #[serde(default = "half")]
    quality: f64,
}

fn half() -> f64 {
    0.5
}

impl TryFrom<RawPreferences> for PreferenceVector {
    type Error = PreferenceError;

    fn try_from(raw: RawPreferences) -> Result<Self, Self::Error> {
        PreferenceVector::new(raw.budget, raw.privacy, raw.speed, raw.quality)
    }
}

fn check(field: &'static str, value: f64) -> Result<f64, PreferenceError> {
    if (0.0..=1.0).contains(&value) {
        Ok(value)
    } else {
        Err(PreferenceError::OutOfRange { field, value })
    }
}

impl PreferenceVector {
    /// Build a preference vector, validating every scalar.
    ///
    /// `budget` runs from 0 (minimize cost) to 1 (quality regardless of
    /// cost). `privacy = true` forbids external tools and models.
    pub fn new(budget: f64, privacy: bool, speed: f64, quality: f64) -> Result<Self, PreferenceError> {
        Ok(Self {
            budget: check("budget", budget)?,
            privacy,
            speed: check("speed", speed)?,
            quality: check("quality", quality)?,
        })
    }

    /// Budget preference in `[0, 1]`.
    pub fn budget(&self) -> f64 {
        self.budget
    }

    /// Whether only local tools may be used.
    pub fn privacy(&self) -> bool {
        self.privacy
    }

    /// Speed preference in `[0, 1]`.
    pub fn speed(&self) -> f64 {
        self.speed
    }

    /// Quality preference in `[0, 1]`.
    pub fn quality(&self) -> f64 {
        self.quality
    }
}

impl Default for PreferenceVector {
    fn default() -> Self {
        Self {
            budget: 0.5,
            privacy: false,
            speed: 0.5,
            quality: 0.5,
        }
    }
}
