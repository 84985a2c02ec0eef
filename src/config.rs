//! Training configuration.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Hyperparameters for a [`crate::TrainingSession`].
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrainerConfig {
    /// Initial learning rate.
    pub learning_rate: f64,
    /// Per-example multiplicative decay; a batch of `m` applies `decay^m`.
    pub learning_rate_decay: f64,
    /// The learning rate never decays below this.
    pub learning_rate_min: f64,
    /// Examples accumulated before a training step runs.
    pub batch_size: usize,
    /// Roughly how many examples pass between progress log lines.
    pub log_every_examples: usize,
}

impl Default for TrainerConfig {
    fn default() -> Self {
        Self {
            learning_rate: 0.1,
            learning_rate_decay: 0.999_995,
            learning_rate_min: 0.001,
            batch_size: 32,
            log_every_examples: 2_000_000,
        }
    }
}

impl TrainerConfig {
    pub fn validate(&self) -> Result<()> {
        if !(self.learning_rate.is_finite() && self.learning_rate > 0.0) {
            return Err(Error::InvalidConfig(format!(
                "learning_rate must be finite and > 0, got {}",
                self.learning_rate
            )));
        }
        if !(self.learning_rate_decay.is_finite()
            && self.learning_rate_decay > 0.0
            && self.learning_rate_decay <= 1.0)
        {
            return Err(Error::InvalidConfig(format!(
                "learning_rate_decay must be in (0, 1], got {}",
                self.learning_rate_decay
            )));
        }
        if !(self.learning_rate_min.is_finite() && self.learning_rate_min > 0.0) {
            return Err(Error::InvalidConfig(format!(
                "learning_rate_min must be finite and > 0, got {}",
                self.learning_rate_min
            )));
        }
        if self.learning_rate_min > self.learning_rate {
            return Err(Error::InvalidConfig(format!(
                "learning_rate_min {} exceeds learning_rate {}",
                self.learning_rate_min, self.learning_rate
            )));
        }
        if self.batch_size == 0 {
            return Err(Error::InvalidConfig("batch_size must be > 0".to_owned()));
        }
        Ok(())
    }

    /// Number of epochs between log lines for this batch size.
    #[inline]
    pub fn log_interval(&self) -> u64 {
        (self.log_every_examples / self.batch_size.max(1)).max(1) as u64
    }

    /// Learning rate after one step on `batch` examples.
    #[inline]
    pub fn decayed(&self, learning_rate: f64, batch: usize) -> f64 {
        let exp = i32::try_from(batch).unwrap_or(i32::MAX);
        (learning_rate * self.learning_rate_decay.powi(exp)).max(self.learning_rate_min)
    }
}

#[cfg(feature = "serde")]
impl TrainerConfig {
    /// Parses a config from JSON; missing fields take their defaults.
    pub fn from_json_str(s: &str) -> Result<Self> {
        let cfg: Self = serde_json::from_str(s)
            .map_err(|e| Error::InvalidConfig(format!("failed to parse trainer config: {e}")))?;
        cfg.validate()?;
        Ok(cfg)
    }
}

/// Settings for a [`crate::BackgroundTrainer`].
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BackgroundConfig {
    /// Ticks the worker runs between snapshot publications.
    pub ticks_per_check: usize,
}

impl Default for BackgroundConfig {
    fn default() -> Self {
        Self {
            ticks_per_check: 100,
        }
    }
}

impl BackgroundConfig {
    pub fn validate(&self) -> Result<()> {
        if self.ticks_per_check == 0 {
            return Err(Error::InvalidConfig(
                "ticks_per_check must be > 0".to_owned(),
            ));
        }
        Ok(())
    }
}

#[cfg(feature = "serde")]
impl BackgroundConfig {
    pub fn from_json_str(s: &str) -> Result<Self> {
        let cfg: Self = serde_json::from_str(s).map_err(|e| {
            Error::InvalidConfig(format!("failed to parse background config: {e}"))
        })?;
        cfg.validate()?;
        Ok(cfg)
    }
}
