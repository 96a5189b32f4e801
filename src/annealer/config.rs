//! Annealer configuration.

use serde::{Deserialize, Serialize};

use crate::divergence::DivergenceKind;
use crate::error::{SynthError, SynthResult};

/// Configuration for the per-area annealer.
///
/// Field names serialize in the camelCase form of the legacy JSON
/// configuration document, so existing config files deserialize
/// directly.
///
/// # Defaults
///
/// ```
/// use synthpop::annealer::AnnealerConfig;
///
/// let config = AnnealerConfig::default();
/// assert_eq!(config.window_size, 1000);
/// assert!(config.validate().is_ok());
/// ```
///
/// # Builder Pattern
///
/// ```
/// use synthpop::annealer::AnnealerConfig;
/// use synthpop::divergence::DivergenceKind;
///
/// let config = AnnealerConfig::default()
///     .with_distance(DivergenceKind::Euclidean)
///     .with_max_iterations(100_000)
///     .with_seed(42);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AnnealerConfig {
    /// Starting temperature.
    ///
    /// Higher values accept more worsening moves early on.
    pub initial_temp: f64,

    /// Termination floor: the anneal stops once the temperature cools
    /// to this value or below.
    pub min_temp: f64,

    /// Multiplicative per-iteration temperature decay, in (0, 1).
    pub cooling_rate: f64,

    /// Multiplicative temperature boost applied on stagnation.
    pub reheat_factor: f64,

    /// Early exit once the best fitness reaches this value or below.
    pub fitness_threshold: f64,

    /// Relative window-range threshold below which the search counts
    /// as stagnated. A range below one tenth of this terminates the
    /// anneal outright.
    pub min_improvement: f64,

    /// Hard cap on annealing iterations per area.
    pub max_iterations: usize,

    /// Length of the rolling fitness window used for stagnation
    /// detection.
    pub window_size: usize,

    /// Budget of non-accepted proposals before the anneal gives up.
    pub change: usize,

    /// Divergence driving both acceptance and stagnation detection.
    pub distance: DivergenceKind,

    /// Master seed for deterministic runs. `None` seeds from OS
    /// entropy.
    #[serde(rename = "randomSeed")]
    pub seed: Option<u64>,
}

impl Default for AnnealerConfig {
    fn default() -> Self {
        Self {
            initial_temp: 5000.0,
            min_temp: 1e-5,
            cooling_rate: 0.999,
            reheat_factor: 0.8,
            fitness_threshold: 0.001,
            min_improvement: 1e-4,
            max_iterations: 5_000_000,
            window_size: 1000,
            change: 100_000,
            distance: DivergenceKind::KlDivergence,
            seed: None,
        }
    }
}

impl AnnealerConfig {
    pub fn with_initial_temp(mut self, t: f64) -> Self {
        self.initial_temp = t;
        self
    }

    pub fn with_min_temp(mut self, t: f64) -> Self {
        self.min_temp = t;
        self
    }

    pub fn with_cooling_rate(mut self, rate: f64) -> Self {
        self.cooling_rate = rate;
        self
    }

    pub fn with_reheat_factor(mut self, factor: f64) -> Self {
        self.reheat_factor = factor;
        self
    }

    pub fn with_fitness_threshold(mut self, threshold: f64) -> Self {
        self.fitness_threshold = threshold;
        self
    }

    pub fn with_min_improvement(mut self, improvement: f64) -> Self {
        self.min_improvement = improvement;
        self
    }

    pub fn with_max_iterations(mut self, n: usize) -> Self {
        self.max_iterations = n;
        self
    }

    pub fn with_window_size(mut self, w: usize) -> Self {
        self.window_size = w;
        self
    }

    pub fn with_change(mut self, budget: usize) -> Self {
        self.change = budget;
        self
    }

    pub fn with_distance(mut self, distance: DivergenceKind) -> Self {
        self.distance = distance;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Validates the configuration.
    ///
    /// Surfaced before any anneal starts; a failure here is fatal for
    /// the whole run.
    pub fn validate(&self) -> SynthResult<()> {
        if !self.initial_temp.is_finite() || self.initial_temp <= 0.0 {
            return Err(invalid(format!(
                "initialTemp must be positive and finite, got {}",
                self.initial_temp
            )));
        }
        if !self.min_temp.is_finite() || self.min_temp <= 0.0 {
            return Err(invalid(format!(
                "minTemp must be positive and finite, got {}",
                self.min_temp
            )));
        }
        if self.min_temp >= self.initial_temp {
            return Err(invalid(format!(
                "minTemp ({}) must be less than initialTemp ({})",
                self.min_temp, self.initial_temp
            )));
        }
        if !self.cooling_rate.is_finite() || self.cooling_rate <= 0.0 || self.cooling_rate >= 1.0 {
            return Err(invalid(format!(
                "coolingRate must be in (0, 1), got {}",
                self.cooling_rate
            )));
        }
        if !self.reheat_factor.is_finite() || self.reheat_factor <= 0.0 {
            return Err(invalid(format!(
                "reheatFactor must be positive and finite, got {}",
                self.reheat_factor
            )));
        }
        if !self.fitness_threshold.is_finite() || self.fitness_threshold < 0.0 {
            return Err(invalid(format!(
                "fitnessThreshold must be non-negative and finite, got {}",
                self.fitness_threshold
            )));
        }
        if !self.min_improvement.is_finite() || self.min_improvement <= 0.0 {
            return Err(invalid(format!(
                "minImprovement must be positive and finite, got {}",
                self.min_improvement
            )));
        }
        if self.max_iterations == 0 {
            return Err(invalid("maxIterations must be positive".into()));
        }
        if self.window_size == 0 {
            return Err(invalid("windowSize must be positive".into()));
        }
        if self.change == 0 {
            return Err(invalid("change budget must be positive".into()));
        }
        Ok(())
    }
}

fn invalid(message: String) -> SynthError {
    SynthError::Configuration(message)
}
