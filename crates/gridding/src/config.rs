//! Configuration for the gridding engine.

use serde::{Deserialize, Serialize};

use crate::error::{GriddingError, Result};
use crate::kernel::{DEFAULT_OVERSAMPLING_RATIO, DEFAULT_TABLE_SIZE, OVERSAMPLING_RANGE};

/// Configuration for a [`Gridder`](crate::Gridder).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GriddingConfig {
    /// Oversampling ratio used to derive the Kaiser-Bessel shape parameter.
    pub oversampling_ratio: f64,

    /// Number of entries in the kernel lookup table.
    pub kernel_table_size: usize,

    /// Sample count at which grid and degrid switch to rayon.
    pub parallel_threshold: usize,

    /// Rolloff responses below this percentage of the peak are clamped.
    pub rolloff_clamp_percent: f64,
}

impl Default for GriddingConfig {
    fn default() -> Self {
        Self {
            oversampling_ratio: DEFAULT_OVERSAMPLING_RATIO,
            kernel_table_size: DEFAULT_TABLE_SIZE,
            parallel_threshold: 4096,
            rolloff_clamp_percent: 5.0,
        }
    }
}

impl GriddingConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(val) = std::env::var("GRIDDING_OVERSAMPLING_RATIO") {
            if let Ok(ratio) = val.parse() {
                config.oversampling_ratio = ratio;
            }
        }

        if let Ok(val) = std::env::var("GRIDDING_KERNEL_TABLE_SIZE") {
            if let Ok(size) = val.parse() {
                config.kernel_table_size = size;
            }
        }

        if let Ok(val) = std::env::var("GRIDDING_PARALLEL_THRESHOLD") {
            if let Ok(threshold) = val.parse() {
                config.parallel_threshold = threshold;
            }
        }

        if let Ok(val) = std::env::var("GRIDDING_ROLLOFF_CLAMP_PERCENT") {
            if let Ok(percent) = val.parse() {
                config.rolloff_clamp_percent = percent;
            }
        }

        config
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        let (lo, hi) = OVERSAMPLING_RANGE;
        if !(lo..=hi).contains(&self.oversampling_ratio) {
            return Err(GriddingError::invalid_config(format!(
                "oversampling_ratio must be in [{}, {}]",
                lo, hi
            )));
        }

        if self.kernel_table_size < 2 {
            return Err(GriddingError::invalid_config(
                "kernel_table_size must be >= 2",
            ));
        }

        if !(self.rolloff_clamp_percent > 0.0 && self.rolloff_clamp_percent <= 100.0) {
            return Err(GriddingError::invalid_config(
                "rolloff_clamp_percent must be in (0, 100]",
            ));
        }

        Ok(())
    }

    /// Whether this configuration describes the shared default kernel.
    pub(crate) fn uses_default_kernel(&self) -> bool {
        self.oversampling_ratio == DEFAULT_OVERSAMPLING_RATIO
            && self.kernel_table_size == DEFAULT_TABLE_SIZE
    }
}

/// Field-of-view mode for the rolloff correction (the `isofov` selector).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FovMode {
    /// Each axis uses its own extent as the field of view.
    #[default]
    Anisotropic,
    /// Every axis uses the largest extent, so pixels are square.
    Isotropic,
}

impl FovMode {
    /// The integer flag a binding layer passes.
    pub fn as_flag(&self) -> i64 {
        match self {
            Self::Anisotropic => 0,
            Self::Isotropic => 1,
        }
    }
}

impl TryFrom<i64> for FovMode {
    type Error = GriddingError;

    fn try_from(flag: i64) -> Result<Self> {
        match flag {
            0 => Ok(Self::Anisotropic),
            1 => Ok(Self::Isotropic),
            other => Err(GriddingError::UnsupportedFovMode(other)),
        }
    }
}
