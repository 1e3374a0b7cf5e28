//! Kaiser-Bessel convolution kernel.
//!
//! The window is
//!
//! ```text
//! K(d) = I0(beta * sqrt(1 - (d / R)^2)) / I0(beta)    for |d| < R
//! K(d) = 0                                            otherwise
//! ```
//!
//! with a full width of `KERNEL_WIDTH` grid cells (`R = KERNEL_RADIUS`) and
//! the shape parameter `beta` chosen from the oversampling ratio following
//! Beatty, Nishimura & Pauly, "Rapid gridding reconstruction with a minimal
//! oversampling ratio", IEEE TMI 24(6), 2005. The peak value is 1.
//!
//! Evaluation goes through a lookup table sampled over `[0, R]` with linear
//! interpolation. The default table is built once per process and shared.

use std::f64::consts::PI;
use std::sync::{Arc, OnceLock};

use crate::error::{GriddingError, Result};

/// Full kernel width in grid cells.
pub const KERNEL_WIDTH: f64 = 4.0;

/// Support radius in grid cells. `K(d) == 0` for `|d| >= KERNEL_RADIUS`.
pub const KERNEL_RADIUS: f64 = KERNEL_WIDTH / 2.0;

/// Most cells a footprint can touch along one axis.
pub const MAX_TAPS: usize = KERNEL_WIDTH as usize;

/// Oversampling ratio used for the shared kernel.
pub const DEFAULT_OVERSAMPLING_RATIO: f64 = 2.0;

/// Lookup table entries for the shared kernel.
pub const DEFAULT_TABLE_SIZE: usize = 800;

/// Accepted range for the oversampling ratio.
pub const OVERSAMPLING_RANGE: (f64, f64) = (1.0, 4.0);

static SHARED_KERNEL: OnceLock<Arc<KaiserBessel>> = OnceLock::new();

/// Modified Bessel function of the first kind, order zero.
pub fn bessel_i0(x: f64) -> f64 {
    let q = 0.25 * x * x;
    let mut term = 1.0;
    let mut sum = 1.0;
    let mut k = 1.0;
    loop {
        term *= q / (k * k);
        sum += term;
        if term < sum * 1e-17 {
            return sum;
        }
        k += 1.0;
    }
}

/// Kaiser-Bessel shape parameter for a kernel `width` and oversampling `ratio`.
pub fn kaiser_bessel_beta(width: f64, ratio: f64) -> f64 {
    let w = width / ratio;
    let h = ratio - 0.5;
    PI * (w * w * h * h - 0.8).sqrt()
}

/// Tabulated Kaiser-Bessel window.
#[derive(Debug, Clone)]
pub struct KaiserBessel {
    beta: f64,
    oversampling_ratio: f64,
    i0_beta: f64,
    table: Vec<f32>,
    /// Table entries per grid cell.
    table_scale: f32,
}

impl KaiserBessel {
    /// Build a kernel for an oversampling ratio with `table_size` entries.
    pub fn new(oversampling_ratio: f64, table_size: usize) -> Result<Self> {
        let (lo, hi) = OVERSAMPLING_RANGE;
        if !(lo..=hi).contains(&oversampling_ratio) {
            return Err(GriddingError::invalid_config(format!(
                "oversampling ratio {} outside [{}, {}]",
                oversampling_ratio, lo, hi
            )));
        }
        if table_size < 2 {
            return Err(GriddingError::invalid_config(format!(
                "kernel table needs at least 2 entries, got {}",
                table_size
            )));
        }

        let beta = kaiser_bessel_beta(KERNEL_WIDTH, oversampling_ratio);
        if !beta.is_finite() || beta <= 0.0 {
            return Err(GriddingError::invalid_config(format!(
                "degenerate Kaiser-Bessel beta {} for ratio {}",
                beta, oversampling_ratio
            )));
        }
        let i0_beta = bessel_i0(beta);

        // The last entry holds the limit at R so interpolation stays accurate
        // right up to the support edge; evaluate() cuts off at R itself.
        let step = KERNEL_RADIUS / (table_size - 1) as f64;
        let table = (0..table_size)
            .map(|i| window(beta, i0_beta, i as f64 * step) as f32)
            .collect();

        Ok(Self {
            beta,
            oversampling_ratio,
            i0_beta,
            table,
            table_scale: ((table_size - 1) as f64 / KERNEL_RADIUS) as f32,
        })
    }

    /// The process-wide default kernel.
    pub fn shared() -> Arc<KaiserBessel> {
        SHARED_KERNEL
            .get_or_init(|| {
                let kernel = Self::new(DEFAULT_OVERSAMPLING_RATIO, DEFAULT_TABLE_SIZE)
                    .expect("default kernel parameters are valid");
                tracing::debug!(
                    beta = kernel.beta,
                    oversampling_ratio = kernel.oversampling_ratio,
                    table_size = kernel.table.len(),
                    "Built shared Kaiser-Bessel table"
                );
                Arc::new(kernel)
            })
            .clone()
    }

    pub fn beta(&self) -> f64 {
        self.beta
    }

    pub fn oversampling_ratio(&self) -> f64 {
        self.oversampling_ratio
    }

    pub fn table_size(&self) -> usize {
        self.table.len()
    }

    /// Support radius in grid cells.
    pub fn radius(&self) -> f32 {
        KERNEL_RADIUS as f32
    }

    /// Closed-form window value, for checking the table.
    pub fn exact(&self, distance: f64) -> f64 {
        if distance.abs() >= KERNEL_RADIUS {
            return 0.0;
        }
        window(self.beta, self.i0_beta, distance)
    }

    /// Window value at `distance` grid cells, from the table.
    #[inline]
    pub fn evaluate(&self, distance: f32) -> f32 {
        let d = distance.abs();
        if d.is_nan() || d >= KERNEL_RADIUS as f32 {
            return 0.0;
        }
        let t = d * self.table_scale;
        let i = t as usize;
        let last = self.table.len() - 1;
        if i >= last {
            return self.table[last];
        }
        let frac = t - i as f32;
        self.table[i] + (self.table[i + 1] - self.table[i]) * frac
    }

    /// Separable product of the window over every axis offset.
    pub fn evaluate_separable(&self, offsets: &[f32]) -> f32 {
        offsets.iter().map(|&d| self.evaluate(d)).product()
    }

    /// Continuous Fourier transform of the window at image position `x`
    /// (cycles per grid cell), normalized to 1 at `x = 0`.
    pub fn apodization(&self, x: f64) -> f64 {
        sinc_like(PI * KERNEL_WIDTH * x, self.beta) / sinc_like(0.0, self.beta)
    }
}

/// Untruncated window `I0(beta * sqrt(1 - (d/R)^2)) / I0(beta)`.
fn window(beta: f64, i0_beta: f64, distance: f64) -> f64 {
    let r = (distance / KERNEL_RADIUS).min(1.0);
    bessel_i0(beta * (1.0 - r * r).sqrt()) / i0_beta
}

/// `sin(sqrt(a^2 - b^2)) / sqrt(a^2 - b^2)`, continued through `sinh` when
/// the radicand is negative.
fn sinc_like(a: f64, b: f64) -> f64 {
    let radicand = a * a - b * b;
    let z = radicand.abs().sqrt();
    if z < 1e-8 {
        1.0
    } else if radicand > 0.0 {
        z.sin() / z
    } else {
        z.sinh() / z
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bessel_i0_known_values() {
        assert_eq!(bessel_i0(0.0), 1.0);
        assert!((bessel_i0(1.0) - 1.266_065_877_752_008_4).abs() < 1e-12);
        assert!((bessel_i0(5.0) - 27.239_871_823_604_442).abs() < 1e-9);
        assert!((bessel_i0(-2.0) - bessel_i0(2.0)).abs() < 1e-15);
    }

    #[test]
    fn test_beatty_beta() {
        // alpha = 2, W = 4: pi * sqrt(4 * 2.25 - 0.8)
        let beta = kaiser_bessel_beta(4.0, 2.0);
        assert!((beta - PI * 8.2f64.sqrt()).abs() < 1e-12);
    }

    #[test]
    fn test_peak_and_cutoff() {
        let kernel = KaiserBessel::shared();
        assert_eq!(kernel.evaluate(0.0), 1.0);
        assert_eq!(kernel.evaluate(2.0), 0.0);
        assert_eq!(kernel.evaluate(-2.0), 0.0);
        assert_eq!(kernel.evaluate(7.5), 0.0);
        assert_eq!(kernel.evaluate(f32::NAN), 0.0);
        assert!(kernel.evaluate(1.999) > 0.0);
    }

    #[test]
    fn test_symmetry() {
        let kernel = KaiserBessel::shared();
        for i in 0..400 {
            let d = i as f32 * 0.005;
            assert_eq!(kernel.evaluate(d), kernel.evaluate(-d));
        }
    }

    #[test]
    fn test_table_matches_closed_form() {
        let kernel = KaiserBessel::shared();
        let mut max_err = 0.0f64;
        for i in 0..=2000 {
            let d = i as f64 * 0.001;
            let err = (kernel.evaluate(d as f32) as f64 - kernel.exact(d)).abs();
            max_err = max_err.max(err);
        }
        assert!(max_err < 1e-4, "max table error {}", max_err);
    }

    #[test]
    fn test_monotonic_decay() {
        let kernel = KaiserBessel::shared();
        let mut prev = kernel.evaluate(0.0);
        for i in 1..200 {
            let v = kernel.evaluate(i as f32 * 0.01);
            assert!(v <= prev);
            prev = v;
        }
    }

    #[test]
    fn test_separable_product() {
        let kernel = KaiserBessel::shared();
        let product = kernel.evaluate_separable(&[0.5, -1.25]);
        let expected = kernel.evaluate(0.5) * kernel.evaluate(1.25);
        assert!((product - expected).abs() < 1e-7);
        assert_eq!(kernel.evaluate_separable(&[0.5, 3.0]), 0.0);
    }

    #[test]
    fn test_apodization_is_positive_and_decreasing() {
        let kernel = KaiserBessel::shared();
        assert!((kernel.apodization(0.0) - 1.0).abs() < 1e-12);
        let mut prev = 1.0;
        for i in 1..=50 {
            let v = kernel.apodization(i as f64 * 0.01);
            assert!(v > 0.0 && v < prev);
            prev = v;
        }
        assert!((kernel.apodization(0.3) - kernel.apodization(-0.3)).abs() < 1e-12);
    }

    #[test]
    fn test_rejects_bad_parameters() {
        assert!(KaiserBessel::new(0.5, 800).is_err());
        assert!(KaiserBessel::new(8.0, 800).is_err());
        assert!(KaiserBessel::new(2.0, 1).is_err());
        assert!(KaiserBessel::new(f64::NAN, 800).is_err());
    }

    #[test]
    fn test_custom_ratio_changes_beta() {
        let a = KaiserBessel::new(1.375, 800).unwrap();
        let b = KaiserBessel::new(2.0, 800).unwrap();
        assert!(a.beta() < b.beta());
        assert_eq!(a.table_size(), 800);
    }
}
