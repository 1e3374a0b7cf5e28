//! Rolloff (apodization) correction for the gridding kernel.
//!
//! The correction image is the reciprocal of the kernel's spatial response at
//! every output cell. The response is separable, so it is computed as one
//! profile per axis and multiplied out. Profiles are normalized to 1 at the
//! centre cell and the product is clamped from below at a fraction of its peak
//! before inversion, so the centre correction is exactly 1 and no division by
//! zero can occur.
//!
//! Cell `i` on axis `a` sits at image position `(i - n_a / 2) / n_fov` cycles
//! per grid cell, where `n_fov` is the axis extent, or the largest extent in
//! isotropic mode.

use std::f64::consts::PI;

use num_complex::{Complex32, Complex64};
use num_traits::Zero;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::config::FovMode;
use crate::error::{GriddingError, Result};
use crate::kernel::KaiserBessel;
use crate::mapping::IndexMap;
use crate::types::{ComplexGrid, GridSpacing, Shape, MAX_RANK};

/// The fixed reference the correction is derived from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RolloffReference {
    /// A unit sample with unit weight at coordinate 0, gridded through the
    /// scatter footprint and transformed by a direct sum over its taps.
    #[default]
    Impulse,
    /// The closed-form Fourier transform of the Kaiser-Bessel window.
    Analytic,
}

/// Compute the rolloff correction for a grid of `shape`.
pub fn rolloff(
    kernel: &KaiserBessel,
    reference: RolloffReference,
    shape: &Shape,
    fov: FovMode,
    clamp_percent: f64,
) -> Result<ComplexGrid> {
    shape.check_grid()?;
    if !(clamp_percent > 0.0 && clamp_percent <= 100.0) {
        return Err(GriddingError::invalid_config(format!(
            "rolloff clamp percent {} outside (0, 100]",
            clamp_percent
        )));
    }

    let dims = shape.dims();
    let largest = dims.iter().copied().max().unwrap_or(1);
    let fov_extent: Vec<f64> = dims
        .iter()
        .map(|&n| match fov {
            FovMode::Isotropic => largest as f64,
            FovMode::Anisotropic => n as f64,
        })
        .collect();

    let profiles = match reference {
        RolloffReference::Analytic => analytic_profiles(kernel, dims, &fov_extent),
        RolloffReference::Impulse => impulse_profiles(kernel, shape, &fov_extent)?,
    };

    let peak: f64 = profiles
        .iter()
        .map(|p| p.iter().copied().fold(0.0, f64::max))
        .product();
    let floor = (peak * clamp_percent / 100.0).max(f64::MIN_POSITIVE);

    let mut out = ComplexGrid::zeros(shape.clone());
    let row_len = dims[0];
    out.as_mut_slice()
        .par_chunks_mut(row_len)
        .enumerate()
        .for_each(|(row, cells)| {
            // Decode the indices of axes 1.. from the row number.
            let mut outer = 1.0f64;
            let mut rest = row;
            for (a, profile) in profiles.iter().enumerate().skip(1) {
                outer *= profile[rest % dims[a]];
                rest /= dims[a];
            }
            for (cell, &x) in cells.iter_mut().zip(&profiles[0]) {
                let response = (x * outer).max(floor);
                *cell = Complex32::new((1.0 / response) as f32, 0.0);
            }
        });

    tracing::debug!(
        dims = ?dims,
        fov = ?fov,
        reference = ?reference,
        clamp_percent,
        "Computed rolloff correction"
    );

    Ok(out)
}

/// Image position of every cell on an axis.
fn positions(n: usize, fov_extent: f64) -> impl Iterator<Item = f64> {
    let center = (n / 2) as f64;
    (0..n).map(move |i| (i as f64 - center) / fov_extent)
}

fn analytic_profiles(kernel: &KaiserBessel, dims: &[usize], fov_extent: &[f64]) -> Vec<Vec<f64>> {
    dims.iter()
        .zip(fov_extent)
        .map(|(&n, &fov)| {
            positions(n, fov)
                .map(|x| kernel.apodization(x).abs())
                .collect()
        })
        .collect()
}

/// Per-axis response of a unit impulse gridded at coordinate 0.
///
/// The impulse footprint is separable and its centre tap is `K(0) = 1`, so
/// the taps of each axis window are exactly the gridded impulse along the line
/// through the centre cell.
fn impulse_profiles(
    kernel: &KaiserBessel,
    shape: &Shape,
    fov_extent: &[f64],
) -> Result<Vec<Vec<f64>>> {
    let map = IndexMap::new(kernel, shape, &GridSpacing::unit(shape.rank()))?;
    let origin = [0.0f32; MAX_RANK];
    let footprint = map
        .footprint(&origin[..shape.rank()])
        .ok_or_else(|| GriddingError::invalid_config("impulse footprint misses the grid"))?;

    let profiles = shape
        .dims()
        .iter()
        .zip(fov_extent)
        .enumerate()
        .map(|(a, (&n, &fov))| {
            let window = footprint.axis(a);
            let center = (n / 2) as f64;
            let raw: Vec<f64> = positions(n, fov)
                .map(|x| {
                    let mut sum = Complex64::zero();
                    for t in 0..window.len {
                        let offset = (window.start + t) as f64 - center;
                        let phase = -2.0 * PI * offset * x;
                        sum += Complex64::from_polar(window.taps[t] as f64, phase);
                    }
                    sum.norm()
                })
                .collect();
            let dc = raw[n / 2];
            raw.into_iter().map(|v| v / dc).collect()
        })
        .collect();

    Ok(profiles)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn center_value(grid: &ComplexGrid) -> Complex32 {
        grid.get(&grid.shape().center()).unwrap()
    }

    #[test]
    fn test_center_is_one() {
        let kernel = KaiserBessel::shared();
        for reference in [RolloffReference::Impulse, RolloffReference::Analytic] {
            let shape = Shape::new(vec![32, 24]);
            let out = rolloff(&kernel, reference, &shape, FovMode::Anisotropic, 5.0).unwrap();
            assert_eq!(center_value(&out), Complex32::new(1.0, 0.0));
        }
    }

    #[test]
    fn test_correction_grows_towards_edges() {
        let kernel = KaiserBessel::shared();
        for reference in [RolloffReference::Impulse, RolloffReference::Analytic] {
            let shape = Shape::new(vec![32]);
            let out = rolloff(&kernel, reference, &shape, FovMode::Anisotropic, 5.0).unwrap();
            let values: Vec<f32> = out.as_slice().iter().map(|v| v.re).collect();
            for i in 16..31 {
                assert!(values[i + 1] > values[i], "{:?} not increasing at {}", reference, i);
            }
            for i in 1..16 {
                assert!(values[i - 1] > values[i], "{:?} not decreasing at {}", reference, i);
            }
            assert!(out.as_slice().iter().all(|v| v.im == 0.0));
        }
    }

    #[test]
    fn test_clamp_limits_correction() {
        let kernel = KaiserBessel::shared();
        let shape = Shape::new(vec![16, 16]);
        let out = rolloff(&kernel, RolloffReference::Analytic, &shape, FovMode::Anisotropic, 50.0)
            .unwrap();
        let max = out.as_slice().iter().map(|v| v.re).fold(0.0f32, f32::max);
        assert!((max - 2.0).abs() < 1e-6);
        assert!(out.as_slice().iter().all(|v| v.re >= 1.0 && v.re <= 2.0 + 1e-6));
    }

    #[test]
    fn test_rejects_bad_clamp() {
        let kernel = KaiserBessel::shared();
        let shape = Shape::new(vec![8, 8]);
        assert!(rolloff(&kernel, RolloffReference::Analytic, &shape, FovMode::Isotropic, 0.0).is_err());
        assert!(rolloff(&kernel, RolloffReference::Analytic, &shape, FovMode::Isotropic, 120.0).is_err());
    }
}
