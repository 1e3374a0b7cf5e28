//! Test data generators for synthetic non-Cartesian acquisitions.
//!
//! Coordinates are in cycles per field of view, normalized to `[-0.5, 0.5)`,
//! which is the range a gridding call maps onto its output extent. All
//! generators are deterministic so failures reproduce exactly.

use std::f32::consts::PI;

use num_complex::Complex32;

/// Creates a 2D radial (projection) trajectory.
///
/// Spokes are evenly spaced over `[0, π)` and each spoke crosses the centre
/// with `samples_per_spoke` readout points at `(j - n/2) / n`.
///
/// # Arguments
///
/// * `spokes` - Number of projection angles
/// * `samples_per_spoke` - Readout points per spoke
///
/// # Returns
///
/// `spokes * samples_per_spoke` points, spoke-major.
///
/// # Example
///
/// ```
/// use test_utils::radial_trajectory;
///
/// let traj = radial_trajectory(4, 8);
/// assert_eq!(traj.len(), 32);
/// assert_eq!(traj[4], [0.0, 0.0]); // centre of the first spoke
/// assert!(traj.iter().all(|p| p[0].abs() <= 0.5 && p[1].abs() <= 0.5));
/// ```
pub fn radial_trajectory(spokes: usize, samples_per_spoke: usize) -> Vec<[f32; 2]> {
    let mut points = Vec::with_capacity(spokes * samples_per_spoke);
    let half = (samples_per_spoke / 2) as f32;
    for s in 0..spokes {
        let angle = PI * s as f32 / spokes.max(1) as f32;
        let (sin, cos) = angle.sin_cos();
        for j in 0..samples_per_spoke {
            let r = (j as f32 - half) / samples_per_spoke as f32;
            points.push([r * cos, r * sin]);
        }
    }
    points
}

/// Creates a 2D Archimedean spiral trajectory.
///
/// Each interleave starts at the centre and winds outwards to radius 0.5 over
/// `turns` revolutions. Interleaves are rotated evenly around the circle.
///
/// # Example
///
/// ```
/// use test_utils::spiral_trajectory;
///
/// let traj = spiral_trajectory(2, 100, 3.0);
/// assert_eq!(traj.len(), 200);
/// assert_eq!(traj[0], [0.0, 0.0]);
/// ```
pub fn spiral_trajectory(interleaves: usize, samples: usize, turns: f32) -> Vec<[f32; 2]> {
    let mut points = Vec::with_capacity(interleaves * samples);
    for arm in 0..interleaves {
        let rotation = 2.0 * PI * arm as f32 / interleaves.max(1) as f32;
        for j in 0..samples {
            let t = j as f32 / samples as f32;
            let angle = 2.0 * PI * turns * t + rotation;
            let r = 0.5 * t;
            points.push([r * angle.cos(), r * angle.sin()]);
        }
    }
    points
}

/// Creates a fully sampled Cartesian trajectory of `nx * ny` points.
///
/// Point `(x, y)` sits at `((x - nx/2) / nx, (y - ny/2) / ny)`, i.e. exactly on
/// the centre of a grid cell of an `nx` by `ny` output. Points are ordered with
/// `x` varying fastest.
///
/// # Example
///
/// ```
/// use test_utils::cartesian_trajectory;
///
/// let traj = cartesian_trajectory(4, 2);
/// assert_eq!(traj.len(), 8);
/// assert_eq!(traj[0], [-0.5, -0.5]);
/// assert_eq!(traj[6], [0.0, 0.0]);
/// ```
pub fn cartesian_trajectory(nx: usize, ny: usize) -> Vec<[f32; 2]> {
    let mut points = Vec::with_capacity(nx * ny);
    for y in 0..ny {
        for x in 0..nx {
            points.push([
                (x as f32 - (nx / 2) as f32) / nx as f32,
                (y as f32 - (ny / 2) as f32) / ny as f32,
            ]);
        }
    }
    points
}

/// Ramp (|k|) density compensation weights.
///
/// The centre sample would get weight zero, so every weight is floored at a
/// quarter of the smallest non-zero radius step `floor`.
///
/// # Example
///
/// ```
/// use test_utils::{radial_trajectory, ramp_weights};
///
/// let traj = radial_trajectory(2, 8);
/// let w = ramp_weights(&traj, 1.0 / 8.0);
/// assert_eq!(w.len(), traj.len());
/// assert!(w.iter().all(|&w| w > 0.0));
/// ```
pub fn ramp_weights(points: &[[f32; 2]], floor: f32) -> Vec<f32> {
    points
        .iter()
        .map(|p| (p[0] * p[0] + p[1] * p[1]).sqrt().max(0.25 * floor))
        .collect()
}

/// k-space signal of a single point object at `(x0, y0)` image cells from the
/// centre.
///
/// Sample value is `exp(-2πi (kx·x0 + ky·y0))`.
pub fn point_source_data(points: &[[f32; 2]], x0: f32, y0: f32) -> Vec<Complex32> {
    points
        .iter()
        .map(|p| Complex32::from_polar(1.0, -2.0 * PI * (p[0] * x0 + p[1] * y0)))
        .collect()
}

/// Deterministic pseudo-random complex values in `[-1, 1]` per component.
///
/// Uses a fixed linear congruential sequence so tests don't need an RNG.
///
/// # Example
///
/// ```
/// use test_utils::complex_test_data;
///
/// let a = complex_test_data(16, 7);
/// let b = complex_test_data(16, 7);
/// assert_eq!(a, b);
/// assert!(a.iter().all(|v| v.re.abs() <= 1.0 && v.im.abs() <= 1.0));
/// ```
pub fn complex_test_data(len: usize, seed: u64) -> Vec<Complex32> {
    let mut state = seed.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
    let mut next = move || {
        state = state
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        // Top 24 bits map exactly onto an f32 mantissa.
        ((state >> 40) as f32 / (1u64 << 24) as f32) * 2.0 - 1.0
    };
    (0..len).map(|_| Complex32::new(next(), next())).collect()
}

/// Deterministic pseudo-random coordinates in `[-0.5, 0.5)` for `ndim` axes,
/// interleaved sample by sample.
pub fn random_coordinates(samples: usize, ndim: usize, seed: u64) -> Vec<f32> {
    complex_test_data((samples * ndim).div_ceil(2), seed)
        .into_iter()
        .flat_map(|v| [v.re * 0.5, v.im * 0.5])
        .take(samples * ndim)
        .map(|c| c.clamp(-0.5, 0.4999))
        .collect()
}
