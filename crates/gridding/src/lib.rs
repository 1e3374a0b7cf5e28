//! Non-uniform gridding engine for image reconstruction.
//!
//! Convolves irregularly sampled complex data onto a Cartesian grid with a
//! separable Kaiser-Bessel kernel, samples a Cartesian grid back at
//! non-uniform locations, and prepares the rolloff image that undoes the
//! kernel's apodization after the (external) Fourier transform.
//!
//! - **Grid**: weighted scatter, truncated at the grid boundary
//! - **Degrid**: unweighted gather, the adjoint of grid
//! - **Rolloff**: multiplicative correction image, centre value 1
//!
//! # Architecture
//!
//! ```text
//! Coordinates ──► IndexMap (coord → cell window, shared)
//!                    │
//!                    ├─► grid::grid      (scatter, rayon bands)
//!                    ├─► degrid::degrid  (gather, rayon over samples)
//!                    └─► rolloff::rolloff (impulse footprint / closed form)
//!                           │
//!                    KaiserBessel table (OnceLock, read-only)
//! ```
//!
//! # Example
//!
//! ```
//! use gridding::{Complex32, Coordinates, GridSpacing, Shape};
//!
//! let coords = Coordinates::from_points(&[[0.0, 0.0], [0.1, -0.2]])?;
//! let data = [Complex32::new(1.0, 0.0), Complex32::new(0.0, 1.0)];
//! let weights = [1.0f32, 0.5];
//! let shape = Shape::new(vec![64, 64]);
//!
//! let image_kspace = gridding::grid(&coords, &data, &weights, &shape, &GridSpacing::new_2d(1.0, 1.0))?;
//! let resampled = gridding::degrid(&coords, &image_kspace)?;
//! assert_eq!(resampled.as_slice().len(), 2);
//! # Ok::<(), gridding::GriddingError>(())
//! ```

pub mod config;
pub mod degrid;
pub mod error;
pub mod grid;
pub mod gridder;
pub mod kernel;
pub mod mapping;
pub mod oversample;
pub mod rolloff;
pub mod types;

pub use num_complex::Complex32;

pub use config::{FovMode, GriddingConfig};
pub use error::{GriddingError, Result};
pub use gridder::Gridder;
pub use kernel::{KaiserBessel, KERNEL_RADIUS, KERNEL_WIDTH};
pub use oversample::OversampledMatrix;
pub use rolloff::RolloffReference;
pub use types::{ComplexGrid, Coordinates, GridSpacing, Shape, MAX_RANK};

/// Grid weighted samples with the default kernel and configuration.
pub fn grid(
    coords: &Coordinates,
    data: &[Complex32],
    weights: &[f32],
    outdim: &Shape,
    spacing: &GridSpacing,
) -> Result<ComplexGrid> {
    Gridder::default().grid(coords, data, weights, outdim, spacing)
}

/// Sample a grid at non-uniform coordinates with the default kernel.
pub fn degrid(coords: &Coordinates, grid: &ComplexGrid) -> Result<ComplexGrid> {
    Gridder::default().degrid(coords, grid)
}

/// Rolloff correction with the default kernel; `isofov` is 0 or 1.
pub fn rolloff(reference: RolloffReference, outdim: &Shape, isofov: i64) -> Result<ComplexGrid> {
    let fov = FovMode::try_from(isofov)?;
    Gridder::default().rolloff(reference, outdim, fov)
}
