//! The gridding entry point: a validated configuration plus a shared kernel.

use std::sync::Arc;

use num_complex::Complex32;

use crate::config::{FovMode, GriddingConfig};
use crate::error::Result;
use crate::kernel::KaiserBessel;
use crate::rolloff::RolloffReference;
use crate::types::{ComplexGrid, Coordinates, GridSpacing, Shape};
use crate::{degrid, grid, rolloff};

/// Grids, degrids and computes rolloff corrections with one kernel.
///
/// Cheap to clone; the kernel table is shared.
#[derive(Debug, Clone)]
pub struct Gridder {
    config: GriddingConfig,
    kernel: Arc<KaiserBessel>,
}

impl Default for Gridder {
    fn default() -> Self {
        Self {
            config: GriddingConfig::default(),
            kernel: KaiserBessel::shared(),
        }
    }
}

impl Gridder {
    /// Create a gridder, building a kernel table unless the configuration
    /// matches the shared default.
    pub fn new(config: GriddingConfig) -> Result<Self> {
        config.validate()?;
        let kernel = if config.uses_default_kernel() {
            KaiserBessel::shared()
        } else {
            Arc::new(KaiserBessel::new(
                config.oversampling_ratio,
                config.kernel_table_size,
            )?)
        };
        Ok(Self { config, kernel })
    }

    /// Create a gridder from `GRIDDING_*` environment variables.
    pub fn from_env() -> Result<Self> {
        Self::new(GriddingConfig::from_env())
    }

    pub fn config(&self) -> &GriddingConfig {
        &self.config
    }

    pub fn kernel(&self) -> &KaiserBessel {
        &self.kernel
    }

    /// Grid weighted samples onto a new grid of `shape`.
    pub fn grid(
        &self,
        coords: &Coordinates,
        data: &[Complex32],
        weights: &[f32],
        shape: &Shape,
        spacing: &GridSpacing,
    ) -> Result<ComplexGrid> {
        grid::grid(
            &self.kernel,
            coords,
            data,
            weights,
            shape,
            spacing,
            self.config.parallel_threshold,
        )
    }

    /// Grid weighted samples into `out`, which is untouched on error.
    pub fn grid_into(
        &self,
        coords: &Coordinates,
        data: &[Complex32],
        weights: &[f32],
        spacing: &GridSpacing,
        out: &mut ComplexGrid,
    ) -> Result<()> {
        grid::grid_into(
            &self.kernel,
            coords,
            data,
            weights,
            spacing,
            self.config.parallel_threshold,
            out,
        )
    }

    /// Grid several back-to-back data sets sharing coordinates and weights.
    pub fn grid_slices(
        &self,
        coords: &Coordinates,
        data: &[Complex32],
        weights: &[f32],
        shape: &Shape,
        spacing: &GridSpacing,
    ) -> Result<Vec<ComplexGrid>> {
        grid::grid_slices(&self.kernel, coords, data, weights, shape, spacing)
    }

    /// Sample `grid` at every coordinate with unit spacing.
    pub fn degrid(&self, coords: &Coordinates, grid: &ComplexGrid) -> Result<ComplexGrid> {
        let spacing = GridSpacing::unit(grid.shape().rank());
        self.degrid_with_spacing(coords, grid, &spacing)
    }

    /// Sample `grid` at every coordinate.
    pub fn degrid_with_spacing(
        &self,
        coords: &Coordinates,
        grid: &ComplexGrid,
        spacing: &GridSpacing,
    ) -> Result<ComplexGrid> {
        degrid::degrid(
            &self.kernel,
            coords,
            grid,
            spacing,
            self.config.parallel_threshold,
        )
    }

    /// Rolloff correction for a grid of `shape`.
    pub fn rolloff(
        &self,
        reference: RolloffReference,
        shape: &Shape,
        fov: FovMode,
    ) -> Result<ComplexGrid> {
        rolloff::rolloff(
            &self.kernel,
            reference,
            shape,
            fov,
            self.config.rolloff_clamp_percent,
        )
    }
}
