//! Gather (degridding) of Cartesian grid values at non-uniform coordinates.
//!
//! Uses the same footprints as [`grid`](crate::grid), so with unit weights the
//! two operations are adjoint: `<grid(x), y> == <x, degrid(y)>`.

use num_complex::Complex32;
use num_traits::Zero;
use rayon::prelude::*;

use crate::error::{GriddingError, Result};
use crate::kernel::KaiserBessel;
use crate::mapping::IndexMap;
use crate::types::{ComplexGrid, Coordinates, GridSpacing, Shape};

/// Sample `grid` at every coordinate.
///
/// The output has the coordinate sample shape. Samples whose footprint misses
/// the grid come back as zero.
pub fn degrid(
    kernel: &KaiserBessel,
    coords: &Coordinates,
    grid: &ComplexGrid,
    spacing: &GridSpacing,
    parallel_threshold: usize,
) -> Result<ComplexGrid> {
    let shape = grid.shape();
    shape.check_grid()?;
    if coords.ndim() != shape.rank() {
        return Err(GriddingError::dimension_mismatch(shape.rank(), coords.ndim()));
    }
    let map = IndexMap::new(kernel, shape, spacing)?;

    let strides = shape.strides();
    let cells = grid.as_slice();
    let gather = |sample: &[f32]| -> Complex32 {
        let mut acc = Complex32::zero();
        if let Some(footprint) = map.footprint(sample) {
            footprint.for_each_cell(strides, 0, |offset, k| acc += cells[offset] * k);
        }
        acc
    };

    let mut out = ComplexGrid::zeros(Shape::new(coords.sample_shape().to_vec()));
    let parallel = coords.len() >= parallel_threshold;
    if parallel {
        out.as_mut_slice()
            .par_iter_mut()
            .zip(coords.as_slice().par_chunks_exact(coords.ndim()))
            .for_each(|(value, sample)| *value = gather(sample));
    } else {
        for (value, sample) in out.as_mut_slice().iter_mut().zip(coords.iter()) {
            *value = gather(sample);
        }
    }

    tracing::debug!(
        samples = coords.len(),
        rank = shape.rank(),
        dims = ?shape.dims(),
        parallel,
        "Degridded samples"
    );

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constant_grid_degrids_to_kernel_sum() {
        let kernel = KaiserBessel::shared();
        let shape = Shape::new(vec![16, 16]);
        let grid = ComplexGrid::from_vec(shape, vec![Complex32::new(2.0, -1.0); 256]).unwrap();
        let coords = Coordinates::from_points(&[[0.0, 0.0]]).unwrap();

        let out = degrid(&kernel, &coords, &grid, &GridSpacing::unit(2), usize::MAX).unwrap();

        let axis_sum: f32 = (-1..=1).map(|d| kernel.evaluate(d as f32)).sum();
        let expected = Complex32::new(2.0, -1.0) * (axis_sum * axis_sum);
        assert!((out.as_slice()[0] - expected).norm() < 1e-5);
    }

    #[test]
    fn test_output_keeps_sample_shape() {
        let kernel = KaiserBessel::shared();
        let grid = ComplexGrid::zeros(Shape::new(vec![8, 8]));
        let coords = Coordinates::with_sample_shape(2, vec![3, 5], vec![0.1; 30]).unwrap();
        let out = degrid(&kernel, &coords, &grid, &GridSpacing::unit(2), usize::MAX).unwrap();
        assert_eq!(out.shape().dims(), &[3, 5]);
        assert_eq!(out.as_slice().len(), 15);
    }

    #[test]
    fn test_outside_sample_is_zero() {
        let kernel = KaiserBessel::shared();
        let grid =
            ComplexGrid::from_vec(Shape::new(vec![8, 8]), vec![Complex32::new(1.0, 1.0); 64])
                .unwrap();
        let coords = Coordinates::from_points(&[[0.9, 0.0], [0.0, -0.9]]).unwrap();
        let out = degrid(&kernel, &coords, &grid, &GridSpacing::unit(2), usize::MAX).unwrap();
        assert!(out.as_slice().iter().all(|v| v.is_zero()));
    }

    #[test]
    fn test_huge_coordinates_are_zero() {
        let kernel = KaiserBessel::shared();
        let grid =
            ComplexGrid::from_vec(Shape::new(vec![16, 16]), vec![Complex32::new(1.0, 0.0); 256])
                .unwrap();
        let coords = Coordinates::from_points(&[[1.0e30, 0.0], [-1.0e30, 0.0], [0.0, 1.0e30]])
            .unwrap();
        for threshold in [usize::MAX, 0] {
            let out = degrid(&kernel, &coords, &grid, &GridSpacing::unit(2), threshold).unwrap();
            assert!(out.as_slice().iter().all(|v| v.is_zero()));
        }
    }

    #[test]
    fn test_parallel_matches_serial() {
        let kernel = KaiserBessel::shared();
        let shape = Shape::new(vec![20, 20]);
        let values = (0..400)
            .map(|i| Complex32::new((i as f32 * 0.1).sin(), (i as f32 * 0.07).cos()))
            .collect();
        let grid = ComplexGrid::from_vec(shape, values).unwrap();
        let points: Vec<[f32; 2]> = (0..300)
            .map(|i| [(i as f32 * 0.013).sin() * 0.5, (i as f32 * 0.029).cos() * 0.5])
            .collect();
        let coords = Coordinates::from_points(&points).unwrap();
        let spacing = GridSpacing::unit(2);

        let serial = degrid(&kernel, &coords, &grid, &spacing, usize::MAX).unwrap();
        let parallel = degrid(&kernel, &coords, &grid, &spacing, 0).unwrap();
        assert_eq!(serial, parallel);
    }

    #[test]
    fn test_rank_mismatch() {
        let kernel = KaiserBessel::shared();
        let grid = ComplexGrid::zeros(Shape::new(vec![8, 8, 8]));
        let coords = Coordinates::from_points(&[[0.0, 0.0]]).unwrap();
        let result = degrid(&kernel, &coords, &grid, &GridSpacing::unit(2), usize::MAX);
        assert_eq!(result, Err(GriddingError::dimension_mismatch(3, 2)));
    }
}
