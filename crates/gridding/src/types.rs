//! Core buffer types: shapes, complex grids, coordinates and spacing.
//!
//! Flat buffers store axis 0 fastest. For a 2D grid that means
//! `data[y * nx + x]`, the same row-major layout used for images, with
//! axis 0 holding the x extent and axis 1 the rows.

use num_complex::Complex32;
use num_traits::Zero;
use serde::{Deserialize, Serialize};

use crate::error::{GriddingError, Result};

/// Highest grid rank the engine supports.
pub const MAX_RANK: usize = 4;

/// Dimensions of an N-dimensional buffer, axis 0 fastest.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Shape {
    dims: Vec<usize>,
    strides: Vec<usize>,
}

impl Shape {
    /// Create a shape.
    ///
    /// An empty dimension list is a scalar shape holding one element. Zero
    /// extents are allowed here (an empty sample set); grids reject them in
    /// `check_grid`.
    pub fn new(dims: impl Into<Vec<usize>>) -> Self {
        let dims = dims.into();
        let mut strides = Vec::with_capacity(dims.len());
        let mut stride = 1usize;
        for &d in &dims {
            strides.push(stride);
            stride *= d;
        }

        Self { dims, strides }
    }

    /// Build a shape from the signed extents a binding layer passes in.
    pub fn from_outdim(outdim: &[i64]) -> Result<Self> {
        let mut dims = Vec::with_capacity(outdim.len());
        for (axis, &value) in outdim.iter().enumerate() {
            if value <= 0 {
                return Err(GriddingError::InvalidDimension { axis, value });
            }
            dims.push(value as usize);
        }
        Ok(Self::new(dims))
    }

    /// Extent of every axis.
    pub fn dims(&self) -> &[usize] {
        &self.dims
    }

    /// Flat-buffer stride of every axis.
    pub fn strides(&self) -> &[usize] {
        &self.strides
    }

    /// Number of axes.
    pub fn rank(&self) -> usize {
        self.dims.len()
    }

    /// Total number of elements.
    pub fn len(&self) -> usize {
        self.dims.iter().product()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Index of the centre (DC) cell, `floor(n / 2)` on every axis.
    pub fn center(&self) -> Vec<usize> {
        self.dims.iter().map(|&d| d / 2).collect()
    }

    /// Translate an N-dimensional index to a flat offset.
    #[inline]
    pub fn offset(&self, index: &[usize]) -> usize {
        debug_assert_eq!(index.len(), self.dims.len(), "index rank mismatch");
        debug_assert!(
            index.iter().zip(&self.dims).all(|(&i, &d)| i < d),
            "index {:?} out of bounds for {:?}",
            index,
            self.dims
        );
        index
            .iter()
            .zip(&self.strides)
            .map(|(&i, &s)| i * s)
            .sum()
    }

    /// Check that this shape is usable as a grid: rank 1..=`MAX_RANK` and
    /// positive extents.
    pub fn check_grid(&self) -> Result<()> {
        if self.dims.is_empty() || self.dims.len() > MAX_RANK {
            return Err(GriddingError::UnsupportedRank(self.dims.len()));
        }
        if let Some(axis) = self.dims.iter().position(|&d| d == 0) {
            return Err(GriddingError::InvalidDimension { axis, value: 0 });
        }
        Ok(())
    }
}

/// Dense complex grid that owns its shape.
#[derive(Debug, Clone, PartialEq)]
pub struct ComplexGrid {
    shape: Shape,
    data: Vec<Complex32>,
}

impl ComplexGrid {
    /// Create a zero-filled grid.
    pub fn zeros(shape: Shape) -> Self {
        let data = vec![Complex32::zero(); shape.len()];
        Self { shape, data }
    }

    /// Wrap an existing buffer, checking its length against the shape.
    pub fn from_vec(shape: Shape, data: Vec<Complex32>) -> Result<Self> {
        if data.len() != shape.len() {
            return Err(GriddingError::shape_mismatch("grid buffer", shape.len(), data.len()));
        }
        Ok(Self { shape, data })
    }

    pub fn shape(&self) -> &Shape {
        &self.shape
    }

    pub fn as_slice(&self) -> &[Complex32] {
        &self.data
    }

    pub fn as_mut_slice(&mut self) -> &mut [Complex32] {
        &mut self.data
    }

    pub fn into_vec(self) -> Vec<Complex32> {
        self.data
    }

    /// Value at an N-dimensional index, `None` when out of bounds.
    pub fn get(&self, index: &[usize]) -> Option<Complex32> {
        if index.len() != self.shape.rank()
            || index.iter().zip(self.shape.dims()).any(|(&i, &d)| i >= d)
        {
            return None;
        }
        Some(self.data[self.shape.offset(index)])
    }

    /// Mutable value at an N-dimensional index, `None` when out of bounds.
    pub fn get_mut(&mut self, index: &[usize]) -> Option<&mut Complex32> {
        if index.len() != self.shape.rank()
            || index.iter().zip(self.shape.dims()).any(|(&i, &d)| i >= d)
        {
            return None;
        }
        let offset = self.shape.offset(index);
        Some(&mut self.data[offset])
    }

    /// Reset every cell to zero.
    pub fn fill_zero(&mut self) {
        self.data.fill(Complex32::zero());
    }

    /// Sum of squared magnitudes.
    pub fn energy(&self) -> f64 {
        self.data.iter().map(|v| v.norm_sqr() as f64).sum()
    }
}

/// Non-uniform sample locations.
///
/// Component `d` of sample `s` lives at `values[s * ndim + d]`; the component
/// axis is the leading, fastest-varying axis of the coordinate array. The
/// remaining axes form the sample shape that degrid output inherits.
#[derive(Debug, Clone, PartialEq)]
pub struct Coordinates {
    ndim: usize,
    sample_shape: Vec<usize>,
    values: Vec<f32>,
}

impl Coordinates {
    /// Create a flat list of `values.len() / ndim` samples.
    pub fn new(ndim: usize, values: Vec<f32>) -> Result<Self> {
        if ndim == 0 || ndim > MAX_RANK {
            return Err(GriddingError::UnsupportedRank(ndim));
        }
        if values.len() % ndim != 0 {
            return Err(GriddingError::shape_mismatch(
                "coordinate buffer",
                values.len().div_ceil(ndim) * ndim,
                values.len(),
            ));
        }
        let count = values.len() / ndim;
        Ok(Self {
            ndim,
            sample_shape: vec![count],
            values,
        })
    }

    /// Create coordinates with an explicit sample shape.
    pub fn with_sample_shape(
        ndim: usize,
        sample_shape: impl Into<Vec<usize>>,
        values: Vec<f32>,
    ) -> Result<Self> {
        if ndim == 0 || ndim > MAX_RANK {
            return Err(GriddingError::UnsupportedRank(ndim));
        }
        let sample_shape = sample_shape.into();
        let expected = sample_shape.iter().product::<usize>() * ndim;
        if values.len() != expected {
            return Err(GriddingError::shape_mismatch(
                "coordinate buffer",
                expected,
                values.len(),
            ));
        }
        Ok(Self {
            ndim,
            sample_shape,
            values,
        })
    }

    /// Build coordinates from fixed-size points.
    pub fn from_points<const D: usize>(points: &[[f32; D]]) -> Result<Self> {
        let values = points.iter().flat_map(|p| p.iter().copied()).collect();
        Self::new(D, values)
    }

    /// Number of spatial components per sample.
    pub fn ndim(&self) -> usize {
        self.ndim
    }

    /// Number of samples.
    pub fn len(&self) -> usize {
        self.values.len() / self.ndim
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Shape of the sample axes.
    pub fn sample_shape(&self) -> &[usize] {
        &self.sample_shape
    }

    /// Components of one sample.
    #[inline]
    pub fn sample(&self, index: usize) -> &[f32] {
        &self.values[index * self.ndim..(index + 1) * self.ndim]
    }

    /// Iterate over samples.
    pub fn iter(&self) -> std::slice::ChunksExact<'_, f32> {
        self.values.chunks_exact(self.ndim)
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.values
    }
}

/// Per-axis scale factors from coordinate units to grid widths.
///
/// With a scale of 1, coordinates in `[-0.5, 0.5)` span the full axis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GridSpacing {
    scale: Vec<f32>,
}

impl GridSpacing {
    pub fn new(scale: impl Into<Vec<f32>>) -> Self {
        Self {
            scale: scale.into(),
        }
    }

    /// The two-axis `(dx, dy)` form.
    pub fn new_2d(dx: f32, dy: f32) -> Self {
        Self::new(vec![dx, dy])
    }

    /// A scale of 1 on every axis.
    pub fn unit(rank: usize) -> Self {
        Self::new(vec![1.0; rank])
    }

    pub fn scale(&self) -> &[f32] {
        &self.scale
    }

    /// Check the spacing against a grid rank.
    pub fn validate(&self, rank: usize) -> Result<()> {
        if self.scale.len() != rank {
            return Err(GriddingError::dimension_mismatch(rank, self.scale.len()));
        }
        for (axis, &value) in self.scale.iter().enumerate() {
            if !value.is_finite() || value <= 0.0 {
                return Err(GriddingError::InvalidSpacing { axis, value });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shape_strides_and_offset() {
        let shape = Shape::new(vec![4, 3]);
        assert_eq!(shape.strides(), &[1, 4]);
        assert_eq!(shape.len(), 12);
        assert_eq!(shape.offset(&[1, 2]), 9);
        assert_eq!(shape.center(), vec![2, 1]);
    }

    #[test]
    fn test_shape_rejects_zero_extent() {
        assert_eq!(
            Shape::new(vec![4, 0]).check_grid(),
            Err(GriddingError::InvalidDimension { axis: 1, value: 0 })
        );
        assert_eq!(
            Shape::new(vec![2, 2, 2, 2, 2]).check_grid(),
            Err(GriddingError::UnsupportedRank(5))
        );
        assert_eq!(
            Shape::from_outdim(&[8, -2]),
            Err(GriddingError::InvalidDimension { axis: 1, value: -2 })
        );
        assert_eq!(Shape::from_outdim(&[8, 6]).unwrap().dims(), &[8, 6]);
    }

    #[test]
    fn test_scalar_shape() {
        let shape = Shape::new(Vec::new());
        assert_eq!(shape.len(), 1);
        assert_eq!(shape.offset(&[]), 0);
        assert!(shape.check_grid().is_err());
    }

    #[test]
    fn test_grid_get_bounds() {
        let mut grid = ComplexGrid::zeros(Shape::new(vec![3, 2]));
        *grid.get_mut(&[2, 1]).unwrap() = Complex32::new(1.0, -1.0);
        assert_eq!(grid.get(&[2, 1]), Some(Complex32::new(1.0, -1.0)));
        assert_eq!(grid.as_slice()[5], Complex32::new(1.0, -1.0));
        assert_eq!(grid.get(&[3, 0]), None);
        assert_eq!(grid.get(&[0]), None);
    }

    #[test]
    fn test_grid_from_vec_length() {
        let shape = Shape::new(vec![2, 2]);
        assert!(ComplexGrid::from_vec(shape.clone(), vec![Complex32::zero(); 3]).is_err());
        assert!(ComplexGrid::from_vec(shape, vec![Complex32::zero(); 4]).is_ok());
    }

    #[test]
    fn test_coordinates_layout() {
        let coords = Coordinates::from_points(&[[0.1, 0.2], [0.3, 0.4], [0.5, 0.6]]).unwrap();
        assert_eq!(coords.ndim(), 2);
        assert_eq!(coords.len(), 3);
        assert_eq!(coords.sample(1), &[0.3, 0.4]);
        assert_eq!(coords.sample_shape(), &[3]);
    }

    #[test]
    fn test_coordinates_rejects_ragged_buffer() {
        assert!(Coordinates::new(2, vec![0.0; 5]).is_err());
        assert!(Coordinates::new(0, vec![]).is_err());
        assert!(Coordinates::with_sample_shape(2, vec![2, 3], vec![0.0; 12]).is_ok());
        assert!(Coordinates::with_sample_shape(2, vec![2, 3], vec![0.0; 10]).is_err());
    }

    #[test]
    fn test_spacing_validation() {
        assert!(GridSpacing::new_2d(1.0, 0.5).validate(2).is_ok());
        assert_eq!(
            GridSpacing::new_2d(1.0, 0.0).validate(2),
            Err(GriddingError::InvalidSpacing { axis: 1, value: 0.0 })
        );
        assert!(GridSpacing::new_2d(-1.0, 1.0).validate(2).is_err());
        assert!(GridSpacing::new_2d(f32::NAN, 1.0).validate(2).is_err());
        assert!(GridSpacing::unit(3).validate(2).is_err());
    }
}
