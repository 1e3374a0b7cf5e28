//! Oversampled matrix sizing and centred cropping.
//!
//! Reconstructions grid onto a matrix `ratio` times larger than the image and
//! crop the centre afterwards. The oversampled size is always even so the
//! centre cell stays at `size / 2`.

use crate::error::{GriddingError, Result};
use crate::types::{ComplexGrid, Shape};

/// Sizes of an image matrix and its oversampled grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OversampledMatrix {
    /// Image matrix size.
    pub matrix: usize,
    /// Oversampled grid size.
    pub size: usize,
    /// First grid cell of the centred crop.
    pub crop_start: usize,
    /// One past the last grid cell of the centred crop.
    pub crop_end: usize,
}

impl OversampledMatrix {
    pub fn new(matrix: usize, ratio: f64) -> Result<Self> {
        if matrix == 0 {
            return Err(GriddingError::InvalidDimension { axis: 0, value: 0 });
        }
        if !ratio.is_finite() || ratio < 1.0 {
            return Err(GriddingError::invalid_config(format!(
                "oversampling ratio {} must be >= 1",
                ratio
            )));
        }

        let mut size = (matrix as f64 * ratio) as usize;
        if size % 2 == 1 {
            size += 1;
        }

        let (crop_start, crop_end) = if ratio > 1.0 {
            let start = (size - matrix) / 2;
            (start, start + matrix)
        } else {
            (0, size)
        };

        Ok(Self {
            matrix,
            size,
            crop_start,
            crop_end,
        })
    }

    /// Shape of the oversampled grid for `rank` axes.
    pub fn grid_shape(&self, rank: usize) -> Shape {
        Shape::new(vec![self.size; rank])
    }

    /// Extract the centred crop window on every axis.
    pub fn crop(&self, grid: &ComplexGrid) -> Result<ComplexGrid> {
        let shape = grid.shape();
        shape.check_grid()?;
        if let Some(axis) = shape.dims().iter().position(|&d| d != self.size) {
            return Err(GriddingError::shape_mismatch(
                "oversampled grid axis",
                self.size,
                shape.dims()[axis],
            ));
        }

        let extent = self.crop_end - self.crop_start;
        let rank = shape.rank();
        let cropped_shape = Shape::new(vec![extent; rank]);
        let mut data = Vec::with_capacity(cropped_shape.len());

        let src = grid.as_slice();
        let mut index = vec![0usize; rank];
        let mut source = vec![0usize; rank];
        for _ in 0..cropped_shape.len() {
            for a in 0..rank {
                source[a] = index[a] + self.crop_start;
            }
            data.push(src[shape.offset(&source)]);

            for a in 0..rank {
                index[a] += 1;
                if index[a] < extent {
                    break;
                }
                index[a] = 0;
            }
        }

        ComplexGrid::from_vec(cropped_shape, data)
    }
}
