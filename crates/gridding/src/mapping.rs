//! Coordinate to grid-index mapping shared by grid, degrid and rolloff.
//!
//! A coordinate `c` on axis `a` of an `n`-cell axis lands at the continuous
//! position `p = c * n * scale + floor(n / 2)`. The cells a sample touches on
//! that axis are the integers `i` in `[0, n)` with `|i - p| < R`.

use crate::error::Result;
use crate::kernel::{KaiserBessel, MAX_TAPS};
use crate::types::{GridSpacing, Shape, MAX_RANK};

/// Cells touched along one axis with their kernel weights.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct AxisWindow {
    /// First in-bounds cell.
    pub start: usize,
    /// Number of cells, at most `MAX_TAPS`.
    pub len: usize,
    pub taps: [f32; MAX_TAPS],
}

impl AxisWindow {
    /// Restrict the window to cells in `[lo, hi)`.
    pub fn clip(&self, lo: usize, hi: usize) -> Option<AxisWindow> {
        let start = self.start.max(lo);
        let end = (self.start + self.len).min(hi);
        if start >= end {
            return None;
        }
        let skip = start - self.start;
        let mut taps = [0.0; MAX_TAPS];
        taps[..end - start].copy_from_slice(&self.taps[skip..skip + end - start]);
        Some(AxisWindow {
            start,
            len: end - start,
            taps,
        })
    }

    /// One past the last cell.
    pub fn end(&self) -> usize {
        self.start + self.len
    }
}

/// Separable footprint of one sample: one window per axis.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Footprint {
    rank: usize,
    axes: [AxisWindow; MAX_RANK],
}

impl Footprint {
    pub fn rank(&self) -> usize {
        self.rank
    }

    pub fn axis(&self, axis: usize) -> &AxisWindow {
        &self.axes[axis]
    }

    /// Number of cells covered.
    pub fn cell_count(&self) -> usize {
        self.axes[..self.rank].iter().map(|w| w.len).product()
    }

    /// Restrict one axis to `[lo, hi)`; `None` when nothing is left.
    pub fn clip_axis(&self, axis: usize, lo: usize, hi: usize) -> Option<Footprint> {
        let window = self.axes[axis].clip(lo, hi)?;
        let mut clipped = *self;
        clipped.axes[axis] = window;
        Some(clipped)
    }

    /// Call `visit(flat_offset, weight)` for every covered cell.
    ///
    /// `strides` are the flat-buffer strides of the grid; `base` is subtracted
    /// from every offset so callers can address a sub-slice of the grid.
    #[inline]
    pub fn for_each_cell(&self, strides: &[usize], base: usize, mut visit: impl FnMut(usize, f32)) {
        let rank = self.rank;
        let mut counters = [0usize; MAX_RANK];
        loop {
            let mut offset = 0usize;
            let mut weight = 1.0f32;
            for a in 0..rank {
                let window = &self.axes[a];
                offset += (window.start + counters[a]) * strides[a];
                weight *= window.taps[counters[a]];
            }
            visit(offset - base, weight);

            let mut a = 0;
            loop {
                if a == rank {
                    return;
                }
                counters[a] += 1;
                if counters[a] < self.axes[a].len {
                    break;
                }
                counters[a] = 0;
                a += 1;
            }
        }
    }
}

/// Maps coordinates onto one grid shape.
#[derive(Debug, Clone)]
pub struct IndexMap<'k> {
    kernel: &'k KaiserBessel,
    rank: usize,
    dims: [usize; MAX_RANK],
    cells_per_unit: [f32; MAX_RANK],
    center: [f32; MAX_RANK],
}

impl<'k> IndexMap<'k> {
    /// Build a mapping after checking the shape and the spacing.
    pub fn new(kernel: &'k KaiserBessel, shape: &Shape, spacing: &GridSpacing) -> Result<Self> {
        shape.check_grid()?;
        spacing.validate(shape.rank())?;

        let mut dims = [0usize; MAX_RANK];
        let mut cells_per_unit = [0.0f32; MAX_RANK];
        let mut center = [0.0f32; MAX_RANK];
        for (a, (&n, &scale)) in shape.dims().iter().zip(spacing.scale()).enumerate() {
            dims[a] = n;
            cells_per_unit[a] = n as f32 * scale;
            center[a] = (n / 2) as f32;
        }

        Ok(Self {
            kernel,
            rank: shape.rank(),
            dims,
            cells_per_unit,
            center,
        })
    }

    pub fn rank(&self) -> usize {
        self.rank
    }

    /// Continuous grid position of a coordinate component.
    #[inline]
    pub fn position(&self, axis: usize, coord: f32) -> f32 {
        coord * self.cells_per_unit[axis] + self.center[axis]
    }

    /// In-bounds cells and weights along one axis, `None` if there are none.
    #[inline]
    pub fn axis_window(&self, axis: usize, coord: f32) -> Option<AxisWindow> {
        let p = self.position(axis, coord);
        if !p.is_finite() {
            return None;
        }
        let radius = self.kernel.radius();
        // Also keeps the integer casts below in range.
        if p <= -radius || p >= self.dims[axis] as f32 - 1.0 + radius {
            return None;
        }
        let n = self.dims[axis] as i64;

        let first = ((p - radius).floor() as i64 + 1).max(0);
        let last = ((p + radius).ceil() as i64 - 1).min(n - 1);
        if first > last {
            return None;
        }

        let mut window = AxisWindow {
            start: first as usize,
            len: 0,
            taps: [0.0; MAX_TAPS],
        };
        for cell in first..=last {
            if window.len == MAX_TAPS {
                break;
            }
            window.taps[window.len] = self.kernel.evaluate(cell as f32 - p);
            window.len += 1;
        }
        Some(window)
    }

    /// Footprint of one sample, `None` when it misses the grid.
    #[inline]
    pub fn footprint(&self, sample: &[f32]) -> Option<Footprint> {
        debug_assert_eq!(sample.len(), self.rank);
        let mut axes = [AxisWindow::default(); MAX_RANK];
        for (a, &coord) in sample.iter().enumerate() {
            axes[a] = self.axis_window(a, coord)?;
        }
        Some(Footprint {
            rank: self.rank,
            axes,
        })
    }
}
