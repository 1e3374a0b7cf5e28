//! Scatter (gridding) of weighted non-uniform samples onto a Cartesian grid.
//!
//! Every sample adds `data * weight * K(offset)` to the cells inside its
//! footprint. Cells outside the grid are skipped, never wrapped or clamped.
//!
//! Large inputs run on rayon with the output split into bands along the
//! slowest axis. Each worker owns one band and replays, in sample order, only
//! the samples whose footprint crosses it, so the parallel result matches the
//! serial one bit for bit.

use num_complex::Complex32;
use rayon::prelude::*;

use crate::error::{GriddingError, Result};
use crate::kernel::KaiserBessel;
use crate::mapping::{Footprint, IndexMap};
use crate::types::{ComplexGrid, Coordinates, GridSpacing, Shape};

/// Bands per rayon thread when scattering in parallel.
const BANDS_PER_THREAD: usize = 4;

/// Check every scatter precondition. Nothing has been written when this fails.
pub fn validate_scatter(
    coords: &Coordinates,
    data: &[Complex32],
    weights: &[f32],
    shape: &Shape,
    spacing: &GridSpacing,
) -> Result<()> {
    validate_geometry(coords, weights, shape, spacing)?;
    if data.len() != coords.len() {
        return Err(GriddingError::shape_mismatch("data", coords.len(), data.len()));
    }
    Ok(())
}

/// Preconditions that do not depend on the sample values.
fn validate_geometry(
    coords: &Coordinates,
    weights: &[f32],
    shape: &Shape,
    spacing: &GridSpacing,
) -> Result<()> {
    shape.check_grid()?;

    if coords.ndim() != shape.rank() {
        return Err(GriddingError::dimension_mismatch(shape.rank(), coords.ndim()));
    }
    if weights.len() != coords.len() {
        return Err(GriddingError::shape_mismatch("weights", coords.len(), weights.len()));
    }

    spacing.validate(shape.rank())?;

    if let Some((index, &value)) = weights
        .iter()
        .enumerate()
        .find(|(_, w)| !w.is_finite() || **w < 0.0)
    {
        return Err(GriddingError::InvalidWeight { index, value });
    }

    Ok(())
}

/// Grid samples onto a freshly allocated grid of `shape`.
///
/// The output is only allocated once the inputs have been validated.
pub fn grid(
    kernel: &KaiserBessel,
    coords: &Coordinates,
    data: &[Complex32],
    weights: &[f32],
    shape: &Shape,
    spacing: &GridSpacing,
    parallel_threshold: usize,
) -> Result<ComplexGrid> {
    validate_scatter(coords, data, weights, shape, spacing)?;
    let map = IndexMap::new(kernel, shape, spacing)?;

    let mut out = ComplexGrid::zeros(shape.clone());
    scatter(&map, coords, data, weights, shape, parallel_threshold, out.as_mut_slice());
    Ok(out)
}

/// Grid samples into an existing buffer, overwriting it.
///
/// On error `out` is left exactly as it was.
pub fn grid_into(
    kernel: &KaiserBessel,
    coords: &Coordinates,
    data: &[Complex32],
    weights: &[f32],
    spacing: &GridSpacing,
    parallel_threshold: usize,
    out: &mut ComplexGrid,
) -> Result<()> {
    let shape = out.shape().clone();
    validate_scatter(coords, data, weights, &shape, spacing)?;
    let map = IndexMap::new(kernel, &shape, spacing)?;

    out.fill_zero();
    scatter(&map, coords, data, weights, &shape, parallel_threshold, out.as_mut_slice());
    Ok(())
}

/// Grid several data sets that share one coordinate and weight set.
///
/// `data` holds the slices back to back, `coords.len()` values each. The
/// footprints are computed once and the slices are gridded in parallel.
pub fn grid_slices(
    kernel: &KaiserBessel,
    coords: &Coordinates,
    data: &[Complex32],
    weights: &[f32],
    shape: &Shape,
    spacing: &GridSpacing,
) -> Result<Vec<ComplexGrid>> {
    validate_geometry(coords, weights, shape, spacing)?;

    let samples = coords.len();
    if samples == 0 {
        if !data.is_empty() {
            return Err(GriddingError::shape_mismatch("data", 0, data.len()));
        }
        return Ok(Vec::new());
    }
    if data.is_empty() || data.len() % samples != 0 {
        return Err(GriddingError::shape_mismatch(
            "data",
            data.len().div_ceil(samples).max(1) * samples,
            data.len(),
        ));
    }

    let map = IndexMap::new(kernel, shape, spacing)?;

    let footprints: Vec<Option<Footprint>> = coords.iter().map(|s| map.footprint(s)).collect();
    let strides = shape.strides();

    let grids: Vec<ComplexGrid> = data
        .par_chunks(samples)
        .map(|slice| {
            let mut out = ComplexGrid::zeros(shape.clone());
            let cells = out.as_mut_slice();
            for (s, footprint) in footprints.iter().enumerate() {
                if let Some(footprint) = footprint {
                    accumulate(footprint, slice[s] * weights[s], strides, 0, cells);
                }
            }
            out
        })
        .collect();

    tracing::debug!(
        samples,
        slices = grids.len(),
        dims = ?shape.dims(),
        dropped = footprints.iter().filter(|f| f.is_none()).count(),
        "Gridded slices"
    );

    Ok(grids)
}

/// Scatter validated inputs into a zeroed buffer.
fn scatter(
    map: &IndexMap<'_>,
    coords: &Coordinates,
    data: &[Complex32],
    weights: &[f32],
    shape: &Shape,
    parallel_threshold: usize,
    out: &mut [Complex32],
) {
    let parallel = coords.len() >= parallel_threshold && shape.dims()[shape.rank() - 1] > 1;
    let dropped = if parallel {
        scatter_banded(map, coords, data, weights, shape, out)
    } else {
        scatter_serial(map, coords, data, weights, shape, out)
    };

    tracing::debug!(
        samples = coords.len(),
        rank = shape.rank(),
        dims = ?shape.dims(),
        parallel,
        dropped,
        "Gridded samples"
    );
}

#[inline]
fn accumulate(
    footprint: &Footprint,
    value: Complex32,
    strides: &[usize],
    base: usize,
    cells: &mut [Complex32],
) {
    footprint.for_each_cell(strides, base, |offset, k| cells[offset] += value * k);
}

/// Returns the number of samples that missed the grid.
fn scatter_serial(
    map: &IndexMap<'_>,
    coords: &Coordinates,
    data: &[Complex32],
    weights: &[f32],
    shape: &Shape,
    out: &mut [Complex32],
) -> usize {
    let strides = shape.strides();
    let mut dropped = 0;
    for (s, sample) in coords.iter().enumerate() {
        match map.footprint(sample) {
            Some(footprint) => accumulate(&footprint, data[s] * weights[s], strides, 0, out),
            None => dropped += 1,
        }
    }
    dropped
}

/// Returns the number of samples that missed the grid.
fn scatter_banded(
    map: &IndexMap<'_>,
    coords: &Coordinates,
    data: &[Complex32],
    weights: &[f32],
    shape: &Shape,
    out: &mut [Complex32],
) -> usize {
    let slow = shape.rank() - 1;
    let rows = shape.dims()[slow];
    let row_len = shape.strides()[slow];
    let bands = (rayon::current_num_threads() * BANDS_PER_THREAD).clamp(1, rows);
    let rows_per_band = rows.div_ceil(bands);

    let footprints: Vec<Option<Footprint>> = (0..coords.len())
        .into_par_iter()
        .map(|s| map.footprint(coords.sample(s)))
        .collect();

    let mut bins: Vec<Vec<usize>> = vec![Vec::new(); rows.div_ceil(rows_per_band)];
    let mut dropped = 0;
    for (s, footprint) in footprints.iter().enumerate() {
        let Some(footprint) = footprint else {
            dropped += 1;
            continue;
        };
        let window = footprint.axis(slow);
        let first = window.start / rows_per_band;
        let last = (window.end() - 1) / rows_per_band;
        for bin in &mut bins[first..=last] {
            bin.push(s);
        }
    }

    let strides = shape.strides();
    out.par_chunks_mut(rows_per_band * row_len)
        .zip(bins.par_iter())
        .enumerate()
        .for_each(|(band, (cells, bin))| {
            let lo = band * rows_per_band;
            let hi = lo + cells.len() / row_len;
            for &s in bin {
                let clipped = footprints[s]
                    .as_ref()
                    .and_then(|f| f.clip_axis(slow, lo, hi));
                if let Some(footprint) = clipped {
                    accumulate(&footprint, data[s] * weights[s], strides, lo * row_len, cells);
                }
            }
        });

    dropped
}
