//! FFT Bandpass Filter
//!
//! Frequency-domain filtering of a grayscale image:
//! 1. 2D FFT (rows, then columns) and quadrant shift so DC sits at the center
//! 2. Radial mask: discs around the center are zeroed for each active cutoff
//! 3. Inverse shift, inverse FFT, magnitude
//! 4. Optional autoscale of the result onto 0..=255
//!
//! Colour input is reduced to BT.601 luma first and the result is always gray.
//! A frequency exactly on a cutoff radius counts as inside the removed disc.

use std::sync::Arc;
use ndarray::parallel::prelude::*;
use ndarray::{Array1, Array2, Axis, Zip};
use rustfft::{num_complex::Complex, Fft, FftDirection, FftPlanner};
use serde::{Deserialize, Serialize};
use crate::buffer::{to_sample, Channels, PixelBuffer};
use crate::error::{EnhanceError, Result};
use crate::format::to_grayscale;

pub type Spectrum = Array2<Complex<f64>>;

/// Magnitude spread below which a filtered result counts as flat (rounding residue)
const FLAT_TOLERANCE: f64 = 1e-9;

// ============================================================================
// SETTINGS
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterParameters {
    /// Remove large structures: zero frequencies within this radius of DC, in pixels (default: 0 = off)
    pub large_cutoff: f64,
    /// Remove small structures: zero frequencies within this radius of DC, in pixels (default: 0 = off)
    pub small_cutoff: f64,
    /// Reserved: directional stripe suppression, currently has no effect (default: false)
    pub suppress_stripes: bool,
    /// Reserved: stripe direction tolerance, currently has no effect (default: 15.0)
    pub tolerance: f64,
    /// Stretch the filtered result to 0..=255 (default: true)
    pub autoscale: bool,
    /// Clamp to 0..=255 after autoscaling (default: false)
    pub saturate: bool,
    /// Also render the mask for preview (default: false)
    pub display_filter: bool,
}

impl Default for FilterParameters {
    fn default() -> Self {
        Self {
            large_cutoff: 0.0,
            small_cutoff: 0.0,
            suppress_stripes: false,
            tolerance: 15.0,
            autoscale: true,
            saturate: false,
            display_filter: false,
        }
    }
}

impl FilterParameters {
    pub fn validate(&self) -> Result<()> {
        for (name, value) in [("large_cutoff", self.large_cutoff), ("small_cutoff", self.small_cutoff)] {
            if !value.is_finite() || value < 0.0 {
                return Err(EnhanceError::InvalidParameter(format!(
                    "{} must be a non-negative radius, got {}",
                    name, value
                )));
            }
        }
        Ok(())
    }

    /// Active cutoff radii, each clamped to `min(width, height) / 2`
    fn radii(&self, width: usize, height: usize) -> Vec<f64> {
        let limit = (width.min(height) / 2) as f64;
        [self.large_cutoff, self.small_cutoff]
            .into_iter()
            .filter(|&r| r > 0.0)
            .map(|r| r.min(limit))
            .collect()
    }
}

// ============================================================================
// 2D FFT
// ============================================================================

fn process_lanes(grid: &mut Spectrum, axis: Axis, fft: &Arc<dyn Fft<f64>>) {
    grid.axis_iter_mut(axis).into_par_iter().for_each(|mut lane| {
        let mut buffer: Vec<Complex<f64>> = lane.iter().copied().collect();
        fft.process(&mut buffer);
        lane.assign(&Array1::from(buffer));
    });
}

/// Unnormalized 2D transform in place: every row, then every column
fn transform_in_place(grid: &mut Spectrum, direction: FftDirection) {
    if grid.is_empty() {
        return;
    }

    let (height, width) = grid.dim();
    let mut planner = FftPlanner::new();
    let row_fft = planner.plan_fft(width, direction);
    let col_fft = planner.plan_fft(height, direction);

    process_lanes(grid, Axis(0), &row_fft);
    process_lanes(grid, Axis(1), &col_fft);
}

/// Forward 2D DFT of a real grid indexed `[y, x]`
pub fn fft2(image: &Array2<f64>) -> Spectrum {
    let mut grid = image.mapv(|v| Complex::new(v, 0.0));
    transform_in_place(&mut grid, FftDirection::Forward);
    grid
}

/// Inverse 2D DFT, normalized by `1 / (width * height)`
pub fn ifft2(spectrum: &Spectrum) -> Spectrum {
    let mut grid = spectrum.clone();
    transform_in_place(&mut grid, FftDirection::Inverse);

    if !grid.is_empty() {
        let scale = 1.0 / grid.len() as f64;
        grid.mapv_inplace(|c| c * scale);
    }
    grid
}

/// Cyclic shift: output `[y, x]` takes input `[y - dy, x - dx]`
fn roll(spectrum: &Spectrum, dy: usize, dx: usize) -> Spectrum {
    let (height, width) = spectrum.dim();
    Array2::from_shape_fn((height, width), |(y, x)| {
        spectrum[[(y + height - dy) % height, (x + width - dx) % width]]
    })
}

/// Move the zero-frequency term to `[height / 2, width / 2]`
pub fn fft_shift(spectrum: &Spectrum) -> Spectrum {
    let (height, width) = spectrum.dim();
    roll(spectrum, height / 2, width / 2)
}

/// Undo [`fft_shift`], also for odd dimensions
pub fn ifft_shift(spectrum: &Spectrum) -> Spectrum {
    let (height, width) = spectrum.dim();
    roll(spectrum, height - height / 2, width - width / 2)
}

// ============================================================================
// MASK
// ============================================================================

/// Pass (1.0) / stop (0.0) mask over a centered spectrum of `height` x `width`
pub fn radial_mask(width: usize, height: usize, params: &FilterParameters) -> Array2<f64> {
    let radii = params.radii(width, height);
    let (cy, cx) = ((height / 2) as f64, (width / 2) as f64);

    Array2::from_shape_fn((height, width), |(y, x)| {
        let dy = y as f64 - cy;
        let dx = x as f64 - cx;
        let d2 = dy * dy + dx * dx;
        if radii.iter().any(|r| d2 <= r * r) {
            0.0
        } else {
            1.0
        }
    })
}

/// Mask rendered as a gray image: pass = 255, stop = 0
pub fn filter_mask(width: u32, height: u32, params: &FilterParameters) -> Result<PixelBuffer> {
    if width == 0 || height == 0 {
        return Err(EnhanceError::EmptyImage { width, height });
    }
    params.validate()?;

    let mask = radial_mask(width as usize, height as usize, params);
    let samples = mask.iter().map(|&m| if m > 0.0 { 255 } else { 0 }).collect();
    PixelBuffer::from_samples(width, height, Channels::Gray, samples)
}

// ============================================================================
// BANDPASS
// ============================================================================

/// Linear map of `[min, max]` onto `[0, 255]`; flat input is left alone.
///
/// Flat means a spread within [`FLAT_TOLERANCE`]; an exactly uniform image
/// comes back from the inverse transform with rounding noise in the last bits.
fn autoscale(values: &mut [f64], saturate: bool) {
    let (min, max) = values
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| (lo.min(v), hi.max(v)));

    if max - min <= FLAT_TOLERANCE {
        tracing::debug!("bandpass: flat result, autoscale skipped");
        return;
    }

    tracing::debug!("bandpass: autoscale {:.3}..={:.3}", min, max);
    let scale = 255.0 / (max - min);
    values.par_iter_mut().for_each(|v| {
        *v = (*v - min) * scale;
        if saturate {
            *v = v.clamp(0.0, 255.0);
        }
    });
}

/// Remove spectral content inside the cutoff discs and return the gray result
pub fn bandpass(buffer: &PixelBuffer, params: &FilterParameters) -> Result<PixelBuffer> {
    let (width, height) = buffer.dimensions();
    if buffer.is_empty() {
        return Err(EnhanceError::EmptyImage { width, height });
    }
    params.validate()?;

    let (w, h) = (width as usize, height as usize);
    tracing::debug!(
        "bandpass: {}x{} {:?}, large={}, small={}, radii={:?}",
        width,
        height,
        buffer.channels(),
        params.large_cutoff,
        params.small_cutoff,
        params.radii(w, h)
    );

    let gray = to_grayscale(buffer);
    let image = Array2::from_shape_vec((h, w), gray.samples().iter().map(|&v| v as f64).collect())?;

    let mut spectrum = fft_shift(&fft2(&image));
    let mask = radial_mask(w, h, params);
    tracing::trace!(
        "bandpass: mask stops {} of {} frequencies",
        mask.iter().filter(|&&m| m == 0.0).count(),
        mask.len()
    );
    Zip::from(&mut spectrum).and(&mask).for_each(|c, &m| *c *= m);

    let filtered = ifft2(&ifft_shift(&spectrum));
    let mut magnitude: Vec<f64> = filtered.iter().map(|c| c.norm()).collect();

    if params.autoscale {
        autoscale(&mut magnitude, params.saturate);
    }

    let samples: Vec<u8> = magnitude.par_iter().map(|&v| to_sample(v)).collect();
    PixelBuffer::from_samples(width, height, Channels::Gray, samples)
}

// ============================================================================
// TESTS
// ============================================================================
