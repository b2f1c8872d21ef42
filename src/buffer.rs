//! Canonical Pixel Buffer
//!
//! Every engine operation reads and produces a [`PixelBuffer`]:
//! - 8-bit samples, row-major, top to bottom
//! - fixed channel order: gray, R,G,B or R,G,B,A
//! - a row stride that may exceed the packed row length
//!
//! Operations never mutate their input. They build a new buffer, usually
//! through [`PixelBuffer::map_color_channels`], which applies a scalar
//! transform per colour channel and copies alpha through untouched.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use crate::error::{DecodeError, Result};

// ============================================================================
// CHANNEL LAYOUT
// ============================================================================

/// Channel layout of a canonical buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Channels {
    Gray,
    Rgb,
    Rgba,
}

impl Channels {
    /// Map a reported channel count onto a layout
    pub fn from_count(count: u8) -> std::result::Result<Self, DecodeError> {
        match count {
            1 => Ok(Channels::Gray),
            3 => Ok(Channels::Rgb),
            4 => Ok(Channels::Rgba),
            other => Err(DecodeError::UnsupportedChannels(other)),
        }
    }

    /// Samples per pixel
    pub const fn count(self) -> usize {
        match self {
            Channels::Gray => 1,
            Channels::Rgb => 3,
            Channels::Rgba => 4,
        }
    }

    /// Samples per pixel that carry intensity (everything except alpha)
    pub const fn color_count(self) -> usize {
        match self {
            Channels::Gray => 1,
            Channels::Rgb | Channels::Rgba => 3,
        }
    }

    pub const fn has_alpha(self) -> bool {
        matches!(self, Channels::Rgba)
    }
}

/// Round and saturate an intensity onto the 8-bit range
pub(crate) fn to_sample(v: f64) -> u8 {
    v.round().clamp(0.0, 255.0) as u8
}

// ============================================================================
// PIXEL BUFFER
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixelBuffer {
    width: u32,
    height: u32,
    channels: Channels,
    stride: usize,
    samples: Vec<u8>,
}

impl PixelBuffer {
    /// Zero-filled packed buffer
    pub fn new(width: u32, height: u32, channels: Channels) -> Self {
        let stride = width as usize * channels.count();
        Self {
            width,
            height,
            channels,
            stride,
            samples: vec![0; stride * height as usize],
        }
    }

    /// Wrap packed samples (`stride == width * channels`)
    pub fn from_samples(width: u32, height: u32, channels: Channels, samples: Vec<u8>) -> Result<Self> {
        let stride = width as usize * channels.count();
        Self::with_stride(width, height, channels, stride, samples)
    }

    /// Wrap samples laid out with an explicit row stride in bytes.
    ///
    /// Extra trailing bytes beyond `stride * height` are dropped.
    pub fn with_stride(
        width: u32,
        height: u32,
        channels: Channels,
        stride: usize,
        mut samples: Vec<u8>,
    ) -> Result<Self> {
        let row_bytes = (width as usize).saturating_mul(channels.count());
        if stride < row_bytes {
            return Err(DecodeError::InvalidStride { stride, row_bytes }.into());
        }

        let expected = stride.saturating_mul(height as usize);
        if samples.len() < expected {
            return Err(DecodeError::TruncatedBuffer {
                expected,
                actual: samples.len(),
            }
            .into());
        }
        samples.truncate(expected);

        Ok(Self {
            width,
            height,
            channels,
            stride,
            samples,
        })
    }

    /// Build a packed buffer by evaluating `f(x, y, channel)` for every sample
    pub fn from_fn<F>(width: u32, height: u32, channels: Channels, mut f: F) -> Self
    where
        F: FnMut(u32, u32, usize) -> u8,
    {
        let mut buffer = Self::new(width, height, channels);
        let count = channels.count();
        let stride = buffer.stride;

        for y in 0..height {
            let row = &mut buffer.samples[y as usize * stride..][..stride];
            for x in 0..width {
                for c in 0..count {
                    row[x as usize * count + c] = f(x, y, c);
                }
            }
        }

        buffer
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn channels(&self) -> Channels {
        self.channels
    }

    /// Bytes between the starts of consecutive rows
    pub fn stride(&self) -> usize {
        self.stride
    }

    /// Bytes of pixel data per row, excluding stride padding
    pub fn row_bytes(&self) -> usize {
        self.width as usize * self.channels.count()
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Raw samples including any row padding
    pub fn samples(&self) -> &[u8] {
        &self.samples
    }

    pub fn into_samples(self) -> Vec<u8> {
        self.samples
    }

    /// Pixel data of row `y`, padding excluded
    pub fn row(&self, y: u32) -> &[u8] {
        let start = y as usize * self.stride;
        &self.samples[start..start + self.row_bytes()]
    }

    pub fn rows(&self) -> impl Iterator<Item = &[u8]> + '_ {
        (0..self.height).map(move |y| self.row(y))
    }

    /// Samples of the pixel at `(x, y)`
    pub fn pixel(&self, x: u32, y: u32) -> &[u8] {
        let count = self.channels.count();
        let start = y as usize * self.stride + x as usize * count;
        &self.samples[start..start + count]
    }

    /// Every pixel in row-major order
    pub fn pixels(&self) -> impl Iterator<Item = &[u8]> + '_ {
        let count = self.channels.count();
        self.rows().flat_map(move |row| row.chunks_exact(count))
    }

    /// Every sample of one channel in row-major order
    pub fn channel_values(&self, channel: usize) -> impl Iterator<Item = u8> + '_ {
        self.pixels().map(move |px| px[channel])
    }

    /// `(min, max)` of one channel, `None` for an empty buffer
    pub fn channel_extrema(&self, channel: usize) -> Option<(u8, u8)> {
        self.channel_values(channel).fold(None, |acc, v| match acc {
            None => Some((v, v)),
            Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
        })
    }

    /// Largest sample over all colour channels (alpha excluded)
    pub fn max_color_value(&self) -> Option<u8> {
        let colors = self.channels.color_count();
        self.pixels().flat_map(|px| px[..colors].iter().copied()).max()
    }

    /// Same geometry, samples repacked so that `stride == row_bytes`
    pub fn to_packed(&self) -> PixelBuffer {
        if self.stride == self.row_bytes() {
            return self.clone();
        }

        let mut samples = Vec::with_capacity(self.row_bytes() * self.height as usize);
        for row in self.rows() {
            samples.extend_from_slice(row);
        }

        Self {
            width: self.width,
            height: self.height,
            channels: self.channels,
            stride: self.row_bytes(),
            samples,
        }
    }

    /// Apply `f(channel, value)` to every colour sample and copy alpha through.
    ///
    /// The result is packed and has the same channel layout.
    pub fn map_color_channels<F>(&self, f: F) -> PixelBuffer
    where
        F: Fn(usize, u8) -> u8 + Sync,
    {
        let count = self.channels.count();
        let colors = self.channels.color_count();
        let row_bytes = self.row_bytes();
        let mut samples = vec![0u8; row_bytes * self.height as usize];

        if row_bytes > 0 {
            samples.par_chunks_mut(row_bytes).enumerate().for_each(|(y, out)| {
                for (i, (dst, &v)) in out.iter_mut().zip(self.row(y as u32)).enumerate() {
                    let c = i % count;
                    *dst = if c < colors { f(c, v) } else { v };
                }
            });
        }

        Self {
            width: self.width,
            height: self.height,
            channels: self.channels,
            stride: row_bytes,
            samples,
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================
