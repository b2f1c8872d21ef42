//! Format Adapter
//!
//! Translates between whatever the decoder or display toolkit hands us and the
//! canonical [`PixelBuffer`]:
//! - raw decoded bytes (8 or 16 bit, RGB or BGR order, any row stride)
//! - `image::DynamicImage` values
//! - output byte layouts for display and saving (gray, RGB(A), BGR(A), aligned rows)
//!
//! 16-bit sources are rescaled to 8 bits with a single pair of extrema taken
//! over the whole buffer, so the mapping is the same for every row and channel.

use image::{DynamicImage, GrayImage, RgbImage, RgbaImage};
use serde::{Deserialize, Serialize};
use crate::buffer::{Channels, PixelBuffer};
use crate::error::{DecodeError, Result};

// ============================================================================
// INPUT DESCRIPTION
// ============================================================================

/// Bit depth of each source sample
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SampleDepth {
    Eight,
    /// Little-endian 16-bit samples
    Sixteen,
}

impl SampleDepth {
    pub fn from_bits(bits: u8) -> std::result::Result<Self, DecodeError> {
        match bits {
            8 => Ok(SampleDepth::Eight),
            16 => Ok(SampleDepth::Sixteen),
            other => Err(DecodeError::UnsupportedFormat(format!("{} bits per sample", other))),
        }
    }

    pub const fn bytes(self) -> usize {
        match self {
            SampleDepth::Eight => 1,
            SampleDepth::Sixteen => 2,
        }
    }
}

/// Order of the colour channels in the source
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChannelOrder {
    #[default]
    Rgb,
    /// Blue first, as produced by OpenCV-style decoders
    Bgr,
}

/// A decoded image as reported by the collaborator
#[derive(Debug, Clone, Copy)]
pub struct RawImage<'a> {
    pub width: u32,
    pub height: u32,
    pub channels: u8,
    /// Bytes between row starts
    pub stride: usize,
    pub depth: SampleDepth,
    pub order: ChannelOrder,
    pub data: &'a [u8],
}

impl<'a> RawImage<'a> {
    /// Tightly packed RGB-ordered image
    pub fn packed(width: u32, height: u32, channels: u8, depth: SampleDepth, data: &'a [u8]) -> Self {
        Self {
            width,
            height,
            channels,
            stride: width as usize * channels as usize * depth.bytes(),
            depth,
            order: ChannelOrder::Rgb,
            data,
        }
    }

    pub fn with_order(mut self, order: ChannelOrder) -> Self {
        self.order = order;
        self
    }
}

// ============================================================================
// DECODE
// ============================================================================

/// Turn a raw decoded image into a packed canonical buffer
pub fn decode(raw: &RawImage) -> Result<PixelBuffer> {
    let channels = Channels::from_count(raw.channels)?;
    let count = channels.count();
    let row_bytes = (raw.width as usize).saturating_mul(count * raw.depth.bytes());

    if raw.stride < row_bytes {
        return Err(DecodeError::InvalidStride {
            stride: raw.stride,
            row_bytes,
        }
        .into());
    }

    // Saturates on a bogus stride; no slice can reach usize::MAX
    let expected = raw.stride.saturating_mul(raw.height as usize);
    if raw.data.len() < expected {
        return Err(DecodeError::TruncatedBuffer {
            expected,
            actual: raw.data.len(),
        }
        .into());
    }

    tracing::debug!(
        "decode: {}x{}, channels={}, depth={:?}, order={:?}, stride={}",
        raw.width,
        raw.height,
        count,
        raw.depth,
        raw.order,
        raw.stride
    );

    let rows = (0..raw.height as usize).map(|y| &raw.data[y * raw.stride..][..row_bytes]);

    let mut samples: Vec<u8> = match raw.depth {
        SampleDepth::Eight => rows.flat_map(|row| row.iter().copied()).collect(),
        SampleDepth::Sixteen => {
            let wide: Vec<u16> = rows
                .flat_map(|row| row.chunks_exact(2).map(|b| u16::from_le_bytes([b[0], b[1]])))
                .collect();
            rescale_to_u8(&wide)
        }
    };

    if raw.order == ChannelOrder::Bgr {
        swap_red_blue(&mut samples, channels);
    }

    PixelBuffer::from_samples(raw.width, raw.height, channels, samples)
}

/// Map 16-bit samples onto 0..=255 using the extrema of the whole slice.
///
/// A flat input (max == min) maps to all zeros.
pub fn rescale_to_u8(samples: &[u16]) -> Vec<u8> {
    let (min, max) = match samples.iter().fold(None, |acc: Option<(u16, u16)>, &v| match acc {
        None => Some((v, v)),
        Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
    }) {
        Some(extrema) => extrema,
        None => return Vec::new(),
    };

    if max == min {
        tracing::debug!("rescale_to_u8: flat input at {}, zero-filling", min);
        return vec![0; samples.len()];
    }

    let range = (max - min) as u32;
    samples
        .iter()
        .map(|&v| ((v - min) as u32 * 255 / range) as u8)
        .collect()
}

/// Swap channels 0 and 2 of every pixel; alpha and gray are left alone
fn swap_red_blue(samples: &mut [u8], channels: Channels) {
    if channels == Channels::Gray {
        return;
    }
    for px in samples.chunks_exact_mut(channels.count()) {
        px.swap(0, 2);
    }
}

// ============================================================================
// LUMA
// ============================================================================

/// BT.601 luma of an 8-bit RGB triple
pub fn luma(r: u8, g: u8, b: u8) -> u8 {
    (0.299 * r as f64 + 0.587 * g as f64 + 0.114 * b as f64)
        .round()
        .clamp(0.0, 255.0) as u8
}

/// Single-channel copy of a buffer; colour input is reduced to luma, alpha ignored
pub fn to_grayscale(buffer: &PixelBuffer) -> PixelBuffer {
    if buffer.channels() == Channels::Gray {
        return buffer.to_packed();
    }

    let (width, height) = buffer.dimensions();
    PixelBuffer::from_fn(width, height, Channels::Gray, |x, y, _| {
        let px = buffer.pixel(x, y);
        luma(px[0], px[1], px[2])
    })
}

// ============================================================================
// ENCODE
// ============================================================================

/// Output byte layout
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Layout {
    Gray,
    Rgb,
    Rgba,
    Bgr,
    Bgra,
}

impl Layout {
    pub const fn count(self) -> usize {
        match self {
            Layout::Gray => 1,
            Layout::Rgb | Layout::Bgr => 3,
            Layout::Rgba | Layout::Bgra => 4,
        }
    }

    /// Layout that carries the buffer unchanged
    pub const fn canonical(channels: Channels) -> Self {
        match channels {
            Channels::Gray => Layout::Gray,
            Channels::Rgb => Layout::Rgb,
            Channels::Rgba => Layout::Rgba,
        }
    }
}

/// Target encoding for [`encode`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Encoding {
    pub layout: Layout,
    /// Rows are zero-padded to a multiple of this many bytes (0 and 1 mean packed)
    pub row_alignment: usize,
}

impl Encoding {
    pub const fn packed(layout: Layout) -> Self {
        Self {
            layout,
            row_alignment: 1,
        }
    }

    pub const fn aligned(layout: Layout, row_alignment: usize) -> Self {
        Self {
            layout,
            row_alignment,
        }
    }

    /// Row stride in bytes for an image of `width` pixels
    pub fn stride_for(&self, width: u32) -> usize {
        let row_bytes = width as usize * self.layout.count();
        let align = self.row_alignment.max(1);
        row_bytes.div_ceil(align) * align
    }
}

/// Serialize a canonical buffer into the requested byte layout
pub fn encode(buffer: &PixelBuffer, encoding: Encoding) -> Vec<u8> {
    let (width, height) = buffer.dimensions();
    let stride = encoding.stride_for(width);
    let row_bytes = width as usize * encoding.layout.count();
    let source = buffer.channels();
    let mut out = Vec::with_capacity(stride * height as usize);

    for y in 0..height {
        for px in buffer.row(y).chunks_exact(source.count()) {
            let [r, g, b, a] = match source {
                Channels::Gray => [px[0], px[0], px[0], 255],
                Channels::Rgb => [px[0], px[1], px[2], 255],
                Channels::Rgba => [px[0], px[1], px[2], px[3]],
            };

            match encoding.layout {
                Layout::Gray if source == Channels::Gray => out.push(px[0]),
                Layout::Gray => out.push(luma(r, g, b)),
                Layout::Rgb => out.extend_from_slice(&[r, g, b]),
                Layout::Rgba => out.extend_from_slice(&[r, g, b, a]),
                Layout::Bgr => out.extend_from_slice(&[b, g, r]),
                Layout::Bgra => out.extend_from_slice(&[b, g, r, a]),
            }
        }
        out.resize(out.len() + (stride - row_bytes), 0);
    }

    out
}

// ============================================================================
// IMAGE CRATE BRIDGE
// ============================================================================

/// Canonical buffer from an `image` crate value
pub fn from_dynamic(img: &DynamicImage) -> Result<PixelBuffer> {
    let (width, height) = (img.width(), img.height());

    match img {
        DynamicImage::ImageLuma8(buf) => {
            PixelBuffer::from_samples(width, height, Channels::Gray, buf.as_raw().clone())
        }
        DynamicImage::ImageRgb8(buf) => {
            PixelBuffer::from_samples(width, height, Channels::Rgb, buf.as_raw().clone())
        }
        DynamicImage::ImageRgba8(buf) => {
            PixelBuffer::from_samples(width, height, Channels::Rgba, buf.as_raw().clone())
        }
        DynamicImage::ImageLumaA8(_) => {
            PixelBuffer::from_samples(width, height, Channels::Rgba, img.to_rgba8().into_raw())
        }
        DynamicImage::ImageLuma16(buf) => {
            PixelBuffer::from_samples(width, height, Channels::Gray, rescale_to_u8(buf.as_raw()))
        }
        DynamicImage::ImageRgb16(buf) => {
            PixelBuffer::from_samples(width, height, Channels::Rgb, rescale_to_u8(buf.as_raw()))
        }
        DynamicImage::ImageRgba16(buf) => {
            PixelBuffer::from_samples(width, height, Channels::Rgba, rescale_to_u8(buf.as_raw()))
        }
        DynamicImage::ImageLumaA16(_) => {
            let wide = img.to_rgba16();
            PixelBuffer::from_samples(width, height, Channels::Rgba, rescale_to_u8(wide.as_raw()))
        }
        other => Err(DecodeError::UnsupportedFormat(format!("{:?}", other.color())).into()),
    }
}

/// `image` crate value holding a packed copy of the buffer
pub fn to_dynamic(buffer: &PixelBuffer) -> Result<DynamicImage> {
    let (width, height) = buffer.dimensions();
    let channels = buffer.channels();
    let samples = buffer.to_packed().into_samples();
    let actual = samples.len();
    let truncated = || DecodeError::TruncatedBuffer {
        expected: width as usize * height as usize * channels.count(),
        actual,
    };

    let img = match channels {
        Channels::Gray => GrayImage::from_raw(width, height, samples).map(DynamicImage::ImageLuma8),
        Channels::Rgb => RgbImage::from_raw(width, height, samples).map(DynamicImage::ImageRgb8),
        Channels::Rgba => RgbaImage::from_raw(width, height, samples).map(DynamicImage::ImageRgba8),
    };

    img.ok_or_else(truncated).map_err(Into::into)
}

// ============================================================================
// TESTS
// ============================================================================
