//! Tone Operations
//!
//! Point operations that remap each colour sample independently:
//! 1. Log transform - compress dynamic range, lifting dark detail
//! 2. Contrast adjustment - auto stretch per channel, or manual pivot/gain
//!
//! Both build a 256-entry lookup table per colour channel and run a single
//! pass over the buffer. Alpha is always copied through untouched.

use serde::{Deserialize, Serialize};
use crate::buffer::{to_sample, PixelBuffer};
use crate::error::{EnhanceError, Result};

/// Mid-gray pivot for manual contrast
const CONTRAST_PIVOT: f64 = 128.0;

type Lut = [u8; 256];

// ============================================================================
// SETTINGS
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContrastParameters {
    /// Stretch every channel to the full range, ignoring brightness/contrast (default: true)
    pub auto: bool,
    /// Multiplicative gain applied after contrast (default: 1.0)
    pub brightness: f64,
    /// Scale of the deviation from mid-gray, 0.0 - 2.0 (default: 1.0 = identity)
    pub contrast: f64,
}

impl Default for ContrastParameters {
    fn default() -> Self {
        Self {
            auto: true,
            brightness: 1.0,
            contrast: 1.0,
        }
    }
}

impl ContrastParameters {
    pub fn manual(brightness: f64, contrast: f64) -> Self {
        Self {
            auto: false,
            brightness,
            contrast,
        }
    }

    /// Manual parameters from the dialog sliders.
    ///
    /// `brightness` is the -100..=100 slider (0 = unchanged gain), `contrast_percent`
    /// the 0..=200 slider (100 = identity).
    pub fn from_sliders(brightness: i32, contrast_percent: i32) -> Self {
        Self::manual(
            1.0 + brightness as f64 / 100.0,
            contrast_percent as f64 / 100.0,
        )
    }

    pub fn validate(&self) -> Result<()> {
        if !self.contrast.is_finite() || !(0.0..=2.0).contains(&self.contrast) {
            return Err(EnhanceError::InvalidParameter(format!(
                "contrast must be within 0.0..=2.0, got {}",
                self.contrast
            )));
        }
        if !self.brightness.is_finite() || self.brightness < 0.0 {
            return Err(EnhanceError::InvalidParameter(format!(
                "brightness must be a non-negative gain, got {}",
                self.brightness
            )));
        }
        Ok(())
    }
}

// ============================================================================
// LOG TRANSFORM
// ============================================================================

/// Logarithmic range compression: `s -> 255 * ln(1 + s) / ln(1 + M)`.
///
/// `M` is the largest colour sample in the buffer, so the brightest sample maps
/// to 255 and black stays black. An all-black (or empty) buffer is returned as is.
pub fn log_transform(buffer: &PixelBuffer) -> PixelBuffer {
    let max = match buffer.max_color_value() {
        Some(max) if max > 0 => max,
        _ => {
            tracing::debug!("log_transform: no positive samples, returning input");
            return buffer.clone();
        }
    };

    let scale = 255.0 / (max as f64).ln_1p();
    tracing::debug!(
        "log_transform: {}x{} {:?}, max={}, scale={:.4}",
        buffer.width(),
        buffer.height(),
        buffer.channels(),
        max,
        scale
    );

    let mut lut: Lut = [0; 256];
    for (s, out) in lut.iter_mut().enumerate() {
        *out = to_sample(scale * (s as f64).ln_1p());
    }

    buffer.map_color_channels(|_, v| lut[v as usize])
}

// ============================================================================
// CONTRAST
// ============================================================================

/// Auto stretch or manual contrast/brightness, per colour channel
pub fn adjust_contrast(buffer: &PixelBuffer, params: &ContrastParameters) -> Result<PixelBuffer> {
    let colors = buffer.channels().color_count();

    let luts: Vec<Lut> = if params.auto {
        (0..colors).map(|c| stretch_lut(buffer, c)).collect()
    } else {
        params.validate()?;
        tracing::debug!(
            "adjust_contrast: manual contrast={}, brightness={}",
            params.contrast,
            params.brightness
        );
        vec![manual_lut(params.contrast, params.brightness); colors]
    };

    Ok(buffer.map_color_channels(|c, v| luts[c][v as usize]))
}

/// Linear stretch of one channel's `[min, max]` onto `[0, 255]`; identity for flat channels
fn stretch_lut(buffer: &PixelBuffer, channel: usize) -> Lut {
    let mut lut: Lut = [0; 256];

    match buffer.channel_extrema(channel) {
        Some((min, max)) if max > min => {
            tracing::debug!("adjust_contrast: channel {} stretch {}..={}", channel, min, max);
            let range = (max - min) as f64;
            for (v, out) in lut.iter_mut().enumerate() {
                *out = to_sample((v as f64 - min as f64) / range * 255.0);
            }
        }
        _ => {
            tracing::debug!("adjust_contrast: channel {} is flat, unchanged", channel);
            for (v, out) in lut.iter_mut().enumerate() {
                *out = v as u8;
            }
        }
    }

    lut
}

/// `((v - 128) * contrast + 128) * brightness`, clamped
fn manual_lut(contrast: f64, brightness: f64) -> Lut {
    let mut lut: Lut = [0; 256];
    for (v, out) in lut.iter_mut().enumerate() {
        *out = to_sample(((v as f64 - CONTRAST_PIVOT) * contrast + CONTRAST_PIVOT) * brightness);
    }
    lut
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buffer::Channels;

    fn ramp_rows() -> PixelBuffer {
        let row = [0u8, 50, 100, 150];
        let samples: Vec<u8> = (0..4).flat_map(|_| row).collect();
        PixelBuffer::from_samples(4, 4, Channels::Gray, samples).unwrap()
    }

    #[test]
    fn test_log_transform_ramp() {
        let out = log_transform(&ramp_rows());
        for y in 0..4 {
            let row = out.row(y);
            assert_eq!(row[0], 0);
            assert_eq!(row[3], 255);
            assert!(row[0] < row[1] && row[1] < row[2] && row[2] < row[3], "row {:?}", row);
        }
    }

    #[test]
    fn test_log_transform_all_zero_unchanged() {
        let buf = PixelBuffer::new(3, 2, Channels::Rgb);
        assert_eq!(log_transform(&buf), buf);
    }

    #[test]
    fn test_log_transform_keeps_alpha() {
        let buf = PixelBuffer::from_samples(2, 1, Channels::Rgba, vec![0, 10, 200, 17, 5, 0, 0, 0]).unwrap();
        let out = log_transform(&buf);
        assert_eq!(out.pixel(0, 0)[3], 17);
        assert_eq!(out.pixel(1, 0)[3], 0);
        assert_eq!(out.pixel(0, 0)[2], 255);
        assert_eq!(out.pixel(0, 0)[0], 0);
    }

    #[test]
    fn test_log_transform_shared_scale() {
        // Channel max is global: the green channel peaks at 100 but does not reach 255
        let buf = PixelBuffer::from_samples(1, 1, Channels::Rgb, vec![200, 100, 0]).unwrap();
        let out = log_transform(&buf);
        assert_eq!(out.samples()[0], 255);
        assert!(out.samples()[1] < 255);
    }

    #[test]
    fn test_log_transform_single_pixel() {
        let buf = PixelBuffer::from_samples(1, 1, Channels::Gray, vec![42]).unwrap();
        assert_eq!(log_transform(&buf).samples(), &[255]);
    }

    #[test]
    fn test_manual_identity() {
        let buf = PixelBuffer::from_fn(16, 16, Channels::Rgba, |x, y, c| (x * 16 + y) as u8 ^ c as u8);
        let out = adjust_contrast(&buf, &ContrastParameters::manual(1.0, 1.0)).unwrap();
        assert_eq!(out, buf);
    }

    #[test]
    fn test_manual_order_contrast_then_brightness() {
        let buf = PixelBuffer::from_samples(3, 1, Channels::Gray, vec![0, 128, 200]).unwrap();
        let out = adjust_contrast(&buf, &ContrastParameters::manual(0.5, 2.0)).unwrap();
        // 0 -> (-128*2+128)*0.5 = -64 -> 0; 128 -> 64; 200 -> 272*0.5 = 136
        assert_eq!(out.samples(), &[0, 64, 136]);
    }

    #[test]
    fn test_manual_saturates() {
        let buf = PixelBuffer::from_samples(2, 1, Channels::Gray, vec![10, 250]).unwrap();
        let out = adjust_contrast(&buf, &ContrastParameters::manual(1.0, 2.0)).unwrap();
        assert_eq!(out.samples(), &[0, 255]);
    }

    #[test]
    fn test_manual_rejects_bad_contrast() {
        let buf = PixelBuffer::new(1, 1, Channels::Gray);
        let err = adjust_contrast(&buf, &ContrastParameters::manual(1.0, 2.5)).unwrap_err();
        assert!(matches!(err, EnhanceError::InvalidParameter(_)));
        let err = adjust_contrast(&buf, &ContrastParameters::manual(f64::NAN, 1.0)).unwrap_err();
        assert!(matches!(err, EnhanceError::InvalidParameter(_)));
    }

    #[test]
    fn test_auto_stretch_per_channel() {
        let buf = PixelBuffer::from_samples(2, 1, Channels::Rgba, vec![50, 7, 0, 9, 100, 7, 255, 200]).unwrap();
        let out = adjust_contrast(&buf, &ContrastParameters::default()).unwrap();
        // red 50..100 stretched, green flat and unchanged, blue already full, alpha untouched
        assert_eq!(out.pixel(0, 0), &[0, 7, 0, 9]);
        assert_eq!(out.pixel(1, 0), &[255, 7, 255, 200]);
    }

    #[test]
    fn test_auto_flat_buffer_unchanged() {
        let buf = PixelBuffer::from_fn(3, 3, Channels::Gray, |_, _, _| 90);
        let out = adjust_contrast(&buf, &ContrastParameters::default()).unwrap();
        assert_eq!(out, buf);
    }

    #[test]
    fn test_auto_ignores_invalid_manual_fields() {
        let params = ContrastParameters {
            auto: true,
            brightness: -3.0,
            contrast: 9.0,
        };
        let buf = PixelBuffer::from_samples(1, 1, Channels::Gray, vec![5]).unwrap();
        assert!(adjust_contrast(&buf, &params).is_ok());
    }

    #[test]
    fn test_from_sliders() {
        let p = ContrastParameters::from_sliders(0, 100);
        assert!(!p.auto);
        assert_eq!(p.brightness, 1.0);
        assert_eq!(p.contrast, 1.0);

        let p = ContrastParameters::from_sliders(-50, 200);
        assert_eq!(p.brightness, 0.5);
        assert_eq!(p.contrast, 2.0);
    }

    #[test]
    fn test_parameters_from_dialog_json() {
        let p: ContrastParameters = serde_json::from_str(r#"{"auto": false, "contrast": 1.5}"#).unwrap();
        assert!(!p.auto);
        assert_eq!(p.contrast, 1.5);
        assert_eq!(p.brightness, 1.0);
    }
}
