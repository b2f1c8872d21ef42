//! Viewer Session
//!
//! Keeps the image currently on screen next to the retained original, the way
//! the viewer uses the engine:
//! - loading decodes, retains a copy and shows it
//! - every operation replaces the shown image with its result
//! - reset brings back the retained original
//! - export re-encodes the shown image for the save path

use crate::buffer::PixelBuffer;
use crate::cache::OriginalImageCache;
use crate::error::{EnhanceError, Result};
use crate::format::{self, Encoding, RawImage};
use crate::spectral::{self, FilterParameters};
use crate::tone::{self, ContrastParameters};

#[derive(Debug, Default)]
pub struct ImageSession {
    original: OriginalImageCache,
    current: Option<PixelBuffer>,
}

impl ImageSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode a raw image and make it both the original and the shown image
    pub fn load(&mut self, raw: &RawImage) -> Result<()> {
        let buffer = format::decode(raw)?;
        self.load_buffer(buffer);
        Ok(())
    }

    pub fn load_buffer(&mut self, buffer: PixelBuffer) {
        self.original.retain(&buffer);
        self.current = Some(buffer);
    }

    pub fn current(&self) -> Option<&PixelBuffer> {
        self.current.as_ref()
    }

    fn require_current(&self) -> Result<&PixelBuffer> {
        self.current.as_ref().ok_or(EnhanceError::NoImage)
    }

    pub fn apply_log(&mut self) -> Result<()> {
        let result = tone::log_transform(self.require_current()?);
        self.current = Some(result);
        Ok(())
    }

    pub fn apply_contrast(&mut self, params: &ContrastParameters) -> Result<()> {
        let result = tone::adjust_contrast(self.require_current()?, params)?;
        self.current = Some(result);
        Ok(())
    }

    /// Bandpass the shown image; returns the rendered mask when `display_filter` is set
    pub fn apply_bandpass(&mut self, params: &FilterParameters) -> Result<Option<PixelBuffer>> {
        let source = self.require_current()?;
        let result = spectral::bandpass(source, params)?;

        let preview = if params.display_filter {
            Some(spectral::filter_mask(result.width(), result.height(), params)?)
        } else {
            None
        };

        self.current = Some(result);
        Ok(preview)
    }

    /// Show the retained original again; `None` if nothing was ever loaded
    pub fn reset(&mut self) -> Option<&PixelBuffer> {
        let original = self.original.reset()?;
        self.current = Some(original);
        self.current.as_ref()
    }

    /// Encode the shown image
    pub fn export(&self, encoding: Encoding) -> Result<Vec<u8>> {
        Ok(format::encode(self.require_current()?, encoding))
    }
}
