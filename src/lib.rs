//! Pixel enhancement engine for a desktop image viewer.
//!
//! The host decodes a file into a [`RawImage`], the [`format`] module turns it
//! into a canonical [`PixelBuffer`], and the operations below each return a new
//! buffer:
//! - [`log_transform`] - logarithmic range compression
//! - [`adjust_contrast`] - auto stretch or manual contrast/brightness
//! - [`bandpass`] - FFT bandpass filter, gray output
//!
//! [`ImageSession`] wires these together with the single-level reset cache.

pub mod buffer;
pub mod cache;
pub mod error;
pub mod format;
pub mod session;
pub mod spectral;
pub mod tone;

pub use buffer::{Channels, PixelBuffer};
pub use cache::OriginalImageCache;
pub use error::{DecodeError, EnhanceError, Result};
pub use format::{decode, encode, ChannelOrder, Encoding, Layout, RawImage, SampleDepth};
pub use session::ImageSession;
pub use spectral::{bandpass, filter_mask, FilterParameters};
pub use tone::{adjust_contrast, log_transform, ContrastParameters};
