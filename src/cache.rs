//! Original Image Cache
//!
//! Holds one pre-edit copy of the last loaded image so the viewer can reset.
//! The copy is stored and handed out by value, so nothing done to a returned
//! buffer can reach the retained one.

use std::sync::{Mutex, MutexGuard, PoisonError};
use crate::buffer::PixelBuffer;

#[derive(Debug, Default)]
pub struct OriginalImageCache {
    original: Mutex<Option<PixelBuffer>>,
}

impl OriginalImageCache {
    pub fn new() -> Self {
        Self::default()
    }

    // Every write replaces the whole value, so a poisoned lock still holds a
    // complete buffer (or none) and is safe to keep using.
    fn slot(&self) -> MutexGuard<'_, Option<PixelBuffer>> {
        self.original.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Keep an independent copy of `buffer`, replacing any earlier one
    pub fn retain(&self, buffer: &PixelBuffer) {
        tracing::debug!(
            "cache: retaining {}x{} {:?}",
            buffer.width(),
            buffer.height(),
            buffer.channels()
        );
        *self.slot() = Some(buffer.clone());
    }

    /// Fresh copy of the retained buffer, `None` if nothing was loaded
    pub fn reset(&self) -> Option<PixelBuffer> {
        self.slot().clone()
    }

    pub fn is_empty(&self) -> bool {
        self.slot().is_none()
    }

    pub fn clear(&self) {
        *self.slot() = None;
    }
}
