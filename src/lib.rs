//! Slide deck presenter core.
//!
//! Two subsystems do the real work: [`raster`] turns document pages into
//! bitmaps on a background thread that can be interrupted by window resizes,
//! and [`inputs`] turns held navigation keys into a debounced, auto-repeating
//! slide cursor with dissolve timing. [`deck`] composes both into per-window
//! views without knowing anything about the windowing toolkit.

pub mod deck;
pub mod inputs;
pub mod panic_handler;
pub mod raster;
pub mod settings;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use inputs::{Cursor, Repeater};
pub use raster::{RasterConfig, RasterError, Rasterizer, RenderCache, RenderSize};
