//! Interruptible background rasterization

pub mod cache;
pub mod geometry;
#[cfg(feature = "pdf")]
pub mod mupdf_source;
pub mod request;
pub mod service;
pub mod source;
pub mod types;
pub mod worker;

use std::time::Duration;

pub use cache::RenderCache;
pub use geometry::{Placement, boxfill_centered, raster_size_for_window};
#[cfg(feature = "pdf")]
pub use mupdf_source::MupdfDocument;
pub use request::{RasterError, RenderBatch, SizeSignal, WorkerEvent};
pub use service::Rasterizer;
pub use source::{DocumentInfo, DocumentSource, VideoLink};
pub use types::{PageImage, PageSet, RenderSize, SizeSpec};

/// Pages rendered per worker iteration; bounds cancellation latency.
pub const DEFAULT_CHUNK_PAGES: usize = 32;
/// Completed full-document renders kept per view.
pub const DEFAULT_CACHE_SIZE: usize = 4;
/// How long an idle worker waits for a signal before looping.
pub const DEFAULT_POLL_TIMEOUT: Duration = Duration::from_millis(100);

/// Leave one core for the display thread.
pub fn default_render_threads() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get().saturating_sub(1))
        .unwrap_or(1)
        .max(1)
}

/// Tuning for one [`Rasterizer`] and its worker
#[derive(Clone, Debug, PartialEq)]
pub struct RasterConfig {
    pub cache_capacity: usize,
    pub chunk_pages: usize,
    pub render_threads: usize,
    pub poll_timeout: Duration,
    /// Render only the first N pages
    pub page_limit: Option<usize>,
}

impl Default for RasterConfig {
    fn default() -> Self {
        Self {
            cache_capacity: DEFAULT_CACHE_SIZE,
            chunk_pages: DEFAULT_CHUNK_PAGES,
            render_threads: default_render_threads(),
            poll_timeout: DEFAULT_POLL_TIMEOUT,
            page_limit: None,
        }
    }
}
