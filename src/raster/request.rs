//! Messages exchanged with the raster worker

use std::path::PathBuf;

use super::types::{PageSet, RenderSize};

/// Control signal sent to the raster worker.
///
/// Signals share one FIFO channel; the worker acts only on the newest
/// signal in each drain pass.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SizeSignal {
    /// Start over at this size
    Resize(RenderSize),
    /// Abandon the job in progress and wait for a new size
    Idle,
    /// Stop the worker thread
    Exit,
}

/// Errors from opening or rasterizing a document
#[derive(Debug, thiserror::Error)]
pub enum RasterError {
    #[error("cannot open {}: {detail}", path.display())]
    Open { path: PathBuf, detail: String },

    #[error("{} has no pages", path.display())]
    EmptyDocument { path: PathBuf },

    #[error("rendering pages {first}..={last} failed: {detail}")]
    Render {
        first: usize,
        last: usize,
        detail: String,
    },

    #[error("raster worker is no longer running")]
    WorkerGone,

    #[error("cannot start raster worker: {0}")]
    Spawn(#[from] std::io::Error),

    #[cfg(feature = "pdf")]
    #[error("PDF engine: {0}")]
    Pdf(#[from] mupdf::error::Error),

    #[error("{detail}")]
    Generic { detail: String },
}

impl RasterError {
    pub fn generic(msg: impl Into<String>) -> Self {
        Self::Generic { detail: msg.into() }
    }

    pub fn open(path: impl Into<PathBuf>, detail: impl ToString) -> Self {
        Self::Open {
            path: path.into(),
            detail: detail.to_string(),
        }
    }
}

/// A full-document render at one size
#[derive(Clone, Debug)]
pub struct RenderBatch {
    pub size: RenderSize,
    pub pages: PageSet,
}

/// Sent from the worker back to the rasterizer
#[derive(Debug)]
pub enum WorkerEvent {
    /// Every page rendered at `batch.size`
    Completed(RenderBatch),
    /// The render pass failed; the worker has stopped
    Failed(RasterError),
}
