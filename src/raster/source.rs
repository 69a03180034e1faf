use std::ops::Range;
use std::path::{Path, PathBuf};

use super::request::RasterError;
use super::types::{PageImage, SizeSpec};

/// Video overlay linked from a page with a `file://` URI
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VideoLink {
    /// Page index (0-based)
    pub page: usize,
    pub path: PathBuf,
}

impl VideoLink {
    /// Parse a link URI, resolving relative paths against `doc_dir`.
    pub fn from_uri(page: usize, uri: &str, doc_dir: &Path) -> Option<Self> {
        let raw = Path::new(uri.strip_prefix("file://")?);
        let path = if raw.is_absolute() {
            raw.to_path_buf()
        } else {
            doc_dir.join(raw)
        };
        Some(Self { page, path })
    }
}

/// Document metadata
#[derive(Clone, Debug, PartialEq)]
pub struct DocumentInfo {
    pub path: PathBuf,
    /// Pages that will be rendered, after any page limit
    pub page_count: usize,
    /// Width / height of the first page
    pub aspect: f32,
    pub title: Option<String>,
    pub video_links: Vec<VideoLink>,
}

impl DocumentInfo {
    /// The last link on `page` wins when there are several
    pub fn video_for_page(&self, page: usize) -> Option<&Path> {
        self.video_links
            .iter()
            .rev()
            .find(|link| link.page == page)
            .map(|link| link.path.as_path())
    }
}

/// A paginated document that can be rasterized at arbitrary sizes.
///
/// Implementations are moved onto the worker thread and called repeatedly
/// with different sizes for the lifetime of a view.
pub trait DocumentSource: Send + 'static {
    fn info(&self) -> &DocumentInfo;

    /// Render `pages` (0-based, end exclusive), one bitmap per page in order.
    fn rasterize(&self, pages: Range<usize>, size: SizeSpec) -> Result<Vec<PageImage>, RasterError>;
}
