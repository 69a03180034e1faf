//! MuPDF-backed document source

use std::ops::Range;
use std::path::Path;

use log::{debug, info};
use mupdf::{Colorspace, Document, Matrix, Page, Pixmap};
use rayon::prelude::*;

use super::request::RasterError;
use super::source::{DocumentInfo, DocumentSource, VideoLink};
use super::types::{PageImage, SizeSpec};

/// A PDF on disk, rendered page-parallel on a private thread pool.
///
/// MuPDF documents are not shareable across threads, so each pool thread
/// opens its own handle for the duration of a chunk.
pub struct MupdfDocument {
    info: DocumentInfo,
    pool: rayon::ThreadPool,
}

impl MupdfDocument {
    /// Open and inspect `path`. Fails before any rendering if the file is
    /// missing, unreadable, or has no pages.
    pub fn open(
        path: &Path,
        page_limit: Option<usize>,
        render_threads: usize,
    ) -> Result<Self, RasterError> {
        let doc = Document::open(path.to_string_lossy().as_ref())
            .map_err(|e| RasterError::open(path, e))?;
        let total = doc
            .page_count()
            .map_err(|e| RasterError::open(path, e))?
            .max(0) as usize;
        let page_count = page_limit.map_or(total, |limit| limit.min(total));
        if page_count == 0 {
            return Err(RasterError::EmptyDocument {
                path: path.to_path_buf(),
            });
        }

        let first = doc.load_page(0).map_err(|e| RasterError::open(path, e))?;
        let (width, height) = page_extent(&first).map_err(|e| RasterError::open(path, e))?;

        let title = doc
            .metadata(mupdf::MetadataName::Title)
            .ok()
            .filter(|t| !t.is_empty());

        let doc_dir = path.parent().unwrap_or(Path::new("."));
        let video_links = collect_video_links(&doc, page_count, doc_dir);

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(render_threads.max(1))
            .thread_name(|i| format!("pdfdeck-render-{i}"))
            .build()
            .map_err(|e| RasterError::generic(format!("render thread pool: {e}")))?;

        info!(
            "opened {} ({page_count} of {total} pages, {width:.0}x{height:.0} pt, {} videos)",
            path.display(),
            video_links.len()
        );

        Ok(Self {
            info: DocumentInfo {
                path: path.to_path_buf(),
                page_count,
                aspect: width / height,
                title,
                video_links,
            },
            pool,
        })
    }
}

impl DocumentSource for MupdfDocument {
    fn info(&self) -> &DocumentInfo {
        &self.info
    }

    fn rasterize(&self, pages: Range<usize>, size: SizeSpec) -> Result<Vec<PageImage>, RasterError> {
        let (first, last) = (pages.start + 1, pages.end);
        let path = self.info.path.to_string_lossy().into_owned();
        debug!("rasterizing pages {first}..={last} at {size:?}");

        self.pool
            .install(|| {
                pages
                    .into_par_iter()
                    .map_init(
                        || Document::open(&path),
                        |doc, index| match doc {
                            Ok(doc) => render_page(doc, index, size),
                            Err(e) => Err(RasterError::generic(e.to_string())),
                        },
                    )
                    .collect::<Result<Vec<_>, _>>()
            })
            .map_err(|e| RasterError::Render {
                first,
                last,
                detail: e.to_string(),
            })
    }
}

fn page_extent(page: &Page) -> Result<(f32, f32), RasterError> {
    let bounds = page.bounds()?;
    let width = bounds.x1 - bounds.x0;
    let height = bounds.y1 - bounds.y0;
    if width <= 0.0 || height <= 0.0 {
        return Err(RasterError::generic(format!(
            "degenerate page bounds {width}x{height}"
        )));
    }
    Ok((width, height))
}

/// Render a single page
fn render_page(doc: &Document, index: usize, size: SizeSpec) -> Result<PageImage, RasterError> {
    let page = doc.load_page(index as i32)?;
    let (width, height) = page_extent(&page)?;
    let target = size.resolve(width, height);

    let transform = Matrix::new_scale(target.width as f32 / width, target.height as f32 / height);
    let pixmap = page.to_pixmap(&transform, &Colorspace::device_rgb(), false, false)?;
    pixmap_to_image(&pixmap)
}

fn pixmap_to_image(pixmap: &Pixmap) -> Result<PageImage, RasterError> {
    PageImage::from_samples(
        pixmap.width(),
        pixmap.height(),
        pixmap.n() as usize,
        pixmap.stride() as usize,
        pixmap.samples(),
    )
}

fn collect_video_links(doc: &Document, page_count: usize, doc_dir: &Path) -> Vec<VideoLink> {
    (0..page_count)
        .filter_map(|index| {
            let page = doc.load_page(index as i32).ok()?;
            let links = page.links().ok()?;
            Some(
                links
                    .filter_map(|link| VideoLink::from_uri(index, &link.uri, doc_dir))
                    .collect::<Vec<_>>(),
            )
        })
        .flatten()
        .collect()
}
