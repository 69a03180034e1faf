//! Rasterizer - owns one worker thread and the render cache for one view

use std::thread::JoinHandle;
use std::time::Instant;

use flume::{Receiver, Sender, TryRecvError};
use log::{error, info, warn};

use super::RasterConfig;
use super::cache::RenderCache;
use super::request::{RasterError, RenderBatch, SizeSignal, WorkerEvent};
use super::source::{DocumentInfo, DocumentSource};
use super::types::{PageImage, PageSet, RenderSize};
use super::worker::{RasterWorker, WorkerConfig};

/// Poll/push front end over a background raster worker.
///
/// The display thread pushes sizes with [`Rasterizer::request_size`] and
/// asks for pages with [`Rasterizer::page`] on every redraw. Neither call
/// blocks. Sizes seen before come straight from the cache; anything else is
/// handed to the worker and shows up on a later poll.
pub struct Rasterizer {
    info: DocumentInfo,
    signal_tx: Sender<SizeSignal>,
    event_rx: Receiver<WorkerEvent>,
    worker: Option<JoinHandle<()>>,
    cache: RenderCache,
    current: Option<PageSet>,
    current_size: Option<RenderSize>,
    blank: Option<PageImage>,
    requested: Option<RenderSize>,
    render_started: Option<Instant>,
    stopped: bool,
}

impl Rasterizer {
    /// Open a PDF and start its worker.
    #[cfg(feature = "pdf")]
    pub fn open(path: &std::path::Path, config: &RasterConfig) -> Result<Self, RasterError> {
        let doc = super::MupdfDocument::open(path, config.page_limit, config.render_threads)?;
        Self::with_source(doc, config)
    }

    /// Start a worker over any document source.
    pub fn with_source<D: DocumentSource>(doc: D, config: &RasterConfig) -> Result<Self, RasterError> {
        let info = doc.info().clone();
        if info.page_count == 0 {
            return Err(RasterError::EmptyDocument { path: info.path });
        }

        let (signal_tx, signal_rx) = flume::unbounded();
        let (event_tx, event_rx) = flume::unbounded();

        let worker_config = WorkerConfig {
            chunk_pages: config.chunk_pages,
            poll_timeout: config.poll_timeout,
        };
        let worker = RasterWorker::new(doc, worker_config, signal_rx, event_tx);
        let handle = std::thread::Builder::new()
            .name("pdfdeck-raster".into())
            .spawn(move || worker.run())?;

        Ok(Self {
            info,
            signal_tx,
            event_rx,
            worker: Some(handle),
            cache: RenderCache::new(config.cache_capacity),
            current: None,
            current_size: None,
            blank: None,
            requested: None,
            render_started: None,
            stopped: false,
        })
    }

    /// Get document metadata
    #[must_use]
    pub fn info(&self) -> &DocumentInfo {
        &self.info
    }

    #[must_use]
    pub fn aspect(&self) -> f32 {
        self.info.aspect
    }

    #[must_use]
    pub fn page_count(&self) -> usize {
        self.info.page_count
    }

    /// Size of the page set currently being served
    #[must_use]
    pub fn current_size(&self) -> Option<RenderSize> {
        self.current_size
    }

    #[must_use]
    pub fn requested_size(&self) -> Option<RenderSize> {
        self.requested
    }

    #[must_use]
    pub fn cache(&self) -> &RenderCache {
        &self.cache
    }

    /// Ask for pages at `size`.
    ///
    /// A cached size is adopted immediately and the worker is told to idle,
    /// so a render for some earlier size cannot land on top of it.
    pub fn request_size(&mut self, size: RenderSize) {
        self.requested = Some(size);

        if let Some(pages) = self.cache.get(&size) {
            self.send(SizeSignal::Idle);
            self.adopt(size, pages);
            info!("retrieved {size} render from cache");
        } else {
            self.send(SizeSignal::Resize(size));
            self.render_started = Some(Instant::now());
        }
    }

    /// Collect any finished render without blocking.
    ///
    /// Every completed render is cached; it becomes current only if it
    /// matches the most recent request. Returns true if the current page set
    /// changed.
    pub fn poll(&mut self) -> Result<bool, RasterError> {
        if self.stopped {
            return Ok(false);
        }
        let mut adopted = false;
        loop {
            match self.event_rx.try_recv() {
                Ok(WorkerEvent::Completed(batch)) => adopted |= self.accept(batch),
                Ok(WorkerEvent::Failed(e)) => {
                    error!("rasterizing {} failed: {e}", self.info.path.display());
                    self.join_worker();
                    return Err(e);
                }
                Err(TryRecvError::Empty) => return Ok(adopted),
                Err(TryRecvError::Disconnected) => return Err(RasterError::WorkerGone),
            }
        }
    }

    /// Page `index` of the current render.
    ///
    /// `Ok(None)` until the first render completes. Indices past the end get
    /// an all-black page the size of page 0.
    pub fn page(&mut self, index: usize) -> Result<Option<&PageImage>, RasterError> {
        self.poll()?;
        Ok(self.peek(index))
    }

    /// Like [`Rasterizer::page`] without polling the worker
    #[must_use]
    pub fn peek(&self, index: usize) -> Option<&PageImage> {
        let pages = self.current.as_ref()?;
        pages.get(index).or(self.blank.as_ref())
    }

    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.current.is_some()
    }

    /// Stop the worker and wait for it. Safe to call more than once; once it
    /// returns no render can reach the cache.
    pub fn shutdown(&mut self) {
        if self.stopped {
            return;
        }
        self.stopped = true;
        if self.worker.is_some() {
            self.send(SizeSignal::Exit);
            self.join_worker();
        }
        // Anything the worker finished before exiting is dropped unseen.
        self.event_rx.drain().for_each(drop);
    }

    fn accept(&mut self, batch: RenderBatch) -> bool {
        let RenderBatch { size, pages } = batch;
        if let Some(started) = self.render_started {
            info!(
                "rendered {size} in {:.2} sec.",
                started.elapsed().as_secs_f64()
            );
        }
        if let Some(evicted) = self.cache.put(size, pages.clone()) {
            info!("evicted {evicted} render from cache");
        }

        if self.requested != Some(size) {
            info!("keeping stale {size} render cached but not current");
            return false;
        }
        self.adopt(size, pages);
        true
    }

    fn adopt(&mut self, size: RenderSize, pages: PageSet) {
        self.blank = pages.first().map(PageImage::blacked_out);
        self.current = Some(pages);
        self.current_size = Some(size);
    }

    fn send(&self, signal: SizeSignal) {
        if self.signal_tx.send(signal).is_err() {
            warn!("raster worker gone, dropped {signal:?}");
        }
    }

    fn join_worker(&mut self) {
        if let Some(handle) = self.worker.take() {
            if handle.join().is_err() {
                error!("raster worker for {} panicked", self.info.path.display());
            }
        }
    }
}

impl Drop for Rasterizer {
    fn drop(&mut self) {
        self.shutdown();
    }
}
