//! In-memory document source for exercising the raster pipeline

use std::ops::Range;
use std::path::PathBuf;
use std::sync::{Arc, Condvar, Mutex, PoisonError};
use std::time::{Duration, Instant};

use crate::raster::{
    DocumentInfo, DocumentSource, PageImage, RasterError, Rasterizer, RenderSize, SizeSpec,
    VideoLink,
};

const WAIT_LIMIT: Duration = Duration::from_secs(5);
const PAGE_HEIGHT_PT: f32 = 100.0;

/// One `rasterize` call as seen by the fake
#[derive(Clone, Debug, PartialEq)]
pub struct RasterCall {
    pub pages: Range<usize>,
    pub size: SizeSpec,
    /// Pixel size every page in the call was rendered at
    pub output: RenderSize,
}

#[derive(Default)]
struct Shared {
    calls: Mutex<Vec<RasterCall>>,
    calls_changed: Condvar,
    gate_open: Mutex<bool>,
    gate_changed: Condvar,
}

/// Fake document: uniform pages, recorded calls, optional gate and failure.
///
/// A gated fake blocks inside `rasterize` until [`FakeHandle::open_gate`],
/// which lets tests queue signals while the worker is mid-chunk.
pub struct FakeDocument {
    info: DocumentInfo,
    fail_page: Option<usize>,
    delay: Duration,
    shared: Arc<Shared>,
}

impl FakeDocument {
    pub fn new(page_count: usize, aspect: f32) -> Self {
        let shared = Shared {
            gate_open: Mutex::new(true),
            ..Shared::default()
        };
        Self {
            info: DocumentInfo {
                path: PathBuf::from("fake.pdf"),
                page_count,
                aspect,
                title: Some("Fake deck".to_string()),
                video_links: Vec::new(),
            },
            fail_page: None,
            delay: Duration::ZERO,
            shared: Arc::new(shared),
        }
    }

    /// Block every `rasterize` call until the gate is opened
    pub fn gated(self) -> Self {
        *lock(&self.shared.gate_open) = false;
        self
    }

    /// Fail any chunk containing this 1-based page
    pub fn failing_at(mut self, page: usize) -> Self {
        self.fail_page = Some(page);
        self
    }

    /// Sleep this long in every `rasterize` call
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn with_videos(mut self, links: Vec<VideoLink>) -> Self {
        self.info.video_links = links;
        self
    }

    pub fn handle(&self) -> FakeHandle {
        FakeHandle {
            shared: Arc::clone(&self.shared),
        }
    }

    fn page_points(&self) -> (f32, f32) {
        (self.info.aspect * PAGE_HEIGHT_PT, PAGE_HEIGHT_PT)
    }
}

impl DocumentSource for FakeDocument {
    fn info(&self) -> &DocumentInfo {
        &self.info
    }

    fn rasterize(&self, pages: Range<usize>, size: SizeSpec) -> Result<Vec<PageImage>, RasterError> {
        let (width, height) = self.page_points();
        let output = size.resolve(width, height);
        {
            let mut calls = lock(&self.shared.calls);
            calls.push(RasterCall {
                pages: pages.clone(),
                size,
                output,
            });
            self.shared.calls_changed.notify_all();
        }

        let mut open = lock(&self.shared.gate_open);
        while !*open {
            open = self
                .shared
                .gate_changed
                .wait(open)
                .unwrap_or_else(PoisonError::into_inner);
        }
        drop(open);

        if !self.delay.is_zero() {
            std::thread::sleep(self.delay);
        }

        if let Some(bad) = self.fail_page {
            if pages.contains(&(bad - 1)) {
                return Err(RasterError::Render {
                    first: pages.start + 1,
                    last: pages.end,
                    detail: format!("page {bad} is corrupt"),
                });
            }
        }

        Ok(pages
            .map(|index| PageImage::solid(output.width, output.height, page_colour(index)))
            .collect())
    }
}

/// Colour the fake paints page `index` with
pub fn page_colour(index: usize) -> [u8; 3] {
    [40 + (index % 200) as u8, 80, 120]
}

/// Test-side view of a [`FakeDocument`] that has moved to a worker
#[derive(Clone)]
pub struct FakeHandle {
    shared: Arc<Shared>,
}

impl FakeHandle {
    pub fn calls(&self) -> Vec<RasterCall> {
        lock(&self.shared.calls).clone()
    }

    /// Block until at least `n` calls have started
    pub fn wait_for_calls(&self, n: usize) {
        let deadline = Instant::now() + WAIT_LIMIT;
        let mut calls = lock(&self.shared.calls);
        while calls.len() < n {
            let left = deadline.saturating_duration_since(Instant::now());
            assert!(!left.is_zero(), "timed out waiting for {n} rasterize calls");
            calls = self
                .shared
                .calls_changed
                .wait_timeout(calls, left)
                .unwrap_or_else(PoisonError::into_inner)
                .0;
        }
    }

    pub fn open_gate(&self) {
        *lock(&self.shared.gate_open) = true;
        self.shared.gate_changed.notify_all();
    }

    pub fn close_gate(&self) {
        *lock(&self.shared.gate_open) = false;
    }
}

/// Poll until page `index` is available, panicking after a few seconds
pub fn wait_for_page(raster: &mut Rasterizer, index: usize) -> PageImage {
    let deadline = Instant::now() + WAIT_LIMIT;
    loop {
        match raster.page(index) {
            Ok(Some(page)) => return page.clone(),
            Ok(None) => {}
            Err(e) => panic!("render failed: {e}"),
        }
        assert!(Instant::now() < deadline, "timed out waiting for page {index}");
        std::thread::sleep(Duration::from_millis(2));
    }
}

/// Poll until the rasterizer serves pages at `size`
pub fn wait_for_size(raster: &mut Rasterizer, size: RenderSize) {
    let deadline = Instant::now() + WAIT_LIMIT;
    loop {
        if let Err(e) = raster.poll() {
            panic!("render failed: {e}");
        }
        if raster.current_size() == Some(size) {
            return;
        }
        assert!(Instant::now() < deadline, "timed out waiting for {size}");
        std::thread::sleep(Duration::from_millis(2));
    }
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
