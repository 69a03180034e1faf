//! Raster worker - runs in a dedicated thread
//!
//! The worker renders the whole document at one target size, a chunk of
//! consecutive pages at a time. Between chunks it drains the signal channel
//! and acts only on the newest signal, so a burst of resizes restarts the
//! job once. A finished job is sent back exactly once; after that the worker
//! sits drained until the next size arrives.

use std::sync::Arc;
use std::time::Duration;

use flume::{Receiver, RecvTimeoutError, Sender, TryRecvError};
use log::{debug, error, info};

use super::request::{RasterError, RenderBatch, SizeSignal, WorkerEvent};
use super::source::DocumentSource;
use super::types::{PageImage, RenderSize, SizeSpec, VecExt as _};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WorkerConfig {
    pub chunk_pages: usize,
    /// Longest wait for a signal while there is no work
    pub poll_timeout: Duration,
}

/// One full-document render in progress
struct Job {
    target: RenderSize,
    /// 1-based index of the next page to render; past the end when done
    next_page: usize,
    pages: Vec<Option<PageImage>>,
}

impl Job {
    fn new(target: RenderSize, page_count: usize) -> Self {
        let mut pages = Vec::new();
        pages.reset_to_len(page_count);
        Self {
            target,
            next_page: 1,
            pages,
        }
    }

    fn restart(&mut self, target: RenderSize) {
        let page_count = self.pages.len();
        self.target = target;
        self.next_page = 1;
        self.pages.reset_to_len(page_count);
    }

    fn is_complete(&self) -> bool {
        self.next_page > self.pages.len()
    }
}

enum WorkerState {
    AwaitingFirstSize,
    Rendering(Job),
    /// Finished or idled; nothing to do until a new size
    Drained,
    Exited,
}

pub struct RasterWorker<D> {
    doc: D,
    config: WorkerConfig,
    signals: Receiver<SizeSignal>,
    events: Sender<WorkerEvent>,
}

impl<D: DocumentSource> RasterWorker<D> {
    pub fn new(
        doc: D,
        config: WorkerConfig,
        signals: Receiver<SizeSignal>,
        events: Sender<WorkerEvent>,
    ) -> Self {
        Self {
            doc,
            config,
            signals,
            events,
        }
    }

    /// Main worker loop; returns once told to exit or after a failed pass.
    pub fn run(self) {
        let mut state = WorkerState::AwaitingFirstSize;
        loop {
            state = match state {
                WorkerState::AwaitingFirstSize => self.await_first_size(),
                WorkerState::Rendering(job) => match self.latest_signal(None) {
                    Some(signal) => self.apply(signal, Some(job)),
                    None => self.advance(job),
                },
                WorkerState::Drained => match self.latest_signal(Some(self.config.poll_timeout)) {
                    Some(signal) => self.apply(signal, None),
                    None => WorkerState::Drained,
                },
                WorkerState::Exited => break,
            };
        }
        debug!("raster worker for {} exited", self.doc.info().path.display());
    }

    fn await_first_size(&self) -> WorkerState {
        match self.signals.recv() {
            Ok(SizeSignal::Resize(size)) => self.start(size, None),
            Ok(SizeSignal::Idle) => WorkerState::AwaitingFirstSize,
            Ok(SizeSignal::Exit) | Err(_) => WorkerState::Exited,
        }
    }

    /// Drain the channel and return the newest signal, if any.
    ///
    /// Waits up to `wait` for the first signal, otherwise does not block.
    /// Exit wins over anything queued after it; a dropped sender counts as
    /// exit.
    fn latest_signal(&self, wait: Option<Duration>) -> Option<SizeSignal> {
        let first = match wait {
            Some(timeout) => match self.signals.recv_timeout(timeout) {
                Ok(signal) => signal,
                Err(RecvTimeoutError::Timeout) => return None,
                Err(RecvTimeoutError::Disconnected) => return Some(SizeSignal::Exit),
            },
            None => match self.signals.try_recv() {
                Ok(signal) => signal,
                Err(TryRecvError::Empty) => return None,
                Err(TryRecvError::Disconnected) => return Some(SizeSignal::Exit),
            },
        };

        let mut latest = first;
        let mut superseded = 0usize;
        while let Ok(next) = self.signals.try_recv() {
            if latest != SizeSignal::Exit {
                latest = next;
                superseded += 1;
            }
        }
        if superseded > 0 {
            debug!("coalesced {superseded} queued signals into {latest:?}");
        }
        Some(latest)
    }

    fn apply(&self, signal: SizeSignal, job: Option<Job>) -> WorkerState {
        match signal {
            SizeSignal::Resize(size) => self.start(size, job),
            SizeSignal::Idle => {
                if let Some(job) = job {
                    debug!("abandoning render at {} on idle", job.target);
                }
                WorkerState::Drained
            }
            SizeSignal::Exit => WorkerState::Exited,
        }
    }

    fn start(&self, size: RenderSize, job: Option<Job>) -> WorkerState {
        let job = match job {
            Some(mut job) => {
                info!(
                    "render at {} superseded after {} pages, restarting at {size}",
                    job.target,
                    job.next_page - 1
                );
                job.restart(size);
                job
            }
            None => {
                info!("rendering at {size}");
                Job::new(size, self.doc.info().page_count)
            }
        };
        WorkerState::Rendering(job)
    }

    fn advance(&self, mut job: Job) -> WorkerState {
        if !job.is_complete() {
            if let Err(e) = self.render_chunk(&mut job) {
                error!("render at {} failed: {e}", job.target);
                let _ = self.events.send(WorkerEvent::Failed(e));
                return WorkerState::Exited;
            }
        }
        if job.is_complete() {
            return self.finish(job);
        }
        WorkerState::Rendering(job)
    }

    fn render_chunk(&self, job: &mut Job) -> Result<(), RasterError> {
        let info = self.doc.info();
        let first = job.next_page;
        let last = first
            .saturating_add(self.config.chunk_pages.max(1) - 1)
            .min(job.pages.len());
        let spec = SizeSpec::fit_within(job.target, info.aspect);

        let images = self.doc.rasterize(first - 1..last, spec)?;
        let expected = last + 1 - first;
        if images.len() != expected {
            return Err(RasterError::Render {
                first,
                last,
                detail: format!("expected {expected} pages, got {}", images.len()),
            });
        }

        for (slot, image) in job.pages[first - 1..last].iter_mut().zip(images) {
            *slot = Some(image);
        }
        job.next_page = last + 1;
        debug!("rendered pages {first}..={last} at {}", job.target);
        Ok(())
    }

    fn finish(&self, mut job: Job) -> WorkerState {
        let Some(pages) = std::mem::take(&mut job.pages)
            .into_iter()
            .collect::<Option<Vec<_>>>()
        else {
            let e = RasterError::generic(format!("render at {} left pages missing", job.target));
            let _ = self.events.send(WorkerEvent::Failed(e));
            return WorkerState::Exited;
        };

        let batch = RenderBatch {
            size: job.target,
            pages: Arc::from(pages),
        };
        if self.events.send(WorkerEvent::Completed(batch)).is_err() {
            return WorkerState::Exited;
        }
        WorkerState::Drained
    }
}

#[cfg(test)]
mod tests {
    use std::thread;

    use super::*;
    use crate::test_utils::{FakeDocument, RasterCall};

    const CONFIG: WorkerConfig = WorkerConfig {
        chunk_pages: 2,
        poll_timeout: Duration::from_millis(5),
    };

    fn spawn(doc: FakeDocument) -> (Sender<SizeSignal>, Receiver<WorkerEvent>, thread::JoinHandle<()>) {
        spawn_with(doc, CONFIG)
    }

    fn spawn_with(
        doc: FakeDocument,
        config: WorkerConfig,
    ) -> (Sender<SizeSignal>, Receiver<WorkerEvent>, thread::JoinHandle<()>) {
        let (signal_tx, signal_rx) = flume::unbounded();
        let (event_tx, event_rx) = flume::unbounded();
        let worker = RasterWorker::new(doc, config, signal_rx, event_tx);
        let handle = thread::spawn(move || worker.run());
        (signal_tx, event_rx, handle)
    }

    fn expect_batch(events: &Receiver<WorkerEvent>) -> RenderBatch {
        match events.recv_timeout(Duration::from_secs(5)) {
            Ok(WorkerEvent::Completed(batch)) => batch,
            other => panic!("expected a completed batch, got {other:?}"),
        }
    }

    #[test]
    fn renders_in_chunks_and_emits_once() {
        let doc = FakeDocument::new(5, 4.0 / 3.0);
        let handle = doc.handle();
        let (signals, events, worker) = spawn(doc);

        let size = RenderSize::new(400, 300);
        signals.send(SizeSignal::Resize(size)).unwrap();
        let batch = expect_batch(&events);
        assert_eq!(batch.size, size);
        assert_eq!(batch.pages.len(), 5);
        assert_eq!(batch.pages[4].size(), size);

        let ranges: Vec<_> = handle.calls().iter().map(|c| c.pages.clone()).collect();
        assert_eq!(ranges, vec![0..2, 2..4, 4..5]);

        // Drained: nothing more without a new size.
        assert!(events.recv_timeout(Duration::from_millis(50)).is_err());

        signals.send(SizeSignal::Exit).unwrap();
        worker.join().unwrap();
    }

    #[test]
    fn nothing_renders_before_first_size() {
        let doc = FakeDocument::new(3, 1.0);
        let handle = doc.handle();
        let (signals, _events, worker) = spawn(doc);

        signals.send(SizeSignal::Idle).unwrap();
        thread::sleep(Duration::from_millis(30));
        assert!(handle.calls().is_empty());

        signals.send(SizeSignal::Exit).unwrap();
        worker.join().unwrap();
    }

    #[test]
    fn idle_abandons_job_without_emitting() {
        let doc = FakeDocument::new(6, 1.0).gated();
        let handle = doc.handle();
        let (signals, events, worker) = spawn(doc);

        signals.send(SizeSignal::Resize(RenderSize::new(100, 100))).unwrap();
        handle.wait_for_calls(1);
        signals.send(SizeSignal::Idle).unwrap();
        handle.open_gate();

        assert!(events.recv_timeout(Duration::from_millis(100)).is_err());
        assert_eq!(handle.calls().len(), 1);

        signals.send(SizeSignal::Exit).unwrap();
        worker.join().unwrap();
    }

    #[test]
    fn failure_is_reported_and_stops_worker() {
        let doc = FakeDocument::new(4, 1.0).failing_at(3);
        let (signals, events, worker) = spawn(doc);

        signals.send(SizeSignal::Resize(RenderSize::new(10, 10))).unwrap();
        match events.recv_timeout(Duration::from_secs(5)) {
            Ok(WorkerEvent::Failed(RasterError::Render { first, last, .. })) => {
                assert_eq!((first, last), (3, 4));
            }
            other => panic!("expected a render failure, got {other:?}"),
        }
        worker.join().unwrap();
        assert!(signals.send(SizeSignal::Exit).is_err());
    }

    #[test]
    fn exit_beats_later_signals_in_same_drain() {
        let doc = FakeDocument::new(4, 1.0).gated();
        let handle = doc.handle();
        let (signals, _events, worker) = spawn(doc);

        signals.send(SizeSignal::Resize(RenderSize::new(10, 10))).unwrap();
        handle.wait_for_calls(1);
        signals.send(SizeSignal::Exit).unwrap();
        signals.send(SizeSignal::Resize(RenderSize::new(20, 20))).unwrap();
        handle.open_gate();

        worker.join().unwrap();
        assert!(
            handle
                .calls()
                .iter()
                .all(|c: &RasterCall| c.output == RenderSize::new(10, 10))
        );
    }

    #[test]
    fn dropped_sender_stops_worker() {
        let doc = FakeDocument::new(2, 1.0);
        let (signals, _events, worker) = spawn(doc);
        drop(signals);
        worker.join().unwrap();
    }

    #[test]
    fn oversized_chunk_renders_whole_document_at_once() {
        let doc = FakeDocument::new(10, 1.0);
        let handle = doc.handle();
        let config = WorkerConfig {
            chunk_pages: usize::MAX,
            ..CONFIG
        };
        let (signals, events, worker) = spawn_with(doc, config);

        signals.send(SizeSignal::Resize(RenderSize::new(10, 10))).unwrap();
        let batch = expect_batch(&events);
        assert_eq!(batch.pages.len(), 10);

        let ranges: Vec<_> = handle.calls().iter().map(|c| c.pages.clone()).collect();
        assert_eq!(ranges, vec![0..10]);

        signals.send(SizeSignal::Exit).unwrap();
        worker.join().unwrap();
    }
}
