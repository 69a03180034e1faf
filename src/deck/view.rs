//! Per-window composition of the current and previous slide

use std::path::Path;
use std::time::Instant;

use log::debug;

use super::frame::{Canvas, Frame, Label, Player, VideoFrame};
use super::timer::CountdownTimer;
use crate::inputs::Cursor;
use crate::raster::geometry::{letterboxes, presenter};
use crate::raster::{DocumentInfo, Placement, RasterError, Rasterizer, boxfill_centered};
use crate::raster::{RenderSize, raster_size_for_window};

const LOADING_TEXT: &str = "Rasterizing";
const LOADING_HEIGHT: f32 = 24.0;
const LOADING_COLOR: [u8; 4] = [255, 255, 255, 255];

/// Which side of the podium a window faces
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Role {
    /// Shows the current slide
    Audience,
    /// Shows the upcoming slide
    Presenter,
}

impl Role {
    pub fn offset(self) -> usize {
        match self {
            Self::Audience => 0,
            Self::Presenter => 1,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DrawOutcome {
    /// A frame was not rendered yet; only the spinner was drawn
    Loading,
    Drawn,
}

/// One window onto the deck.
///
/// Holds one frame per page plus a trailing blank end-of-deck frame, and
/// dissolves between the cursor's previous and current positions.
pub struct View {
    role: Role,
    frames: Vec<Frame>,
    timer: Option<CountdownTimer>,
    ticks: u64,
    window: (u32, u32),
    image_height: u32,
}

impl View {
    /// Build frames for `info`, asking `players` for a player per video link.
    /// Pages whose video cannot be opened fall back to the rendered page.
    pub fn new<F>(role: Role, info: &DocumentInfo, mut players: F) -> Self
    where
        F: FnMut(&Path) -> Option<Box<dyn Player>>,
    {
        let mut frames: Vec<Frame> = (0..info.page_count)
            .map(|index| {
                info.video_for_page(index)
                    .and_then(|path| {
                        let player = players(path)?;
                        Some(Frame::Video(VideoFrame::new(path.to_path_buf(), player)))
                    })
                    .unwrap_or_else(|| Frame::page(index))
            })
            .collect();
        frames.push(Frame::page(info.page_count));

        Self {
            role,
            frames,
            timer: None,
            ticks: 0,
            window: (0, 0),
            image_height: 0,
        }
    }

    pub fn with_timer(mut self, timer: CountdownTimer) -> Self {
        self.timer = Some(timer);
        self
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn frames(&self) -> &[Frame] {
        &self.frames
    }

    /// Recompute the slide area and request a matching raster size.
    pub fn resize(&mut self, raster: &mut Rasterizer, width: u32, height: u32) -> RenderSize {
        self.window = (width, height);
        self.image_height = if self.timer.is_some() {
            presenter::image_height(height)
        } else {
            height
        };
        let size = raster_size_for_window(raster.aspect(), width, self.image_height);
        debug!("{:?} window {width}x{height} requests {size}", self.role);
        raster.request_size(size);
        size
    }

    pub fn draw(
        &mut self,
        raster: &mut Rasterizer,
        cursor: &Cursor,
        canvas: &mut dyn Canvas,
        now: Instant,
    ) -> Result<DrawOutcome, RasterError> {
        self.ticks += 1;
        canvas.clear();

        let last = self.frames.len() - 1;
        let offset = self.role.offset();
        let prev = (cursor.previous_position() + offset).min(last);
        let cur = (cursor.position() + offset).min(last);

        for index in [prev, cur] {
            if !self.frames[index].is_ready(raster)? {
                self.draw_loading(canvas);
                return Ok(DrawOutcome::Loading);
            }
        }

        let (box_w, box_h) = (self.window.0 as f32, self.image_height as f32);
        let y0 = self.window.1.saturating_sub(self.image_height) as f32;
        let place = |frame: &Frame| {
            let fit = boxfill_centered(frame.aspect(raster), 1.0, box_w, box_h);
            let at = Placement {
                x: fit.x.trunc(),
                y: (fit.y + y0).trunc(),
                scale: fit.scale,
            };
            (fit, at)
        };
        let (_, prev_at) = place(&self.frames[prev]);
        let (cur_fit, cur_at) = place(&self.frames[cur]);

        let blend = cursor.blend();
        if blend < 1.0 {
            self.frames[prev].draw(raster, canvas, prev_at, u8::MAX);
            self.frames[cur].on_revealed();
        } else {
            self.frames[cur].on_foregrounded();
            self.frames[prev].on_hidden();
        }
        let opacity = (f32::from(u8::MAX) * blend) as u8;
        self.frames[cur].draw(raster, canvas, cur_at, opacity);

        let cur_aspect = self.frames[cur].aspect(raster);
        for mut bar in letterboxes(cur_fit, cur_aspect, box_w, box_h) {
            bar.y += y0;
            canvas.fill_rect(bar, opacity);
        }

        if let Some(timer) = self.timer.as_mut() {
            let reading = timer.reading_at(now);
            let (height, baseline) = presenter::timer_metrics(self.window.1, self.image_height);
            canvas.draw_label(&Label {
                text: reading.text,
                x: box_w / 2.0,
                y: baseline,
                height,
                color: reading.color,
            });
        }

        Ok(DrawOutcome::Drawn)
    }

    fn draw_loading(&self, canvas: &mut dyn Canvas) {
        let k = (self.ticks % 4) as usize;
        let text = format!("{}{LOADING_TEXT}{}", " ".repeat(k), ".".repeat(k));
        canvas.draw_label(&Label {
            text,
            x: (self.window.0 / 2) as f32,
            y: (self.window.1 / 2) as f32,
            height: LOADING_HEIGHT,
            color: LOADING_COLOR,
        });
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::path::PathBuf;
    use std::rc::Rc;
    use std::time::Duration;

    use super::*;
    use crate::raster::geometry::Rect;
    use crate::raster::{PageImage, RasterConfig, VideoLink};
    use crate::test_utils::{FakeDocument, wait_for_page};

    #[derive(Debug, PartialEq)]
    enum Op {
        Clear,
        Page { x: f32, y: f32, scale: f32, opacity: u8 },
        Video { opacity: u8 },
        Bar(Rect),
        Label(String),
    }

    #[derive(Default)]
    struct Recorder {
        ops: Vec<Op>,
    }

    impl Canvas for Recorder {
        fn clear(&mut self) {
            self.ops.push(Op::Clear);
        }

        fn draw_page(&mut self, _image: &PageImage, x: f32, y: f32, scale: f32, opacity: u8) {
            self.ops.push(Op::Page { x, y, scale, opacity });
        }

        fn draw_video(&mut self, _player: &dyn Player, _x: f32, _y: f32, _h: f32, opacity: u8) {
            self.ops.push(Op::Video { opacity });
        }

        fn fill_rect(&mut self, rect: Rect, _opacity: u8) {
            self.ops.push(Op::Bar(rect));
        }

        fn draw_label(&mut self, label: &Label) {
            self.ops.push(Op::Label(label.text.clone()));
        }
    }

    #[derive(Clone, Default)]
    struct PlayerLog(Rc<RefCell<Vec<&'static str>>>);

    struct FakePlayer {
        log: PlayerLog,
        playing: bool,
    }

    impl Player for FakePlayer {
        fn aspect(&self) -> f32 {
            2.0
        }
        fn seek_to_start(&mut self) {
            self.log.0.borrow_mut().push("seek");
        }
        fn play(&mut self) {
            self.playing = true;
            self.log.0.borrow_mut().push("play");
        }
        fn pause(&mut self) {
            self.playing = false;
            self.log.0.borrow_mut().push("pause");
        }
        fn is_playing(&self) -> bool {
            self.playing
        }
    }

    fn no_players(_: &Path) -> Option<Box<dyn Player>> {
        None
    }

    fn rasterizer(doc: FakeDocument) -> Rasterizer {
        Rasterizer::with_source(doc, &RasterConfig::default()).unwrap()
    }

    #[test]
    fn audience_and_presenter_offsets() {
        assert_eq!(Role::Audience.offset(), 0);
        assert_eq!(Role::Presenter.offset(), 1);
    }

    #[test]
    fn spinner_until_rendered() {
        let doc = FakeDocument::new(3, 2.0).gated();
        let handle = doc.handle();
        let mut raster = rasterizer(doc);
        let mut view = View::new(Role::Audience, raster.info(), no_players);
        assert_eq!(view.frames().len(), 4);

        view.resize(&mut raster, 400, 200);
        let cursor = Cursor::new(3);
        let mut canvas = Recorder::default();
        let outcome = view.draw(&mut raster, &cursor, &mut canvas, Instant::now()).unwrap();
        assert_eq!(outcome, DrawOutcome::Loading);
        assert_eq!(canvas.ops[0], Op::Clear);
        assert_eq!(canvas.ops[1], Op::Label(" Rasterizing.".to_string()));

        handle.open_gate();
        wait_for_page(&mut raster, 0);
        let mut canvas = Recorder::default();
        let outcome = view.draw(&mut raster, &cursor, &mut canvas, Instant::now()).unwrap();
        assert_eq!(outcome, DrawOutcome::Drawn);
        assert!(canvas.ops.contains(&Op::Page {
            x: 0.0,
            y: 0.0,
            scale: 1.0,
            opacity: 255
        }));
    }

    #[test]
    fn dissolve_draws_both_frames() {
        let mut raster = rasterizer(FakeDocument::new(3, 2.0));
        let mut view = View::new(Role::Audience, raster.info(), no_players);
        view.resize(&mut raster, 400, 200);
        wait_for_page(&mut raster, 0);

        let mut cursor = Cursor::new(3);
        cursor.tick(Duration::from_millis(10), false, true);
        cursor.tick(Duration::from_millis(10), false, false);
        assert_eq!(cursor.position(), 1);

        let mut canvas = Recorder::default();
        view.draw(&mut raster, &cursor, &mut canvas, Instant::now()).unwrap();
        let pages: Vec<u8> = canvas
            .ops
            .iter()
            .filter_map(|op| match op {
                Op::Page { opacity, .. } => Some(*opacity),
                _ => None,
            })
            .collect();
        assert_eq!(pages.len(), 2);
        assert_eq!(pages[0], 255);
        assert!(pages[1] < 255);
    }

    #[test]
    fn presenter_shows_next_slide_and_timer() {
        let mut raster = rasterizer(FakeDocument::new(2, 2.0));
        let timer = CountdownTimer::new(Duration::from_secs(300));
        let mut view =
            View::new(Role::Presenter, raster.info(), no_players).with_timer(timer);
        let size = view.resize(&mut raster, 1000, 1000);
        assert_eq!(size, RenderSize::new(1000, 500));
        wait_for_page(&mut raster, 0);

        let mut cursor = Cursor::new(2);
        let mut canvas = Recorder::default();
        view.draw(&mut raster, &cursor, &mut canvas, Instant::now()).unwrap();
        assert!(canvas.ops.contains(&Op::Label("05:00".to_string())));

        // last slide: the presenter looks at the blank end page
        cursor.tick(Duration::from_millis(10), false, true);
        cursor.tick(Duration::from_secs(1), false, false);
        let mut canvas = Recorder::default();
        let outcome = view.draw(&mut raster, &cursor, &mut canvas, Instant::now()).unwrap();
        assert_eq!(outcome, DrawOutcome::Drawn);
        let bars: Vec<&Rect> = canvas
            .ops
            .iter()
            .filter_map(|op| match op {
                Op::Bar(rect) => Some(rect),
                _ => None,
            })
            .collect();
        assert_eq!(bars.len(), 2);
        let y0 = (1000 - presenter::image_height(1000)) as f32;
        assert!(bars.iter().all(|bar| bar.y >= y0));
    }

    #[test]
    fn video_frames_follow_lifecycle() {
        let doc = FakeDocument::new(2, 2.0).with_videos(vec![VideoLink {
            page: 1,
            path: PathBuf::from("/talk/clip.mp4"),
        }]);
        let mut raster = rasterizer(doc);
        let log = PlayerLog::default();
        let factory_log = log.clone();
        let mut view = View::new(Role::Audience, raster.info(), move |_: &Path| {
            Some(Box::new(FakePlayer {
                log: factory_log.clone(),
                playing: false,
            }) as Box<dyn Player>)
        });
        assert!(matches!(view.frames()[1], Frame::Video(_)));
        view.resize(&mut raster, 400, 200);
        wait_for_page(&mut raster, 0);
        log.0.borrow_mut().clear();

        let mut cursor = Cursor::new(2);
        cursor.tick(Duration::from_millis(10), false, true);
        cursor.tick(Duration::from_millis(10), false, false);
        let mut canvas = Recorder::default();
        view.draw(&mut raster, &cursor, &mut canvas, Instant::now()).unwrap();
        assert_eq!(*log.0.borrow(), vec!["seek"]);

        cursor.tick(Duration::from_secs(1), false, false);
        let mut canvas = Recorder::default();
        view.draw(&mut raster, &cursor, &mut canvas, Instant::now()).unwrap();
        assert_eq!(*log.0.borrow(), vec!["seek", "play"]);
        assert!(canvas.ops.contains(&Op::Video { opacity: 255 }));
    }
}
