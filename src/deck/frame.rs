//! Things a slide position can show

use std::path::{Path, PathBuf};

use crate::raster::geometry::Rect;
use crate::raster::{PageImage, Placement, RasterError, Rasterizer};

/// Scale within this distance of 1:1 is snapped to exactly 1:1
const PIXEL_SNAP: f32 = 1e-2;

/// Video playback, provided by the windowing layer.
pub trait Player {
    fn aspect(&self) -> f32;
    fn seek_to_start(&mut self);
    fn play(&mut self);
    fn pause(&mut self);
    fn is_playing(&self) -> bool;
}

/// Text drawn by a view, positioned by its centre-x and baseline
#[derive(Clone, Debug, PartialEq)]
pub struct Label {
    pub text: String,
    pub x: f32,
    pub y: f32,
    /// Cap height in pixels; the canvas picks a font size to match
    pub height: f32,
    pub color: [u8; 4],
}

/// Draw target, provided by the windowing layer. Origin is bottom-left.
pub trait Canvas {
    fn clear(&mut self);

    /// Draw `image` with its bottom-left corner at `(x, y)`, scaled by `scale`
    fn draw_page(&mut self, image: &PageImage, x: f32, y: f32, scale: f32, opacity: u8);

    /// Draw the player's current frame `height` pixels tall
    fn draw_video(&mut self, player: &dyn Player, x: f32, y: f32, height: f32, opacity: u8);

    /// Solid black rectangle
    fn fill_rect(&mut self, rect: Rect, opacity: u8);

    fn draw_label(&mut self, label: &Label);
}

/// A rasterized document page; indices past the end show the blank page
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PageFrame {
    pub index: usize,
}

/// A video overlay replacing one page
pub struct VideoFrame {
    path: PathBuf,
    player: Box<dyn Player>,
}

impl VideoFrame {
    pub fn new(path: PathBuf, mut player: Box<dyn Player>) -> Self {
        player.pause();
        player.seek_to_start();
        Self { path, player }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn player(&self) -> &dyn Player {
        self.player.as_ref()
    }
}

impl std::fmt::Debug for VideoFrame {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VideoFrame")
            .field("path", &self.path)
            .field("playing", &self.player.is_playing())
            .finish_non_exhaustive()
    }
}

/// One slide position's content.
///
/// Views drive frames through the same lifecycle regardless of kind:
/// revealed while dissolving in, foregrounded once fully shown, hidden once
/// dissolved away.
#[derive(Debug)]
pub enum Frame {
    Page(PageFrame),
    Video(VideoFrame),
}

impl Frame {
    pub fn page(index: usize) -> Self {
        Self::Page(PageFrame { index })
    }

    /// Polls the rasterizer for page frames.
    pub fn is_ready(&self, raster: &mut Rasterizer) -> Result<bool, RasterError> {
        match self {
            Self::Page(page) => Ok(raster.page(page.index)?.is_some()),
            Self::Video(_) => Ok(true),
        }
    }

    pub fn aspect(&self, raster: &Rasterizer) -> f32 {
        match self {
            Self::Page(_) => raster.aspect(),
            Self::Video(video) => video.player.aspect(),
        }
    }

    pub fn on_revealed(&mut self) {
        if let Self::Video(video) = self {
            video.player.seek_to_start();
        }
    }

    pub fn on_foregrounded(&mut self) {
        if let Self::Video(video) = self {
            if !video.player.is_playing() {
                video.player.play();
            }
        }
    }

    pub fn on_hidden(&mut self) {
        if let Self::Video(video) = self {
            video.player.pause();
        }
    }

    /// Draw at `at`, where `at.scale` is the target height in pixels.
    pub fn draw(&self, raster: &Rasterizer, canvas: &mut dyn Canvas, at: Placement, opacity: u8) {
        match self {
            Self::Page(page) => {
                let Some(image) = raster.peek(page.index) else {
                    return;
                };
                let mut scale = at.scale / image.height().max(1) as f32;
                if (scale - 1.0).abs() < PIXEL_SNAP {
                    scale = 1.0;
                }
                canvas.draw_page(image, at.x, at.y, scale, opacity);
            }
            Self::Video(video) => {
                canvas.draw_video(video.player.as_ref(), at.x, at.y, at.scale, opacity);
            }
        }
    }
}
