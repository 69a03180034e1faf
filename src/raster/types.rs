//! Core types for page rasterization

use std::sync::Arc;

use super::request::RasterError;

/// Output size a render was requested at, in pixels.
///
/// Used verbatim as the cache key; no rounding or normalisation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct RenderSize {
    pub width: u32,
    pub height: u32,
}

impl RenderSize {
    #[must_use]
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    #[must_use]
    pub fn aspect(self) -> f32 {
        if self.height == 0 {
            return 0.0;
        }
        self.width as f32 / self.height as f32
    }
}

impl std::fmt::Display for RenderSize {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.width, self.height)
    }
}

/// How the document source should size each page bitmap
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SizeSpec {
    /// Stretch to exactly this size
    Exact(RenderSize),
    /// Fix the width, derive the height from the page aspect
    Width(u32),
    /// Fix the height, derive the width from the page aspect
    Height(u32),
}

impl SizeSpec {
    /// Pin whichever dimension of `size` limits a page of `aspect`.
    ///
    /// A box at least as wide as the page (relative to height) is
    /// height-limited; a narrower one is width-limited.
    #[must_use]
    pub fn fit_within(size: RenderSize, aspect: f32) -> Self {
        if size.height == 0 || !aspect.is_finite() || aspect <= 0.0 {
            return Self::Exact(size);
        }
        if size.aspect() >= aspect {
            Self::Height(size.height)
        } else {
            Self::Width(size.width)
        }
    }

    /// Pixel dimensions for a page of the given size in points
    #[must_use]
    pub fn resolve(self, page_width: f32, page_height: f32) -> RenderSize {
        let px = |v: f32| v.round().max(1.0) as u32;
        match self {
            Self::Exact(size) => size,
            Self::Width(w) => RenderSize::new(w, px(w as f32 * page_height / page_width)),
            Self::Height(h) => RenderSize::new(px(h as f32 * page_width / page_height), h),
        }
    }
}

/// Raw rendered page bitmap.
///
/// Packed RGB, 3 bytes per pixel, with an explicit row stride so sources can
/// hand over padded rows without copying.
#[derive(Clone, PartialEq, Eq)]
pub struct PageImage {
    pixels: Vec<u8>,
    width: u32,
    height: u32,
    stride: usize,
}

/// One completed render: every page of the document at one size
pub type PageSet = Arc<[PageImage]>;

impl PageImage {
    pub const BYTES_PER_PIXEL: usize = 3;

    /// Wrap an RGB buffer, checking it covers `height` rows of `stride` bytes.
    pub fn from_rgb(
        width: u32,
        height: u32,
        stride: usize,
        pixels: Vec<u8>,
    ) -> Result<Self, RasterError> {
        let row_bytes = width as usize * Self::BYTES_PER_PIXEL;
        if stride < row_bytes {
            return Err(RasterError::generic(format!(
                "stride {stride} shorter than a {width}px row"
            )));
        }
        if pixels.len() < stride * height as usize {
            return Err(RasterError::generic(format!(
                "{} bytes cannot hold {width}x{height} at stride {stride}",
                pixels.len()
            )));
        }
        Ok(Self {
            pixels,
            width,
            height,
            stride,
        })
    }

    /// Build from a renderer's raw samples: `channels` bytes per pixel
    /// (RGB first, extras such as alpha dropped) in rows of `stride` bytes.
    pub fn from_samples(
        width: u32,
        height: u32,
        channels: usize,
        stride: usize,
        samples: &[u8],
    ) -> Result<Self, RasterError> {
        if channels < Self::BYTES_PER_PIXEL {
            return Err(RasterError::generic(format!(
                "Unsupported pixmap format: {channels} channels"
            )));
        }
        let row_bytes = width as usize * channels;
        let expected_min = stride.saturating_mul(height as usize);
        if samples.len() < expected_min || row_bytes > stride {
            return Err(RasterError::generic("Pixmap buffer size mismatch"));
        }

        if channels == Self::BYTES_PER_PIXEL {
            return Self::from_rgb(width, height, stride, samples[..expected_min].to_vec());
        }

        let mut out = Vec::with_capacity(width as usize * height as usize * Self::BYTES_PER_PIXEL);
        for y in 0..height as usize {
            let row = &samples[y * stride..y * stride + row_bytes];
            for px in row.chunks_exact(channels) {
                out.extend_from_slice(&px[..Self::BYTES_PER_PIXEL]);
            }
        }
        Self::from_rgb(width, height, width as usize * Self::BYTES_PER_PIXEL, out)
    }

    /// Single-colour image with tightly packed rows
    #[must_use]
    pub fn solid(width: u32, height: u32, rgb: [u8; 3]) -> Self {
        let stride = width as usize * Self::BYTES_PER_PIXEL;
        let pixels = rgb
            .iter()
            .copied()
            .cycle()
            .take(stride * height as usize)
            .collect();
        Self {
            pixels,
            width,
            height,
            stride,
        }
    }

    /// All-black image of the same dimensions
    #[must_use]
    pub fn blacked_out(&self) -> Self {
        Self::solid(self.width, self.height, [0, 0, 0])
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn stride(&self) -> usize {
        self.stride
    }

    pub fn size(&self) -> RenderSize {
        RenderSize::new(self.width, self.height)
    }

    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    /// Visible bytes of each row, padding stripped
    pub fn rows(&self) -> impl Iterator<Item = &[u8]> {
        let row_bytes = self.width as usize * Self::BYTES_PER_PIXEL;
        self.pixels
            .chunks(self.stride.max(1))
            .take(self.height as usize)
            .map(move |row| &row[..row_bytes])
    }

    #[must_use]
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 3]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let at = y as usize * self.stride + x as usize * Self::BYTES_PER_PIXEL;
        Some([self.pixels[at], self.pixels[at + 1], self.pixels[at + 2]])
    }

    /// Copy into a tightly packed [`image::RgbImage`]
    pub fn to_rgb_image(&self) -> Result<image::RgbImage, RasterError> {
        let packed: Vec<u8> = self.rows().flatten().copied().collect();
        image::RgbImage::from_raw(self.width, self.height, packed)
            .ok_or_else(|| RasterError::generic("packed buffer size mismatch"))
    }
}

impl std::fmt::Debug for PageImage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PageImage")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("stride", &self.stride)
            .field("bytes", &self.pixels.len())
            .finish_non_exhaustive()
    }
}

/// Extension trait for Vec operations
pub trait VecExt<T> {
    /// Reset vector to a given length, clearing existing items
    fn reset_to_len(&mut self, len: usize)
    where
        T: Default;
}

impl<T> VecExt<T> for Vec<T> {
    #[inline]
    fn reset_to_len(&mut self, len: usize)
    where
        T: Default,
    {
        self.clear();
        self.resize_with(len, T::default);
    }
}
