//! Letterbox placement and window-to-raster size conversion

use super::types::RenderSize;

/// Where a fitted box lands inside its container.
///
/// `scale` multiplies the fitted box's own dimensions.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Placement {
    pub x: f32,
    pub y: f32,
    pub scale: f32,
}

impl Placement {
    /// Height-limited fits leave bars left and right
    pub fn is_pillarboxed(&self) -> bool {
        self.x > 0.0
    }
}

/// Fit a `w`×`h` box inside `box_w`×`box_h`, centred.
pub fn boxfill_centered(w: f32, h: f32, box_w: f32, box_h: f32) -> Placement {
    let scale_h = box_h / h;
    let scale_w = box_w / w;
    if scale_h < scale_w {
        Placement {
            x: (box_w - scale_h * w) / 2.0,
            y: 0.0,
            scale: scale_h,
        }
    } else {
        Placement {
            x: 0.0,
            y: (box_h - scale_w * h) / 2.0,
            scale: scale_w,
        }
    }
}

/// Largest page-shaped raster that fits a `width`×`height` window.
pub fn raster_size_for_window(aspect: f32, width: u32, height: u32) -> RenderSize {
    let fit = boxfill_centered(aspect, 1.0, width as f32, height as f32);
    RenderSize::new((fit.scale * aspect) as u32, fit.scale as u32)
}

/// Axis-aligned rectangle in window pixels, origin bottom-left
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

/// The two bars that mask whatever the fitted image does not cover,
/// relative to the bottom-left of the `box_w`×`box_h` image area.
pub fn letterboxes(fit: Placement, aspect: f32, box_w: f32, box_h: f32) -> [Rect; 2] {
    if fit.is_pillarboxed() {
        let image_w = fit.scale * aspect;
        [
            Rect {
                x: 0.0,
                y: 0.0,
                width: fit.x,
                height: box_h,
            },
            Rect {
                x: fit.x + image_w,
                y: 0.0,
                width: fit.x,
                height: box_h,
            },
        ]
    } else {
        [
            Rect {
                x: 0.0,
                y: 0.0,
                width: box_w,
                height: fit.y,
            },
            Rect {
                x: 0.0,
                y: fit.y + fit.scale,
                width: box_w,
                height: fit.y,
            },
        ]
    }
}

/// Presenter windows stack the slide above a countdown timer.
pub mod presenter {
    pub const TIMER_MARGIN_TOP_RATIO: f32 = 0.0;
    pub const TIMER_RATIO: f32 = 0.17;
    pub const TIMER_MARGIN_BOTTOM_RATIO: f32 = 0.04;

    /// Heights relative to the slide: slide, top margin, timer, bottom margin
    pub const HEIGHT_RATIOS: [f32; 4] = [
        1.0,
        TIMER_MARGIN_TOP_RATIO,
        TIMER_RATIO,
        TIMER_MARGIN_BOTTOM_RATIO,
    ];

    pub fn extras_ratio() -> f32 {
        HEIGHT_RATIOS[1..].iter().sum()
    }

    /// Slide area height for a presenter window of `window_height`
    pub fn image_height(window_height: u32) -> u32 {
        (window_height as f32 / (1.0 + extras_ratio())) as u32
    }

    /// Timer text height and baseline for a slide area of `image_height`
    pub fn timer_metrics(window_height: u32, image_height: u32) -> (f32, f32) {
        let heights = HEIGHT_RATIOS.map(|r| r * image_height as f32);
        let content: f32 = heights.iter().sum();
        let pad = (window_height as f32 - content) / 2.0;
        (heights[2], pad + heights[3])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn height_limited_centres_horizontally() {
        let fit = boxfill_centered(4.0, 3.0, 1000.0, 300.0);
        assert_eq!(fit.scale, 100.0);
        assert_eq!(fit.x, 300.0);
        assert_eq!(fit.y, 0.0);
        assert!(fit.is_pillarboxed());
    }

    #[test]
    fn width_limited_centres_vertically() {
        let fit = boxfill_centered(4.0, 3.0, 400.0, 1000.0);
        assert_eq!(fit.scale, 100.0);
        assert_eq!(fit.x, 0.0);
        assert_eq!(fit.y, 350.0);
    }

    #[test]
    fn raster_size_matches_page_shape() {
        assert_eq!(
            raster_size_for_window(2.0, 1000, 800),
            RenderSize::new(1000, 500)
        );
        assert_eq!(
            raster_size_for_window(1.5, 1920, 1080),
            RenderSize::new(1620, 1080)
        );
    }

    #[test]
    fn letterbox_bars_flank_image() {
        let fit = boxfill_centered(2.0, 1.0, 500.0, 100.0);
        let [left, right] = letterboxes(fit, 2.0, 500.0, 100.0);
        assert_eq!(left.width, 150.0);
        assert_eq!(right.x, 350.0);
        assert_eq!(right.height, 100.0);

        let fit = boxfill_centered(2.0, 1.0, 200.0, 300.0);
        let [bottom, top] = letterboxes(fit, 2.0, 200.0, 300.0);
        assert_eq!(bottom.height, 100.0);
        assert_eq!(top.y, 200.0);
    }

    #[test]
    fn presenter_reserves_timer_band() {
        let image_h = presenter::image_height(1000);
        assert_eq!(image_h, 826);
        let (text_h, baseline) = presenter::timer_metrics(1000, image_h);
        assert!((text_h - 140.42).abs() < 1e-2);
        assert!((baseline - 33.31).abs() < 1e-2);
    }
}
