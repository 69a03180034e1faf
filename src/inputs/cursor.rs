use std::time::Duration;

use super::repeater::{RepeatTiming, Repeater};

/// Cross-fade length between the previous and current slide.
pub const DISSOLVE_TIME: Duration = Duration::from_millis(350);

/// Slide index driven by a forward and a reverse key.
///
/// Tracks the last distinct position and how long ago it changed so the
/// display layer can dissolve from one slide to the next.
#[derive(Clone, Debug)]
pub struct Cursor {
    reverse: Repeater,
    forward: Repeater,
    position: usize,
    previous: usize,
    since_change: Duration,
    total: usize,
    dissolve: Duration,
}

impl Cursor {
    pub fn new(total_slides: usize) -> Self {
        Self::with_timing(total_slides, RepeatTiming::default(), DISSOLVE_TIME)
    }

    pub fn with_timing(total_slides: usize, repeat: RepeatTiming, dissolve: Duration) -> Self {
        Self {
            reverse: Repeater::with_timing(repeat),
            forward: Repeater::with_timing(repeat),
            position: 0,
            previous: 0,
            since_change: Duration::ZERO,
            total: total_slides,
            dissolve,
        }
    }

    pub fn position(&self) -> usize {
        self.position
    }

    /// Last distinct position, the dissolve source
    pub fn previous_position(&self) -> usize {
        self.previous
    }

    pub fn total_slides(&self) -> usize {
        self.total
    }

    pub fn time_since_change(&self) -> Duration {
        self.since_change
    }

    pub fn reverse(&self) -> &Repeater {
        &self.reverse
    }

    pub fn forward(&self) -> &Repeater {
        &self.forward
    }

    /// Advance by one frame. Returns true while a redraw may be needed.
    ///
    /// Holding both keys freezes the cursor; neither repeater is ticked so
    /// their states survive until one key is released.
    pub fn tick(&mut self, dt: Duration, reverse: bool, forward: bool) -> bool {
        let old = self.position;

        if !(reverse && forward) {
            let back = self.reverse.tick(dt, reverse);
            let ahead = self.forward.tick(dt, forward);
            self.position = self.step(back, ahead);
        }

        if self.position != old {
            self.previous = old;
            self.since_change = Duration::ZERO;
        } else {
            self.since_change = self.since_change.saturating_add(dt);
        }

        self.is_animating()
    }

    /// True while dissolving or while either key is held.
    pub fn is_animating(&self) -> bool {
        self.since_change < self.dissolve
            || self.reverse.state().is_held()
            || self.forward.state().is_held()
    }

    /// Dissolve progress: 0.0 shows the previous slide, 1.0 the current one.
    pub fn blend(&self) -> f32 {
        if self.dissolve.is_zero() {
            return 1.0;
        }
        self.since_change.min(self.dissolve).as_secs_f32() / self.dissolve.as_secs_f32()
    }

    fn step(&self, back: u32, ahead: u32) -> usize {
        let Some(last) = self.total.checked_sub(1) else {
            return 0;
        };
        let moved = self.position as i64 - i64::from(back) + i64::from(ahead);
        moved.clamp(0, last as i64) as usize
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    #[test]
    fn forward_press_moves_once() {
        let mut cursor = Cursor::new(5);
        assert!(cursor.tick(ms(16), false, true));
        assert_eq!(cursor.position(), 1);
        assert_eq!(cursor.previous_position(), 0);
        assert_eq!(cursor.time_since_change(), Duration::ZERO);

        cursor.tick(ms(16), false, true);
        assert_eq!(cursor.position(), 1);
    }

    #[test]
    fn clamps_at_both_ends() {
        let mut cursor = Cursor::new(3);
        cursor.tick(ms(16), true, false);
        assert_eq!(cursor.position(), 0);

        cursor.tick(ms(0), false, true);
        cursor.tick(ms(5_000), false, true);
        assert_eq!(cursor.position(), 2);
    }

    #[test]
    fn both_keys_freeze_position() {
        let mut cursor = Cursor::new(10);
        cursor.tick(ms(0), false, true);
        cursor.tick(ms(600), false, true);
        let held_at = cursor.position();

        for _ in 0..20 {
            cursor.tick(ms(100), true, true);
        }
        assert_eq!(cursor.position(), held_at);
        // Forward repeater state is frozen rather than reset.
        assert!(cursor.forward().state().is_held());
    }

    #[test]
    fn unchanged_position_accumulates_time() {
        let mut cursor = Cursor::new(4);
        cursor.tick(ms(16), false, true);
        cursor.tick(ms(100), false, false);
        cursor.tick(ms(100), false, false);
        assert_eq!(cursor.time_since_change(), ms(200));
        assert_eq!(cursor.previous_position(), 0);
    }

    #[test]
    fn redraw_stops_after_dissolve_when_released() {
        let mut cursor = Cursor::new(4);
        cursor.tick(ms(16), false, true);
        assert!(cursor.tick(ms(200), false, false));
        assert!(!cursor.tick(ms(200), false, false));
    }

    #[test]
    fn held_key_keeps_redraw_alive_before_repeat() {
        let mut cursor = Cursor::new(4);
        cursor.tick(ms(0), false, true);
        // 0.36s held: past the dissolve, short of the repeat trigger.
        assert!(cursor.tick(ms(360), false, true));
        assert_eq!(cursor.position(), 1);
    }

    #[test]
    fn blend_runs_zero_to_one() {
        let mut cursor = Cursor::new(4);
        cursor.tick(ms(16), false, true);
        assert_eq!(cursor.blend(), 0.0);

        cursor.tick(ms(175), false, false);
        assert!((cursor.blend() - 0.5).abs() < 1e-6);

        cursor.tick(ms(175), false, false);
        assert_eq!(cursor.blend(), 1.0);

        cursor.tick(ms(1_000), false, false);
        assert_eq!(cursor.blend(), 1.0);
    }

    #[test]
    fn empty_deck_stays_at_zero() {
        let mut cursor = Cursor::new(0);
        cursor.tick(ms(16), false, true);
        assert_eq!(cursor.position(), 0);
    }
}
