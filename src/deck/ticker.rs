use std::collections::HashSet;
use std::time::Duration;

use crate::inputs::Cursor;

/// Redraw interval while nothing is moving, so finished renders still show up.
pub const SLOW_TICK: Duration = Duration::from_millis(500);
/// Redraw interval while dissolving or while a key is held.
pub const FAST_TICK: Duration = Duration::from_nanos(16_666_667);

/// Keys that move the slide cursor
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum NavKey {
    Right,
    Up,
    PageDown,
    Left,
    Down,
    PageUp,
}

impl NavKey {
    pub fn is_forward(self) -> bool {
        matches!(self, Self::Right | Self::Up | Self::PageDown)
    }
}

/// Navigation keys currently down, across every window
#[derive(Clone, Debug, Default)]
pub struct HeldKeys {
    down: HashSet<NavKey>,
}

impl HeldKeys {
    pub fn press(&mut self, key: NavKey) {
        self.down.insert(key);
    }

    pub fn release(&mut self, key: NavKey) {
        self.down.remove(&key);
    }

    pub fn forward(&self) -> bool {
        self.down.iter().any(|k| k.is_forward())
    }

    pub fn reverse(&self) -> bool {
        self.down.iter().any(|k| !k.is_forward())
    }
}

/// Picks the tick rate: fast from a navigation key press until the cursor
/// settles, slow otherwise.
#[derive(Clone, Debug)]
pub struct Ticker {
    slow: Duration,
    fast: Duration,
    fast_mode: bool,
}

impl Default for Ticker {
    fn default() -> Self {
        Self::new(SLOW_TICK, FAST_TICK)
    }
}

impl Ticker {
    pub fn new(slow: Duration, fast: Duration) -> Self {
        Self {
            slow,
            fast,
            fast_mode: false,
        }
    }

    pub fn interval(&self) -> Duration {
        if self.fast_mode { self.fast } else { self.slow }
    }

    pub fn is_fast(&self) -> bool {
        self.fast_mode
    }

    pub fn on_nav_press(&mut self) {
        self.fast_mode = true;
    }

    /// Feed one tick to the cursor. Returns whether a redraw is needed.
    pub fn tick(&mut self, cursor: &mut Cursor, dt: Duration, keys: &HeldKeys) -> bool {
        let busy = cursor.tick(dt, keys.reverse(), keys.forward());
        if !busy {
            self.fast_mode = false;
        }
        busy
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn held_keys_split_by_direction() {
        let mut keys = HeldKeys::default();
        keys.press(NavKey::PageDown);
        assert!(keys.forward());
        assert!(!keys.reverse());

        keys.press(NavKey::Left);
        assert!(keys.reverse());

        keys.release(NavKey::PageDown);
        assert!(!keys.forward());
    }

    #[test]
    fn speeds_up_on_press_and_settles() {
        let mut ticker = Ticker::default();
        let mut cursor = Cursor::new(5);
        let mut keys = HeldKeys::default();
        assert_eq!(ticker.interval(), SLOW_TICK);

        keys.press(NavKey::Right);
        ticker.on_nav_press();
        assert_eq!(ticker.interval(), FAST_TICK);
        assert!(ticker.tick(&mut cursor, FAST_TICK, &keys));

        keys.release(NavKey::Right);
        while ticker.tick(&mut cursor, FAST_TICK, &keys) {}
        assert!(!ticker.is_fast());
        assert_eq!(cursor.position(), 1);
        assert_eq!(cursor.blend(), 1.0);
    }
}
