use std::time::Duration;

/// Hold time before a held key starts auto-repeating.
pub const REPEAT_TRIGGER: Duration = Duration::from_millis(400);
/// Spacing between auto-repeat fires once repeating.
pub const REPEAT_INTERVAL: Duration = Duration::from_millis(100);

/// Hold-to-repeat timing, the same knobs an OS keyboard repeat exposes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RepeatTiming {
    /// Delay between the rising edge and the first repeat
    pub trigger: Duration,
    /// Delay between consecutive repeats
    pub interval: Duration,
}

impl Default for RepeatTiming {
    fn default() -> Self {
        Self {
            trigger: REPEAT_TRIGGER,
            interval: REPEAT_INTERVAL,
        }
    }
}

/// Observable phase of a [`Repeater`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum RepeatState {
    /// Key released
    #[default]
    Up,
    /// Key held, waiting out the repeat trigger
    Hold,
    /// Key held past the trigger, firing every interval
    Fire,
}

impl RepeatState {
    /// True while the key is down in either held phase
    pub fn is_held(self) -> bool {
        matches!(self, Self::Hold | Self::Fire)
    }
}

// The stopwatch only exists while the key is down, so a released key can
// never read a stale value.
#[derive(Clone, Copy, Debug)]
enum Phase {
    Up,
    Hold { held: Duration },
    Fire { owed: Duration },
}

/// Repeat-after-hold state machine for one key or button.
///
/// Driven by [`Repeater::tick`] once per frame with the frame's duration and
/// whether the key was down during it. Every fresh press fires once
/// immediately; holding past [`RepeatTiming::trigger`] then fires every
/// [`RepeatTiming::interval`]. Long frames catch up: a single coarse tick
/// reports every repeat that would have fired inside it.
#[derive(Clone, Debug)]
pub struct Repeater {
    phase: Phase,
    timing: RepeatTiming,
}

impl Default for Repeater {
    fn default() -> Self {
        Self::new()
    }
}

impl Repeater {
    pub fn new() -> Self {
        Self::with_timing(RepeatTiming::default())
    }

    pub fn with_timing(timing: RepeatTiming) -> Self {
        Self {
            phase: Phase::Up,
            timing,
        }
    }

    pub fn state(&self) -> RepeatState {
        match self.phase {
            Phase::Up => RepeatState::Up,
            Phase::Hold { .. } => RepeatState::Hold,
            Phase::Fire { .. } => RepeatState::Fire,
        }
    }

    pub fn timing(&self) -> RepeatTiming {
        self.timing
    }

    /// Process one interval of `dt` and return how many times the key fired.
    pub fn tick(&mut self, dt: Duration, is_down: bool) -> u32 {
        if !is_down {
            self.phase = Phase::Up;
            return 0;
        }

        match self.phase {
            Phase::Up => {
                // Rising edge.
                self.phase = Phase::Hold { held: dt };
                1
            }
            Phase::Hold { held } => {
                let held = held + dt;
                if held < self.timing.trigger {
                    self.phase = Phase::Hold { held };
                    return 0;
                }
                let mut owed = held - self.timing.trigger;
                let fires = 1 + self.countdown(&mut owed);
                self.phase = Phase::Fire { owed };
                fires
            }
            Phase::Fire { owed } => {
                let mut owed = owed + dt;
                let fires = self.countdown(&mut owed);
                self.phase = Phase::Fire { owed };
                fires
            }
        }
    }

    /// Pay out every whole interval accumulated in `owed`.
    fn countdown(&self, owed: &mut Duration) -> u32 {
        if self.timing.interval.is_zero() {
            *owed = Duration::ZERO;
            return 0;
        }
        let mut fires = 0;
        while *owed >= self.timing.interval {
            *owed -= self.timing.interval;
            fires += 1;
        }
        fires
    }
}
