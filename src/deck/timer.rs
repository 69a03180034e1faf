use std::time::{Duration, Instant};

pub const COLOR_OK: [u8; 4] = [50, 100, 200, 255];
pub const COLOR_OVERTIME: [u8; 4] = [200, 50, 50, 255];

const HOUR_SECS: f64 = 3600.0;

/// What the countdown shows right now
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TimerReading {
    pub text: String,
    pub color: [u8; 4],
    pub overtime: bool,
}

/// Presenter countdown, started the first time it is read.
#[derive(Clone, Debug)]
pub struct CountdownTimer {
    duration: Duration,
    started: Option<Instant>,
}

impl CountdownTimer {
    pub fn new(duration: Duration) -> Self {
        Self {
            duration,
            started: None,
        }
    }

    pub fn from_minutes(minutes: f64) -> Option<Self> {
        Duration::try_from_secs_f64(minutes * 60.0).ok().map(Self::new)
    }

    pub fn duration(&self) -> Duration {
        self.duration
    }

    pub fn started(&self) -> Option<Instant> {
        self.started
    }

    pub fn reading(&mut self) -> TimerReading {
        self.reading_at(Instant::now())
    }

    pub fn reading_at(&mut self, now: Instant) -> TimerReading {
        let started = *self.started.get_or_insert(now);
        let elapsed = now.saturating_duration_since(started).as_secs_f64();
        let total = self.duration.as_secs_f64();
        let remaining = total - elapsed;

        let secs = remaining.abs() as u64;
        let clock = if total < HOUR_SECS && remaining < HOUR_SECS {
            format!("{:02}:{:02}", secs / 60 % 60, secs % 60)
        } else {
            format!("{:02}:{:02}:{:02}", secs / 3600 % 24, secs / 60 % 60, secs % 60)
        };

        if remaining < 0.0 {
            TimerReading {
                text: format!("-{clock} "),
                color: COLOR_OVERTIME,
                overtime: true,
            }
        } else {
            TimerReading {
                text: clock,
                color: COLOR_OK,
                overtime: false,
            }
        }
    }
}
