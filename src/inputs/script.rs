//! Key scripts for replaying navigation input without a window.
//!
//! A script is a comma-separated list of steps:
//!
//! - `f` / `r` tap forward / reverse (one frame down, one frame up)
//! - `hold-f:SECS`, `hold-r:SECS`, `hold-b:SECS` hold forward, reverse, or both
//! - `wait:SECS` all keys released

use std::str::FromStr;
use std::time::Duration;

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum ScriptError {
    #[error("empty step at position {0}")]
    EmptyStep(usize),

    #[error("unknown step `{0}`")]
    UnknownStep(String),

    #[error("bad duration `{value}` in step `{step}`")]
    BadDuration { step: String, value: String },
}

/// Keys held for a stretch of time
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ScriptStep {
    pub reverse: bool,
    pub forward: bool,
    /// `None` for a tap, which lasts exactly one frame
    pub hold: Option<Duration>,
}

impl ScriptStep {
    fn tap(reverse: bool, forward: bool) -> Self {
        Self {
            reverse,
            forward,
            hold: None,
        }
    }

    fn held(reverse: bool, forward: bool, hold: Duration) -> Self {
        Self {
            reverse,
            forward,
            hold: Some(hold),
        }
    }

    /// This step as frames of at most `frame` each.
    ///
    /// A tap is followed by one released frame so back-to-back taps register
    /// as separate presses.
    pub fn frames(&self, frame: Duration) -> Vec<(Duration, bool, bool)> {
        match self.hold {
            None => vec![(frame, self.reverse, self.forward), (frame, false, false)],
            Some(total) => {
                let mut out = Vec::new();
                let mut left = total;
                while !left.is_zero() {
                    let dt = if frame.is_zero() { left } else { left.min(frame) };
                    out.push((dt, self.reverse, self.forward));
                    left -= dt;
                }
                out
            }
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct KeyScript {
    steps: Vec<ScriptStep>,
}

impl KeyScript {
    pub fn steps(&self) -> &[ScriptStep] {
        &self.steps
    }

    /// Expand into `(dt, reverse, forward)` frames of at most `frame` each.
    pub fn frames(&self, frame: Duration) -> Vec<(Duration, bool, bool)> {
        self.steps.iter().flat_map(|step| step.frames(frame)).collect()
    }
}

impl FromStr for KeyScript {
    type Err = ScriptError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut steps = Vec::new();
        for (i, raw) in s.split(',').enumerate() {
            let token = raw.trim();
            if token.is_empty() {
                return Err(ScriptError::EmptyStep(i));
            }
            let step = match token.split_once(':') {
                None => match token {
                    "f" => ScriptStep::tap(false, true),
                    "r" => ScriptStep::tap(true, false),
                    _ => return Err(ScriptError::UnknownStep(token.to_string())),
                },
                Some((kind, secs)) => {
                    let hold = parse_secs(token, secs)?;
                    match kind {
                        "hold-f" => ScriptStep::held(false, true, hold),
                        "hold-r" => ScriptStep::held(true, false, hold),
                        "hold-b" => ScriptStep::held(true, true, hold),
                        "wait" => ScriptStep::held(false, false, hold),
                        _ => return Err(ScriptError::UnknownStep(token.to_string())),
                    }
                }
            };
            steps.push(step);
        }
        Ok(Self { steps })
    }
}

fn parse_secs(step: &str, value: &str) -> Result<Duration, ScriptError> {
    let bad = || ScriptError::BadDuration {
        step: step.to_string(),
        value: value.to_string(),
    };
    let secs: f64 = value.trim().parse().map_err(|_| bad())?;
    Duration::try_from_secs_f64(secs).map_err(|_| bad())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inputs::Cursor;

    #[test]
    fn parses_mixed_script() {
        let script: KeyScript = "f, r,hold-f:1.5,wait:0.25,hold-b:1".parse().unwrap();
        assert_eq!(script.steps().len(), 5);
        assert_eq!(script.steps()[0], ScriptStep::tap(false, true));
        assert_eq!(
            script.steps()[2],
            ScriptStep::held(false, true, Duration::from_millis(1_500))
        );
        assert_eq!(
            script.steps()[4],
            ScriptStep::held(true, true, Duration::from_secs(1))
        );
    }

    #[test]
    fn rejects_garbage() {
        assert_eq!(
            "f,,r".parse::<KeyScript>(),
            Err(ScriptError::EmptyStep(1))
        );
        assert!(matches!(
            "jump".parse::<KeyScript>(),
            Err(ScriptError::UnknownStep(_))
        ));
        assert!(matches!(
            "hold-f:-1".parse::<KeyScript>(),
            Err(ScriptError::BadDuration { .. })
        ));
    }

    #[test]
    fn taps_are_distinct_presses() {
        let script: KeyScript = "f,f,f".parse().unwrap();
        let mut cursor = Cursor::new(10);
        for (dt, rev, fwd) in script.frames(Duration::from_millis(16)) {
            cursor.tick(dt, rev, fwd);
        }
        assert_eq!(cursor.position(), 3);
    }

    #[test]
    fn holds_split_into_frames() {
        let script: KeyScript = "hold-f:0.05".parse().unwrap();
        let frames = script.frames(Duration::from_millis(20));
        let dts: Vec<_> = frames.iter().map(|f| f.0.as_millis()).collect();
        assert_eq!(dts, vec![20, 20, 10]);
    }
}
