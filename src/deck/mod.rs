//! Windowing-agnostic presentation: frames, views, countdown and tick pacing

pub mod frame;
pub mod ticker;
pub mod timer;
pub mod view;

pub use frame::{Canvas, Frame, Label, PageFrame, Player, VideoFrame};
pub use ticker::{FAST_TICK, HeldKeys, NavKey, SLOW_TICK, Ticker};
pub use timer::{CountdownTimer, TimerReading};
pub use view::{DrawOutcome, Role, View};
