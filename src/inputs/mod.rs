pub mod cursor;
pub mod repeater;
pub mod script;

pub use cursor::{Cursor, DISSOLVE_TIME};
pub use repeater::{REPEAT_INTERVAL, REPEAT_TRIGGER, RepeatState, RepeatTiming, Repeater};
pub use script::{KeyScript, ScriptError, ScriptStep};
