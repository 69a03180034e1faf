use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::deck::{CountdownTimer, FAST_TICK, SLOW_TICK, Ticker};
use crate::inputs::{DISSOLVE_TIME, REPEAT_INTERVAL, REPEAT_TRIGGER, RepeatTiming};
use crate::raster::{
    DEFAULT_CACHE_SIZE, DEFAULT_CHUNK_PAGES, DEFAULT_POLL_TIMEOUT, RasterConfig,
    default_render_threads,
};

const SETTINGS_FILENAME: &str = "config.yaml";
const APP_NAME: &str = "pdfdeck";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    /// Completed full-document renders kept per view
    #[serde(default = "default_cache_capacity")]
    pub cache_capacity: usize,

    #[serde(default = "default_chunk_pages")]
    pub chunk_pages: usize,

    #[serde(default = "default_render_threads")]
    pub render_threads: usize,

    #[serde(default = "default_poll_timeout_ms")]
    pub poll_timeout_ms: u64,

    #[serde(default = "default_repeat_trigger")]
    pub repeat_trigger_secs: f64,

    #[serde(default = "default_repeat_interval")]
    pub repeat_interval_secs: f64,

    #[serde(default = "default_dissolve")]
    pub dissolve_secs: f64,

    #[serde(default = "default_slow_tick")]
    pub slow_tick_secs: f64,

    #[serde(default = "default_fast_tick")]
    pub fast_tick_secs: f64,

    /// Presenter countdown; no timer when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub countdown_minutes: Option<f64>,
}

fn default_cache_capacity() -> usize {
    DEFAULT_CACHE_SIZE
}

fn default_chunk_pages() -> usize {
    DEFAULT_CHUNK_PAGES
}

fn default_poll_timeout_ms() -> u64 {
    DEFAULT_POLL_TIMEOUT.as_millis() as u64
}

fn default_repeat_trigger() -> f64 {
    REPEAT_TRIGGER.as_secs_f64()
}

fn default_repeat_interval() -> f64 {
    REPEAT_INTERVAL.as_secs_f64()
}

fn default_dissolve() -> f64 {
    DISSOLVE_TIME.as_secs_f64()
}

fn default_slow_tick() -> f64 {
    SLOW_TICK.as_secs_f64()
}

fn default_fast_tick() -> f64 {
    FAST_TICK.as_secs_f64()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            cache_capacity: default_cache_capacity(),
            chunk_pages: default_chunk_pages(),
            render_threads: default_render_threads(),
            poll_timeout_ms: default_poll_timeout_ms(),
            repeat_trigger_secs: default_repeat_trigger(),
            repeat_interval_secs: default_repeat_interval(),
            dissolve_secs: default_dissolve(),
            slow_tick_secs: default_slow_tick(),
            fast_tick_secs: default_fast_tick(),
            countdown_minutes: None,
        }
    }
}

/// Negative, NaN or overflowing values fall back to `fallback`.
fn secs(value: f64, fallback: Duration, name: &str) -> Duration {
    Duration::try_from_secs_f64(value).unwrap_or_else(|_| {
        warn!("Ignoring invalid {name} = {value}, using {fallback:?}");
        fallback
    })
}

pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|config| config.join(APP_NAME).join(SETTINGS_FILENAME))
}

impl Settings {
    /// Load from `explicit`, or from the per-user config file when `None`.
    ///
    /// Never fails: a missing file gives defaults, an unreadable or
    /// unparsable one is logged and gives defaults too.
    pub fn load(explicit: Option<&Path>) -> Self {
        let path = match explicit {
            Some(path) => path.to_path_buf(),
            None => match default_config_path() {
                Some(path) => path,
                None => {
                    warn!("Could not determine config directory, using default settings");
                    return Self::default();
                }
            },
        };

        if !path.exists() {
            info!("Settings file not found at {path:?}, using defaults");
            return Self::default();
        }
        Self::load_from_path(&path)
    }

    fn load_from_path(path: &Path) -> Self {
        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) => {
                warn!("Failed to read settings file {path:?}: {e}");
                return Self::default();
            }
        };
        match serde_yaml::from_str::<Settings>(&content) {
            Ok(settings) => {
                debug!("Loaded settings from {path:?}");
                settings
            }
            Err(e) => {
                warn!("Failed to parse settings file {path:?}: {e}");
                Self::default()
            }
        }
    }

    pub fn save(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let yaml = serde_yaml::to_string(self)?;
        fs::write(path, yaml)?;
        debug!("Saved settings to {path:?}");
        Ok(())
    }

    pub fn raster_config(&self, page_limit: Option<usize>) -> RasterConfig {
        RasterConfig {
            cache_capacity: self.cache_capacity.max(1),
            chunk_pages: self.chunk_pages.max(1),
            render_threads: self.render_threads.max(1),
            poll_timeout: Duration::from_millis(self.poll_timeout_ms.max(1)),
            page_limit,
        }
    }

    pub fn repeat_timing(&self) -> RepeatTiming {
        RepeatTiming {
            trigger: secs(self.repeat_trigger_secs, REPEAT_TRIGGER, "repeat_trigger_secs"),
            interval: secs(self.repeat_interval_secs, REPEAT_INTERVAL, "repeat_interval_secs"),
        }
    }

    pub fn dissolve(&self) -> Duration {
        secs(self.dissolve_secs, DISSOLVE_TIME, "dissolve_secs")
    }

    /// Frame length while animating
    pub fn fast_tick(&self) -> Duration {
        secs(self.fast_tick_secs, FAST_TICK, "fast_tick_secs")
    }

    pub fn ticker(&self) -> Ticker {
        Ticker::new(
            secs(self.slow_tick_secs, SLOW_TICK, "slow_tick_secs"),
            self.fast_tick(),
        )
    }

    pub fn countdown(&self) -> Option<CountdownTimer> {
        let minutes = self.countdown_minutes?;
        let timer = CountdownTimer::from_minutes(minutes);
        if timer.is_none() {
            warn!("Ignoring invalid countdown_minutes = {minutes}");
        }
        timer
    }
}
