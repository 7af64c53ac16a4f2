// Tunables (`.raindrum/config.toml`).
//
// Every field has a default, so a missing file, a missing section or a
// missing key all fall back quietly. Only a file that fails to parse is
// worth a warning.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

pub const CONFIG_FILE: &str = "config.toml";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub audio: AudioConfig,
    pub scheduler: SchedulerConfig,
    pub viewport: ViewportConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AudioConfig {
    /// Commands buffered between the UI and the audio callback
    pub command_queue: usize,
    pub noise_seconds: f32,
    pub reverb_seconds: f32,
    pub reverb_decay: f32,
    pub reverb_return: f32,
    /// Convolution block size in samples; also the reverb's latency
    pub reverb_block: usize,
    pub max_tone_voices: usize,
    pub seed: u64,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            command_queue: 1024,
            noise_seconds: 5.0,
            reverb_seconds: 7.0,
            reverb_decay: 4.0,
            reverb_return: 0.8,
            reverb_block: 2048,
            max_tone_voices: 48,
            seed: 0x5241_494e, // "RAIN"
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    /// Frame gaps longer than this are treated as a suspension and skipped
    pub burst_guard_ms: f64,
    /// Divide the guard by the playback speed factor
    pub scale_guard_with_speed: bool,
    /// How long a finished non-looping melody waits before stopping
    pub completion_grace_ms: f64,
    pub practice_debounce_ms: f64,
    /// Pixels per frame; each drop adds up to 2 of jitter
    pub drop_speed: f32,
    /// Impact line, as a percentage of the viewport height
    pub pad_line_percent: f32,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            burst_guard_ms: 250.0,
            scale_guard_with_speed: false,
            completion_grace_ms: 1000.0,
            practice_debounce_ms: 150.0,
            drop_speed: 15.0,
            pad_line_percent: 85.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewportConfig {
    pub width: f32,
    pub height: f32,
}

impl Default for ViewportConfig {
    fn default() -> Self {
        Self { width: 1000.0, height: 700.0 }
    }
}

impl Config {
    pub fn load(dir: &Path) -> Self {
        let path = dir.join(CONFIG_FILE);
        let text = match std::fs::read_to_string(&path) {
            Ok(text) => text,
            Err(_) => {
                debug!(path = %path.display(), "no config file, using defaults");
                return Self::default();
            }
        };
        match toml::from_str(&text) {
            Ok(config) => config,
            Err(e) => {
                warn!(path = %path.display(), "config unreadable, using defaults: {e}");
                Self::default()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn partial_file_keeps_other_defaults() {
        let config: Config = toml::from_str(
            r#"
            [scheduler]
            burst_guard_ms = 400
            scale_guard_with_speed = true
            "#,
        )
        .unwrap();
        assert_eq!(config.scheduler.burst_guard_ms, 400.0);
        assert!(config.scheduler.scale_guard_with_speed);
        assert_eq!(config.scheduler.completion_grace_ms, 1000.0);
        assert_eq!(config.audio, AudioConfig::default());
    }

    #[test]
    fn missing_and_broken_files_fall_back() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(Config::load(dir.path()), Config::default());

        std::fs::write(dir.path().join(CONFIG_FILE), "[audio\nseed = ").unwrap();
        assert_eq!(Config::load(dir.path()), Config::default());
    }

    #[test]
    fn loads_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(CONFIG_FILE), "[audio]\nmax_tone_voices = 8\n").unwrap();
        assert_eq!(Config::load(dir.path()).audio.max_tone_voices, 8);
    }
}
