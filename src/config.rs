//! Process-wide configuration.
//!
//! Defaults mirror a stock Linux host with ffmpeg installed from the
//! distribution. `FFMPEG_PATH` and `FFPROBE_PATH` override the binary
//! locations; a JSON file can override any field.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::ShiftError;
use crate::shift::{validate_fft_size, DEFAULT_FFT_SIZE};

/// Default location of the ffmpeg binary.
pub const DEFAULT_FFMPEG_PATH: &str = "/usr/bin/ffmpeg";
/// Default location of the ffprobe binary.
pub const DEFAULT_FFPROBE_PATH: &str = "/usr/bin/ffprobe";
/// Every clip is resampled to this rate before shifting.
pub const DEFAULT_SAMPLE_RATE: u32 = 44100;
/// Keep every Nth sample for the waveform preview.
pub const DEFAULT_PREVIEW_STRIDE: usize = 10;

/// Configuration shared by the environment check and the pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Path to the ffmpeg binary (used for MP3 encoding).
    pub ffmpeg_path: PathBuf,
    /// Path to the ffprobe binary (liveness check only).
    pub ffprobe_path: PathBuf,
    /// Target sample rate after decoding.
    pub sample_rate: u32,
    /// MP3 bitrate passed to ffmpeg, e.g. `"192k"`.
    pub mp3_bitrate: String,
    /// Directory for staged uploads (`None` = system temp dir).
    pub staging_dir: Option<PathBuf>,
    /// Decimation stride for the waveform preview.
    pub preview_stride: usize,
    /// FFT size for the phase vocoder (power of two).
    pub fft_size: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            ffmpeg_path: PathBuf::from(DEFAULT_FFMPEG_PATH),
            ffprobe_path: PathBuf::from(DEFAULT_FFPROBE_PATH),
            sample_rate: DEFAULT_SAMPLE_RATE,
            mp3_bitrate: "192k".to_string(),
            staging_dir: None,
            preview_stride: DEFAULT_PREVIEW_STRIDE,
            fft_size: DEFAULT_FFT_SIZE,
        }
    }
}

impl Config {
    /// Defaults with `FFMPEG_PATH` / `FFPROBE_PATH` applied from the
    /// process environment.
    pub fn from_env() -> Self {
        Self::default().with_env_overrides(|key| std::env::var(key).ok())
    }

    /// Reads a JSON config file. Missing fields fall back to defaults, then
    /// environment overrides are applied on top.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ShiftError> {
        let path = path.as_ref();
        let data = std::fs::read_to_string(path)
            .map_err(|e| ShiftError::Io(format!("{}: {}", path.display(), e)))?;
        let config: Config = serde_json::from_str(&data).map_err(|e| {
            ShiftError::Config(format!("invalid config {}: {}", path.display(), e))
        })?;
        config.validate()?;
        Ok(config.with_env_overrides(|key| std::env::var(key).ok()))
    }

    fn with_env_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(p) = lookup("FFMPEG_PATH").filter(|p| !p.is_empty()) {
            self.ffmpeg_path = PathBuf::from(p);
        }
        if let Some(p) = lookup("FFPROBE_PATH").filter(|p| !p.is_empty()) {
            self.ffprobe_path = PathBuf::from(p);
        }
        self
    }

    /// Checks that numeric fields are usable.
    ///
    /// # Errors
    ///
    /// Returns [`ShiftError::Config`] naming the first offending field.
    pub fn validate(&self) -> Result<(), ShiftError> {
        if self.sample_rate == 0 {
            return Err(ShiftError::Config("sample_rate must be positive".to_string()));
        }
        if self.preview_stride == 0 {
            return Err(ShiftError::Config("preview_stride must be positive".to_string()));
        }
        validate_fft_size(self.fft_size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.ffmpeg_path, PathBuf::from("/usr/bin/ffmpeg"));
        assert_eq!(config.ffprobe_path, PathBuf::from("/usr/bin/ffprobe"));
        assert_eq!(config.sample_rate, 44100);
        assert_eq!(config.preview_stride, 10);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_env_overrides() {
        let config = Config::default().with_env_overrides(|key| match key {
            "FFMPEG_PATH" => Some("/opt/ffmpeg/bin/ffmpeg".to_string()),
            "FFPROBE_PATH" => Some(String::new()),
            _ => None,
        });
        assert_eq!(config.ffmpeg_path, PathBuf::from("/opt/ffmpeg/bin/ffmpeg"));
        // Empty values are ignored.
        assert_eq!(config.ffprobe_path, PathBuf::from(DEFAULT_FFPROBE_PATH));
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: Config = serde_json::from_str(r#"{ "mp3_bitrate": "320k" }"#).unwrap();
        assert_eq!(config.mp3_bitrate, "320k");
        assert_eq!(config.sample_rate, DEFAULT_SAMPLE_RATE);
    }

    #[test]
    fn test_validate_rejects_bad_fft_size() {
        let config = Config {
            fft_size: 1000,
            ..Config::default()
        };
        assert!(matches!(config.validate(), Err(ShiftError::Config(_))));

        let config = Config {
            preview_stride: 0,
            ..Config::default()
        };
        assert!(matches!(config.validate(), Err(ShiftError::Config(_))));
    }

    #[test]
    fn test_from_json_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{ "preview_stride": 20, "fft_size": 4096 }"#).unwrap();
        let config = Config::from_json_file(&path).unwrap();
        assert_eq!(config.preview_stride, 20);
        assert_eq!(config.fft_size, 4096);

        std::fs::write(&path, "not json").unwrap();
        assert!(matches!(Config::from_json_file(&path), Err(ShiftError::Config(_))));

        std::fs::write(&path, r#"{ "fft_size": 1000 }"#).unwrap();
        assert!(matches!(Config::from_json_file(&path), Err(ShiftError::Config(_))));

        let missing = dir.path().join("missing.json");
        assert!(matches!(Config::from_json_file(&missing), Err(ShiftError::Io(_))));
    }
}
