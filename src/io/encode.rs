//! Encoding processed audio into a downloadable container.

use std::io::Write;
use std::path::PathBuf;
use std::process::{Command, Stdio};
use std::thread;

use crate::config::Config;
use crate::core::types::{OutputFormat, ProcessedAudio};
use crate::error::ShiftError;
use crate::io::wav::write_wav;

/// Turns processed PCM into the bytes of an output container.
pub trait AudioEncoder: Send + Sync {
    fn format(&self) -> OutputFormat;

    fn encode(&self, audio: &ProcessedAudio) -> Result<Vec<u8>, ShiftError>;
}

/// In-memory 16-bit PCM WAV. Needs no external binary.
#[derive(Debug, Clone, Copy, Default)]
pub struct WavEncoder;

impl AudioEncoder for WavEncoder {
    fn format(&self) -> OutputFormat {
        OutputFormat::Wav
    }

    fn encode(&self, audio: &ProcessedAudio) -> Result<Vec<u8>, ShiftError> {
        Ok(write_wav(audio))
    }
}

/// MP3 through the host `ffmpeg` binary and its `libmp3lame` encoder.
///
/// The audio is piped in as WAV on stdin and the MP3 stream is read back from
/// stdout, so nothing touches the disk.
#[derive(Debug, Clone)]
pub struct FfmpegMp3Encoder {
    ffmpeg_path: PathBuf,
    bitrate: String,
}

impl FfmpegMp3Encoder {
    pub fn new(ffmpeg_path: impl Into<PathBuf>) -> Self {
        Self {
            ffmpeg_path: ffmpeg_path.into(),
            bitrate: "192k".to_string(),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.ffmpeg_path.clone()).with_bitrate(config.mp3_bitrate.clone())
    }

    /// Sets the target bitrate in ffmpeg notation, e.g. `"128k"`.
    pub fn with_bitrate(mut self, bitrate: impl Into<String>) -> Self {
        self.bitrate = bitrate.into();
        self
    }

    pub fn bitrate(&self) -> &str {
        &self.bitrate
    }

    fn args(&self) -> Vec<&str> {
        vec![
            "-hide_banner",
            "-loglevel",
            "error",
            "-f",
            "wav",
            "-i",
            "pipe:0",
            "-codec:a",
            "libmp3lame",
            "-b:a",
            self.bitrate.as_str(),
            "-f",
            "mp3",
            "pipe:1",
        ]
    }
}

impl AudioEncoder for FfmpegMp3Encoder {
    fn format(&self) -> OutputFormat {
        OutputFormat::Mp3
    }

    fn encode(&self, audio: &ProcessedAudio) -> Result<Vec<u8>, ShiftError> {
        let wav = write_wav(audio);

        let mut child = Command::new(&self.ffmpeg_path)
            .args(self.args())
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| {
                ShiftError::Processing(format!(
                    "failed to start {}: {}",
                    self.ffmpeg_path.display(),
                    e
                ))
            })?;

        let mut stdin = child
            .stdin
            .take()
            .ok_or_else(|| ShiftError::Processing("ffmpeg stdin unavailable".to_string()))?;
        // Feed stdin from another thread so a full stdout pipe cannot stall us.
        let writer = thread::spawn(move || stdin.write_all(&wav));

        let output = child
            .wait_with_output()
            .map_err(|e| ShiftError::Processing(format!("ffmpeg did not finish: {e}")))?;
        let write_result = writer
            .join()
            .map_err(|_| ShiftError::Processing("ffmpeg stdin writer panicked".to_string()))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(ShiftError::Processing(format!(
                "ffmpeg exited with {}: {}",
                output.status,
                stderr.trim()
            )));
        }
        write_result
            .map_err(|e| ShiftError::Processing(format!("failed to feed ffmpeg: {e}")))?;
        if output.stdout.is_empty() {
            return Err(ShiftError::Processing("ffmpeg produced no output".to_string()));
        }

        log::debug!(
            "encoded {} frames to {} bytes of MP3 at {}",
            audio.num_frames(),
            output.stdout.len(),
            self.bitrate
        );
        Ok(output.stdout)
    }
}

/// Builds the encoder for an output format.
pub fn encoder_for(format: OutputFormat, config: &Config) -> Box<dyn AudioEncoder> {
    match format {
        OutputFormat::Mp3 => Box::new(FfmpegMp3Encoder::from_config(config)),
        OutputFormat::Wav => Box::new(WavEncoder),
    }
}
