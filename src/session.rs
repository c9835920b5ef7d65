//! Per-user session state.
//!
//! A [`Session`] tracks the uploaded clip, the chosen semitone offset and the
//! last successful result:
//!
//! ```text
//! Idle ──upload──> Uploaded ──process──> Processing ──ok──> Processed
//!                                            │                  │
//!                                            └──err──> Idle     └──process──> Processing
//! ```
//!
//! Changing the semitone value or applying a preset never starts processing.
//! A failed run returns to `Idle` but keeps both the uploaded clip and the
//! previous result, so the user can retry and still download the last good
//! output.

use std::time::Duration;

use crate::core::types::{Interval, OutputFormat, Semitones, UploadedClip};
use crate::error::ShiftError;
use crate::pipeline::AudioPitchPipeline;
use crate::waveform::WaveformPreview;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionState {
    #[default]
    Idle,
    Uploaded,
    Processing,
    Processed,
}

/// The downloadable output of the last successful run.
#[derive(Debug, Clone)]
pub struct SessionResult {
    /// Encoded file contents.
    pub audio: Vec<u8>,
    pub format: OutputFormat,
    pub semitones: Semitones,
    pub processing_time: Duration,
    pub channels: u16,
    pub sample_rate: u32,
    pub frames: usize,
    pub preview: WaveformPreview,
}

impl SessionResult {
    /// `pitch_shifted_{n}st.{ext}`.
    pub fn download_filename(&self) -> String {
        download_filename(self.semitones, self.format)
    }

    pub fn mime_type(&self) -> &'static str {
        self.format.mime_type()
    }

    pub fn duration_secs(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.frames as f64 / self.sample_rate as f64
    }
}

/// Name offered for downloading a shifted clip.
pub fn download_filename(semitones: Semitones, format: OutputFormat) -> String {
    format!("pitch_shifted_{}st.{}", semitones.value(), format.extension())
}

#[derive(Debug, Default)]
pub struct Session {
    state: SessionState,
    clip: Option<UploadedClip>,
    semitones: Semitones,
    result: Option<SessionResult>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn state(&self) -> SessionState {
        self.state
    }

    #[inline]
    pub fn semitones(&self) -> Semitones {
        self.semitones
    }

    pub fn clip(&self) -> Option<&UploadedClip> {
        self.clip.as_ref()
    }

    /// Last successful result, if any.
    pub fn result(&self) -> Option<&SessionResult> {
        self.result.as_ref()
    }

    /// Replaces the current clip. The previous result stays until the next
    /// successful run.
    pub fn upload(&mut self, clip: UploadedClip) {
        log::debug!("uploaded '{}' ({} bytes)", clip.name, clip.len());
        self.clip = Some(clip);
        self.state = SessionState::Uploaded;
    }

    pub fn set_semitones(&mut self, semitones: Semitones) {
        self.semitones = semitones;
    }

    pub fn apply_preset(&mut self, interval: Interval) {
        self.semitones = interval.semitones();
    }

    /// Runs the pipeline on the uploaded clip with the current semitones.
    ///
    /// # Errors
    ///
    /// Returns [`ShiftError::Processing`] if no clip has been uploaded, or
    /// whatever the pipeline reports. On error the session goes back to
    /// `Idle` with the clip and previous result untouched.
    pub fn process(&mut self, pipeline: &AudioPitchPipeline) -> Result<&SessionResult, ShiftError> {
        let Some(clip) = self.clip.as_ref() else {
            return Err(ShiftError::Processing("no clip uploaded".to_string()));
        };

        self.state = SessionState::Processing;
        match pipeline.process(clip, self.semitones) {
            Ok(output) => {
                self.state = SessionState::Processed;
                let result = self.result.insert(SessionResult {
                    frames: output.audio.num_frames(),
                    channels: output.audio.channels,
                    sample_rate: output.audio.sample_rate,
                    audio: output.encoded,
                    format: output.format,
                    semitones: self.semitones,
                    processing_time: output.processing_time,
                    preview: output.preview,
                });
                Ok(result)
            }
            Err(err) => {
                log::warn!("processing failed: {}", err);
                self.state = SessionState::Idle;
                Err(err)
            }
        }
    }
}
