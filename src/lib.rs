#![forbid(unsafe_code)]
//! Batch pitch shifting for uploaded audio clips.
//!
//! `spectral_shift` takes an uploaded file (mp3, wav, ogg or m4a), decodes it
//! to 16-bit PCM at 44.1 kHz, shifts every channel by a whole number of
//! semitones with a phase vocoder and re-encodes the result, alongside a
//! decimated waveform preview of the input.
//!
//! # Quick Start
//!
//! ```
//! use spectral_shift::{AudioPitchPipeline, Config, Pcm16Audio, Semitones, UploadedClip, WavEncoder};
//!
//! // 0.1 s of a 440 Hz tone as a WAV upload
//! let samples: Vec<i16> = (0..4410)
//!     .map(|i| ((2.0 * std::f32::consts::PI * 440.0 * i as f32 / 44100.0).sin() * 8000.0) as i16)
//!     .collect();
//! let wav = spectral_shift::io::write_wav(&Pcm16Audio::new(samples, 44100, 1)?);
//! let clip = UploadedClip::new("tone.wav", wav);
//!
//! let pipeline = AudioPitchPipeline::new(Config::default())?.with_encoder(WavEncoder);
//! let output = pipeline.process(&clip, Semitones::new(7)?)?;
//! assert_eq!(output.audio.num_frames(), 4410);
//! # Ok::<(), spectral_shift::ShiftError>(())
//! ```
//!
//! # Sessions
//!
//! [`Session`] wraps the pipeline with the upload/process state machine used
//! by interactive front ends:
//!
//! ```
//! use spectral_shift::{Interval, Session, SessionState, UploadedClip};
//!
//! let mut session = Session::new();
//! session.upload(UploadedClip::new("take.mp3", vec![]));
//! session.apply_preset(Interval::OctaveUp);
//! assert_eq!(session.state(), SessionState::Uploaded);
//! assert_eq!(session.semitones().value(), 12);
//! ```
//!
//! MP3 output goes through the host `ffmpeg`; call [`environment::verify`]
//! at startup to fail fast when it is missing.

pub mod channels;
pub mod config;
pub mod core;
pub mod environment;
pub mod error;
pub mod io;
pub mod pipeline;
pub mod session;
pub mod shift;
pub mod waveform;

pub use config::Config;
pub use core::types::{
    ContainerFormat, DecodedAudio, Interval, OutputFormat, Pcm16Audio, ProcessedAudio, Sample,
    Semitones, UploadedClip,
};
pub use core::window::WindowType;
pub use error::ShiftError;
pub use io::encode::{AudioEncoder, FfmpegMp3Encoder, WavEncoder};
pub use pipeline::{AudioPitchPipeline, PipelineOutput};
pub use session::{Session, SessionResult, SessionState};
pub use shift::{PhaseVocoderShifter, PitchShifter};
pub use waveform::WaveformPreview;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_public_types_are_send_sync() {
        const fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<AudioPitchPipeline>();
        assert_send_sync::<Session>();
        assert_send_sync::<SessionResult>();
        assert_send_sync::<PhaseVocoderShifter>();
        assert_send_sync::<ShiftError>();
    }
}
