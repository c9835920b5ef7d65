//! End-to-end processing of one uploaded clip.

use std::time::{Duration, Instant};

use crate::channels::{interleave_channels, split_channels};
use crate::config::Config;
use crate::core::types::{OutputFormat, ProcessedAudio, Sample, Semitones, UploadedClip};
use crate::error::ShiftError;
use crate::io::decode::decode_file;
use crate::io::encode::{AudioEncoder, FfmpegMp3Encoder};
use crate::io::staging::stage;
use crate::shift::{PhaseVocoderShifter, PitchShifter};
use crate::waveform::WaveformPreview;

/// Everything produced by one successful run.
#[derive(Debug, Clone)]
pub struct PipelineOutput {
    /// Encoded container bytes.
    pub encoded: Vec<u8>,
    pub format: OutputFormat,
    /// The shifted PCM that was encoded.
    pub audio: ProcessedAudio,
    /// Preview of the input's first channel.
    pub preview: WaveformPreview,
    pub processing_time: Duration,
}

/// Stage, decode, shift and re-encode an uploaded clip.
///
/// The pitch shifter and encoder are injected so the pipeline can run without
/// external binaries.
pub struct AudioPitchPipeline {
    config: Config,
    shifter: Box<dyn PitchShifter>,
    encoder: Box<dyn AudioEncoder>,
}

impl AudioPitchPipeline {
    /// Phase-vocoder shifting and ffmpeg MP3 output, as configured.
    ///
    /// # Errors
    ///
    /// Returns [`ShiftError::Config`] if `config` fails [`Config::validate`].
    pub fn new(config: Config) -> Result<Self, ShiftError> {
        config.validate()?;
        let shifter = PhaseVocoderShifter::new().with_fft_size(config.fft_size)?;
        let encoder = FfmpegMp3Encoder::from_config(&config);
        Ok(Self {
            config,
            shifter: Box::new(shifter),
            encoder: Box::new(encoder),
        })
    }

    pub fn with_shifter(mut self, shifter: impl PitchShifter + 'static) -> Self {
        self.shifter = Box::new(shifter);
        self
    }

    pub fn with_encoder(mut self, encoder: impl AudioEncoder + 'static) -> Self {
        self.encoder = Box::new(encoder);
        self
    }

    pub fn with_boxed_encoder(mut self, encoder: Box<dyn AudioEncoder>) -> Self {
        self.encoder = encoder;
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn output_format(&self) -> OutputFormat {
        self.encoder.format()
    }

    /// Runs the full pipeline on `clip`.
    ///
    /// The staged temp file is removed before shifting starts, and on every
    /// error path.
    ///
    /// # Errors
    ///
    /// [`ShiftError::Io`] if staging fails, [`ShiftError::Decode`] if the
    /// bytes are not audio, [`ShiftError::Processing`] if shifting or
    /// encoding fails.
    pub fn process(
        &self,
        clip: &UploadedClip,
        semitones: Semitones,
    ) -> Result<PipelineOutput, ShiftError> {
        let start = Instant::now();

        let decoded = {
            let staged = stage(clip, self.config.staging_dir.as_deref())?;
            let decoded = decode_file(staged.path(), staged.format(), self.config.sample_rate)?;
            staged.close()?;
            decoded
        };
        log::debug!(
            "decoded '{}' in {:.1?}: {} ch, {} frames",
            clip.name,
            start.elapsed(),
            decoded.channels,
            decoded.num_frames()
        );

        let channels = split_channels(&decoded.samples, decoded.channels);
        let preview = WaveformPreview::from_channel(
            channels.first().map(Vec::as_slice).unwrap_or_default(),
            decoded.sample_rate,
            self.config.preview_stride,
        );

        let shift_start = Instant::now();
        let shifted = self.shift_channels(&channels, decoded.sample_rate, semitones)?;
        log::debug!("shifted {} channel(s) in {:.1?}", shifted.len(), shift_start.elapsed());

        let audio = ProcessedAudio::new(
            interleave_channels(&shifted),
            decoded.sample_rate,
            decoded.channels,
        )?;

        let encode_start = Instant::now();
        let encoded = self.encoder.encode(&audio)?;
        log::debug!(
            "encoded {} bytes of {} in {:.1?}",
            encoded.len(),
            self.encoder.format().extension(),
            encode_start.elapsed()
        );

        let processing_time = start.elapsed();
        log::info!(
            "processed '{}' ({:.2}s of audio) by {} in {:.2?}",
            clip.name,
            audio.duration_secs(),
            semitones,
            processing_time
        );

        Ok(PipelineOutput {
            encoded,
            format: self.encoder.format(),
            audio,
            preview,
            processing_time,
        })
    }

    #[cfg(not(feature = "parallel"))]
    fn shift_channels(
        &self,
        channels: &[Vec<Sample>],
        sample_rate: u32,
        semitones: Semitones,
    ) -> Result<Vec<Vec<Sample>>, ShiftError> {
        channels
            .iter()
            .map(|ch| self.shifter.shift(ch, sample_rate, semitones.value() as f64))
            .collect()
    }

    #[cfg(feature = "parallel")]
    fn shift_channels(
        &self,
        channels: &[Vec<Sample>],
        sample_rate: u32,
        semitones: Semitones,
    ) -> Result<Vec<Vec<Sample>>, ShiftError> {
        use rayon::prelude::*;

        channels
            .par_iter()
            .map(|ch| self.shifter.shift(ch, sample_rate, semitones.value() as f64))
            .collect()
    }
}
