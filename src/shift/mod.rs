//! Pitch shifting.
//!
//! The pipeline only depends on the [`PitchShifter`] trait. The bundled
//! [`PhaseVocoderShifter`] time-stretches each channel by the pitch factor
//! with a phase vocoder and then resamples it back to its original duration.

pub mod phase_vocoder;

pub use phase_vocoder::PhaseVocoder;

use crate::core::resample::resample_cubic;
use crate::core::types::{semitones_to_factor, Semitones};
use crate::core::window::WindowType;
use crate::error::ShiftError;

/// Default FFT size for the phase vocoder.
pub const DEFAULT_FFT_SIZE: usize = 2048;

/// Smallest FFT size the shifter accepts.
pub const MIN_FFT_SIZE: usize = 256;

/// Shifts the pitch of one channel while keeping its duration.
///
/// Implementations receive a single de-interleaved channel of normalized
/// samples. The returned buffer should be close to the input length; the
/// pipeline tolerates small differences.
pub trait PitchShifter: Send + Sync {
    fn shift(
        &self,
        samples: &[f32],
        sample_rate: u32,
        semitones: f64,
    ) -> Result<Vec<f32>, ShiftError>;
}

impl<F> PitchShifter for F
where
    F: Fn(&[f32], u32, f64) -> Result<Vec<f32>, ShiftError> + Send + Sync,
{
    fn shift(
        &self,
        samples: &[f32],
        sample_rate: u32,
        semitones: f64,
    ) -> Result<Vec<f32>, ShiftError> {
        self(samples, sample_rate, semitones)
    }
}

/// Checks that `fft_size` is a power of two of at least [`MIN_FFT_SIZE`].
pub fn validate_fft_size(fft_size: usize) -> Result<(), ShiftError> {
    if !fft_size.is_power_of_two() || fft_size < MIN_FFT_SIZE {
        return Err(ShiftError::Config(format!(
            "fft_size must be a power of two >= {}, got {}",
            MIN_FFT_SIZE, fft_size
        )));
    }
    Ok(())
}

/// Rejects non-finite or out-of-range semitone values.
pub fn validate_semitones(semitones: f64) -> Result<(), ShiftError> {
    if !semitones.is_finite()
        || semitones < Semitones::MIN as f64
        || semitones > Semitones::MAX as f64
    {
        return Err(ShiftError::InvalidSemitones(semitones.round() as i32));
    }
    Ok(())
}

/// Phase-vocoder pitch shifter.
///
/// The synthesis hop is fixed at a quarter frame and the analysis hop is
/// derived from the pitch factor, so the overlap-add stays dense at any
/// shift. Input is padded with one frame of silence on each side, which lets
/// clips shorter than a frame through and keeps the output aligned with the
/// input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PhaseVocoderShifter {
    fft_size: usize,
    window: WindowType,
}

impl Default for PhaseVocoderShifter {
    fn default() -> Self {
        Self::new()
    }
}

impl PhaseVocoderShifter {
    pub fn new() -> Self {
        Self {
            fft_size: DEFAULT_FFT_SIZE,
            window: WindowType::Hann,
        }
    }

    /// Sets the FFT size.
    ///
    /// # Errors
    ///
    /// Returns [`ShiftError::Config`] unless `fft_size` is a power of two of
    /// at least [`MIN_FFT_SIZE`].
    pub fn with_fft_size(mut self, fft_size: usize) -> Result<Self, ShiftError> {
        validate_fft_size(fft_size)?;
        self.fft_size = fft_size;
        Ok(self)
    }

    pub fn with_window(mut self, window: WindowType) -> Self {
        self.window = window;
        self
    }

    pub fn fft_size(&self) -> usize {
        self.fft_size
    }

    /// Analysis and synthesis hops for a frequency multiplier. The analysis
    /// hop is fractional so the stretch ratio equals `factor` exactly.
    pub fn hops(&self, factor: f64) -> (f64, usize) {
        let hop_synthesis = self.fft_size / 4;
        (hop_synthesis as f64 / factor, hop_synthesis)
    }
}

impl PitchShifter for PhaseVocoderShifter {
    fn shift(
        &self,
        samples: &[f32],
        sample_rate: u32,
        semitones: f64,
    ) -> Result<Vec<f32>, ShiftError> {
        validate_semitones(semitones)?;
        if sample_rate == 0 {
            return Err(ShiftError::Processing("sample rate must be positive".to_string()));
        }
        if samples.is_empty() {
            return Ok(vec![]);
        }
        if samples.iter().any(|s| !s.is_finite()) {
            return Err(ShiftError::Processing(
                "input contains NaN or infinite samples".to_string(),
            ));
        }
        if semitones == 0.0 {
            return Ok(samples.to_vec());
        }

        let factor = semitones_to_factor(semitones);
        let (hop_analysis, hop_synthesis) = self.hops(factor);
        let mut vocoder =
            PhaseVocoder::new(self.fft_size, hop_analysis, hop_synthesis, self.window)?;
        let ratio = vocoder.ratio();

        let pad = self.fft_size;
        let mut padded = Vec::with_capacity(samples.len() + 2 * pad);
        padded.resize(pad, 0.0);
        padded.extend_from_slice(samples);
        padded.resize(samples.len() + 2 * pad, 0.0);

        let stretched = vocoder.process(&padded)?;
        let target_len = (stretched.len() as f64 / ratio).round() as usize;
        let resampled = resample_cubic(&stretched, target_len);

        // Frame centres map x -> (x - N/2) * ratio + N/2, so after resampling
        // the padded input sample `pad + i` sits at `i + N/2 + N / (2 * ratio)`.
        let half = self.fft_size as f64 / 2.0;
        let offset = (half + half / ratio).round() as usize;

        let mut output: Vec<f32> = resampled
            .into_iter()
            .skip(offset)
            .take(samples.len())
            .collect();
        output.resize(samples.len(), 0.0);

        log::trace!(
            "shifted {} samples by {:+} st (hops {:.2}/{}, stretched to {})",
            samples.len(),
            semitones,
            hop_analysis,
            hop_synthesis,
            stretched.len()
        );
        Ok(output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::PI;

    fn sine(freq: f32, n: usize) -> Vec<f32> {
        (0..n)
            .map(|i| (2.0 * PI * freq * i as f32 / 44100.0).sin())
            .collect()
    }

    fn positive_crossings(signal: &[f32]) -> usize {
        signal.windows(2).filter(|w| w[0] <= 0.0 && w[1] > 0.0).count()
    }

    #[test]
    fn test_hops() {
        let shifter = PhaseVocoderShifter::new();
        assert_eq!(shifter.hops(1.0), (512.0, 512));
        assert_eq!(shifter.hops(2.0), (256.0, 512));
        assert_eq!(shifter.hops(0.5), (1024.0, 512));
        assert_eq!(shifter.hops(4.0), (128.0, 512));
    }

    #[test]
    fn test_hop_ratio_is_exact_for_every_semitone() {
        let shifter = PhaseVocoderShifter::new();
        for semitones in Semitones::MIN..=Semitones::MAX {
            let factor = semitones_to_factor(semitones as f64);
            let (hop_analysis, hop_synthesis) = shifter.hops(factor);
            let ratio = hop_synthesis as f64 / hop_analysis;
            assert!((ratio / factor - 1.0).abs() < 1e-12, "{} st", semitones);
        }
    }

    #[test]
    fn test_with_fft_size_validates() {
        let shifter = PhaseVocoderShifter::new().with_fft_size(4096).unwrap();
        assert_eq!(shifter.fft_size(), 4096);
        for bad in [0, 128, 1000, 3000] {
            assert!(matches!(
                PhaseVocoderShifter::new().with_fft_size(bad),
                Err(ShiftError::Config(_))
            ));
        }
    }

    #[test]
    fn test_zero_shift_is_identity() {
        let input = sine(440.0, 4410);
        let output = PhaseVocoderShifter::new().shift(&input, 44100, 0.0).unwrap();
        assert_eq!(output, input);
    }

    #[test]
    fn test_output_length_matches_input() {
        let shifter = PhaseVocoderShifter::new();
        for semitones in [-24.0, -7.0, 3.0, 12.0, 24.0] {
            let input = sine(440.0, 22050);
            let output = shifter.shift(&input, 44100, semitones).unwrap();
            assert_eq!(output.len(), input.len(), "semitones {}", semitones);
        }
    }

    #[test]
    fn test_short_clip_is_padded() {
        let input = sine(440.0, 300);
        let output = PhaseVocoderShifter::new().shift(&input, 44100, 5.0).unwrap();
        assert_eq!(output.len(), 300);
        assert!(output.iter().all(|s| s.is_finite()));
    }

    #[test]
    fn test_octave_up_doubles_crossings() {
        let input = sine(440.0, 44100);
        let output = PhaseVocoderShifter::new().shift(&input, 44100, 12.0).unwrap();
        let mid_in = positive_crossings(&input[11025..33075]);
        let mid_out = positive_crossings(&output[11025..33075]);
        let ratio = mid_out as f64 / mid_in as f64;
        assert!((ratio - 2.0).abs() < 0.05, "crossing ratio {}", ratio);
    }

    #[test]
    fn test_rejects_out_of_range() {
        let shifter = PhaseVocoderShifter::new();
        assert_eq!(
            shifter.shift(&[0.0; 10], 44100, 25.0),
            Err(ShiftError::InvalidSemitones(25))
        );
        assert!(shifter.shift(&[0.0; 10], 44100, f64::NAN).is_err());
        assert!(shifter.shift(&[f32::NAN; 10], 44100, 1.0).is_err());
    }

    #[test]
    fn test_closure_shifter() {
        let halve = |s: &[f32], _sr: u32, _st: f64| -> Result<Vec<f32>, ShiftError> {
            Ok(s.iter().map(|x| x * 0.5).collect())
        };
        assert_eq!(halve.shift(&[1.0, -1.0], 44100, 3.0).unwrap(), vec![0.5, -0.5]);
    }
}
