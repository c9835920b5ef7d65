//! Phase vocoder time stretching with identity phase locking.

use rustfft::num_complex::Complex;
use rustfft::{Fft, FftPlanner};
use std::f32::consts::PI;
use std::sync::Arc;

use crate::core::window::{generate_window, WindowType};
use crate::error::ShiftError;

const TWO_PI: f32 = 2.0 * PI;

/// Window sums below this fraction of the maximum are clamped during
/// overlap-add normalization so sparse regions are not amplified.
const WINDOW_SUM_FLOOR_RATIO: f32 = 0.1;
const WINDOW_SUM_EPSILON: f32 = 1e-6;

/// Phase vocoder state for stretching a mono signal.
///
/// The stretch ratio is `hop_synthesis / hop_analysis`. Frames are written
/// every `hop_synthesis` samples and read at `round(k * hop_analysis)`, so the
/// analysis hop may be fractional and the average ratio stays exact.
pub struct PhaseVocoder {
    fft_size: usize,
    hop_analysis: f64,
    hop_synthesis: usize,
    window: Vec<f32>,
    fft_forward: Arc<dyn Fft<f32>>,
    fft_inverse: Arc<dyn Fft<f32>>,
    /// Centre frequency of each bin in radians per sample.
    bin_frequencies: Vec<f32>,
    /// Synthesis phase per bin.
    phase_accum: Vec<f32>,
    /// Analysis phase per bin from the previous frame.
    prev_phase: Vec<f32>,
    fft_buffer: Vec<Complex<f32>>,
    magnitudes: Vec<f32>,
    analysis_phases: Vec<f32>,
    peaks: Vec<usize>,
}

impl PhaseVocoder {
    /// Creates a phase vocoder.
    ///
    /// # Errors
    ///
    /// Returns [`ShiftError::Processing`] if `fft_size` is smaller than 4, the
    /// synthesis hop is zero, or the analysis hop is below one sample.
    pub fn new(
        fft_size: usize,
        hop_analysis: f64,
        hop_synthesis: usize,
        window_type: WindowType,
    ) -> Result<Self, ShiftError> {
        if fft_size < 4 {
            return Err(ShiftError::Processing(format!(
                "fft size must be at least 4, got {}",
                fft_size
            )));
        }
        if hop_synthesis == 0 || !hop_analysis.is_finite() || hop_analysis < 1.0 {
            return Err(ShiftError::Processing(format!(
                "invalid hops: analysis {}, synthesis {}",
                hop_analysis, hop_synthesis
            )));
        }

        let num_bins = fft_size / 2 + 1;
        let mut planner = FftPlanner::new();
        let bin_frequencies = (0..num_bins)
            .map(|bin| TWO_PI * bin as f32 / fft_size as f32)
            .collect();

        Ok(Self {
            fft_size,
            hop_analysis,
            hop_synthesis,
            window: generate_window(window_type, fft_size),
            fft_forward: planner.plan_fft_forward(fft_size),
            fft_inverse: planner.plan_fft_inverse(fft_size),
            bin_frequencies,
            phase_accum: vec![0.0; num_bins],
            prev_phase: vec![0.0; num_bins],
            fft_buffer: vec![Complex::new(0.0, 0.0); fft_size],
            magnitudes: vec![0.0; num_bins],
            analysis_phases: vec![0.0; num_bins],
            peaks: Vec::with_capacity(num_bins / 4),
        })
    }

    /// Effective stretch ratio (output length / input length).
    #[inline]
    pub fn ratio(&self) -> f64 {
        self.hop_synthesis as f64 / self.hop_analysis
    }

    /// Stretches a mono signal. The input must hold at least one FFT frame.
    pub fn process(&mut self, input: &[f32]) -> Result<Vec<f32>, ShiftError> {
        if input.len() < self.fft_size {
            return Err(ShiftError::Processing(format!(
                "input too short: {} samples provided, {} required",
                input.len(),
                self.fft_size
            )));
        }

        let num_bins = self.fft_size / 2 + 1;
        let last_start = input.len() - self.fft_size;
        let num_frames = (last_start as f64 / self.hop_analysis).floor() as usize + 1;
        let output_len = (num_frames - 1) * self.hop_synthesis + self.fft_size;

        let mut output = vec![0.0f32; output_len];
        let mut window_sum = vec![0.0f32; output_len];

        self.phase_accum.iter_mut().for_each(|x| *x = 0.0);
        self.prev_phase.iter_mut().for_each(|x| *x = 0.0);

        let hop_synthesis = self.hop_synthesis as f32;
        let norm = 1.0 / self.fft_size as f32;
        let mut prev_pos = 0;

        for frame_idx in 0..num_frames {
            let analysis_pos =
                ((frame_idx as f64 * self.hop_analysis).round() as usize).min(last_start);
            let synthesis_pos = frame_idx * self.hop_synthesis;

            let frame = &input[analysis_pos..analysis_pos + self.fft_size];
            for ((slot, &sample), &win) in self.fft_buffer.iter_mut().zip(frame).zip(&self.window) {
                *slot = Complex::new(sample * win, 0.0);
            }
            self.fft_forward.process(&mut self.fft_buffer);

            // Rounded positions move by a whole number of samples per frame.
            let advance = (analysis_pos - prev_pos).max(1) as f32;
            prev_pos = analysis_pos;

            for bin in 0..num_bins {
                let c = self.fft_buffer[bin];
                let phase = c.arg();
                self.magnitudes[bin] = c.norm();
                self.analysis_phases[bin] = phase;

                if frame_idx == 0 {
                    // First frame seeds the synthesis phase directly.
                    self.phase_accum[bin] = phase;
                } else {
                    let expected = self.bin_frequencies[bin] * advance;
                    let deviation = wrap_phase(phase - self.prev_phase[bin] - expected);
                    let frequency = (expected + deviation) / advance;
                    self.phase_accum[bin] =
                        wrap_phase(self.phase_accum[bin] + frequency * hop_synthesis);
                }
                self.prev_phase[bin] = phase;
            }

            identity_phase_lock(
                &self.magnitudes,
                &self.analysis_phases,
                &mut self.phase_accum,
                &mut self.peaks,
            );

            self.reconstruct_spectrum(num_bins);
            self.fft_inverse.process(&mut self.fft_buffer);

            let out_end = (synthesis_pos + self.fft_size).min(output_len);
            for (i, out_idx) in (synthesis_pos..out_end).enumerate() {
                output[out_idx] += self.fft_buffer[i].re * norm * self.window[i];
                window_sum[out_idx] += self.window[i] * self.window[i];
            }
        }

        normalize_output(&mut output, &window_sum);
        Ok(output)
    }

    /// Rebuilds the full complex spectrum from magnitudes and synthesis
    /// phases, mirroring the negative frequencies.
    fn reconstruct_spectrum(&mut self, num_bins: usize) {
        for bin in 0..num_bins {
            self.fft_buffer[bin] = Complex::from_polar(self.magnitudes[bin], self.phase_accum[bin]);
        }
        for bin in 1..num_bins - 1 {
            self.fft_buffer[self.fft_size - bin] = self.fft_buffer[bin].conj();
        }
    }
}

/// Divides the overlap-added output by the accumulated squared window.
fn normalize_output(output: &mut [f32], window_sum: &[f32]) {
    let max_sum = window_sum.iter().cloned().fold(0.0f32, f32::max);
    let floor = (max_sum * WINDOW_SUM_FLOOR_RATIO).max(WINDOW_SUM_EPSILON);
    for (sample, &ws) in output.iter_mut().zip(window_sum) {
        *sample /= ws.max(floor);
    }
}

/// Wraps a phase value to [-PI, PI).
#[inline]
fn wrap_phase(phase: f32) -> f32 {
    let p = phase + PI;
    p - (p / TWO_PI).floor() * TWO_PI - PI
}

/// Identity phase locking: every bin keeps its analysis phase offset from the
/// nearest spectral peak, and only peaks use the propagated phase.
fn identity_phase_lock(
    magnitudes: &[f32],
    analysis_phases: &[f32],
    synthesis_phases: &mut [f32],
    peaks: &mut Vec<usize>,
) {
    let num_bins = magnitudes.len();
    if num_bins < 3 {
        return;
    }

    peaks.clear();
    for bin in 1..num_bins - 1 {
        if magnitudes[bin] > magnitudes[bin - 1] && magnitudes[bin] >= magnitudes[bin + 1] {
            peaks.push(bin);
        }
    }
    if peaks.is_empty() {
        return;
    }

    let mut peak_idx = 0;
    for bin in 0..num_bins {
        while peak_idx + 1 < peaks.len()
            && peaks[peak_idx + 1].abs_diff(bin) < peaks[peak_idx].abs_diff(bin)
        {
            peak_idx += 1;
        }
        let peak = peaks[peak_idx];
        if bin != peak {
            synthesis_phases[bin] =
                synthesis_phases[peak] + (analysis_phases[bin] - analysis_phases[peak]);
        }
    }
}
