#![allow(dead_code)]

use std::f32::consts::PI;

use rustfft::num_complex::Complex;
use rustfft::FftPlanner;
use spectral_shift::io::write_wav;
use spectral_shift::{Config, Pcm16Audio, UploadedClip};

pub fn gen_sine(freq_hz: f32, sr: u32, n: usize, amp: f32) -> Vec<f32> {
    (0..n)
        .map(|i| amp * (2.0 * PI * freq_hz * i as f32 / sr as f32).sin())
        .collect()
}

/// Quantizes float samples to 16-bit, saturating.
pub fn to_i16(samples: &[f32]) -> Vec<i16> {
    samples.iter().map(|&s| (s * 32768.0) as i16).collect()
}

pub fn from_i16(samples: &[i16]) -> Vec<f32> {
    samples.iter().map(|&s| s as f32 / 32768.0).collect()
}

/// Interleaves two equally long channels.
pub fn interleave(left: &[i16], right: &[i16]) -> Vec<i16> {
    left.iter().zip(right).flat_map(|(&l, &r)| [l, r]).collect()
}

pub fn channel(samples: &[i16], channels: usize, ch: usize) -> Vec<f32> {
    samples
        .iter()
        .skip(ch)
        .step_by(channels)
        .map(|&s| s as f32 / 32768.0)
        .collect()
}

/// A WAV upload holding the given interleaved samples.
pub fn wav_clip(name: &str, samples: Vec<i16>, sample_rate: u32, channels: u16) -> UploadedClip {
    let audio = Pcm16Audio::new(samples, sample_rate, channels).unwrap();
    UploadedClip::new(name, write_wav(&audio))
}

/// An upload read from `tests/fixtures`.
pub fn fixture_clip(name: &str) -> UploadedClip {
    let path = std::path::Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name);
    UploadedClip::from_file(path).unwrap()
}

/// Config that stages uploads in `dir`.
pub fn config_in(dir: &std::path::Path) -> Config {
    Config {
        staging_dir: Some(dir.to_path_buf()),
        ..Config::default()
    }
}

pub fn dir_is_empty(dir: &std::path::Path) -> bool {
    std::fs::read_dir(dir).unwrap().next().is_none()
}

pub fn rms(signal: &[f32]) -> f64 {
    if signal.is_empty() {
        return 0.0;
    }
    let sum_sq: f64 = signal.iter().map(|&s| (s as f64) * (s as f64)).sum();
    (sum_sq / signal.len() as f64).sqrt()
}

/// Strongest frequency in `signal`, from a Hann-windowed zero-padded FFT
/// with parabolic peak interpolation.
pub fn dominant_frequency(signal: &[f32], sr: u32) -> f64 {
    if signal.is_empty() {
        return 0.0;
    }
    let fft_len = (signal.len() * 4).next_power_of_two();
    let n = signal.len() as f32;
    let mut buf: Vec<Complex<f32>> = signal
        .iter()
        .enumerate()
        .map(|(i, &s)| {
            let w = 0.5 * (1.0 - (2.0 * PI * i as f32 / n).cos());
            Complex::new(s * w, 0.0)
        })
        .collect();
    buf.resize(fft_len, Complex::new(0.0, 0.0));

    FftPlanner::<f32>::new()
        .plan_fft_forward(fft_len)
        .process(&mut buf);

    let mags: Vec<f64> = buf[..fft_len / 2].iter().map(|c| c.norm() as f64).collect();
    let (peak, _) = mags
        .iter()
        .enumerate()
        .skip(1)
        .fold((1, 0.0), |best, (i, &m)| if m > best.1 { (i, m) } else { best });

    let offset = if peak + 1 < mags.len() {
        let (a, b, c) = (mags[peak - 1], mags[peak], mags[peak + 1]);
        let denom = a - 2.0 * b + c;
        if denom.abs() > 1e-12 {
            0.5 * (a - c) / denom
        } else {
            0.0
        }
    } else {
        0.0
    };

    (peak as f64 + offset) * sr as f64 / fft_len as f64
}

pub fn energy_at_freq(signal: &[f32], sr: u32, freq_hz: f32) -> f64 {
    if signal.is_empty() {
        return 0.0;
    }
    let mut re = 0.0f64;
    let mut im = 0.0f64;
    for (i, &s) in signal.iter().enumerate() {
        let angle = 2.0 * std::f64::consts::PI * freq_hz as f64 * i as f64 / sr as f64;
        let sv = s as f64;
        re += sv * angle.cos();
        im -= sv * angle.sin();
    }
    (re * re + im * im).sqrt() / signal.len() as f64
}
