//! Sample-rate conversion via linear, cubic, and windowed-sinc interpolation.
//!
//! All functions map the first input sample onto the first output sample and
//! the last onto the last, so `output_len` fully determines the ratio.

/// Number of sinc lobes used for sample-rate normalization after decoding.
pub const DEFAULT_SINC_LOBES: usize = 8;

/// Kaiser window beta for the sinc kernel (~60 dB stopband).
const KAISER_BETA: f64 = 6.0;

/// Step between output positions, measured in input samples.
#[inline]
fn step(input_len: usize, output_len: usize) -> f64 {
    (input_len - 1) as f64 / (output_len.max(2) - 1) as f64
}

/// Linear interpolation resampling to exactly `output_len` samples.
pub fn resample_linear(input: &[f32], output_len: usize) -> Vec<f32> {
    if input.is_empty() || output_len == 0 {
        return vec![];
    }
    if input.len() == 1 {
        return vec![input[0]; output_len];
    }

    let step = step(input.len(), output_len);
    let last = input.len() - 1;
    (0..output_len)
        .map(|i| {
            let pos = i as f64 * step;
            let idx = (pos as usize).min(last);
            let frac = (pos - idx as f64) as f32;
            if idx < last {
                input[idx] + (input[idx + 1] - input[idx]) * frac
            } else {
                input[last]
            }
        })
        .collect()
}

/// 4-point Hermite interpolation resampling.
///
/// Used to bring a time-stretched channel back to its original duration.
pub fn resample_cubic(input: &[f32], output_len: usize) -> Vec<f32> {
    if input.is_empty() || output_len == 0 {
        return vec![];
    }
    if input.len() < 4 {
        return resample_linear(input, output_len);
    }

    let step = step(input.len(), output_len);
    let last = input.len() - 1;
    (0..output_len)
        .map(|i| {
            let pos = i as f64 * step;
            let idx = (pos as usize).min(last);
            let t = (pos - idx as f64) as f32;

            let s0 = input[idx.saturating_sub(1)];
            let s1 = input[idx];
            let s2 = input[(idx + 1).min(last)];
            let s3 = input[(idx + 2).min(last)];

            let c1 = 0.5 * (s2 - s0);
            let c2 = s0 - 2.5 * s1 + 2.0 * s2 - 0.5 * s3;
            let c3 = 0.5 * (s3 - s0) + 1.5 * (s1 - s2);
            ((c3 * t + c2) * t + c1) * t + s1
        })
        .collect()
}

/// Kaiser-windowed sinc resampling.
///
/// `lobes` trades speed for stopband sharpness; inputs shorter than two lobes
/// fall back to cubic interpolation. When downsampling, the kernel is widened
/// by the decimation factor so it also acts as the anti-aliasing filter.
pub fn resample_sinc(input: &[f32], output_len: usize, lobes: usize) -> Vec<f32> {
    if input.is_empty() || output_len == 0 {
        return vec![];
    }
    let lobes = lobes.max(1);
    if input.len() < 2 * lobes {
        return resample_cubic(input, output_len);
    }

    let step = step(input.len(), output_len);
    // Cutoff relative to the input Nyquist frequency.
    let cutoff = if step > 1.0 { 1.0 / step } else { 1.0 };
    let half_width = (lobes as f64 / cutoff).ceil() as isize;
    let i0_beta = bessel_i0(KAISER_BETA);

    let mut output = Vec::with_capacity(output_len);
    for i in 0..output_len {
        let pos = i as f64 * step;
        let center = pos.floor() as isize;

        let mut acc = 0.0f64;
        let mut weight_sum = 0.0f64;
        for j in (center - half_width + 1)..=(center + half_width) {
            if j < 0 || j >= input.len() as isize {
                continue;
            }
            let x = (pos - j as f64) * cutoff;
            let t = x / lobes as f64;
            if t.abs() > 1.0 {
                continue;
            }
            let window = bessel_i0(KAISER_BETA * (1.0 - t * t).sqrt()) / i0_beta;
            let w = sinc(x) * window;
            acc += input[j as usize] as f64 * w;
            weight_sum += w;
        }

        // Normalize to preserve DC gain at the edges.
        if weight_sum.abs() > 1e-10 {
            acc /= weight_sum;
        }
        output.push(acc as f32);
    }
    output
}

/// Converts a channel from `from_rate` to `to_rate` with the windowed-sinc
/// resampler. Equal rates return a copy.
pub fn resample_to_rate(input: &[f32], from_rate: u32, to_rate: u32) -> Vec<f32> {
    if from_rate == to_rate || from_rate == 0 {
        return input.to_vec();
    }
    let output_len =
        (input.len() as f64 * to_rate as f64 / from_rate as f64).round() as usize;
    resample_sinc(input, output_len, DEFAULT_SINC_LOBES)
}

#[inline]
fn sinc(x: f64) -> f64 {
    if x.abs() < 1e-10 {
        1.0
    } else {
        let pi_x = std::f64::consts::PI * x;
        pi_x.sin() / pi_x
    }
}

/// Modified Bessel function of the first kind, order zero (power series).
fn bessel_i0(x: f64) -> f64 {
    let mut sum = 1.0f64;
    let mut term = 1.0f64;
    let half_x = x * 0.5;
    for k in 1..=25 {
        term *= (half_x / k as f64) * (half_x / k as f64);
        sum += term;
        if term < sum * 1e-16 {
            break;
        }
    }
    sum
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::PI;

    #[test]
    fn test_resample_empty() {
        assert!(resample_linear(&[], 10).is_empty());
        assert!(resample_linear(&[1.0, 2.0], 0).is_empty());
        assert!(resample_cubic(&[], 10).is_empty());
        assert!(resample_sinc(&[], 10, 8).is_empty());
    }

    #[test]
    fn test_resample_linear_endpoints() {
        let output = resample_linear(&[0.0, 1.0], 5);
        assert_eq!(output.len(), 5);
        assert!(output[0].abs() < 1e-6);
        assert!((output[4] - 1.0).abs() < 1e-6);
        assert!(output.windows(2).all(|w| w[1] >= w[0]));
    }

    #[test]
    fn test_resample_cubic_identity() {
        let input: Vec<f32> = (0..100).map(|i| i as f32 / 100.0).collect();
        let output = resample_cubic(&input, 100);
        for (i, (a, b)) in input.iter().zip(&output).enumerate() {
            assert!((a - b).abs() < 1e-4, "mismatch at {}: {} vs {}", i, a, b);
        }
    }

    #[test]
    fn test_resample_cubic_halves_period() {
        // Compressing 200 samples of a 4-cycle sine into 100 keeps 4 cycles.
        let input: Vec<f32> = (0..200)
            .map(|i| (2.0 * PI * 4.0 * i as f32 / 200.0).sin())
            .collect();
        let output = resample_cubic(&input, 100);
        let crossings = output
            .windows(2)
            .filter(|w| w[0] <= 0.0 && w[1] > 0.0)
            .count();
        assert!((3..=4).contains(&crossings), "crossings = {}", crossings);
    }

    #[test]
    fn test_resample_sinc_upsample_sine() {
        let input: Vec<f32> = (0..200)
            .map(|i| (2.0 * PI * 5.0 * i as f32 / 100.0).sin())
            .collect();
        let output = resample_sinc(&input, 399, DEFAULT_SINC_LOBES);
        assert_eq!(output.len(), 399);
        let mut max_error = 0.0f32;
        for (i, &s) in output.iter().enumerate().take(360).skip(40) {
            let expected = (2.0 * PI * 5.0 * i as f32 / 200.0).sin();
            max_error = max_error.max((s - expected).abs());
        }
        assert!(max_error < 0.1, "max error {}", max_error);
    }

    #[test]
    fn test_resample_sinc_short_input_fallback() {
        let output = resample_sinc(&[0.0, 0.5, 1.0], 6, 8);
        assert_eq!(output.len(), 6);
        assert!(output.iter().all(|s| s.is_finite()));
    }

    #[test]
    fn test_resample_to_rate_length() {
        let input = vec![0.25f32; 48000];
        let output = resample_to_rate(&input, 48000, 44100);
        assert_eq!(output.len(), 44100);
        // DC is preserved.
        assert!(output.iter().all(|&s| (s - 0.25).abs() < 1e-3));

        let same = resample_to_rate(&input, 44100, 44100);
        assert_eq!(same.len(), input.len());
    }

    #[test]
    fn test_bessel_i0_known_values() {
        assert!((bessel_i0(0.0) - 1.0).abs() < 1e-10);
        assert!((bessel_i0(1.0) - 1.2660658777).abs() < 1e-6);
        assert!((bessel_i0(3.0) - 4.880792585).abs() < 1e-4);
    }
}
