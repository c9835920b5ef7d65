//! Window functions for the phase vocoder.

use std::f64::consts::PI;

/// 4-term Blackman-Harris coefficients.
const BH_A0: f64 = 0.35875;
const BH_A1: f64 = 0.48829;
const BH_A2: f64 = 0.14128;
const BH_A3: f64 = 0.01168;

/// Window function types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WindowType {
    #[default]
    Hann,
    BlackmanHarris,
}

/// Generates a periodic window of the given type and size.
///
/// Periodic (rather than symmetric) windows overlap-add to a constant at
/// hop sizes that divide the frame size, which keeps the vocoder's
/// normalization flat.
pub fn generate_window(window_type: WindowType, size: usize) -> Vec<f32> {
    match size {
        0 => return vec![],
        1 => return vec![1.0],
        _ => {}
    }
    let n = size as f64;
    (0..size)
        .map(|i| {
            let x = 2.0 * PI * i as f64 / n;
            let w = match window_type {
                WindowType::Hann => 0.5 * (1.0 - x.cos()),
                WindowType::BlackmanHarris => {
                    BH_A0 - BH_A1 * x.cos() + BH_A2 * (2.0 * x).cos() - BH_A3 * (3.0 * x).cos()
                }
            };
            w as f32
        })
        .collect()
}
