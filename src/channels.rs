//! Conversion between interleaved 16-bit PCM and per-channel float buffers.

use crate::core::types::{Sample, I16_FULL_SCALE};

/// Splits interleaved 16-bit samples into one normalized float buffer per
/// channel (`sample / 32768`).
///
/// Mono yields a single buffer. Stereo yields the even-indexed samples as
/// channel 0 and the odd-indexed samples as channel 1.
pub fn split_channels(samples: &[i16], channels: u16) -> Vec<Vec<Sample>> {
    let num_channels = channels.max(1) as usize;
    (0..num_channels)
        .map(|ch| {
            samples
                .iter()
                .skip(ch)
                .step_by(num_channels)
                .map(|&s| s as Sample / I16_FULL_SCALE)
                .collect()
        })
        .collect()
}

/// Rescales a normalized sample to 16-bit.
///
/// Truncates toward zero and saturates at the i16 limits; NaN becomes 0.
#[inline]
pub fn rescale_sample(sample: Sample) -> i16 {
    (sample * I16_FULL_SCALE) as i16
}

/// Rescales shifted channels to 16-bit and interleaves them.
///
/// Channels of unequal length are truncated to the shortest one so frames
/// never mix samples from different times.
pub fn interleave_channels(channels: &[Vec<Sample>]) -> Vec<i16> {
    let frames = channels.iter().map(Vec::len).min().unwrap_or(0);
    if channels.iter().any(|c| c.len() != frames) {
        log::warn!(
            "shifted channel lengths differ ({:?}); truncating to {} frames",
            channels.iter().map(Vec::len).collect::<Vec<_>>(),
            frames
        );
    }

    let mut out = Vec::with_capacity(frames * channels.len());
    for i in 0..frames {
        out.extend(channels.iter().map(|ch| rescale_sample(ch[i])));
    }
    out
}
