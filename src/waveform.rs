//! Waveform preview of the uploaded clip.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::core::types::Sample;
use crate::error::ShiftError;

/// Decimated view of the mono (or left) channel for drawing a line chart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WaveformPreview {
    /// Every `stride`-th sample of the channel.
    pub points: Vec<Sample>,
    /// Decimation stride.
    pub stride: usize,
    /// Sample rate of the channel the points were taken from.
    pub sample_rate: u32,
    /// Fixed vertical range of the chart.
    pub y_range: (f32, f32),
}

impl WaveformPreview {
    /// Keeps every `stride`-th sample of `channel`, starting at index 0.
    pub fn from_channel(channel: &[Sample], sample_rate: u32, stride: usize) -> Self {
        let stride = stride.max(1);
        Self {
            points: channel.iter().step_by(stride).copied().collect(),
            stride,
            sample_rate,
            y_range: (-1.0, 1.0),
        }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Min/max envelope over `num_buckets` equal slices of the points,
    /// clamped to the chart range.
    pub fn peaks(&self, num_buckets: usize) -> WaveformPeaks {
        let n = self.points.len();
        if n == 0 || num_buckets == 0 {
            return WaveformPeaks {
                pos: vec![0.0; num_buckets],
                neg: vec![0.0; num_buckets],
            };
        }

        let (lo, hi) = self.y_range;
        let per_bucket = n as f64 / num_buckets as f64;
        let mut pos = Vec::with_capacity(num_buckets);
        let mut neg = Vec::with_capacity(num_buckets);

        for i in 0..num_buckets {
            let start = (i as f64 * per_bucket) as usize;
            let end = (((i + 1) as f64 * per_bucket) as usize).min(n);
            let slice = &self.points[start.min(end)..end];
            let max_val = slice.iter().cloned().fold(0.0f32, f32::max);
            let min_val = slice.iter().cloned().fold(0.0f32, f32::min);
            pos.push(max_val.clamp(lo, hi));
            neg.push(min_val.clamp(lo, hi));
        }

        WaveformPeaks { pos, neg }
    }

    /// Writes the preview as JSON for an external chart.
    pub fn write_json(&self, path: impl AsRef<Path>) -> Result<(), ShiftError> {
        let path = path.as_ref();
        let json = serde_json::to_string(self)
            .map_err(|e| ShiftError::Io(format!("failed to serialize preview: {e}")))?;
        std::fs::write(path, json)
            .map_err(|e| ShiftError::Io(format!("{}: {}", path.display(), e)))
    }
}

/// Positive and negative envelope per bucket.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WaveformPeaks {
    pub pos: Vec<f32>,
    pub neg: Vec<f32>,
}
