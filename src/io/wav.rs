//! 16-bit PCM WAV reading and writing.

use crate::core::types::Pcm16Audio;
use crate::error::ShiftError;

const WAV_FORMAT_PCM: u16 = 1;
const BITS_PER_SAMPLE: u16 = 16;

/// Parses a 16-bit PCM WAV file from a byte slice.
///
/// Only the `fmt ` and `data` chunks are read; other chunks are skipped. A
/// truncated `data` chunk yields whatever whole samples are present.
pub fn read_wav(data: &[u8]) -> Result<Pcm16Audio, ShiftError> {
    if data.len() < 12 {
        return Err(ShiftError::Decode("WAV file too short".to_string()));
    }
    if &data[0..4] != b"RIFF" {
        return Err(ShiftError::Decode("missing RIFF header".to_string()));
    }
    if &data[8..12] != b"WAVE" {
        return Err(ShiftError::Decode("missing WAVE identifier".to_string()));
    }

    let mut cursor = 12;
    let mut format_code: u16 = 0;
    let mut num_channels: u16 = 0;
    let mut sample_rate: u32 = 0;
    let mut bits_per_sample: u16 = 0;
    let mut audio_data: &[u8] = &[];

    while cursor + 8 <= data.len() {
        let chunk_id = &data[cursor..cursor + 4];
        let chunk_size = read_u32_le(data, cursor + 4) as usize;
        cursor += 8;

        if chunk_id == b"fmt " {
            if cursor + 16 > data.len() {
                return Err(ShiftError::Decode("fmt chunk too short".to_string()));
            }
            format_code = read_u16_le(data, cursor);
            num_channels = read_u16_le(data, cursor + 2);
            sample_rate = read_u32_le(data, cursor + 4);
            bits_per_sample = read_u16_le(data, cursor + 14);
        } else if chunk_id == b"data" {
            let end = cursor.saturating_add(chunk_size).min(data.len());
            audio_data = &data[cursor..end];
        }

        cursor = cursor.saturating_add(chunk_size);
        // chunks are word-aligned
        if chunk_size % 2 == 1 {
            cursor = cursor.saturating_add(1);
        }
    }

    if sample_rate == 0 {
        return Err(ShiftError::Decode("no fmt chunk found".to_string()));
    }
    if (format_code, bits_per_sample) != (WAV_FORMAT_PCM, BITS_PER_SAMPLE) {
        return Err(ShiftError::Decode(format!(
            "unsupported WAV format: code={}, bits={}",
            format_code, bits_per_sample
        )));
    }

    let frame_bytes = 2 * num_channels.max(1) as usize;
    let usable = audio_data.len() - audio_data.len() % frame_bytes;
    let samples = audio_data[..usable]
        .chunks_exact(2)
        .map(|b| i16::from_le_bytes([b[0], b[1]]))
        .collect();

    Pcm16Audio::new(samples, sample_rate, num_channels)
        .map_err(|e| ShiftError::Decode(e.to_string()))
}

/// Serializes audio as a canonical 44-byte-header 16-bit PCM WAV.
pub fn write_wav(audio: &Pcm16Audio) -> Vec<u8> {
    let num_channels = audio.channels;
    let block_align = num_channels * Pcm16Audio::SAMPLE_WIDTH;
    let byte_rate = audio.sample_rate * block_align as u32;
    let data_size = (audio.samples.len() * Pcm16Audio::SAMPLE_WIDTH as usize) as u32;
    let file_size = 36 + data_size;

    let mut out = Vec::with_capacity(file_size as usize + 8);

    out.extend_from_slice(b"RIFF");
    out.extend_from_slice(&file_size.to_le_bytes());
    out.extend_from_slice(b"WAVE");

    out.extend_from_slice(b"fmt ");
    out.extend_from_slice(&16u32.to_le_bytes());
    out.extend_from_slice(&WAV_FORMAT_PCM.to_le_bytes());
    out.extend_from_slice(&num_channels.to_le_bytes());
    out.extend_from_slice(&audio.sample_rate.to_le_bytes());
    out.extend_from_slice(&byte_rate.to_le_bytes());
    out.extend_from_slice(&block_align.to_le_bytes());
    out.extend_from_slice(&BITS_PER_SAMPLE.to_le_bytes());

    out.extend_from_slice(b"data");
    out.extend_from_slice(&data_size.to_le_bytes());
    for &sample in &audio.samples {
        out.extend_from_slice(&sample.to_le_bytes());
    }

    out
}

#[inline]
fn read_u16_le(data: &[u8], offset: usize) -> u16 {
    u16::from_le_bytes([data[offset], data[offset + 1]])
}

#[inline]
fn read_u32_le(data: &[u8], offset: usize) -> u32 {
    u32::from_le_bytes([
        data[offset],
        data[offset + 1],
        data[offset + 2],
        data[offset + 3],
    ])
}
