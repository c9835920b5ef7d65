//! Decoding staged clips to 16-bit PCM at the target sample rate.

use std::fs::File;
use std::path::Path;

use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::DecoderOptions;
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;

use crate::channels::interleave_channels;
use crate::core::resample::resample_to_rate;
use crate::core::types::{ContainerFormat, DecodedAudio, Sample};
use crate::error::ShiftError;

/// Decodes `path` and normalizes it to 16-bit PCM at `target_rate`.
///
/// `format` is only a hint; the probe inspects the content itself, so a WAV
/// staged with an `.mp3` extension still decodes.
///
/// # Errors
///
/// Returns [`ShiftError::Decode`] if the container or codec is not
/// recognised, the stream has more than two channels or holds no audio.
pub fn decode_file(
    path: &Path,
    format: ContainerFormat,
    target_rate: u32,
) -> Result<DecodedAudio, ShiftError> {
    let file = File::open(path).map_err(|e| ShiftError::Io(format!("{}: {}", path.display(), e)))?;
    let mss = MediaSourceStream::new(Box::new(file), Default::default());

    let mut hint = Hint::new();
    hint.with_extension(format.extension());

    let probed = symphonia::default::get_probe()
        .format(&hint, mss, &FormatOptions::default(), &MetadataOptions::default())
        .map_err(|e| ShiftError::Decode(format!("failed to probe format: {e}")))?;
    let mut reader = probed.format;

    let track = reader
        .default_track()
        .ok_or_else(|| ShiftError::Decode("no audio track found".to_string()))?;
    let track_id = track.id;
    let codec_params = track.codec_params.clone();

    let mut decoder = symphonia::default::get_codecs()
        .make(&codec_params, &DecoderOptions::default())
        .map_err(|e| ShiftError::Decode(format!("failed to create decoder: {e}")))?;

    let mut source_rate = codec_params.sample_rate.unwrap_or(0);
    let mut num_channels = codec_params.channels.map(|c| c.count()).unwrap_or(0);
    let mut interleaved: Vec<Sample> = Vec::new();
    let mut skipped = 0usize;

    loop {
        let packet = match reader.next_packet() {
            Ok(p) => p,
            Err(SymphoniaError::IoError(ref e))
                if e.kind() == std::io::ErrorKind::UnexpectedEof =>
            {
                break;
            }
            Err(SymphoniaError::ResetRequired) => break,
            Err(e) => return Err(ShiftError::Decode(format!("error reading packet: {e}"))),
        };

        if packet.track_id() != track_id {
            continue;
        }

        let decoded = match decoder.decode(&packet) {
            Ok(d) => d,
            Err(SymphoniaError::DecodeError(msg)) => {
                log::debug!("skipping corrupt packet: {}", msg);
                skipped += 1;
                continue;
            }
            Err(e) => return Err(ShiftError::Decode(format!("decode error: {e}"))),
        };

        let spec = *decoded.spec();
        source_rate = spec.rate;
        num_channels = spec.channels.count();
        if num_channels > 2 {
            return Err(ShiftError::Decode(format!(
                "unsupported channel count: {} (mono or stereo only)",
                num_channels
            )));
        }

        let mut buf = SampleBuffer::<Sample>::new(decoded.capacity() as u64, spec);
        buf.copy_interleaved_ref(decoded);
        interleaved.extend_from_slice(buf.samples());
    }

    if skipped > 0 {
        log::warn!("skipped {} undecodable packets", skipped);
    }
    if interleaved.is_empty() || num_channels == 0 {
        return Err(ShiftError::Decode("stream contains no audio".to_string()));
    }
    if source_rate == 0 {
        return Err(ShiftError::Decode("unknown sample rate".to_string()));
    }

    let channels = deinterleave(&interleaved, num_channels);
    let channels: Vec<Vec<Sample>> = if source_rate == target_rate {
        channels
    } else {
        log::debug!("resampling {} Hz -> {} Hz", source_rate, target_rate);
        channels
            .iter()
            .map(|ch| resample_to_rate(ch, source_rate, target_rate))
            .collect()
    };

    let samples = interleave_channels(&channels);
    log::debug!(
        "decoded {} ({} ch, {} Hz source, {} frames)",
        path.display(),
        num_channels,
        source_rate,
        samples.len() / num_channels
    );
    DecodedAudio::new(samples, target_rate, num_channels as u16)
}

fn deinterleave(interleaved: &[Sample], num_channels: usize) -> Vec<Vec<Sample>> {
    (0..num_channels)
        .map(|ch| {
            interleaved
                .iter()
                .skip(ch)
                .step_by(num_channels)
                .copied()
                .collect()
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::Pcm16Audio;
    use crate::io::wav::write_wav;
    use std::io::Write;

    fn write_temp(bytes: &[u8], ext: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new()
            .suffix(&format!(".{ext}"))
            .tempfile()
            .unwrap();
        file.write_all(bytes).unwrap();
        file.flush().unwrap();
        file
    }

    #[test]
    fn test_decode_wav_at_target_rate() {
        let audio = Pcm16Audio::new(vec![0, 1000, -1000, 16384, -16384, 32767], 44100, 2).unwrap();
        let file = write_temp(&write_wav(&audio), "wav");
        let decoded = decode_file(file.path(), ContainerFormat::Wav, 44100).unwrap();
        assert_eq!(decoded, audio);
    }

    #[test]
    fn test_decode_resamples() {
        let samples: Vec<i16> = (0..4800)
            .map(|i| ((i as f32 * 0.05).sin() * 10000.0) as i16)
            .collect();
        let audio = Pcm16Audio::new(samples, 48000, 1).unwrap();
        let file = write_temp(&write_wav(&audio), "wav");
        let decoded = decode_file(file.path(), ContainerFormat::Wav, 44100).unwrap();
        assert_eq!(decoded.sample_rate, 44100);
        assert_eq!(decoded.channels, 1);
        assert_eq!(decoded.num_frames(), 4410);
    }

    #[test]
    fn test_content_wins_over_extension() {
        let audio = Pcm16Audio::new(vec![10, 20, 30, 40], 44100, 1).unwrap();
        let file = write_temp(&write_wav(&audio), "mp3");
        let decoded = decode_file(file.path(), ContainerFormat::Mp3, 44100).unwrap();
        assert_eq!(decoded.samples, vec![10, 20, 30, 40]);
    }

    #[test]
    fn test_garbage_is_decode_error() {
        let file = write_temp(b"this is definitely not audio data at all", "xyz");
        let result = decode_file(file.path(), ContainerFormat::Mp3, 44100);
        assert!(matches!(result, Err(ShiftError::Decode(_))), "{:?}", result);
    }

    #[test]
    fn test_empty_stream_is_decode_error() {
        let audio = Pcm16Audio::new(vec![], 44100, 1).unwrap();
        let file = write_temp(&write_wav(&audio), "wav");
        let result = decode_file(file.path(), ContainerFormat::Wav, 44100);
        assert!(matches!(result, Err(ShiftError::Decode(_))), "{:?}", result);
    }

    #[test]
    fn test_deinterleave() {
        let split = deinterleave(&[1.0, 2.0, 3.0, 4.0], 2);
        assert_eq!(split, vec![vec![1.0, 3.0], vec![2.0, 4.0]]);
    }
}
