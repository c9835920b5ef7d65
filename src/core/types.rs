use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ShiftError;

/// A single normalized audio sample (nominal range -1.0 to 1.0).
pub type Sample = f32;

/// Full-scale factor between 16-bit integer and normalized float samples.
pub const I16_FULL_SCALE: f32 = 32768.0;

/// Container formats accepted for upload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContainerFormat {
    Mp3,
    Wav,
    Ogg,
    M4a,
}

impl ContainerFormat {
    /// The upload allow-list.
    pub const ALL: &'static [ContainerFormat] = &[
        ContainerFormat::Mp3,
        ContainerFormat::Wav,
        ContainerFormat::Ogg,
        ContainerFormat::M4a,
    ];

    /// File extension without the leading dot.
    pub fn extension(&self) -> &'static str {
        match self {
            ContainerFormat::Mp3 => "mp3",
            ContainerFormat::Wav => "wav",
            ContainerFormat::Ogg => "ogg",
            ContainerFormat::M4a => "m4a",
        }
    }

    pub fn mime_type(&self) -> &'static str {
        match self {
            ContainerFormat::Mp3 => "audio/mpeg",
            ContainerFormat::Wav => "audio/wav",
            ContainerFormat::Ogg => "audio/ogg",
            ContainerFormat::M4a => "audio/mp4",
        }
    }

    /// Looks up an allow-listed extension (case-insensitive).
    pub fn from_extension(ext: &str) -> Option<Self> {
        let ext = ext.to_ascii_lowercase();
        Self::ALL.iter().copied().find(|f| f.extension() == ext)
    }

    /// Picks the format from a declared filename.
    ///
    /// Uses the text after the last `.`; anything outside the allow-list,
    /// including a missing extension, falls back to MP3.
    pub fn from_filename(name: &str) -> Self {
        let ext = name.rsplit('.').next().unwrap_or_default();
        Self::from_extension(ext).unwrap_or(ContainerFormat::Mp3)
    }

    /// Guesses the container from magic bytes. Diagnostic only: staging
    /// always trusts the declared extension.
    pub fn sniff(bytes: &[u8]) -> Option<Self> {
        if bytes.len() >= 12 && &bytes[0..4] == b"RIFF" && &bytes[8..12] == b"WAVE" {
            return Some(ContainerFormat::Wav);
        }
        if bytes.starts_with(b"OggS") {
            return Some(ContainerFormat::Ogg);
        }
        if bytes.len() >= 8 && &bytes[4..8] == b"ftyp" {
            return Some(ContainerFormat::M4a);
        }
        if bytes.starts_with(b"ID3") || (bytes.len() >= 2 && bytes[0] == 0xFF && bytes[1] & 0xE0 == 0xE0)
        {
            return Some(ContainerFormat::Mp3);
        }
        None
    }
}

impl fmt::Display for ContainerFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

/// Formats the pipeline can produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Mp3,
    Wav,
}

impl OutputFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Mp3 => "mp3",
            OutputFormat::Wav => "wav",
        }
    }

    pub fn mime_type(&self) -> &'static str {
        match self {
            OutputFormat::Mp3 => "audio/mp3",
            OutputFormat::Wav => "audio/wav",
        }
    }
}

/// An uploaded file: raw bytes plus the name the client declared.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedClip {
    pub name: String,
    pub bytes: Vec<u8>,
}

impl UploadedClip {
    pub fn new(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            bytes,
        }
    }

    /// Reads a clip from disk, using the file name as the declared name.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ShiftError> {
        let path = path.as_ref();
        let bytes = std::fs::read(path)
            .map_err(|e| ShiftError::Io(format!("{}: {}", path.display(), e)))?;
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or_default()
            .to_string();
        Ok(Self { name, bytes })
    }

    /// Format selected for staging.
    pub fn declared_format(&self) -> ContainerFormat {
        ContainerFormat::from_filename(&self.name)
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// Interleaved signed 16-bit PCM.
///
/// Used both for freshly decoded audio and for the shifted result that gets
/// encoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pcm16Audio {
    /// Interleaved samples: `[s0, s1, ...]` for mono, `[L0, R0, L1, R1, ...]` for stereo.
    pub samples: Vec<i16>,
    /// Frame rate in Hz.
    pub sample_rate: u32,
    /// 1 or 2.
    pub channels: u16,
}

/// Audio straight out of the decoder, normalized to 16-bit at the target rate.
pub type DecodedAudio = Pcm16Audio;
/// Re-interleaved shifted audio, ready for encoding.
pub type ProcessedAudio = Pcm16Audio;

impl Pcm16Audio {
    /// Bytes per sample. Fixed.
    pub const SAMPLE_WIDTH: u16 = 2;

    /// # Errors
    ///
    /// Returns [`ShiftError::Processing`] for a zero sample rate, a channel
    /// count other than 1 or 2, or a sample count that is not a whole number
    /// of frames.
    pub fn new(samples: Vec<i16>, sample_rate: u32, channels: u16) -> Result<Self, ShiftError> {
        if sample_rate == 0 {
            return Err(ShiftError::Processing("sample rate must be positive".to_string()));
        }
        if !(1..=2).contains(&channels) {
            return Err(ShiftError::Processing(format!(
                "unsupported channel count: {}",
                channels
            )));
        }
        if samples.len() % channels as usize != 0 {
            return Err(ShiftError::Processing(format!(
                "{} samples do not divide into {} channels",
                samples.len(),
                channels
            )));
        }
        Ok(Self {
            samples,
            sample_rate,
            channels,
        })
    }

    /// Samples per channel.
    pub fn num_frames(&self) -> usize {
        if self.channels == 0 {
            return 0;
        }
        self.samples.len() / self.channels as usize
    }

    pub fn duration_secs(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.num_frames() as f64 / self.sample_rate as f64
    }
}

/// Semitone offset, validated to the supported range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "i32", into = "i32")]
pub struct Semitones(i32);

impl Semitones {
    pub const MIN: i32 = -24;
    pub const MAX: i32 = 24;
    pub const ZERO: Semitones = Semitones(0);

    /// # Errors
    ///
    /// Returns [`ShiftError::InvalidSemitones`] outside `-24..=24`.
    pub fn new(value: i32) -> Result<Self, ShiftError> {
        if !(Self::MIN..=Self::MAX).contains(&value) {
            return Err(ShiftError::InvalidSemitones(value));
        }
        Ok(Self(value))
    }

    pub fn value(&self) -> i32 {
        self.0
    }

    /// Frequency multiplier: `2^(n/12)`.
    pub fn factor(&self) -> f64 {
        semitones_to_factor(self.0 as f64)
    }
}

impl TryFrom<i32> for Semitones {
    type Error = ShiftError;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        Semitones::new(value)
    }
}

impl From<Semitones> for i32 {
    fn from(value: Semitones) -> Self {
        value.0
    }
}

impl fmt::Display for Semitones {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} st", self.0)
    }
}

/// Converts a (possibly fractional) semitone count to a frequency multiplier.
#[inline]
pub fn semitones_to_factor(semitones: f64) -> f64 {
    2.0_f64.powf(semitones / 12.0)
}

/// Named shortcut intervals.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Interval {
    OctaveUp,
    OctaveDown,
    PerfectFourth,
    MajorThird,
    Tritone,
}

impl Interval {
    pub const ALL: &'static [Interval] = &[
        Interval::OctaveUp,
        Interval::OctaveDown,
        Interval::PerfectFourth,
        Interval::MajorThird,
        Interval::Tritone,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Interval::OctaveUp => "+1 Octave",
            Interval::OctaveDown => "-1 Octave",
            Interval::PerfectFourth => "Perfect Fourth",
            Interval::MajorThird => "Major Third",
            Interval::Tritone => "Tritone",
        }
    }

    /// Short name accepted on the command line.
    pub fn name(&self) -> &'static str {
        match self {
            Interval::OctaveUp => "octave-up",
            Interval::OctaveDown => "octave-down",
            Interval::PerfectFourth => "fourth",
            Interval::MajorThird => "third",
            Interval::Tritone => "tritone",
        }
    }

    pub fn semitones(&self) -> Semitones {
        match self {
            Interval::OctaveUp => Semitones(12),
            Interval::OctaveDown => Semitones(-12),
            Interval::PerfectFourth => Semitones(5),
            Interval::MajorThird => Semitones(4),
            Interval::Tritone => Semitones(6),
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|i| i.name() == name)
    }
}
