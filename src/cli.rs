use std::path::PathBuf;

use spectral_shift::waveform::WaveformPeaks;
use spectral_shift::{
    environment, AudioPitchPipeline, Config, Interval, OutputFormat, PhaseVocoderShifter,
    Semitones, Session, UploadedClip, WindowType,
};

/// Width of the envelope printed with `--verbose`.
const ENVELOPE_WIDTH: usize = 64;

fn main() {
    let args: Vec<String> = std::env::args().collect();

    if args.iter().any(|a| a == "--list-presets") {
        for interval in Interval::ALL {
            println!(
                "{:<12} {:<15} {:+}",
                interval.name(),
                interval.label(),
                interval.semitones().value()
            );
        }
        return;
    }

    if args.len() < 2 || args[1] == "--help" || args[1] == "-h" {
        print_usage();
        std::process::exit(1);
    }

    let input_path = &args[1];

    let mut semitones: Option<Semitones> = None;
    let mut preset: Option<Interval> = None;
    let mut output_path: Option<PathBuf> = None;
    let mut format = OutputFormat::Mp3;
    let mut preview_path: Option<PathBuf> = None;
    let mut config_path: Option<PathBuf> = None;
    let mut window_type: Option<WindowType> = None;
    let mut verbose = false;

    let mut i = 2;
    while i < args.len() {
        match args[i].as_str() {
            "--semitones" | "-s" => {
                i += 1;
                semitones = Some(parse_semitones(&args, i));
            }
            "--preset" => {
                i += 1;
                preset = Some(parse_preset(&args, i));
            }
            "--output" | "-o" => {
                i += 1;
                output_path = Some(PathBuf::from(require_value(&args, i, "output")));
            }
            "--format" => {
                i += 1;
                format = parse_format(&args, i);
            }
            "--preview" => {
                i += 1;
                preview_path = Some(PathBuf::from(require_value(&args, i, "preview")));
            }
            "--config" => {
                i += 1;
                config_path = Some(PathBuf::from(require_value(&args, i, "config")));
            }
            "--window" | "-w" => {
                i += 1;
                window_type = Some(parse_window(&args, i));
            }
            "--verbose" | "-v" => verbose = true,
            other => {
                eprintln!("ERROR: Unknown argument '{}'", other);
                print_usage();
                std::process::exit(1);
            }
        }
        i += 1;
    }

    let default_level = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .init();

    let config = match config_path {
        Some(path) => match Config::from_json_file(&path) {
            Ok(c) => c,
            Err(e) => {
                eprintln!("ERROR: Failed to load config {}: {}", path.display(), e);
                std::process::exit(1);
            }
        },
        None => Config::from_env(),
    };

    match environment::verify(&config) {
        Ok(info) => log::debug!("toolchain: {} / {}", info.ffmpeg_version, info.ffprobe_version),
        Err(e) if format == OutputFormat::Wav => {
            log::warn!("{}; continuing because WAV output needs no ffmpeg", e);
        }
        Err(e) => {
            log::error!("environment check failed");
            eprintln!("ERROR: {}", e.user_message());
            std::process::exit(1);
        }
    }

    let clip = match UploadedClip::from_file(input_path) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("ERROR: Failed to read {}: {}", input_path, e);
            std::process::exit(1);
        }
    };

    let mut shifter = match PhaseVocoderShifter::new().with_fft_size(config.fft_size) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("ERROR: {}", e.user_message());
            std::process::exit(1);
        }
    };
    if let Some(w) = window_type {
        shifter = shifter.with_window(w);
    }
    log::debug!(
        "phase vocoder: fft size {}, {:?} window",
        shifter.fft_size(),
        window_type.unwrap_or_default()
    );

    let encoder = spectral_shift::io::encoder_for(format, &config);
    let pipeline = match AudioPitchPipeline::new(config) {
        Ok(p) => p.with_shifter(shifter).with_boxed_encoder(encoder),
        Err(e) => {
            eprintln!("ERROR: {}", e.user_message());
            std::process::exit(1);
        }
    };

    let mut session = Session::new();
    session.upload(clip);
    if let Some(p) = preset {
        eprintln!("Preset: {} ({:+} st)", p.label(), p.semitones().value());
        session.apply_preset(p);
    }
    if let Some(s) = semitones {
        session.set_semitones(s);
    }

    let result = match session.process(&pipeline) {
        Ok(r) => r,
        Err(e) => {
            log::error!("processing failed");
            eprintln!("ERROR: {}", e.user_message());
            std::process::exit(1);
        }
    };

    eprintln!(
        "Output: {} frames, {} ch, {} Hz, {:.2}s shifted by {}",
        result.frames,
        result.channels,
        result.sample_rate,
        result.duration_secs(),
        result.semitones
    );
    if verbose {
        let secs = result.processing_time.as_secs_f64();
        let realtime_factor = if secs > 0.0 {
            result.duration_secs() / secs
        } else {
            f64::INFINITY
        };
        eprintln!(
            "Processing time: {:.3}s ({:.1}x realtime)",
            secs, realtime_factor
        );
        eprintln!("Input envelope:");
        for line in render_envelope(&result.preview.peaks(ENVELOPE_WIDTH)) {
            eprintln!("  |{}|", line);
        }
    }

    let output_path = output_path.unwrap_or_else(|| PathBuf::from(result.download_filename()));
    if let Err(e) = std::fs::write(&output_path, &result.audio) {
        eprintln!("ERROR: Failed to write {}: {}", output_path.display(), e);
        std::process::exit(1);
    }
    eprintln!("Written to {} ({})", output_path.display(), result.mime_type());

    if let Some(path) = preview_path {
        if let Err(e) = result.preview.write_json(&path) {
            eprintln!("ERROR: Failed to write preview {}: {}", path.display(), e);
            std::process::exit(1);
        }
        eprintln!("Preview written to {} ({} points)", path.display(), result.preview.len());
    }
}

fn print_usage() {
    eprintln!("Usage: spectral-shift <input> [options]");
    eprintln!();
    eprintln!("Accepted input: mp3, wav, ogg, m4a (anything else is treated as mp3)");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --semitones, -s <n>  Pitch shift in semitones, -24..24 (default: 0)");
    eprintln!("  --preset <name>      octave-up, octave-down, fourth, third, tritone");
    eprintln!("  --output, -o <path>  Output file (default: pitch_shifted_<n>st.<ext>)");
    eprintln!("  --format <fmt>       mp3 (default) or wav");
    eprintln!("  --preview <path>     Write the waveform preview as JSON");
    eprintln!("  --config <path>      JSON config file");
    eprintln!("  --window <type>      hann (default) or blackman-harris");
    eprintln!("  --list-presets       Show the named intervals and exit");
    eprintln!("  --verbose, -v        Debug logging and timing");
    eprintln!();
    eprintln!("Examples:");
    eprintln!("  spectral-shift voice.wav --semitones 5");
    eprintln!("  spectral-shift loop.mp3 --preset octave-down -o low.mp3");
    eprintln!("  spectral-shift take.ogg -s -3 --format wav --preview wave.json");
}

/// Two text rows (positive and negative half) sketching a peak envelope.
fn render_envelope(peaks: &WaveformPeaks) -> [String; 2] {
    const LEVELS: [char; 5] = [' ', '.', ':', '|', '#'];
    let level = |v: f32| {
        let idx = (v.abs().min(1.0) * (LEVELS.len() - 1) as f32).round() as usize;
        LEVELS[idx]
    };
    [
        peaks.pos.iter().map(|&v| level(v)).collect(),
        peaks.neg.iter().map(|&v| level(v)).collect(),
    ]
}

fn require_value<'a>(args: &'a [String], idx: usize, name: &str) -> &'a str {
    if idx >= args.len() {
        eprintln!("ERROR: --{} requires a value", name);
        std::process::exit(1);
    }
    &args[idx]
}

fn parse_semitones(args: &[String], idx: usize) -> Semitones {
    let value = require_value(args, idx, "semitones");
    match parse_semitones_str(value) {
        Ok(s) => s,
        Err(msg) => {
            eprintln!("ERROR: {}", msg);
            std::process::exit(1);
        }
    }
}

fn parse_semitones_str(s: &str) -> Result<Semitones, String> {
    let value: i32 = s
        .trim_start_matches('+')
        .parse()
        .map_err(|_| format!("Invalid semitones: {}", s))?;
    Semitones::new(value).map_err(|e| e.to_string())
}

fn parse_preset(args: &[String], idx: usize) -> Interval {
    let value = require_value(args, idx, "preset");
    match Interval::from_name(value) {
        Some(p) => p,
        None => {
            eprintln!(
                "ERROR: Unknown preset '{}' (use octave-up, octave-down, fourth, third, tritone)",
                value
            );
            std::process::exit(1);
        }
    }
}

fn parse_format(args: &[String], idx: usize) -> OutputFormat {
    let value = require_value(args, idx, "format");
    match parse_format_str(value) {
        Some(f) => f,
        None => {
            eprintln!("ERROR: Unknown format '{}' (use mp3 or wav)", value);
            std::process::exit(1);
        }
    }
}

fn parse_format_str(s: &str) -> Option<OutputFormat> {
    match s.to_ascii_lowercase().as_str() {
        "mp3" => Some(OutputFormat::Mp3),
        "wav" => Some(OutputFormat::Wav),
        _ => None,
    }
}

fn parse_window(args: &[String], idx: usize) -> WindowType {
    let value = require_value(args, idx, "window");
    match parse_window_str(value) {
        Some(w) => w,
        None => {
            eprintln!(
                "ERROR: Unknown window type '{}' (use hann or blackman-harris)",
                value
            );
            std::process::exit(1);
        }
    }
}

fn parse_window_str(s: &str) -> Option<WindowType> {
    match s {
        "hann" => Some(WindowType::Hann),
        "blackman-harris" | "bh" => Some(WindowType::BlackmanHarris),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_semitones() {
        assert_eq!(parse_semitones_str("7").unwrap().value(), 7);
        assert_eq!(parse_semitones_str("+12").unwrap().value(), 12);
        assert_eq!(parse_semitones_str("-24").unwrap().value(), -24);
    }

    #[test]
    fn test_parse_semitones_rejects_bad_values() {
        assert!(parse_semitones_str("25").is_err());
        assert!(parse_semitones_str("1.5").is_err());
        assert!(parse_semitones_str("up").is_err());
    }

    #[test]
    fn test_parse_format() {
        assert_eq!(parse_format_str("mp3"), Some(OutputFormat::Mp3));
        assert_eq!(parse_format_str("WAV"), Some(OutputFormat::Wav));
        assert_eq!(parse_format_str("flac"), None);
    }

    #[test]
    fn test_parse_window() {
        assert_eq!(parse_window_str("hann"), Some(WindowType::Hann));
        assert_eq!(parse_window_str("bh"), Some(WindowType::BlackmanHarris));
        assert_eq!(parse_window_str("kaiser"), None);
    }

    #[test]
    fn test_render_envelope() {
        let peaks = WaveformPeaks {
            pos: vec![0.0, 0.3, 1.0],
            neg: vec![0.0, -0.5, -2.0],
        };
        let [top, bottom] = render_envelope(&peaks);
        assert_eq!(top, " .#");
        assert_eq!(bottom, " :#");
    }

    #[test]
    fn test_preset_names() {
        assert_eq!(Interval::from_name("octave-down"), Some(Interval::OctaveDown));
        assert_eq!(Interval::from_name("fifth"), None);
    }
}
