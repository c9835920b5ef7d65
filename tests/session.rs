//! Session state machine tests.

mod common;

use approx::assert_abs_diff_eq;

use common::*;
use spectral_shift::{
    AudioPitchPipeline, Interval, OutputFormat, Semitones, Session, SessionState, ShiftError,
    UploadedClip, WavEncoder,
};

fn pipeline(dir: &std::path::Path) -> AudioPitchPipeline {
    AudioPitchPipeline::new(config_in(dir))
        .unwrap()
        .with_encoder(WavEncoder)
}

fn tone_clip() -> UploadedClip {
    wav_clip("tone.wav", to_i16(&gen_sine(440.0, 44100, 8820, 0.5)), 44100, 1)
}

#[test]
fn test_happy_path() {
    let dir = tempfile::tempdir().unwrap();
    let mut session = Session::new();
    assert_eq!(session.state(), SessionState::Idle);
    assert!(session.result().is_none());

    session.upload(tone_clip());
    assert_eq!(session.state(), SessionState::Uploaded);

    session.set_semitones(Semitones::new(-3).unwrap());
    let result = session.process(&pipeline(dir.path())).unwrap();
    assert_eq!(result.semitones.value(), -3);
    assert_eq!(result.format, OutputFormat::Wav);
    assert_eq!(result.channels, 1);
    assert_eq!(result.sample_rate, 44100);
    assert_eq!(result.frames, 8820);
    assert_abs_diff_eq!(result.duration_secs(), 0.2, epsilon = 1e-9);
    assert_eq!(result.download_filename(), "pitch_shifted_-3st.wav");
    assert_eq!(result.mime_type(), "audio/wav");
    assert_eq!(session.state(), SessionState::Processed);
}

#[test]
fn test_rerun_overwrites_result() {
    let dir = tempfile::tempdir().unwrap();
    let pipeline = pipeline(dir.path());
    let mut session = Session::new();
    session.upload(tone_clip());

    session.apply_preset(Interval::OctaveUp);
    session.process(&pipeline).unwrap();
    assert_eq!(session.result().unwrap().semitones.value(), 12);

    session.apply_preset(Interval::PerfectFourth);
    // Changing the control alone does not reprocess.
    assert_eq!(session.result().unwrap().semitones.value(), 12);
    assert_eq!(session.state(), SessionState::Processed);

    session.process(&pipeline).unwrap();
    assert_eq!(session.result().unwrap().semitones.value(), 5);
    assert_eq!(session.result().unwrap().download_filename(), "pitch_shifted_5st.wav");
}

#[test]
fn test_failure_returns_to_idle_and_keeps_previous_result() {
    let dir = tempfile::tempdir().unwrap();
    let pipeline = pipeline(dir.path());
    let mut session = Session::new();
    session.upload(tone_clip());
    session.set_semitones(Semitones::new(7).unwrap());
    session.process(&pipeline).unwrap();

    session.upload(UploadedClip::new("broken.ogg", b"not really ogg".to_vec()));
    assert_eq!(session.state(), SessionState::Uploaded);
    assert_eq!(session.result().unwrap().semitones.value(), 7);

    let err = session.process(&pipeline).unwrap_err();
    assert!(matches!(err, ShiftError::Decode(_)));
    assert!(err.user_message().starts_with("Could not read"));
    assert_eq!(session.state(), SessionState::Idle);
    assert_eq!(session.result().unwrap().semitones.value(), 7);
    assert_eq!(session.clip().unwrap().name, "broken.ogg");
    assert!(dir_is_empty(dir.path()));
}

#[test]
fn test_retry_after_failure() {
    let dir = tempfile::tempdir().unwrap();
    let failing_pipeline = pipeline(dir.path()).with_shifter(
        |_: &[f32], _: u32, _: f64| -> Result<Vec<f32>, ShiftError> {
            Err(ShiftError::Processing("shifter unavailable".to_string()))
        },
    );
    let mut session = Session::new();
    session.upload(tone_clip());

    assert!(session.process(&failing_pipeline).is_err());
    assert_eq!(session.state(), SessionState::Idle);
    assert!(session.result().is_none());

    session.process(&pipeline(dir.path())).unwrap();
    assert_eq!(session.state(), SessionState::Processed);
}

#[test]
fn test_presets() {
    let expected = [
        (Interval::OctaveUp, "+1 Octave", 12),
        (Interval::OctaveDown, "-1 Octave", -12),
        (Interval::PerfectFourth, "Perfect Fourth", 5),
        (Interval::MajorThird, "Major Third", 4),
        (Interval::Tritone, "Tritone", 6),
    ];
    let mut session = Session::new();
    for (interval, label, semitones) in expected {
        assert_eq!(interval.label(), label);
        session.apply_preset(interval);
        assert_eq!(session.semitones().value(), semitones);
    }
    assert_eq!(session.state(), SessionState::Idle);
}
