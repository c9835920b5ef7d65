//! Startup check for the external audio toolchain.

use std::path::Path;
use std::process::{Command, Stdio};

use crate::config::Config;
use crate::error::ShiftError;

/// Encoder that ffmpeg must provide for MP3 output.
const MP3_ENCODER: &str = "libmp3lame";

/// Result of a successful environment check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolchainInfo {
    /// First line of `ffmpeg -version`.
    pub ffmpeg_version: String,
    /// First line of `ffprobe -version`.
    pub ffprobe_version: String,
}

/// Verifies that ffmpeg and ffprobe can be run and that ffmpeg can encode MP3.
///
/// # Errors
///
/// Returns [`ShiftError::Environment`] if either binary cannot be invoked and
/// [`ShiftError::UnsupportedRuntime`] if ffmpeg lacks the MP3 encoder.
pub fn verify(config: &Config) -> Result<ToolchainInfo, ShiftError> {
    let ffmpeg_version = probe_version(&config.ffmpeg_path)?;
    let ffprobe_version = probe_version(&config.ffprobe_path)?;
    log::debug!("ffmpeg: {ffmpeg_version}");
    log::debug!("ffprobe: {ffprobe_version}");

    let encoders = run(&config.ffmpeg_path, &["-hide_banner", "-encoders"])?;
    if !encoders.contains(MP3_ENCODER) {
        return Err(ShiftError::UnsupportedRuntime(format!(
            "{} was built without the {} encoder",
            config.ffmpeg_path.display(),
            MP3_ENCODER
        )));
    }

    Ok(ToolchainInfo {
        ffmpeg_version,
        ffprobe_version,
    })
}

/// Runs `<binary> -version` and returns the first line of its output.
fn probe_version(binary: &Path) -> Result<String, ShiftError> {
    let stdout = run(binary, &["-version"])?;
    Ok(stdout.lines().next().unwrap_or_default().trim().to_string())
}

fn run(binary: &Path, args: &[&str]) -> Result<String, ShiftError> {
    let output = Command::new(binary)
        .args(args)
        .stdin(Stdio::null())
        .output()
        .map_err(|e| {
            ShiftError::Environment(format!("cannot run {}: {}", binary.display(), e))
        })?;

    if !output.status.success() {
        return Err(ShiftError::Environment(format!(
            "{} {} exited with {}",
            binary.display(),
            args.join(" "),
            output.status
        )));
    }

    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}
