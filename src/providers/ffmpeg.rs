//! Audio tempo transformation via the ffmpeg binary.
//!
//! Produces a slowed-down copy of a synthesized MP3 next to the original,
//! named `<stem>_atempo=<rate>.mp3`.

use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context};
use async_trait::async_trait;
use tokio::process::Command;

use super::{ProviderError, TempoShifter};

/// Tempo shifter shelling out to ffmpeg
pub struct FfmpegTempoShifter {
    binary: String,
    tempo: f64,
    /// VBR quality passed to `-q:a`, lower is better.
    quality: u32,
}

impl FfmpegTempoShifter {
    pub fn new(tempo: f64, quality: u32) -> Self {
        Self {
            binary: "ffmpeg".to_string(),
            tempo,
            quality,
        }
    }

    /// Use a custom ffmpeg binary path
    pub fn with_binary(mut self, binary: impl Into<String>) -> Self {
        self.binary = binary.into();
        self
    }
}

fn atempo_filter(tempo: f64) -> String {
    format!("atempo={tempo:.2}")
}

/// Output path for the tempo-adjusted copy of `input`.
fn derived_output_path(input: &Path, tempo: f64) -> Result<PathBuf, ProviderError> {
    if input.extension().and_then(|e| e.to_str()) != Some("mp3") {
        return Err(ProviderError::Fatal(anyhow!(
            "only MP3 files can be tempo-shifted, got {}",
            input.display()
        )));
    }

    let stem = input
        .file_stem()
        .and_then(|s| s.to_str())
        .ok_or_else(|| anyhow!("audio file has no usable stem: {}", input.display()))?;

    Ok(input.with_file_name(format!("{stem}_{}.mp3", atempo_filter(tempo))))
}

#[async_trait]
impl TempoShifter for FfmpegTempoShifter {
    async fn change_tempo(&self, input: &Path) -> Result<PathBuf, ProviderError> {
        let output_path = derived_output_path(input, self.tempo)?;

        let output = Command::new(&self.binary)
            .arg("-i")
            .arg(format!("file:{}", input.display()))
            .arg("-filter:a")
            .arg(atempo_filter(self.tempo))
            .arg("-q:a")
            .arg(self.quality.to_string())
            .arg(format!("file:{}", output_path.display()))
            .output()
            .await
            .context("failed to run ffmpeg")?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(ProviderError::Fatal(anyhow!(
                "ffmpeg failed processing {} into {}: {}",
                input.display(),
                output_path.display(),
                stderr.trim()
            )));
        }

        Ok(output_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_name_embeds_rate() {
        let output = derived_output_path(Path::new("1700000000-0001.mp3"), 0.7).unwrap();
        assert_eq!(output, PathBuf::from("1700000000-0001_atempo=0.70.mp3"));
    }

    #[test]
    fn test_output_name_keeps_directory() {
        let output = derived_output_path(Path::new("out/audio/card.mp3"), 0.85).unwrap();
        assert_eq!(output, PathBuf::from("out/audio/card_atempo=0.85.mp3"));
    }

    #[test]
    fn test_non_mp3_rejected() {
        let err = derived_output_path(Path::new("card.wav"), 0.7).unwrap_err();
        assert!(err.to_string().contains("MP3"));
    }
}
