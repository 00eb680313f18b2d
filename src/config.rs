//! Configuration for cardmill.
//!
//! Configuration sources (highest priority first):
//! 1. CLI flags (applied by the caller)
//! 2. Environment variables (CARDMILL_*)
//! 3. Config file (.cardmill/config.yaml, searched upward from the
//!    current directory, then ~/.cardmill/config.yaml)
//! 4. Defaults
//!
//! The loaded [`Config`] is an explicit value handed down to the pipeline;
//! there is no process-wide configuration state.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::ValueEnum;
use serde::Deserialize;

/// The concurrency width is kept low on purpose: the remote speech and
/// translation services throttle aggressively.
const DEFAULT_WORKERS: usize = 8;
const DEFAULT_TEMPO: f64 = 0.7;
/// ffmpeg VBR quality, lower is better.
const DEFAULT_AUDIO_QUALITY: u32 = 2;
const DEFAULT_THROTTLE_RETRY_SECS: u64 = 5;
const DEFAULT_VOICE: &str = "Zhiyu";
const DEFAULT_SOURCE_LANG: &str = "zh";
const DEFAULT_TARGET_LANG: &str = "en";
const DEFAULT_REFERENCE_BASE: &str =
    "https://www.mdbg.net/chinese/dictionary?page=worddict&wdrst=1&wdqb=";

/// Field separator for emitted rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum Separator {
    Semicolon,
    Tab,
}

impl Separator {
    pub fn as_str(&self) -> &'static str {
        match self {
            Separator::Semicolon => ";",
            Separator::Tab => "\t",
        }
    }

    /// Name used in the deck-import `#separator:` directive.
    pub fn directive_name(&self) -> &'static str {
        match self {
            Separator::Semicolon => "Semicolon",
            Separator::Tab => "Tab",
        }
    }
}

/// Raw config file schema (matches YAML structure)
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ConfigFile {
    pub workers: Option<usize>,
    pub tempo: Option<f64>,
    pub audio_quality: Option<u32>,
    pub throttle_retry_secs: Option<u64>,
    pub separator: Option<Separator>,
    pub deck_header: Option<bool>,
    pub output_dir: Option<String>,
    #[serde(default)]
    pub speech: Option<SpeechFileConfig>,
    #[serde(default)]
    pub translate: Option<TranslateFileConfig>,
    #[serde(default)]
    pub dictionary: Option<DictionaryFileConfig>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SpeechFileConfig {
    pub url: Option<String>,
    pub api_key: Option<String>,
    pub voice: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TranslateFileConfig {
    pub url: Option<String>,
    pub api_key: Option<String>,
    pub source_lang: Option<String>,
    pub target_lang: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DictionaryFileConfig {
    pub url: Option<String>,
    pub reference_base: Option<String>,
}

/// Resolved configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Maximum number of cards enriched concurrently.
    pub workers: usize,
    /// Playback rate for the reduced-speed audio variant.
    pub tempo: f64,
    /// ffmpeg VBR quality for the tempo-adjusted file.
    pub audio_quality: u32,
    /// Fixed wait between retries of a throttled provider call.
    pub throttle_retry_secs: u64,
    pub separator: Separator,
    /// Whether to emit the three-line deck-import header block.
    pub deck_header: bool,
    /// Where synthesized audio artifacts are written.
    pub output_dir: PathBuf,
    pub speech: SpeechSettings,
    pub translate: TranslateSettings,
    /// Dictionary lookup is optional; vocabulary cards fall back to the
    /// definition placeholder when absent.
    pub dictionary: Option<DictionarySettings>,
}

#[derive(Debug, Clone)]
pub struct SpeechSettings {
    pub url: Option<String>,
    pub api_key: Option<String>,
    pub voice: String,
}

#[derive(Debug, Clone)]
pub struct TranslateSettings {
    pub url: Option<String>,
    pub api_key: Option<String>,
    pub source_lang: String,
    pub target_lang: String,
}

#[derive(Debug, Clone)]
pub struct DictionarySettings {
    pub url: String,
    pub reference_base: String,
}

impl Config {
    /// Load configuration from file, environment and defaults.
    pub fn load() -> Result<Self> {
        let raw = match find_config_file() {
            Some(path) => load_config_file(&path)?,
            None => ConfigFile::default(),
        };

        let mut config = resolve(raw);
        apply_env(&mut config)?;
        Ok(config)
    }
}

/// Find config file by searching current directory and parents, then the
/// home directory.
fn find_config_file() -> Option<PathBuf> {
    if let Ok(mut current) = std::env::current_dir() {
        loop {
            let candidate = current.join(".cardmill").join("config.yaml");
            if candidate.exists() {
                return Some(candidate);
            }

            if !current.pop() {
                break;
            }
        }
    }

    let home_candidate = dirs::home_dir()?.join(".cardmill").join("config.yaml");
    home_candidate.exists().then_some(home_candidate)
}

/// Load and parse a config file
fn load_config_file(path: &Path) -> Result<ConfigFile> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    serde_yaml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {}", path.display()))
}

/// Fill defaults for everything the file leaves unset.
fn resolve(raw: ConfigFile) -> Config {
    let speech = raw.speech.unwrap_or_default();
    let translate = raw.translate.unwrap_or_default();
    let dictionary = raw.dictionary.and_then(|d| {
        d.url.map(|url| DictionarySettings {
            url,
            reference_base: d
                .reference_base
                .unwrap_or_else(|| DEFAULT_REFERENCE_BASE.to_string()),
        })
    });

    Config {
        workers: raw.workers.unwrap_or(DEFAULT_WORKERS).max(1),
        tempo: raw.tempo.unwrap_or(DEFAULT_TEMPO),
        audio_quality: raw.audio_quality.unwrap_or(DEFAULT_AUDIO_QUALITY),
        throttle_retry_secs: raw
            .throttle_retry_secs
            .unwrap_or(DEFAULT_THROTTLE_RETRY_SECS),
        separator: raw.separator.unwrap_or(Separator::Semicolon),
        deck_header: raw.deck_header.unwrap_or(true),
        output_dir: raw.output_dir.map(PathBuf::from).unwrap_or_else(|| PathBuf::from(".")),
        speech: SpeechSettings {
            url: speech.url,
            api_key: speech.api_key,
            voice: speech.voice.unwrap_or_else(|| DEFAULT_VOICE.to_string()),
        },
        translate: TranslateSettings {
            url: translate.url,
            api_key: translate.api_key,
            source_lang: translate
                .source_lang
                .unwrap_or_else(|| DEFAULT_SOURCE_LANG.to_string()),
            target_lang: translate
                .target_lang
                .unwrap_or_else(|| DEFAULT_TARGET_LANG.to_string()),
        },
        dictionary,
    }
}

/// Apply CARDMILL_* environment overrides.
fn apply_env(config: &mut Config) -> Result<()> {
    if let Ok(value) = std::env::var("CARDMILL_WORKERS") {
        config.workers = value
            .parse::<usize>()
            .context("CARDMILL_WORKERS must be a positive integer")?
            .max(1);
    }

    if let Ok(value) = std::env::var("CARDMILL_SPEECH_URL") {
        config.speech.url = Some(value);
    }
    if let Ok(value) = std::env::var("CARDMILL_SPEECH_API_KEY") {
        config.speech.api_key = Some(value);
    }
    if let Ok(value) = std::env::var("CARDMILL_TRANSLATE_URL") {
        config.translate.url = Some(value);
    }
    if let Ok(value) = std::env::var("CARDMILL_TRANSLATE_API_KEY") {
        config.translate.api_key = Some(value);
    }
    if let Ok(value) = std::env::var("CARDMILL_DICTIONARY_URL") {
        match &mut config.dictionary {
            Some(dictionary) => dictionary.url = value,
            None => {
                config.dictionary = Some(DictionarySettings {
                    url: value,
                    reference_base: DEFAULT_REFERENCE_BASE.to_string(),
                });
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let config = resolve(ConfigFile::default());

        assert_eq!(config.workers, 8);
        assert_eq!(config.tempo, 0.7);
        assert_eq!(config.throttle_retry_secs, 5);
        assert_eq!(config.separator, Separator::Semicolon);
        assert!(config.deck_header);
        assert_eq!(config.output_dir, PathBuf::from("."));
        assert_eq!(config.speech.voice, "Zhiyu");
        assert_eq!(config.translate.source_lang, "zh");
        assert_eq!(config.translate.target_lang, "en");
        assert!(config.dictionary.is_none());
    }

    #[test]
    fn test_config_file_parsing() {
        let temp = TempDir::new().unwrap();
        let config_path = temp.path().join("config.yaml");
        let mut file = std::fs::File::create(&config_path).unwrap();
        writeln!(
            file,
            r#"
workers: 3
tempo: 0.8
separator: tab
deck_header: false
speech:
  url: https://tts.internal/v1/synthesize
  api_key: secret
translate:
  url: https://mt.internal/v1/translate
dictionary:
  url: https://dict.internal/v1/entries
"#
        )
        .unwrap();

        let raw = load_config_file(&config_path).unwrap();
        let config = resolve(raw);

        assert_eq!(config.workers, 3);
        assert_eq!(config.tempo, 0.8);
        assert_eq!(config.separator, Separator::Tab);
        assert!(!config.deck_header);
        assert_eq!(
            config.speech.url.as_deref(),
            Some("https://tts.internal/v1/synthesize")
        );
        assert_eq!(config.speech.api_key.as_deref(), Some("secret"));
        // Unset fields keep their defaults
        assert_eq!(config.speech.voice, "Zhiyu");
        let dictionary = config.dictionary.unwrap();
        assert_eq!(dictionary.url, "https://dict.internal/v1/entries");
        assert_eq!(dictionary.reference_base, DEFAULT_REFERENCE_BASE);
    }

    #[test]
    fn test_zero_workers_clamped() {
        let config = resolve(ConfigFile {
            workers: Some(0),
            ..Default::default()
        });
        assert_eq!(config.workers, 1);
    }

    #[test]
    fn test_separator_rendering() {
        assert_eq!(Separator::Semicolon.as_str(), ";");
        assert_eq!(Separator::Tab.as_str(), "\t");
        assert_eq!(Separator::Semicolon.directive_name(), "Semicolon");
        assert_eq!(Separator::Tab.directive_name(), "Tab");
    }
}
