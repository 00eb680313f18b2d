//! The flashcard record and its classification.
//!
//! A record starts with only `id`/`text`/`kind` set and is completed by the
//! enrichment pipeline before it is rendered exactly once.

use std::path::{Path, PathBuf};

use tracing::info;

use crate::config::Separator;

/// Filled in by the user after import when translation came back empty.
pub const TRANSLATION_PLACEHOLDER: &str = "(add translation here)";

/// Filled in by the user after import when no definition was found.
pub const DEFINITION_PLACEHOLDER: &str = "(add definition here)";

/// Punctuation that marks a line as a full sentence rather than a
/// vocabulary item. CJK marks first, then their Western counterparts.
const SENTENCE_PUNCTUATION: &[char] = &[
    '？', '！', '，', '、', '。', '（', '）', '：', '?', '!', ',', '.', '(', ')', ':',
];

/// Classification of a line, selecting which meaning branch runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Kind {
    /// Translated as running text.
    Sentence,
    /// Looked up in a dictionary instead of translated.
    Vocabulary,
}

impl Kind {
    /// Classify a line: a sentence if it carries punctuation or is longer
    /// than four characters, a vocabulary item otherwise.
    pub fn classify(text: &str) -> Self {
        let punctuated = text.chars().any(|c| SENTENCE_PUNCTUATION.contains(&c));
        if punctuated || text.chars().count() > 4 {
            Kind::Sentence
        } else {
            Kind::Vocabulary
        }
    }
}

impl std::fmt::Display for Kind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Kind::Sentence => write!(f, "sentence"),
            Kind::Vocabulary => write!(f, "vocabulary"),
        }
    }
}

/// One flashcard being assembled from a single input line.
#[derive(Debug, Clone)]
pub struct Flashcard {
    /// Unique per run: `<run timestamp>-<zero-padded index>`
    pub id: String,

    /// The original input line, untouched.
    pub text: String,

    /// Sentence vs vocabulary, fixed at creation.
    pub kind: Kind,

    /// Tone-marked transliteration of `text`.
    pub transliteration: String,

    /// English rendering (sentence cards only).
    pub translation: String,

    /// Dictionary entry HTML (vocabulary cards only).
    pub definition: String,

    /// Reference URL for the dictionary entry (vocabulary cards only).
    pub dictionary_url: String,

    /// Synthesized speech artifact on disk.
    pub audio_file: PathBuf,

    /// Tempo-adjusted derivative of `audio_file`.
    pub reduced_speed_audio_file: PathBuf,
}

impl Flashcard {
    /// Create a card with only identity fields set. `index` must come from
    /// a counter that never hands out the same value twice in one run.
    pub fn new(timestamp: &str, index: u64, text: String) -> Self {
        let kind = Kind::classify(&text);
        Self {
            id: format!("{timestamp}-{index:04}"),
            text,
            kind,
            transliteration: String::new(),
            translation: String::new(),
            definition: String::new(),
            dictionary_url: String::new(),
            audio_file: PathBuf::new(),
            reduced_speed_audio_file: PathBuf::new(),
        }
    }

    /// The trailing row field: translation for sentences, definition for
    /// vocabulary.
    pub fn meaning(&self) -> &str {
        match self.kind {
            Kind::Sentence => &self.translation,
            Kind::Vocabulary => &self.definition,
        }
    }

    /// Render the card as one delimited import row.
    pub fn to_row(&self, separator: Separator) -> String {
        [
            self.text.as_str(),
            self.transliteration.as_str(),
            &sound_field(&self.audio_file),
            &sound_field(&self.reduced_speed_audio_file),
            self.meaning(),
        ]
        .join(separator.as_str())
    }

    /// Emit the per-record diagnostic with every field.
    pub fn log(&self) {
        info!(
            id = %self.id,
            text = %self.text,
            kind = %self.kind,
            transliteration = %self.transliteration,
            translation = %self.translation,
            definition = %self.definition,
            dictionary_url = %self.dictionary_url,
            audio_file = %self.audio_file.display(),
            reduced_speed_audio_file = %self.reduced_speed_audio_file.display(),
            "flashcard completed"
        );
    }
}

fn sound_field(path: &Path) -> String {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    format!("[sound:{name}]")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_hanzi_is_vocabulary() {
        assert_eq!(Kind::classify("你好"), Kind::Vocabulary);
    }

    #[test]
    fn test_punctuation_makes_sentence() {
        assert_eq!(Kind::classify("我喜欢吃苹果。"), Kind::Sentence);
        assert_eq!(Kind::classify("好吗?"), Kind::Sentence);
    }

    #[test]
    fn test_length_alone_makes_sentence() {
        // Five characters, no punctuation
        assert_eq!(Kind::classify("一二三四五"), Kind::Sentence);
        assert_eq!(Kind::classify("一二三四"), Kind::Vocabulary);
    }

    #[test]
    fn test_id_format() {
        let card = Flashcard::new("1700000000", 7, "你好".to_string());
        assert_eq!(card.id, "1700000000-0007");
        assert_eq!(card.text, "你好");
        assert_eq!(card.kind, Kind::Vocabulary);
    }

    #[test]
    fn test_row_rendering() {
        let mut card = Flashcard::new("1700000000", 0, "我喜欢吃苹果。".to_string());
        card.transliteration = "wǒ xǐ huān chī píng guǒ .".to_string();
        card.translation = "I like eating apples.".to_string();
        card.audio_file = PathBuf::from("out/1700000000-0000.mp3");
        card.reduced_speed_audio_file = PathBuf::from("out/1700000000-0000_atempo=0.70.mp3");

        assert_eq!(
            card.to_row(Separator::Semicolon),
            "我喜欢吃苹果。;wǒ xǐ huān chī píng guǒ .;\
             [sound:1700000000-0000.mp3];[sound:1700000000-0000_atempo=0.70.mp3];\
             I like eating apples."
        );
    }

    #[test]
    fn test_vocabulary_row_uses_definition() {
        let mut card = Flashcard::new("1700000000", 1, "你好".to_string());
        card.definition = "<b>hello</b>".to_string();
        card.translation = "should not appear".to_string();

        let row = card.to_row(Separator::Tab);
        assert!(row.ends_with("<b>hello</b>"));
        assert_eq!(row.matches('\t').count(), 4);
    }
}
