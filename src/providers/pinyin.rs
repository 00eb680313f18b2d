//! Local pinyin transliteration.
//!
//! Multi-character text gets one tone-marked syllable per hanzi with CJK
//! punctuation mapped to Western equivalents. A single character is
//! treated as a dictionary headword and lists every heteronym reading.

use pinyin::{ToPinyin, ToPinyinMulti};

use super::Transliterator;

const CJK_TO_WESTERN_PUNCTUATION: &[(char, char)] = &[
    ('？', '?'),
    ('！', '!'),
    ('，', ','),
    ('、', ','),
    ('。', '.'),
    ('（', '('),
    ('）', ')'),
    ('：', ':'),
];

pub struct PinyinTransliterator;

impl Transliterator for PinyinTransliterator {
    fn transliterate(&self, text: &str) -> String {
        if text.chars().count() > 1 {
            transliterate_text(text)
        } else {
            transliterate_headword(text)
        }
    }
}

fn westernize(c: char) -> char {
    CJK_TO_WESTERN_PUNCTUATION
        .iter()
        .find(|(cjk, _)| *cjk == c)
        .map(|(_, western)| *western)
        .unwrap_or(c)
}

fn transliterate_text(text: &str) -> String {
    let mut output = String::new();

    for c in text.chars() {
        match c.to_pinyin() {
            Some(syllable) => {
                output.push_str(syllable.with_tone());
                output.push(' ');
            }
            None => output.push(westernize(c)),
        }
    }

    output.trim_end().to_string()
}

fn transliterate_headword(text: &str) -> String {
    let readings = text.chars().next().and_then(|c| c.to_pinyin_multi());

    match readings {
        Some(multi) => multi
            .into_iter()
            .map(|syllable| syllable.with_tone())
            .collect::<Vec<_>>()
            .join(", "),
        None => text.to_string(),
    }
}
