//! Word tokenization with byte and char offsets.

use std::ops::Range;
use std::sync::LazyLock;

use regex::Regex;

/// Words, keeping inner apostrophes ("what's", "o'clock").
static WORD: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\w+(?:['’]\w+)*").expect("word pattern is valid")
});

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Token {
    /// Lower-cased form used for matching.
    pub normalized: String,
    pub bytes: Range<usize>,
    pub chars: Range<usize>,
}

pub(crate) fn tokenize(input: &str) -> Vec<Token> {
    let offsets = CharOffsets::new(input);
    WORD.find_iter(input)
        .map(|m| Token {
            normalized: m.as_str().to_lowercase(),
            bytes: m.start()..m.end(),
            chars: offsets.char_at(m.start())..offsets.char_at(m.end()),
        })
        .collect()
}

/// Lower-case and re-join the words of `text` with single spaces, the form
/// gazetteer surface forms are matched in.
pub(crate) fn normalize(text: &str) -> String {
    tokenize(text)
        .into_iter()
        .map(|t| t.normalized)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Byte offset -> char offset lookup for one input string.
pub(crate) struct CharOffsets {
    /// Byte offset of every char start.
    starts: Vec<usize>,
}

impl CharOffsets {
    pub(crate) fn new(input: &str) -> Self {
        Self {
            starts: input.char_indices().map(|(b, _)| b).collect(),
        }
    }

    /// Char index of the char starting at `byte`.  `byte == input.len()`
    /// maps to the char count.
    pub(crate) fn char_at(&self, byte: usize) -> usize {
        self.starts.partition_point(|&b| b < byte)
    }

    pub(crate) fn char_len(&self) -> usize {
        self.starts.len()
    }
}
