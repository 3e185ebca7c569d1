//! Sentence-respecting text chunking

use once_cell::sync::Lazy;
use regex::Regex;

/// Sentence terminator followed by whitespace. The split point sits after
/// the terminator; the whitespace run is consumed.
static SENTENCE_BOUNDARY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[.!?]\s+").expect("valid sentence boundary regex"));

/// Splits text into bounded segments on sentence boundaries.
///
/// The cap is soft: a single sentence longer than `max_chars` is kept whole
/// rather than split mid-sentence.
pub struct SentenceChunker {
    /// Soft cap on chunk size in characters
    max_chars: usize,
}

impl SentenceChunker {
    /// Create a new chunker
    pub fn new(max_chars: usize) -> Self {
        Self { max_chars }
    }

    /// Chunk text into ordered segments.
    ///
    /// Sentences are accumulated greedily; a chunk is closed as soon as
    /// appending the next sentence would reach the cap. Empty input yields
    /// an empty sequence.
    pub fn chunk(&self, text: &str) -> Vec<String> {
        let mut chunks = Vec::new();
        let mut current = String::new();

        for sentence in Self::split_sentences(text) {
            let sentence = sentence.trim();
            if sentence.is_empty() {
                continue;
            }

            if !current.is_empty() && current.len() + sentence.len() >= self.max_chars {
                chunks.push(current.trim_end().to_string());
                current.clear();
            }

            current.push_str(sentence);
            current.push(' ');
        }

        let tail = current.trim_end();
        if !tail.is_empty() {
            chunks.push(tail.to_string());
        }

        chunks
    }

    /// Split text into sentences, keeping the terminator with its sentence
    fn split_sentences(text: &str) -> Vec<&str> {
        let mut sentences = Vec::new();
        let mut last = 0;

        for m in SENTENCE_BOUNDARY.find_iter(text) {
            // terminator is a single ASCII byte, so the cut is on a char boundary
            let end = m.start() + 1;
            sentences.push(&text[last..end]);
            last = m.end();
        }

        if last < text.len() {
            sentences.push(&text[last..]);
        }

        sentences
    }
}

impl Default for SentenceChunker {
    fn default() -> Self {
        Self::new(800)
    }
}
