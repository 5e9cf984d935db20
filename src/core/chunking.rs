//! Size-bounded splitting of research results.
//!
//! Results are measured in estimated tokens (`chars / 4`). A result at or
//! below [`TOKEN_THRESHOLD`] is returned whole; anything larger is cut into
//! contiguous segments of at most [`CHUNK_CHAR_LIMIT`] characters. Segments
//! never overlap and always concatenate back to the original text.
//!
//! Lengths are counted in Unicode scalar values, so a segment boundary never
//! falls inside a multi-byte character.

use serde::Serialize;

/// Estimated-token count above which a result is split.
pub const TOKEN_THRESHOLD: usize = 15_000;

/// Characters per estimated token.
pub const CHARS_PER_TOKEN: usize = 4;

/// Maximum characters in a single chunk.
pub const CHUNK_CHAR_LIMIT: usize = TOKEN_THRESHOLD * CHARS_PER_TOKEN;

/// A result payload split into ordered chunks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChunkedText {
    /// Ordered chunk texts. Never empty: an empty payload yields one empty chunk.
    pub chunks: Vec<String>,
    /// Estimated token count of the whole payload.
    pub estimated_tokens: usize,
}

impl ChunkedText {
    /// Number of chunks.
    #[must_use]
    pub fn total_chunks(&self) -> usize {
        self.chunks.len()
    }

    /// Whether the payload was split into more than one chunk.
    #[must_use]
    pub fn is_split(&self) -> bool {
        self.chunks.len() > 1
    }
}

/// Approximates the token count of `text` as `chars / 4`.
#[must_use]
pub fn estimate_tokens(text: &str) -> usize {
    text.chars().count() / CHARS_PER_TOKEN
}

/// Splits `text` using the default [`TOKEN_THRESHOLD`].
#[must_use]
pub fn chunk_text(text: &str) -> ChunkedText {
    chunk_text_with(text, TOKEN_THRESHOLD)
}

/// Splits `text` with an explicit token threshold.
///
/// Returns a single chunk when `estimate_tokens(text) <= token_threshold`,
/// otherwise segments of at most `token_threshold * 4` characters.
#[must_use]
pub fn chunk_text_with(text: &str, token_threshold: usize) -> ChunkedText {
    let estimated_tokens = estimate_tokens(text);

    if estimated_tokens <= token_threshold {
        return ChunkedText {
            chunks: vec![text.to_string()],
            estimated_tokens,
        };
    }

    let limit = token_threshold.saturating_mul(CHARS_PER_TOKEN).max(1);
    ChunkedText {
        chunks: split_chars(text, limit),
        estimated_tokens,
    }
}

/// Cuts `text` every `limit` characters.
fn split_chars(text: &str, limit: usize) -> Vec<String> {
    let mut chunks = Vec::with_capacity(text.len() / limit + 1);
    let mut start = 0;
    let mut count = 0;

    for (idx, _) in text.char_indices() {
        if count == limit {
            chunks.push(text[start..idx].to_string());
            start = idx;
            count = 0;
        }
        count += 1;
    }

    if start < text.len() {
        chunks.push(text[start..].to_string());
    }

    chunks
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_small_text_single_chunk() {
        let result = chunk_text("answer text");
        assert_eq!(result.chunks, vec!["answer text".to_string()]);
        assert_eq!(result.estimated_tokens, 2);
        assert!(!result.is_split());
    }

    #[test]
    fn test_empty_text_single_empty_chunk() {
        let result = chunk_text("");
        assert_eq!(result.total_chunks(), 1);
        assert_eq!(result.chunks[0], "");
        assert_eq!(result.estimated_tokens, 0);
    }

    #[test]
    fn test_exactly_at_threshold_not_split() {
        // 60_003 chars -> 15_000 tokens (integer division), not above threshold
        let text = "a".repeat(CHUNK_CHAR_LIMIT + 3);
        let result = chunk_text(&text);
        assert_eq!(result.estimated_tokens, TOKEN_THRESHOLD);
        assert_eq!(result.total_chunks(), 1);
    }

    #[test]
    fn test_just_above_threshold_splits() {
        let text = "a".repeat(CHUNK_CHAR_LIMIT + 4);
        let result = chunk_text(&text);
        assert_eq!(result.estimated_tokens, TOKEN_THRESHOLD + 1);
        assert_eq!(result.total_chunks(), 2);
        assert_eq!(result.chunks[0].len(), CHUNK_CHAR_LIMIT);
        assert_eq!(result.chunks[1].len(), 4);
    }

    #[test]
    fn test_three_chunks() {
        let text = "x".repeat(CHUNK_CHAR_LIMIT * 2 + 10);
        let result = chunk_text(&text);
        assert_eq!(result.total_chunks(), 3);
        assert_eq!(result.chunks[2].len(), 10);
        assert_eq!(result.chunks.concat(), text);
    }

    #[test]
    fn test_multibyte_boundaries() {
        // 4 tokens threshold -> 16 char limit; 20 two-byte chars
        let text = "é".repeat(20);
        let result = chunk_text_with(&text, 4);
        assert_eq!(result.total_chunks(), 2);
        assert_eq!(result.chunks[0].chars().count(), 16);
        assert_eq!(result.chunks[1].chars().count(), 4);
        assert_eq!(result.chunks.concat(), text);
    }

    #[test]
    fn test_zero_threshold_does_not_loop() {
        let result = chunk_text_with("abcdefgh", 0);
        assert_eq!(result.total_chunks(), 8);
        assert_eq!(result.chunks.concat(), "abcdefgh");
    }

    proptest! {
        #[test]
        fn prop_chunks_reassemble(text in "\\PC{0,400}", threshold in 1usize..40) {
            let result = chunk_text_with(&text, threshold);
            prop_assert_eq!(result.chunks.concat(), text.clone());

            let single = text.chars().count() / CHARS_PER_TOKEN <= threshold;
            prop_assert_eq!(result.total_chunks() == 1, single);

            let limit = threshold * CHARS_PER_TOKEN;
            for chunk in &result.chunks {
                prop_assert!(chunk.chars().count() <= limit || single);
                prop_assert!(!chunk.is_empty() || text.is_empty());
            }
        }
    }
}
