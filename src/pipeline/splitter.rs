/*!
 * Text splitting for the translation and synthesis stages.
 *
 * Translation works on sentence-ish segments cut at the literal `". "`
 * delimiter. Synthesis works on fixed-size character chunks that may end
 * mid-word. Both are pure functions over borrowed text.
 */

use crate::errors::SplitError;

/// Delimiter used both to split the transcript and to rejoin translations
pub const SEGMENT_DELIMITER: &str = ". ";

/// A piece of transcript text and its position in the raw split
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment<'a> {
    /// Zero-based position in the raw split, blanks included
    pub ordinal: usize,
    /// Trimmed segment text
    pub text: &'a str,
}

/// Split `text` on `". "`, trimming each piece and dropping blank ones.
///
/// Dropped pieces still consume an ordinal, so ordinals may have gaps.
/// No abbreviation or quote handling: "Dr. Smith" yields two segments.
pub fn split_for_translation(text: &str) -> Vec<Segment<'_>> {
    text.split(SEGMENT_DELIMITER)
        .enumerate()
        .filter_map(|(ordinal, piece)| {
            let trimmed = piece.trim();
            if trimmed.is_empty() {
                None
            } else {
                Some(Segment { ordinal, text: trimmed })
            }
        })
        .collect()
}

/// Cut `text` into contiguous chunks of at most `max_chunk_chars` characters.
///
/// Boundaries fall on character (not byte) positions, never inside a code
/// point. Concatenating the chunks reproduces `text` exactly.
pub fn split_for_synthesis(text: &str, max_chunk_chars: usize) -> Result<Vec<&str>, SplitError> {
    if max_chunk_chars == 0 {
        return Err(SplitError::InvalidChunkSize(max_chunk_chars));
    }

    let mut chunks = Vec::new();
    let mut start = 0;
    let mut count = 0;

    for (byte_index, _) in text.char_indices() {
        if count == max_chunk_chars {
            chunks.push(&text[start..byte_index]);
            start = byte_index;
            count = 0;
        }
        count += 1;
    }

    if start < text.len() {
        chunks.push(&text[start..]);
    }

    Ok(chunks)
}
