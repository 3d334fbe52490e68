//! Text chunking with configurable size and overlap.

use crate::types::ChunkCandidate;

/// Chunk text into overlapping segments.
///
/// Sizes are measured in characters, not bytes, so multi-byte text never
/// splits inside a code point. The final chunk always reaches the end of the
/// text; whitespace-only chunks are skipped.
pub fn chunk_text(text: &str, chunk_size: usize, overlap: usize) -> Vec<ChunkCandidate> {
    let chunk_size = chunk_size.max(1);
    let chars: Vec<char> = text.chars().collect();
    if chars.is_empty() {
        return vec![];
    }

    // Move forward by (chunk_size - overlap)
    let step = if chunk_size > overlap {
        chunk_size - overlap
    } else {
        chunk_size
    };

    let mut chunks = Vec::new();
    let mut position = 0u32;
    let mut start = 0;

    loop {
        let end = (start + chunk_size).min(chars.len());
        let piece: String = chars[start..end].iter().collect();
        let trimmed = piece.trim();

        if !trimmed.is_empty() {
            chunks.push(ChunkCandidate {
                position,
                text: trimmed.to_string(),
                start,
                end,
            });
            position += 1;
        }

        if end == chars.len() {
            break;
        }
        start += step;
    }

    tracing::debug!(
        "Chunked text into {} chunks (size: {}, overlap: {})",
        chunks.len(),
        chunk_size,
        overlap
    );

    chunks
}
