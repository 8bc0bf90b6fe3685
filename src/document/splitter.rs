//! Character-budget text splitting with sliding overlap.
//!
//! Pages are split independently; each chunk records the byte offset of its
//! text within the page so callers can trace a chunk back to its source span.
//! Boundaries prefer paragraph breaks, then line breaks, then spaces, falling
//! back to a hard cut when the window contains none.

use crate::document::loader::PageText;

/// Source attribution carried by every chunk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkMetadata {
    /// URI or path of the source document.
    pub source: String,
    /// Zero-based page number the chunk was taken from.
    pub page: usize,
    /// Byte offset of the chunk text within its page.
    pub start_index: usize,
}

/// A contiguous span of source-document text produced by splitting.
#[derive(Debug, Clone)]
pub struct DocumentChunk {
    /// Raw text content of the chunk.
    pub text: String,
    /// Source attribution for the chunk.
    pub metadata: ChunkMetadata,
}

/// Split page-level text units into overlapping chunks.
///
/// `chunk_size` is an upper bound on the character count per chunk and
/// `overlap` is the number of trailing characters repeated at the head of the
/// next chunk. Whitespace-only pages produce no chunks.
pub fn split_pages(
    pages: &[PageText],
    chunk_size: usize,
    overlap: usize,
    source: &str,
) -> Vec<DocumentChunk> {
    let mut chunks = Vec::new();
    for page in pages {
        for (start_index, text) in split_text(&page.text, chunk_size, overlap) {
            chunks.push(DocumentChunk {
                text,
                metadata: ChunkMetadata {
                    source: source.to_string(),
                    page: page.page,
                    start_index,
                },
            });
        }
    }
    chunks
}

/// Split one text unit into `(byte_offset, chunk_text)` pairs.
fn split_text(text: &str, chunk_size: usize, overlap: usize) -> Vec<(usize, String)> {
    if chunk_size == 0 || text.trim().is_empty() {
        return Vec::new();
    }
    let overlap = overlap.min(chunk_size - 1);

    // Byte offset of every char, so windows always land on char boundaries.
    let char_offsets: Vec<usize> = text.char_indices().map(|(offset, _)| offset).collect();
    let total = char_offsets.len();

    let mut pieces = Vec::new();
    let mut start = 0usize;
    loop {
        let hard_end = (start + chunk_size).min(total);
        let end = if hard_end == total {
            total
        } else {
            break_point(text, &char_offsets, start, hard_end)
        };

        let byte_start = char_offsets[start];
        let byte_end = if end == total {
            text.len()
        } else {
            char_offsets[end]
        };
        let raw = &text[byte_start..byte_end];
        let trimmed = raw.trim();
        if !trimmed.is_empty() {
            let leading = raw.len() - raw.trim_start().len();
            pieces.push((byte_start + leading, trimmed.to_string()));
        }

        if end == total {
            break;
        }
        start = end.saturating_sub(overlap).max(start + 1);
    }
    pieces
}

/// Choose a chunk boundary within `(start, hard_end]`, as a char position.
///
/// Scans the second half of the window for the last paragraph break, line
/// break, or space; a hard cut at `hard_end` is the fallback.
fn break_point(text: &str, char_offsets: &[usize], start: usize, hard_end: usize) -> usize {
    let window_start = start + (hard_end - start) / 2;
    let byte_lo = char_offsets[window_start];
    let byte_hi = char_offsets[hard_end];
    let window = &text[byte_lo..byte_hi];

    for separator in ["\n\n", "\n", " "] {
        if let Some(position) = window.rfind(separator) {
            let byte_break = byte_lo + position + separator.len();
            // Separators are ASCII, so byte_break is always a char boundary.
            return char_offsets.partition_point(|&offset| offset < byte_break);
        }
    }
    hard_end
}
