//! Deterministic text chunking with sentence-boundary snapping

use crate::config::ChunkingConfig;
use crate::error::{Error, Result};
use crate::types::document::{content_hash, make_snippet, Chunk, Document};

/// How far back from the window end a sentence boundary is searched for
const BOUNDARY_WINDOW: usize = 100;

/// Splits normalized text into bounded, overlapping windows
///
/// Chunking is pure CPU work and fully deterministic: the same text always
/// yields the same chunk texts, indices, and hashes.
pub struct Chunker {
    chunk_size: usize,
    overlap: usize,
    max_chunks_per_document: usize,
}

impl Chunker {
    /// Create a chunker, validating the window parameters
    pub fn new(config: &ChunkingConfig) -> Result<Self> {
        if config.chunk_size == 0 {
            return Err(Error::config("chunk_size must be greater than zero"));
        }
        if config.overlap >= config.chunk_size {
            return Err(Error::config("overlap must be strictly less than chunk_size"));
        }
        if config.max_chunks_per_document == 0 {
            return Err(Error::config("max_chunks_per_document must be greater than zero"));
        }
        Ok(Self {
            chunk_size: config.chunk_size,
            overlap: config.overlap,
            max_chunks_per_document: config.max_chunks_per_document,
        })
    }

    /// Chunk a document's text into ordered, overlapping windows
    ///
    /// Produced chunks carry gap-free 0-based indices, snippets, and content
    /// hashes. Embeddings are left empty for the ingest pipeline to fill.
    pub fn chunk(&self, doc: &Document, text: &str) -> Result<Vec<Chunk>> {
        let normalized = normalize(text);
        if normalized.is_empty() {
            return Ok(Vec::new());
        }

        // Windowing works in characters, not bytes, so offsets stay stable
        // across any UTF-8 input.
        let chars: Vec<char> = normalized.chars().collect();
        let total = chars.len();

        let mut chunks = Vec::new();
        let mut start = 0usize;
        let mut index = 0u32;

        while start < total {
            let mut end = (start + self.chunk_size).min(total);

            if end < total {
                if let Some(boundary) = find_boundary(&chars, start, end) {
                    // Accept a boundary only in the later half of the window;
                    // a late mid-sentence cut beats an arbitrary mid-word cut.
                    let min_cut = start + std::cmp::max(1, (end - start) / 2);
                    if boundary >= min_cut {
                        end = boundary + 1;
                    }
                }
            }

            let piece: String = chars[start..end].iter().collect();
            let piece = piece.trim();
            if !piece.is_empty() {
                if chunks.len() >= self.max_chunks_per_document {
                    return Err(Error::ChunkExplosion {
                        doc_name: doc.name.clone(),
                        limit: self.max_chunks_per_document,
                    });
                }
                chunks.push(Chunk {
                    id: uuid::Uuid::new_v4(),
                    document_id: doc.id,
                    document_name: doc.name.clone(),
                    index,
                    snippet: make_snippet(piece),
                    hash: content_hash(piece),
                    text: piece.to_string(),
                    embedding: Vec::new(),
                    created_utc: doc.created_utc,
                });
                index += 1;
            }

            if end == total {
                // No overlap past EOF; the tail is never reprocessed.
                break;
            }

            // Forced advance keeps termination even when overlap approaches
            // the window size.
            start = std::cmp::max(end.saturating_sub(self.overlap), start + 1);
        }

        Ok(chunks)
    }
}

/// Rightmost `.` or `\n` within the trailing boundary window, if any
fn find_boundary(chars: &[char], start: usize, end: usize) -> Option<usize> {
    let lo = start.max(end.saturating_sub(BOUNDARY_WINDOW));
    (lo..end).rev().find(|&i| chars[i] == '.' || chars[i] == '\n')
}

/// Normalize raw document text before windowing
///
/// CRLF becomes LF, runs of horizontal whitespace collapse to one space (LF
/// is preserved), and the result is trimmed.
pub fn normalize(text: &str) -> String {
    let text = text.replace("\r\n", "\n");
    let mut out = String::with_capacity(text.len());
    let mut in_run = false;
    for ch in text.chars() {
        match ch {
            ' ' | '\t' | '\u{000C}' | '\u{000B}' => {
                if !in_run {
                    out.push(' ');
                }
                in_run = true;
            }
            _ => {
                out.push(ch);
                in_run = false;
            }
        }
    }
    out.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use uuid::Uuid;

    fn test_doc() -> Document {
        Document {
            id: Uuid::new_v4(),
            name: "test.md".to_string(),
            source_path: None,
            created_utc: Utc::now(),
            chunk_count: 0,
            total_size_bytes: 0,
        }
    }

    fn chunker(chunk_size: usize, overlap: usize, max_chunks: usize) -> Chunker {
        Chunker::new(&ChunkingConfig {
            chunk_size,
            overlap,
            max_chunks_per_document: max_chunks,
        })
        .unwrap()
    }

    #[test]
    fn normalization_collapses_horizontal_whitespace() {
        assert_eq!(normalize("a \t b\r\nc\n\nd"), "a b\nc\n\nd");
        assert_eq!(normalize("  padded  "), "padded");
        assert_eq!(normalize("\t \u{000C}\u{000B}"), "");
    }

    #[test]
    fn empty_text_yields_no_chunks() {
        let chunks = chunker(100, 10, 100).chunk(&test_doc(), "   \n\t ").unwrap();
        assert!(chunks.is_empty());
    }

    #[test]
    fn short_text_is_one_chunk() {
        let chunks = chunker(100, 10, 100)
            .chunk(&test_doc(), "check processor dashboard")
            .unwrap();
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].index, 0);
        assert_eq!(chunks[0].text, "check processor dashboard");
    }

    #[test]
    fn indices_are_dense_and_ordered() {
        let text = "word ".repeat(600);
        let chunks = chunker(200, 40, 100).chunk(&test_doc(), &text).unwrap();
        assert!(chunks.len() > 1);
        for (i, chunk) in chunks.iter().enumerate() {
            assert_eq!(chunk.index as usize, i);
        }
    }

    #[test]
    fn chunks_respect_size_bound() {
        let text = "a".repeat(5000);
        let chunks = chunker(1000, 150, 100).chunk(&test_doc(), &text).unwrap();
        for chunk in &chunks {
            assert!(chunk.text.chars().count() <= 1000 + BOUNDARY_WINDOW);
        }
    }

    #[test]
    fn window_count_matches_stride() {
        // 3000 chars, no sentence boundaries: windows advance by exactly
        // chunk_size - overlap = 850 until the tail.
        let text = "x".repeat(3000);
        let chunks = chunker(1000, 150, 100).chunk(&test_doc(), &text).unwrap();
        assert_eq!(chunks.len(), 4);
        assert!(chunks.iter().all(|c| c.text.chars().count() <= 1100));
    }

    #[test]
    fn snaps_to_late_sentence_boundary() {
        // A period at position 900 sits past the half-window mark and should
        // terminate the first chunk.
        let mut text = "a".repeat(900);
        text.push('.');
        text.push_str(&"b".repeat(900));
        let chunks = chunker(1000, 100, 100).chunk(&test_doc(), &text).unwrap();
        assert_eq!(chunks[0].text, format!("{}.", "a".repeat(900)));
    }

    #[test]
    fn ignores_early_sentence_boundary() {
        // A period before the half-window mark must not shrink the window.
        let mut text = "a".repeat(300);
        text.push('.');
        text.push_str(&"b".repeat(1500));
        let chunks = chunker(1000, 100, 100).chunk(&test_doc(), &text).unwrap();
        assert_eq!(chunks[0].text.chars().count(), 1000);
    }

    #[test]
    fn rechunking_is_deterministic() {
        let text = "Auth rate dropped. Check the processor dashboard.\n".repeat(120);
        let c = chunker(1000, 150, 100);
        let first: Vec<String> = c
            .chunk(&test_doc(), &text)
            .unwrap()
            .iter()
            .map(|c| c.hash.clone())
            .collect();
        let second: Vec<String> = c
            .chunk(&test_doc(), &text)
            .unwrap()
            .iter()
            .map(|c| c.hash.clone())
            .collect();
        assert_eq!(first, second);
    }

    #[test]
    fn concatenated_chunks_cover_the_input() {
        let text = "The quick brown fox. Jumps over the lazy dog! ".repeat(80);
        let normalized = normalize(&text);
        let chunks = chunker(300, 50, 1000).chunk(&test_doc(), &text).unwrap();

        let concat: String = chunks.iter().map(|c| c.text.as_str()).collect();
        let count = |s: &str, ch: char| s.chars().filter(|&c| c == ch).count();
        // Overlap may duplicate characters but never lose them.
        for ch in ['q', '!', '.', 'z'] {
            assert!(count(&concat, ch) >= count(&normalized, ch));
        }
    }

    #[test]
    fn terminates_with_overlap_near_chunk_size() {
        let text = "y".repeat(500);
        let chunks = chunker(100, 99, 5000).chunk(&test_doc(), &text).unwrap();
        assert!(!chunks.is_empty());
        assert!(chunks.len() <= 500);
    }

    #[test]
    fn chunk_explosion_fails_loudly() {
        let text = "z".repeat(2000);
        let err = chunker(100, 0, 5).chunk(&test_doc(), &text).unwrap_err();
        assert!(matches!(err, Error::ChunkExplosion { .. }));
    }

    #[test]
    fn rejects_degenerate_configuration() {
        assert!(Chunker::new(&ChunkingConfig {
            chunk_size: 0,
            overlap: 0,
            max_chunks_per_document: 10,
        })
        .is_err());
        assert!(Chunker::new(&ChunkingConfig {
            chunk_size: 100,
            overlap: 100,
            max_chunks_per_document: 10,
        })
        .is_err());
    }
}
