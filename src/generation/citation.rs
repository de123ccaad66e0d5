//! Citation extraction from model answers

use regex::Regex;

use crate::providers::RetrievedChunk;
use crate::types::Citation;

/// Parse `[docName:chunkIndex]` citations out of an answer
///
/// Pairs are deduplicated by `(docName, index)` preserving first-seen order.
/// A citation matching a retrieved chunk carries that chunk's snippet; one
/// that matches nothing is preserved verbatim with an empty snippet.
pub fn parse_citations(answer: &str, retrieved: &[RetrievedChunk]) -> Vec<Citation> {
    let pattern = Regex::new(r"\[([^\]]+):(\d+)\]").expect("valid citation pattern");

    let mut seen = std::collections::HashSet::new();
    let mut citations = Vec::new();

    for cap in pattern.captures_iter(answer) {
        let doc_name = cap[1].to_string();
        let index: u32 = match cap[2].parse() {
            Ok(index) => index,
            Err(_) => continue,
        };

        if !seen.insert((doc_name.clone(), index)) {
            continue;
        }

        let snippet = retrieved
            .iter()
            .find(|r| r.chunk.document_name == doc_name && r.chunk.index == index)
            .map(|r| r.chunk.snippet.clone())
            .unwrap_or_default();

        citations.push(Citation {
            document_name: doc_name,
            chunk_index: index,
            snippet,
            score: None,
        });
    }

    citations
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::document::{content_hash, make_snippet};
    use crate::types::Chunk;
    use chrono::Utc;
    use uuid::Uuid;

    fn retrieved(doc: &str, index: u32, text: &str) -> RetrievedChunk {
        RetrievedChunk {
            chunk: Chunk {
                id: Uuid::new_v4(),
                document_id: Uuid::new_v4(),
                document_name: doc.to_string(),
                index,
                snippet: make_snippet(text),
                hash: content_hash(text),
                text: text.to_string(),
                embedding: Vec::new(),
                created_utc: Utc::now(),
            },
            score: 0.8,
        }
    }

    #[test]
    fn extracts_citations_in_order() {
        let chunks = vec![
            retrieved("auth.md", 0, "check processor dashboard"),
            retrieved("refunds.md", 2, "open the refunds queue"),
        ];
        let citations = parse_citations(
            "First [refunds.md:2], then [auth.md:0].",
            &chunks,
        );
        assert_eq!(citations.len(), 2);
        assert_eq!(citations[0].document_name, "refunds.md");
        assert_eq!(citations[0].chunk_index, 2);
        assert_eq!(citations[0].snippet, "open the refunds queue");
        assert_eq!(citations[1].document_name, "auth.md");
    }

    #[test]
    fn duplicates_collapse_to_first_occurrence() {
        let chunks = vec![retrieved("auth.md", 0, "check dashboard")];
        let citations = parse_citations(
            "See [auth.md:0]. Again: [auth.md:0]. Also [auth.md:1].",
            &chunks,
        );
        assert_eq!(citations.len(), 2);
        assert_eq!(citations[0].chunk_index, 0);
        assert_eq!(citations[1].chunk_index, 1);
    }

    #[test]
    fn unknown_citation_keeps_empty_snippet() {
        let citations = parse_citations("Per [ghost.md:7], restart it.", &[]);
        assert_eq!(citations.len(), 1);
        assert_eq!(citations[0].document_name, "ghost.md");
        assert_eq!(citations[0].chunk_index, 7);
        assert_eq!(citations[0].snippet, "");
        assert!(citations[0].score.is_none());
    }

    #[test]
    fn malformed_brackets_are_ignored() {
        let citations = parse_citations("[not-a-citation] [auth.md:x] [auth.md:]", &[]);
        assert!(citations.is_empty());
    }

    #[test]
    fn doc_names_may_contain_colons() {
        let citations = parse_citations("[ops:auth.md:0]", &[]);
        assert_eq!(citations.len(), 1);
        assert_eq!(citations[0].document_name, "ops:auth.md");
        assert_eq!(citations[0].chunk_index, 0);
    }
}
