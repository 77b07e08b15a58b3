// Core chunking logic shared by the split and analyze commands.

/// Paragraph separator: a blank line.
pub const SEPARATOR: &str = "\n\n";

#[derive(Debug, PartialEq, Eq)]
pub enum SplitError {
    InvalidMaxSize,
}

impl std::fmt::Display for SplitError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SplitError::InvalidMaxSize => {
                write!(f, "max chunk size must be a positive number of bytes")
            }
        }
    }
}

impl std::error::Error for SplitError {}

/// Split `text` into chunks of whole paragraphs, each at most
/// `max_chunk_size` bytes.
///
/// Paragraphs are delimited by a blank line (`"\n\n"`) and are never split or
/// reordered; a paragraph that alone exceeds the limit becomes its own
/// oversized chunk. Greedy accumulation: a paragraph joins the current chunk
/// when the chunk's length plus the paragraph plus the two separator bytes
/// still fits. The separator bytes are charged even into an empty chunk, so
/// the first paragraph of every chunk effectively has two bytes less
/// headroom.
pub fn split_text(text: &str, max_chunk_size: usize) -> Result<Vec<String>, SplitError> {
    if max_chunk_size == 0 {
        return Err(SplitError::InvalidMaxSize);
    }

    let mut chunks: Vec<String> = Vec::new();
    let mut current = String::new();

    for paragraph in text.split(SEPARATOR) {
        if current.len() + paragraph.len() + SEPARATOR.len() > max_chunk_size
            && !current.is_empty()
        {
            chunks.push(std::mem::take(&mut current));
            current.push_str(paragraph);
        } else {
            if !current.is_empty() {
                current.push_str(SEPARATOR);
            }
            current.push_str(paragraph);
        }
    }

    if !current.is_empty() {
        chunks.push(current);
    }

    Ok(chunks)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn small_text_stays_in_one_chunk() {
        let chunks = split_text("A\n\nB\n\nC", 100).unwrap();
        assert_eq!(chunks, vec!["A\n\nB\n\nC".to_string()]);
    }

    #[test]
    fn splits_when_separator_cost_overflows() {
        // "AAAAA\n\nBBBBB" is 12 bytes > 7, and 5 + 5 + 2 > 7 forces the
        // split before the second paragraph.
        let chunks = split_text("AAAAA\n\nBBBBB", 7).unwrap();
        assert_eq!(chunks, vec!["AAAAA".to_string(), "BBBBB".to_string()]);
    }

    #[test]
    fn empty_input_yields_no_chunks() {
        let chunks = split_text("", 100).unwrap();
        assert!(chunks.is_empty());
    }

    #[test]
    fn oversized_paragraph_is_kept_whole() {
        let long = "x".repeat(50);
        let chunks = split_text(&long, 10).unwrap();
        assert_eq!(chunks, vec![long]);
    }

    #[test]
    fn boundary_fit_packs_two_then_starts_third() {
        // 3 + 3 + 2 = 8 fits exactly; the third paragraph starts a new chunk.
        let chunks = split_text("aaa\n\nbbb\n\nccc", 8).unwrap();
        assert_eq!(chunks, vec!["aaa\n\nbbb".to_string(), "ccc".to_string()]);
    }

    #[test]
    fn separator_cost_charged_into_empty_accumulator() {
        // A 7-byte paragraph alone occupies a chunk of limit 8: 0 + 7 + 2 > 8,
        // so nothing else may join it even though 7 < 8.
        let chunks = split_text("aaaaaaa\n\nb", 8).unwrap();
        assert_eq!(chunks, vec!["aaaaaaa".to_string(), "b".to_string()]);
    }

    #[test]
    fn rejects_zero_max_size() {
        assert_eq!(split_text("anything", 0), Err(SplitError::InvalidMaxSize));
    }

    #[test]
    fn joined_chunks_reconstruct_the_document() {
        let text = "First paragraph.\n\nSecond one, a bit longer than the first.\n\nThird.\n\nFourth paragraph, also long enough to matter.\n\nFifth.";
        for max in [10usize, 24, 40, 1000] {
            let chunks = split_text(text, max).unwrap();
            assert_eq!(chunks.join(SEPARATOR), text, "max={max}");
        }
    }

    #[test]
    fn consecutive_blank_lines_survive_within_a_chunk() {
        // Three or more newlines in a row produce an empty paragraph, which
        // rides along as separator bytes.
        let text = "A\n\n\n\nB";
        let chunks = split_text(text, 100).unwrap();
        assert_eq!(chunks, vec![text.to_string()]);
    }

    #[test]
    fn paragraph_order_is_preserved() {
        let paragraphs: Vec<String> = (0..20).map(|i| format!("para {i}")).collect();
        let text = paragraphs.join(SEPARATOR);
        let chunks = split_text(&text, 20).unwrap();
        let rejoined: Vec<&str> = chunks
            .iter()
            .flat_map(|c| c.split(SEPARATOR))
            .collect();
        assert_eq!(rejoined, paragraphs);
    }

    #[test]
    fn bound_is_respected_except_for_single_oversized_paragraphs() {
        let text = format!("short\n\n{}\n\ntail\n\nmore tail text here", "y".repeat(64));
        let max = 32;
        for chunk in split_text(&text, max).unwrap() {
            if chunk.len() > max {
                assert!(!chunk.contains(SEPARATOR), "oversized chunk must be a single paragraph");
            }
        }
    }

    #[test]
    fn rechunking_a_chunk_is_a_fixpoint() {
        // Covers both multi-paragraph chunks and the oversized single
        // paragraph case.
        let text = "alpha\n\nbeta\n\ngamma delta epsilon longer\n\nzeta";
        let max = 24;
        let chunks = split_text(text, max).unwrap();
        assert!(chunks.iter().any(|c| c.contains(SEPARATOR)));
        assert!(chunks.iter().any(|c| c.len() > max));
        for chunk in chunks {
            let again = split_text(&chunk, max).unwrap();
            assert_eq!(again, vec![chunk.clone()]);
        }
    }

    #[test]
    fn multibyte_text_splits_on_paragraph_boundaries() {
        let text = "héllo wörld\n\nsecond paragraph ünïcode";
        let chunks = split_text(text, 16).unwrap();
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks.join(SEPARATOR), text);
    }
}
