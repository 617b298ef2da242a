//! Text chunking for embedding.
//!
//! `start_index`/`end_index` are offsets into the reconstructed chunk
//! stream (post-overlap), not byte offsets into the original page
//! content — the store only uses them to order chunks for display.

const CHUNK_SIZE: usize = 600;
const OVERLAP: usize = 100;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkSpan {
    pub content: String,
    pub start_index: Option<i32>,
    pub end_index: Option<i32>,
}

/// Split `content` into chunks of at most [`CHUNK_SIZE`] characters with
/// [`OVERLAP`]-character overlap, preferring paragraph boundaries.
pub fn chunk_text(content: &str) -> Vec<ChunkSpan> {
    let content = content.trim();
    if content.is_empty() {
        return Vec::new();
    }

    let mut paragraphs: Vec<&str> = content
        .split("\n\n")
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .collect();
    if paragraphs.is_empty() {
        paragraphs.push(content);
    }

    let mut chunks = Vec::new();
    let mut buf = String::new();
    let mut next_start = 0usize;

    for para in paragraphs {
        if char_len(para) > CHUNK_SIZE {
            flush(&mut buf, &mut chunks, &mut next_start);
            hard_split(para, &mut chunks, &mut next_start);
            continue;
        }

        let extra = if buf.is_empty() { char_len(para) } else { char_len(para) + 2 };
        if !buf.is_empty() && char_len(&buf) + extra > CHUNK_SIZE {
            flush(&mut buf, &mut chunks, &mut next_start);
            if let Some(last) = chunks.last() {
                buf = tail_chars(&last.content, OVERLAP);
            }
        }
        if !buf.is_empty() {
            buf.push_str("\n\n");
        }
        buf.push_str(para);
    }
    flush(&mut buf, &mut chunks, &mut next_start);

    chunks
}

fn flush(buf: &mut String, chunks: &mut Vec<ChunkSpan>, next_start: &mut usize) {
    if buf.is_empty() {
        return;
    }
    let len = char_len(buf);
    let start = *next_start;
    let end = start + len;
    chunks.push(ChunkSpan {
        content: buf.clone(),
        start_index: Some(start as i32),
        end_index: Some(end as i32),
    });
    *next_start = end.saturating_sub(OVERLAP.min(len));
    buf.clear();
}

/// Hard-split a single over-size paragraph into fixed windows with the
/// same overlap, ignoring paragraph boundaries.
fn hard_split(para: &str, chunks: &mut Vec<ChunkSpan>, next_start: &mut usize) {
    let chars: Vec<char> = para.chars().collect();
    let step = CHUNK_SIZE - OVERLAP;
    let mut pos = 0usize;
    while pos < chars.len() {
        let end = (pos + CHUNK_SIZE).min(chars.len());
        let piece: String = chars[pos..end].iter().collect();
        let start = *next_start;
        chunks.push(ChunkSpan {
            content: piece,
            start_index: Some(start as i32),
            end_index: Some((start + (end - pos)) as i32),
        });
        *next_start = start + (end - pos) - OVERLAP.min(end - pos);
        if end == chars.len() {
            break;
        }
        pos += step;
    }
}

fn char_len(s: &str) -> usize {
    s.chars().count()
}

fn tail_chars(s: &str, n: usize) -> String {
    let len = char_len(s);
    if len <= n {
        return s.to_string();
    }
    s.chars().skip(len - n).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_content_yields_no_chunks() {
        assert!(chunk_text("").is_empty());
        assert!(chunk_text("   ").is_empty());
    }

    #[test]
    fn short_content_is_one_chunk() {
        let chunks = chunk_text("just one short paragraph");
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].content, "just one short paragraph");
    }

    #[test]
    fn packs_paragraphs_until_limit() {
        let para = "x".repeat(300);
        let content = format!("{para}\n\n{para}\n\n{para}");
        let chunks = chunk_text(&content);
        assert!(chunks.len() >= 2);
        for chunk in &chunks {
            assert!(chunk.content.chars().count() <= CHUNK_SIZE);
        }
    }

    #[test]
    fn hard_splits_oversize_paragraph() {
        let para = "y".repeat(1500);
        let chunks = chunk_text(&para);
        assert!(chunks.len() >= 3);
        for chunk in &chunks {
            assert!(chunk.content.chars().count() <= CHUNK_SIZE);
        }
    }

    #[test]
    fn consecutive_chunks_overlap() {
        let para_a = "a".repeat(500);
        let para_b = "b".repeat(500);
        let content = format!("{para_a}\n\n{para_b}");
        let chunks = chunk_text(&content);
        assert!(chunks.len() >= 2);
        let tail_of_first = tail_chars(&chunks[0].content, OVERLAP);
        assert!(chunks[1].content.starts_with(&tail_of_first));
    }
}
