//! Recursive character text splitting.
//!
//! Text is cut on the first separator that occurs in it (paragraph breaks,
//! then line breaks). Pieces are merged greedily into chunks of at most
//! `chunk_size` characters, and each new chunk starts with up to
//! `chunk_overlap` characters carried over from the end of the previous one.
//! Lengths are counted in characters, not bytes.

use std::collections::VecDeque;

const SEPARATORS: [&str; 2] = ["\n\n", "\n"];

#[derive(Clone, Debug)]
pub struct TextSplitter {
    chunk_size: usize,
    chunk_overlap: usize,
}

fn char_len(s: &str) -> usize {
    s.chars().count()
}

/// Splits on `separator`, keeping it attached to the start of the piece
/// that follows it.
fn split_keep<'a>(text: &'a str, separator: &str) -> Vec<&'a str> {
    let mut pieces = Vec::new();
    let mut start = 0;

    for (index, _) in text.match_indices(separator) {
        if index > start {
            pieces.push(&text[start..index]);
        }
        start = index;
    }

    if start < text.len() {
        pieces.push(&text[start..]);
    }

    pieces
}

fn push_trimmed(chunks: &mut Vec<String>, text: &str) {
    let text = text.trim();
    if !text.is_empty() {
        chunks.push(text.to_string());
    }
}

impl TextSplitter {
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Self {
        let chunk_size = chunk_size.max(1);
        Self {
            chunk_size,
            chunk_overlap: chunk_overlap.min(chunk_size - 1),
        }
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    pub fn split_text(&self, text: &str) -> Vec<String> {
        self.split_recursive(text, &SEPARATORS)
    }

    fn split_recursive(&self, text: &str, separators: &[&str]) -> Vec<String> {
        let Some(position) = separators.iter().position(|s| text.contains(s)) else {
            return self.split_windows(text);
        };
        let separator = separators[position];
        let finer = &separators[position + 1..];

        let mut chunks = Vec::new();
        let mut small = Vec::new();

        for piece in split_keep(text, separator) {
            if char_len(piece) < self.chunk_size {
                small.push(piece);
                continue;
            }

            if !small.is_empty() {
                chunks.extend(self.merge(&small));
                small.clear();
            }

            if finer.is_empty() {
                chunks.extend(self.split_windows(piece));
            } else {
                chunks.extend(self.split_recursive(piece, finer));
            }
        }

        if !small.is_empty() {
            chunks.extend(self.merge(&small));
        }

        chunks
    }

    fn merge(&self, pieces: &[&str]) -> Vec<String> {
        let mut chunks = Vec::new();
        let mut current: VecDeque<(&str, usize)> = VecDeque::new();
        let mut total = 0;

        for &piece in pieces {
            let len = char_len(piece);

            if total + len > self.chunk_size && !current.is_empty() {
                push_trimmed(&mut chunks, &current.iter().map(|(p, _)| *p).collect::<String>());

                while total > self.chunk_overlap || (total + len > self.chunk_size && total > 0) {
                    match current.pop_front() {
                        Some((_, dropped)) => total -= dropped,
                        None => break,
                    }
                }
            }

            current.push_back((piece, len));
            total += len;
        }

        push_trimmed(&mut chunks, &current.iter().map(|(p, _)| *p).collect::<String>());

        chunks
    }

    /// Last resort for text without any separator: fixed windows of
    /// `chunk_size` characters sharing `chunk_overlap` characters.
    fn split_windows(&self, text: &str) -> Vec<String> {
        let chars: Vec<char> = text.chars().collect();
        let mut chunks = Vec::new();

        if chars.len() <= self.chunk_size {
            push_trimmed(&mut chunks, text);
            return chunks;
        }

        let step = self.chunk_size - self.chunk_overlap;
        let mut start = 0;
        loop {
            let end = (start + self.chunk_size).min(chars.len());
            push_trimmed(&mut chunks, &chars[start..end].iter().collect::<String>());
            if end == chars.len() {
                break;
            }
            start += step;
        }

        chunks
    }
}
