//! Word-window chunking of page text.

/// Default window size, in words, for indexed chunks.
pub const DEFAULT_CHUNK_SIZE: usize = 350;

/// Splits `text` on whitespace and groups consecutive words into
/// non-overlapping windows of `chunk_size` words, preserving order.
///
/// The final window may be shorter; empty input yields an empty vector. For
/// an input of `L` words the result always holds `ceil(L / chunk_size)`
/// chunks, and concatenating their words reproduces the input word sequence.
///
/// Boundaries are word counts only — a window may end mid-sentence. That is a
/// deliberate simplicity trade-off, not a bug; callers wanting
/// sentence-aware boundaries need a different chunker.
pub fn chunk_words(text: &str, chunk_size: usize) -> Vec<String> {
    let size = chunk_size.max(1);
    let words: Vec<&str> = text.split_whitespace().collect();
    words.chunks(size).map(|window| window.join(" ")).collect()
}
