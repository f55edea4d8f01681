//! Sentence-boundary chunking for texts longer than the per-call limit.

/// Sentence delimiter used for splitting.
pub const SENTENCE_DELIMITER: &str = ". ";

/// Split `text` into chunks on [`SENTENCE_DELIMITER`].
///
/// Sentences are accumulated greedily while the chunk stays strictly under
/// `threshold` characters (delimiters included); a sentence that would
/// overflow starts the next chunk. A single sentence longer than the
/// threshold becomes its own chunk. Chunks are trimmed. Lengths count
/// Unicode scalar values.
pub fn split_into_chunks(text: &str, threshold: usize) -> Vec<String> {
    let sentences: Vec<&str> = text.split(SENTENCE_DELIMITER).collect();
    let last = sentences.len().saturating_sub(1);

    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut current_len = 0usize;

    for (i, sentence) in sentences.into_iter().enumerate() {
        let mut piece = sentence.to_string();
        if i < last {
            piece.push_str(SENTENCE_DELIMITER);
        }
        let piece_len = piece.chars().count();

        if current_len + piece_len < threshold {
            current.push_str(&piece);
            current_len += piece_len;
        } else {
            push_trimmed(&mut chunks, &current);
            current = piece;
            current_len = piece_len;
        }
    }
    push_trimmed(&mut chunks, &current);

    chunks
}

fn push_trimmed(chunks: &mut Vec<String>, chunk: &str) {
    let trimmed = chunk.trim();
    if !trimmed.is_empty() {
        chunks.push(trimmed.to_string());
    }
}
