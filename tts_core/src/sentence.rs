//! Sentence splitting.
//!
//! Text is cut at whitespace that directly follows a terminator, so the
//! punctuation stays attached to the sentence it closes. A terminator that is
//! not followed by whitespace ("3.14", "a.m.", "http://") never splits.

/// Characters that may close a sentence.
pub const TERMINATORS: [char; 4] = ['.', '!', ':', '?'];

/// A sentence of the request text and its position in it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sentence {
    pub index: usize,
    pub text: String,
}

/// Split `text` into trimmed, non-empty sentences in order of appearance.
///
/// Blank input yields an empty vector; input without a terminator followed by
/// whitespace yields the whole trimmed text as a single sentence.
pub fn split_sentences(text: &str) -> Vec<String> {
    let text = text.trim();
    let mut sentences = Vec::new();
    let mut start = 0usize;
    let mut prev: Option<char> = None;
    let mut chars = text.char_indices().peekable();

    while let Some((i, c)) = chars.next() {
        if c.is_whitespace() && prev.is_some_and(|p| TERMINATORS.contains(&p)) {
            push_trimmed(&mut sentences, &text[start..i]);
            // Swallow the rest of the whitespace run
            let mut end = i + c.len_utf8();
            while let Some(&(j, w)) = chars.peek() {
                if !w.is_whitespace() {
                    break;
                }
                end = j + w.len_utf8();
                chars.next();
            }
            start = end;
            prev = None;
            continue;
        }
        prev = Some(c);
    }
    push_trimmed(&mut sentences, &text[start..]);

    sentences
}

/// Split `text` and number the resulting sentences from zero.
pub fn sentences(text: &str) -> Vec<Sentence> {
    split_sentences(text)
        .into_iter()
        .enumerate()
        .map(|(index, text)| Sentence { index, text })
        .collect()
}

fn push_trimmed(out: &mut Vec<String>, piece: &str) {
    let piece = piece.trim();
    if !piece.is_empty() {
        out.push(piece.to_string());
    }
}
