//! Sentence-unit splitting for finalized recognizer results.
//!
//! Finalized utterances are persisted and broadcast one sentence at a time
//! so that translation and synthesis stay responsive on long monologues.

/// Characters that end a sentence unit.
const TERMINALS: [char; 3] = ['.', '!', '?'];

/// Quote characters that may trail terminal punctuation and belong to the
/// sentence they close (`He said "stop."`).
const TRAILING_QUOTES: [char; 6] = ['"', '\'', '\u{201d}', '\u{2019}', ')', ']'];

/// Split text into sentence units on terminal punctuation.
///
/// A run of terminal punctuation (`?!`, `...`) and any closing quotes or
/// brackets stay attached to the unit they end. Text after the last
/// terminal (a trailing fragment without punctuation) is kept as a final
/// unit — recognizer finals are never dropped on formatting grounds.
#[must_use]
pub fn split_sentence_units(text: &str) -> Vec<String> {
    let mut units = Vec::new();
    let mut current = String::new();
    let mut chars = text.chars().peekable();

    while let Some(c) = chars.next() {
        current.push(c);
        if TERMINALS.contains(&c) {
            // Absorb "?!", "..." and closing quotes into this unit.
            while let Some(&next) = chars.peek() {
                if TERMINALS.contains(&next) || TRAILING_QUOTES.contains(&next) {
                    current.push(next);
                    chars.next();
                } else {
                    break;
                }
            }
            push_unit(&mut units, &current);
            current.clear();
        }
    }

    push_unit(&mut units, &current);
    units
}

fn push_unit(units: &mut Vec<String>, raw: &str) {
    let trimmed = raw.trim();
    if !trimmed.is_empty() {
        units.push(trimmed.to_string());
    }
}
