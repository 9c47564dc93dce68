//! Text folding shared by literal compilation and turn normalization.
//!
//! Literal bodies and the turn text must be folded the same way, otherwise an
//! accented literal (`#kůň`) could never match the normalized utterance.

use std::borrow::Cow;
use unicode_normalization::UnicodeNormalization;

/// Combining diacritical marks left behind by canonical decomposition.
fn is_diacritic(c: char) -> bool {
    matches!(c, '\u{0300}'..='\u{036F}')
}

/// Strip accents: decompose (NFD) and drop combining diacritical marks.
///
/// Other combining code points (variation selectors, emoji modifiers) are
/// kept so emoji sequences survive untouched.
pub fn replace_diacritics(text: &str) -> Cow<'_, str> {
    if text.is_ascii() {
        return Cow::Borrowed(text);
    }
    Cow::Owned(text.nfd().filter(|c| !is_diacritic(*c)).collect())
}

/// Normalized form of a turn's text, as returned by `text(true)`.
///
/// Folds diacritics, lower-cases, collapses every run of non-alphanumeric
/// characters into one `-` and trims leading/trailing dashes:
/// `"Word matčh!"` becomes `"word-match"`.
pub fn normalize_text(text: &str) -> String {
    let folded = replace_diacritics(text).to_lowercase();
    let mut out = String::with_capacity(folded.len());
    let mut pending_dash = false;

    for c in folded.chars() {
        if c.is_alphanumeric() {
            if pending_dash && !out.is_empty() {
                out.push('-');
            }
            pending_dash = false;
            out.push(c);
        } else {
            pending_dash = true;
        }
    }

    out
}
