//! `#literal` compilation.
//!
//! Three forms, tried in order:
//!
//! 1. **Emoji run** `#😀😃😄`: the text must consist solely of those emoji
//!    (`^[😀😃😄]+$`), tested against the raw text so emoji are never folded.
//! 2. **Closed** `#abc|xyz#`: the body is an unanchored pattern, so either
//!    literal may appear anywhere in the normalized text.
//! 3. **Open word list** `#abc|xyz`: every alternative is anchored on its own
//!    (`^abc$|^xyz$`), so the whole normalized text must equal one of them.
//!
//! Bodies of forms 2 and 3 are diacritic-folded and lower-cased to line up with
//! the normalized turn text. Literal bodies come from rule authors and are
//! allowed to carry pattern syntax (`#f[au]n[ck]y`); when the result does not
//! compile, the first run of `[a-z0-9|-]` is dropped and compilation retried,
//! and when that still fails the body is matched as escaped plain text.

use crate::TurnRequest;
use crate::normalize::replace_diacritics;
use regex::Regex;
use tracing::warn;

/// One compiled literal.
#[derive(Debug, Clone)]
pub struct RegexComparator {
    pub pattern: Regex,
    /// Test against `text(true)` instead of the raw text.
    pub use_normalized_text: bool,
}

impl RegexComparator {
    /// Compile a `#...` token. Never fails: malformed bodies degrade to a
    /// looser or fully escaped pattern.
    pub fn compile(token: &str) -> Self {
        let emoji = regex!(r"^#((?:[\u{2600}-\u{27BF}].?|[\u{1F1E6}-\u{1F1FF}]{2}|[\u{10000}-\u{10FFFF}])+)$");
        if let Some(caps) = emoji.captures(token) {
            return RegexComparator { pattern: emoji_run(&caps[1]), use_normalized_text: false };
        }

        let folded = replace_diacritics(token);
        let closed = regex!(r"^#(.+)#$");

        let pattern = if let Some(caps) = closed.captures(&folded) {
            let body = caps[1].to_lowercase();
            compile_tolerant(&body, || regex::escape(&body))
        } else {
            let body = folded.strip_prefix('#').unwrap_or(&folded[..]);
            let source = anchored_alternatives(body, |s| s.to_lowercase());
            compile_tolerant(&source, || anchored_alternatives(body, |s| regex::escape(&s.to_lowercase())))
        };

        RegexComparator { pattern, use_normalized_text: true }
    }

    pub fn matches<R: TurnRequest + ?Sized>(&self, req: &R) -> bool {
        self.pattern.is_match(&req.text(self.use_normalized_text))
    }
}

/// `^[<emoji set>]+$` over the distinct code points of `run`, in order of
/// first appearance.
fn emoji_run(run: &str) -> Regex {
    let mut class = String::new();
    let mut seen = Vec::new();
    for c in run.chars() {
        if !seen.contains(&c) {
            seen.push(c);
            class.push_str(&regex::escape(c.encode_utf8(&mut [0; 4])));
        }
    }
    compile_tolerant(&format!("^[{class}]+$"), || format!("^(?:{})+$", regex::escape(run)))
}

fn anchored_alternatives(body: &str, map: impl Fn(&str) -> String) -> String {
    body.split('|').map(|alt| format!("^{}$", map(alt))).collect::<Vec<_>>().join("|")
}

fn compile_tolerant(source: &str, escaped: impl FnOnce() -> String) -> Regex {
    if let Ok(re) = Regex::new(source) {
        return re;
    }

    let stripped = regex!(r"[a-z0-9|-]+").replace(source, "");
    if let Ok(re) = Regex::new(&stripped) {
        warn!(source, pattern = %stripped, "literal did not compile, using stripped pattern");
        return re;
    }

    let literal = escaped();
    match Regex::new(&literal) {
        Ok(re) => {
            warn!(source, pattern = %literal, "literal did not compile, matching it as plain text");
            re
        }
        Err(err) => {
            warn!(source, %err, "literal unusable, it will never match");
            regex!(r"\b\B").clone()
        }
    }
}
