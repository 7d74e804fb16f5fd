//! Pure text utilities: slugs, word counts and reading time.

use deunicode::deunicode;
use once_cell::sync::Lazy;
use pulldown_cmark::{Event, Parser, TagEnd};
use regex::Regex;

/// Average adult reading speed used for estimates
pub const WORDS_PER_MINUTE: u64 = 265;

static WORD: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b\w+\b").expect("word pattern is valid"));

/// Convert a title into a URL-safe slug.
///
/// The title is transliterated to ASCII first, so accented and non-Latin
/// letters keep contributing to the slug. Letters and digits are lowercased,
/// apostrophes are dropped and every other run of characters collapses into
/// a single `-`.
pub fn slugify(title: &str) -> String {
    let ascii = deunicode(title);
    let mut out = String::with_capacity(ascii.len());
    let mut pending_dash = false;

    for ch in ascii.chars() {
        if ch == '\'' {
            continue;
        }
        if ch.is_ascii_alphanumeric() {
            if pending_dash && !out.is_empty() {
                out.push('-');
            }
            pending_dash = false;
            out.push(ch.to_ascii_lowercase());
        } else {
            pending_dash = true;
        }
    }

    out
}

/// Number of `\w+` runs delimited by word boundaries
pub fn word_count(text: &str) -> u64 {
    WORD.find_iter(text).count() as u64
}

/// Estimated reading time of a markdown document, rounded up, never below one minute.
///
/// Only rendered text counts: link and image targets, emphasis markers and
/// raw HTML do not.
pub fn reading_time_minutes(markdown: &str) -> u64 {
    word_count(&rendered_text(markdown))
        .div_ceil(WORDS_PER_MINUTE)
        .max(1)
}

fn rendered_text(markdown: &str) -> String {
    let mut text = String::with_capacity(markdown.len());

    for event in Parser::new(markdown) {
        match event {
            Event::Text(t) | Event::Code(t) => text.push_str(&t),
            Event::SoftBreak | Event::HardBreak | Event::Rule => text.push(' '),
            Event::End(
                TagEnd::Paragraph { .. }
                | TagEnd::Heading { .. }
                | TagEnd::Item { .. }
                | TagEnd::CodeBlock { .. }
                | TagEnd::BlockQuote { .. }
                | TagEnd::TableCell { .. },
            ) => text.push(' '),
            _ => {}
        }
    }

    text
}
