//! Bracket link rewriting.
//!
//! `[Title]` in a page body becomes `<a href='/view/Title'>Title</a>`.
//! Only tokens whose inner text is a valid title match, so `[]`, `[a b]`
//! or `[[x]]`'s outer brackets are left as they are.

use super::title::TITLE_CHARS;
use regex::bytes::{Captures, Regex};
use std::{borrow::Cow, sync::LazyLock};

static RE_LINK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(r"\[([{TITLE_CHARS}]+)\]")).expect("link pattern is a valid regex")
});

/// Replace every `[Title]` token in `body` with an anchor to `/view/Title`.
///
/// Matches are non-overlapping and scanned left to right. The captured
/// text is inserted without escaping, which is sound only because the
/// title class contains no HTML metacharacters.
pub fn rewrite_links(body: &[u8]) -> Cow<'_, [u8]> {
    RE_LINK.replace_all(body, |caps: &Captures<'_>| {
        let title = &caps[1];
        let mut anchor = Vec::with_capacity(title.len() * 2 + 21);
        anchor.extend_from_slice(b"<a href='/view/");
        anchor.extend_from_slice(title);
        anchor.extend_from_slice(b"'>");
        anchor.extend_from_slice(title);
        anchor.extend_from_slice(b"</a>");
        anchor
    })
}
