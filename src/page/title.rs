//! Page title validation.
//!
//! A title is the page's identifier, its storage key and its URL path
//! segment all at once. It is interpolated unescaped into file paths and
//! link markup, so the character class below is the only thing keeping
//! `/`, `.`, `<` and friends out of both.

use regex::Regex;
use std::{fmt, sync::LazyLock};

/// Characters allowed in a title, as a regex class body.
///
/// Shared with the link pattern in `page::link`: only strings that pass
/// validation can ever be recognized as link targets.
pub const TITLE_CHARS: &str = "A-Za-z0-9";

static RE_VALID_TITLE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!("^[{TITLE_CHARS}]+$")).expect("title pattern is a valid regex")
});

/// Check whether `s` is a non-empty run of `[A-Za-z0-9]`.
#[inline]
pub fn is_valid_title(s: &str) -> bool {
    RE_VALID_TITLE.is_match(s)
}

/// A validated page title.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Title(String);

impl Title {
    /// Validate and wrap a title. Returns `None` for anything outside the class.
    pub fn parse(s: &str) -> Option<Self> {
        is_valid_title(s).then(|| Self(s.to_owned()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Title {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Title {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
