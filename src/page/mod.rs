//! Pages: titles, bodies, link rewriting and storage.

mod link;
mod store;
mod title;

pub use link::rewrite_links;
pub use store::{FsStore, PageStore, StoreError};
pub use title::{Title, is_valid_title};

use std::borrow::Cow;

/// One wiki document.
///
/// Built per request, either loaded from a [`PageStore`] or from a
/// submitted form; never cached.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page {
    pub title: Title,
    /// Raw body bytes, exactly as stored.
    pub body: Vec<u8>,
}

impl Page {
    pub fn new(title: Title, body: Vec<u8>) -> Self {
        Self { title, body }
    }

    /// A page with no body, used when editing a page that was never saved.
    pub fn empty(title: Title) -> Self {
        Self::new(title, Vec::new())
    }

    /// Body with `[Title]` tokens turned into anchors, for view mode.
    pub fn linked_body(&self) -> Cow<'_, [u8]> {
        rewrite_links(&self.body)
    }
}
