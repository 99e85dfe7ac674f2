//! `[wiki]` section configuration.
//!
//! Where pages, static files and template overrides live.

use super::defaults;
use educe::Educe;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// `[wiki]` section in wiki.toml.
///
/// # Example
/// ```toml
/// [wiki]
/// data = "pages"          # one <title>.txt per page
/// public = "static"       # served for any non-page path
/// templates = "tmpl"      # optional view.html / edit.html overrides
/// front_page = "Index"    # target of the `/` redirect
/// ```
#[derive(Debug, Clone, Educe, Serialize, Deserialize)]
#[educe(Default)]
#[serde(deny_unknown_fields)]
pub struct WikiConfig {
    /// Page storage directory.
    #[serde(default = "defaults::wiki::data")]
    #[educe(Default = defaults::wiki::data())]
    pub data: PathBuf,

    /// Static file directory.
    #[serde(default = "defaults::wiki::public")]
    #[educe(Default = defaults::wiki::public())]
    pub public: PathBuf,

    /// Template override directory. Missing files fall back to the
    /// embedded templates.
    #[serde(default = "defaults::wiki::templates")]
    #[educe(Default = defaults::wiki::templates())]
    pub templates: PathBuf,

    /// Page that `/` redirects to. Must be a valid title.
    #[serde(default = "defaults::wiki::front_page")]
    #[educe(Default = defaults::wiki::front_page())]
    pub front_page: String,
}
