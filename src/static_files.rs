//! Static file serving from the public directory.
//!
//! Resolution order for a request path:
//! 1. Any `..` component → 404
//! 2. Exact file match → serve file
//! 3. Directory with index.html → serve index.html
//! 4. Directory without index.html → generate listing
//! 5. Nothing found → 404

use crate::{render::html_escape, router::Reply};
use std::{
    fs,
    path::{Component, Path},
};

/// Directory listing HTML template (embedded at compile time)
const LISTING_TEMPLATE: &str = include_str!("embed/listing.html");

/// Resolve a decoded request path against `public`.
pub fn resolve(public: &Path, request_path: &str) -> Reply {
    let request_path = request_path.trim_matches('/');
    let relative = Path::new(request_path);

    if relative
        .components()
        .any(|c| !matches!(c, Component::Normal(_)))
    {
        return Reply::NotFound;
    }

    let local_path = public.join(relative);

    if local_path.is_file() {
        return Reply::File(local_path);
    }

    if local_path.is_dir() {
        let index_path = local_path.join("index.html");
        if index_path.is_file() {
            return Reply::File(index_path);
        }
        if let Ok(listing) = generate_directory_listing(&local_path, request_path) {
            return Reply::Html(listing);
        }
    }

    Reply::NotFound
}

/// Guess MIME content type from file extension.
///
/// Returns `application/octet-stream` for unknown extensions.
pub fn guess_content_type(path: &Path) -> &'static str {
    match path.extension().and_then(|e| e.to_str()) {
        // Web content
        Some("html" | "htm") => "text/html; charset=utf-8",
        Some("css") => "text/css; charset=utf-8",
        Some("js" | "mjs") => "application/javascript; charset=utf-8",
        Some("json") => "application/json; charset=utf-8",
        Some("xml") => "application/xml; charset=utf-8",

        // Images
        Some("svg") => "image/svg+xml",
        Some("png") => "image/png",
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        Some("ico") => "image/x-icon",

        // Fonts
        Some("woff") => "font/woff",
        Some("woff2") => "font/woff2",

        // Documents
        Some("pdf") => "application/pdf",
        Some("txt") => "text/plain; charset=utf-8",

        _ => "application/octet-stream",
    }
}

/// Generate an HTML listing of a directory, hidden entries excluded,
/// directories first, then alphabetical.
#[allow(clippy::literal_string_with_formatting_args)] // template placeholders, not format args
fn generate_directory_listing(dir_path: &Path, request_path: &str) -> std::io::Result<String> {
    let mut entries: Vec<(bool, String)> = fs::read_dir(dir_path)?
        .filter_map(Result::ok)
        .map(|entry| {
            let is_dir = entry.file_type().map(|t| t.is_dir()).unwrap_or(false);
            (is_dir, entry.file_name().to_string_lossy().into_owned())
        })
        .filter(|(_, name)| !name.starts_with('.'))
        .collect();
    entries.sort_by(|a, b| b.0.cmp(&a.0).then_with(|| a.1.cmp(&b.1)));

    let base = encode_path(request_path);
    let items: Vec<String> = entries
        .iter()
        .map(|(is_dir, name)| {
            let slash = if *is_dir { "/" } else { "" };
            let encoded = urlencoding::encode(name);
            let href = if base.is_empty() {
                format!("/{encoded}{slash}")
            } else {
                format!("/{base}/{encoded}{slash}")
            };
            format!(
                r#"<li><a href="{}">{}{slash}</a></li>"#,
                html_escape(&href),
                html_escape(name)
            )
        })
        .collect();

    let parent_link = if request_path.is_empty() {
        String::new()
    } else {
        let parent = Path::new(request_path)
            .parent()
            .map(|p| encode_path(&p.to_string_lossy()))
            .unwrap_or_default();
        format!(r#"<li><a href="/{}">..</a></li>"#, html_escape(&parent))
    };

    Ok(LISTING_TEMPLATE
        .replace("{path}", &html_escape(request_path))
        .replace("{parent_link}", &parent_link)
        .replace("{entries}", &items.join("\n    ")))
}

/// Percent-encode each `/`-separated segment of a relative path.
fn encode_path(path: &str) -> String {
    path.split('/')
        .map(urlencoding::encode)
        .collect::<Vec<_>>()
        .join("/")
}
