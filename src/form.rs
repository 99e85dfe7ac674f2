//! Submitted form decoding for the save route.
//!
//! Field values are returned as raw bytes: a page body is opaque, so a
//! `%FF` in the form must land on disk as the byte `0xFF`.
//!
//! | Content-Type                         | Fields read from          |
//! |--------------------------------------|---------------------------|
//! | `application/x-www-form-urlencoded`  | request body, then query  |
//! | `multipart/form-data; boundary=...`  | request body, then query  |
//! | absent, empty request body           | query                     |
//! | anything else with a request body    | rejected                  |

use std::borrow::Cow;
use thiserror::Error;

const URLENCODED: &str = "application/x-www-form-urlencoded";
const MULTIPART: &str = "multipart/form-data";

/// Form decoding errors.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum FormError {
    #[error("unsupported form content type `{0}`")]
    Unsupported(String),

    #[error("malformed multipart form: {0}")]
    Malformed(&'static str),
}

/// Look up `name` in a submitted form.
///
/// Values in the request body take precedence over the query string.
/// Returns `Ok(None)` when the field is absent from both.
pub fn field(
    content_type: Option<&str>,
    body: &[u8],
    query: &str,
    name: &str,
) -> Result<Option<Vec<u8>>, FormError> {
    let from_body = match content_type.map(media_type) {
        Some((kind, _)) if kind.eq_ignore_ascii_case(URLENCODED) => urlencoded_field(body, name),
        Some((kind, params)) if kind.eq_ignore_ascii_case(MULTIPART) => {
            let boundary = param(params, "boundary").ok_or(FormError::Malformed("no boundary"))?;
            multipart_field(body, boundary.as_bytes(), name)?
        }
        _ if body.is_empty() => None,
        Some((kind, _)) => return Err(FormError::Unsupported(kind.to_owned())),
        None => return Err(FormError::Unsupported("none".into())),
    };
    Ok(from_body.or_else(|| urlencoded_field(query.as_bytes(), name)))
}

/// Split `type/subtype; k=v; ...` into the media type and its parameters.
fn media_type(content_type: &str) -> (&str, &str) {
    let (kind, params) = content_type.split_once(';').unwrap_or((content_type, ""));
    (kind.trim(), params)
}

/// Find a `key=value` parameter, unquoting the value.
fn param<'a>(params: &'a str, key: &str) -> Option<&'a str> {
    params
        .split(';')
        .filter_map(|p| p.split_once('='))
        .find(|(k, _)| k.trim().eq_ignore_ascii_case(key))
        .map(|(_, v)| v.trim().trim_matches('"'))
        .filter(|v| !v.is_empty())
}

// ============================================================================
// application/x-www-form-urlencoded
// ============================================================================

fn urlencoded_field(form: &[u8], name: &str) -> Option<Vec<u8>> {
    form.split(|&b| b == b'&')
        .filter(|pair| !pair.is_empty())
        .map(|pair| match pair.iter().position(|&b| b == b'=') {
            Some(eq) => (&pair[..eq], &pair[eq + 1..]),
            None => (pair, &[][..]),
        })
        .find(|(key, _)| *decode_component(key) == *name.as_bytes())
        .map(|(_, value)| decode_component(value).into_owned())
}

/// Decode one urlencoded component: `+` is a space, `%XX` a raw byte.
fn decode_component(s: &[u8]) -> Cow<'_, [u8]> {
    if !s.iter().any(|&b| b == b'+' || b == b'%') {
        return Cow::Borrowed(s);
    }
    let spaced: Vec<u8> = s.iter().map(|&b| if b == b'+' { b' ' } else { b }).collect();
    Cow::Owned(urlencoding::decode_binary(&spaced).into_owned())
}

// ============================================================================
// multipart/form-data
// ============================================================================

fn multipart_field(
    body: &[u8],
    boundary: &[u8],
    name: &str,
) -> Result<Option<Vec<u8>>, FormError> {
    let delimiter = [&b"--"[..], boundary].concat();
    let mut rest = match find(body, &delimiter) {
        Some(start) => &body[start + delimiter.len()..],
        None => return Err(FormError::Malformed("missing boundary")),
    };

    loop {
        if rest.starts_with(b"--") {
            return Ok(None);
        }
        rest = strip_line_break(rest).ok_or(FormError::Malformed("bad boundary line"))?;

        let header_end = find(rest, b"\r\n\r\n").ok_or(FormError::Malformed("unterminated headers"))?;
        let headers = &rest[..header_end];
        let content = &rest[header_end + 4..];

        let closing = [&b"\r\n"[..], delimiter.as_slice()].concat();
        let content_end = find(content, &closing).ok_or(FormError::Malformed("unterminated part"))?;

        if part_name(headers).as_deref() == Some(name) {
            return Ok(Some(content[..content_end].to_vec()));
        }
        rest = &content[content_end + closing.len()..];
    }
}

/// `name` from a part's `Content-Disposition: form-data; name="..."` header.
fn part_name(headers: &[u8]) -> Option<String> {
    String::from_utf8_lossy(headers)
        .split("\r\n")
        .filter_map(|line| line.split_once(':'))
        .find(|(key, _)| key.trim().eq_ignore_ascii_case("content-disposition"))
        .and_then(|(_, value)| param(value, "name").map(str::to_owned))
}

fn strip_line_break(s: &[u8]) -> Option<&[u8]> {
    s.strip_prefix(b"\r\n").or_else(|| s.strip_prefix(b"\n"))
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack.windows(needle.len()).position(|w| w == needle)
}
