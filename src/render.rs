//! HTML rendering of pages in view and edit mode.
//!
//! Two templates, `view` and `edit`, each with `{title}` and `{body}`
//! placeholders. Defaults are embedded at compile time; a templates
//! directory containing `view.html` / `edit.html` overrides them.
//!
//! Templates are compiled once at startup into literal and field
//! segments, so a typo such as `{bdy}` fails at startup instead of
//! leaking into every response.
//!
//! | Field     | view mode                 | edit mode        |
//! |-----------|---------------------------|------------------|
//! | `{title}` | escaped                   | escaped          |
//! | `{body}`  | link-rewritten, verbatim  | raw, escaped     |

use crate::page::Page;
use regex::Regex;
use std::{
    borrow::Cow,
    fmt, fs, io,
    path::{Path, PathBuf},
    sync::LazyLock,
};
use thiserror::Error;

/// Default view template (embedded at compile time)
const VIEW_TEMPLATE: &str = include_str!("embed/view.html");

/// Default edit template (embedded at compile time)
const EDIT_TEMPLATE: &str = include_str!("embed/edit.html");

static RE_PLACEHOLDER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{([a-z_]+)\}").expect("placeholder pattern is a valid regex"));

/// Rendering errors.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("template `{template}`: unknown field `{{{field}}}`")]
    UnknownField { template: Mode, field: String },

    #[error("IO error when reading template `{0}`")]
    Io(PathBuf, #[source] io::Error),

    #[error("page `{0}` is not valid UTF-8")]
    InvalidUtf8(String),
}

/// Which template to render a page with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    View,
    Edit,
}

impl Mode {
    pub const fn name(self) -> &'static str {
        match self {
            Self::View => "view",
            Self::Edit => "edit",
        }
    }

    const fn default_source(self) -> &'static str {
        match self {
            Self::View => VIEW_TEMPLATE,
            Self::Edit => EDIT_TEMPLATE,
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    Title,
    Body,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Text(String),
    Field(Field),
}

/// A compiled template.
#[derive(Debug, Clone)]
struct Template {
    segments: Vec<Segment>,
}

impl Template {
    fn compile(mode: Mode, source: &str) -> Result<Self, RenderError> {
        let mut segments = Vec::new();
        let mut last = 0;

        for caps in RE_PLACEHOLDER.captures_iter(source) {
            let whole = caps.get(0).expect("group 0 always participates");
            let field = match &caps[1] {
                "title" => Field::Title,
                "body" => Field::Body,
                other => {
                    return Err(RenderError::UnknownField {
                        template: mode,
                        field: other.to_owned(),
                    });
                }
            };
            if whole.start() > last {
                segments.push(Segment::Text(source[last..whole.start()].to_owned()));
            }
            segments.push(Segment::Field(field));
            last = whole.end();
        }
        if last < source.len() {
            segments.push(Segment::Text(source[last..].to_owned()));
        }

        Ok(Self { segments })
    }

    fn execute(&self, title: &str, body: &str) -> String {
        let mut out = String::with_capacity(self.size_hint() + body.len());
        for segment in &self.segments {
            match segment {
                Segment::Text(text) => out.push_str(text),
                Segment::Field(Field::Title) => out.push_str(title),
                Segment::Field(Field::Body) => out.push_str(body),
            }
        }
        out
    }

    fn size_hint(&self) -> usize {
        self.segments
            .iter()
            .map(|s| match s {
                Segment::Text(text) => text.len(),
                Segment::Field(_) => 16,
            })
            .sum()
    }
}

/// The compiled `view` and `edit` templates.
#[derive(Debug, Clone)]
pub struct Templates {
    view: Template,
    edit: Template,
}

impl Templates {
    /// Compile templates, preferring `<dir>/view.html` and `<dir>/edit.html`
    /// over the embedded defaults when they exist.
    pub fn load(dir: Option<&Path>) -> Result<Self, RenderError> {
        Ok(Self {
            view: Self::load_one(dir, Mode::View)?,
            edit: Self::load_one(dir, Mode::Edit)?,
        })
    }

    fn load_one(dir: Option<&Path>, mode: Mode) -> Result<Template, RenderError> {
        let path = dir.map(|d| d.join(format!("{}.html", mode.name())));
        match path {
            Some(path) if path.is_file() => {
                let source =
                    fs::read_to_string(&path).map_err(|err| RenderError::Io(path.clone(), err))?;
                Template::compile(mode, &source)
            }
            _ => Template::compile(mode, mode.default_source()),
        }
    }

    /// Render `page` as an HTML document.
    pub fn render(&self, mode: Mode, page: &Page) -> Result<String, RenderError> {
        let title = html_escape(page.title.as_str());
        match mode {
            Mode::View => {
                let linked = page.linked_body();
                let body = as_utf8(&linked, page)?;
                Ok(self.view.execute(&title, body))
            }
            Mode::Edit => {
                let body = as_utf8(&page.body, page)?;
                Ok(self.edit.execute(&title, &html_escape(body)))
            }
        }
    }
}

fn as_utf8<'a>(bytes: &'a [u8], page: &Page) -> Result<&'a str, RenderError> {
    std::str::from_utf8(bytes).map_err(|_| RenderError::InvalidUtf8(page.title.to_string()))
}

/// Escape HTML special characters.
///
/// Uses `Cow` to avoid allocation when no escaping is needed.
#[inline]
pub fn html_escape(s: &str) -> Cow<'_, str> {
    if !s.contains(['<', '>', '&', '"', '\'']) {
        return Cow::Borrowed(s);
    }

    let mut result = String::with_capacity(s.len() + 16);
    for c in s.chars() {
        match c {
            '<' => result.push_str("&lt;"),
            '>' => result.push_str("&gt;"),
            '&' => result.push_str("&amp;"),
            '"' => result.push_str("&#34;"),
            '\'' => result.push_str("&#39;"),
            _ => result.push(c),
        }
    }
    Cow::Owned(result)
}
