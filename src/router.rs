//! Request routing: maps a request path to a page operation.
//!
//! | Path             | Operation                                        |
//! |------------------|--------------------------------------------------|
//! | `/`              | redirect to `/view/<front page>`                 |
//! | `/view/<title>`  | render page, or redirect to edit if never saved  |
//! | `/edit/<title>`  | render edit form (empty body if never saved)     |
//! | `/save/<title>`  | store form field `body`, redirect to view        |
//! | anything else    | static file from the public directory            |
//!
//! The router is transport-agnostic: it takes a URL, the request's
//! Content-Type and body, and returns a [`Reply`], which `serve` turns into
//! an HTTP response. Any method is accepted on every route.

use crate::{
    form::{self, FormError},
    log,
    page::{Page, PageStore, StoreError, Title},
    render::{Mode, Templates},
    static_files,
};
use std::path::PathBuf;

const VIEW_PREFIX: &str = "/view/";
const EDIT_PREFIX: &str = "/edit/";
const SAVE_PREFIX: &str = "/save/";

/// Form field holding the submitted page body.
const BODY_FIELD: &str = "body";

// ============================================================================
// Routes & Replies
// ============================================================================

/// A request path, split into its operation and raw (unvalidated) title.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route<'a> {
    Root,
    View(&'a str),
    Edit(&'a str),
    Save(&'a str),
    Static(&'a str),
}

impl<'a> Route<'a> {
    /// Classify a decoded path. The title is everything after the
    /// fixed-length prefix, including any further slashes.
    pub fn parse(path: &'a str) -> Self {
        if path == "/" {
            return Self::Root;
        }
        if let Some(title) = path.strip_prefix(VIEW_PREFIX) {
            Self::View(title)
        } else if let Some(title) = path.strip_prefix(EDIT_PREFIX) {
            Self::Edit(title)
        } else if let Some(title) = path.strip_prefix(SAVE_PREFIX) {
            Self::Save(title)
        } else {
            Self::Static(path)
        }
    }
}

/// Outcome of handling one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    /// 200 with an HTML document.
    Html(String),
    /// 302 to the given location.
    Redirect(String),
    /// 404.
    NotFound,
    /// 400 for a form that could not be decoded.
    BadRequest(String),
    /// 413 for a request body over the size limit.
    PayloadTooLarge,
    /// 415 for a form body in an encoding the save route does not read.
    UnsupportedMediaType(String),
    /// 500 carrying the failure description.
    ServerError(String),
    /// 200 with the contents of a static file.
    File(PathBuf),
}

impl Reply {
    fn view(title: &Title) -> Self {
        Self::Redirect(format!("{VIEW_PREFIX}{title}"))
    }

    fn edit(title: &Title) -> Self {
        Self::Redirect(format!("{EDIT_PREFIX}{title}"))
    }
}

impl From<FormError> for Reply {
    fn from(err: FormError) -> Self {
        match err {
            FormError::Unsupported(_) => Self::UnsupportedMediaType(err.to_string()),
            FormError::Malformed(_) => Self::BadRequest(err.to_string()),
        }
    }
}

// ============================================================================
// Wiki
// ============================================================================

/// Everything a request handler needs, built once at startup and shared
/// read-only between workers.
#[derive(Debug)]
pub struct Wiki<S> {
    store: S,
    templates: Templates,
    public: PathBuf,
    front_page: Title,
}

impl<S: PageStore> Wiki<S> {
    pub fn new(store: S, templates: Templates, public: PathBuf, front_page: Title) -> Self {
        Self {
            store,
            templates,
            public,
            front_page,
        }
    }

    /// Handle one request.
    ///
    /// `url` is the raw request target (path plus optional query string);
    /// `body` is the raw request body, decoded per `content_type` on save.
    pub fn handle(&self, url: &str, content_type: Option<&str>, body: &[u8]) -> Reply {
        let (path, query) = url.split_once('?').unwrap_or((url, ""));
        let Ok(path) = urlencoding::decode(path) else {
            return Reply::NotFound;
        };

        match Route::parse(&path) {
            Route::Root => Reply::view(&self.front_page),
            Route::View(raw) => with_title(raw, |title| self.view(title)),
            Route::Edit(raw) => with_title(raw, |title| self.edit(title)),
            Route::Save(raw) => with_title(raw, |title| {
                match form::field(content_type, body, query, BODY_FIELD) {
                    Ok(submitted) => self.save(title, submitted.unwrap_or_default()),
                    Err(err) => {
                        log!("serve"; "rejected form for {title}: {err}");
                        err.into()
                    }
                }
            }),
            Route::Static(path) => static_files::resolve(&self.public, path),
        }
    }

    fn view(&self, title: Title) -> Reply {
        match self.store.load(&title) {
            Ok(page) => self.render(Mode::View, &page),
            Err(StoreError::NotFound(_)) => Reply::edit(&title),
            Err(err) => Reply::ServerError(err.to_string()),
        }
    }

    fn edit(&self, title: Title) -> Reply {
        let page = match self.store.load(&title) {
            Ok(page) => page,
            Err(StoreError::NotFound(title)) => Page::empty(title),
            Err(err) => return Reply::ServerError(err.to_string()),
        };
        self.render(Mode::Edit, &page)
    }

    fn save(&self, title: Title, body: Vec<u8>) -> Reply {
        let page = Page::new(title, body);
        match self.store.save(&page) {
            Ok(()) => Reply::view(&page.title),
            Err(err) => Reply::ServerError(err.to_string()),
        }
    }

    fn render(&self, mode: Mode, page: &Page) -> Reply {
        match self.templates.render(mode, page) {
            Ok(html) => Reply::Html(html),
            Err(err) => Reply::ServerError(err.to_string()),
        }
    }
}

/// Validate `raw` and run `handler`, or reply 404 without touching storage.
fn with_title(raw: &str, handler: impl FnOnce(Title) -> Reply) -> Reply {
    match Title::parse(raw) {
        Some(title) => handler(title),
        None => {
            log!("serve"; "rejected title {raw:?}");
            Reply::NotFound
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::page::FsStore;
    use std::{
        collections::HashMap,
        fs, io,
        sync::{
            Mutex,
            atomic::{AtomicUsize, Ordering},
        },
    };
    use tempfile::TempDir;

    const FORM: Option<&str> = Some("application/x-www-form-urlencoded");

    /// In-memory store that counts every access.
    #[derive(Default)]
    struct RecordingStore {
        pages: Mutex<HashMap<String, Vec<u8>>>,
        loads: AtomicUsize,
        saves: AtomicUsize,
        fail: bool,
    }

    impl RecordingStore {
        fn failing() -> Self {
            Self {
                fail: true,
                ..Self::default()
            }
        }

        fn accesses(&self) -> usize {
            self.loads.load(Ordering::SeqCst) + self.saves.load(Ordering::SeqCst)
        }

        fn io_error() -> StoreError {
            StoreError::Io(
                PathBuf::from("data/X.txt"),
                io::Error::new(io::ErrorKind::PermissionDenied, "permission denied"),
            )
        }
    }

    impl PageStore for RecordingStore {
        fn load(&self, title: &Title) -> Result<Page, StoreError> {
            self.loads.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(Self::io_error());
            }
            match self.pages.lock().unwrap().get(title.as_str()) {
                Some(body) => Ok(Page::new(title.clone(), body.clone())),
                None => Err(StoreError::NotFound(title.clone())),
            }
        }

        fn save(&self, page: &Page) -> Result<(), StoreError> {
            self.saves.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(Self::io_error());
            }
            self.pages
                .lock()
                .unwrap()
                .insert(page.title.to_string(), page.body.clone());
            Ok(())
        }
    }

    fn wiki_with<S: PageStore>(store: S) -> Wiki<S> {
        Wiki::new(
            store,
            Templates::load(None).unwrap(),
            PathBuf::from("/nonexistent/public"),
            Title::parse("Home").unwrap(),
        )
    }

    fn wiki() -> Wiki<RecordingStore> {
        wiki_with(RecordingStore::default())
    }

    fn html(reply: Reply) -> String {
        match reply {
            Reply::Html(html) => html,
            other => panic!("expected html, got {other:?}"),
        }
    }

    // ------------------------------------------------------------------------
    // Route::parse
    // ------------------------------------------------------------------------

    #[test]
    fn test_route_parse() {
        assert_eq!(Route::parse("/"), Route::Root);
        assert_eq!(Route::parse("/view/Home"), Route::View("Home"));
        assert_eq!(Route::parse("/edit/Home"), Route::Edit("Home"));
        assert_eq!(Route::parse("/save/Home"), Route::Save("Home"));
        assert_eq!(Route::parse("/view/a/b"), Route::View("a/b"));
        assert_eq!(Route::parse("/view/"), Route::View(""));
        assert_eq!(Route::parse("/view"), Route::Static("/view"));
        assert_eq!(Route::parse("/style.css"), Route::Static("/style.css"));
    }

    // ------------------------------------------------------------------------
    // Root
    // ------------------------------------------------------------------------

    #[test]
    fn test_root_redirects_to_front_page() {
        let wiki = wiki();
        assert_eq!(wiki.handle("/", None, b""), Reply::Redirect("/view/Home".into()));
        assert_eq!(wiki.handle("/?x=1", None, b""), Reply::Redirect("/view/Home".into()));
        assert_eq!(wiki.store.accesses(), 0);
    }

    // ------------------------------------------------------------------------
    // View / Edit
    // ------------------------------------------------------------------------

    #[test]
    fn test_view_missing_redirects_to_edit() {
        let wiki = wiki();
        assert_eq!(
            wiki.handle("/view/Ghost", None, b""),
            Reply::Redirect("/edit/Ghost".into())
        );
        assert_eq!(wiki.store.saves.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_edit_missing_shows_empty_form_without_saving() {
        let wiki = wiki();
        let page = html(wiki.handle("/edit/Ghost", None, b""));

        assert!(page.contains("<h1>Editing Ghost</h1>"));
        assert!(page.contains("cols=\"80\"></textarea>"));
        assert_eq!(wiki.store.saves.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_edit_existing_shows_raw_body() {
        let wiki = wiki();
        wiki.handle("/save/Notes", FORM, b"body=see+%5BFoo%5D");

        let page = html(wiki.handle("/edit/Notes", None, b""));
        assert!(page.contains(">see [Foo]</textarea>"));
        assert!(!page.contains("/view/Foo"));
    }

    #[test]
    fn test_view_load_error_is_server_error() {
        let wiki = wiki_with(RecordingStore::failing());
        let reply = wiki.handle("/view/Home", None, b"");

        assert!(matches!(reply, Reply::ServerError(msg) if msg.contains("permission denied")));
    }

    #[test]
    fn test_edit_load_error_is_server_error() {
        let wiki = wiki_with(RecordingStore::failing());
        assert!(matches!(
            wiki.handle("/edit/Home", None, b""),
            Reply::ServerError(_)
        ));
    }

    #[test]
    fn test_view_non_utf8_page_is_render_error() {
        let wiki = wiki();
        wiki.store
            .pages
            .lock()
            .unwrap()
            .insert("Bin".into(), vec![0xff, 0xfe]);

        let reply = wiki.handle("/view/Bin", None, b"");
        assert!(matches!(reply, Reply::ServerError(msg) if msg.contains("UTF-8")));
    }

    // ------------------------------------------------------------------------
    // Save
    // ------------------------------------------------------------------------

    #[test]
    fn test_save_redirects_to_view() {
        let wiki = wiki();
        assert_eq!(
            wiki.handle("/save/Test", FORM, b"body=hello"),
            Reply::Redirect("/view/Test".into())
        );
        assert_eq!(wiki.store.pages.lock().unwrap()["Test"], b"hello");
    }

    #[test]
    fn test_save_decodes_form() {
        let wiki = wiki();
        wiki.handle("/save/Test", FORM, b"other=1&body=a+b%26c%0D%0Ad%C3%A9");
        assert_eq!(
            wiki.store.pages.lock().unwrap()["Test"],
            "a b&c\r\nd\u{e9}".as_bytes()
        );
    }

    #[test]
    fn test_save_missing_field_stores_empty_body() {
        let wiki = wiki();
        assert_eq!(
            wiki.handle("/save/Blank", None, b""),
            Reply::Redirect("/view/Blank".into())
        );
        assert!(wiki.store.pages.lock().unwrap()["Blank"].is_empty());
    }

    #[test]
    fn test_save_falls_back_to_query_string() {
        let wiki = wiki();
        wiki.handle("/save/Q?body=from+query", None, b"");
        assert_eq!(wiki.store.pages.lock().unwrap()["Q"], b"from query");
    }

    #[test]
    fn test_save_prefers_body_over_query() {
        let wiki = wiki();
        wiki.handle("/save/Q?body=query", FORM, b"body=form");
        assert_eq!(wiki.store.pages.lock().unwrap()["Q"], b"form");
    }

    #[test]
    fn test_save_keeps_undecodable_bytes() {
        let wiki = wiki();
        wiki.handle("/save/Raw", FORM, b"body=%FFab");
        assert_eq!(wiki.store.pages.lock().unwrap()["Raw"], [0xff, b'a', b'b']);
    }

    #[test]
    fn test_save_multipart_form() {
        let wiki = wiki();
        let body = b"--XyZ\r\n\
            Content-Disposition: form-data; name=\"body\"\r\n\r\n\
            hello\r\n\
            --XyZ--\r\n";

        assert_eq!(
            wiki.handle("/save/Test", Some("multipart/form-data; boundary=XyZ"), body),
            Reply::Redirect("/view/Test".into())
        );
        assert_eq!(wiki.store.pages.lock().unwrap()["Test"], b"hello");
    }

    #[test]
    fn test_save_malformed_multipart_is_bad_request() {
        let wiki = wiki();
        let reply = wiki.handle(
            "/save/Test",
            Some("multipart/form-data; boundary=XyZ"),
            b"--XyZ\r\nContent-Disposition: form-data; name=\"body\"\r\n\r\nhello",
        );

        assert!(matches!(reply, Reply::BadRequest(_)));
        assert_eq!(wiki.store.saves.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_save_unsupported_content_type_is_rejected() {
        let wiki = wiki();
        for content_type in [Some("application/json"), Some("text/plain"), None] {
            let reply = wiki.handle("/save/Test", content_type, b"body=x");
            assert!(
                matches!(reply, Reply::UnsupportedMediaType(_)),
                "{content_type:?}: {reply:?}"
            );
        }
        assert_eq!(wiki.store.saves.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_save_failure_is_server_error() {
        let wiki = wiki_with(RecordingStore::failing());
        let reply = wiki.handle("/save/Test", FORM, b"body=x");

        assert!(matches!(reply, Reply::ServerError(msg) if msg.contains("data/X.txt")));
    }

    // ------------------------------------------------------------------------
    // Invalid titles
    // ------------------------------------------------------------------------

    #[test]
    fn test_invalid_title_is_not_found_without_storage_access() {
        let wiki = wiki();
        for url in [
            "/view/a/b",
            "/edit/a/b",
            "/save/a/b",
            "/view/",
            "/edit/a%2Fb",
            "/save/..%2Fetc",
            "/view/a b",
            "/view/%3Cscript%3E",
        ] {
            assert_eq!(wiki.handle(url, FORM, b"body=x"), Reply::NotFound, "{url}");
        }
        assert_eq!(wiki.store.accesses(), 0);
    }

    // ------------------------------------------------------------------------
    // Static fallthrough
    // ------------------------------------------------------------------------

    #[test]
    fn test_other_paths_fall_through_to_static() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("style.css"), "body {}").unwrap();
        let wiki = Wiki::new(
            RecordingStore::default(),
            Templates::load(None).unwrap(),
            dir.path().to_path_buf(),
            Title::parse("Home").unwrap(),
        );

        assert_eq!(
            wiki.handle("/style.css?v=2", None, b""),
            Reply::File(dir.path().join("style.css"))
        );
        assert_eq!(wiki.handle("/missing.js", None, b""), Reply::NotFound);
        assert_eq!(wiki.store.accesses(), 0);
    }

    // ------------------------------------------------------------------------
    // End to end over the filesystem store
    // ------------------------------------------------------------------------

    #[test]
    fn test_save_then_view_renders_links_to_unsaved_pages() {
        let dir = TempDir::new().unwrap();
        let wiki = wiki_with(FsStore::new(dir.path()));

        assert_eq!(
            wiki.handle("/save/Link", FORM, b"body=%5BGhost%5D"),
            Reply::Redirect("/view/Link".into())
        );
        assert_eq!(fs::read(dir.path().join("Link.txt")).unwrap(), b"[Ghost]");

        let page = html(wiki.handle("/view/Link", None, b""));
        assert!(page.contains("<a href='/view/Ghost'>Ghost</a>"));
        assert!(!dir.path().join("Ghost.txt").exists());
    }

    #[test]
    fn test_ghost_view_then_edit() {
        let dir = TempDir::new().unwrap();
        let wiki = wiki_with(FsStore::new(dir.path()));

        let Reply::Redirect(location) = wiki.handle("/view/Ghost", None, b"") else {
            panic!("expected redirect");
        };
        assert_eq!(location, "/edit/Ghost");

        let page = html(wiki.handle(&location, None, b""));
        assert!(page.contains("cols=\"80\"></textarea>"));
        assert!(!dir.path().join("Ghost.txt").exists());
    }

    #[test]
    fn test_invalid_title_never_writes_outside_store() {
        let dir = TempDir::new().unwrap();
        let data = dir.path().join("data");
        fs::create_dir(&data).unwrap();
        let wiki = wiki_with(FsStore::new(&data));

        assert_eq!(wiki.handle("/save/..%2Fescape", FORM, b"body=x"), Reply::NotFound);
        assert!(!dir.path().join("escape.txt").exists());
        assert_eq!(fs::read_dir(&data).unwrap().count(), 0);
    }
}
