//! HTTP server for the wiki.
//!
//! Built on `tiny_http`: one listening server shared by a fixed pool of
//! worker threads, each pulling requests and handing them to the
//! [`Wiki`] router.
//!
//! # Architecture
//!
//! ```text
//!                 ┌──────────────────────┐
//!                 │  tiny_http::Server   │
//!                 └──────────┬───────────┘
//!          ┌─────────────────┼─────────────────┐
//!          ▼                 ▼                 ▼
//!    ┌──────────┐      ┌──────────┐      ┌──────────┐
//!    │ worker-0 │      │ worker-1 │  ... │ worker-N │
//!    └────┬─────┘      └────┬─────┘      └────┬─────┘
//!         └─────────────────┼─────────────────┘
//!                           ▼
//!                 Arc<Wiki<FsStore>>  (read-only)
//! ```
//!
//! Ctrl+C unblocks every worker; in-flight requests are not drained.

use crate::{
    config::Config,
    log,
    page::{FsStore, PageStore, Title},
    render::Templates,
    router::{Reply, Wiki},
    static_files::guess_content_type,
};
use anyhow::{Context, Result, anyhow};
use std::{
    fs,
    io::{self, Cursor, Read},
    net::SocketAddr,
    sync::Arc,
    thread,
};
use tiny_http::{Header, Request, Response, Server, StatusCode};

type Body = Cursor<Vec<u8>>;

/// Largest request body read into memory; larger requests get 413.
const MAX_BODY_BYTES: u64 = 10 << 20;

// ============================================================================
// Server Entry Point
// ============================================================================

/// Build the shared wiki state and serve until Ctrl+C.
///
/// This function:
/// 1. Creates the page directory and compiles the templates
/// 2. Binds to the configured interface and port
/// 3. Sets up the Ctrl+C handler
/// 4. Runs the worker pool and waits for it to drain
pub fn serve_wiki(config: &Config) -> Result<()> {
    let wiki = Arc::new(build_wiki(config)?);

    let interface: std::net::IpAddr = config.serve.interface.parse()?;
    let addr = SocketAddr::new(interface, config.serve.port);
    let server =
        Arc::new(Server::http(addr).map_err(|e| anyhow!("Failed to bind {addr}: {e}"))?);

    let workers = config.serve.workers;
    let server_for_signal = Arc::clone(&server);
    ctrlc::set_handler(move || {
        log!("serve"; "shutting down...");
        for _ in 0..workers {
            server_for_signal.unblock();
        }
    })
    .context("Failed to set Ctrl+C handler")?;

    log!("serve"; "http://{addr} ({workers} workers)");

    let handles = (0..workers)
        .map(|id| {
            let server = Arc::clone(&server);
            let wiki = Arc::clone(&wiki);
            thread::Builder::new()
                .name(format!("worker-{id}"))
                .spawn(move || run_worker(&server, &*wiki))
                .context("Failed to spawn worker thread")
        })
        .collect::<Result<Vec<_>>>()?;

    for handle in handles {
        handle
            .join()
            .map_err(|_| anyhow!("worker thread panicked"))?;
    }

    Ok(())
}

/// Assemble the read-only state shared by all workers.
fn build_wiki(config: &Config) -> Result<Wiki<FsStore>> {
    let store = FsStore::new(&config.wiki.data);
    if store.ensure_dir()? {
        log!("store"; "created {}", store.dir().display());
    }

    let templates = Templates::load(Some(config.wiki.templates.as_path()))?;
    let front_page = Title::parse(&config.wiki.front_page)
        .with_context(|| format!("Invalid front page `{}`", config.wiki.front_page))?;

    Ok(Wiki::new(
        store,
        templates,
        config.wiki.public.clone(),
        front_page,
    ))
}

/// Pull requests until the server is unblocked.
fn run_worker<S: PageStore>(server: &Server, wiki: &Wiki<S>) {
    for request in server.incoming_requests() {
        if let Err(e) = handle_request(request, wiki) {
            log!("error"; "request error: {e:#}");
        }
    }
}

// ============================================================================
// Request Handling
// ============================================================================

/// Handle a single HTTP request.
fn handle_request<S: PageStore>(mut request: Request, wiki: &Wiki<S>) -> Result<()> {
    let method = request.method().to_string();
    let url = request.url().to_owned();
    let content_type = request
        .headers()
        .iter()
        .find(|h| h.field.equiv("Content-Type"))
        .map(|h| h.value.as_str().to_owned());

    let reply = match read_body(request.as_reader(), MAX_BODY_BYTES)
        .context("Failed to read request body")?
    {
        Some(body) => wiki.handle(&url, content_type.as_deref(), &body),
        None => Reply::PayloadTooLarge,
    };
    if let Reply::ServerError(message) = &reply {
        log!("error"; "{method} {url}: {message}");
    }

    let response = into_response(reply);
    let status = response.status_code().0;
    request.respond(response)?;

    log!("serve"; "{method} {url} {status}");
    Ok(())
}

/// Read at most `limit` bytes. `None` means the body is longer than that.
fn read_body(reader: &mut dyn Read, limit: u64) -> io::Result<Option<Vec<u8>>> {
    let mut body = Vec::new();
    reader.take(limit + 1).read_to_end(&mut body)?;
    Ok((body.len() as u64 <= limit).then_some(body))
}

// ============================================================================
// Response Helpers
// ============================================================================
//
// Responses are built with `from_data` rather than `from_string`, which
// would add its own `text/plain` Content-Type next to ours.

/// Turn a router reply into an HTTP response.
fn into_response(reply: Reply) -> Response<Body> {
    match reply {
        Reply::Html(html) => html_response(html),
        Reply::Redirect(location) => redirect_response(&location),
        Reply::NotFound => text_response(404, "404 page not found\n".into()),
        Reply::BadRequest(message) => text_response(400, format!("{message}\n")),
        Reply::PayloadTooLarge => text_response(413, "request body too large\n".into()),
        Reply::UnsupportedMediaType(message) => text_response(415, format!("{message}\n")),
        Reply::ServerError(message) => text_response(500, format!("{message}\n")),
        Reply::File(path) => match fs::read(&path) {
            Ok(content) => Response::from_data(content)
                .with_header(header("Content-Type", guess_content_type(&path))),
            Err(err) => text_response(500, format!("Failed to read {}: {err}\n", path.display())),
        },
    }
}

fn html_response(html: String) -> Response<Body> {
    Response::from_data(html.into_bytes())
        .with_header(header("Content-Type", "text/html; charset=utf-8"))
}

/// 302 with a short HTML body, as browsers without redirect support expect.
fn redirect_response(location: &str) -> Response<Body> {
    Response::from_data(format!("<a href=\"{location}\">Found</a>.\n").into_bytes())
        .with_status_code(StatusCode(302))
        .with_header(header("Location", location))
        .with_header(header("Content-Type", "text/html; charset=utf-8"))
}

fn text_response(status: u16, text: String) -> Response<Body> {
    Response::from_data(text.into_bytes())
        .with_status_code(StatusCode(status))
        .with_header(header("Content-Type", "text/plain; charset=utf-8"))
        .with_header(header("X-Content-Type-Options", "nosniff"))
}

/// Build a header from ASCII parts.
///
/// Values are either constants or `/view/<title>`-style locations, and
/// titles are ASCII alphanumerics.
fn header(name: &'static str, value: &str) -> Header {
    Header::from_bytes(name, value).expect("header name and value are ASCII")
}
