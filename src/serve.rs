//! Local preview server
//!
//! Serves the output directory over HTTP and, when watching, rebuilds the
//! site after source changes. A failed rebuild is logged and the previous
//! output keeps being served.

use std::io;
use std::path::{Component, Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use percent_encoding::percent_decode_str;
use tiny_http::{Header, Request, Response, Server};

use crate::error::FolioResult;
use crate::events::BuildEventSink;
use crate::fs::FileSystem;
use crate::site::Site;
use crate::watcher::SourceWatcher;

const POLL_INTERVAL: Duration = Duration::from_millis(50);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServeOptions {
    pub host: String,
    pub port: u16,
    pub watch: bool,
}

/// Build once, then serve until `running` is cleared.
pub fn serve(
    site: &Site,
    options: &ServeOptions,
    fs: &dyn FileSystem,
    events: &dyn BuildEventSink,
    running: Arc<AtomicBool>,
) -> FolioResult<()> {
    site.build(fs, events)?;

    let output = site.output_dir();
    let addr = format!("{}:{}", options.host, options.port);
    let server = Server::http(&addr).map_err(|e| io::Error::other(format!("{addr}: {e}")))?;
    tracing::info!(url = %format!("http://{addr}/"), output = %output.display(), "serving site");

    let mut watcher = if options.watch {
        Some(SourceWatcher::start(site.source(), &output)?)
    } else {
        None
    };

    while running.load(Ordering::SeqCst) {
        match server.recv_timeout(POLL_INTERVAL) {
            Ok(Some(request)) => handle(request, &output),
            Ok(None) => {}
            Err(e) => tracing::warn!(error = %e, "failed to receive request"),
        }

        if let Some(changes) = watcher.as_mut().and_then(|w| w.poll(Duration::ZERO)) {
            tracing::info!(changed = changes.len(), "source changed, rebuilding");
            if let Err(e) = site.build(fs, events) {
                tracing::warn!(error = %e, "rebuild failed; serving previous output");
            }
        }
    }

    tracing::info!("server stopped");
    Ok(())
}

fn handle(request: Request, root: &Path) {
    let url = request.url().to_string();
    let result = match resolve(root, &url) {
        Some(path) => match std::fs::read(&path) {
            Ok(body) => {
                let mut response = Response::from_data(body);
                if let Some(header) = content_type(&path) {
                    response = response.with_header(header);
                }
                request.respond(response)
            }
            Err(_) => request.respond(not_found()),
        },
        None => request.respond(not_found()),
    };

    if let Err(e) = result {
        tracing::debug!(%url, error = %e, "failed to send response");
    } else {
        tracing::trace!(%url, "served");
    }
}

fn not_found() -> Response<io::Cursor<Vec<u8>>> {
    Response::from_string("404 Not Found").with_status_code(404)
}

/// Map a request URL to a file under `root`.
///
/// Returns `None` for URLs that would leave `root` or name nothing.
pub fn resolve(root: &Path, url: &str) -> Option<PathBuf> {
    let path = url.split(['?', '#']).next().unwrap_or("");
    let decoded = percent_decode_str(path).decode_utf8().ok()?;

    let mut relative = PathBuf::new();
    for component in Path::new(decoded.trim_start_matches('/')).components() {
        match component {
            Component::Normal(part) => relative.push(part),
            Component::CurDir => {}
            _ => return None,
        }
    }

    let mut target = root.join(relative);
    if decoded.ends_with('/') || target.is_dir() {
        target.push("index.html");
    }
    target.is_file().then_some(target)
}

fn content_type(path: &Path) -> Option<Header> {
    let mime = match path.extension().and_then(|e| e.to_str()).unwrap_or("") {
        "html" | "htm" => "text/html; charset=utf-8",
        "css" => "text/css; charset=utf-8",
        "js" => "text/javascript; charset=utf-8",
        "json" => "application/json",
        "xml" => "application/xml",
        "txt" => "text/plain; charset=utf-8",
        "svg" => "image/svg+xml",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "ico" => "image/x-icon",
        "woff" => "font/woff",
        "woff2" => "font/woff2",
        "pdf" => "application/pdf",
        _ => "application/octet-stream",
    };
    Header::from_bytes("Content-Type", mime).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn site_root() -> tempfile::TempDir {
        let dir = tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("tags/unit testing")).unwrap();
        std::fs::write(dir.path().join("index.html"), "home").unwrap();
        std::fs::write(dir.path().join("tags/unit testing/index.html"), "tag").unwrap();
        dir
    }

    #[test]
    fn resolve_directory_to_index() {
        let dir = site_root();
        assert_eq!(resolve(dir.path(), "/"), Some(dir.path().join("index.html")));
        assert_eq!(
            resolve(dir.path(), "/tags/unit%20testing/"),
            Some(dir.path().join("tags/unit testing/index.html"))
        );
        assert_eq!(
            resolve(dir.path(), "/tags/unit%20testing?x=1"),
            Some(dir.path().join("tags/unit testing/index.html"))
        );
    }

    #[test]
    fn resolve_rejects_traversal() {
        let dir = site_root();
        assert_eq!(resolve(dir.path(), "/../secret"), None);
        assert_eq!(resolve(dir.path(), "/%2e%2e/secret"), None);
    }

    #[test]
    fn resolve_missing_is_none() {
        let dir = site_root();
        assert_eq!(resolve(dir.path(), "/nope.html"), None);
    }

    #[test]
    fn serve_builds_then_stops_when_not_running() {
        let dir = tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("_posts")).unwrap();
        let site = Site::new(dir.path(), crate::config::Config::default());
        let options = ServeOptions {
            host: "127.0.0.1".into(),
            port: 0,
            watch: false,
        };

        serve(
            &site,
            &options,
            &crate::fs::LocalFs::new(),
            &crate::events::NoopEventSink,
            Arc::new(AtomicBool::new(false)),
        )
        .unwrap();
        assert!(dir.path().join("_site/index.html").is_file());
    }

    #[test]
    fn content_type_by_extension() {
        let header = content_type(Path::new("a/b.css")).unwrap();
        assert_eq!(header.value.as_str(), "text/css; charset=utf-8");
        let header = content_type(Path::new("a/b.unknown")).unwrap();
        assert_eq!(header.value.as_str(), "application/octet-stream");
    }
}
