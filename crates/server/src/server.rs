//! TCP listener for the static bundle server.
//!
//! Binds `0.0.0.0:<port>` and answers one HTTP request per connection.
//! Every connection gets its own thread, bounded by
//! [`ServerSettings::max_connections`].

use std::io::{self, BufReader};
use std::net::{Ipv4Addr, SocketAddr, TcpListener, TcpStream};
use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use chrono::{DateTime, Utc};
use effcalc_config::ServerSettings;

use crate::compress::{compress, negotiate};
use crate::http::{read_request, HttpError, Method, Request, Response};
use crate::mime::{content_type_for, is_compressible};
use crate::static_files::{resolve, Resolved};
use crate::ServerError;

/// How long the accept loop sleeps when no connection is pending.
const ACCEPT_POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Backoff after a failed accept (EMFILE, ECONNABORTED) before retrying.
const ACCEPT_ERROR_BACKOFF: Duration = Duration::from_millis(50);

/// Write timeout for refusal responses sent from the accept loop.
const REFUSAL_WRITE_TIMEOUT: Duration = Duration::from_millis(500);

/// Operational counters.
#[derive(Clone, Default)]
pub struct ServerMetrics {
    /// Requests answered (any status).
    pub requests: Arc<AtomicU64>,
    /// Requests answered with the entry document because nothing matched.
    pub spa_fallbacks: Arc<AtomicU64>,
    /// Responses sent with a Content-Encoding.
    pub compressed: Arc<AtomicU64>,
    /// Connections refused due to the connection limit.
    pub connections_refused_limit: Arc<AtomicU64>,
}

impl ServerMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    fn bump(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }
}

/// The static server - owns the listener thread.
pub struct StaticServer {
    listener_handle: Option<JoinHandle<()>>,
    shutdown: Arc<AtomicBool>,
    bound_addr: Option<SocketAddr>,
    /// Connections currently being handled.
    active: Arc<AtomicUsize>,
    metrics: ServerMetrics,
}

impl StaticServer {
    /// Create a server (not started).
    pub fn new() -> Self {
        Self {
            listener_handle: None,
            shutdown: Arc::new(AtomicBool::new(false)),
            bound_addr: None,
            active: Arc::new(AtomicUsize::new(0)),
            metrics: ServerMetrics::new(),
        }
    }

    /// Bind and spawn the listener thread. Returns the bound address.
    pub fn start(&mut self, settings: ServerSettings) -> Result<SocketAddr, ServerError> {
        if let Some(addr) = self.bound_addr {
            if self.is_running() {
                return Ok(addr);
            }
        }

        let bind_to = SocketAddr::from((Ipv4Addr::UNSPECIFIED, settings.port));
        let listener = TcpListener::bind(bind_to).map_err(|e| ServerError::Bind {
            addr: bind_to.to_string(),
            message: e.to_string(),
        })?;
        let addr = listener.local_addr()?;

        // Non-blocking so the loop can observe the shutdown flag
        listener.set_nonblocking(true)?;

        self.shutdown.store(false, Ordering::SeqCst);
        self.bound_addr = Some(addr);

        let shutdown = Arc::clone(&self.shutdown);
        let active = Arc::clone(&self.active);
        let metrics = self.metrics.clone();
        let settings = Arc::new(settings);

        log::info!(
            "Server listening on port {} (static dir: {}, compression: {})",
            addr.port(),
            settings.static_dir.display(),
            if settings.compression { "on" } else { "off" }
        );

        self.listener_handle = Some(thread::spawn(move || {
            run_listener(listener, shutdown, settings, active, metrics);
        }));

        Ok(addr)
    }

    /// Block until the listener thread exits.
    ///
    /// Errors when the thread ended without a stop request.
    pub fn wait(&mut self) -> Result<(), ServerError> {
        let Some(handle) = self.listener_handle.take() else {
            return Ok(());
        };
        let joined = handle.join();
        self.bound_addr = None;

        if joined.is_err() {
            return Err(ServerError::ListenerStopped("listener thread panicked".to_string()));
        }
        if !self.shutdown.load(Ordering::SeqCst) {
            return Err(ServerError::ListenerStopped(
                "accept loop ended unexpectedly".to_string(),
            ));
        }
        Ok(())
    }

    /// Signal the listener to stop and wait for it.
    pub fn stop(&mut self) {
        if self.listener_handle.is_none() {
            return;
        }
        self.shutdown.store(true, Ordering::SeqCst);
        if let Err(e) = self.wait() {
            log::error!("{}", e);
        }
        log::info!("Server stopped");
    }

    pub fn is_running(&self) -> bool {
        self.listener_handle.is_some() && !self.shutdown.load(Ordering::SeqCst)
    }

    pub fn bound_addr(&self) -> Option<SocketAddr> {
        self.bound_addr
    }

    pub fn active_connections(&self) -> usize {
        self.active.load(Ordering::SeqCst)
    }

    pub fn metrics(&self) -> &ServerMetrics {
        &self.metrics
    }
}

impl Default for StaticServer {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for StaticServer {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Releases a connection slot when the handler thread finishes.
struct ConnectionSlot(Arc<AtomicUsize>);

impl ConnectionSlot {
    fn acquire(active: &Arc<AtomicUsize>, max: usize) -> Option<Self> {
        let previous = active.fetch_add(1, Ordering::SeqCst);
        if previous >= max {
            active.fetch_sub(1, Ordering::SeqCst);
            return None;
        }
        Some(Self(Arc::clone(active)))
    }
}

impl Drop for ConnectionSlot {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Source of accepted connections for the listener loop.
trait Accept {
    fn accept(&self) -> io::Result<(TcpStream, SocketAddr)>;
}

impl Accept for TcpListener {
    fn accept(&self) -> io::Result<(TcpStream, SocketAddr)> {
        TcpListener::accept(self)
    }
}

fn run_listener<A: Accept>(
    listener: A,
    shutdown: Arc<AtomicBool>,
    settings: Arc<ServerSettings>,
    active: Arc<AtomicUsize>,
    metrics: ServerMetrics,
) {
    while !shutdown.load(Ordering::SeqCst) {
        match listener.accept() {
            Ok((stream, addr)) => {
                let slot = match ConnectionSlot::acquire(&active, settings.max_connections) {
                    Some(slot) => slot,
                    None => {
                        log::warn!(
                            "Connection refused from {}: limit of {} reached",
                            addr,
                            settings.max_connections
                        );
                        ServerMetrics::bump(&metrics.connections_refused_limit);
                        refuse(stream);
                        continue;
                    }
                };

                log::debug!("Accepted connection from {}", addr);
                let settings = Arc::clone(&settings);
                let conn_metrics = metrics.clone();

                thread::spawn(move || {
                    let _slot = slot;
                    if let Err(e) = handle_connection(stream, &settings, &conn_metrics) {
                        log::warn!("Connection error from {}: {}", addr, e);
                    }
                });
            }
            Err(ref e) if e.kind() == io::ErrorKind::WouldBlock => {
                thread::sleep(ACCEPT_POLL_INTERVAL);
            }
            Err(e) => {
                // Out of descriptors or an aborted handshake; keep serving
                log::error!("Accept error: {}", e);
                thread::sleep(ACCEPT_ERROR_BACKOFF);
            }
        }
    }
}

fn refuse(mut stream: TcpStream) {
    let _ = stream.set_nonblocking(false);
    let _ = stream.set_write_timeout(Some(REFUSAL_WRITE_TIMEOUT));
    let _ = Response::text(503, "Service Unavailable").write_to(&mut stream, false);
}

fn handle_connection(
    stream: TcpStream,
    settings: &ServerSettings,
    metrics: &ServerMetrics,
) -> Result<(), HttpError> {
    // Accepted sockets may inherit the listener's non-blocking flag
    stream.set_nonblocking(false)?;
    stream.set_read_timeout(Some(Duration::from_millis(settings.read_timeout_ms)))?;

    let mut writer = stream.try_clone()?;
    let mut reader = BufReader::new(stream);

    let request = match read_request(&mut reader) {
        Ok(request) => request,
        Err(HttpError::Closed) => return Ok(()),
        Err(HttpError::TooLarge) => {
            Response::text(431, "Request Header Fields Too Large").write_to(&mut writer, false)?;
            return Ok(());
        }
        Err(HttpError::Malformed(msg)) => {
            log::debug!("Malformed request: {}", msg);
            Response::text(400, "Bad Request").write_to(&mut writer, false)?;
            return Ok(());
        }
        Err(e) => return Err(e),
    };

    let response = respond(settings, &request, metrics);
    log::debug!("{} {} -> {}", request.method.as_str(), request.target, response.status);
    ServerMetrics::bump(&metrics.requests);

    response.write_to(&mut writer, request.method == Method::Head)?;
    Ok(())
}

/// Build the response for one request: static file, SPA fallback, or error.
pub fn respond(settings: &ServerSettings, request: &Request, metrics: &ServerMetrics) -> Response {
    let path = request.path();

    if !request.method.is_read() {
        return Response::text(404, format!("Cannot {} {}", request.method.as_str(), path));
    }

    let mut response = match resolve(&settings.static_dir, path, &settings.index_file) {
        Resolved::File(file) => serve_file(&file),
        Resolved::Forbidden => Response::text(403, "Forbidden"),
        Resolved::BadRequest => Response::text(400, "Bad Request"),
        Resolved::NotFound => {
            let index = settings.index_path();
            if index.is_file() {
                ServerMetrics::bump(&metrics.spa_fallbacks);
                serve_file(&index)
            } else {
                Response::text(404, "Not Found")
            }
        }
    };

    if settings.compression {
        apply_compression(settings, request, &mut response, metrics);
    }
    response
}

fn serve_file(path: &Path) -> Response {
    let body = match std::fs::read(path) {
        Ok(body) => body,
        Err(e) => {
            log::error!("Failed to read {}: {}", path.display(), e);
            return Response::text(500, "Internal Server Error");
        }
    };

    let mut response = Response::new(200)
        .with_header("Content-Type", content_type_for(path))
        .with_body(body);

    if let Ok(modified) = std::fs::metadata(path).and_then(|m| m.modified()) {
        response.set_header("Last-Modified", http_date(DateTime::<Utc>::from(modified)));
    }
    response
}

fn apply_compression(
    settings: &ServerSettings,
    request: &Request,
    response: &mut Response,
    metrics: &ServerMetrics,
) {
    let compressible = response
        .header("Content-Type")
        .map(is_compressible)
        .unwrap_or(false);
    if !compressible {
        return;
    }

    response.set_header("Vary", "Accept-Encoding");

    if response.body.len() < settings.compression_threshold {
        return;
    }
    let encoding = match request.header("accept-encoding").and_then(negotiate) {
        Some(encoding) => encoding,
        None => return,
    };

    match compress(&response.body, encoding) {
        Ok(body) => {
            response.body = body;
            response.set_header("Content-Encoding", encoding.as_str());
            ServerMetrics::bump(&metrics.compressed);
        }
        Err(e) => log::warn!("Compression failed, sending identity body: {}", e),
    }
}

/// IMF-fixdate, e.g. `Sun, 06 Nov 1994 08:49:37 GMT`.
pub fn http_date(time: DateTime<Utc>) -> String {
    time.format("%a, %d %b %Y %H:%M:%S GMT").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::io::{Read, Write};

    use chrono::TimeZone;
    use flate2::read::GzDecoder;

    fn bundle() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        let index = format!("<!doctype html><html><body>{}</body></html>", "x".repeat(2000));
        fs::write(dir.path().join("index.html"), index).unwrap();
        fs::create_dir(dir.path().join("assets")).unwrap();
        fs::write(dir.path().join("assets/app.js"), "let a = 1;").unwrap();
        fs::write(dir.path().join("assets/logo.png"), vec![0u8; 4096]).unwrap();
        dir
    }

    fn settings_for(dir: &Path) -> ServerSettings {
        ServerSettings {
            port: 0,
            static_dir: dir.to_path_buf(),
            read_timeout_ms: 2_000,
            ..ServerSettings::default()
        }
    }

    fn request(method: &str, target: &str, accept_encoding: Option<&str>) -> Request {
        let mut headers = vec![("host".to_string(), "localhost".to_string())];
        if let Some(ae) = accept_encoding {
            headers.push(("accept-encoding".to_string(), ae.to_string()));
        }
        Request {
            method: match method {
                "GET" => Method::Get,
                "HEAD" => Method::Head,
                other => Method::Other(other.to_string()),
            },
            target: target.to_string(),
            headers,
        }
    }

    /// Send a raw request and read the whole response.
    fn roundtrip(addr: SocketAddr, raw: &str) -> Vec<u8> {
        let mut stream = TcpStream::connect(("127.0.0.1", addr.port())).unwrap();
        stream.set_read_timeout(Some(Duration::from_secs(5))).unwrap();
        stream.write_all(raw.as_bytes()).unwrap();
        let mut out = Vec::new();
        stream.read_to_end(&mut out).unwrap();
        out
    }

    fn split_response(raw: &[u8]) -> (String, Vec<u8>) {
        let pos = raw.windows(4).position(|w| w == b"\r\n\r\n").unwrap();
        (
            String::from_utf8_lossy(&raw[..pos]).to_string(),
            raw[pos + 4..].to_vec(),
        )
    }

    #[test]
    fn test_serves_existing_file() {
        let dir = bundle();
        let s = settings_for(dir.path());
        let resp = respond(&s, &request("GET", "/assets/app.js", None), &ServerMetrics::new());
        assert_eq!(resp.status, 200);
        assert_eq!(resp.header("Content-Type"), Some("text/javascript; charset=utf-8"));
        assert_eq!(resp.body, b"let a = 1;");
        assert!(resp.header("Last-Modified").unwrap().ends_with(" GMT"));
    }

    #[test]
    fn test_unmatched_route_falls_back_to_index() {
        let dir = bundle();
        let s = settings_for(dir.path());
        let metrics = ServerMetrics::new();
        let resp = respond(&s, &request("GET", "/clientes/42?tab=1", None), &metrics);
        assert_eq!(resp.status, 200);
        assert_eq!(resp.header("Content-Type"), Some("text/html; charset=utf-8"));
        assert!(resp.body.starts_with(b"<!doctype html>"));
        assert_eq!(metrics.spa_fallbacks.load(Ordering::Relaxed), 1);
    }

    #[test]
    fn test_missing_index_is_404() {
        let dir = tempfile::tempdir().unwrap();
        let s = settings_for(dir.path());
        let resp = respond(&s, &request("GET", "/anything", None), &ServerMetrics::new());
        assert_eq!(resp.status, 404);
    }

    #[test]
    fn test_non_read_methods_are_404() {
        let dir = bundle();
        let s = settings_for(dir.path());
        let resp = respond(&s, &request("POST", "/assets/app.js", None), &ServerMetrics::new());
        assert_eq!(resp.status, 404);
        assert_eq!(resp.body, b"Cannot POST /assets/app.js");
    }

    #[test]
    fn test_traversal_is_403() {
        let dir = bundle();
        let s = settings_for(dir.path());
        let resp = respond(&s, &request("GET", "/%2e%2e/secret", None), &ServerMetrics::new());
        assert_eq!(resp.status, 403);
    }

    #[test]
    fn test_gzip_when_accepted_and_large() {
        let dir = bundle();
        let s = settings_for(dir.path());
        let metrics = ServerMetrics::new();
        let resp = respond(&s, &request("GET", "/", Some("gzip, deflate")), &metrics);
        assert_eq!(resp.header("Content-Encoding"), Some("gzip"));
        assert_eq!(resp.header("Vary"), Some("Accept-Encoding"));

        let mut html = String::new();
        GzDecoder::new(&resp.body[..]).read_to_string(&mut html).unwrap();
        assert!(html.starts_with("<!doctype html>"));
        assert_eq!(metrics.compressed.load(Ordering::Relaxed), 1);
    }

    #[test]
    fn test_small_bodies_not_compressed() {
        let dir = bundle();
        let s = settings_for(dir.path());
        let resp = respond(&s, &request("GET", "/assets/app.js", Some("gzip")), &ServerMetrics::new());
        assert_eq!(resp.header("Content-Encoding"), None);
        assert_eq!(resp.header("Vary"), Some("Accept-Encoding"));
    }

    #[test]
    fn test_binary_types_not_compressed() {
        let dir = bundle();
        let s = settings_for(dir.path());
        let resp = respond(&s, &request("GET", "/assets/logo.png", Some("gzip")), &ServerMetrics::new());
        assert_eq!(resp.header("Content-Encoding"), None);
        assert_eq!(resp.header("Vary"), None);
        assert_eq!(resp.body.len(), 4096);
    }

    #[test]
    fn test_compression_disabled() {
        let dir = bundle();
        let s = ServerSettings { compression: false, ..settings_for(dir.path()) };
        let resp = respond(&s, &request("GET", "/", Some("gzip")), &ServerMetrics::new());
        assert_eq!(resp.header("Content-Encoding"), None);
    }

    #[test]
    fn test_http_date_format() {
        let t = Utc.with_ymd_and_hms(1994, 11, 6, 8, 49, 37).unwrap();
        assert_eq!(http_date(t), "Sun, 06 Nov 1994 08:49:37 GMT");
    }

    #[test]
    fn test_server_lifecycle() {
        let dir = bundle();
        let mut server = StaticServer::new();
        assert!(!server.is_running());

        let addr = server.start(settings_for(dir.path())).unwrap();
        assert!(server.is_running());
        assert_ne!(addr.port(), 0);

        server.stop();
        assert!(!server.is_running());
        assert!(server.bound_addr().is_none());
    }

    #[test]
    fn test_server_spa_fallback_over_tcp() {
        let dir = bundle();
        let mut server = StaticServer::new();
        let addr = server.start(settings_for(dir.path())).unwrap();

        let raw = roundtrip(addr, "GET /relatorios/mensal HTTP/1.1\r\nHost: localhost\r\n\r\n");
        let (head, body) = split_response(&raw);
        assert!(head.starts_with("HTTP/1.1 200 OK"), "head: {}", head);
        assert!(head.contains("Connection: close"));
        assert!(body.starts_with(b"<!doctype html>"));

        server.stop();
        assert_eq!(server.metrics().requests.load(Ordering::Relaxed), 1);
    }

    #[test]
    fn test_server_head_has_no_body() {
        let dir = bundle();
        let mut server = StaticServer::new();
        let addr = server.start(settings_for(dir.path())).unwrap();

        let raw = roundtrip(addr, "HEAD /assets/app.js HTTP/1.1\r\nHost: localhost\r\n\r\n");
        let (head, body) = split_response(&raw);
        assert!(head.starts_with("HTTP/1.1 200 OK"));
        assert!(head.contains("Content-Length: 10"));
        assert!(body.is_empty());

        server.stop();
    }

    #[test]
    fn test_server_rejects_garbage() {
        let dir = bundle();
        let mut server = StaticServer::new();
        let addr = server.start(settings_for(dir.path())).unwrap();

        let raw = roundtrip(addr, "NONSENSE\r\n\r\n");
        let (head, _) = split_response(&raw);
        assert!(head.starts_with("HTTP/1.1 400 Bad Request"));

        server.stop();
    }

    /// Fails the first `failures` accepts, then hands off to a real listener.
    struct FlakyListener {
        inner: TcpListener,
        failures: AtomicUsize,
    }

    impl Accept for FlakyListener {
        fn accept(&self) -> io::Result<(TcpStream, SocketAddr)> {
            let remaining = self.failures.load(Ordering::SeqCst);
            if remaining > 0 {
                self.failures.store(remaining - 1, Ordering::SeqCst);
                return Err(io::Error::other("Too many open files (os error 24)"));
            }
            self.inner.accept()
        }
    }

    #[test]
    fn test_accept_errors_do_not_stop_listener() {
        let dir = bundle();
        let inner = TcpListener::bind(("127.0.0.1", 0)).unwrap();
        inner.set_nonblocking(true).unwrap();
        let addr = inner.local_addr().unwrap();
        let listener = FlakyListener { inner, failures: AtomicUsize::new(3) };

        let shutdown = Arc::new(AtomicBool::new(false));
        let metrics = ServerMetrics::new();
        let handle = {
            let shutdown = Arc::clone(&shutdown);
            let settings = Arc::new(settings_for(dir.path()));
            let active = Arc::new(AtomicUsize::new(0));
            let metrics = metrics.clone();
            thread::spawn(move || run_listener(listener, shutdown, settings, active, metrics))
        };

        let raw = roundtrip(addr, "GET /assets/app.js HTTP/1.1\r\nHost: localhost\r\n\r\n");
        let (head, body) = split_response(&raw);
        assert!(head.starts_with("HTTP/1.1 200 OK"), "head: {}", head);
        assert_eq!(body, b"let a = 1;");

        shutdown.store(true, Ordering::SeqCst);
        handle.join().unwrap();
        assert_eq!(metrics.requests.load(Ordering::Relaxed), 1);
    }

    #[test]
    fn test_wait_after_stop_is_ok() {
        let dir = bundle();
        let mut server = StaticServer::new();
        server.start(settings_for(dir.path())).unwrap();
        server.shutdown.store(true, Ordering::SeqCst);
        assert!(server.wait().is_ok());
        assert!(server.wait().is_ok());
    }

    #[test]
    fn test_wait_reports_unexpected_exit() {
        let mut server = StaticServer::new();
        server.listener_handle = Some(thread::spawn(|| {}));
        let err = server.wait().unwrap_err();
        assert!(matches!(err, ServerError::ListenerStopped(_)), "{}", err);
    }

    #[test]
    fn test_connection_slot_limit() {
        let active = Arc::new(AtomicUsize::new(0));
        let a = ConnectionSlot::acquire(&active, 2).unwrap();
        let _b = ConnectionSlot::acquire(&active, 2).unwrap();
        assert!(ConnectionSlot::acquire(&active, 2).is_none());
        assert_eq!(active.load(Ordering::SeqCst), 2);
        drop(a);
        assert!(ConnectionSlot::acquire(&active, 2).is_some());
    }
}
