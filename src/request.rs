//! Incoming request inspection.

use http::Request;
use http::header::HOST;

/// The import path a request asks for: host followed by the URL path, with
/// one trailing `/` removed.
///
/// The host comes from the request URI when present (HTTP/2 `:authority`,
/// absolute-form requests), otherwise from the `Host` header. Any port is
/// dropped and the host is lowercased; the path is used as sent.
pub fn import_path<B>(req: &Request<B>) -> String {
    let host = req
        .uri()
        .host()
        .or_else(|| req.headers().get(HOST).and_then(|h| h.to_str().ok()))
        .map(strip_port)
        .unwrap_or_default()
        .to_ascii_lowercase();

    let mut path = host;
    path.push_str(req.uri().path());
    if path.ends_with('/') {
        path.pop();
    }
    path
}

fn strip_port(host: &str) -> &str {
    // `[::1]:9001` keeps its brackets; a bare IPv6 literal has no port.
    if let Some(end) = host.rfind(']') {
        return &host[..=end];
    }
    match host.rsplit_once(':') {
        Some((name, port)) if !name.contains(':') && port.bytes().all(|b| b.is_ascii_digit()) => name,
        _ => host,
    }
}
