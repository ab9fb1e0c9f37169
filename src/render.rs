//! The `go-import` HTML page.
//!
//! `go get` only reads the `go-import` meta tag; browsers follow the refresh
//! tag to the documentation viewer. Tag order matters to neither, but the
//! page keeps `go-import` first so it sits early in the `<head>`.

use std::fmt::{self, Write};

use crate::rule::ResolvedRedirect;

/// Writes the page for `r`, refreshing to `docs_url`.
pub fn import_page(r: &ResolvedRedirect, docs_url: &str) -> Result<String, fmt::Error> {
    let import_root = html_escape(&r.import_root);
    let vcs_root = html_escape(&r.vcs_root);
    let docs_url = html_escape(docs_url);
    let docs_text = docs_url.strip_prefix("https://").unwrap_or(&docs_url);

    let mut page = String::with_capacity(512);
    writeln!(page, "<!DOCTYPE html>")?;
    writeln!(page, "<html>")?;
    writeln!(page, "<head>")?;
    writeln!(page, r#"<meta http-equiv="Content-Type" content="text/html; charset=utf-8"/>"#)?;
    writeln!(page, r#"<meta name="go-import" content="{import_root} {} {vcs_root}">"#, r.vcs)?;
    writeln!(page, r#"<meta http-equiv="refresh" content="0; url={docs_url}">"#)?;
    writeln!(page, "</head>")?;
    writeln!(page, "<body>")?;
    writeln!(page, r#"Redirecting to docs at <a href="{docs_url}">{docs_text}</a>..."#)?;
    writeln!(page, "</body>")?;
    writeln!(page, "</html>")?;
    Ok(page)
}

/// Body of the plain redirect sent for a wildcard root.
pub fn redirect_body(location: &str) -> String {
    format!("<a href=\"{}\">Found</a>.\n", html_escape(location))
}

fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}
