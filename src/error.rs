//! Unified error type.

use std::time::Duration;

/// The error type returned by the redirector's fallible operations.
///
/// Per-request outcomes (404, 500) are expressed as HTTP
/// [`Response`](crate::Response) values, not as `Error`s. This type surfaces
/// startup and lifecycle failures: a bad rule, a port that cannot be bound,
/// or a shutdown that did not drain in time.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("invalid repo URL: {0}")]
    UrlParse(#[from] url::ParseError),

    #[error("error creating redirect {import} -> {repo}")]
    Rule {
        import: String,
        repo: String,
        #[source]
        source: Box<Error>,
    },

    #[error("listen on {addr}: {source}")]
    Listen {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    #[error("connections still open after {0:?} grace period")]
    Shutdown(Duration),
}

/// A rule pair or flag value that can never produce a working route.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("repo path must be full URL")]
    MissingScheme,

    #[error("either both import and repo must have /* or neither")]
    WildcardMismatch,

    #[error("unknown version control system `{0}`")]
    UnknownVcs(String),

    #[error("import path `{0}` registered twice")]
    DuplicatePrefix(String),
}
