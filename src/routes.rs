//! The route table.
//!
//! An ordered list of [`RedirectRule`]s and an explicit longest-prefix
//! lookup. Build it once at startup; pass it to [`Server::serve`](crate::Server::serve).

use tracing::debug;

use crate::error::{ConfigError, Error};
use crate::render;
use crate::response::Response;
use crate::rule::{RedirectRule, Resolution};

/// Default host of the documentation viewer.
pub const DEFAULT_DOCS_HOST: &str = "godoc.org";

/// The application's routing table.
///
/// Each [`RouteTable::rule`] call returns `self` so registrations chain
/// naturally. When two import prefixes nest, the longest one wins.
#[derive(Debug)]
pub struct RouteTable {
    rules: Vec<RedirectRule>,
    docs_host: String,
}

impl RouteTable {
    pub fn new() -> Self {
        Self { rules: Vec::new(), docs_host: DEFAULT_DOCS_HOST.to_owned() }
    }

    /// Host that pages refresh to and wildcard roots redirect to.
    pub fn docs_host(mut self, host: impl Into<String>) -> Self {
        self.docs_host = host.into();
        self
    }

    /// Register a rule. Returns `self` for chaining.
    ///
    /// Fails if another rule already owns the same import prefix.
    pub fn rule(mut self, rule: RedirectRule) -> Result<Self, Error> {
        if self.rules.iter().any(|r| r.import_prefix() == rule.import_prefix()) {
            return Err(ConfigError::DuplicatePrefix(rule.import_prefix().to_owned()).into());
        }
        debug!(root = %rule.root(), repo = %rule.repo(), vcs = %rule.vcs(), "registered redirect");
        self.rules.push(rule);
        Ok(self)
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// The most specific rule whose subtree contains `path`.
    pub fn lookup(&self, path: &str) -> Option<&RedirectRule> {
        self.rules
            .iter()
            .filter(|rule| rule.matches(path))
            .max_by_key(|rule| rule.import_prefix().len())
    }

    /// `https://{docs host}/{path}`
    pub fn docs_url(&self, path: &str) -> String {
        format!("https://{}/{}", self.docs_host, path)
    }

    /// Produces the full response for one import path.
    pub fn respond(&self, path: &str) -> Response {
        let Some(rule) = self.lookup(path) else {
            return Response::not_found();
        };

        match rule.resolve(path) {
            Resolution::NotFound => Response::not_found(),
            Resolution::Docs(import) => Response::redirect(&self.docs_url(&import)),
            Resolution::Meta(resolved) => {
                let docs = self.docs_url(&resolved.docs_path());
                match render::import_page(&resolved, &docs) {
                    Ok(page) => Response::html(page),
                    Err(e) => Response::internal_error(e.to_string()),
                }
            }
        }
    }
}

impl Default for RouteTable {
    fn default() -> Self { Self::new() }
}
