//! Redirect rules: one import-path prefix mapped to one repository URL.
//!
//! A rule is built once from a pair of command-line patterns and then only
//! read. Resolution is a pure function of the rule and the request's import
//! path; nothing is cached between requests.
//!
//! ```text
//! rsc.io/*  https://github.com/rsc/*
//!
//! rsc.io/x86/x86asm  →  import root  rsc.io/x86
//!                       vcs root     https://github.com/rsc/x86
//!                       suffix       /x86asm
//! ```

use url::Url;

use crate::error::{ConfigError, Error};
use crate::vcs::Vcs;

const WILDCARD: &str = "/*";

/// One configured `<import> <repo>` pair.
#[derive(Clone, Debug)]
pub struct RedirectRule {
    wildcard: bool,
    import_prefix: String,
    repo: Url,
    /// The repository as configured, with only the scheme corrected.
    /// `Url` would add a `/` to an empty path and lowercase the host.
    repo_text: String,
    vcs: Vcs,
}

/// The outcome of matching a request path against a [`RedirectRule`].
#[derive(Debug, PartialEq, Eq)]
pub enum Resolution {
    /// Serve the `go-import` page.
    Meta(ResolvedRedirect),
    /// The bare root of a wildcard rule: plain redirect to the docs for this import path.
    Docs(String),
    NotFound,
}

/// Everything the `go-import` page needs for one request.
#[derive(Debug, PartialEq, Eq)]
pub struct ResolvedRedirect {
    pub import_root: String,
    pub vcs: Vcs,
    pub vcs_root: String,
    /// Part of the request path below `import_root`; empty or starts with `/`.
    pub suffix: String,
}

impl ResolvedRedirect {
    /// The import path the documentation viewer should show.
    pub fn docs_path(&self) -> String {
        format!("{}{}", self.import_root, self.suffix)
    }
}

impl RedirectRule {
    /// Builds a rule from an import pattern and a repository pattern.
    ///
    /// Both patterns end in `/*` for a wildcard rule, or neither does. The
    /// repository must be a full URL; a scheme such as `hg+https` selects the
    /// VCS for this rule, otherwise `default_vcs` is used.
    pub fn new(import: &str, repo: &str, default_vcs: Vcs) -> Result<Self, Error> {
        if !repo.contains("://") {
            return Err(ConfigError::MissingScheme.into());
        }

        let wildcard = import.ends_with(WILDCARD);
        if wildcard != repo.ends_with(WILDCARD) {
            return Err(ConfigError::WildcardMismatch.into());
        }
        let (import, repo) = if wildcard {
            (
                &import[..import.len() - WILDCARD.len()],
                &repo[..repo.len() - WILDCARD.len()],
            )
        } else {
            (import, repo)
        };

        let import_prefix = import.strip_suffix('/').unwrap_or(import).to_owned();
        let mut url = Url::parse(repo)?;
        // Everything from the scheme's `:` on, exactly as configured.
        let rest = repo.find(':').map_or(repo, |i| &repo[i..]);

        let mut vcs = default_vcs;
        let mut scheme = url.scheme().to_owned();
        if let Some((kind, inner)) = url.scheme().split_once('+') {
            vcs = kind.parse()?;
            scheme = inner.to_owned();
            // `Url::set_scheme` refuses to move between special and
            // non-special schemes (`hg+https` -> `https`), so reparse instead.
            url = Url::parse(&format!("{scheme}{rest}"))?;
        }

        Ok(Self {
            wildcard,
            import_prefix,
            repo: url,
            repo_text: format!("{scheme}{rest}"),
            vcs,
        })
    }

    pub fn import_prefix(&self) -> &str {
        &self.import_prefix
    }

    pub fn is_wildcard(&self) -> bool {
        self.wildcard
    }

    pub fn vcs(&self) -> Vcs {
        self.vcs
    }

    pub fn repo(&self) -> &Url {
        &self.repo
    }

    /// The subtree this rule answers for: the import prefix plus `/`.
    pub fn root(&self) -> String {
        format!("{}/", self.import_prefix)
    }

    /// True when `path` is the import prefix itself or lies beneath it.
    pub fn matches(&self, path: &str) -> bool {
        match path.strip_prefix(self.import_prefix.as_str()) {
            Some(rest) => rest.is_empty() || rest.starts_with('/'),
            None => false,
        }
    }

    /// Resolves an import path (host + URL path, one trailing `/` removed).
    pub fn resolve(&self, path: &str) -> Resolution {
        if !self.wildcard {
            if !self.matches(path) {
                return Resolution::NotFound;
            }
            return Resolution::Meta(ResolvedRedirect {
                import_root: self.import_prefix.clone(),
                vcs: self.vcs,
                vcs_root: self.repo_text.clone(),
                suffix: path[self.import_prefix.len()..].to_owned(),
            });
        }

        if path == self.import_prefix {
            return Resolution::Docs(self.import_prefix.clone());
        }
        let Some(rest) = path
            .strip_prefix(self.import_prefix.as_str())
            .and_then(|rest| rest.strip_prefix('/'))
        else {
            return Resolution::NotFound;
        };

        let (elem, suffix) = match rest.find('/') {
            Some(i) => rest.split_at(i),
            None => (rest, ""),
        };
        if matches!(elem, "" | "." | "..") {
            return Resolution::NotFound;
        }

        // The element goes at the end of the path, ahead of any query or fragment.
        let (base, tail) = self
            .repo_text
            .find(['?', '#'])
            .map_or((self.repo_text.as_str(), ""), |i| self.repo_text.split_at(i));

        Resolution::Meta(ResolvedRedirect {
            import_root: join(&self.import_prefix, elem),
            vcs: self.vcs,
            vcs_root: format!("{}{tail}", join(base, elem)),
            suffix: suffix.to_owned(),
        })
    }
}

/// Appends one path element with exactly one separating slash.
fn join(base: &str, elem: &str) -> String {
    format!("{}/{elem}", base.trim_end_matches('/'))
}
