//! Command-line configuration.
//!
//! [`Cli`] is what clap parses; [`Config`] is the validated, immutable result
//! the rest of the program is built from.

use std::time::Duration;

use clap::error::ErrorKind;
use clap::{CommandFactory, Parser};

use crate::error::Error;
use crate::listen::ListenAddr;
use crate::routes::RouteTable;
use crate::rule::RedirectRule;
use crate::tracing_setup::LogFormat;
use crate::vcs::Vcs;

const EXAMPLES: &str = "\
Examples:
  go-import-redirector 'rsc.io/*' 'https://github.com/rsc/*'
  go-import-redirector 9fans.net/go https://github.com/9fans/go

If both IMPORT and REPO end in /*, the path element after the import root is
substituted into REPO on each request. A REPO scheme such as hg+https selects
the version control system for that pair.";

/// An HTTP server for custom Go import domains.
///
/// Answers requests under each IMPORT root with a `go-import` meta tag
/// pointing `go get` at REPO, and a refresh to the package documentation.
#[derive(Parser, Debug)]
#[command(name = "go-import-redirector", version, after_help = EXAMPLES)]
pub struct Cli {
    /// Serve HTTP on ADDRESS; `unix:PATH` serves from a Unix domain socket
    #[arg(long, value_name = "ADDRESS", default_value = ":9001")]
    pub listen: ListenAddr,

    /// Default version control SYSTEM (bzr, fossil, git, hg, mod, svn)
    #[arg(long, value_name = "SYSTEM", default_value = "git")]
    pub vcs: Vcs,

    /// Grace PERIOD for in-flight requests on shutdown; 0s closes immediately
    #[arg(long, value_name = "PERIOD", default_value = "5s", value_parser = humantime::parse_duration)]
    pub grace: Duration,

    /// Documentation HOST that pages redirect to
    #[arg(long, value_name = "HOST", default_value = crate::routes::DEFAULT_DOCS_HOST)]
    pub docs: String,

    /// Log output format
    #[arg(long, value_enum, default_value_t = LogFormat::Text)]
    pub log_format: LogFormat,

    /// Import path root followed by its repository URL, repeated
    #[arg(value_name = "IMPORT REPO", required = true, num_args = 2..)]
    pub pairs: Vec<String>,
}

impl Cli {
    /// Validates the positional pairs.
    ///
    /// An odd argument count is a usage error; its exit code is 2, the same
    /// as clap's own usage errors.
    pub fn into_config(self) -> Result<Config, clap::Error> {
        if self.pairs.len() % 2 != 0 {
            return Err(Cli::command().error(
                ErrorKind::WrongNumberOfValues,
                format!(
                    "expected IMPORT REPO pairs, got {} arguments",
                    self.pairs.len()
                ),
            ));
        }

        let rules = self
            .pairs
            .chunks_exact(2)
            .map(|pair| RulePair { import: pair[0].clone(), repo: pair[1].clone() })
            .collect();

        Ok(Config {
            listen: self.listen,
            vcs: self.vcs,
            grace: self.grace,
            docs_host: self.docs,
            log_format: self.log_format,
            rules,
        })
    }
}

/// One `<import> <repo>` argument pair, as given.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RulePair {
    pub import: String,
    pub repo: String,
}

/// Startup configuration. Read-only once built.
#[derive(Clone, Debug)]
pub struct Config {
    pub listen: ListenAddr,
    pub vcs: Vcs,
    pub grace: Duration,
    pub docs_host: String,
    pub log_format: LogFormat,
    pub rules: Vec<RulePair>,
}

impl Config {
    /// Builds every rule, failing on the first bad pair.
    pub fn routes(&self) -> Result<RouteTable, Error> {
        self.rules
            .iter()
            .try_fold(RouteTable::new().docs_host(&self.docs_host), |table, pair| {
                RedirectRule::new(&pair.import, &pair.repo, self.vcs)
                    .and_then(|rule| table.rule(rule))
                    .map_err(|source| Error::Rule {
                        import: pair.import.clone(),
                        repo: pair.repo.clone(),
                        source: Box::new(source),
                    })
            })
    }
}
