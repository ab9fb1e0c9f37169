//! Version control system as a typed enum.
//!
//! Covers every system `go get` understands in a `go-import` meta tag,
//! including the `mod` pseudo-system used for module proxies.

use std::fmt;
use std::str::FromStr;

use crate::error::ConfigError;

/// A version control system known to the `go` tool.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub enum Vcs {
    Bzr,
    Fossil,
    #[default]
    Git,
    Hg,
    Mod,
    Svn,
}

impl Vcs {
    /// Returns the lowercase name written into the `go-import` tag (e.g. `"git"`).
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Bzr    => "bzr",
            Self::Fossil => "fossil",
            Self::Git    => "git",
            Self::Hg     => "hg",
            Self::Mod    => "mod",
            Self::Svn    => "svn",
        }
    }
}

/// Parses a lowercase system name (e.g. `"hg"`). Case-sensitive, like the `go` tool.
impl FromStr for Vcs {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "bzr"    => Ok(Self::Bzr),
            "fossil" => Ok(Self::Fossil),
            "git"    => Ok(Self::Git),
            "hg"     => Ok(Self::Hg),
            "mod"    => Ok(Self::Mod),
            "svn"    => Ok(Self::Svn),
            _        => Err(ConfigError::UnknownVcs(s.to_owned())),
        }
    }
}

impl fmt::Display for Vcs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
