//! # go-import-redirector
//!
//! An HTTP server for a custom Go import domain. It answers requests under
//! a configured import path root with a meta tag naming the source
//! repository for `go get`, and a refresh to the package's documentation.
//!
//! ## Rules
//!
//! Each rule maps one import path root to one repository URL:
//!
//! ```text
//! 9fans.net/go  https://github.com/9fans/go
//!
//! GET 9fans.net/go/acme/editinacme
//!   <meta name="go-import" content="9fans.net/go git https://github.com/9fans/go">
//!   <meta http-equiv="refresh" content="0; url=https://godoc.org/9fans.net/go/acme/editinacme">
//! ```
//!
//! When both sides end in `/*`, the path element after the root is carried
//! into the repository URL:
//!
//! ```text
//! rsc.io/*  https://github.com/rsc/*
//!
//! GET rsc.io/x86/x86asm
//!   <meta name="go-import" content="rsc.io/x86 git https://github.com/rsc/x86">
//!   <meta http-equiv="refresh" content="0; url=https://godoc.org/rsc.io/x86/x86asm">
//! ```
//!
//! A repository scheme such as `hg+https` picks the version control system
//! for that rule; otherwise the configured default (`git`) is used.
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use go_import_redirector::{RedirectRule, RouteTable, Server, Vcs};
//! use tokio_util::sync::CancellationToken;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), go_import_redirector::Error> {
//!     let routes = RouteTable::new()
//!         .rule(RedirectRule::new("rsc.io/*", "https://github.com/rsc/*", Vcs::Git)?)?
//!         .rule(RedirectRule::new("9fans.net/go", "https://github.com/9fans/go", Vcs::Git)?)?;
//!
//!     let shutdown = CancellationToken::new();
//!     let on_signal = shutdown.clone();
//!     tokio::spawn(async move {
//!         go_import_redirector::shutdown_signal().await;
//!         on_signal.cancel();
//!     });
//!
//!     Server::bind(&":9001".parse().unwrap())
//!         .await?
//!         .serve(routes, shutdown)
//!         .await
//! }
//! ```

mod error;
mod listen;
mod render;
mod request;
mod response;
mod routes;
mod rule;
mod server;
mod vcs;

pub mod config;
pub mod tracing_setup;

pub use error::{ConfigError, Error};
pub use listen::ListenAddr;
pub use request::import_path;
pub use response::{ContentType, Response, ResponseBuilder};
pub use routes::{DEFAULT_DOCS_HOST, RouteTable};
pub use rule::{RedirectRule, Resolution, ResolvedRedirect};
pub use server::{DEFAULT_GRACE, Server, shutdown_signal};
pub use vcs::Vcs;
