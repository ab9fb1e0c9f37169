//! Listen addresses and the listener behind them.
//!
//! `unix:/run/redirector.sock` binds a Unix domain socket; anything else is a
//! TCP `host:port`. An empty host (`:9001`) listens on every interface,
//! IPv6 and IPv4 through one dual-stack socket, or IPv4 alone where the host
//! has no IPv6.

use std::fmt;
use std::io;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;

use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpListener;
#[cfg(unix)]
use tokio::net::UnixListener;

use crate::error::Error;

const UNIX_PREFIX: &str = "unix:";
const ANY_V6: &str = "[::]";
const ANY_V4: &str = "0.0.0.0";

/// Where the server accepts connections.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ListenAddr {
    Tcp(String),
    Unix(PathBuf),
}

impl FromStr for ListenAddr {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.strip_prefix(UNIX_PREFIX) {
            Some(path) => Self::Unix(PathBuf::from(path)),
            None if s.starts_with(':') => Self::Tcp(format!("{ANY_V6}{s}")),
            None => Self::Tcp(s.to_owned()),
        })
    }
}

impl fmt::Display for ListenAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Tcp(addr) => f.write_str(addr),
            Self::Unix(path) => write!(f, "{UNIX_PREFIX}{}", path.display()),
        }
    }
}

/// Binds `host_port`, falling back from the IPv6 wildcard to the IPv4 one
/// when the host cannot open IPv6 sockets.
async fn bind_tcp(host_port: &str) -> io::Result<TcpListener> {
    match TcpListener::bind(host_port).await {
        Err(e) if !matches!(e.kind(), io::ErrorKind::AddrInUse | io::ErrorKind::PermissionDenied) => {
            match host_port.strip_prefix(ANY_V6) {
                Some(port) => {
                    tracing::debug!("IPv6 unavailable ({e}), listening on IPv4 only");
                    TcpListener::bind(format!("{ANY_V4}{port}")).await
                }
                None => Err(e),
            }
        }
        res => res,
    }
}

/// A byte stream hyper can serve, whatever socket it came from.
pub(crate) trait Io: AsyncRead + AsyncWrite + Unpin + Send {}

impl<T: AsyncRead + AsyncWrite + Unpin + Send> Io for T {}

/// A bound TCP or Unix listener.
pub(crate) enum Listener {
    Tcp(TcpListener),
    #[cfg(unix)]
    Unix(UnixListener, PathBuf),
}

impl Listener {
    pub(crate) async fn bind(addr: &ListenAddr) -> Result<Self, Error> {
        let listen_error = |source| Error::Listen { addr: addr.to_string(), source };
        match addr {
            ListenAddr::Tcp(host_port) => bind_tcp(host_port)
                .await
                .map(Self::Tcp)
                .map_err(listen_error),
            #[cfg(unix)]
            ListenAddr::Unix(path) => UnixListener::bind(path)
                .map(|listener| Self::Unix(listener, path.clone()))
                .map_err(listen_error),
            #[cfg(not(unix))]
            ListenAddr::Unix(_) => Err(listen_error(io::Error::new(
                io::ErrorKind::Unsupported,
                "unix sockets are not supported on this platform",
            ))),
        }
    }

    pub(crate) fn local_addr(&self) -> Option<SocketAddr> {
        match self {
            Self::Tcp(listener) => listener.local_addr().ok(),
            #[cfg(unix)]
            Self::Unix(..) => None,
        }
    }

    /// Accepts one connection and describes its peer for logging.
    pub(crate) async fn accept(&self) -> io::Result<(Box<dyn Io>, String)> {
        match self {
            Self::Tcp(listener) => {
                let (stream, peer) = listener.accept().await?;
                let stream: Box<dyn Io> = Box::new(stream);
                Ok((stream, peer.to_string()))
            }
            #[cfg(unix)]
            Self::Unix(listener, path) => {
                let (stream, _) = listener.accept().await?;
                let stream: Box<dyn Io> = Box::new(stream);
                Ok((stream, path.display().to_string()))
            }
        }
    }

    /// Closes the listener, unlinking a Unix socket file this process created.
    pub(crate) fn close(self) {
        match self {
            Self::Tcp(listener) => drop(listener),
            #[cfg(unix)]
            Self::Unix(listener, path) => {
                drop(listener);
                if let Err(e) = std::fs::remove_file(&path) {
                    tracing::debug!(path = %path.display(), "remove socket: {e}");
                }
            }
        }
    }
}
