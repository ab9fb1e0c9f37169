// End-to-end tests: a real server on an ephemeral port, spoken to in raw HTTP/1.1.
use std::net::SocketAddr;
use std::time::Duration;

use go_import_redirector::{Error, ListenAddr, RedirectRule, RouteTable, Server, Vcs};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

struct Running {
    addr: SocketAddr,
    shutdown: CancellationToken,
    handle: JoinHandle<Result<(), Error>>,
}

impl Running {
    async fn stop(self) -> Result<(), Error> {
        self.shutdown.cancel();
        self.join().await
    }

    /// Waits for `serve` to return after shutdown was requested.
    async fn join(self) -> Result<(), Error> {
        tokio::time::timeout(Duration::from_secs(5), self.handle)
            .await
            .expect("server did not stop")
            .expect("server task panicked")
    }
}

fn routes() -> RouteTable {
    let pairs = [
        ("9fans.net/go", "https://github.com/9fans/go"),
        ("rsc.io/*", "https://github.com/rsc/*"),
        ("example.com/*", "hg+https://example.org/*"),
    ];
    pairs.iter().fold(RouteTable::new(), |table, (import, repo)| {
        table.rule(RedirectRule::new(import, repo, Vcs::Git).unwrap()).unwrap()
    })
}

async fn start(grace: Duration) -> Running {
    let server = Server::bind(&ListenAddr::Tcp("127.0.0.1:0".into()))
        .await
        .unwrap()
        .grace_period(grace);
    let addr = server.local_addr().unwrap();
    let shutdown = CancellationToken::new();
    let handle = tokio::spawn(server.serve(routes(), shutdown.clone()));
    Running { addr, shutdown, handle }
}

struct Reply {
    status: u16,
    head: String,
    body: String,
}

impl Reply {
    fn header(&self, name: &str) -> Option<&str> {
        self.head.lines().skip(1).find_map(|line| {
            let (k, v) = line.split_once(':')?;
            k.eq_ignore_ascii_case(name).then(|| v.trim())
        })
    }
}

async fn exchange<S>(mut stream: S, host: &str, path: &str) -> Reply
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let request = format!("GET {path} HTTP/1.1\r\nHost: {host}\r\nConnection: close\r\n\r\n");
    stream.write_all(request.as_bytes()).await.unwrap();

    let mut raw = String::new();
    stream.read_to_string(&mut raw).await.unwrap();

    let (head, body) = raw.split_once("\r\n\r\n").unwrap();
    let status = head.split(' ').nth(1).unwrap().parse().unwrap();
    Reply { status, head: head.to_owned(), body: body.to_owned() }
}

async fn get(addr: SocketAddr, host: &str, path: &str) -> Reply {
    exchange(TcpStream::connect(addr).await.unwrap(), host, path).await
}

fn go_import(body: &str) -> &str {
    let start = body.find(r#"<meta name="go-import" content=""#).unwrap() + 32;
    let end = start + body[start..].find('"').unwrap();
    &body[start..end]
}

fn refresh(body: &str) -> &str {
    let start = body.find("content=\"0; url=").unwrap() + 16;
    let end = start + body[start..].find('"').unwrap();
    &body[start..end]
}

#[tokio::test]
async fn plain_rule_page() {
    let server = start(Duration::from_secs(1)).await;

    let reply = get(server.addr, "9fans.net", "/go/acme/editinacme").await;
    assert_eq!(reply.status, 200);
    assert_eq!(reply.header("content-type"), Some("text/html; charset=utf-8"));
    assert_eq!(go_import(&reply.body), "9fans.net/go git https://github.com/9fans/go");
    assert_eq!(refresh(&reply.body), "https://godoc.org/9fans.net/go/acme/editinacme");

    let reply = get(server.addr, "9fans.net", "/go/").await;
    assert_eq!(reply.status, 200);
    assert_eq!(refresh(&reply.body), "https://godoc.org/9fans.net/go");

    server.stop().await.unwrap();
}

#[tokio::test]
async fn wildcard_rule_page() {
    let server = start(Duration::from_secs(1)).await;

    let reply = get(server.addr, "rsc.io", "/x86/x86asm?go-get=1").await;
    assert_eq!(reply.status, 200);
    assert_eq!(go_import(&reply.body), "rsc.io/x86 git https://github.com/rsc/x86");
    assert_eq!(refresh(&reply.body), "https://godoc.org/rsc.io/x86/x86asm");

    let reply = get(server.addr, "rsc.io", "/pdf").await;
    assert_eq!(go_import(&reply.body), "rsc.io/pdf git https://github.com/rsc/pdf");
    assert_eq!(refresh(&reply.body), "https://godoc.org/rsc.io/pdf");

    server.stop().await.unwrap();
}

#[tokio::test]
async fn scheme_selects_vcs() {
    let server = start(Duration::from_secs(1)).await;

    let reply = get(server.addr, "example.com", "/foo").await;
    assert_eq!(reply.status, 200);
    assert_eq!(go_import(&reply.body), "example.com/foo hg https://example.org/foo");

    server.stop().await.unwrap();
}

#[tokio::test]
async fn percent_encoded_element_is_passed_through() {
    let server = start(Duration::from_secs(1)).await;

    let reply = get(server.addr, "example.com", "/caf%C3%A9/sub").await;
    assert_eq!(reply.status, 200);
    assert_eq!(go_import(&reply.body), "example.com/caf%C3%A9 hg https://example.org/caf%C3%A9");
    assert_eq!(refresh(&reply.body), "https://godoc.org/example.com/caf%C3%A9/sub");

    server.stop().await.unwrap();
}

#[tokio::test]
async fn wildcard_root_redirects() {
    let server = start(Duration::from_secs(1)).await;

    let reply = get(server.addr, "rsc.io", "/").await;
    assert_eq!(reply.status, 302);
    assert_eq!(reply.header("location"), Some("https://godoc.org/rsc.io"));
    assert!(!reply.body.contains("go-import"));

    server.stop().await.unwrap();
}

#[tokio::test]
async fn unknown_paths_are_not_found() {
    let server = start(Duration::from_secs(1)).await;

    assert_eq!(get(server.addr, "golang.org", "/x/net").await.status, 404);
    assert_eq!(get(server.addr, "9fans.net", "/gopher").await.status, 404);
    assert_eq!(get(server.addr, "9fans.net", "/").await.status, 404);

    server.stop().await.unwrap();
}

#[tokio::test]
async fn method_is_not_checked() {
    let server = start(Duration::from_secs(1)).await;

    let mut stream = TcpStream::connect(server.addr).await.unwrap();
    stream
        .write_all(b"POST /go HTTP/1.1\r\nHost: 9fans.net\r\nContent-Length: 0\r\nConnection: close\r\n\r\n")
        .await
        .unwrap();
    let mut raw = String::new();
    stream.read_to_string(&mut raw).await.unwrap();
    assert!(raw.starts_with("HTTP/1.1 200"));

    server.stop().await.unwrap();
}

#[tokio::test]
async fn idle_server_stops_cleanly() {
    let server = start(Duration::from_secs(1)).await;
    let addr = server.addr;

    server.stop().await.unwrap();
    assert!(TcpStream::connect(addr).await.is_err());
}

#[tokio::test]
async fn zero_grace_closes_in_flight_connections() {
    let server = start(Duration::ZERO).await;

    // A request that never finishes arriving.
    let mut slow = TcpStream::connect(server.addr).await.unwrap();
    slow.write_all(b"GET /go HTTP/1.1\r\nHost: 9fans.net\r\n").await.unwrap();
    tokio::time::sleep(Duration::from_millis(50)).await;

    let addr = server.addr;
    server.stop().await.unwrap();

    let mut buf = [0u8; 64];
    let read = tokio::time::timeout(Duration::from_secs(1), slow.read(&mut buf))
        .await
        .expect("connection left open");
    assert!(matches!(read, Ok(0) | Err(_)));
    assert!(TcpStream::connect(addr).await.is_err());
}

#[tokio::test]
async fn grace_lets_in_flight_request_finish() {
    let server = start(Duration::from_secs(2)).await;

    let mut slow = TcpStream::connect(server.addr).await.unwrap();
    slow.write_all(b"GET /go/acme HTTP/1.1\r\nHost: 9fans.net\r\n").await.unwrap();
    tokio::time::sleep(Duration::from_millis(50)).await;

    server.shutdown.cancel();
    tokio::time::sleep(Duration::from_millis(200)).await;

    // New connections are refused while the old one drains.
    assert!(TcpStream::connect(server.addr).await.is_err());

    slow.write_all(b"Connection: close\r\n\r\n").await.unwrap();
    let mut raw = String::new();
    slow.read_to_string(&mut raw).await.unwrap();
    assert!(raw.starts_with("HTTP/1.1 200"), "{raw}");
    assert!(raw.contains("9fans.net/go git https://github.com/9fans/go"));

    server.join().await.unwrap();
}

#[tokio::test]
async fn grace_elapsing_aborts_open_connections() {
    let grace = Duration::from_millis(300);
    let server = start(grace).await;

    // Headers that are never finished keep the connection busy past the grace period.
    let mut slow = TcpStream::connect(server.addr).await.unwrap();
    slow.write_all(b"GET /go HTTP/1.1\r\nHost: 9fans.net\r\n").await.unwrap();
    tokio::time::sleep(Duration::from_millis(50)).await;

    server.shutdown.cancel();
    match server.join().await {
        Err(Error::Shutdown(d)) => assert_eq!(d, grace),
        other => panic!("expected shutdown timeout, got {other:?}"),
    }

    let mut buf = [0u8; 64];
    let read = tokio::time::timeout(Duration::from_secs(1), slow.read(&mut buf))
        .await
        .expect("connection left open");
    assert!(matches!(read, Ok(0) | Err(_)));
}

#[cfg(unix)]
#[tokio::test]
async fn serves_unix_socket() {
    let path = std::env::temp_dir().join(format!("go-import-redirector-it-{}.sock", std::process::id()));
    let _ = std::fs::remove_file(&path);

    let server = Server::bind(&ListenAddr::Unix(path.clone())).await.unwrap();
    assert!(server.local_addr().is_none());
    let shutdown = CancellationToken::new();
    let handle = tokio::spawn(server.serve(routes(), shutdown.clone()));

    let stream = tokio::net::UnixStream::connect(&path).await.unwrap();
    let reply = exchange(stream, "rsc.io", "/x86").await;
    assert_eq!(reply.status, 200);
    assert_eq!(go_import(&reply.body), "rsc.io/x86 git https://github.com/rsc/x86");

    shutdown.cancel();
    handle.await.unwrap().unwrap();
    assert!(!path.exists());
}
