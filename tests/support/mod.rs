#![allow(dead_code)]

use http_body_util::{BodyExt, Full};
use hyper::body::Bytes;
use hyper::service::Service;
use hyper::{Request, Response};
use routekit::{RequestServiceBuilder, Router, Server};
use std::net::SocketAddr;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::oneshot::{self, Sender};
use tokio::task::JoinHandle;

/// Drives a router in-process, without a socket.
pub struct Harness<E> {
    builder: RequestServiceBuilder<E>,
}

impl<E: Into<Box<dyn std::error::Error + Send + Sync>> + 'static> Harness<E> {
    pub fn new(router: Router<E>) -> Self {
        Harness {
            builder: RequestServiceBuilder::new(router).unwrap(),
        }
    }

    pub async fn send(&self, req: Request<Full<Bytes>>) -> Response<Full<Bytes>> {
        let service = self.builder.build(SocketAddr::from(([127, 0, 0, 1], 40000)));
        service.call(req).await.unwrap()
    }

    pub async fn get(&self, uri: &str) -> Response<Full<Bytes>> {
        self.send(request("GET", uri).body(Full::new(Bytes::new())).unwrap()).await
    }

    pub fn builder(&self) -> &RequestServiceBuilder<E> {
        &self.builder
    }
}

pub fn request(method: &str, uri: &str) -> http::request::Builder {
    Request::builder().method(method.to_ascii_uppercase().as_str()).uri(uri)
}

pub async fn into_text(res: Response<Full<Bytes>>) -> String {
    let bytes = res.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8_lossy(&bytes).to_string()
}

/// A server running on an ephemeral port.
pub struct Serve {
    addr: SocketAddr,
    tx: Sender<()>,
    handle: JoinHandle<routekit::Result<()>>,
}

impl Serve {
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Signals the shutdown and waits until the server has drained.
    pub async fn shutdown(self) {
        self.tx.send(()).unwrap();
        self.handle.await.unwrap().unwrap();
    }

    pub fn trigger_shutdown(self) -> JoinHandle<routekit::Result<()>> {
        self.tx.send(()).unwrap();
        self.handle
    }
}

pub async fn serve<E>(router: Router<E>) -> Serve
where
    E: Into<Box<dyn std::error::Error + Send + Sync>> + Send + Sync + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let server = Server::new(router).unwrap();
    let (tx, rx) = oneshot::channel::<()>();

    let handle = tokio::spawn(async move {
        server
            .serve(listener, async move {
                let _ = rx.await;
            })
            .await
    });

    Serve { addr, tx, handle }
}

#[derive(Debug)]
pub struct RawResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

impl RawResponse {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

/// Sends a single HTTP/1.1 request over a fresh connection and reads the response until the
/// server closes it.
pub async fn send_raw(addr: SocketAddr, method: &str, path: &str, headers: &[(&str, &str)], body: &str) -> RawResponse {
    let mut stream = TcpStream::connect(addr).await.unwrap();

    let mut req = format!("{} {} HTTP/1.1\r\nHost: {}\r\nConnection: close\r\n", method, path, addr);
    for (name, value) in headers {
        req.push_str(&format!("{}: {}\r\n", name, value));
    }
    req.push_str(&format!("Content-Length: {}\r\n\r\n{}", body.len(), body));
    stream.write_all(req.as_bytes()).await.unwrap();

    let mut raw = Vec::new();
    stream.read_to_end(&mut raw).await.unwrap();
    parse_raw(&String::from_utf8_lossy(&raw))
}

/// A client that keeps one HTTP/1.1 connection open across requests.
pub struct KeepAliveClient {
    addr: SocketAddr,
    stream: TcpStream,
}

impl KeepAliveClient {
    pub async fn connect(addr: SocketAddr) -> KeepAliveClient {
        let stream = TcpStream::connect(addr).await.unwrap();
        KeepAliveClient { addr, stream }
    }

    /// Returns `None` once the server has closed the connection.
    pub async fn get(&mut self, path: &str) -> Option<RawResponse> {
        let req = format!("GET {} HTTP/1.1\r\nHost: {}\r\n\r\n", path, self.addr);
        if self.stream.write_all(req.as_bytes()).await.is_err() {
            return None;
        }

        let mut raw = Vec::new();
        let mut buf = [0u8; 1024];
        loop {
            if let Some(end) = raw.windows(4).position(|w| w == b"\r\n\r\n").map(|pos| pos + 4) {
                let head = parse_raw(&String::from_utf8_lossy(&raw[..end]));
                let len = head
                    .header("content-length")
                    .and_then(|len| len.parse::<usize>().ok())
                    .unwrap_or(0);
                if raw.len() >= end + len {
                    return Some(parse_raw(&String::from_utf8_lossy(&raw[..end + len])));
                }
            }

            match self.stream.read(&mut buf).await {
                Ok(0) | Err(_) => return None,
                Ok(n) => raw.extend_from_slice(&buf[..n]),
            }
        }
    }
}

fn parse_raw(raw: &str) -> RawResponse {
    let (head, body) = raw.split_once("\r\n\r\n").unwrap_or((raw, ""));
    let mut lines = head.split("\r\n");
    let status = lines
        .next()
        .and_then(|line| line.split_whitespace().nth(1))
        .and_then(|code| code.parse().ok())
        .unwrap();
    let headers = lines
        .filter_map(|line| line.split_once(':'))
        .map(|(name, value)| (name.trim().to_owned(), value.trim().to_owned()))
        .collect();

    RawResponse {
        status,
        headers,
        body: body.to_owned(),
    }
}
