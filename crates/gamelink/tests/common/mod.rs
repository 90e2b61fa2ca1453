//! A minimal game server: `/api/info` over HTTP and scripted WebSocket
//! sessions on the same port.

#![allow(dead_code)]

use std::future::Future;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use serde_json::{Value, json};
use tokio::io::AsyncWriteExt;
use tokio::net::{TcpListener, TcpStream};
use tokio_tungstenite::WebSocketStream;
use tokio_tungstenite::tungstenite::Message;

pub type ServerWs = WebSocketStream<TcpStream>;

pub const INFO: &str =
    r#"{"name":"tictactoe","cg_version":"0.7","display_name":"Tic-Tac-Toe","version":"1.2.0"}"#;

pub struct TestServer {
    pub addr: SocketAddr,
    /// Paths of every WebSocket upgrade, in order.
    pub upgrades: Arc<Mutex<Vec<String>>>,
}

impl TestServer {
    /// Serves `INFO` on plain requests and runs `script` for every
    /// WebSocket upgrade.
    pub async fn start<F, Fut>(script: F) -> Self
    where
        F: Fn(String, ServerWs) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let upgrades = Arc::new(Mutex::new(Vec::new()));

        let script = Arc::new(script);
        let seen = Arc::clone(&upgrades);
        tokio::spawn(async move {
            loop {
                let Ok((stream, _)) = listener.accept().await else {
                    return;
                };
                let script = Arc::clone(&script);
                let seen = Arc::clone(&seen);
                tokio::spawn(async move {
                    let Some((path, upgrade)) = peek_request(&stream).await else {
                        return;
                    };
                    if upgrade {
                        seen.lock().unwrap().push(path.clone());
                        let ws = tokio_tungstenite::accept_async(stream).await.unwrap();
                        script(path, ws).await;
                    } else {
                        respond_info(stream).await;
                    }
                });
            }
        });

        Self { addr, upgrades }
    }

    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn upgrades(&self) -> Vec<String> {
        self.upgrades.lock().unwrap().clone()
    }
}

/// Reads the request head without consuming it, so the WebSocket handshake
/// can still see it.
async fn peek_request(stream: &TcpStream) -> Option<(String, bool)> {
    let mut buf = vec![0u8; 4096];
    let head = loop {
        let n = stream.peek(&mut buf).await.ok()?;
        if n == 0 {
            return None;
        }
        let text = String::from_utf8_lossy(&buf[..n]).to_string();
        if text.contains("\r\n\r\n") {
            break text;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    };

    let path = head.lines().next()?.split_whitespace().nth(1)?.to_owned();
    let upgrade = head.to_ascii_lowercase().contains("upgrade: websocket");
    Some((path, upgrade))
}

async fn respond_info(mut stream: TcpStream) {
    let mut buf = vec![0u8; 4096];
    let _ = tokio::io::AsyncReadExt::read(&mut stream, &mut buf).await;
    let response = format!(
        "HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{INFO}",
        INFO.len()
    );
    let _ = stream.write_all(response.as_bytes()).await;
    let _ = stream.shutdown().await;
}

/// Sends a wrapped event from `origin`.
pub async fn send_event(ws: &mut ServerWs, origin: &str, name: &str, data: Value) {
    let text = json!({ "origin": origin, "event": { "name": name, "data": data } }).to_string();
    ws.send(Message::Text(text.into())).await.unwrap();
}

/// Waits for the next event the client sends.
pub async fn recv_event(ws: &mut ServerWs) -> Value {
    loop {
        match ws.next().await {
            Some(Ok(Message::Text(text))) => return serde_json::from_str(text.as_str()).unwrap(),
            Some(Ok(_)) => continue,
            other => panic!("expected an event, got {other:?}"),
        }
    }
}

/// Starts a normal close and drains until the client acknowledges.
pub async fn close(mut ws: ServerWs) {
    let _ = ws.close(None).await;
    while let Some(Ok(_)) = ws.next().await {}
}

/// Reads until the client goes away.
pub async fn drain(mut ws: ServerWs) {
    while let Some(Ok(_)) = ws.next().await {}
}
