// Shared test helpers: fixture loading, stub collaborators and small local
// servers (a SOCKS5 relay and a WebSocket echo) for live-probe tests.

#![allow(dead_code)] // Each test file uses a different subset

use std::io;
use std::net::{Ipv4Addr, Ipv6Addr, SocketAddr};

use async_trait::async_trait;
use futures::{SinkExt, StreamExt};
use serde_json::Value;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

use relay_list::relay::{Relay, RelayDraft};
use relay_list::source::SourceAdapter;

/// The five-relay WireGuard payload under `tests/data`.
pub fn sample_payload() -> Value {
    serde_json::from_str(include_str!("data/wireguard_sample.json"))
        .expect("sample payload should be valid JSON")
}

/// Active relay in `location_id` with the given hostname.
pub fn relay(hostname: &str, location_id: &str, country: &str, provider: &str) -> Relay {
    Relay::from(RelayDraft {
        hostname: hostname.to_string(),
        location_id: location_id.to_string(),
        city: "Testville".to_string(),
        country: country.to_string(),
        provider: provider.to_string(),
        ipv4: "192.0.2.10".to_string(),
        weight: 100,
        active: true,
        include_in_country: true,
        source: "mullvad".to_string(),
        ..Default::default()
    })
}

/// Source that always returns the same payload.
pub struct StaticSource {
    pub name: String,
    pub payload: Value,
}

impl StaticSource {
    pub fn new(name: &str, payload: Value) -> Self {
        Self {
            name: name.to_string(),
            payload,
        }
    }
}

#[async_trait]
impl SourceAdapter for StaticSource {
    fn name(&self) -> &str {
        &self.name
    }

    async fn fetch(&self, _force_refresh: bool) -> anyhow::Result<Value> {
        Ok(self.payload.clone())
    }
}

/// Binds an ephemeral port and releases it, so nothing listens there.
pub async fn unused_addr() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    listener.local_addr().expect("local addr")
}

/// Starts a no-auth SOCKS5 relay supporting CONNECT only.
pub async fn spawn_socks5_proxy() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move {
        while let Ok((client, _)) = listener.accept().await {
            tokio::spawn(async move {
                let _ = serve_socks5(client).await;
            });
        }
    });
    addr
}

async fn serve_socks5(mut client: TcpStream) -> io::Result<()> {
    let mut greeting = [0u8; 2];
    client.read_exact(&mut greeting).await?;
    let mut methods = vec![0u8; usize::from(greeting[1])];
    client.read_exact(&mut methods).await?;
    client.write_all(&[0x05, 0x00]).await?;

    let mut request = [0u8; 4];
    client.read_exact(&mut request).await?;
    let host = match request[3] {
        0x01 => {
            let mut octets = [0u8; 4];
            client.read_exact(&mut octets).await?;
            Ipv4Addr::from(octets).to_string()
        }
        0x03 => {
            let mut len = [0u8; 1];
            client.read_exact(&mut len).await?;
            let mut name = vec![0u8; usize::from(len[0])];
            client.read_exact(&mut name).await?;
            String::from_utf8_lossy(&name).into_owned()
        }
        0x04 => {
            let mut octets = [0u8; 16];
            client.read_exact(&mut octets).await?;
            Ipv6Addr::from(octets).to_string()
        }
        _ => return Err(io::Error::other("unsupported address type")),
    };
    let mut port = [0u8; 2];
    client.read_exact(&mut port).await?;
    let port = u16::from_be_bytes(port);

    let mut upstream = match TcpStream::connect((host.as_str(), port)).await {
        Ok(stream) => stream,
        Err(e) => {
            client.write_all(&[0x05, 0x05, 0x00, 0x01, 0, 0, 0, 0, 0, 0]).await?;
            return Err(e);
        }
    };
    client.write_all(&[0x05, 0x00, 0x00, 0x01, 0, 0, 0, 0, 0, 0]).await?;
    tokio::io::copy_bidirectional(&mut client, &mut upstream).await?;
    Ok(())
}

/// Starts a WebSocket server echoing text and binary frames.
pub async fn spawn_ws_echo() -> SocketAddr {
    spawn_ws_server(|text| text).await
}

/// Starts a WebSocket server answering every text frame with `reply(text)`.
pub async fn spawn_ws_server(reply: fn(String) -> String) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move {
        while let Ok((stream, _)) = listener.accept().await {
            tokio::spawn(async move {
                let Ok(mut socket) = tokio_tungstenite::accept_async(stream).await else {
                    return;
                };
                while let Some(Ok(message)) = socket.next().await {
                    let answer = match message {
                        tokio_tungstenite::tungstenite::Message::Text(text) => {
                            tokio_tungstenite::tungstenite::Message::Text(reply(text))
                        }
                        tokio_tungstenite::tungstenite::Message::Close(_) => break,
                        other if other.is_binary() => other,
                        _ => continue,
                    };
                    if socket.send(answer).await.is_err() {
                        break;
                    }
                }
            });
        }
    });
    addr
}
