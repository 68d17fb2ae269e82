//! WebSocket echo probes, direct or tunnelled through a SOCKS5 proxy.

use std::sync::Arc;

use anyhow::{anyhow, bail, Context, Result};
use futures::{SinkExt, StreamExt};
use rustls::ClientConfig;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpStream;
use tokio_socks::tcp::Socks5Stream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{client_async_tls_with_config, Connector};
use url::Url;

use crate::config::{SOCKS5_DEFAULT_PORT, WS_PING_PAYLOAD};

/// Host and port of a `ws://` or `wss://` URL.
pub(crate) fn ws_target(url: &str) -> Result<(String, u16)> {
    let parsed = Url::parse(url).with_context(|| format!("Invalid WebSocket URL {url}"))?;
    let host = parsed
        .host_str()
        .ok_or_else(|| anyhow!("WebSocket URL {url} has no host"))?
        .trim_matches(|c| c == '[' || c == ']')
        .to_string();
    let port = parsed
        .port_or_known_default()
        .ok_or_else(|| anyhow!("WebSocket URL {url} has no port"))?;
    Ok((host, port))
}

/// `host:port` form of a proxy endpoint, defaulting the SOCKS5 port.
pub(crate) fn proxy_address(endpoint: &str) -> String {
    match endpoint.rsplit_once(':') {
        Some((_, port)) if port.parse::<u16>().is_ok() => endpoint.to_string(),
        _ => format!("{endpoint}:{SOCKS5_DEFAULT_PORT}"),
    }
}

/// Opens the WebSocket through `endpoint` and checks the echo.
pub(crate) async fn probe_ws(endpoint: &str, url: &str, tls: Arc<ClientConfig>) -> Result<()> {
    let (host, port) = ws_target(url)?;
    let stream = Socks5Stream::connect(proxy_address(endpoint).as_str(), (host.as_str(), port))
        .await
        .with_context(|| format!("SOCKS5 connect via {endpoint} failed"))?;
    round_trip(stream, url, tls).await
}

/// Opens the WebSocket directly and checks the echo.
pub(crate) async fn preflight_ws(url: &str, tls: Arc<ClientConfig>) -> Result<()> {
    let (host, port) = ws_target(url)?;
    let stream = TcpStream::connect((host.as_str(), port))
        .await
        .with_context(|| format!("{url} unreachable"))?;
    round_trip(stream, url, tls).await
}

/// Performs the handshake over `stream`, sends the ping payload and expects
/// it back.
async fn round_trip<S>(stream: S, url: &str, tls: Arc<ClientConfig>) -> Result<()>
where
    S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
{
    let (mut socket, _) = client_async_tls_with_config(url, stream, None, Some(Connector::Rustls(tls)))
        .await
        .context("WebSocket handshake failed")?;
    socket
        .send(Message::Text(WS_PING_PAYLOAD.to_string()))
        .await
        .context("WebSocket send failed")?;

    let reply = loop {
        match socket.next().await {
            Some(Ok(Message::Text(text))) => break text,
            Some(Ok(Message::Binary(bytes))) => break String::from_utf8_lossy(&bytes).into_owned(),
            Some(Ok(Message::Close(_))) | None => bail!("WebSocket closed before reply"),
            Some(Ok(_)) => continue,
            Some(Err(e)) => return Err(e).context("WebSocket receive failed"),
        }
    };
    let _ = socket.close(None).await;

    if reply != WS_PING_PAYLOAD {
        bail!("Unexpected reply: {reply:?}");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ws_target_defaults_ports() {
        assert_eq!(
            ws_target("wss://ws.postman-echo.com/raw").unwrap(),
            ("ws.postman-echo.com".to_string(), 443)
        );
        assert_eq!(ws_target("ws://127.0.0.1:9001/").unwrap(), ("127.0.0.1".to_string(), 9001));
        assert_eq!(ws_target("ws://[::1]/echo").unwrap(), ("::1".to_string(), 80));
        assert!(ws_target("not a url").is_err());
    }

    #[test]
    fn test_proxy_address_defaults_socks_port() {
        assert_eq!(proxy_address("relay.example:1081"), "relay.example:1081");
        assert_eq!(proxy_address("relay.example"), "relay.example:1080");
    }
}
