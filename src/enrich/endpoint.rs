//! Recovering proxy endpoints from checker output items.

use serde_json::Value;

use crate::relay::truthy;

use super::types::JsonMap;

/// Extracts a `host:port` endpoint from one checker item.
///
/// Tried in order: `socks5_endpoint`, `endpoint`, a `proxy` value written as
/// `socks5://host:port` (any `socks5*://` scheme) or bare `host:port`, and
/// finally a `protocol`/`type` of `socks5` with separate host and port
/// fields. Proxies with other URL schemes are rejected.
pub fn extract_endpoint(item: &JsonMap) -> Option<String> {
    for key in ["socks5_endpoint", "endpoint"] {
        if let Some(value) = item.get(key).and_then(scalar_to_string) {
            return Some(value);
        }
    }

    if let Some(proxy) = item.get("proxy").and_then(scalar_to_string) {
        if let Some((_, rest)) = proxy.split_once("socks5://") {
            return Some(rest.to_string());
        }
        if proxy.starts_with("socks5") {
            if let Some((_, rest)) = proxy.split_once("://") {
                return Some(rest.to_string());
            }
        }
        if proxy.contains(':') && !proxy.contains("://") {
            return Some(proxy);
        }
    }

    let protocol = ["protocol", "type"]
        .into_iter()
        .filter_map(|key| item.get(key))
        .find(|value| truthy(Some(*value)))
        .and_then(scalar_to_string)
        .unwrap_or_default()
        .to_lowercase();
    if protocol == "socks5" {
        let host = ["host", "ip", "address"]
            .into_iter()
            .filter_map(|key| item.get(key))
            .find(|value| truthy(Some(*value)))
            .and_then(scalar_to_string);
        let port = item
            .get("port")
            .filter(|value| truthy(Some(*value)))
            .and_then(scalar_to_string);
        if let (Some(host), Some(port)) = (host, port) {
            return Some(format!("{host}:{port}"));
        }
    }
    None
}

fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}
