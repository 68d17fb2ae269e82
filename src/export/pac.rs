//! Proxy auto-config script.

use std::path::Path;

use anyhow::{Context, Result};

use crate::relay::Relay;

/// Renders a `FindProxyForURL` script over the relays' SOCKS5 endpoints.
///
/// The script starts the fallback chain at a random endpoint on every call,
/// spreading load across relays. Without relays it always returns `DIRECT`.
pub fn render_pac(relays: &[Relay]) -> String {
    if relays.is_empty() {
        return "function FindProxyForURL(url, host) {\n    var proxies = [];\n    return \"DIRECT\";\n}\n"
            .to_string();
    }

    let entries = relays
        .iter()
        .map(|relay| format!("        \"SOCKS5 {}\"", relay.socks5_endpoint()))
        .collect::<Vec<_>>()
        .join(",\n");
    format!(
        "function FindProxyForURL(url, host) {{\n    \
         var proxies = [\n{entries}\n    ];\n    \
         var start = Math.floor(Math.random() * proxies.length);\n    \
         var chain = proxies.slice(start).concat(proxies.slice(0, start));\n    \
         return chain.join(\"; \");\n}}\n"
    )
}

pub fn write_pac(relays: &[Relay], path: &Path) -> Result<()> {
    std::fs::write(path, render_pac(relays))
        .with_context(|| format!("Failed to write {}", path.display()))
}
