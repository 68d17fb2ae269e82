//! HTTP(S) probes.

use log::debug;
use serde_json::Value;

use crate::initialization::init_probe_client;

use super::describe_error;
use super::types::VerificationTargets;

/// GETs the HTTP target through `endpoint` as a SOCKS5 proxy.
///
/// Hostnames are resolved by the proxy and any status below 400 passes. On
/// success, returns the `origin` (or `ip`) field of a JSON body when there is
/// one. Errors are rendered as text for the probe result.
pub(crate) async fn probe_http(
    endpoint: &str,
    targets: &VerificationTargets,
) -> Result<Option<String>, String> {
    let proxy = reqwest::Proxy::all(format!("socks5h://{endpoint}"))
        .map_err(|e| describe_error(&e))?;
    let client = init_probe_client(targets.timeout, &targets.tls, Some(proxy))
        .map_err(|e| describe_error(&e))?;

    let response = client
        .get(&targets.http_url)
        .send()
        .await
        .map_err(|e| describe_error(&e))?;
    let status = response.status();
    if status.is_client_error() || status.is_server_error() {
        return Err(format!("HTTP {}", status.as_u16()));
    }

    let origin = match response.json::<Value>().await {
        Ok(body) => ["origin", "ip"]
            .into_iter()
            .find_map(|key| body.get(key).and_then(Value::as_str))
            .filter(|origin| !origin.is_empty())
            .map(str::to_string),
        Err(e) => {
            debug!("HTTP target body via {} is not JSON: {}", endpoint, e);
            None
        }
    };
    Ok(origin)
}

/// Direct GET of the HTTP target. Any response counts as reachable.
pub(crate) async fn preflight_http(targets: &VerificationTargets) -> anyhow::Result<()> {
    let client = init_probe_client(targets.timeout, &targets.tls, None)?;
    let response = client
        .get(&targets.http_url)
        .send()
        .await
        .map_err(|e| anyhow::anyhow!("{} unreachable: {}", targets.http_url, describe_error(&e)))?;
    debug!("Preflight {} answered {}", targets.http_url, response.status());
    Ok(())
}
