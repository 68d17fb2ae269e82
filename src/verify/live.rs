//! Network-backed [`ProxyVerifier`].

use async_trait::async_trait;
use log::{debug, info};

use super::http::{preflight_http, probe_http};
use super::tls::client_config;
use super::types::{ProbeResult, ProxyVerifier, VerificationTargets};
use super::websocket::{preflight_ws, probe_ws};

/// Probes proxies over the network: an HTTP GET tunnelled with `socks5h`,
/// then a WebSocket echo over a SOCKS5 stream. Every check is bounded by
/// the targets' timeout.
#[derive(Debug, Clone, Copy, Default)]
pub struct LiveVerifier;

#[async_trait]
impl ProxyVerifier for LiveVerifier {
    async fn preflight(&self, targets: &VerificationTargets) -> anyhow::Result<()> {
        preflight_http(targets).await?;
        let tls = client_config(&targets.tls)?;
        tokio::time::timeout(targets.timeout, preflight_ws(&targets.ws_url, tls))
            .await
            .map_err(|_| {
                anyhow::anyhow!(
                    "{} timed out after {}s",
                    targets.ws_url,
                    targets.timeout.as_secs()
                )
            })??;
        debug!("Preflight passed for {} and {}", targets.http_url, targets.ws_url);
        Ok(())
    }

    async fn verify(&self, endpoints: &[String], targets: &VerificationTargets) -> Vec<ProbeResult> {
        let tls = client_config(&targets.tls);
        let mut results = Vec::with_capacity(endpoints.len());
        for endpoint in endpoints {
            let (http_ok, http_error, http_origin) = match probe_http(endpoint, targets).await {
                Ok(origin) => (true, None, origin),
                Err(e) => (false, Some(e), None),
            };
            let ws_outcome = match &tls {
                Ok(config) => {
                    match tokio::time::timeout(
                        targets.timeout,
                        probe_ws(endpoint, &targets.ws_url, config.clone()),
                    )
                    .await
                    {
                        Ok(Ok(())) => Ok(()),
                        Ok(Err(e)) => Err(format!("{e:#}")),
                        Err(_) => Err(format!("timed out after {}s", targets.timeout.as_secs())),
                    }
                }
                Err(e) => Err(e.to_string()),
            };
            let (ws_ok, ws_error) = match ws_outcome {
                Ok(()) => (true, None),
                Err(e) => (false, Some(e)),
            };
            info!(
                "Verified {}: http={} ws={}",
                endpoint,
                if http_ok { "ok" } else { "fail" },
                if ws_ok { "ok" } else { "fail" }
            );
            results.push(ProbeResult {
                endpoint: endpoint.clone(),
                http_ok,
                http_error,
                http_origin,
                ws_ok,
                ws_error,
            });
        }
        results
    }
}
