//! Configuration constants.
//!
//! This module defines the constants used throughout the application, including
//! the provider endpoints, artifact names, timeouts and retry defaults.

use std::time::Duration;

// Provider metadata
/// Mullvad's public WireGuard relay listing (v2 schema).
pub const API_URL: &str = "https://api.mullvad.net/public/relays/wireguard/v2";
/// Name under which the primary source is reported.
pub const PRIMARY_SOURCE_NAME: &str = "mullvad";
/// Timeout for the relay-metadata request.
pub const API_TIMEOUT: Duration = Duration::from_secs(10);
/// Suffix appended to every derived SOCKS5 hostname.
///
/// Every `socks5_endpoint` ends with this string.
pub const SOCKS5_SUFFIX: &str = ".relays.mullvad.net:1080";
/// Port used when an endpoint carries no explicit port.
pub const SOCKS5_DEFAULT_PORT: u16 = 1080;

// Source fetching
/// Default number of attempts per source (initial attempt included).
pub const DEFAULT_MAX_ATTEMPTS: usize = 2;
/// Default fixed delay between attempts, in seconds.
pub const DEFAULT_RETRY_DELAY_SECS: f64 = 0.25;
/// Default TTL of the on-disk response cache, in seconds.
pub const DEFAULT_CACHE_TTL_SECS: u64 = 300;
pub const DEFAULT_CACHE_DIR: &str = ".cache";

// Pipeline
/// Default SLA for a full pipeline run, in seconds.
pub const DEFAULT_SLA_SECONDS: f64 = 120.0;
/// Maximum number of exclusion samples kept in a filter report.
pub const MAX_EXCLUSION_SAMPLES: usize = 10;
/// Number of exclusion samples printed when no relay survives filtering.
pub const DIAGNOSTIC_SAMPLE_LIMIT: usize = 5;

// Verification
/// HTTP(S) target probed through each proxy.
pub const HTTP_TEST_URL: &str = "https://httpbin.org/ip";
/// WebSocket echo target probed through each proxy.
pub const WS_TEST_URL: &str = "wss://ws.postman-echo.com/raw";
/// Payload sent over the WebSocket connection; the echo must match it.
pub const WS_PING_PAYLOAD: &str = "ping";
pub const DEFAULT_VERIFY_TIMEOUT_SECS: u64 = 8;

// External tools
pub const DEFAULT_CHECKER_TIMEOUT_SECS: u64 = 60;
pub const DEFAULT_MUBENG_BIN: &str = "mubeng";
pub const DEFAULT_MUBENG_TIMEOUT_SECS: u64 = 60;
pub const CHECKER_INSTALL_GUIDANCE: &str = "Install via `mise install --from \
    git+https://github.com/monosans/proxy-scraper-checker.git --language=rust \
    proxy-scraper-checker` or provide --proxy-checker-bin.";
pub const MUBENG_INSTALL_GUIDANCE: &str = "Install via `mise install --from \
    git+https://github.com/mubeng/mubeng.git --language=go mubeng` or provide --mubeng-bin.";

// Artifacts
pub const DEFAULT_OUTPUT_DIR: &str = "build";
pub const JSON_ARTIFACT: &str = "mullvad_relays.json";
pub const CANONICAL_JSON_ARTIFACT: &str = "mullvad_relays_canonical.json";
pub const TEXT_ARTIFACT: &str = "mullvad_relays.txt";
pub const PAC_ARTIFACT: &str = "mullvad_relays.pac";
pub const CSV_ARTIFACT: &str = "mullvad_relays.csv";
pub const SUMMARY_ARTIFACT: &str = "pipeline_summary.json";
/// Column order of the CSV artifact.
pub const CSV_HEADER: [&str; 8] = [
    "hostname",
    "socks5_hostname",
    "socks5_endpoint",
    "city",
    "country",
    "provider",
    "ipv4",
    "ipv6",
];

// Process exit codes
pub const EXIT_FAILURE: i32 = 1;
pub const EXIT_VERIFY_FAILED: i32 = 2;
/// 128 + SIGINT
pub const EXIT_INTERRUPTED: i32 = 130;
