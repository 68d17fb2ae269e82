//! Configuration types and CLI options.
//!
//! This module defines the enums and structs used for command-line argument
//! parsing, and their conversion into the library's configuration types.

use std::collections::BTreeSet;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use clap::{Args, Parser, Subcommand, ValueEnum};
use log::LevelFilter;

use crate::config::constants::*;
use crate::filter::FilterConfig;
use crate::run::PipelineOptions;
use crate::verify::{TlsPolicy, VerificationTargets};

/// Logging level for the application.
///
/// Controls the verbosity of log output, from most restrictive (Error) to most
/// verbose (Trace).
#[derive(Clone, Debug, ValueEnum)]
pub enum LogLevel {
    /// Only error messages
    Error,
    /// Error and warning messages
    Warn,
    /// Error, warning, and informational messages
    Info,
    /// All messages except trace
    Debug,
    /// All messages including trace
    Trace,
}

impl From<LogLevel> for LevelFilter {
    fn from(l: LogLevel) -> Self {
        match l {
            LogLevel::Error => LevelFilter::Error,
            LogLevel::Warn => LevelFilter::Warn,
            LogLevel::Info => LevelFilter::Info,
            LogLevel::Debug => LevelFilter::Debug,
            LogLevel::Trace => LevelFilter::Trace,
        }
    }
}

/// Log output format.
///
/// - `Plain`: Human-readable format with colors (default)
/// - `Json`: Structured JSON format for machine parsing
#[derive(Clone, Debug, ValueEnum)]
pub enum LogFormat {
    /// Human-readable format with colors (default)
    Plain,
    /// Structured JSON format for machine parsing
    Json,
}

/// Command-line interface of the `relay_list` binary.
#[derive(Debug, Parser)]
#[command(name = "relay_list", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Log level
    #[arg(long, value_enum, default_value_t = LogLevel::Warn, global = true)]
    pub log_level: LogLevel,

    /// Log format
    #[arg(long, value_enum, default_value_t = LogFormat::Plain, global = true)]
    pub log_format: LogFormat,

    /// Print progress information (raises the log level to at least info)
    #[arg(long, global = true)]
    pub verbose: bool,
}

impl Cli {
    /// Log level after applying `--verbose`.
    pub fn effective_log_level(&self) -> LevelFilter {
        let level = LevelFilter::from(self.log_level.clone());
        if self.verbose {
            level.max(LevelFilter::Info)
        } else {
            level
        }
    }
}

#[derive(Debug, Subcommand)]
#[allow(clippy::large_enum_variant)] // parsed once per process
pub enum Command {
    /// Fetch, filter, validate, enrich and (optionally) verify relays, then write artifacts
    Build(BuildArgs),
    /// Probe endpoints from a previously written JSON artifact
    Verify(VerifyArgs),
    /// Convert an enriched JSON artifact into CSV
    ExportCsv(ExportCsvArgs),
}

/// Supplemental source given as `NAME=PATH`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamedSource {
    pub name: String,
    pub path: PathBuf,
}

impl FromStr for NamedSource {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let (name, path) = value
            .split_once('=')
            .ok_or_else(|| format!("expected NAME=PATH, got '{value}'"))?;
        let name = name.trim();
        let path = path.trim();
        if name.is_empty() || path.is_empty() {
            return Err(format!("expected NAME=PATH, got '{value}'"));
        }
        Ok(Self {
            name: name.to_string(),
            path: PathBuf::from(path),
        })
    }
}

#[derive(Debug, Args)]
pub struct BuildArgs {
    /// Country names, ISO codes, or location IDs to include
    #[arg(long, num_args = 0.., value_name = "TOKEN")]
    pub countries: Vec<String>,

    /// City names or location IDs to include
    #[arg(long, num_args = 0.., value_name = "TOKEN")]
    pub cities: Vec<String>,

    /// Include Mullvad owned relays in the output (excluded by default)
    #[arg(long)]
    pub include_owned: bool,

    /// Comma-separated list of provider names to allow exclusively
    #[arg(long, value_name = "CSV")]
    pub providers_allow: Option<String>,

    /// Comma-separated list of provider names to exclude
    #[arg(long, value_name = "CSV")]
    pub providers_block: Option<String>,

    /// Limit the number of relays in the output after filtering
    #[arg(long)]
    pub limit: Option<usize>,

    /// Directory to write artifact files into
    #[arg(long, default_value = DEFAULT_OUTPUT_DIR)]
    pub output_dir: PathBuf,

    /// Directory for cached API responses
    #[arg(long, default_value = DEFAULT_CACHE_DIR)]
    pub cache_dir: PathBuf,

    /// Cache TTL for API responses in seconds
    #[arg(long, default_value_t = DEFAULT_CACHE_TTL_SECS)]
    pub cache_ttl: u64,

    /// Bypass on-disk cache and fetch fresh data
    #[arg(long)]
    pub no_cache: bool,

    /// Relay API endpoint
    #[arg(long, env = "MULLVAD_API_URL", default_value = API_URL)]
    pub api_url: String,

    /// Supplemental relay payload read from disk, as NAME=PATH (repeatable)
    #[arg(long = "extra-source", value_name = "NAME=PATH")]
    pub extra_sources: Vec<NamedSource>,

    /// Attempts per source before giving up
    #[arg(long, default_value_t = DEFAULT_MAX_ATTEMPTS)]
    pub max_attempts: usize,

    /// Delay between attempts, in seconds
    #[arg(long, default_value_t = DEFAULT_RETRY_DELAY_SECS)]
    pub retry_delay: f64,

    /// Maximum acceptable run duration in seconds (breach is reported, not fatal)
    #[arg(long, default_value_t = DEFAULT_SLA_SECONDS)]
    pub sla_seconds: f64,

    /// Also write relays without enrichment fields
    #[arg(long)]
    pub emit_canonical_json: bool,

    /// Append the run summary as one JSON line to this file
    #[arg(long, value_name = "PATH")]
    pub run_log: Option<PathBuf>,

    /// Number of relays to live-verify through their SOCKS5 endpoint
    #[arg(long)]
    pub verify_limit: Option<usize>,

    /// Run Mubeng over the verified endpoints
    #[arg(long)]
    pub verify_mubeng: bool,

    /// Timeout (seconds) for each verification check
    #[arg(long, default_value_t = DEFAULT_VERIFY_TIMEOUT_SECS)]
    pub verify_timeout: u64,

    /// HTTP(S) URL to probe through each proxy
    #[arg(long, default_value = HTTP_TEST_URL)]
    pub verify_http_url: String,

    /// WebSocket URL to probe through each proxy
    #[arg(long, default_value = WS_TEST_URL)]
    pub verify_ws_url: String,

    /// CA bundle (PEM) used for TLS verification of the probes
    #[arg(long, value_name = "PATH")]
    pub verify_http_ca: Option<PathBuf>,

    /// Skip TLS verification for the probes (not recommended)
    #[arg(long)]
    pub verify_http_insecure: bool,

    /// Enrich relays with Proxy Scraper Checker metadata
    #[arg(long)]
    pub enable_proxy_checker: bool,

    /// Proxy Scraper Checker binary
    #[arg(long, env = "PROXY_CHECKER_BIN")]
    pub proxy_checker_bin: Option<String>,

    /// Extra argument passed to the checker binary (repeatable)
    #[arg(long = "proxy-checker-arg", value_name = "ARG", allow_hyphen_values = true)]
    pub proxy_checker_args: Vec<String>,

    /// Checker timeout in seconds
    #[arg(long, default_value_t = DEFAULT_CHECKER_TIMEOUT_SECS)]
    pub proxy_checker_timeout: u64,

    /// Recorded checker output to load instead of running the binary
    #[arg(long, value_name = "PATH")]
    pub proxy_checker_export: Option<PathBuf>,

    /// Mubeng binary
    #[arg(long, env = "MUBENG_BIN", default_value = DEFAULT_MUBENG_BIN)]
    pub mubeng_bin: String,

    /// Extra argument passed to Mubeng (repeatable)
    #[arg(long = "mubeng-arg", value_name = "ARG", allow_hyphen_values = true)]
    pub mubeng_args: Vec<String>,

    /// Mubeng timeout in seconds
    #[arg(long, default_value_t = DEFAULT_MUBENG_TIMEOUT_SECS)]
    pub mubeng_timeout: u64,
}

impl BuildArgs {
    /// Filter policy described by the filter flags.
    pub fn filter_config(&self) -> FilterConfig {
        FilterConfig {
            countries: list_to_set(&self.countries),
            cities: list_to_set(&self.cities),
            include_owned: self.include_owned,
            providers_allow: self.providers_allow.as_deref().and_then(csv_to_set),
            providers_block: self.providers_block.as_deref().and_then(csv_to_set),
            limit: self.limit,
        }
    }

    pub fn verification_targets(&self) -> VerificationTargets {
        VerificationTargets {
            http_url: self.verify_http_url.clone(),
            ws_url: self.verify_ws_url.clone(),
            timeout: Duration::from_secs(self.verify_timeout),
            tls: TlsPolicy::from_flags(self.verify_http_insecure, self.verify_http_ca.as_ref()),
        }
    }

    pub fn pipeline_options(&self) -> PipelineOptions {
        PipelineOptions {
            filter: self.filter_config(),
            force_refresh: self.no_cache,
            output_dir: self.output_dir.clone(),
            emit_canonical_json: self.emit_canonical_json,
            run_log: self.run_log.clone(),
            sla_seconds: self.sla_seconds,
            verify_sample_size: self.verify_limit,
            verify_summarizer: self.verify_mubeng,
            targets: self.verification_targets(),
        }
    }
}

#[derive(Debug, Args)]
pub struct VerifyArgs {
    /// Path to JSON relay list
    #[arg(long, default_value = "build/mullvad_relays.json")]
    pub json: PathBuf,

    /// Limit number of proxies to test
    #[arg(long)]
    pub limit: Option<usize>,

    /// Timeout (seconds) for each network check
    #[arg(long, default_value_t = DEFAULT_VERIFY_TIMEOUT_SECS)]
    pub timeout: u64,

    /// HTTP(S) URL to probe through each proxy
    #[arg(long, default_value = HTTP_TEST_URL)]
    pub http_url: String,

    /// WebSocket URL to probe through each proxy
    #[arg(long, default_value = WS_TEST_URL)]
    pub ws_url: String,

    /// Path to CA bundle for the HTTPS probe
    #[arg(long, value_name = "PATH")]
    pub http_ca: Option<PathBuf>,

    /// Skip TLS verification for the HTTP probe (not recommended)
    #[arg(long)]
    pub http_insecure: bool,
}

impl VerifyArgs {
    pub fn verification_targets(&self) -> VerificationTargets {
        VerificationTargets {
            http_url: self.http_url.clone(),
            ws_url: self.ws_url.clone(),
            timeout: Duration::from_secs(self.timeout),
            tls: TlsPolicy::from_flags(self.http_insecure, self.http_ca.as_ref()),
        }
    }
}

#[derive(Debug, Args)]
pub struct ExportCsvArgs {
    /// Path to the enriched JSON artifact produced by the pipeline
    pub source: PathBuf,
    /// Path where the CSV artifact should be written
    pub destination: PathBuf,
}

fn list_to_set(values: &[String]) -> Option<BTreeSet<String>> {
    let set: BTreeSet<String> = values
        .iter()
        .map(|value| value.trim().to_lowercase())
        .filter(|value| !value.is_empty())
        .collect();
    (!set.is_empty()).then_some(set)
}

fn csv_to_set(value: &str) -> Option<BTreeSet<String>> {
    let set: BTreeSet<String> = value
        .split(',')
        .map(|item| item.trim().to_lowercase())
        .filter(|item| !item.is_empty())
        .collect();
    (!set.is_empty()).then_some(set)
}
