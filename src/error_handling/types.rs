//! Error type definitions.
//!
//! `BuildError` is the single fatal error of a pipeline run. Its `kind` only
//! shapes the message and the run summary; control flow treats every kind the
//! same way.

use std::fmt;

use log::SetLoggerError;
use reqwest::Error as ReqwestError;
use strum_macros::{AsRefStr, Display, EnumIter};
use thiserror::Error;

/// Error types for initialization failures.
#[derive(Error, Debug)]
#[allow(clippy::enum_variant_names)] // All variants end with "Error" by convention
pub enum InitializationError {
    /// Error initializing the logger.
    #[error("Logger initialization error: {0}")]
    LoggerError(#[from] SetLoggerError),

    /// Error initializing an HTTP client.
    #[error("HTTP client initialization error: {0}")]
    HttpClientError(#[from] ReqwestError),

    /// The CA bundle could not be read or parsed.
    #[error("CA bundle error: {0}")]
    CaBundleError(String),

    /// The TLS configuration could not be assembled.
    #[error("TLS configuration error: {0}")]
    TlsConfigError(String),
}

/// Category of a fatal pipeline failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, AsRefStr, EnumIter)]
#[strum(serialize_all = "snake_case")]
pub enum BuildErrorKind {
    /// The primary source could not be fetched or decoded.
    Fetch,
    /// A payload lacks the keys the normalizer requires.
    Structure,
    /// No source produced a payload.
    NoSources,
    /// The proxy checker failed or returned unusable output.
    ProxyChecker,
    /// The verification targets are unreachable without any proxy.
    Preflight,
    /// At least one endpoint failed a live probe.
    Verification,
    /// The secondary summarizer failed or reported `ok: false`.
    Summarizer,
    /// Artifacts or the run summary could not be written.
    Output,
    /// The run was cancelled before it finished.
    Interrupted,
}

/// Uniform fatal error raised by any pipeline stage.
#[derive(Debug)]
pub struct BuildError {
    kind: BuildErrorKind,
    message: String,
    cause: Option<anyhow::Error>,
}

impl BuildError {
    pub fn new(kind: BuildErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            cause: None,
        }
    }

    pub fn with_cause(
        kind: BuildErrorKind,
        message: impl Into<String>,
        cause: impl Into<anyhow::Error>,
    ) -> Self {
        Self {
            kind,
            message: message.into(),
            cause: Some(cause.into()),
        }
    }

    pub fn kind(&self) -> BuildErrorKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn cause(&self) -> Option<&anyhow::Error> {
        self.cause.as_ref()
    }
}

impl fmt::Display for BuildError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for BuildError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.cause.as_ref().map(|cause| {
            let source: &(dyn std::error::Error + 'static) = cause.as_ref();
            source
        })
    }
}
