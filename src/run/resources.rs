//! Collaborators wired up for a pipeline run.

use std::time::Duration;

use anyhow::{Context, Result};
use log::{debug, info};

use crate::config::BuildArgs;
use crate::enrich::{ProxyChecker, ProxyScraperChecker};
use crate::initialization::init_api_client;
use crate::source::{FileSourceAdapter, MullvadApi, ResponseCache, SourceAdapter, SourceManager};
use crate::verify::{EndpointSummarizer, LiveVerifier, MubengSummarizer, ProxyVerifier};

/// External parties a run talks to.
///
/// Library callers and tests can assemble this directly with their own
/// adapters; the CLI uses [`Collaborators::from_args`].
pub struct Collaborators {
    pub sources: SourceManager,
    /// Runs only when set.
    pub checker: Option<Box<dyn ProxyChecker>>,
    pub verifier: Box<dyn ProxyVerifier>,
    /// Runs after live verification, when the run asks for it.
    pub summarizer: Option<Box<dyn EndpointSummarizer>>,
}

impl Collaborators {
    /// Live collaborators only, reading from `sources`.
    pub fn new(sources: SourceManager) -> Self {
        Self {
            sources,
            checker: None,
            verifier: Box::new(LiveVerifier),
            summarizer: None,
        }
    }

    /// Builds the collaborators described by the `build` flags.
    ///
    /// # Errors
    ///
    /// Fails when the API client or cache directory cannot be set up, or when
    /// a checker export file was given but does not exist.
    pub fn from_args(args: &BuildArgs) -> Result<Self> {
        let client = init_api_client().context("Failed to initialize HTTP client")?;
        let mut api = MullvadApi::new(client).with_url(&args.api_url);
        if args.no_cache {
            debug!("Response cache disabled");
        } else {
            let cache = ResponseCache::new(&args.cache_dir, Duration::from_secs(args.cache_ttl))?;
            api = api.with_cache(cache);
        }

        let adapters: Vec<Box<dyn SourceAdapter>> = args
            .extra_sources
            .iter()
            .map(|source| {
                info!("Adding supplemental source {} from {}", source.name, source.path.display());
                Box::new(FileSourceAdapter::new(&source.name, &source.path)) as Box<dyn SourceAdapter>
            })
            .collect();
        let retry_delay =
            Duration::try_from_secs_f64(args.retry_delay.max(0.0)).unwrap_or(Duration::ZERO);
        let sources =
            SourceManager::new(Box::new(api), adapters).with_retry(retry_delay, args.max_attempts);

        let checker = if args.enable_proxy_checker {
            let checker =
                ProxyScraperChecker::new(args.proxy_checker_bin.clone(), args.proxy_checker_export.clone())?
                    .with_args(args.proxy_checker_args.clone())
                    .with_timeout(Duration::from_secs(args.proxy_checker_timeout));
            Some(Box::new(checker) as Box<dyn ProxyChecker>)
        } else {
            None
        };

        let summarizer = args.verify_mubeng.then(|| {
            let summarizer = MubengSummarizer::new(&args.mubeng_bin)
                .with_args(args.mubeng_args.clone())
                .with_timeout(Duration::from_secs(args.mubeng_timeout));
            Box::new(summarizer) as Box<dyn EndpointSummarizer>
        });

        Ok(Self {
            sources,
            checker,
            verifier: Box::new(LiveVerifier),
            summarizer,
        })
    }
}
