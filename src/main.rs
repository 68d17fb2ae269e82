//! Main application entry point (CLI binary).
//!
//! This is a thin wrapper around the `relay_list` library that handles:
//! - Command-line argument parsing
//! - Environment variable loading (.env file)
//! - Logger initialization
//! - User-facing output and exit codes
//!
//! All core functionality is implemented in the library crate.

use std::future::Future;
use std::process;

use anyhow::{Context, Result};
use clap::Parser;

use relay_list::config::{
    BuildArgs, Cli, Command, ExportCsvArgs, VerifyArgs, EXIT_FAILURE, EXIT_INTERRUPTED,
    EXIT_VERIFY_FAILED,
};
use relay_list::export::convert_json_to_csv;
use relay_list::initialization::{init_crypto_provider, init_logger_with};
use relay_list::verify::{load_endpoints, LiveVerifier, ProxyVerifier};
use relay_list::{run_pipeline_until, BuildErrorKind, Collaborators, RunOutcome};

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file (if it exists) so the
    // env-backed flags can be set there
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    init_logger_with(cli.effective_log_level(), cli.log_format.clone())
        .context("Failed to initialize logger")?;

    // Initialize crypto provider for TLS operations
    init_crypto_provider();

    // The pipeline handles Ctrl-C itself so it can persist its run summary
    let code = match cli.command {
        Command::Build(args) => build(args).await,
        Command::Verify(args) => interruptible(verify(args)).await,
        Command::ExportCsv(args) => export_csv(args),
    };
    if code != 0 {
        process::exit(code);
    }
    Ok(())
}

async fn interruptible(task: impl Future<Output = i32>) -> i32 {
    tokio::select! {
        code = task => code,
        _ = tokio::signal::ctrl_c() => {
            eprintln!("Interrupted");
            EXIT_INTERRUPTED
        }
    }
}

async fn interrupted() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        log::warn!("Failed to listen for Ctrl-C: {}", e);
        std::future::pending::<()>().await;
    }
}

async fn build(args: BuildArgs) -> i32 {
    let collaborators = match Collaborators::from_args(&args) {
        Ok(collaborators) => collaborators,
        Err(e) => {
            eprintln!("{e:#}");
            return EXIT_FAILURE;
        }
    };

    match run_pipeline_until(&args.pipeline_options(), &collaborators, interrupted()).await {
        Ok(RunOutcome::Built {
            relay_count,
            artifacts,
        }) => {
            println!(
                "Wrote {} relays to {}, {}, {}, and {}",
                relay_count,
                artifacts.json.display(),
                artifacts.text.display(),
                artifacts.pac.display(),
                artifacts.csv.display()
            );
            if let Some(path) = artifacts.canonical_json {
                println!("Canonical JSON written to {}", path.display());
            }
            0
        }
        Ok(RunOutcome::NoMatches { message, samples }) => {
            eprintln!("No relays matched the provided filters");
            eprintln!("{message}");
            for sample in samples {
                eprintln!("  {sample}");
            }
            EXIT_FAILURE
        }
        Err(e) if e.kind() == BuildErrorKind::Interrupted => {
            eprintln!("Interrupted");
            EXIT_INTERRUPTED
        }
        Err(e) => {
            eprintln!("{e}");
            EXIT_FAILURE
        }
    }
}

async fn verify(args: VerifyArgs) -> i32 {
    let endpoints = match load_endpoints(&args.json, args.limit) {
        Ok(endpoints) => endpoints,
        Err(e) => {
            eprintln!("{e:#}");
            return EXIT_FAILURE;
        }
    };
    if endpoints.is_empty() {
        eprintln!("No endpoints to verify");
        return EXIT_FAILURE;
    }

    let targets = args.verification_targets();
    println!("HTTP target: {}", targets.http_url);
    println!("WebSocket target: {}", targets.ws_url);

    let results = LiveVerifier.verify(&endpoints, &targets).await;
    let mut http_success = 0;
    let mut ws_success = 0;
    for result in &results {
        http_success += usize::from(result.http_ok);
        ws_success += usize::from(result.ws_ok);
        let http = match (&result.http_error, &result.http_origin) {
            (Some(error), _) => format!("FAIL ({error})"),
            (None, Some(origin)) => format!("OK (origin {origin})"),
            (None, None) => "OK".to_string(),
        };
        let ws = match &result.ws_error {
            Some(error) => format!("FAIL ({error})"),
            None => "OK".to_string(),
        };
        println!("{}: HTTP {} | WebSocket {}", result.endpoint, http, ws);
    }
    println!(
        "HTTP success: {}/{}, WebSocket success: {}/{}",
        http_success,
        results.len(),
        ws_success,
        results.len()
    );

    if http_success > 0 && ws_success > 0 {
        0
    } else {
        EXIT_VERIFY_FAILED
    }
}

fn export_csv(args: ExportCsvArgs) -> i32 {
    match convert_json_to_csv(&args.source, &args.destination) {
        Ok(count) => {
            println!("Wrote {} relays to {}", count, args.destination.display());
            0
        }
        Err(e) => {
            eprintln!("{e:#}");
            EXIT_FAILURE
        }
    }
}
