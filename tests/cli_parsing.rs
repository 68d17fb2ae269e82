//! Tests for CLI subcommand parsing and its conversion into pipeline options.

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;

use relay_list::config::{Cli, Command, LogFormat};
use relay_list::verify::TlsPolicy;

fn parse(args: &[&str]) -> Cli {
    Cli::try_parse_from(args).expect("arguments should parse")
}

#[test]
fn test_subcommand_is_required() {
    assert!(Cli::try_parse_from(["relay_list"]).is_err());
    assert!(Cli::try_parse_from(["relay_list", "scan"]).is_err());
}

#[test]
fn test_global_flags_after_subcommand() {
    let cli = parse(&["relay_list", "build", "--log-format", "json", "--log-level", "debug"]);
    assert!(matches!(cli.log_format, LogFormat::Json));
    assert_eq!(cli.effective_log_level(), log::LevelFilter::Debug);
}

#[test]
fn test_build_options_reach_pipeline() {
    let cli = parse(&[
        "relay_list",
        "build",
        "--countries",
        "se",
        "--cities",
        "Gothenburg",
        "--include-owned",
        "--limit",
        "4",
        "--no-cache",
        "--output-dir",
        "/tmp/relays",
        "--emit-canonical-json",
        "--run-log",
        "/tmp/runs.jsonl",
        "--sla-seconds",
        "30",
        "--verify-limit",
        "2",
        "--verify-timeout",
        "3",
        "--verify-http-url",
        "http://127.0.0.1:8080/ip",
        "--verify-ws-url",
        "ws://127.0.0.1:8081/",
        "--verify-http-insecure",
    ]);
    let Command::Build(args) = cli.command else {
        panic!("expected build");
    };
    let options = args.pipeline_options();
    assert!(options.force_refresh);
    assert!(options.emit_canonical_json);
    assert!(options.filter.include_owned);
    assert_eq!(options.filter.limit, Some(4));
    assert_eq!(
        options.filter.cities.as_ref().unwrap().iter().next().map(String::as_str),
        Some("gothenburg")
    );
    assert_eq!(options.output_dir, PathBuf::from("/tmp/relays"));
    assert_eq!(options.run_log, Some(PathBuf::from("/tmp/runs.jsonl")));
    assert_eq!(options.sla_seconds, 30.0);
    assert_eq!(options.verify_sample_size, Some(2));
    assert!(!options.verify_summarizer);
    assert!(options.verification_requested());
    assert_eq!(options.targets.timeout, Duration::from_secs(3));
    assert_eq!(options.targets.http_url, "http://127.0.0.1:8080/ip");
    assert_eq!(options.targets.ws_url, "ws://127.0.0.1:8081/");
    assert_eq!(options.targets.tls, TlsPolicy::Insecure);
}

#[test]
fn test_tool_arguments_may_start_with_dashes() {
    let cli = parse(&[
        "relay_list",
        "build",
        "--enable-proxy-checker",
        "--proxy-checker-bin",
        "/opt/psc",
        "--proxy-checker-arg",
        "--json",
        "--proxy-checker-arg",
        "-q",
        "--verify-mubeng",
        "--mubeng-arg",
        "--check",
    ]);
    let Command::Build(args) = cli.command else {
        panic!("expected build");
    };
    assert!(args.enable_proxy_checker);
    assert_eq!(args.proxy_checker_bin.as_deref(), Some("/opt/psc"));
    assert_eq!(args.proxy_checker_args, vec!["--json", "-q"]);
    assert_eq!(args.mubeng_args, vec!["--check"]);
    assert!(args.pipeline_options().verify_summarizer);
}

#[test]
fn test_verify_defaults() {
    let cli = parse(&["relay_list", "verify"]);
    let Command::Verify(args) = cli.command else {
        panic!("expected verify");
    };
    assert_eq!(args.json, PathBuf::from("build/mullvad_relays.json"));
    assert_eq!(args.limit, None);
    let targets = args.verification_targets();
    assert_eq!(targets.http_url, "https://httpbin.org/ip");
    assert_eq!(targets.ws_url, "wss://ws.postman-echo.com/raw");
    assert_eq!(targets.timeout, Duration::from_secs(8));
    assert_eq!(targets.tls, TlsPolicy::Verify);
}

#[test]
fn test_verify_with_ca_bundle() {
    let cli = parse(&[
        "relay_list",
        "verify",
        "--json",
        "out/relays.json",
        "--limit",
        "3",
        "--http-ca",
        "/etc/ssl/corp.pem",
    ]);
    let Command::Verify(args) = cli.command else {
        panic!("expected verify");
    };
    assert_eq!(args.limit, Some(3));
    assert_eq!(
        args.verification_targets().tls,
        TlsPolicy::CaBundle(PathBuf::from("/etc/ssl/corp.pem"))
    );
}

#[test]
fn test_export_csv_requires_both_paths() {
    assert!(Cli::try_parse_from(["relay_list", "export-csv", "in.json"]).is_err());
    let cli = parse(&["relay_list", "export-csv", "in.json", "out.csv"]);
    assert!(matches!(cli.command, Command::ExportCsv(_)));
}
