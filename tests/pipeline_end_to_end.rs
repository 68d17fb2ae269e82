//! End-to-end pipeline runs wired exactly as the CLI wires them: options and
//! collaborators built from parsed `build` flags, the relay API served by
//! wiremock.

use clap::Parser;
use serde_json::{json, Value};
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use relay_list::config::{BuildArgs, Cli, Command};
use relay_list::{run_pipeline, BuildErrorKind, Collaborators, RunOutcome};

#[path = "helpers.rs"]
mod helpers;

use helpers::sample_payload;

async fn relay_api(response: ResponseTemplate) -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/relays"))
        .respond_with(response)
        .mount(&server)
        .await;
    server
}

fn build_args(server: &MockServer, dir: &TempDir, extra: &[&str]) -> BuildArgs {
    let api_url = format!("{}/relays", server.uri());
    let output_dir = dir.path().join("build");
    let cache_dir = dir.path().join("cache");
    let mut argv: Vec<&str> = vec![
        "relay_list",
        "build",
        "--api-url",
        api_url.as_str(),
        "--output-dir",
        output_dir.to_str().unwrap(),
        "--cache-dir",
        cache_dir.to_str().unwrap(),
        "--retry-delay",
        "0",
    ];
    argv.extend_from_slice(extra);
    match Cli::try_parse_from(argv).expect("arguments should parse").command {
        Command::Build(args) => args,
        other => panic!("expected build, got {other:?}"),
    }
}

fn read_json(path: &std::path::Path) -> Value {
    serde_json::from_str(&std::fs::read_to_string(path).unwrap()).unwrap()
}

#[tokio::test]
async fn test_sample_payload_end_to_end() {
    let server = relay_api(ResponseTemplate::new(200).set_body_json(sample_payload())).await;
    let dir = TempDir::new().unwrap();
    let args = build_args(&server, &dir, &["--emit-canonical-json"]);

    let collaborators = Collaborators::from_args(&args).unwrap();
    let outcome = run_pipeline(&args.pipeline_options(), &collaborators).await.unwrap();
    let RunOutcome::Built {
        relay_count,
        artifacts,
    } = outcome
    else {
        panic!("expected a built outcome");
    };
    assert_eq!(relay_count, 5);

    let relays = read_json(&artifacts.json);
    let relays = relays.as_array().unwrap();
    assert_eq!(relays.len(), 5);
    assert!(relays.iter().all(|relay| relay["socks5_endpoint"]
        .as_str()
        .unwrap()
        .ends_with(".relays.mullvad.net:1080")));
    let text = std::fs::read_to_string(&artifacts.text).unwrap();
    assert_eq!(text.lines().count(), relays.len());
    assert!(std::fs::read_to_string(&artifacts.pac)
        .unwrap()
        .contains("FindProxyForURL"));
    let csv = std::fs::read_to_string(&artifacts.csv).unwrap();
    assert_eq!(csv.lines().count(), relays.len() + 1);

    let canonical = read_json(artifacts.canonical_json.as_ref().unwrap());
    assert!(canonical
        .as_array()
        .unwrap()
        .iter()
        .all(|relay| relay.get("display_label").is_none()));

    // The response was cached for the next run.
    assert_eq!(std::fs::read_dir(dir.path().join("cache")).unwrap().count(), 1);
}

#[tokio::test]
async fn test_supplemental_file_source_is_merged() {
    let server = relay_api(ResponseTemplate::new(200).set_body_json(sample_payload())).await;
    let dir = TempDir::new().unwrap();
    let mirror = dir.path().join("mirror.json");
    let payload = json!({
        "locations": {"de-fra": {"city": "Frankfurt", "country": "Germany"}},
        "wireguard": {"relays": [{
            "hostname": "de-fra-wg-101",
            "location": "de-fra",
            "provider": "DataPacket",
            "ipv4_addr_in": "146.70.117.2",
            "active": true,
            "include_in_country": true
        }]}
    });
    std::fs::write(&mirror, payload.to_string()).unwrap();
    let extra = format!("mirror={}", mirror.display());
    let args = build_args(&server, &dir, &["--no-cache", "--extra-source", extra.as_str(), "--countries", "de"]);

    let collaborators = Collaborators::from_args(&args).unwrap();
    let outcome = run_pipeline(&args.pipeline_options(), &collaborators).await.unwrap();
    let RunOutcome::Built { artifacts, .. } = outcome else {
        panic!("expected a built outcome");
    };
    let relays = read_json(&artifacts.json);
    assert_eq!(relays.as_array().unwrap().len(), 1);
    assert_eq!(relays[0]["source"], "mirror");
    assert_eq!(
        relays[0]["socks5_endpoint"],
        "de-fra-wg-socks5-101.relays.mullvad.net:1080"
    );
    assert!(!dir.path().join("cache").exists());

    let summary = read_json(&args.output_dir.join("pipeline_summary.json"));
    let sources: Vec<_> = summary["sources"]
        .as_array()
        .unwrap()
        .iter()
        .map(|source| source["name"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(sources, vec!["mullvad", "mirror"]);
    assert_eq!(summary["sources"][0]["cache_bypassed"], true);
}

#[tokio::test]
async fn test_owned_relays_need_opt_in() {
    let mut payload = sample_payload();
    payload["wireguard"]["relays"]
        .as_array_mut()
        .unwrap()
        .push(json!({
            "hostname": "se-got-wg-002",
            "location": "se-got",
            "provider": "31173",
            "ipv4_addr_in": "185.213.154.69",
            "owned": true,
            "active": true,
            "include_in_country": true
        }));
    let server = relay_api(ResponseTemplate::new(200).set_body_json(payload)).await;

    let dir = TempDir::new().unwrap();
    let args = build_args(&server, &dir, &["--no-cache"]);
    let outcome = run_pipeline(&args.pipeline_options(), &Collaborators::from_args(&args).unwrap())
        .await
        .unwrap();
    assert!(matches!(outcome, RunOutcome::Built { relay_count: 5, .. }));

    let args = build_args(&server, &dir, &["--no-cache", "--include-owned"]);
    let outcome = run_pipeline(&args.pipeline_options(), &Collaborators::from_args(&args).unwrap())
        .await
        .unwrap();
    assert!(matches!(outcome, RunOutcome::Built { relay_count: 6, .. }));
}

#[tokio::test]
async fn test_unmatched_filters_end_without_artifacts() {
    let server = relay_api(ResponseTemplate::new(200).set_body_json(sample_payload())).await;
    let dir = TempDir::new().unwrap();
    let args = build_args(
        &server,
        &dir,
        &["--no-cache", "--countries", "mars", "--providers-allow", "unknown"],
    );
    let outcome = run_pipeline(&args.pipeline_options(), &Collaborators::from_args(&args).unwrap())
        .await
        .unwrap();
    let RunOutcome::NoMatches { message, samples } = outcome else {
        panic!("expected no matches");
    };
    assert!(message.contains("Remaining 0 relays"));
    assert!(message.contains("countries:mars"));
    assert!(message.contains("providers_allow:unknown"));
    assert!(samples.iter().all(|sample| sample.starts_with("Excluded (countries)")));
    assert!(!args.output_dir.join("mullvad_relays.json").exists());
}

#[tokio::test]
async fn test_api_failure_is_fatal_after_retries() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/relays"))
        .respond_with(ResponseTemplate::new(500))
        .expect(3)
        .mount(&server)
        .await;
    let dir = TempDir::new().unwrap();
    let args = build_args(&server, &dir, &["--no-cache", "--max-attempts", "3"]);

    let err = run_pipeline(&args.pipeline_options(), &Collaborators::from_args(&args).unwrap())
        .await
        .unwrap_err();
    assert_eq!(err.kind(), BuildErrorKind::Fetch);
    assert!(err.message().starts_with("Unexpected status 500 from"));

    let summary = read_json(&args.output_dir.join("pipeline_summary.json"));
    assert_eq!(summary["status"], "error");
    assert_eq!(summary["sources"][0]["attempts"], 3);
}
