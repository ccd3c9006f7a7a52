#![allow(deprecated)]
//! CLI contract: exit codes, console output and what reaches the network.

use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::json;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

// Nothing listens here; reaching the network would surface as exit 1.
const UNREACHABLE_URL: &str = "http://127.0.0.1:9";

fn sb_cli() -> Command {
    let mut cmd = Command::cargo_bin("sb-cli").unwrap();
    cmd.env_remove("SWEBENCH_API_URL")
        .env_remove("SWEBENCH_API_KEY")
        .env_remove("SB_CLI_MAX_PREDICTION_SIZE_MB")
        .env("RUST_LOG", "off");
    cmd
}

fn write_predictions(dir: &TempDir, name: &str, value: serde_json::Value) -> PathBuf {
    let path = dir.path().join(name);
    std::fs::write(&path, serde_json::to_string(&value).unwrap()).unwrap();
    path
}

fn submit_args(path: &Path, api_url: &str) -> Vec<String> {
    vec![
        "submit".into(),
        "swe-bench_lite".into(),
        "test".into(),
        "--predictions-path".into(),
        path.display().to_string(),
        "--api-url".into(),
        api_url.into(),
        "--run-id".into(),
        "r-1".into(),
    ]
}

#[test]
fn duplicate_instance_fails_before_network() {
    let dir = TempDir::new().unwrap();
    let preds = write_predictions(
        &dir,
        "preds.json",
        json!([
            {"instance_id": "a", "model_patch": "x", "model_name_or_path": "m"},
            {"instance_id": "a", "model_patch": "y", "model_name_or_path": "m"}
        ]),
    );

    sb_cli()
        .args(submit_args(&preds, UNREACHABLE_URL))
        .assert()
        .code(2)
        .stderr(predicate::str::contains("Validation failed"))
        .stderr(predicate::str::contains("duplicate instance IDs"));
}

#[test]
fn multiple_models_fail_before_network() {
    let dir = TempDir::new().unwrap();
    let preds = write_predictions(
        &dir,
        "preds.json",
        json!({
            "a": {"model_patch": "x", "model_name_or_path": "m1"},
            "b": {"model_patch": "y", "model_name_or_path": "m2"}
        }),
    );

    sb_cli()
        .args(submit_args(&preds, UNREACHABLE_URL))
        .assert()
        .code(2)
        .stderr(predicate::str::contains("same model"));
}

#[test]
fn allow_list_filtering_everything_is_noop() {
    let dir = TempDir::new().unwrap();
    let preds = write_predictions(
        &dir,
        "preds.json",
        json!({"a": {"model_patch": "x", "model_name_or_path": "m"}}),
    );

    sb_cli()
        .args(submit_args(&preds, UNREACHABLE_URL))
        .args(["--instance-ids", "b"])
        .assert()
        .code(0)
        .stderr(predicate::str::contains("No predictions to submit"))
        .stderr(predicate::str::contains("Warning").not());
}

#[test]
fn missing_file_is_config_error() {
    let dir = TempDir::new().unwrap();
    sb_cli()
        .args(submit_args(&dir.path().join("absent.jsonl"), UNREACHABLE_URL))
        .assert()
        .code(2)
        .stderr(predicate::str::contains("failed to read"));
}

#[test]
fn validate_reports_oversized() {
    let dir = TempDir::new().unwrap();
    let preds = dir.path().join("preds.jsonl");
    let lines = [
        json!({"instance_id": "big", "model_patch": "+".repeat(4096), "model_name_or_path": "m"}),
        json!({"instance_id": "small", "model_patch": "x", "model_name_or_path": "m"}),
    ]
    .iter()
    .map(|v| v.to_string())
    .collect::<Vec<_>>()
    .join("\n");
    std::fs::write(&preds, lines).unwrap();

    sb_cli()
        .args([
            "validate",
            "--predictions-path",
            preds.to_str().unwrap(),
            "--max-prediction-size-mb",
            "0.001",
        ])
        .assert()
        .code(0)
        .stderr(predicate::str::contains(
            "Warning: 1 predictions exceed 0.001MB size limit",
        ))
        .stderr(predicate::str::contains("  - big: "))
        .stderr(predicate::str::contains(
            "1 predictions ready to submit, 1 skipped for size",
        ));
}

#[test]
fn oversized_detail_is_capped_with_default_logging() {
    let dir = TempDir::new().unwrap();
    let preds = dir.path().join("preds.jsonl");
    let lines = (0..25)
        .map(|i| {
            json!({"instance_id": format!("big-{i}"), "model_patch": "+".repeat(4096), "model_name_or_path": "m"})
                .to_string()
        })
        .collect::<Vec<_>>()
        .join("\n");
    std::fs::write(&preds, lines).unwrap();

    let assert = sb_cli()
        .env_remove("RUST_LOG")
        .args([
            "validate",
            "--predictions-path",
            preds.to_str().unwrap(),
            "--max-prediction-size-mb",
            "0.001",
        ])
        .assert()
        .code(0);

    let stderr = String::from_utf8_lossy(&assert.get_output().stderr).into_owned();
    let mentions = stderr.lines().filter(|l| l.contains("big-")).count();
    assert_eq!(mentions, 10, "stderr:\n{stderr}");
    assert!(stderr.contains("  ... and 15 more"));
    assert!(stderr.contains("0 predictions ready to submit, 25 skipped for size"));
}

#[test]
fn version_prints_package_version() {
    sb_cli()
        .arg("version")
        .assert()
        .code(0)
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

#[tokio::test(flavor = "multi_thread")]
async fn oversized_skipped_sibling_submitted() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/submit"))
        .and(header("x-api-key", "k-123"))
        .and(body_partial_json(json!({
            "subset": "swe-bench_lite",
            "split": "test",
            "run_id": "r-1",
            "prediction": {"instance_id": "small"}
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": true})))
        .expect(1)
        .mount(&mock_server)
        .await;

    let dir = TempDir::new().unwrap();
    let preds = write_predictions(
        &dir,
        "preds.json",
        json!([
            {"instance_id": "big", "model_patch": "+".repeat(4096), "model_name_or_path": "m"},
            {"instance_id": "small", "model_patch": "x", "model_name_or_path": "m"}
        ]),
    );
    let mut args = submit_args(&preds, &mock_server.uri());
    args.extend(["--max-prediction-size-mb".into(), "0.001".into()]);

    let assert = tokio::task::spawn_blocking(move || {
        sb_cli()
            .args(args)
            .env("SWEBENCH_API_KEY", "k-123")
            .assert()
    })
    .await
    .unwrap();

    assert
        .code(0)
        .stdout(predicate::str::diff("r-1\n"))
        .stderr(predicate::str::contains("  - big: "))
        .stderr(predicate::str::contains("Submitted 1/1 predictions (run id: r-1)"));
}

#[tokio::test(flavor = "multi_thread")]
async fn rejected_submission_exits_one() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/submit"))
        .respond_with(
            ResponseTemplate::new(403).set_body_json(json!({"message": "run id already used"})),
        )
        .expect(2)
        .mount(&mock_server)
        .await;

    let dir = TempDir::new().unwrap();
    let preds = write_predictions(
        &dir,
        "preds.json",
        json!([
            {"instance_id": "a", "model_patch": "x", "model_name_or_path": "m"},
            {"instance_id": "b", "model_patch": "y", "model_name_or_path": "m"}
        ]),
    );
    let args = submit_args(&preds, &mock_server.uri());

    let assert = tokio::task::spawn_blocking(move || sb_cli().args(args).assert())
        .await
        .unwrap();

    assert
        .code(1)
        .stderr(predicate::str::contains("Submitted 0/2 predictions"))
        .stderr(predicate::str::contains("2 submissions failed:"))
        .stderr(predicate::str::contains("run id already used"));
}
