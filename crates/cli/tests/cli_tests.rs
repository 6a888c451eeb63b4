//! CLI integration tests

use std::io::Write;
use std::process::Command;

fn fcost(args: &[&str]) -> std::process::Output {
    let mut full = vec!["run", "-q", "-p", "fcost-cli", "--"];
    full.extend_from_slice(args);
    Command::new("cargo")
        .args(&full)
        .env("NO_COLOR", "1")
        .output()
        .expect("Failed to execute command")
}

/// Test that the CLI shows help
#[test]
fn test_cli_help() {
    let output = fcost(&["--help"]);
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(output.status.success(), "CLI help should succeed");
    assert!(stdout.contains("serverless"), "Should describe the tool");
    assert!(stdout.contains("compare"), "Should show compare command");
    assert!(stdout.contains("tier"), "Should show tier command");
}

/// Test that the CLI shows version
#[test]
fn test_cli_version() {
    let output = fcost(&["--version"]);
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(output.status.success(), "CLI version should succeed");
    assert!(stdout.contains("fcost"), "Should show binary name");
}

/// Test tier matching as JSON
#[test]
fn test_tier_match_json() {
    let output = fcost(&[
        "--format",
        "json",
        "tier",
        "match",
        "1",
        "3.5",
        "--charge-type",
        "postpaid",
    ]);
    assert!(
        output.status.success(),
        "tier match should succeed: {}",
        String::from_utf8_lossy(&output.stderr)
    );

    let value: serde_json::Value =
        serde_json::from_slice(&output.stdout).expect("tier match should print JSON");
    assert_eq!(value["tier"]["cpu"], 1.0);
    assert_eq!(value["tier"]["mem"], 4.0);
    assert_eq!(value["outcome"], "fitted");
}

/// Test tier matching saturates oversized demand
#[test]
fn test_tier_match_reports_ceiling() {
    let output = fcost(&["tier", "match", "20", "10"]);
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(output.status.success(), "tier match should succeed");
    assert!(stdout.contains("saturated at ceiling"), "Should report saturation");
}

/// Test an unforced match explains the prepaid band
#[test]
fn test_tier_match_explains_prepaid_band() {
    let output = fcost(&["tier", "match", "2", "4"]);
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(output.status.success(), "tier match should succeed");
    assert!(stdout.contains("PREPAID"), "Should pick prepaid");
    assert!(stdout.contains("prepaid needs 1 to 8 cores"), "Should explain the band");
}

/// Test tables shared across charge types say so
#[test]
fn test_tier_list_shared_table() {
    let output = fcost(&["tier", "list", "--arch", "amd"]);
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(output.status.success(), "tier list should succeed");
    assert!(stdout.contains("amd tiers, any charge type"), "Should name the table");
}

/// Test unknown architecture is rejected
#[test]
fn test_tier_match_rejects_unknown_arch() {
    let output = fcost(&["tier", "match", "1", "2", "--arch", "sparc"]);
    assert!(!output.status.success(), "Unknown architecture should fail");
}

/// Test tier listing help
#[test]
fn test_tier_list_help() {
    let output = fcost(&["tier", "list", "--help"]);
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(output.status.success(), "tier list help should succeed");
    assert!(stdout.contains("--arch"), "Should show arch option");
    assert!(stdout.contains("--charge-type"), "Should show charge type option");
}

/// Test a comparison over a small snapshot file
#[test]
fn test_compare_snapshot_json() {
    let mut file = tempfile::Builder::new()
        .suffix(".json")
        .tempfile()
        .expect("Failed to create snapshot");
    write!(
        file,
        r#"{{
            "cluster_id": "cls-cli",
            "nodes": [
                {{"name": "node-1", "cpu": 4, "mem": 8}}
            ],
            "workloads": [
                {{
                    "kind": "Deployment",
                    "namespace": "default",
                    "name": "web",
                    "spec": {{"cpu": 1, "mem": 2, "goods_num": 2}}
                }},
                {{
                    "kind": "DaemonSet",
                    "namespace": "kube-system",
                    "name": "agent",
                    "spec": {{"cpu": 0.1, "mem": 0.1}}
                }}
            ]
        }}"#
    )
    .unwrap();

    let path = file.path().to_str().unwrap();
    let output = fcost(&["--format", "json", "compare", path]);
    assert!(
        output.status.success(),
        "compare should succeed: {}",
        String::from_utf8_lossy(&output.stderr)
    );

    let value: serde_json::Value =
        serde_json::from_slice(&output.stdout).expect("compare should print JSON");
    assert!(value["original_cost"]["total_cost"].as_f64().unwrap() > 0.0);
    assert_eq!(value["recommended_cost"].as_array().unwrap().len(), 6);
    assert_eq!(value["workloads"].as_array().unwrap().len(), 2);
    assert_eq!(value["workloads"][1]["resources"]["cpu_request"], 1.0);
    assert!(value["workloads"][1]["serverless_tier"]["tier"].is_object());
    assert_eq!(value["recommended_workloads"].as_array().unwrap().len(), 0);
    assert_eq!(value["nodes"].as_array().unwrap().len(), 1);
    assert!(value["nodes"][0]["gpu"].is_number());
}

/// Test a missing snapshot file is an error
#[test]
fn test_compare_missing_snapshot() {
    let output = fcost(&["compare", "/nonexistent/snapshot.json"]);
    let stderr = String::from_utf8_lossy(&output.stderr);

    assert!(!output.status.success(), "Missing snapshot should fail");
    assert!(stderr.contains("Failed to read snapshot"));
}
