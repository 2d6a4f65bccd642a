//! Integration tests for bmcfwctl CLI
//!
//! Commands that touch a BMC run against a wiremock server; the binary is
//! driven through assert_cmd on a blocking thread so the mock keeps serving.

use assert_cmd::Command;
use bmcfw_install::FirmwareComponent;
use bmcfw_redfish::{DELL_JOB_MIRROR_PATH, TASK_SERVICE_PATH};
use bmcfw_test_helpers::prelude::*;
use predicates::prelude::*;
use serde_json::{Value, json};
use std::process::Output;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Test helper to create a bmcfwctl command with no BMC settings leaking in
fn bmcfwctl() -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_bmcfwctl"));
    cmd.env_remove("BMCFW_HOST")
        .env_remove("BMCFW_USERNAME")
        .env_remove("BMCFW_PASSWORD")
        .env_remove("RUST_LOG");
    cmd
}

async fn run(args: Vec<String>) -> Result<Output, Box<dyn std::error::Error>> {
    let output = tokio::task::spawn_blocking(move || bmcfwctl().args(args).output()).await??;
    Ok(output)
}

fn args(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| (*s).to_string()).collect()
}

#[test]
fn test_cli_help() {
    bmcfwctl()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Redfish"));
}

#[test]
fn test_cli_version() {
    bmcfwctl()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("bmcfwctl"));
}

#[test]
fn test_steps_need_no_bmc() {
    bmcfwctl()
        .args(["--provider", "supermicro", "steps", "bmc"])
        .assert()
        .success()
        .stdout(predicate::str::contains("activate"));
}

#[test]
fn test_unsupported_component_exits_2() -> TestResult {
    let output = bmcfwctl()
        .args(["--json", "--provider", "supermicro", "steps", "nic"])
        .output()?;
    assert_eq!(output.status.code(), Some(2));

    let json: Value = serde_json::from_slice(&output.stdout)?;
    assert_eq!(json.get("success"), Some(&json!(false)));
    assert_eq!(json.pointer("/error/exit_code"), Some(&json!(2)));
    Ok(())
}

#[test]
fn test_missing_host_exits_2() {
    bmcfwctl()
        .arg("tasks")
        .assert()
        .code(2)
        .stderr(predicate::str::contains("--host"));
}

#[test]
fn test_missing_image_exits_1() -> TestResult {
    bmcfwctl()
        .args([
            "--host",
            "http://127.0.0.1:9",
            "install",
            "bios",
            "/nonexistent/BIOS.EXE",
        ])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("I/O error"));

    let output = bmcfwctl()
        .args([
            "--json",
            "--host",
            "http://127.0.0.1:9",
            "install",
            "bios",
            "/nonexistent/BIOS.EXE",
        ])
        .output()?;
    let json: Value = serde_json::from_slice(&output.stdout)?;
    assert_eq!(json.pointer("/error/exit_code"), Some(&json!(1)));
    Ok(())
}

#[test]
fn test_unreachable_bmc_exits_4() {
    bmcfwctl()
        .args(["--host", "http://127.0.0.1:9", "tasks"])
        .assert()
        .code(4);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_status_reads_dell_job_mirror() -> TestResult {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(format!("{TASK_SERVICE_PATH}/{DELL_JOB_ID}")))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(format!("{DELL_JOB_MIRROR_PATH}/{DELL_JOB_ID}")))
        .respond_with(ResponseTemplate::new(200).set_body_json(job_record(
            DELL_JOB_ID,
            "Completed",
            100,
        )))
        .mount(&server)
        .await;

    let output = run(args(&[
        "--json",
        "--host",
        &server.uri(),
        "--provider",
        "dell",
        "status",
        "bios",
        DELL_JOB_ID,
    ]))
    .await?;
    assert_eq!(output.status.code(), Some(0));

    let json: Value = serde_json::from_slice(&output.stdout)?;
    assert_eq!(json.pointer("/status/state"), Some(&json!("Succeeded")));
    assert_eq!(json.pointer("/status/source"), Some(&json!("job_mirror")));
    assert_eq!(json.pointer("/status/percent_complete"), Some(&json!(100)));
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn test_status_of_missing_task_exits_3() -> TestResult {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(format!("{TASK_SERVICE_PATH}/42")))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let output = run(args(&["--host", &server.uri(), "status", "bmc", "42"])).await?;
    assert_eq!(output.status.code(), Some(3));
    assert!(String::from_utf8_lossy(&output.stderr).contains("not found"));
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn test_install_refused_while_task_active() -> TestResult {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(TASK_SERVICE_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "Members": [{ "@odata.id": format!("{TASK_SERVICE_PATH}/{DELL_JOB_ID}") }]
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(format!("{TASK_SERVICE_PATH}/{DELL_JOB_ID}")))
        .respond_with(ResponseTemplate::new(200).set_body_json(dell_task(
            DELL_JOB_ID,
            FirmwareComponent::Bios,
            "Scheduled",
        )))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500))
        .expect(0)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir()?;
    let image = dir.path().join("BIOS_0JK2R_WN64_2.19.0.EXE");
    std::fs::write(&image, b"firmware-payload")?;

    let output = run(args(&[
        "--host",
        &server.uri(),
        "--provider",
        "dell",
        "install",
        "bios",
        &image.to_string_lossy(),
    ]))
    .await?;
    assert_eq!(output.status.code(), Some(2));
    assert!(String::from_utf8_lossy(&output.stderr).contains("already active"));
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn test_install_prints_task_handle() -> TestResult {
    let server = MockServer::start().await;
    let push_uri = "/redfish/v1/UpdateService/MultipartUpload";
    Mock::given(method("GET"))
        .and(path(TASK_SERVICE_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "Members": [] })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/redfish/v1/UpdateService"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "MultipartHttpPushUri": push_uri })),
        )
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(push_uri))
        .respond_with(ResponseTemplate::new(202).insert_header(
            "Location",
            format!("{TASK_SERVICE_PATH}/{DELL_JOB_ID}").as_str(),
        ))
        .expect(1)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir()?;
    let image = dir.path().join("BIOS_0JK2R_WN64_2.19.0.EXE");
    std::fs::write(&image, b"firmware-payload")?;

    let output = run(args(&[
        "--json",
        "--host",
        &server.uri(),
        "--provider",
        "dell",
        "install",
        "bios",
        &image.to_string_lossy(),
    ]))
    .await?;
    assert_eq!(output.status.code(), Some(0));

    let json: Value = serde_json::from_slice(&output.stdout)?;
    assert_eq!(json.get("task_id"), Some(&json!(DELL_JOB_ID)));
    assert_eq!(json.get("component"), Some(&json!("bios")));
    Ok(())
}
