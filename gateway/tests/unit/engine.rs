//! Execution engine: parse-first fallback, configuration, and diagnostics.

#![allow(clippy::expect_used, clippy::unwrap_used)]

use netgate::application::services::engine::execute;
use netgate::domain::{CommandRequest, DeviceValue, DriverError, OperationClass, Status};

use crate::mocks::{Behavior, MockDirectory};

fn request(class: OperationClass, command: &str) -> CommandRequest {
    CommandRequest::new(class, "r1", command)
}

#[tokio::test]
async fn show_with_parser_returns_structured_output() {
    let parsed = DeviceValue::map([("version", DeviceValue::text("17.9.4"))]);
    let directory = MockDirectory::with_device("r1", Behavior::parsed(parsed.clone()));
    let session = directory.session("r1");

    let envelope = execute(&session, &request(OperationClass::Show, "show version")).await;

    assert_eq!(envelope.status(), Status::Completed);
    assert_eq!(envelope.output(), Some(&parsed));
    assert!(directory.recorder.executed().is_empty());
}

#[tokio::test]
async fn show_parse_failure_falls_back_to_raw() {
    let directory = MockDirectory::with_device("r1", Behavior::raw("Cisco IOS XE"));
    let session = directory.session("r1");

    let envelope = execute(&session, &request(OperationClass::Show, "show clock")).await;

    assert_eq!(envelope.status(), Status::CompletedRaw);
    assert_eq!(envelope.output(), Some(&DeviceValue::text("Cisco IOS XE")));
    assert_eq!(directory.recorder.parsed(), ["show clock"]);
    assert_eq!(directory.recorder.executed(), ["show clock"]);
}

#[tokio::test]
async fn ping_uses_same_fallback_as_show() {
    let directory = MockDirectory::with_device("r1", Behavior::raw("!!!!!"));
    let session = directory.session("r1");

    let envelope = execute(&session, &request(OperationClass::Ping, "ping 10.0.0.2")).await;

    assert_eq!(envelope.status(), Status::CompletedRaw);
    assert_eq!(directory.recorder.parsed(), ["ping 10.0.0.2"]);
}

#[tokio::test]
async fn raw_failure_after_fallback_is_error() {
    let behavior = Behavior {
        execute: Err(DriverError::Command("% Invalid input".to_string())),
        ..Behavior::default()
    };
    let directory = MockDirectory::with_device("r1", behavior);
    let session = directory.session("r1");

    let envelope = execute(&session, &request(OperationClass::Show, "show bogus")).await;

    assert_eq!(envelope.status(), Status::Error);
    assert_eq!(envelope.error_kind().unwrap().kind(), "execution_error");
}

#[tokio::test]
async fn linux_without_parser_skips_parse() {
    let directory = MockDirectory::with_device("web", Behavior::raw("total 0"));
    let session = directory.session("web");

    let envelope = execute(
        &session,
        &CommandRequest::new(OperationClass::LinuxRaw, "web", "ls -la | wc -l"),
    )
    .await;

    assert_eq!(envelope.status(), Status::CompletedRaw);
    assert!(directory.recorder.parsed().is_empty());
    assert_eq!(directory.recorder.executed(), ["ls -la | wc -l"]);
}

#[tokio::test]
async fn linux_with_parser_returns_structured_output() {
    let parsed = DeviceValue::map([("interfaces", DeviceValue::Seq(vec![]))]);
    let directory = MockDirectory::with_device("web", Behavior::parsed(parsed));
    let session = directory.session("web");

    let envelope = execute(
        &session,
        &CommandRequest::new(OperationClass::LinuxRaw, "web", "ifconfig"),
    )
    .await;

    assert_eq!(envelope.status(), Status::Completed);
}

#[tokio::test]
async fn config_block_is_dedented_before_apply() {
    let directory = MockDirectory::with_device("r1", Behavior::default());
    let session = directory.session("r1");
    let block = "\n    interface Loopback0\n      description mgmt\n";

    let envelope = execute(&session, &request(OperationClass::Config, block)).await;

    assert_eq!(envelope.status(), Status::Success);
    assert_eq!(envelope.output(), Some(&DeviceValue::text("r1(config)#end")));
    assert_eq!(
        directory.recorder.configured(),
        ["interface Loopback0\n  description mgmt"]
    );
}

#[tokio::test]
async fn config_driver_failure_is_error() {
    let behavior = Behavior {
        configure: Err(DriverError::Command("% Incomplete command".to_string())),
        ..Behavior::default()
    };
    let directory = MockDirectory::with_device("r1", behavior);
    let session = directory.session("r1");

    let envelope = execute(&session, &request(OperationClass::Config, "router bgp")).await;

    assert_eq!(envelope.status(), Status::Error);
    let json = envelope.to_json();
    assert_eq!(json["error"], "command failed: % Incomplete command");
}

#[tokio::test]
async fn learn_config_strips_terminal_escapes() {
    let directory = MockDirectory::with_device(
        "r1",
        Behavior::raw("\u{1b}[1mhostname r1\u{1b}[0m\r\n!\u{7}"),
    );
    let session = directory.session("r1");

    let envelope = execute(&session, &request(OperationClass::LearnConfig, "")).await;

    assert_eq!(envelope.status(), Status::CompletedRaw);
    assert_eq!(directory.recorder.executed(), ["show run brief"]);
    assert_eq!(
        envelope.output(),
        Some(&DeviceValue::map([(
            "raw_output",
            DeviceValue::text("hostname r1\r\n!")
        )]))
    );
}

#[tokio::test]
async fn learn_logging_keeps_output_verbatim() {
    let directory = MockDirectory::with_device("r1", Behavior::raw("\u{1b}[1m%LINK-3-UPDOWN"));
    let session = directory.session("r1");

    let envelope = execute(&session, &request(OperationClass::LearnLogging, "")).await;

    assert_eq!(directory.recorder.executed(), ["show logging last 250"]);
    assert_eq!(
        envelope.output(),
        Some(&DeviceValue::map([(
            "raw_output",
            DeviceValue::text("\u{1b}[1m%LINK-3-UPDOWN")
        )]))
    );
}
