//! Command policy as enforced by the gateway: rejected requests never reach
//! the directory or a device.

#![allow(clippy::expect_used, clippy::unwrap_used)]

use netgate::domain::{CommandRequest, OperationClass, Status};

use crate::mocks::{Behavior, MockDirectory, fast_config, gateway};

async fn assert_rejected(class: OperationClass, command: &str, message: &str) {
    let (gateway, recorder) = gateway(
        MockDirectory::with_device("r1", Behavior::default()),
        &fast_config(),
    );

    let envelope = gateway
        .dispatch(CommandRequest::new(class, "r1", command))
        .await;

    assert_eq!(envelope.status(), Status::Error, "{command}");
    assert_eq!(envelope.device(), "r1");
    assert_eq!(envelope.to_json()["error"], message);
    assert_eq!(recorder.lookups(), 0, "policy must run before lookup");
    assert_eq!(recorder.connects(), 0);
}

#[tokio::test]
async fn show_pipe_is_rejected() {
    assert_rejected(
        OperationClass::Show,
        "show run | include hostname",
        "Disallowed modifier in 'show run | include hostname'",
    )
    .await;
}

#[tokio::test]
async fn show_redirect_is_rejected() {
    assert_rejected(
        OperationClass::Show,
        "show tech > flash:tech.txt",
        "Disallowed modifier in 'show tech > flash:tech.txt'",
    )
    .await;
}

#[tokio::test]
async fn non_show_verb_is_rejected() {
    assert_rejected(
        OperationClass::Show,
        "reload",
        "Only 'show' commands allowed",
    )
    .await;
}

#[tokio::test]
async fn non_ping_verb_is_rejected() {
    assert_rejected(
        OperationClass::Ping,
        "traceroute 10.0.0.2",
        "Only 'ping' commands allowed",
    )
    .await;
}

#[tokio::test]
async fn erase_anywhere_in_config_is_rejected() {
    assert_rejected(
        OperationClass::Config,
        "interface Lo0\n no erase startup-config",
        "Dangerous 'erase' detected",
    )
    .await;
}

#[tokio::test]
async fn linux_commands_bypass_policy() {
    let (gateway, recorder) = gateway(
        MockDirectory::with_device("web", Behavior::raw("42")),
        &fast_config(),
    );

    let envelope = gateway
        .dispatch(CommandRequest::new(
            OperationClass::LinuxRaw,
            "web",
            "ps aux | grep sshd > /tmp/out",
        ))
        .await;

    assert_eq!(envelope.status(), Status::CompletedRaw);
    assert_eq!(recorder.executed(), ["ps aux | grep sshd > /tmp/out"]);
}

#[tokio::test]
async fn uppercase_show_is_accepted() {
    let (gateway, recorder) = gateway(
        MockDirectory::with_device("r1", Behavior::raw("up")),
        &fast_config(),
    );

    let envelope = gateway
        .dispatch(CommandRequest::new(OperationClass::Show, "r1", "  SHOW ip int brief"))
        .await;

    assert_eq!(envelope.status(), Status::CompletedRaw);
    assert_eq!(recorder.connects(), 1);
    assert_eq!(recorder.disconnects(), 1);
}
