//! `SshExecutor` construction tests that read `SSH_AUTH_SOCK`.

#![allow(clippy::expect_used, unsafe_code)]

use serial_test::serial;
use stagehand_cli::domain::{ErrorKind, SshSettings};
use stagehand_cli::infra::{SshExecutor, SshTarget};

/// Run `f` with `SSH_AUTH_SOCK` set to `value`, restoring it afterwards.
fn with_agent_env<T>(value: Option<&str>, f: impl FnOnce() -> T) -> T {
    let saved = std::env::var_os("SSH_AUTH_SOCK");
    // SAFETY: every caller is #[serial], so no other test touches the env.
    unsafe {
        match value {
            Some(v) => std::env::set_var("SSH_AUTH_SOCK", v),
            None => std::env::remove_var("SSH_AUTH_SOCK"),
        }
    }
    let result = f();
    unsafe {
        match saved {
            Some(v) => std::env::set_var("SSH_AUTH_SOCK", v),
            None => std::env::remove_var("SSH_AUTH_SOCK"),
        }
    }
    result
}

fn target() -> SshTarget {
    SshTarget::new("web-1", &SshSettings::default())
}

#[test]
#[serial]
fn test_connect_without_agent_is_a_transport_error() {
    let err = with_agent_env(None, || SshExecutor::connect(target())).expect_err("no agent");
    assert_eq!(err.kind(), ErrorKind::Transport);
    assert!(err.to_string().contains("SSH_AUTH_SOCK"));
}

#[test]
#[serial]
fn test_connect_with_agent_succeeds() {
    let exec = with_agent_env(Some("/tmp/agent.sock"), || SshExecutor::connect(target()))
        .expect("agent present");
    assert_eq!(exec.target().host, "web-1");
    assert_eq!(exec.target().user, "root");
}
