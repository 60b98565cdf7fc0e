//! Quoting round-trips through a real POSIX shell.

#![allow(clippy::expect_used)]

use std::collections::BTreeMap;

use stagehand_cli::application::ports::{Command, Executor};
use stagehand_cli::domain::command_line;
use stagehand_cli::infra::LocalExecutor;

/// Run a rendered command line the way a remote login shell would.
async fn run_line(line: String) -> String {
    let mut out = Vec::new();
    LocalExecutor
        .run(Command::new("/bin/sh").arg("-c").arg(line).stdout(&mut out))
        .await
        .expect("run");
    String::from_utf8(out).expect("utf8")
}

#[tokio::test]
async fn test_single_quote_survives_as_one_literal_argument() {
    let line = command_line("printf", &["<%s>", "it's"], &BTreeMap::new()).expect("render");
    assert_eq!(run_line(line).await, "<it's>");
}

#[tokio::test]
async fn test_metacharacters_are_never_interpreted() {
    let hostile = ["$(touch /tmp/pwned)", "`id`", "; rm -rf /", "a\nb", "'\"'", "*"];
    let mut args = vec!["<%s>"];
    args.extend(hostile);
    let line = command_line("printf", &args, &BTreeMap::new()).expect("render");

    let expected: String = hostile.iter().map(|a| format!("<{a}>")).collect();
    assert_eq!(run_line(line).await, expected);
}

#[tokio::test]
async fn test_env_values_are_quoted_too() {
    let env = BTreeMap::from([("GREETING".to_string(), "it's $HOME".to_string())]);
    let line = command_line("/bin/sh", &["-c", "printf %s \"$GREETING\""], &env).expect("render");
    assert_eq!(run_line(line).await, "it's $HOME");
}
