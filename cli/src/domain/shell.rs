//! Rendering commands into a single `/bin/sh -c` line.
//!
//! The remote side executes strings, not argv vectors, so every token is
//! single-quoted. Nothing the caller passes (package names, paths, file
//! contents in arguments) is ever expanded by the shell.

use std::collections::BTreeMap;

use crate::domain::error::ProvisionError;

/// Quote `val` so that `/bin/sh` reads it back as exactly one literal word.
///
/// Embedded single quotes close the quoted run, emit an escaped quote, and
/// reopen it: `it's` becomes `'it'\''s'`.
#[must_use]
pub fn shell_escape(val: &str) -> String {
    format!("'{}'", val.replace('\'', r"'\''"))
}

/// Returns `true` if `name` can be used as a shell variable assignment.
#[must_use]
pub fn is_valid_env_name(name: &str) -> bool {
    let mut chars = name.chars();
    matches!(chars.next(), Some(c) if c == '_' || c.is_ascii_alphabetic())
        && chars.all(|c| c == '_' || c.is_ascii_alphanumeric())
}

/// Build `/bin/sh -c '<KEY=value>... <program> <args>...'`.
///
/// Environment entries come first in key order, then the program, then the
/// arguments. Each value, the program, and each argument are quoted
/// individually before the whole line is quoted again for the outer `sh -c`.
///
/// # Errors
///
/// Returns [`ProvisionError::InvalidEnvName`] if an environment key is not a
/// POSIX identifier; such a key cannot be assigned without being interpreted.
pub fn command_line<S: AsRef<str>>(
    program: &str,
    args: &[S],
    env: &BTreeMap<String, String>,
) -> Result<String, ProvisionError> {
    let mut parts = Vec::with_capacity(env.len() + args.len() + 1);
    for (key, value) in env {
        if !is_valid_env_name(key) {
            return Err(ProvisionError::InvalidEnvName { name: key.clone() });
        }
        parts.push(format!("{key}={}", shell_escape(value)));
    }
    parts.push(shell_escape(program));
    parts.extend(args.iter().map(|a| shell_escape(a.as_ref())));

    Ok(format!("/bin/sh -c {}", shell_escape(&parts.join(" "))))
}
