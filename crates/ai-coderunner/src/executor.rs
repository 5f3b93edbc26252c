//! Single-test execution: spawn, race a timeout against `wait_with_output`,
//! SIGKILL on timeout. Grounded on `skynet-terminal::manager::TerminalManager::exec`.

use std::time::Duration;

use tokio::process::Command as AsyncCommand;
use tracing::warn;

use crate::error::{CodeRunnerError, Result};
use crate::harness::Harness;
use crate::sandbox;

pub struct RawOutput {
    pub stdout: String,
    pub stderr: String,
}

/// Materializes any harness files, compiles if needed, then runs the
/// program under `timeout` wrapped in network/mount namespace isolation.
pub async fn run_harness(work_dir: &std::path::Path, harness: &Harness, timeout: Duration) -> Result<RawOutput> {
    for (name, contents) in &harness.files {
        let path = work_dir.join(name);
        tokio::fs::write(&path, contents).await.map_err(|e| CodeRunnerError::Io(e.to_string()))?;
    }

    if let Some((compiler, args)) = &harness.compile {
        let compile_out = run_one(work_dir, compiler, args, timeout).await?;
        if !compile_out.stderr.is_empty() {
            return Ok(compile_out);
        }
    }

    run_one(work_dir, harness.program, &harness.args, timeout).await
}

async fn run_one(work_dir: &std::path::Path, program: &str, args: &[String], timeout: Duration) -> Result<RawOutput> {
    let inner = std::iter::once(shell_quote(program))
        .chain(args.iter().map(|a| shell_quote(a)))
        .collect::<Vec<_>>()
        .join(" ");
    let (sandbox_program, sandbox_args) = sandbox::sandboxed_command(&inner);

    let mut command = AsyncCommand::new(sandbox_program);
    command
        .args(&sandbox_args)
        .current_dir(work_dir)
        .stdout(std::process::Stdio::piped())
        .stderr(std::process::Stdio::piped());

    let child = command.spawn().map_err(|e| CodeRunnerError::Spawn(e.to_string()))?;
    let pid = child.id();
    let (tx, rx) = tokio::sync::oneshot::channel();

    tokio::spawn(async move {
        let _ = tx.send(child.wait_with_output().await);
    });

    match tokio::time::timeout(timeout, rx).await {
        Ok(Ok(Ok(output))) => Ok(RawOutput {
            stdout: String::from_utf8_lossy(&output.stdout).trim().to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        }),
        Ok(Ok(Err(e))) => Err(CodeRunnerError::Io(e.to_string())),
        Ok(Err(_recv_err)) => Err(CodeRunnerError::Spawn("wait task panicked unexpectedly".to_string())),
        Err(_elapsed) => {
            if let Some(raw_pid) = pid {
                #[cfg(unix)]
                unsafe {
                    libc::kill(raw_pid as libc::pid_t, libc::SIGKILL);
                }
            }
            warn!(program, "code runner execution exceeded timeout, process killed");
            Ok(RawOutput {
                stdout: String::new(),
                stderr: "Execution timed out.".to_string(),
            })
        }
    }
}

fn shell_quote(arg: &str) -> String {
    format!("'{}'", arg.replace('\'', "'\\''"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shell_quote_escapes_single_quotes() {
        assert_eq!(shell_quote("it's"), "'it'\\''s'");
    }
}
