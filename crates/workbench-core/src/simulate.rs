//! Workflow simulation via the external CLI.
//!
//! One subprocess per call, run under a platform shell with the
//! orchestrator root as working directory. The caller always gets a
//! normalized [`SimulationResult`] — spawn failures, non-zero exits, and
//! timeouts all fold into `succeeded: false` with whatever diagnostics are
//! available. No retries, no cancellation, no mutual exclusion between
//! concurrent calls.

use std::path::Path;
use std::process::Stdio;
use std::time::Duration;

use serde::Serialize;
use tokio::process::Command;

use crate::env_store::DEFAULT_TARGET;

/// Hard wall-clock limit on one simulation run.
pub const SIMULATION_TIMEOUT: Duration = Duration::from_secs(60);

/// Cap on captured combined output.
pub const MAX_OUTPUT_BYTES: usize = 10 * 1024 * 1024;

const TRUNCATION_MARKER: &str = "\n[output truncated]";

#[derive(Debug, Clone, Serialize)]
pub struct SimulationResult {
    pub succeeded: bool,
    pub combined_output: String,
}

impl SimulationResult {
    fn failed(message: String) -> Self {
        SimulationResult {
            succeeded: false,
            combined_output: message,
        }
    }
}

/// Run `<cli> workflow simulate workflows --target=staging-settings` in the
/// orchestrator root and relay its console output.
pub async fn run_simulation(orchestrator_root: &Path, cli_program: &str) -> SimulationResult {
    run_with_timeout(orchestrator_root, cli_program, SIMULATION_TIMEOUT).await
}

async fn run_with_timeout(
    orchestrator_root: &Path,
    cli_program: &str,
    timeout: Duration,
) -> SimulationResult {
    let command_line = format!(
        "{} workflow simulate workflows --target={}",
        cli_program, DEFAULT_TARGET
    );

    let mut command = shell_command(&command_line);
    command
        .current_dir(orchestrator_root)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    let child = match command.spawn() {
        Ok(child) => child,
        Err(e) => {
            return SimulationResult::failed(format!("failed to launch simulation: {}", e));
        }
    };

    match tokio::time::timeout(timeout, child.wait_with_output()).await {
        Ok(Ok(output)) => SimulationResult {
            succeeded: output.status.success(),
            combined_output: combine_streams(&output.stdout, &output.stderr),
        },
        Ok(Err(e)) => {
            SimulationResult::failed(format!("failed to collect simulation output: {}", e))
        }
        // Dropping the timed-out future kills the child via kill_on_drop.
        Err(_) => SimulationResult::failed(format!(
            "simulation timed out after {} seconds",
            timeout.as_secs()
        )),
    }
}

#[cfg(not(windows))]
fn shell_command(line: &str) -> Command {
    let mut command = Command::new("sh");
    command.arg("-c").arg(line);
    command
}

#[cfg(windows)]
fn shell_command(line: &str) -> Command {
    let mut command = Command::new("cmd");
    command.arg("/C").arg(line);
    command
}

/// stdout, then stderr after a newline, capped at [`MAX_OUTPUT_BYTES`].
fn combine_streams(stdout: &[u8], stderr: &[u8]) -> String {
    let stdout = String::from_utf8_lossy(stdout);
    let stderr = String::from_utf8_lossy(stderr);

    let combined = if stderr.trim().is_empty() {
        stdout.into_owned()
    } else {
        format!("{}\n{}", stdout, stderr)
    };
    truncate_output(combined, MAX_OUTPUT_BYTES)
}

fn truncate_output(mut output: String, cap: usize) -> String {
    if output.len() <= cap {
        return output;
    }
    let mut cut = cap;
    while cut > 0 && !output.is_char_boundary(cut) {
        cut -= 1;
    }
    output.truncate(cut);
    output.push_str(TRUNCATION_MARKER);
    output
}
