//! One solver invocation per task.

use crate::error::TaskFailure;
use crate::parser::truncate_bytes;
use crate::planner::Task;
use std::borrow::Cow;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;

/// Longest result line kept, in bytes.
pub const MAX_LINE_LEN: usize = 1023;

/// Shell exit codes for "found but not executable" and "not found".
const SHELL_CANNOT_EXECUTE: i32 = 126;
const SHELL_NOT_FOUND: i32 = 127;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskOutcome {
    Completed { line: String },
    Failed(TaskFailure),
}

impl TaskOutcome {
    pub fn is_completed(&self) -> bool {
        matches!(self, TaskOutcome::Completed { .. })
    }
}

/// Runs the solver as `<solver> -i <instance> -k <k> -t <seconds>` with
/// stderr folded into stdout.
///
/// No timeout is applied: the solver is trusted to honor `-t`.
#[derive(Debug, Clone)]
pub struct ProcessRunner {
    solver: PathBuf,
}

impl ProcessRunner {
    pub fn new(solver: impl Into<PathBuf>) -> Self {
        Self {
            solver: solver.into(),
        }
    }

    pub fn solver(&self) -> &Path {
        &self.solver
    }

    pub fn command_line(&self, task: &Task) -> String {
        format!(
            "{} -i {} -k {} -t {} 2>&1",
            sh_quote(&self.solver.to_string_lossy()),
            sh_quote(&task.path.to_string_lossy()),
            task.k,
            task.time_limit_secs
        )
    }

    pub async fn run(&self, task: &Task) -> TaskOutcome {
        let command_line = self.command_line(task);
        let mut cmd = Command::new("sh");
        cmd.arg("-c").arg(&command_line);
        cmd.stdin(Stdio::null());
        cmd.stdout(Stdio::piped());
        cmd.stderr(Stdio::piped());
        cmd.kill_on_drop(true);

        let output = match cmd.output().await {
            Ok(output) => output,
            Err(err) => {
                return TaskOutcome::Failed(TaskFailure::ExternalProcessUnavailable {
                    reason: format!("{}: {}", command_line, err),
                })
            }
        };

        let text = String::from_utf8_lossy(&output.stdout);
        if let Some(line) = extract_result_line(&text) {
            return TaskOutcome::Completed { line };
        }
        match output.status.code() {
            Some(code @ (SHELL_CANNOT_EXECUTE | SHELL_NOT_FOUND)) => {
                let detail = text
                    .lines()
                    .find(|l| !l.trim().is_empty())
                    .unwrap_or("no output")
                    .to_string();
                TaskOutcome::Failed(TaskFailure::ExternalProcessUnavailable {
                    reason: format!("exit status {}: {}", code, detail),
                })
            }
            _ => TaskOutcome::Failed(TaskFailure::IncompleteOutput {
                lines: text.lines().count(),
            }),
        }
    }
}

/// Second line of the solver output, without its terminator. The first line
/// is a preamble and is dropped.
pub fn extract_result_line(output: &str) -> Option<String> {
    let line = output.lines().nth(1)?;
    let line = line.trim_end_matches(|c: char| c == '\r' || c == '\n');
    Some(truncate_bytes(line, MAX_LINE_LEN).to_string())
}

/// Single-quotes `arg` for `sh` unless every character passes through the
/// shell untouched.
fn sh_quote(arg: &str) -> Cow<'_, str> {
    const PLAIN: &str = "-_./:=+,@%";
    if !arg.is_empty()
        && arg
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || PLAIN.contains(c))
    {
        return Cow::Borrowed(arg);
    }
    let mut quoted = String::with_capacity(arg.len() + 2);
    quoted.push('\'');
    for c in arg.chars() {
        if c == '\'' {
            quoted.push_str("'\\''");
        } else {
            quoted.push(c);
        }
    }
    quoted.push('\'');
    Cow::Owned(quoted)
}
