//! Shell command execution for the Linux bridge backend.
//!
//! Arguments that come from HAL callers are always passed through
//! [`shellquote`] before they are spliced into a command line.
//!
//! # Example
//!
//! ```ignore
//! use vlan_hal::shell::{self, BRCTL_CMD, shellquote};
//!
//! let cmd = format!("{} addbr {}", BRCTL_CMD, shellquote("brlan0"));
//! shell::exec_or_throw(&cmd, None).await?;
//! ```

use once_cell::sync::Lazy;
use regex::Regex;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;

use crate::error::{HalResult, VlanHalError};

/// Path to the `ip` command for network interface configuration.
pub const IP_CMD: &str = "/sbin/ip";

/// Path to the `brctl` command for bridge control.
pub const BRCTL_CMD: &str = "/sbin/brctl";

/// Path to the `test` command.
pub const TEST_CMD: &str = "/usr/bin/test";

/// Shell used to run command lines.
pub const SH_CMD: &str = "/bin/sh";

/// Regex for characters that need escaping in shell double-quotes.
/// Matches: $, `, ", \, and newline
static SHELL_ESCAPE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"([$`"\\\n])"#).expect("Invalid regex pattern"));

/// Quotes a string for safe use in shell commands.
///
/// Wraps the string in double quotes and escapes `$`, `` ` ``, `"`, `\`
/// and newline.
///
/// ```
/// use vlan_hal::shell::shellquote;
///
/// assert_eq!(shellquote("brlan0"), "\"brlan0\"");
/// assert_eq!(shellquote("with$var"), "\"with\\$var\"");
/// ```
pub fn shellquote(s: &str) -> String {
    let escaped = SHELL_ESCAPE_RE.replace_all(s, r"\$1");
    format!("\"{}\"", escaped)
}

/// Result of a shell command execution.
#[derive(Debug, Clone)]
pub struct ExecResult {
    /// The exit code of the command (0 = success).
    pub exit_code: i32,
    /// The stdout output.
    pub stdout: String,
    /// The stderr output.
    pub stderr: String,
}

impl ExecResult {
    /// Returns true if the command succeeded (exit code 0).
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }

    /// Returns the combined output (stdout + stderr) for error messages.
    pub fn combined_output(&self) -> String {
        if self.stderr.is_empty() {
            self.stdout.clone()
        } else if self.stdout.is_empty() {
            self.stderr.clone()
        } else {
            format!("{}\n{}", self.stdout, self.stderr)
        }
    }
}

/// Executes a command line through `/bin/sh -c`.
///
/// A non-zero exit is not an error here; callers that probe for existence
/// inspect [`ExecResult::success`]. With `timeout` set, the child is killed
/// and [`VlanHalError::ShellTimeout`] returned once it elapses.
pub async fn exec(cmd: &str, timeout: Option<Duration>) -> HalResult<ExecResult> {
    tracing::debug!(command = %cmd, "Executing shell command");

    let child = Command::new(SH_CMD)
        .arg("-c")
        .arg(cmd)
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .output();

    let output = match timeout {
        Some(limit) => tokio::time::timeout(limit, child).await.map_err(|_| {
            VlanHalError::ShellTimeout {
                command: cmd.to_string(),
                timeout_secs: limit.as_secs(),
            }
        })?,
        None => child.await,
    }
    .map_err(|e| VlanHalError::ShellExec {
        command: cmd.to_string(),
        source: e,
    })?;

    let exit_code = output.status.code().unwrap_or(-1);
    let stdout = String::from_utf8_lossy(&output.stdout).trim().to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();

    let result = ExecResult {
        exit_code,
        stdout,
        stderr,
    };

    if result.success() {
        tracing::trace!(command = %cmd, exit_code = exit_code, "Command succeeded");
    } else {
        tracing::debug!(
            command = %cmd,
            exit_code = exit_code,
            stderr = %result.stderr,
            "Command returned non-zero"
        );
    }

    Ok(result)
}

/// Executes a command and turns a non-zero exit into an error.
///
/// Returns stdout on success.
pub async fn exec_or_throw(cmd: &str, timeout: Option<Duration>) -> HalResult<String> {
    let result = exec(cmd, timeout).await?;
    if result.success() {
        Ok(result.stdout)
    } else {
        tracing::warn!(command = %cmd, exit_code = result.exit_code, "Command failed");
        Err(VlanHalError::ShellCommandFailed {
            command: cmd.to_string(),
            exit_code: result.exit_code,
            output: result.combined_output(),
        })
    }
}
