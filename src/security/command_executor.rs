//! SafeCommandExecutor: whitelisted execution of the package manager binary
//!
//! # Security Features
//!
//! - **Whitelist-based validation**: Only pre-approved commands can execute
//! - **Injection prevention**: Uses `tokio::process::Command`, arguments are
//!   never interpolated into a shell string
//! - **Working directory validation**: Validates existence before execution
//!
//! Every invocation is awaited to completion; there is no timeout.
//!
//! # Example
//!
//! ```rust,no_run
//! use republish_npm::SafeCommandExecutor;
//!
//! # async fn demo() -> Result<(), republish_npm::CommandError> {
//! let executor = SafeCommandExecutor::new();
//! let version = executor.run("npm", &["--version"], &std::env::temp_dir()).await?;
//! println!("npm {}", version);
//! # Ok(())
//! # }
//! ```

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Instant;
use thiserror::Error;
use tokio::process::Command;

/// Allowed commands whitelist
const ALLOWED_COMMANDS: &[&str] = &["npm"];

/// Errors that can occur during command execution
#[derive(Error, Debug)]
pub enum CommandError {
    /// Command is not in the allowed whitelist
    #[error("Command '{0}' is not in the allowed whitelist")]
    CommandNotAllowed(String),

    /// Working directory does not exist or is not accessible
    #[error("Working directory does not exist: {}", .0.display())]
    InvalidWorkingDirectory(PathBuf),

    /// Command could not be started (e.g., binary not found, permission denied)
    #[error("Command execution failed: {command}: {message}")]
    ExecutionFailed { command: String, message: String },

    /// Command ran and exited unsuccessfully; carries everything it printed
    #[error("Command failed: {command}\n{stdout}\n{stderr}")]
    NonZeroExit {
        command: String,
        status: Option<i32>,
        stdout: String,
        stderr: String,
    },
}

/// Safe command executor with security controls
#[derive(Debug, Clone, Default)]
pub struct SafeCommandExecutor;

impl SafeCommandExecutor {
    pub fn new() -> Self {
        Self
    }

    /// Run `command args...` in `working_dir` and return its trimmed stdout.
    ///
    /// # Errors
    ///
    /// - `CommandError::CommandNotAllowed` - Command not in whitelist
    /// - `CommandError::InvalidWorkingDirectory` - `working_dir` does not exist
    /// - `CommandError::ExecutionFailed` - Binary not found or execution error
    /// - `CommandError::NonZeroExit` - The command reported failure
    pub async fn run(
        &self,
        command: &str,
        args: &[&str],
        working_dir: &Path,
    ) -> Result<String, CommandError> {
        if !ALLOWED_COMMANDS.contains(&command) {
            return Err(CommandError::CommandNotAllowed(command.to_string()));
        }

        if !working_dir.is_dir() {
            return Err(CommandError::InvalidWorkingDirectory(working_dir.to_path_buf()));
        }

        // Windows-specific: npm is a .cmd file, not .exe
        #[cfg(target_os = "windows")]
        let program = format!("{}.cmd", command);

        #[cfg(not(target_os = "windows"))]
        let program = command.to_string();

        let command_line = display_command(command, args);
        tracing::debug!(command = %command_line, cwd = %working_dir.display(), "running command");
        let started = Instant::now();

        let output = Command::new(&program)
            .args(args)
            .current_dir(working_dir)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|e| CommandError::ExecutionFailed {
                command: command_line.clone(),
                message: e.to_string(),
            })?;

        let stdout = String::from_utf8_lossy(&output.stdout).to_string();
        let stderr = String::from_utf8_lossy(&output.stderr).to_string();

        tracing::debug!(
            command = %command_line,
            status = ?output.status.code(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "command finished"
        );

        if !output.status.success() {
            return Err(CommandError::NonZeroExit {
                command: command_line,
                status: output.status.code(),
                stdout,
                stderr,
            });
        }

        Ok(stdout.trim().to_string())
    }
}

/// `program arg1 arg2 ...` as shown in logs and error messages
pub fn display_command(command: &str, args: &[&str]) -> String {
    std::iter::once(command)
        .chain(args.iter().copied())
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_rejected_command_rm() {
        let executor = SafeCommandExecutor::new();
        let result = executor.run("rm", &["-rf", "/"], &std::env::temp_dir()).await;
        assert!(
            matches!(result, Err(CommandError::CommandNotAllowed(_))),
            "rm should be rejected as not in whitelist"
        );
    }

    #[tokio::test]
    async fn test_rejected_command_sh() {
        let executor = SafeCommandExecutor::new();
        let result = executor
            .run("sh", &["-c", "npm publish"], &std::env::temp_dir())
            .await;
        assert!(matches!(result, Err(CommandError::CommandNotAllowed(_))));
    }

    #[tokio::test]
    async fn test_invalid_working_directory() {
        let executor = SafeCommandExecutor::new();
        let result = executor
            .run(
                "npm",
                &["--version"],
                Path::new("/nonexistent/directory/that/does/not/exist"),
            )
            .await;
        assert!(
            matches!(result, Err(CommandError::InvalidWorkingDirectory(_))),
            "Should reject non-existent working directory"
        );
    }

    #[tokio::test]
    async fn test_failure_names_the_command_line() {
        let executor = SafeCommandExecutor::new();
        let result = executor
            .run("npm", &["view", "--definitely-not-a-flag"], &std::env::temp_dir())
            .await;

        match result {
            Err(CommandError::ExecutionFailed { command, .. })
            | Err(CommandError::NonZeroExit { command, .. }) => {
                assert_eq!(command, "npm view --definitely-not-a-flag");
            }
            // npm may tolerate the flag and print usage
            Ok(_) => {}
            Err(other) => panic!("unexpected error: {}", other),
        }
    }

    #[test]
    fn test_display_command() {
        assert_eq!(
            display_command("npm", &["view", "pkg", "versions", "--json"]),
            "npm view pkg versions --json"
        );
        assert_eq!(display_command("npm", &[]), "npm");
    }

    #[test]
    fn test_non_zero_exit_message_carries_output() {
        let error = CommandError::NonZeroExit {
            command: "npm publish --access public".to_string(),
            status: Some(1),
            stdout: String::new(),
            stderr: "npm ERR! code ETIMEDOUT".to_string(),
        };

        let message = error.to_string();
        assert!(message.starts_with("Command failed: npm publish --access public"));
        assert!(message.contains("ETIMEDOUT"));
    }
}
