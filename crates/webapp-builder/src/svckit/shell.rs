//! Shell Command Tool
//!
//! Runs the model-supplied string through the host shell. There is no
//! allow-list: whoever drives the model can run anything the host user can.
//! The only bound is the timeout, after which the child is killed.

use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use tokio::process::Command;

use agent_core::{Tool, ToolSchema};

use crate::BuiltinTool;
use crate::error::ToolError;

pub const DEFAULT_COMMAND_TIMEOUT: Duration = Duration::from_secs(10);

pub struct ShellTool {
    timeout: Duration,
}

impl ShellTool {
    pub const fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    fn command(line: &str) -> Command {
        let mut cmd = if cfg!(windows) {
            let mut c = Command::new("cmd");
            c.arg("/C");
            c
        } else {
            let mut c = Command::new("sh");
            c.arg("-c");
            c
        };
        cmd.arg(line)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        cmd
    }

    /// Stdout if it has anything besides trailing whitespace, else stderr.
    async fn run(&self, line: &str) -> Result<String, ToolError> {
        let output = tokio::time::timeout(self.timeout, Self::command(line).output())
            .await
            .map_err(|_| ToolError::Timeout {
                command: line.to_string(),
                limit: self.timeout,
            })??;

        let stdout = String::from_utf8_lossy(&output.stdout);
        let stdout = stdout.trim_end();
        if !stdout.is_empty() {
            return Ok(stdout.to_string());
        }

        Ok(String::from_utf8_lossy(&output.stderr).trim_end().to_string())
    }
}

impl Default for ShellTool {
    fn default() -> Self {
        Self::new(DEFAULT_COMMAND_TIMEOUT)
    }
}

#[async_trait]
impl Tool for ShellTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: BuiltinTool::RunCommand.name().into(),
            description: "runs shell command and returns output.".into(),
            argument: "cmd".into(),
            has_side_effects: true,
        }
    }

    async fn invoke(&self, input: &str) -> String {
        match self.run(input).await {
            Ok(output) => output,
            Err(e) => {
                tracing::warn!(command = %input, "Command failed: {}", e);
                format!("Error running command: {e}")
            }
        }
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::time::Instant;

    #[tokio::test]
    async fn test_stdout_is_preferred() {
        let tool = ShellTool::default();
        assert_eq!(tool.invoke("echo hello").await, "hello");
        assert_eq!(tool.invoke("echo out; echo err 1>&2").await, "out");
    }

    #[tokio::test]
    async fn test_falls_back_to_stderr() {
        let tool = ShellTool::default();
        assert_eq!(tool.invoke("echo oops 1>&2").await, "oops");
        assert_eq!(tool.invoke("printf '  \\n'; echo only-err 1>&2").await, "only-err");
    }

    #[tokio::test]
    async fn test_trailing_whitespace_only() {
        let tool = ShellTool::default();
        assert_eq!(tool.invoke("printf '  indented  \\n\\n'").await, "  indented");
    }

    #[tokio::test]
    async fn test_timeout_returns_text() {
        let tool = ShellTool::new(Duration::from_millis(300));
        let started = Instant::now();

        let output = tool.invoke("sleep 5").await;

        assert!(started.elapsed() < Duration::from_secs(3));
        assert!(output.starts_with("Error running command:"), "{output}");
        assert!(output.contains("timed out after 300ms"), "{output}");
    }

    #[tokio::test]
    async fn test_silent_command_is_empty() {
        let tool = ShellTool::default();
        assert_eq!(tool.invoke("true").await, "");
    }
}
