use std::process::Stdio;

use anyhow::{Context, Result};
use async_trait::async_trait;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::{debug, info};

use crate::config::ExecutorConfig;

/// Runs the actual review and returns a summary, or fails.
///
/// The run's lifetime is the collaborator's concern; the trigger pipeline
/// applies no timeout of its own here.
#[async_trait]
pub trait ReviewExecutor: Send + Sync {
    async fn run(
        &self,
        repo: &str,
        number: u64,
        branch: Option<&str>,
        prompt: &str,
    ) -> Result<String>;
}

/// Executor that hands the review to an external agent process.
///
/// The prompt goes to the child's stdin; its stdout is the summary.
pub struct AgentProcessExecutor {
    command: String,
    args: Vec<String>,
}

impl AgentProcessExecutor {
    pub fn new(config: &ExecutorConfig) -> Self {
        Self {
            command: config.command.clone(),
            args: config.args.clone(),
        }
    }
}

#[async_trait]
impl ReviewExecutor for AgentProcessExecutor {
    async fn run(
        &self,
        repo: &str,
        number: u64,
        branch: Option<&str>,
        prompt: &str,
    ) -> Result<String> {
        info!(repo, number, command = %self.command, "Launching review agent");

        let mut child = Command::new(&self.command)
            .args(&self.args)
            .arg("--repo")
            .arg(repo)
            .arg("--pr")
            .arg(number.to_string())
            .args(branch.iter().flat_map(|b| ["--branch", *b]))
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .with_context(|| format!("Failed to spawn review agent: {}", self.command))?;

        let mut stdin = child.stdin.take().context("Agent stdin unavailable")?;
        stdin
            .write_all(prompt.as_bytes())
            .await
            .context("Failed to write prompt to agent")?;
        drop(stdin);

        let output = child
            .wait_with_output()
            .await
            .context("Failed to wait for review agent")?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            anyhow::bail!(
                "Review agent exited with {}: {}",
                output.status,
                stderr.trim()
            );
        }

        let summary = String::from_utf8(output.stdout).context("Agent summary was not UTF-8")?;
        debug!(bytes = summary.len(), "Review agent produced summary");

        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // `sh -c '<script>' sh` makes the appended --repo/--pr flags positional
    // args the script can ignore
    fn shell_executor(script: &str) -> AgentProcessExecutor {
        AgentProcessExecutor {
            command: "sh".to_string(),
            args: vec!["-c".to_string(), script.to_string(), "sh".to_string()],
        }
    }

    #[tokio::test]
    async fn test_agent_stdout_becomes_summary() {
        let executor = shell_executor("cat -");

        let summary = executor
            .run("o/r", 42, Some("main"), "prompt text")
            .await
            .unwrap();
        assert_eq!(summary, "prompt text");
    }

    #[tokio::test]
    async fn test_nonzero_exit_is_an_error() {
        let executor = shell_executor("exit 3");

        let err = executor.run("o/r", 42, None, "prompt").await.unwrap_err();
        assert!(err.to_string().contains("exited"));
    }

    #[tokio::test]
    async fn test_missing_command_is_an_error() {
        let executor = AgentProcessExecutor {
            command: "/nonexistent/review-agent".to_string(),
            args: Vec::new(),
        };

        assert!(executor.run("o/r", 1, None, "p").await.is_err());
    }
}
