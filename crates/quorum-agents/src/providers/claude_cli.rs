use async_trait::async_trait;
use tokio::process::Command;
use tracing::{debug, warn};

use crate::error::ProviderError;
use crate::gateway::Provider;

const DEFAULT_PROGRAM: &str = "claude";

/// Runs the `claude` CLI in print mode. Authentication is the CLI's own concern,
/// so the gateway treats this provider as always credentialed.
pub struct ClaudeCliProvider {
    program: String,
}

impl Default for ClaudeCliProvider {
    fn default() -> Self {
        Self::new(None)
    }
}

impl ClaudeCliProvider {
    /// `program` overrides the executable path; `None` uses `claude` from PATH.
    pub fn new(program: Option<&str>) -> Self {
        Self {
            program: program.unwrap_or(DEFAULT_PROGRAM).to_string(),
        }
    }

    /// Check if the CLI is available on the system.
    pub async fn is_available(&self) -> bool {
        match Command::new(&self.program).arg("--version").output().await {
            Ok(output) => output.status.success(),
            Err(_) => false,
        }
    }
}

#[async_trait]
impl Provider for ClaudeCliProvider {
    fn name(&self) -> &str {
        "claude_cli"
    }

    async fn generate(&self, model: &str, prompt: &str) -> Result<String, ProviderError> {
        debug!(model, "Invoking claude CLI");

        // The gateway bounds the call; kill the child if that future is dropped.
        let output = Command::new(&self.program)
            .args(["-p", prompt, "--model", model, "--output-format", "text"])
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| ProviderError::Unknown(format!("failed to spawn {}: {e}", self.program)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).to_string();
            warn!(status = %output.status, stderr = %stderr, "Claude CLI failed");
            let lowered = stderr.to_ascii_lowercase();
            let detail = format!("claude exited {}: {}", output.status, stderr.trim());
            return Err(if lowered.contains("rate limit") || lowered.contains("usage limit") {
                ProviderError::RateLimited(detail)
            } else if lowered.contains("login") || lowered.contains("api key") {
                ProviderError::AuthMissing(detail)
            } else {
                ProviderError::Transient(detail)
            });
        }

        Ok(String::from_utf8_lossy(&output.stdout).to_string())
    }
}
