//! Line-oriented JSON control interface for runtime model reassignment.
//!
//! Requests look like `{"cmd": "SET_LLM_MODEL", "model": "llama3"}`; every
//! request gets exactly one JSON response with a `status` of `ok` or `error`.

use std::io::BufRead;

use quorum_agents::ModelRegistry;
use serde::Deserialize;
use serde_json::{json, Value};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

#[derive(Debug, Deserialize, PartialEq)]
#[serde(tag = "cmd", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Command {
    /// Reassign every role to one model.
    SetLlmModel { model: String },
    /// Current role -> provider/model mapping.
    GetModels,
    /// Catalog of selectable models.
    ListModels,
}

/// Parse and execute one request line.
pub fn handle(registry: &ModelRegistry, line: &str) -> Value {
    let command = match serde_json::from_str::<Command>(line) {
        Ok(command) => command,
        Err(e) => {
            warn!(error = %e, "Rejected command");
            return json!({ "status": "error", "message": format!("Unknown command: {e}") });
        }
    };

    match command {
        Command::SetLlmModel { model } => {
            let model = model.trim();
            if model.is_empty() {
                return json!({ "status": "error", "message": "Model id must not be empty" });
            }
            let report = registry.set_all(model);
            info!(model, message = %report.message, "Model reassignment requested");
            json!({
                "status": if report.success { "ok" } else { "error" },
                "success": report.success,
                "details": report.details,
                "message": report.message,
            })
        }
        Command::GetModels => json!({ "status": "ok", "models": registry.snapshot() }),
        Command::ListModels => json!({ "status": "ok", "models": registry.list_available() }),
    }
}

/// Forward stdin lines from a detached reader thread. Blocking reads stay off
/// the runtime, so shutdown never waits for a line that may never come.
pub fn spawn_stdin_reader() -> mpsc::Receiver<String> {
    let (tx, rx) = mpsc::channel(16);
    let spawned = std::thread::Builder::new()
        .name("quorum-stdin".to_string())
        .spawn(move || {
            for line in std::io::stdin().lock().lines() {
                match line {
                    Ok(line) => {
                        if tx.blocking_send(line).is_err() {
                            break;
                        }
                    }
                    Err(e) => {
                        warn!(error = %e, "Command input failed");
                        break;
                    }
                }
            }
            debug!("Command input closed");
        });
    if let Err(e) = spawned {
        warn!(error = %e, "Failed to start command reader");
    }
    rx
}

/// Answer request lines until cancelled or the input closes, passing each
/// response to `respond`.
pub async fn serve(
    registry: &ModelRegistry,
    mut lines: mpsc::Receiver<String>,
    cancel: &CancellationToken,
    mut respond: impl FnMut(Value),
) {
    loop {
        let line = tokio::select! {
            _ = cancel.cancelled() => break,
            line = lines.recv() => line,
        };
        match line {
            Some(line) if line.trim().is_empty() => {}
            Some(line) => respond(handle(registry, &line)),
            None => break,
        }
    }
}
