#[cfg(test)]
#[path = "actions_test.rs"]
mod tests;

use std::sync::Arc;

use anyhow::Result;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::domain::models::Action;
use crate::domain::models::BackendBox;
use crate::domain::models::Event;
use crate::domain::models::RunRequest;

pub fn help_text() -> String {
    let text = r#"
COMMANDS:
- /new (/n) - Starts a new session. The next message opens a fresh thread with the agent.
- /quit /exit (/q) - Exit the playground.
- /help (/h) - Provides this help menu.

HOTKEYS:
- Up arrow - Scroll up
- Down arrow - Scroll down
- CTRL+U - Page up
- CTRL+D - Page down
- CTRL+C - Stop the agent if it is responding, otherwise exit.

While the agent is responding the input box is locked. If a reply fails, sending your next message replaces the failed exchange.
        "#;

    return text.trim().to_string();
}

/// Runs one invocation to completion. Every path ends with exactly one
/// `RunFinished` for the run.
async fn run_agent(
    backend: Arc<BackendBox>,
    request: RunRequest,
    tx: mpsc::UnboundedSender<Event>,
) -> Result<()> {
    let run_id = request.run_id;
    if let Err(err) = backend.run(request, &tx).await {
        tracing::error!(run_id, error = ?err, "agent run failed");
        tx.send(Event::RunFailed(run_id, err.to_string()))?;
    }

    tx.send(Event::RunFinished(run_id))?;

    return Ok(());
}

pub struct ActionsService {}

impl ActionsService {
    pub async fn start(
        backend: BackendBox,
        tx: mpsc::UnboundedSender<Event>,
        rx: &mut mpsc::UnboundedReceiver<Action>,
    ) -> Result<()> {
        let backend = Arc::new(backend);

        // Lazy default.
        let mut worker: JoinHandle<Result<()>> = tokio::spawn(async {
            return Ok(());
        });

        while let Some(action) = rx.recv().await {
            match action {
                Action::AgentAbort() => {
                    tracing::debug!("aborting agent run");
                    worker.abort();
                }
                Action::AgentRun(request) => {
                    if !worker.is_finished() {
                        tracing::warn!(run_id = request.run_id, "previous run still active, aborting it");
                        worker.abort();
                    }

                    worker = tokio::spawn(run_agent(backend.clone(), request, tx.clone()));
                }
            }
        }

        worker.abort();

        return Ok(());
    }
}
