//! Frontend server process and the renderer readiness probe.

use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use harbor_common::{HarborError, Result};
use harbor_config::schema::FrontendConfig;
use harbor_lifecycle::FrontendServer;
use tokio::process::{Child, Command};
use tokio::sync::Mutex;

/// Optional frontend server launched from `frontend.command`.
pub struct FrontendProcess {
    command: Option<String>,
    child: Mutex<Option<Child>>,
}

impl FrontendProcess {
    pub fn new(config: &FrontendConfig) -> Self {
        Self {
            command: config.command.clone(),
            child: Mutex::new(None),
        }
    }

    /// Spawn the configured server. A no-op without a command.
    pub async fn start(&self) -> Result<()> {
        let Some(command) = self.command.as_deref() else {
            tracing::debug!("no frontend command configured");
            return Ok(());
        };
        let mut parts = command.split_whitespace();
        let program = parts
            .next()
            .ok_or_else(|| HarborError::Frontend("frontend command is empty".into()))?;

        let child = Command::new(program)
            .args(parts)
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| HarborError::Frontend(format!("failed to spawn {program}: {e}")))?;
        tracing::info!(pid = ?child.id(), %command, "frontend server spawned");
        *self.child.lock().await = Some(child);
        Ok(())
    }

    #[cfg(test)]
    async fn is_spawned(&self) -> bool {
        self.child.lock().await.is_some()
    }
}

#[async_trait]
impl FrontendServer for FrontendProcess {
    async fn stop(&self) -> Result<()> {
        let Some(mut child) = self.child.lock().await.take() else {
            return Ok(());
        };
        tracing::info!(pid = ?child.id(), "stopping frontend server");
        child
            .kill()
            .await
            .map_err(|e| HarborError::Frontend(format!("failed to stop frontend server: {e}")))
    }
}

/// Poll `url` until it answers with a success status.
pub async fn wait_until_served(url: &str, interval: Duration) {
    let client = match reqwest::Client::builder()
        .timeout(interval.max(Duration::from_secs(1)))
        .build()
    {
        Ok(client) => client,
        Err(e) => {
            tracing::warn!(error = %e, "failed to build probe client, not waiting for frontend");
            return;
        }
    };

    let mut attempts: u32 = 0;
    loop {
        attempts += 1;
        match client.get(url).send().await {
            Ok(response) if response.status().is_success() => {
                tracing::debug!(%url, attempts, "frontend is served");
                return;
            }
            Ok(response) => {
                tracing::trace!(%url, status = %response.status(), "frontend not ready yet");
            }
            Err(e) => tracing::trace!(%url, error = %e, "frontend not reachable yet"),
        }
        tokio::time::sleep(interval).await;
    }
}
