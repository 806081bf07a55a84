//! Local backend process: reachability probe, spawn, and stop.

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use harbor_common::{HarborError, Result};
use harbor_config::schema::BackendConfig;
use harbor_lifecycle::BackendServices;
use tokio::net::TcpStream;
use tokio::process::{Child, Command};
use tokio::sync::Mutex;

const POLL_INTERVAL: Duration = Duration::from_millis(100);

#[cfg(windows)]
const BACKEND_BINARY: &str = "harbor-backend.exe";
#[cfg(not(windows))]
const BACKEND_BINARY: &str = "harbor-backend";

/// Backend services run as a child process listening on `backend.url`.
pub struct BackendProcess {
    host: String,
    port: u16,
    binary_path: Option<PathBuf>,
    args: Vec<String>,
    startup_timeout: Duration,
    probe_timeout: Duration,
    child: Mutex<Option<Child>>,
}

impl BackendProcess {
    pub fn new(config: &BackendConfig) -> Result<Self> {
        let (host, port) = host_and_port(&config.url)?;
        Ok(Self {
            host,
            port,
            binary_path: config.binary_path.clone(),
            args: config.args.clone(),
            startup_timeout: Duration::from_millis(config.startup_timeout_ms),
            probe_timeout: Duration::from_millis(config.probe_timeout_ms.max(50)),
            child: Mutex::new(None),
        })
    }

    /// Whether anything accepts connections on the backend port.
    async fn ping(&self) -> bool {
        let addrs: Vec<SocketAddr> =
            match tokio::net::lookup_host((self.host.as_str(), self.port)).await {
                Ok(addrs) => addrs.collect(),
                Err(e) => {
                    tracing::debug!(host = %self.host, error = %e, "backend host lookup failed");
                    return false;
                }
            };
        for addr in addrs {
            let connect = tokio::time::timeout(self.probe_timeout, TcpStream::connect(addr));
            if let Ok(Ok(_)) = connect.await {
                return true;
            }
        }
        false
    }

    async fn wait_until_reachable(&self) -> Result<()> {
        let deadline = Instant::now() + self.startup_timeout;
        loop {
            if self.ping().await {
                return Ok(());
            }

            {
                let mut guard = self.child.lock().await;
                match guard.as_mut().map(Child::try_wait) {
                    Some(Ok(Some(status))) => {
                        *guard = None;
                        return Err(HarborError::Backend(format!(
                            "backend exited before becoming reachable: {status}"
                        )));
                    }
                    Some(Ok(None)) => {}
                    Some(Err(e)) => {
                        return Err(HarborError::Backend(format!(
                            "failed to poll backend process: {e}"
                        )));
                    }
                    None => return Err(HarborError::Backend("backend is not running".into())),
                }
            }

            if Instant::now() >= deadline {
                return Err(HarborError::Backend(format!(
                    "backend did not open {}:{} within {}ms",
                    self.host,
                    self.port,
                    self.startup_timeout.as_millis()
                )));
            }
            tokio::time::sleep(POLL_INTERVAL).await;
        }
    }
}

#[async_trait]
impl BackendServices for BackendProcess {
    async fn is_running(&self) -> bool {
        self.ping().await
    }

    async fn resolve_location(&self) -> Result<PathBuf> {
        let location = match &self.binary_path {
            Some(path) => path.clone(),
            None => default_location().ok_or_else(|| {
                HarborError::Backend("could not determine the data directory".into())
            })?,
        };
        if !location.is_file() {
            return Err(HarborError::Backend(format!(
                "backend binary not found: {}",
                location.display()
            )));
        }
        tracing::debug!(path = %location.display(), "resolved backend binary");
        Ok(location)
    }

    async fn start(&self, location: &Path) -> Result<()> {
        let child = Command::new(location)
            .args(&self.args)
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                HarborError::Backend(format!("failed to spawn {}: {e}", location.display()))
            })?;
        tracing::info!(pid = ?child.id(), path = %location.display(), "backend process spawned");
        *self.child.lock().await = Some(child);

        if self.startup_timeout.is_zero() {
            return Ok(());
        }
        self.wait_until_reachable().await
    }

    async fn stop(&self) -> Result<()> {
        let Some(mut child) = self.child.lock().await.take() else {
            tracing::debug!("no backend process owned by harbor");
            return Ok(());
        };
        tracing::info!(pid = ?child.id(), "stopping backend process");
        child
            .kill()
            .await
            .map_err(|e| HarborError::Backend(format!("failed to stop backend: {e}")))?;
        tracing::info!("backend process stopped");
        Ok(())
    }
}

fn default_location() -> Option<PathBuf> {
    dirs::data_dir().map(|dir| dir.join("harbor").join("backend").join(BACKEND_BINARY))
}

fn host_and_port(url: &str) -> Result<(String, u16)> {
    let parsed = reqwest::Url::parse(url)
        .map_err(|e| HarborError::Backend(format!("invalid backend url {url:?}: {e}")))?;
    let host = parsed
        .host_str()
        .ok_or_else(|| HarborError::Backend(format!("backend url {url:?} has no host")))?
        .trim_start_matches('[')
        .trim_end_matches(']')
        .to_string();
    let port = parsed.port_or_known_default().unwrap_or(80);
    Ok((host, port))
}
