//! Update checker: compares this build with the latest GitHub release.

use std::time::Duration;

use async_trait::async_trait;
use harbor_config::schema::UpdatesConfig;
use harbor_lifecycle::Updater;
use serde::Deserialize;

/// A GitHub release entry.
#[derive(Debug, Deserialize)]
pub struct GithubRelease {
    /// The tag name, e.g. "v0.2.0".
    pub tag_name: String,
    /// URL to the release page.
    pub html_url: String,
}

/// Checks GitHub Releases for a newer version of Harbor.
///
/// Never stops the boot: an available update is logged and the app starts
/// anyway, and network failures are treated as "no update".
pub struct GithubUpdateChecker {
    api_url: Option<String>,
    current_version: String,
    timeout: Duration,
}

impl GithubUpdateChecker {
    pub fn new(config: &UpdatesConfig) -> Self {
        let api_url = config.check_on_startup.then(|| {
            format!(
                "https://api.github.com/repos/{}/releases/latest",
                config.repository
            )
        });
        Self {
            api_url,
            current_version: env!("CARGO_PKG_VERSION").to_string(),
            timeout: Duration::from_secs(u64::from(config.timeout_secs)),
        }
    }

    /// A checker that never touches the network.
    pub fn disabled() -> Self {
        Self {
            api_url: None,
            current_version: env!("CARGO_PKG_VERSION").to_string(),
            timeout: Duration::ZERO,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.api_url.is_some()
    }

    /// Returns the latest release if it is newer than this build.
    pub async fn newer_release(&self) -> Option<GithubRelease> {
        let api_url = self.api_url.as_deref()?;
        let client = reqwest::Client::builder()
            .timeout(self.timeout)
            .build()
            .ok()?;

        let response = match client
            .get(api_url)
            .header("User-Agent", "harbor-updater")
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => {
                tracing::debug!(error = %e, "update check request failed");
                return None;
            }
        };

        if !response.status().is_success() {
            tracing::debug!(status = %response.status(), "update check returned an error status");
            return None;
        }

        let release: GithubRelease = response.json().await.ok()?;
        is_newer(&release.tag_name, &self.current_version).then_some(release)
    }

    pub fn current_version(&self) -> &str {
        &self.current_version
    }
}

#[async_trait]
impl Updater for GithubUpdateChecker {
    async fn check(&self) -> bool {
        if !self.is_enabled() {
            tracing::debug!("update check disabled");
            return true;
        }
        match self.newer_release().await {
            Some(release) => tracing::info!(
                current = self.current_version(),
                latest = %release.tag_name,
                url = %release.html_url,
                "update available"
            ),
            None => tracing::debug!(current = self.current_version(), "no update available"),
        }
        true
    }
}

/// Whether release tag `latest` is a higher semver than `current`. Tags
/// that don't parse are never newer.
fn is_newer(latest: &str, current: &str) -> bool {
    let parse = |v: &str| semver::Version::parse(v.trim().trim_start_matches('v')).ok();
    match (parse(latest), parse(current)) {
        (Some(latest), Some(current)) => latest > current,
        _ => false,
    }
}
