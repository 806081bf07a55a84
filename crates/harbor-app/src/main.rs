mod backend;
mod cli;
mod frontend;
mod headless;
mod updater;

use std::sync::Arc;

use harbor_common::{host_channel, HostEvent, HostEventSender};
use harbor_config::schema::HarborConfig;
use harbor_lifecycle::{BootOptions, Collaborators, LifecycleCoordinator, LifecycleEvent};
use tokio::sync::broadcast;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{reload, EnvFilter, Registry};

use crate::backend::BackendProcess;
use crate::frontend::FrontendProcess;
use crate::headless::{HeadlessSecureFetch, HeadlessShortcuts, HeadlessSurfaceHost, SystemExit};
use crate::updater::GithubUpdateChecker;

fn env_filter(directive: &str) -> EnvFilter {
    EnvFilter::from_default_env().add_directive(
        directive
            .parse()
            .unwrap_or_else(|_| "harbor=info".parse().unwrap()),
    )
}

/// Install the subscriber. Without `--log-level` the filter can be swapped
/// once the config's level is known.
fn init_logging(cli_level: Option<&str>) -> reload::Handle<EnvFilter, Registry> {
    let (filter, handle) = reload::Layer::new(env_filter(cli_level.unwrap_or("harbor=info")));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
    handle
}

fn main() {
    let args = cli::parse();

    let log_filter = init_logging(args.log_level.as_deref());
    tracing::info!("Harbor v{} starting...", env!("CARGO_PKG_VERSION"));

    if let Some(ref path) = args.config {
        tracing::info!("Using config override: {}", path.display());
    }
    let config = harbor_config::load_config(args.config.as_deref()).unwrap_or_else(|e| {
        tracing::warn!("Config load failed, using defaults: {e}");
        HarborConfig::default()
    });
    if args.log_level.is_none() {
        let directive = format!("harbor={}", config.logging.level.as_directive());
        if let Err(e) = log_filter.reload(env_filter(&directive)) {
            tracing::warn!("Failed to apply configured log level: {e}");
        }
    }

    let runtime = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            tracing::error!("Failed to start async runtime: {e}");
            std::process::exit(1);
        }
    };
    runtime.block_on(run(args, config));
    tracing::info!("Shutdown complete");
}

async fn run(args: cli::Args, config: HarborConfig) {
    let (events, receiver) = host_channel();

    let mut backend_config = config.backend.clone();
    if let Some(path) = args.backend_path {
        backend_config.binary_path = Some(path);
    }
    let backend = match BackendProcess::new(&backend_config) {
        Ok(backend) => backend,
        Err(e) => {
            tracing::error!("Invalid backend settings: {e}");
            return;
        }
    };

    let frontend = Arc::new(FrontendProcess::new(&config.frontend));
    if let Err(e) = frontend.start().await {
        tracing::warn!("Frontend server did not start: {e}");
    }

    let updater = if args.skip_update_check {
        GithubUpdateChecker::disabled()
    } else {
        GithubUpdateChecker::new(&config.updates)
    };

    let surfaces = Arc::new(HeadlessSurfaceHost::new(events.clone(), &config.frontend));
    let shortcuts = Arc::new(HeadlessShortcuts::default());
    let collaborators = Collaborators {
        updater: Arc::new(updater),
        surfaces: surfaces.clone(),
        secure_fetch: Arc::new(HeadlessSecureFetch::new(surfaces)),
        shortcuts: shortcuts.clone(),
        backend: Arc::new(backend),
        frontend,
        exit: Arc::new(SystemExit::new(shortcuts)),
    };
    let options = BootOptions {
        show_splash: config.startup.splash,
        post_ready_script: config.startup.post_ready_script.clone(),
    };

    let coordinator = LifecycleCoordinator::new(collaborators, events.clone(), options);
    tokio::spawn(log_lifecycle(coordinator.bus().subscribe()));
    tokio::spawn(forward_quit_signals(events.clone()));

    events.send(HostEvent::Ready);
    tracing::info!("Entering event loop");
    coordinator.run(receiver).await;
}

async fn log_lifecycle(mut events: broadcast::Receiver<LifecycleEvent>) {
    loop {
        match events.recv().await {
            Ok(event) => tracing::debug!(?event, "lifecycle"),
            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                tracing::debug!(skipped, "lifecycle log fell behind");
            }
            Err(broadcast::error::RecvError::Closed) => return,
        }
    }
}

/// Turn Ctrl-C and SIGTERM into quit requests. Repeats are absorbed by the
/// shutdown guard.
async fn forward_quit_signals(events: HostEventSender) {
    loop {
        if let Err(e) = quit_signal().await {
            tracing::warn!("Cannot listen for quit signals: {e}");
            return;
        }
        tracing::info!("Quit signal received");
        events.request_quit();
    }
}

#[cfg(unix)]
async fn quit_signal() -> std::io::Result<()> {
    use tokio::signal::unix::{signal, SignalKind};

    let mut terminate = signal(SignalKind::terminate())?;
    tokio::select! {
        result = tokio::signal::ctrl_c() => result,
        _ = terminate.recv() => Ok(()),
    }
}

#[cfg(not(unix))]
async fn quit_signal() -> std::io::Result<()> {
    tokio::signal::ctrl_c().await
}
