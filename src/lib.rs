pub mod core;
pub mod models;
pub mod platform;

use crate::core::config::{CoachConfig, LoggingConfig};
use crate::core::session_supervisor::{Collaborators, SessionSupervisor};
use crate::models::session::SessionReport;
use crate::platform::get_platform;
use crate::platform::notification::{default_notifier, Notifier};
use crate::platform::replay::ReplayScript;
use std::sync::Arc;
use tracing_subscriber::prelude::*;

/// Install the global subscriber. `RUST_LOG` takes precedence over the
/// configured level. Calling it again is a no-op.
pub fn init_tracing(config: &LoggingConfig) {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        format!("speech_coach_lib={level},speech_coach={level}", level = config.level).into()
    });

    let fmt_layer = if config.json {
        tracing_subscriber::fmt::layer().json().boxed()
    } else {
        tracing_subscriber::fmt::layer().boxed()
    };

    let _ = tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .try_init();
}

/// Resolves on Ctrl+C or SIGTERM
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, stopping session");
        }
        _ = terminate => {
            tracing::info!("Received SIGTERM, stopping session");
        }
    }
}

/// Wire a replay script to the session's collaborator seams
pub fn replay_collaborators(script: ReplayScript, notifier: Arc<dyn Notifier>) -> Collaborators {
    let (frame_source, extractor, speech_source) = script.into_collaborators();

    Collaborators {
        frame_source: Box::new(frame_source),
        motion_extractor: extractor.clone(),
        gaze_extractor: extractor,
        speech_source: Box::new(speech_source),
        notifier,
    }
}

/// Run a scripted session until it plays out or the process is told to stop
pub async fn run_replay_session(config: CoachConfig, script: ReplayScript) -> SessionReport {
    let platform = get_platform();
    tracing::info!(
        os = %platform.get_os_name(),
        notifier = if config.notifications.enabled { platform.notification_backend() } else { "log" },
        "Preparing session"
    );

    let notifier = default_notifier(config.notifications.enabled);
    let collaborators = replay_collaborators(script, notifier);

    let mut supervisor = SessionSupervisor::start(config, collaborators);
    tracing::info!(session_id = supervisor.session_id(), "Replaying session");

    supervisor.run(shutdown_signal()).await
}
