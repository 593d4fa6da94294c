//! Speech coach CLI
//!
//! Replays a recorded session script through the monitoring pipeline and
//! raises hand motion, eye contact and filler-word alerts as it goes.

use clap::Parser;
use speech_coach_lib::core::config::CoachConfig;
use speech_coach_lib::platform::replay::ReplayScript;
use speech_coach_lib::{init_tracing, run_replay_session};
use std::path::PathBuf;
use std::process::ExitCode;

/// Real-time presentation coaching alerts
#[derive(Parser, Debug)]
#[command(name = "speech-coach")]
#[command(version)]
#[command(about = "Hand motion, eye contact and filler-word alerts for speakers", long_about = None)]
struct Cli {
    /// Session script to replay (JSON lines)
    #[arg(long)]
    replay: PathBuf,

    /// Configuration file (defaults to the data directory's settings.json)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long)]
    log_level: Option<String>,

    /// Emit logs as JSON
    #[arg(long)]
    json_logs: bool,

    /// Log alerts only, never show desktop notifications
    #[arg(long)]
    no_notify: bool,

    /// Print the session report as JSON when done
    #[arg(long)]
    report: bool,
}

/// Apply command line overrides on top of the loaded configuration and
/// validate the result again
fn apply_overrides(
    config: &mut CoachConfig,
    cli: &Cli,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    if let Some(level) = &cli.log_level {
        config.logging.level = level.clone();
    }
    if cli.json_logs {
        config.logging.json = true;
    }
    if cli.no_notify {
        config.notifications.enabled = false;
    }
    config.validate()
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let loaded = match &cli.config {
        Some(path) => CoachConfig::load_from(path),
        None => CoachConfig::load(),
    };
    let mut config = match loaded {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load configuration: {}", e);
            return ExitCode::from(2);
        }
    };

    if let Err(e) = apply_overrides(&mut config, &cli) {
        eprintln!("Invalid command line options: {}", e);
        return ExitCode::from(2);
    }
    init_tracing(&config.logging);

    let script = match ReplayScript::load(&cli.replay) {
        Ok(script) => script,
        Err(e) => {
            tracing::error!("Cannot replay {}: {}", cli.replay.display(), e);
            return ExitCode::from(2);
        }
    };
    tracing::info!(
        frames = script.frames.len(),
        fragments = script.speech.len(),
        duration_ms = script.duration().as_millis() as u64,
        "Loaded replay script"
    );

    let report = run_replay_session(config, script).await;

    if cli.report {
        match serde_json::to_string_pretty(&report) {
            Ok(json) => println!("{}", json),
            Err(e) => tracing::error!("Failed to serialize session report: {}", e),
        }
    }

    if report.is_clean() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cli(args: &[&str]) -> Cli {
        let mut argv = vec!["speech-coach", "--replay", "session.jsonl"];
        argv.extend_from_slice(args);
        Cli::try_parse_from(argv).unwrap()
    }

    #[test]
    fn test_overrides_are_applied() {
        let mut config = CoachConfig::default();
        apply_overrides(&mut config, &cli(&["--log-level", "debug", "--json-logs", "--no-notify"]))
            .unwrap();

        assert_eq!(config.logging.level, "debug");
        assert!(config.logging.json);
        assert!(!config.notifications.enabled);
    }

    #[test]
    fn test_invalid_log_level_override_is_rejected() {
        let mut config = CoachConfig::default();
        assert!(apply_overrides(&mut config, &cli(&["--log-level", "loud"])).is_err());
    }

    #[test]
    fn test_no_overrides_keeps_config() {
        let mut config = CoachConfig::default();
        apply_overrides(&mut config, &cli(&[])).unwrap();
        assert_eq!(config, CoachConfig::default());
    }
}
