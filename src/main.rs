use std::env;
use std::process::ExitCode;

use tracing::{error, warn};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::filter::LevelFilter;

use rinviaBot::cli;
use rinviaBot::config::{AppConfig, BotSettings};
use rinviaBot::runtime;

const DEFAULT_RUN_MODE: &str = "bot";

fn init_tracing() {
    let env_filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy();

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .compact()
        .init();
}

#[tokio::main]
async fn main() -> ExitCode {
    init_tracing();

    let config = match env::var("CONFIG_FILE") {
        Ok(path) => AppConfig::from_file(&path).unwrap_or_else(|err| {
            warn!(path = %path, error = %err, "config file ignored, using environment only");
            AppConfig::default()
        }),
        Err(_) => AppConfig::default(),
    };

    let settings = match BotSettings::from_config(&config) {
        Ok(settings) => settings,
        Err(err) => {
            error!(error = %err, "invalid configuration");
            return ExitCode::FAILURE;
        }
    };

    let run_mode = config
        .lookup("RUN_MODE")
        .unwrap_or_else(|| DEFAULT_RUN_MODE.to_string());
    let result = match run_mode.as_str() {
        "bot" => {
            let token = match settings.require_bot_credentials() {
                Ok(token) => token.to_string(),
                Err(err) => {
                    error!(error = %err, "missing credentials");
                    return ExitCode::FAILURE;
                }
            };
            runtime::run_bot(settings, token).await
        }
        "cli" => cli::cli(settings).await,
        other => {
            error!(run_mode = other, "invalid run mode");
            return ExitCode::FAILURE;
        }
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!(error = %err, "rinviaBot stopped");
            ExitCode::FAILURE
        }
    }
}
