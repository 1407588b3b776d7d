//! wake-capture CLI entry point

use std::process::ExitCode;

use clap::Parser;

use wake_capture::cli::{
    app::{load_merged_config, run_devices, run_feed, run_listen, EXIT_ERROR, EXIT_USAGE_ERROR},
    args::{Cli, Commands, FeedOptions, ListenOptions, SaveArgs},
    config_cmd::handle_config_command,
    init_logging,
    presenter::Presenter,
};
use wake_capture::domain::config::AppConfig;
use wake_capture::domain::recording::Duration;
use wake_capture::infrastructure::XdgConfigStore;

/// Parse an optional duration flag, reporting failures through the presenter
fn parse_duration(
    value: Option<&str>,
    flag: &str,
    presenter: &Presenter,
) -> Result<Option<Duration>, ExitCode> {
    match value {
        None => Ok(None),
        Some(s) => s.parse::<Duration>().map(Some).map_err(|e| {
            presenter.error(&format!("Invalid {}: {}", flag, e));
            ExitCode::from(EXIT_USAGE_ERROR)
        }),
    }
}

fn parse_window(export: &SaveArgs, presenter: &Presenter) -> Result<Option<Duration>, ExitCode> {
    parse_duration(export.window.as_deref(), "window", presenter)
}

#[tokio::main(flavor = "multi_thread", worker_threads = 2)]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    let presenter = Presenter::new();

    let cli_config = match &cli.command {
        Commands::Listen(args) => AppConfig {
            device: args.device.clone(),
            ..Default::default()
        },
        _ => AppConfig::empty(),
    };

    let config = load_merged_config(cli_config).await;
    init_logging(config.log_level_or_default());

    match cli.command {
        Commands::Devices => run_devices(&config),
        Commands::Listen(args) => {
            let duration = match parse_duration(args.duration.as_deref(), "duration", &presenter) {
                Ok(d) => d.unwrap_or_else(Duration::default_listen),
                Err(code) => return code,
            };
            let window = match parse_window(&args.export, &presenter) {
                Ok(w) => w,
                Err(code) => return code,
            };

            let options = ListenOptions {
                duration,
                replay: args.replay,
                save: args.export.save,
                window,
            };
            run_listen(options, config).await
        }
        Commands::Feed(args) => {
            let window = match parse_window(&args.export, &presenter) {
                Ok(w) => w,
                Err(code) => return code,
            };

            let options = FeedOptions {
                input: args.input,
                frame_ms: args.frame_ms,
                save: args.export.save,
                window,
            };
            run_feed(options, config).await
        }
        Commands::Config { action } => {
            let store = XdgConfigStore::new();
            match handle_config_command(action, &store, &presenter).await {
                Ok(()) => ExitCode::SUCCESS,
                Err(e) => {
                    presenter.error(&e.to_string());
                    ExitCode::from(EXIT_ERROR)
                }
            }
        }
    }
}
