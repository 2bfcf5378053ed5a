//! `lifeline` -- command-line dispatch board for emergency service
//! coordination.
//!
//! Parses arguments, sets up tracing, and hands off to the command
//! dispatcher. Config and completions run without a board connection;
//! everything else connects first.

mod cli;
mod commands;
mod config;
mod error;
mod output;

use clap::{CommandFactory, Parser};

use crate::cli::{Cli, Command};
use crate::error::CliError;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    init_tracing(cli.global.verbose);

    if let Err(err) = run(cli).await {
        let code = err.exit_code();
        eprintln!("{:?}", miette::Report::new(err));
        std::process::exit(code);
    }
}

async fn run(cli: Cli) -> Result<(), CliError> {
    match cli.command {
        // Local commands, no board needed.
        Command::Config(ref args) => commands::config_cmd::handle(args, &cli.global),
        Command::Completions(ref args) => {
            clap_complete::generate(
                args.shell,
                &mut Cli::command(),
                "lifeline",
                &mut std::io::stdout(),
            );
            Ok(())
        }

        // Everything else goes through the connected board.
        command => {
            let (board_config, adapter) = config::resolve_board(&cli.global)?;
            commands::dispatch(command, board_config, adapter, &cli.global).await
        }
    }
}

/// Map `-v` counts to tracing levels. Logs go to stderr so they never
/// pollute piped output.
fn init_tracing(verbosity: u8) {
    use tracing_subscriber::EnvFilter;

    let level = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(format!("lifeline={level},lifeline_core={level},lifeline_api={level}")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}
