//! Command handlers.
//!
//! Every handler gets a connected `DispatchBoard` and the global options.
//! The dispatcher here owns the connect / sign-in / disconnect bracket so
//! individual handlers only deal with their own subcommand.

pub mod activity;
pub mod config_cmd;
pub mod crews;
pub mod dashboard;
pub mod personnel;
pub mod requests;
pub mod util;
pub mod watch;

use lifeline_api::StoreAdapter;
use lifeline_core::{BoardConfig, DispatchBoard};

use crate::cli::{Command, GlobalOpts};
use crate::error::CliError;

/// Connect a board, run the matching handler, then disconnect.
///
/// One-shot commands disable the change feed and the refresh timer;
/// a single full refresh at connect time is all they need. `watch` is
/// the exception and keeps the feed open.
pub async fn dispatch(
    cmd: Command,
    mut board_config: BoardConfig,
    adapter: Option<StoreAdapter>,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    if !matches!(cmd, Command::Watch) {
        board_config.feed_enabled = false;
        board_config.refresh_interval_secs = 0;
    }

    let board = match adapter {
        Some(adapter) => DispatchBoard::with_adapter(board_config, adapter),
        None => DispatchBoard::new(board_config)?,
    };

    let spinner = connect_spinner(global.quiet);
    let connected = board.connect().await;
    if let Some(spinner) = spinner {
        spinner.finish_and_clear();
    }
    connected?;

    // Restore the locally configured operator identity, if any. Without
    // one the session stays anonymous and dispatcher commands will be
    // refused by the board.
    if board.config().operator.is_some() {
        let identity = board.sign_in()?;
        tracing::debug!(operator = %identity.username, role = %identity.role, "signed in");
    }

    let result = match cmd {
        Command::Dashboard => dashboard::handle(&board, global),
        Command::Requests(args) => requests::handle(&board, args, global).await,
        Command::Crews(args) => crews::handle(&board, args, global).await,
        Command::Personnel(args) => personnel::handle(&board, args, global),
        Command::Activity(args) => activity::handle(&board, args, global),
        Command::Watch => watch::handle(&board, global).await,
        Command::Config(_) | Command::Completions(_) => {
            unreachable!("handled before board construction")
        }
    };

    board.disconnect().await;
    result
}

/// Spinner on stderr while the initial refresh runs. Suppressed when
/// quiet or when stderr is not a terminal.
fn connect_spinner(quiet: bool) -> Option<indicatif::ProgressBar> {
    use std::io::IsTerminal;

    if quiet || !std::io::stderr().is_terminal() {
        return None;
    }
    let spinner = indicatif::ProgressBar::new_spinner();
    spinner.set_message("Connecting...");
    spinner.enable_steady_tick(std::time::Duration::from_millis(80));
    Some(spinner)
}
