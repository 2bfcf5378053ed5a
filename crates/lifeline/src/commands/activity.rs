//! Activity log command handlers.

use std::sync::Arc;

use tabled::Tabled;

use lifeline_core::{ActivityEntry, DispatchBoard};

use crate::cli::{ActivityArgs, ActivityCommand, GlobalOpts};
use crate::error::CliError;
use crate::output;

#[derive(Tabled)]
struct ActivityRow {
    #[tabled(rename = "Time")]
    time: String,
    #[tabled(rename = "Kind")]
    kind: String,
    #[tabled(rename = "Actor")]
    actor: String,
    #[tabled(rename = "Message")]
    message: String,
}

impl From<&Arc<ActivityEntry>> for ActivityRow {
    fn from(entry: &Arc<ActivityEntry>) -> Self {
        Self {
            time: entry.created_at.format("%Y-%m-%d %H:%M").to_string(),
            kind: entry.kind.to_string(),
            actor: entry.actor_name.clone(),
            message: entry.message.clone(),
        }
    }
}

pub fn handle(
    board: &DispatchBoard,
    args: ActivityArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match args.command {
        ActivityCommand::List { limit } => {
            // Entries arrive newest-first; the limit trims the tail.
            let snap: Vec<Arc<ActivityEntry>> = board
                .activity()
                .current()
                .iter()
                .take(limit)
                .cloned()
                .collect();

            let out = output::render_list(
                &global.output,
                &snap,
                |e| ActivityRow::from(e),
                |e| e.id.to_string(),
            );
            output::print_output(&out, global.quiet);
            Ok(())
        }
    }
}
