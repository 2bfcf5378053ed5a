//! Personnel roster command handlers.

use std::sync::Arc;

use tabled::Tabled;

use lifeline_core::{DispatchBoard, Personnel, PersonnelFilter};

use crate::cli::{GlobalOpts, PersonnelArgs, PersonnelCommand};
use crate::error::CliError;
use crate::output;

#[derive(Tabled)]
struct PersonnelRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Username")]
    username: String,
    #[tabled(rename = "Role")]
    role: String,
    #[tabled(rename = "Online")]
    online: String,
    #[tabled(rename = "Last Seen")]
    last_seen: String,
}

impl From<&Arc<Personnel>> for PersonnelRow {
    fn from(p: &Arc<Personnel>) -> Self {
        Self {
            id: p.id.to_string(),
            username: p.username.clone(),
            role: p.role.to_string(),
            online: if p.online { "yes".into() } else { "no".into() },
            last_seen: p.last_seen.map_or_else(
                || "never".into(),
                |t| t.format("%Y-%m-%d %H:%M UTC").to_string(),
            ),
        }
    }
}

pub fn handle(
    board: &DispatchBoard,
    args: PersonnelArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match args.command {
        PersonnelCommand::List {
            role,
            dispatchers,
            online,
        } => {
            let filter = if dispatchers {
                PersonnelFilter::Dispatchers
            } else if online {
                PersonnelFilter::Online
            } else if let Some(role) = role {
                PersonnelFilter::ByRole(role.into())
            } else {
                PersonnelFilter::All
            };

            let snap: Vec<Arc<Personnel>> = board
                .personnel()
                .current()
                .iter()
                .filter(|p| filter.matches(p))
                .cloned()
                .collect();

            let out = output::render_list(
                &global.output,
                &snap,
                |p| PersonnelRow::from(p),
                |p| p.id.to_string(),
            );
            output::print_output(&out, global.quiet);
            Ok(())
        }
    }
}
