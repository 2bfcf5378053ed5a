//! Crew command handlers.

use std::sync::Arc;

use tabled::Tabled;

use lifeline_core::{
    Command as CoreCommand, CommandResult, CreateCrewInput, Crew, CrewFilter, CrewPatch,
    DispatchBoard, EntityId, ServiceType,
};

use crate::cli::{CrewsArgs, CrewsCommand, GlobalOpts};
use crate::error::CliError;
use crate::output;

use super::util;

// ── Table row ───────────────────────────────────────────────────────

#[derive(Tabled)]
struct CrewRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Callsign")]
    callsign: String,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "Capabilities")]
    capabilities: String,
    #[tabled(rename = "Location")]
    location: String,
}

impl From<&Arc<Crew>> for CrewRow {
    fn from(c: &Arc<Crew>) -> Self {
        Self {
            id: c.id.to_string(),
            name: c.name.clone(),
            callsign: c.callsign.clone().unwrap_or_default(),
            status: c.status.to_string(),
            capabilities: capabilities_label(&c.capabilities),
            location: c.location.clone().unwrap_or_default(),
        }
    }
}

fn capabilities_label(capabilities: &[ServiceType]) -> String {
    if capabilities.is_empty() {
        "any".into()
    } else {
        capabilities
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(", ")
    }
}

fn detail(crew: &Crew) -> String {
    let mut lines = vec![
        format!("Crew:         {}", crew.id),
        format!("Name:         {}", crew.name),
        format!("Status:       {}", crew.status),
        format!("Capabilities: {}", capabilities_label(&crew.capabilities)),
        format!(
            "Created:      {}",
            crew.created_at.format("%Y-%m-%d %H:%M UTC")
        ),
    ];
    if let Some(ref callsign) = crew.callsign {
        lines.push(format!("Callsign:     {callsign}"));
    }
    if let Some(ref ship) = crew.ship {
        lines.push(format!("Ship:         {ship}"));
    }
    if let Some(ref location) = crew.location {
        lines.push(format!("Location:     {location}"));
    }
    if !crew.members.is_empty() {
        let ids = crew
            .members
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(", ");
        lines.push(format!("Members:      {ids}"));
    }
    lines.join("\n")
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(
    board: &DispatchBoard,
    args: CrewsArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match args.command {
        CrewsCommand::List {
            available,
            can_serve,
        } => {
            let filter = if available {
                CrewFilter::Available
            } else if let Some(service) = can_serve {
                CrewFilter::CanServe(service.into())
            } else {
                CrewFilter::All
            };

            let snap: Vec<Arc<Crew>> = board
                .crews()
                .current()
                .iter()
                .filter(|c| filter.matches(c))
                .cloned()
                .collect();

            let out = output::render_list(
                &global.output,
                &snap,
                |c| CrewRow::from(c),
                |c| c.id.to_string(),
            );
            output::print_output(&out, global.quiet);
            Ok(())
        }

        CrewsCommand::Get { id } => {
            let snap = board.crews();
            let crew = snap
                .current()
                .iter()
                .find(|c| c.id.to_string() == id || c.name == id)
                .cloned()
                .ok_or_else(|| CliError::NotFound {
                    resource_type: "crew".into(),
                    identifier: id.clone(),
                    list_command: "crews list".into(),
                })?;

            let out = output::render_single(
                &global.output,
                &crew,
                |c| detail(c),
                |c| c.id.to_string(),
            );
            output::print_output(&out, global.quiet);
            Ok(())
        }

        CrewsCommand::Create {
            name,
            callsign,
            ship,
            capabilities,
            location,
            members,
        } => {
            let input = CreateCrewInput {
                name,
                callsign,
                ship,
                capabilities: capabilities.into_iter().map(Into::into).collect(),
                location,
                members: members.into_iter().map(EntityId::from).collect(),
            };
            let result = board.execute(CoreCommand::CreateCrew(input)).await?;
            if !global.quiet {
                if let CommandResult::Crew(crew) = result {
                    eprintln!("Crew {} registered ({})", crew.id, crew.name);
                } else {
                    eprintln!("Crew registered");
                }
            }
            Ok(())
        }

        CrewsCommand::Update {
            id,
            name,
            callsign,
            ship,
            status,
            capabilities,
            location,
            members,
        } => {
            let crew = util::resolve_crew_id(board, &id)?;
            let patch = CrewPatch {
                name,
                callsign,
                ship,
                status: status.map(Into::into),
                capabilities: capabilities
                    .map(|caps| caps.into_iter().map(Into::into).collect()),
                location,
                members: members.map(|ids| ids.into_iter().map(EntityId::from).collect()),
            };
            board.execute(CoreCommand::UpdateCrew { crew, patch }).await?;
            if !global.quiet {
                eprintln!("Crew updated");
            }
            Ok(())
        }
    }
}
