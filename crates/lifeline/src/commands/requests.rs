//! Service request command handlers.

use std::sync::Arc;

use tabled::Tabled;

use lifeline_core::{
    Command as CoreCommand, CommandResult, CreateRequestInput, DispatchBoard, RequestFilter,
    RequestStatus, ServiceRequest,
};

use crate::cli::{GlobalOpts, RequestsArgs, RequestsCommand};
use crate::error::CliError;
use crate::output;

use super::util;

// ── Table rows ──────────────────────────────────────────────────────

#[derive(Tabled)]
struct RequestRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Service")]
    service: String,
    #[tabled(rename = "Priority")]
    priority: String,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "Location")]
    location: String,
    #[tabled(rename = "Requester")]
    requester: String,
    #[tabled(rename = "Crew")]
    crew: String,
}

fn detail(request: &ServiceRequest, crew: &str) -> String {
    let mut lines = vec![
        format!("Request:   {}", request.id),
        format!("Service:   {}", request.service.label()),
        format!("Priority:  {}", request.priority),
        format!("Status:    {}", request.status),
        format!("Location:  {}", request.location),
        format!("Requester: {}", request.requester_name),
        format!(
            "Created:   {}",
            request.created_at.format("%Y-%m-%d %H:%M UTC")
        ),
    ];
    if let Some(ref handle) = request.discord_username {
        lines.push(format!("Contact:   @{handle}"));
    }
    if let Some(ref description) = request.description {
        lines.push(format!("Details:   {description}"));
    }
    if !crew.is_empty() {
        lines.push(format!("Crew:      {crew}"));
    }
    if let Some(completed) = request.completed_at {
        lines.push(format!(
            "Completed: {}",
            completed.format("%Y-%m-%d %H:%M UTC")
        ));
    }
    lines.join("\n")
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(
    board: &DispatchBoard,
    args: RequestsArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match args.command {
        RequestsCommand::List {
            status,
            service,
            min_priority,
            active,
            crew,
        } => {
            let mut filters: Vec<RequestFilter> = Vec::new();
            if active {
                filters.push(RequestFilter::Active);
            }
            if let Some(status) = status {
                filters.push(RequestFilter::ByStatus(status.into()));
            }
            if let Some(service) = service {
                filters.push(RequestFilter::ByService(service.into()));
            }
            if let Some(min) = min_priority {
                filters.push(RequestFilter::MinPriority(min.into()));
            }
            if let Some(ref crew) = crew {
                filters.push(RequestFilter::ByCrew(util::resolve_crew_id(board, crew)?));
            }

            let crews = board.crews();
            let snap: Vec<Arc<ServiceRequest>> = board
                .requests()
                .current()
                .iter()
                .filter(|r| filters.iter().all(|f| f.matches(r)))
                .cloned()
                .collect();

            let out = output::render_list(
                &global.output,
                &snap,
                |r| RequestRow {
                    id: r.id.to_string(),
                    service: r.service.to_string(),
                    priority: r.priority.to_string(),
                    status: r.status.to_string(),
                    location: r.location.clone(),
                    requester: r.requester_name.clone(),
                    crew: util::crew_name(crews.current(), r.assigned_crew.as_ref()),
                },
                |r| r.id.to_string(),
            );
            output::print_output(&out, global.quiet);
            Ok(())
        }

        RequestsCommand::Get { id } => {
            let snap = board.requests();
            let request = snap
                .current()
                .iter()
                .find(|r| r.id.to_string() == id)
                .cloned()
                .ok_or_else(|| CliError::NotFound {
                    resource_type: "request".into(),
                    identifier: id.clone(),
                    list_command: "requests list".into(),
                })?;

            let crews = board.crews();
            let crew = util::crew_name(crews.current(), request.assigned_crew.as_ref());
            let out = output::render_single(
                &global.output,
                &request,
                |r| detail(r, &crew),
                |r| r.id.to_string(),
            );
            output::print_output(&out, global.quiet);
            Ok(())
        }

        RequestsCommand::Create {
            service,
            priority,
            location,
            description,
            requester,
            discord,
        } => {
            let input = CreateRequestInput {
                service: service.into(),
                priority: priority.into(),
                location,
                description,
                requester,
                discord_username: discord,
            };
            let result = board.execute(CoreCommand::CreateRequest(input)).await?;
            if !global.quiet {
                if let CommandResult::Request(request) = result {
                    eprintln!(
                        "Request {} submitted ({} at {})",
                        request.id,
                        request.service.label(),
                        request.location
                    );
                } else {
                    eprintln!("Request submitted");
                }
            }
            Ok(())
        }

        RequestsCommand::Assign { request, crew } => {
            let request = util::resolve_request_id(board, &request)?;
            let crew = util::resolve_crew_id(board, &crew)?;
            board
                .execute(CoreCommand::AssignCrew { request, crew })
                .await?;
            if !global.quiet {
                eprintln!("Crew assigned");
            }
            Ok(())
        }

        RequestsCommand::Status { request, status } => {
            let request = util::resolve_request_id(board, &request)?;
            let status: RequestStatus = status.into();
            board
                .execute(CoreCommand::UpdateRequestStatus { request, status })
                .await?;
            if !global.quiet {
                eprintln!("Request moved to {status}");
            }
            Ok(())
        }

        RequestsCommand::Cancel { request } => {
            if !util::confirm(&format!("Cancel request '{request}'?"), global.yes)? {
                return Ok(());
            }
            let request = util::resolve_request_id(board, &request)?;
            board
                .execute(CoreCommand::UpdateRequestStatus {
                    request,
                    status: RequestStatus::Cancelled,
                })
                .await?;
            if !global.quiet {
                eprintln!("Request cancelled");
            }
            Ok(())
        }
    }
}
