//! Board overview: the CLI's answer to the dispatch dashboard.

use owo_colors::OwoColorize;
use serde::Serialize;

use lifeline_core::{CrewStatus, DispatchBoard, RequestStatus};

use crate::cli::{GlobalOpts, OutputFormat};
use crate::error::CliError;
use crate::output;

/// Serializable summary for `--output json` / `yaml`.
#[derive(Serialize)]
struct Summary {
    pending: usize,
    assigned: usize,
    in_progress: usize,
    crews_available: usize,
    crews_on_mission: usize,
    crews_total: usize,
    personnel: usize,
    personnel_online: usize,
    recent_activity: Vec<String>,
}

pub fn handle(board: &DispatchBoard, global: &GlobalOpts) -> Result<(), CliError> {
    let requests = board.requests();
    let crews = board.crews();
    let personnel = board.personnel();
    let activity = board.activity();

    let count_status = |status: RequestStatus| {
        requests
            .current()
            .iter()
            .filter(|r| r.status == status)
            .count()
    };
    let count_crews = |status: CrewStatus| {
        crews.current().iter().filter(|c| c.status == status).count()
    };

    let summary = Summary {
        pending: count_status(RequestStatus::Pending),
        assigned: count_status(RequestStatus::Assigned),
        in_progress: count_status(RequestStatus::InProgress),
        crews_available: count_crews(CrewStatus::Available),
        crews_on_mission: count_crews(CrewStatus::OnMission),
        crews_total: crews.current().len(),
        personnel: personnel.current().len(),
        personnel_online: personnel.current().iter().filter(|p| p.online).count(),
        recent_activity: activity
            .current()
            .iter()
            .take(5)
            .map(|e| format!("{} ({})", e.message, e.actor_name))
            .collect(),
    };

    match global.output {
        OutputFormat::Table | OutputFormat::Plain => {
            let out = render_board(board, &summary, output::should_color(&global.color));
            output::print_output(&out, global.quiet);
        }
        ref format => {
            let out = output::render_single(format, &summary, |_| String::new(), |_| String::new());
            output::print_output(&out, global.quiet);
        }
    }
    Ok(())
}

fn render_board(board: &DispatchBoard, summary: &Summary, color: bool) -> String {
    let requests = board.requests();
    let mut lines = Vec::new();

    let header = |text: &str| {
        if color {
            text.bold().to_string()
        } else {
            text.to_owned()
        }
    };

    lines.push(header("Dispatch Board"));
    lines.push(format!(
        "  {} pending / {} assigned / {} in progress",
        summary.pending, summary.assigned, summary.in_progress
    ));
    lines.push(format!(
        "  Crews: {} available, {} on mission, {} total",
        summary.crews_available, summary.crews_on_mission, summary.crews_total
    ));
    lines.push(format!(
        "  Personnel on roster: {} ({} online)",
        summary.personnel, summary.personnel_online
    ));

    let pending: Vec<String> = requests
        .current()
        .iter()
        .filter(|r| r.status == RequestStatus::Pending)
        .map(|r| {
            let line = format!(
                "  [{}] {} at {} ({})",
                r.priority,
                r.service.label(),
                r.location,
                r.requester_name
            );
            if color && r.priority == lifeline_core::Priority::Critical {
                line.red().to_string()
            } else {
                line
            }
        })
        .collect();

    if !pending.is_empty() {
        lines.push(String::new());
        lines.push(header("Pending Requests"));
        lines.extend(pending);
    }

    if !summary.recent_activity.is_empty() {
        lines.push(String::new());
        lines.push(header("Recent Activity"));
        for entry in &summary.recent_activity {
            lines.push(format!("  {entry}"));
        }
    }

    lines.join("\n")
}
