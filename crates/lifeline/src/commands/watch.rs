//! Live board watch: keep the feed open and print changes until Ctrl-C.

use std::sync::Arc;

use owo_colors::OwoColorize;

use lifeline_core::{Alert, AlertPermission, AlertSink, DispatchBoard, RequestStatus};

use crate::cli::GlobalOpts;
use crate::error::CliError;
use crate::output;

/// Terminal alert sink. A CLI session has no permission dialog to show,
/// so alerts are always allowed.
struct PrintSink {
    color: bool,
}

impl AlertSink for PrintSink {
    fn permission(&self) -> AlertPermission {
        AlertPermission::Granted
    }

    fn request_permission(&self) -> AlertPermission {
        AlertPermission::Granted
    }

    fn alert(&self, alert: &Alert) {
        let title = if self.color {
            alert.title.bold().to_string()
        } else {
            alert.title.clone()
        };
        eprintln!("\x07{title}");
        for line in alert.body.lines() {
            eprintln!("  {line}");
        }
    }

    fn toast(&self, message: &str) {
        eprintln!("-- {message}");
    }
}

pub async fn handle(board: &DispatchBoard, global: &GlobalOpts) -> Result<(), CliError> {
    let color = output::should_color(&global.color);
    board.attach_alert_sink(Arc::new(PrintSink { color })).await;

    let mut requests = board.requests();

    if !global.quiet {
        eprintln!("Watching the board (Ctrl-C to stop)");
        eprintln!("{}", status_line(&requests.latest()));
    }

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            snapshot = requests.changed() => {
                let Some(snapshot) = snapshot else { break };
                if !global.quiet {
                    eprintln!("{}", status_line(&snapshot));
                }
            }
        }
    }

    if !global.quiet {
        eprintln!("Stopped");
    }
    Ok(())
}

fn status_line(snapshot: &[Arc<lifeline_core::ServiceRequest>]) -> String {
    let count = |status: RequestStatus| snapshot.iter().filter(|r| r.status == status).count();
    format!(
        "[{}] {} pending / {} assigned / {} in progress",
        chrono::Utc::now().format("%H:%M:%S"),
        count(RequestStatus::Pending),
        count(RequestStatus::Assigned),
        count(RequestStatus::InProgress),
    )
}
