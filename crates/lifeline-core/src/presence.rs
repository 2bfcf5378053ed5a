// ── Presence heartbeat ──
//
// Keeps the operator's `online` flag and `last_seen` column current
// while they are signed in and the app is foregrounded. The session
// state is checked at every write, so an online stamp can never land
// after sign-out has begun. The offline stamp on background/sign-out is
// fire-and-forget, matching the best-effort nature of unload writes.

use chrono::Utc;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use lifeline_api::{StoreAdapter, Table};

use crate::model::EntityId;
use crate::session::SessionState;

/// Seconds between presence heartbeats.
pub const HEARTBEAT_SECS: u64 = 60;

/// Background task: heartbeat on an interval, an immediate online stamp
/// whenever the app returns to the foreground or a session begins, and
/// an offline stamp when the app backgrounds or the session ends.
pub(crate) async fn presence_task(
    adapter: StoreAdapter,
    mut session: watch::Receiver<SessionState>,
    mut foreground: watch::Receiver<bool>,
    cancel: CancellationToken,
) {
    let mut interval = tokio::time::interval(std::time::Duration::from_secs(HEARTBEAT_SECS));
    interval.tick().await; // consume the immediate first tick

    // The row we last stamped online, so sign-out can flip it back.
    let mut stamped: Option<EntityId> = None;

    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            _ = interval.tick() => {
                mark_online(&adapter, &session, &foreground, &mut stamped).await;
            }
            changed = foreground.changed() => {
                if changed.is_err() {
                    break;
                }
                if *foreground.borrow() {
                    mark_online(&adapter, &session, &foreground, &mut stamped).await;
                } else if let Some(id) = stamped.as_ref() {
                    mark_offline(&adapter, id).await;
                }
            }
            changed = session.changed() => {
                if changed.is_err() {
                    break;
                }
                if session.borrow().allows_presence() {
                    mark_online(&adapter, &session, &foreground, &mut stamped).await;
                } else if let Some(id) = stamped.take() {
                    mark_offline(&adapter, &id).await;
                }
            }
        }
    }

    // Best-effort offline stamp on shutdown.
    if let Some(id) = stamped.take() {
        mark_offline(&adapter, &id).await;
    }

    debug!("presence task exiting");
}

/// Stamp the operator online, unless the session or foreground state
/// forbids it.
async fn mark_online(
    adapter: &StoreAdapter,
    session: &watch::Receiver<SessionState>,
    foreground: &watch::Receiver<bool>,
    stamped: &mut Option<EntityId>,
) {
    if !*foreground.borrow() {
        return;
    }

    // Clone out of the watch borrow before awaiting.
    let personnel_id = {
        let state = session.borrow();
        if !state.allows_presence() {
            return;
        }
        state.identity().and_then(|i| i.personnel_id.clone())
    };

    // An operator who never matched a roster row has nothing to stamp.
    let Some(id) = personnel_id else { return };

    let patch = serde_json::json!({
        "online": true,
        "last_seen": Utc::now().to_rfc3339(),
    });
    if let Err(e) = adapter.update(Table::Personnel, &id.to_string(), &patch).await {
        warn!(error = %e, "presence heartbeat failed");
    } else {
        *stamped = Some(id);
    }
}

/// Flip a previously stamped row offline. Unconditional: signing out or
/// backgrounding must win even though the session no longer allows
/// online writes.
async fn mark_offline(adapter: &StoreAdapter, id: &EntityId) {
    let patch = serde_json::json!({
        "online": false,
        "last_seen": Utc::now().to_rfc3339(),
    });
    if let Err(e) = adapter.update(Table::Personnel, &id.to_string(), &patch).await {
        warn!(error = %e, "offline stamp failed");
    }
}
