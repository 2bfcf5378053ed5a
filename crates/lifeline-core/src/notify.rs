// ── New-request notification bridge ──
//
// Watches the request collection and raises an alert for every request
// that newly enters the pending set. Detection diffs pending-id sets
// between snapshots, so a completion and a new submission landing in
// the same refresh still alert correctly.
//
// The first observed snapshot is the baseline: requests that were
// already pending when the bridge started never alert.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::model::{EntityId, Priority, RequestStatus, ServiceRequest};
use crate::session::SessionState;
use crate::stream::EntityStream;

/// How long after a dispatcher signs in to ask for alert permission.
/// Asking immediately, before the operator has seen the board, gets
/// reflexive denials.
pub const PERMISSION_REQUEST_DELAY: Duration = Duration::from_secs(2);

/// Whether the sink is allowed to raise alerts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlertPermission {
    /// Not yet asked.
    Default,
    Granted,
    Denied,
}

/// One alert about a newly pending request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Alert {
    pub title: String,
    pub body: String,
    /// Stable per-request tag so a re-raised alert replaces its
    /// predecessor instead of stacking.
    pub tag: String,
    /// Critical requests should stay on screen until acknowledged.
    pub require_interaction: bool,
}

impl Alert {
    /// Build the alert for a newly pending request.
    pub fn for_request(request: &ServiceRequest) -> Self {
        Self {
            title: "New Service Request".to_owned(),
            body: format!(
                "{} - {} priority\n{}",
                request.service, request.priority, request.location
            ),
            tag: format!("request-{}", request.id),
            require_interaction: request.priority == Priority::Critical,
        }
    }
}

/// Where alerts land. The CLI prints them; a desktop front end would
/// hand them to the OS notification center.
pub trait AlertSink: Send + Sync {
    fn permission(&self) -> AlertPermission;

    /// Ask the operator for permission. Returns the new state.
    fn request_permission(&self) -> AlertPermission;

    fn alert(&self, alert: &Alert);

    /// Low-key in-app message, not subject to permission.
    fn toast(&self, message: &str);
}

/// Background task: diff pending-request ids across snapshots and
/// alert on additions. Alerts go only to dispatchers.
pub(crate) async fn bridge_task(
    mut requests: EntityStream<ServiceRequest>,
    mut session: watch::Receiver<SessionState>,
    sink: Arc<dyn AlertSink>,
    cancel: CancellationToken,
) {
    // One delayed permission prompt, if the sink has never been asked.
    // The delay starts once a dispatcher signs in; prompting an
    // anonymous session is pointless since only dispatchers get alerts.
    if sink.permission() == AlertPermission::Default {
        let authed = tokio::select! {
            biased;
            _ = cancel.cancelled() => return,
            result = session.wait_for(is_dispatcher_session) => result.is_ok(),
        };
        if authed {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => return,
                _ = tokio::time::sleep(PERMISSION_REQUEST_DELAY) => {
                    sink.request_permission();
                }
            }
        }
    }

    let mut baseline: Option<HashSet<EntityId>> = None;

    // Seed from whatever the stream already holds.
    process_snapshot(&requests.latest(), &mut baseline, &session, sink.as_ref());

    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            snapshot = requests.changed() => {
                let Some(snapshot) = snapshot else { break };
                process_snapshot(&snapshot, &mut baseline, &session, sink.as_ref());
            }
        }
    }

    debug!("notification bridge exiting");
}

fn is_dispatcher_session(state: &SessionState) -> bool {
    state
        .identity()
        .is_some_and(|identity| identity.is_dispatcher())
}

fn process_snapshot(
    snapshot: &[Arc<ServiceRequest>],
    baseline: &mut Option<HashSet<EntityId>>,
    session: &watch::Receiver<SessionState>,
    sink: &dyn AlertSink,
) {
    let pending: HashSet<EntityId> = snapshot
        .iter()
        .filter(|r| r.status == RequestStatus::Pending)
        .map(|r| r.id.clone())
        .collect();

    let Some(previous) = baseline.as_ref() else {
        *baseline = Some(pending);
        return;
    };

    let fresh: Vec<&Arc<ServiceRequest>> = snapshot
        .iter()
        .filter(|r| pending.contains(&r.id) && !previous.contains(&r.id))
        .collect();

    let is_dispatcher = session
        .borrow()
        .identity()
        .is_some_and(|identity| identity.is_dispatcher());

    if !fresh.is_empty() && is_dispatcher {
        if sink.permission() == AlertPermission::Granted {
            for request in &fresh {
                sink.alert(&Alert::for_request(request));
            }
        }
        let message = if fresh.len() == 1 {
            "1 new pending request".to_owned()
        } else {
            format!("{} new pending requests", fresh.len())
        };
        sink.toast(&message);
    }

    *baseline = Some(pending);
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    use std::sync::Mutex;

    use chrono::Utc;

    use crate::model::{Role, ServiceType};
    use crate::session::Identity;

    struct RecordingSink {
        permission: Mutex<AlertPermission>,
        alerts: Mutex<Vec<Alert>>,
        toasts: Mutex<Vec<String>>,
    }

    impl RecordingSink {
        fn new(permission: AlertPermission) -> Self {
            Self {
                permission: Mutex::new(permission),
                alerts: Mutex::new(Vec::new()),
                toasts: Mutex::new(Vec::new()),
            }
        }
    }

    impl AlertSink for RecordingSink {
        fn permission(&self) -> AlertPermission {
            *self.permission.lock().unwrap()
        }

        fn request_permission(&self) -> AlertPermission {
            let mut p = self.permission.lock().unwrap();
            *p = AlertPermission::Granted;
            *p
        }

        fn alert(&self, alert: &Alert) {
            self.alerts.lock().unwrap().push(alert.clone());
        }

        fn toast(&self, message: &str) {
            self.toasts.lock().unwrap().push(message.to_owned());
        }
    }

    fn request(id: &str, status: RequestStatus, priority: Priority) -> Arc<ServiceRequest> {
        Arc::new(ServiceRequest {
            id: EntityId::from(id),
            service: ServiceType::Sar,
            priority,
            location: "Daymar".into(),
            description: None,
            status,
            requester_id: None,
            requester_name: "Eli".into(),
            discord_username: None,
            assigned_crew: None,
            dispatcher: None,
            created_at: Utc::now(),
            completed_at: None,
        })
    }

    fn dispatcher_session() -> (watch::Sender<SessionState>, watch::Receiver<SessionState>) {
        watch::channel(SessionState::Authenticated(Identity {
            personnel_id: Some(EntityId::from("u1")),
            discord_id: "1".into(),
            username: "Reyes".into(),
            avatar_url: None,
            role: Role::Dispatcher,
        }))
    }

    #[tokio::test(start_paused = true)]
    async fn permission_prompt_waits_for_dispatcher_sign_in() {
        let sink = Arc::new(RecordingSink::new(AlertPermission::Default));
        let (session_tx, session_rx) = watch::channel(SessionState::Anonymous);
        let (_requests_tx, requests_rx) =
            watch::channel(Arc::new(Vec::<Arc<ServiceRequest>>::new()));
        let cancel = CancellationToken::new();

        let task = tokio::spawn(bridge_task(
            EntityStream::new(requests_rx),
            session_rx,
            sink.clone(),
            cancel.clone(),
        ));

        // Anonymous well past the delay: no prompt yet.
        tokio::time::sleep(PERMISSION_REQUEST_DELAY * 3).await;
        assert_eq!(sink.permission(), AlertPermission::Default);

        session_tx
            .send(SessionState::Authenticated(Identity {
                personnel_id: Some(EntityId::from("u1")),
                discord_id: "1".into(),
                username: "Reyes".into(),
                avatar_url: None,
                role: Role::Dispatcher,
            }))
            .unwrap();

        // The delay starts counting from the sign-in, not from startup.
        tokio::time::sleep(PERMISSION_REQUEST_DELAY * 2).await;
        assert_eq!(sink.permission(), AlertPermission::Granted);

        cancel.cancel();
        task.await.unwrap();
    }

    #[test]
    fn alert_body_matches_board_format() {
        let r = request("r9", RequestStatus::Pending, Priority::Critical);
        let alert = Alert::for_request(&r);
        assert_eq!(alert.title, "New Service Request");
        assert_eq!(alert.body, "SAR - critical priority\nDaymar");
        assert_eq!(alert.tag, "request-r9");
        assert!(alert.require_interaction);
    }

    #[test]
    fn non_critical_alert_does_not_require_interaction() {
        let r = request("r1", RequestStatus::Pending, Priority::Medium);
        assert!(!Alert::for_request(&r).require_interaction);
    }

    #[test]
    fn baseline_snapshot_never_alerts() {
        let sink = RecordingSink::new(AlertPermission::Granted);
        let (_tx, session) = dispatcher_session();
        let mut baseline = None;

        let snapshot = vec![request("r1", RequestStatus::Pending, Priority::High)];
        process_snapshot(&snapshot, &mut baseline, &session, &sink);

        assert!(sink.alerts.lock().unwrap().is_empty());
        assert!(sink.toasts.lock().unwrap().is_empty());
    }

    #[test]
    fn new_pending_request_alerts_after_baseline() {
        let sink = RecordingSink::new(AlertPermission::Granted);
        let (_tx, session) = dispatcher_session();
        let mut baseline = None;

        process_snapshot(
            &[request("r1", RequestStatus::Pending, Priority::High)],
            &mut baseline,
            &session,
            &sink,
        );
        process_snapshot(
            &[
                request("r1", RequestStatus::Pending, Priority::High),
                request("r2", RequestStatus::Pending, Priority::Low),
            ],
            &mut baseline,
            &session,
            &sink,
        );

        let alerts = sink.alerts.lock().unwrap();
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].tag, "request-r2");
        assert_eq!(
            sink.toasts.lock().unwrap().as_slice(),
            ["1 new pending request"]
        );
    }

    #[test]
    fn simultaneous_completion_and_submission_still_alerts() {
        let sink = RecordingSink::new(AlertPermission::Granted);
        let (_tx, session) = dispatcher_session();
        let mut baseline = None;

        // Two pending, then one completes while a new one arrives:
        // the pending count stays at two, but r3 is genuinely new.
        process_snapshot(
            &[
                request("r1", RequestStatus::Pending, Priority::High),
                request("r2", RequestStatus::Pending, Priority::Low),
            ],
            &mut baseline,
            &session,
            &sink,
        );
        process_snapshot(
            &[
                request("r1", RequestStatus::Completed, Priority::High),
                request("r2", RequestStatus::Pending, Priority::Low),
                request("r3", RequestStatus::Pending, Priority::Critical),
            ],
            &mut baseline,
            &session,
            &sink,
        );

        let alerts = sink.alerts.lock().unwrap();
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].tag, "request-r3");
    }

    #[test]
    fn denied_permission_still_toasts_but_never_alerts() {
        let sink = RecordingSink::new(AlertPermission::Denied);
        let (_tx, session) = dispatcher_session();
        let mut baseline = None;

        process_snapshot(&[], &mut baseline, &session, &sink);
        process_snapshot(
            &[request("r1", RequestStatus::Pending, Priority::High)],
            &mut baseline,
            &session,
            &sink,
        );

        assert!(sink.alerts.lock().unwrap().is_empty());
        assert_eq!(sink.toasts.lock().unwrap().len(), 1);
    }

    #[test]
    fn non_dispatcher_gets_no_alerts() {
        let sink = RecordingSink::new(AlertPermission::Granted);
        let (_tx, session) = watch::channel(SessionState::Anonymous);
        let mut baseline = None;

        process_snapshot(&[], &mut baseline, &session, &sink);
        process_snapshot(
            &[request("r1", RequestStatus::Pending, Priority::High)],
            &mut baseline,
            &session,
            &sink,
        );

        assert!(sink.alerts.lock().unwrap().is_empty());
        assert!(sink.toasts.lock().unwrap().is_empty());
    }
}
