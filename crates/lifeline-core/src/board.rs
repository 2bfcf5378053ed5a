// ── Dispatch board abstraction ──
//
// Full lifecycle management for a dispatch-board connection: sign-in,
// background refresh, change-feed consumption, presence heartbeats,
// command routing, and reactive data streaming through the BoardStore.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Mutex, mpsc, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use url::Url;

use lifeline_api::rows::{
    ActivityInsert, ActivityRow, CrewInsert, CrewRow, PersonnelInsert, PersonnelRow, RequestInsert,
    RequestRow,
};
use lifeline_api::{
    AuthAttempt, ChangeEvent, OAuthClient, ReconnectConfig, Select, StoreAdapter, Table,
    TransportConfig,
};

use crate::command::{Command, CommandEnvelope, CommandResult, CreateCrewInput, CreateRequestInput, CrewPatch};
use crate::config::BoardConfig;
use crate::error::CoreError;
use crate::model::{
    ActivityKind, Crew, CrewStatus, EntityId, Personnel, RequestStatus, Role, ServiceRequest,
};
use crate::notify::{AlertSink, bridge_task};
use crate::presence::presence_task;
use crate::session::{Identity, SessionState};
use crate::store::BoardStore;
use crate::stream::EntityStream;

const COMMAND_CHANNEL_SIZE: usize = 64;

// ── ConnectionState ──────────────────────────────────────────────

/// Connection state observable by consumers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
    Failed,
}

// ── DispatchBoard ────────────────────────────────────────────────

/// The main entry point for consumers.
///
/// Cheaply cloneable via `Arc<BoardInner>`. Manages the full
/// connection lifecycle: sign-in, background data refresh, change-feed
/// consumption, presence, command routing, and reactive entity
/// streaming.
#[derive(Clone)]
pub struct DispatchBoard {
    inner: Arc<BoardInner>,
}

struct BoardInner {
    config: BoardConfig,
    adapter: StoreAdapter,
    store: Arc<BoardStore>,
    connection_state: watch::Sender<ConnectionState>,
    session: watch::Sender<SessionState>,
    foreground: watch::Sender<bool>,
    command_tx: mpsc::Sender<CommandEnvelope>,
    command_rx: Mutex<Option<mpsc::Receiver<CommandEnvelope>>>,
    cancel: CancellationToken,
    task_handles: Mutex<Vec<JoinHandle<()>>>,
}

impl DispatchBoard {
    /// Create a board backed by the configured REST backend. Does NOT
    /// connect -- call [`connect()`](Self::connect) to fetch data and
    /// start background tasks.
    pub fn new(config: BoardConfig) -> Result<Self, CoreError> {
        let transport = TransportConfig {
            timeout: config.timeout,
            api_key: Some(config.api_key.clone()),
        };

        let feed_url = if config.feed_enabled {
            Some(config.feed_url().map_err(|e| CoreError::Config {
                message: format!("cannot derive feed URL: {e}"),
            })?)
        } else {
            None
        };

        let adapter = StoreAdapter::rest(config.backend_url.clone(), &transport, feed_url)?;
        Ok(Self::with_adapter(config, adapter))
    }

    /// Create a board over an explicit adapter. Demo mode and tests
    /// hand in a memory-backed adapter here.
    pub fn with_adapter(config: BoardConfig, adapter: StoreAdapter) -> Self {
        let store = Arc::new(BoardStore::new());
        let (connection_state, _) = watch::channel(ConnectionState::Disconnected);
        let (session, _) = watch::channel(SessionState::default());
        let (foreground, _) = watch::channel(true);
        let (command_tx, command_rx) = mpsc::channel(COMMAND_CHANNEL_SIZE);
        let cancel = CancellationToken::new();

        Self {
            inner: Arc::new(BoardInner {
                config,
                adapter,
                store,
                connection_state,
                session,
                foreground,
                command_tx,
                command_rx: Mutex::new(Some(command_rx)),
                cancel,
                task_handles: Mutex::new(Vec::new()),
            }),
        }
    }

    /// Access the board configuration.
    pub fn config(&self) -> &BoardConfig {
        &self.inner.config
    }

    /// Access the underlying BoardStore.
    pub fn store(&self) -> &Arc<BoardStore> {
        &self.inner.store
    }

    // ── Connection lifecycle ─────────────────────────────────────

    /// Connect to the backend.
    ///
    /// Performs an initial data refresh and spawns background tasks
    /// (command processor, periodic refresh, change-feed consumer,
    /// presence heartbeat).
    pub async fn connect(&self) -> Result<(), CoreError> {
        let _ = self
            .inner
            .connection_state
            .send_replace(ConnectionState::Connecting);

        debug!(backend = self.inner.adapter.backend_name(), "connecting");

        // Initial data load
        if let Err(e) = self.full_refresh().await {
            let _ = self.inner.connection_state.send_replace(ConnectionState::Failed);
            return Err(e);
        }

        // Spawn background tasks
        let mut handles = self.inner.task_handles.lock().await;

        if let Some(rx) = self.inner.command_rx.lock().await.take() {
            let board = self.clone();
            handles.push(tokio::spawn(command_processor_task(board, rx)));
        }

        let interval_secs = self.inner.config.refresh_interval_secs;
        if interval_secs > 0 {
            let board = self.clone();
            let cancel = self.inner.cancel.clone();
            handles.push(tokio::spawn(refresh_task(board, interval_secs, cancel)));
        }

        if self.inner.config.feed_enabled {
            match self
                .inner
                .adapter
                .open_feed(ReconnectConfig::default(), self.inner.cancel.clone())
            {
                Ok(Some(rx)) => {
                    let board = self.clone();
                    let cancel = self.inner.cancel.clone();
                    handles.push(tokio::spawn(feed_consumer_task(board, rx, cancel)));
                }
                Ok(None) => debug!("no feed endpoint configured, relying on periodic refresh"),
                Err(e) => warn!(error = %e, "change feed unavailable, relying on periodic refresh"),
            }
        }

        handles.push(tokio::spawn(presence_task(
            self.inner.adapter.clone(),
            self.inner.session.subscribe(),
            self.inner.foreground.subscribe(),
            self.inner.cancel.clone(),
        )));

        drop(handles);

        let _ = self.inner.connection_state.send_replace(ConnectionState::Connected);
        info!("connected to dispatch board");
        Ok(())
    }

    /// Disconnect from the backend.
    ///
    /// Signs out if a session is live, cancels background tasks, and
    /// resets the connection state to
    /// [`Disconnected`](ConnectionState::Disconnected).
    pub async fn disconnect(&self) {
        if self.inner.session.borrow().identity().is_some() {
            self.logout();
        }

        self.inner.cancel.cancel();

        // Join all background tasks
        let mut handles = self.inner.task_handles.lock().await;
        for handle in handles.drain(..) {
            let _ = handle.await;
        }

        let _ = self
            .inner
            .connection_state
            .send_replace(ConnectionState::Disconnected);
        debug!("disconnected");
    }

    /// Fetch all four tables and replace the store's contents.
    pub async fn full_refresh(&self) -> Result<(), CoreError> {
        let adapter = &self.inner.adapter;

        // Fetch in parallel
        let requests_select = Select::new().order_desc("created_at");
        let crews_select = Select::new();
        let personnel_select = Select::new();
        let activity_select = Select::new().order_desc("created_at").limit(100);
        let (requests_res, crews_res, personnel_res, activity_res) = tokio::join!(
            adapter.select::<RequestRow>(Table::Requests, &requests_select),
            adapter.select::<CrewRow>(Table::Crews, &crews_select),
            adapter.select::<PersonnelRow>(Table::Personnel, &personnel_select),
            adapter.select::<ActivityRow>(Table::Activity, &activity_select),
        );

        let store = &self.inner.store;
        store.apply_requests(requests_res?);
        store.apply_crews(crews_res?);
        store.apply_personnel(personnel_res?);
        store.apply_activity(activity_res?);
        store.mark_refreshed();

        debug!(
            requests = store.request_count(),
            crews = store.crew_count(),
            personnel = store.personnel_count(),
            "data refresh complete"
        );

        Ok(())
    }

    /// Re-fetch a single table. Used by the change-feed consumer and
    /// after mutations.
    pub async fn refresh_table(&self, table: Table) -> Result<(), CoreError> {
        let adapter = &self.inner.adapter;
        let store = &self.inner.store;

        match table {
            Table::Requests => {
                let rows = adapter
                    .select::<RequestRow>(table, &Select::new().order_desc("created_at"))
                    .await?;
                store.apply_requests(rows);
            }
            Table::Crews => {
                let rows = adapter.select::<CrewRow>(table, &Select::new()).await?;
                store.apply_crews(rows);
            }
            Table::Personnel => {
                let rows = adapter.select::<PersonnelRow>(table, &Select::new()).await?;
                store.apply_personnel(rows);
            }
            Table::Activity => {
                let rows = adapter
                    .select::<ActivityRow>(table, &Select::new().order_desc("created_at").limit(100))
                    .await?;
                store.apply_activity(rows);
            }
        }
        Ok(())
    }

    // ── Session lifecycle ────────────────────────────────────────

    /// Start an interactive OAuth sign-in. Returns the authorize URL
    /// the operator must visit and the attempt the callback is checked
    /// against.
    pub fn begin_login(&self) -> Result<(Url, AuthAttempt), CoreError> {
        let oauth = self.oauth_client()?;
        let _ = self.inner.session.send_replace(SessionState::Authenticating);
        Ok(oauth.begin())
    }

    /// Complete an interactive OAuth sign-in with the provider callback.
    pub async fn complete_login(
        &self,
        attempt: &AuthAttempt,
        callback: &Url,
    ) -> Result<Identity, CoreError> {
        let result = self.run_oauth_callback(attempt, callback).await;
        match result {
            Ok(mut identity) => {
                self.sync_roster(&mut identity).await;
                let _ = self
                    .inner
                    .session
                    .send_replace(SessionState::Authenticated(identity.clone()));
                info!(username = %identity.username, "signed in");
                Ok(identity)
            }
            Err(e) => {
                let _ = self.inner.session.send_replace(SessionState::AnonymousWithError {
                    message: e.to_string(),
                });
                Err(e)
            }
        }
    }

    /// Restore a session from the locally configured operator identity,
    /// resolving their role against the personnel roster.
    pub fn sign_in(&self) -> Result<Identity, CoreError> {
        let operator = self
            .inner
            .config
            .operator
            .as_ref()
            .ok_or_else(|| CoreError::Config {
                message: "no operator identity configured".into(),
            })?;

        let identity = self.resolve_identity(
            &operator.discord_id,
            &operator.name,
            operator.avatar_url.clone(),
        );
        let _ = self
            .inner
            .session
            .send_replace(SessionState::Authenticated(identity.clone()));
        debug!(username = %identity.username, role = %identity.role, "session restored");
        Ok(identity)
    }

    /// Sign out. Background effects observe `LoggingOut` before the
    /// session settles to `Anonymous`, so no heartbeat can sneak in.
    pub fn logout(&self) {
        let _ = self.inner.session.send_replace(SessionState::LoggingOut);
        let _ = self.inner.session.send_replace(SessionState::Anonymous);
        info!("signed out");
    }

    async fn run_oauth_callback(
        &self,
        attempt: &AuthAttempt,
        callback: &Url,
    ) -> Result<Identity, CoreError> {
        let oauth = self.oauth_client()?;
        let settings = self
            .inner
            .config
            .oauth
            .as_ref()
            .ok_or_else(|| CoreError::Config {
                message: "OAuth is not configured for this profile".into(),
            })?;

        let code = oauth.parse_callback(attempt, callback)?;
        let token = oauth.exchange(&code, &settings.client_secret).await?;
        let remote = oauth.identity(&token).await?;

        Ok(self.resolve_identity(&remote.id, &remote.username, remote.avatar))
    }

    fn oauth_client(&self) -> Result<OAuthClient, CoreError> {
        let settings = self
            .inner
            .config
            .oauth
            .as_ref()
            .ok_or_else(|| CoreError::Config {
                message: "OAuth is not configured for this profile".into(),
            })?;
        let transport = TransportConfig {
            timeout: self.inner.config.timeout,
            api_key: None,
        };
        Ok(OAuthClient::new(settings.provider.clone(), &transport)?)
    }

    /// Match a Discord account against the roster. Unknown accounts get
    /// the least-privileged role; privilege comes from the roster, never
    /// from the sign-in itself.
    fn resolve_identity(
        &self,
        discord_id: &str,
        username: &str,
        avatar_url: Option<String>,
    ) -> Identity {
        let roster: Option<Arc<Personnel>> =
            self.inner.store.personnel_by_discord_id(discord_id);

        match roster {
            Some(person) => Identity {
                personnel_id: Some(person.id.clone()),
                discord_id: discord_id.to_owned(),
                username: person.username.clone(),
                avatar_url: person.avatar_url.clone().or(avatar_url),
                role: person.role,
            },
            None => Identity {
                personnel_id: None,
                discord_id: discord_id.to_owned(),
                username: username.to_owned(),
                avatar_url,
                role: Role::Crew,
            },
        }
    }

    /// Upsert the roster row for a freshly authenticated account. New
    /// accounts land with the least-privileged role; existing rows get
    /// their username and avatar refreshed and are flipped online.
    /// Failure is logged, not fatal: sign-in still completes.
    async fn sync_roster(&self, identity: &mut Identity) {
        let adapter = &self.inner.adapter;

        let result = match identity.personnel_id.as_ref() {
            Some(id) => adapter
                .update(
                    Table::Personnel,
                    &id.to_string(),
                    &serde_json::json!({
                        "username": identity.username,
                        "avatar_url": identity.avatar_url,
                        "online": true,
                        "last_seen": chrono::Utc::now().to_rfc3339(),
                    }),
                )
                .await
                .map(|()| None),
            None => adapter
                .insert::<PersonnelRow>(
                    Table::Personnel,
                    &PersonnelInsert {
                        discord_id: identity.discord_id.clone(),
                        username: identity.username.clone(),
                        avatar_url: identity.avatar_url.clone(),
                        role: identity.role.to_string(),
                        online: true,
                    },
                )
                .await
                .map(|row| Some(EntityId::from(row.id))),
        };

        match result {
            Ok(Some(id)) => identity.personnel_id = Some(id),
            Ok(None) => {}
            Err(e) => warn!(error = %e, "roster sync failed"),
        }

        let _ = self.refresh_table(Table::Personnel).await;
    }

    // ── Command execution ────────────────────────────────────────

    /// Execute a command against the board.
    ///
    /// Sends the command through the internal channel to the command
    /// processor task and awaits the result.
    pub async fn execute(&self, cmd: Command) -> Result<CommandResult, CoreError> {
        if *self.inner.connection_state.borrow() != ConnectionState::Connected {
            return Err(CoreError::BoardDisconnected);
        }

        let (tx, rx) = tokio::sync::oneshot::channel();

        self.inner
            .command_tx
            .send(CommandEnvelope {
                command: cmd,
                response_tx: tx,
            })
            .await
            .map_err(|_| CoreError::BoardDisconnected)?;

        rx.await.map_err(|_| CoreError::BoardDisconnected)?
    }

    // ── One-shot convenience ─────────────────────────────────────

    /// One-shot: connect, run closure, disconnect.
    ///
    /// Optimized for CLI: disables the feed and periodic refresh since
    /// we only need a single request-response cycle.
    pub async fn oneshot<F, Fut, T>(
        config: BoardConfig,
        adapter: Option<StoreAdapter>,
        f: F,
    ) -> Result<T, CoreError>
    where
        F: FnOnce(DispatchBoard) -> Fut,
        Fut: std::future::Future<Output = Result<T, CoreError>>,
    {
        let mut cfg = config;
        cfg.feed_enabled = false;
        cfg.refresh_interval_secs = 0;

        let board = match adapter {
            Some(adapter) => DispatchBoard::with_adapter(cfg, adapter),
            None => DispatchBoard::new(cfg)?,
        };
        board.connect().await?;
        if board.inner.config.operator.is_some() {
            board.sign_in()?;
        }
        let result = f(board.clone()).await;
        board.disconnect().await;
        result
    }

    // ── State observation ────────────────────────────────────────

    /// Subscribe to connection state changes.
    pub fn connection_state(&self) -> watch::Receiver<ConnectionState> {
        self.inner.connection_state.subscribe()
    }

    /// Subscribe to session state changes.
    pub fn session_state(&self) -> watch::Receiver<SessionState> {
        self.inner.session.subscribe()
    }

    /// The current identity, if signed in.
    pub fn identity(&self) -> Option<Identity> {
        self.inner.session.borrow().identity().cloned()
    }

    /// Report whether the app is foregrounded. Presence heartbeats
    /// pause while backgrounded.
    pub fn set_foreground(&self, foreground: bool) {
        let _ = self.inner.foreground.send_replace(foreground);
    }

    /// Attach an alert sink and start the new-request notification
    /// bridge feeding it.
    pub async fn attach_alert_sink(&self, sink: Arc<dyn AlertSink>) {
        let handle = tokio::spawn(bridge_task(
            self.inner.store.subscribe_requests(),
            self.inner.session.subscribe(),
            sink,
            self.inner.cancel.clone(),
        ));
        self.inner.task_handles.lock().await.push(handle);
    }

    // ── Stream accessors (delegate to BoardStore) ────────────────

    pub fn requests(&self) -> EntityStream<ServiceRequest> {
        self.inner.store.subscribe_requests()
    }

    pub fn crews(&self) -> EntityStream<Crew> {
        self.inner.store.subscribe_crews()
    }

    pub fn personnel(&self) -> EntityStream<Personnel> {
        self.inner.store.subscribe_personnel()
    }

    pub fn activity(&self) -> EntityStream<crate::model::ActivityEntry> {
        self.inner.store.subscribe_activity()
    }

    // ── Internal helpers ─────────────────────────────────────────

    fn require_dispatcher(&self, action: &str) -> Result<Identity, CoreError> {
        let state = self.inner.session.borrow();
        match state.identity() {
            Some(identity) if identity.is_dispatcher() => Ok(identity.clone()),
            _ => Err(CoreError::Forbidden {
                action: action.to_owned(),
            }),
        }
    }

    fn actor_name(&self) -> String {
        self.inner
            .session
            .borrow()
            .identity()
            .map_or_else(|| "anonymous".to_owned(), |i| i.username.clone())
    }

    /// Append to the audit trail. Failure is logged, never fatal: the
    /// primary mutation has already been accepted.
    async fn record_activity(
        &self,
        kind: ActivityKind,
        message: String,
        request: Option<&EntityId>,
    ) {
        let insert = ActivityInsert {
            kind: kind.to_string(),
            message,
            actor_name: self.actor_name(),
            request_id: request.map(ToString::to_string),
        };
        if let Err(e) = self
            .inner
            .adapter
            .insert::<ActivityRow>(Table::Activity, &insert)
            .await
        {
            warn!(error = %e, "failed to append activity entry");
        }
    }
}

// ── Background tasks ─────────────────────────────────────────────

/// Periodically refresh data from the backend.
async fn refresh_task(board: DispatchBoard, interval_secs: u64, cancel: CancellationToken) {
    let mut interval = tokio::time::interval(Duration::from_secs(interval_secs));
    interval.tick().await; // consume the immediate first tick

    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            _ = interval.tick() => {
                if let Err(e) = board.full_refresh().await {
                    warn!(error = %e, "periodic refresh failed");
                }
            }
        }
    }
}

/// React to change-feed events by re-fetching the affected table.
async fn feed_consumer_task(
    board: DispatchBoard,
    mut rx: tokio::sync::broadcast::Receiver<ChangeEvent>,
    cancel: CancellationToken,
) {
    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            event = rx.recv() => {
                match event {
                    Ok(event) => {
                        board.inner.store.mark_feed_event();
                        debug!(table = %event.table, action = ?event.action, "change feed event");
                        if let Err(e) = board.refresh_table(event.table).await {
                            warn!(error = %e, table = %event.table, "feed-driven refresh failed");
                        }
                    }
                    Err(tokio::sync::broadcast::error::RecvError::Lagged(skipped)) => {
                        // Fall back to a full refresh; we do not know
                        // which tables the skipped events touched.
                        warn!(skipped, "change feed lagged, running full refresh");
                        if let Err(e) = board.full_refresh().await {
                            warn!(error = %e, "catch-up refresh failed");
                        }
                    }
                    Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
                }
            }
        }
    }
}

/// Process commands from the mpsc channel.
async fn command_processor_task(board: DispatchBoard, mut rx: mpsc::Receiver<CommandEnvelope>) {
    let cancel = board.inner.cancel.clone();

    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            envelope = rx.recv() => {
                let Some(envelope) = envelope else { break };
                let result = route_command(&board, envelope.command).await;
                let _ = envelope.response_tx.send(result);
            }
        }
    }
}

// ── Command routing ──────────────────────────────────────────────

async fn route_command(board: &DispatchBoard, cmd: Command) -> Result<CommandResult, CoreError> {
    match cmd {
        Command::CreateRequest(input) => create_request(board, input).await,
        Command::AssignCrew { request, crew } => assign_crew(board, &request, &crew).await,
        Command::UpdateRequestStatus { request, status } => {
            update_request_status(board, &request, status).await
        }
        Command::CreateCrew(input) => create_crew(board, input).await,
        Command::UpdateCrew { crew, patch } => update_crew(board, &crew, patch).await,
    }
}

async fn create_request(
    board: &DispatchBoard,
    input: CreateRequestInput,
) -> Result<CommandResult, CoreError> {
    input.validate()?;

    let identity = board.identity();
    let requester_name = input
        .requester
        .clone()
        .or_else(|| identity.as_ref().map(|i| i.username.clone()))
        .unwrap_or_else(|| "anonymous".to_owned());
    let insert = RequestInsert {
        service: input.service.to_string(),
        priority: input.priority.to_string(),
        location: input.location.clone(),
        description: Some(input.description.clone()),
        status: RequestStatus::Pending.to_string(),
        requester_id: identity
            .as_ref()
            .and_then(|i| i.personnel_id.as_ref())
            .map(ToString::to_string),
        requester_name,
        discord_username: input.discord_username.clone(),
    };

    let row: RequestRow = board
        .inner
        .adapter
        .insert(Table::Requests, &insert)
        .await?;
    let request = ServiceRequest::try_from(row)?;

    board
        .record_activity(
            ActivityKind::RequestCreated,
            format!(
                "{} request at {} ({} priority)",
                request.service.label(),
                request.location,
                request.priority
            ),
            Some(&request.id),
        )
        .await;

    let _ = board.refresh_table(Table::Requests).await;
    let _ = board.refresh_table(Table::Activity).await;

    Ok(CommandResult::Request(request))
}

async fn assign_crew(
    board: &DispatchBoard,
    request_id: &EntityId,
    crew_id: &EntityId,
) -> Result<CommandResult, CoreError> {
    let dispatcher = board.require_dispatcher("assign crew")?;

    let store = &board.inner.store;
    let request = store
        .request_by_id(request_id)
        .ok_or_else(|| CoreError::RequestNotFound {
            identifier: request_id.to_string(),
        })?;
    let crew = store.crew_by_id(crew_id).ok_or_else(|| CoreError::CrewNotFound {
        identifier: crew_id.to_string(),
    })?;

    if request.status != RequestStatus::Pending {
        return Err(CoreError::ValidationFailed {
            message: format!(
                "request {request_id} is {}, only pending requests can be assigned",
                request.status
            ),
        });
    }
    if crew.status != CrewStatus::Available {
        return Err(CoreError::ValidationFailed {
            message: format!("crew '{}' is {}", crew.name, crew.status),
        });
    }

    let adapter = &board.inner.adapter;

    // Two writes, not a transaction: the request row first, then the
    // crew row. If the second fails the request stays assigned and the
    // caller gets the error.
    adapter
        .update(
            Table::Requests,
            &request_id.to_string(),
            &serde_json::json!({
                "assigned_crew_id": crew_id.to_string(),
                "dispatcher_id": dispatcher.personnel_id.as_ref().map(ToString::to_string),
                "status": RequestStatus::Assigned.to_string(),
            }),
        )
        .await?;

    let crew_result = adapter
        .update(
            Table::Crews,
            &crew_id.to_string(),
            &serde_json::json!({ "status": CrewStatus::OnMission.to_string() }),
        )
        .await;

    if let Err(e) = crew_result {
        warn!(
            error = %e,
            request = %request_id,
            crew = %crew_id,
            "request assigned but crew status update failed"
        );
        let _ = board.refresh_table(Table::Requests).await;
        return Err(CoreError::OperationFailed {
            message: format!(
                "request assigned, but marking crew '{}' on-mission failed: {e}",
                crew.name
            ),
        });
    }

    board
        .record_activity(
            ActivityKind::CrewAssigned,
            format!(
                "{} assigned to {} at {}",
                crew.name,
                request.service.label(),
                request.location
            ),
            Some(request_id),
        )
        .await;

    let _ = board.refresh_table(Table::Requests).await;
    let _ = board.refresh_table(Table::Crews).await;
    let _ = board.refresh_table(Table::Activity).await;

    Ok(CommandResult::Ok)
}

/// Lifecycle transitions a dispatcher may apply directly.
/// Assignment happens through [`Command::AssignCrew`], never here.
fn transition_allowed(from: RequestStatus, to: RequestStatus) -> bool {
    match to {
        RequestStatus::InProgress => from == RequestStatus::Assigned,
        RequestStatus::Completed => from == RequestStatus::InProgress,
        RequestStatus::Cancelled => from.is_active(),
        RequestStatus::Pending | RequestStatus::Assigned => false,
    }
}

async fn update_request_status(
    board: &DispatchBoard,
    request_id: &EntityId,
    status: RequestStatus,
) -> Result<CommandResult, CoreError> {
    board.require_dispatcher("update request status")?;

    let request = board
        .inner
        .store
        .request_by_id(request_id)
        .ok_or_else(|| CoreError::RequestNotFound {
            identifier: request_id.to_string(),
        })?;

    if !transition_allowed(request.status, status) {
        return Err(CoreError::ValidationFailed {
            message: format!("cannot move request from {} to {status}", request.status),
        });
    }

    let mut patch = serde_json::json!({ "status": status.to_string() });
    if status == RequestStatus::Completed {
        patch["completed_at"] = serde_json::json!(chrono::Utc::now().to_rfc3339());
    }

    let adapter = &board.inner.adapter;
    adapter
        .update(Table::Requests, &request_id.to_string(), &patch)
        .await?;

    // Reaching a terminal state frees the crew. The request keeps its
    // crew reference for the record.
    let mut crew_release_error = None;
    if status.is_terminal() {
        if let Some(crew_id) = request.assigned_crew.as_ref() {
            let result = adapter
                .update(
                    Table::Crews,
                    &crew_id.to_string(),
                    &serde_json::json!({ "status": CrewStatus::Available.to_string() }),
                )
                .await;
            if let Err(e) = result {
                warn!(
                    error = %e,
                    request = %request_id,
                    crew = %crew_id,
                    "request closed but crew release failed"
                );
                crew_release_error = Some(e);
            }
        }
    }

    board
        .record_activity(
            ActivityKind::StatusChanged,
            format!(
                "{} at {} moved to {status}",
                request.service.label(),
                request.location
            ),
            Some(request_id),
        )
        .await;

    let _ = board.refresh_table(Table::Requests).await;
    let _ = board.refresh_table(Table::Crews).await;
    let _ = board.refresh_table(Table::Activity).await;

    if let Some(e) = crew_release_error {
        return Err(CoreError::OperationFailed {
            message: format!("request closed, but releasing its crew failed: {e}"),
        });
    }

    Ok(CommandResult::Ok)
}

async fn create_crew(
    board: &DispatchBoard,
    input: CreateCrewInput,
) -> Result<CommandResult, CoreError> {
    board.require_dispatcher("register crew")?;
    input.validate()?;

    let insert = CrewInsert {
        name: input.name.clone(),
        callsign: input.callsign.clone(),
        ship: input.ship.clone(),
        status: CrewStatus::Available.to_string(),
        capabilities: input.capabilities.iter().map(ToString::to_string).collect(),
        location: input.location.clone(),
        members: input.members.iter().map(ToString::to_string).collect(),
    };

    let row: CrewRow = board.inner.adapter.insert(Table::Crews, &insert).await?;
    let crew = Crew::try_from(row)?;

    board
        .record_activity(
            ActivityKind::CrewCreated,
            format!("crew '{}' registered", crew.name),
            None,
        )
        .await;

    let _ = board.refresh_table(Table::Crews).await;
    let _ = board.refresh_table(Table::Activity).await;

    Ok(CommandResult::Crew(crew))
}

async fn update_crew(
    board: &DispatchBoard,
    crew_id: &EntityId,
    patch: CrewPatch,
) -> Result<CommandResult, CoreError> {
    board.require_dispatcher("update crew")?;

    if patch.is_empty() {
        return Err(CoreError::ValidationFailed {
            message: "crew patch has no fields set".into(),
        });
    }

    let crew = board
        .inner
        .store
        .crew_by_id(crew_id)
        .ok_or_else(|| CoreError::CrewNotFound {
            identifier: crew_id.to_string(),
        })?;

    let mut row_patch = serde_json::Map::new();
    if let Some(ref name) = patch.name {
        row_patch.insert("name".into(), serde_json::json!(name));
    }
    if let Some(ref callsign) = patch.callsign {
        row_patch.insert("callsign".into(), serde_json::json!(callsign));
    }
    if let Some(ref ship) = patch.ship {
        row_patch.insert("ship".into(), serde_json::json!(ship));
    }
    if let Some(status) = patch.status {
        row_patch.insert("status".into(), serde_json::json!(status.to_string()));
    }
    if let Some(ref capabilities) = patch.capabilities {
        let caps: Vec<String> = capabilities.iter().map(ToString::to_string).collect();
        row_patch.insert("capabilities".into(), serde_json::json!(caps));
    }
    if let Some(ref location) = patch.location {
        row_patch.insert("location".into(), serde_json::json!(location));
    }
    if let Some(ref members) = patch.members {
        let ids: Vec<String> = members.iter().map(ToString::to_string).collect();
        row_patch.insert("members".into(), serde_json::json!(ids));
    }

    board
        .inner
        .adapter
        .update(
            Table::Crews,
            &crew_id.to_string(),
            &serde_json::Value::Object(row_patch),
        )
        .await?;

    board
        .record_activity(
            ActivityKind::CrewUpdated,
            format!("crew '{}' updated", crew.name),
            None,
        )
        .await;

    let _ = board.refresh_table(Table::Crews).await;
    let _ = board.refresh_table(Table::Activity).await;

    Ok(CommandResult::Ok)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn lifecycle_transitions() {
        use RequestStatus::{Assigned, Cancelled, Completed, InProgress, Pending};

        assert!(transition_allowed(Assigned, InProgress));
        assert!(transition_allowed(InProgress, Completed));
        assert!(transition_allowed(Pending, Cancelled));
        assert!(transition_allowed(Assigned, Cancelled));
        assert!(transition_allowed(InProgress, Cancelled));

        assert!(!transition_allowed(Pending, InProgress));
        assert!(!transition_allowed(Pending, Completed));
        assert!(!transition_allowed(Completed, Cancelled));
        assert!(!transition_allowed(Cancelled, Cancelled));
        assert!(!transition_allowed(Pending, Assigned));
    }
}
