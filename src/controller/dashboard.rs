//! Dashboard Controller
//!
//! Turns button presses into realtime commands and realtime events into the
//! dashboard view model. Start, stop and post-now are optimistic: the view
//! changes right away and the action waits for the server to acknowledge it.
//!
//! Post-now and the start/stop toggle are tracked separately. Every command
//! gets exactly one `status` reply, in request order, and that reply settles
//! a pending post. A start or stop is followed by `get_app_status` and is
//! settled only by the `app_status` that answers it: confirmed when the
//! server agrees, failed when it does not. Broadcast `status_update` and
//! unsolicited `status` messages only change the status line.
//!
//! A toggle that stays unsettled past the confirmation timeout is marked
//! failed and the auto-posting state reverts to the last state the server
//! reported. Time is passed in by the caller so the timeout is deterministic.

use chrono::{DateTime, Duration, Utc};
use std::collections::VecDeque;
use thiserror::Error;

use crate::format::format_datetime;
use crate::realtime::{Activity, AppStatus, ClientEvent, RealtimeChannel, ServerEvent, TransportEvent};

pub const STATUS_CONNECTING: &str = "Connecting...";
pub const STATUS_CONNECTED: &str = "Connected to server";
pub const STATUS_DISCONNECTED: &str = "Disconnected from server";
pub const STATUS_CONNECT_ERROR: &str = "Connection error occurred";
pub const STATUS_POSTING: &str = "Posting tweet...";
pub const STATUS_STARTING: &str = "Starting auto-posting...";
pub const STATUS_STOPPING: &str = "Stopping auto-posting...";
pub const STATUS_UNCONFIRMED: &str = "No response from server; restored last known state";
pub const STATUS_POST_UNCONFIRMED: &str = "No response from server to the post request";

/// Default confirmation timeout, in seconds
pub const DEFAULT_CONFIRM_TIMEOUT_SECS: i64 = 30;

const REASON_TIMEOUT: &str = "no confirmation from server";
const REASON_CONNECTION_LOST: &str = "connection lost before confirmation";

/// Dashboard settings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DashboardConfig {
    /// How long an optimistic action may wait for acknowledgment
    pub confirmation_timeout: Duration,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            confirmation_timeout: Duration::seconds(DEFAULT_CONFIRM_TIMEOUT_SECS),
        }
    }
}

/// Rejected auto-posting interval
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum IntervalError {
    #[error("Invalid interval. Please enter a positive integer.")]
    Empty,

    #[error("Invalid interval {0:?}. Please enter a positive integer.")]
    NotANumber(String),

    #[error("Invalid interval {0}. Please enter a positive integer.")]
    NotPositive(i64),
}

/// Parse the interval input box: a positive whole number of minutes
pub fn parse_interval(input: &str) -> Result<u32, IntervalError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(IntervalError::Empty);
    }

    let value: i64 = trimmed
        .parse()
        .map_err(|_| IntervalError::NotANumber(trimmed.to_string()))?;
    if value <= 0 {
        return Err(IntervalError::NotPositive(value));
    }
    u32::try_from(value).map_err(|_| IntervalError::NotANumber(trimmed.to_string()))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connected,
}

/// What the page shows, as a state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Disconnected,
    AutoPostOff,
    AutoPostOn,
}

/// Auto-posting state as displayed
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AutoPostState {
    pub active: bool,
    /// Minutes between runs, when known
    pub interval: Option<u32>,
    /// Raw next-run timestamp from the server
    pub next_post_time: Option<String>,
}

impl AutoPostState {
    fn from_snapshot(status: &AppStatus) -> Self {
        Self {
            active: status.auto_posting_active,
            interval: Some(status.auto_posting_interval),
            next_post_time: status.next_post_time.clone(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionKind {
    PostNow,
    Start { interval: u32 },
    Stop,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionState {
    Pending,
    Confirmed,
    Failed(String),
}

/// Optimistic action and its fate
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackedAction {
    pub kind: ActionKind,
    pub state: ActionState,
    pub issued_at: DateTime<Utc>,
}

/// Render-ready dashboard
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DashboardView {
    pub connection: ConnectionState,
    pub status_line: String,
    pub auto_post_line: String,
    pub start_enabled: bool,
    pub stop_enabled: bool,
    /// One line per activity, server order
    pub activities: Vec<String>,
    pub dark_mode: bool,
    pub last_action: Option<TrackedAction>,
}

#[derive(Debug, Clone)]
struct Slot {
    action: TrackedAction,
    /// Issue order across both slots
    seq: u64,
    /// Snapshot request whose answer settles a start or stop
    settled_by: u64,
}

impl Slot {
    fn is_pending(&self) -> bool {
        self.action.state == ActionState::Pending
    }

    fn fail(&mut self, reason: &str) {
        self.action.state = ActionState::Failed(reason.to_string());
    }
}

pub struct Dashboard<C> {
    channel: C,
    config: DashboardConfig,
    loaded: bool,
    connection: ConnectionState,
    status: String,
    auto_post: AutoPostState,
    /// Last state reported by the server
    confirmed: AutoPostState,
    activities: Vec<Activity>,
    dark_mode: bool,
    post: Option<Slot>,
    toggle: Option<Slot>,
    issued: u64,
    /// Commands still owed a `status` reply, oldest first
    replies: VecDeque<u64>,
    snapshots_requested: u64,
    snapshots_received: u64,
}

impl<C: RealtimeChannel> Dashboard<C> {
    pub fn new(channel: C, config: DashboardConfig) -> Self {
        Self {
            channel,
            config,
            loaded: false,
            connection: ConnectionState::Disconnected,
            status: STATUS_CONNECTING.to_string(),
            auto_post: AutoPostState::default(),
            confirmed: AutoPostState::default(),
            activities: Vec::new(),
            dark_mode: false,
            post: None,
            toggle: None,
            issued: 0,
            replies: VecDeque::new(),
            snapshots_requested: 0,
            snapshots_received: 0,
        }
    }

    /// Mark the page loaded. The snapshot is requested now when connected,
    /// otherwise as soon as the channel connects. Only the first call counts.
    pub fn on_load(&mut self) {
        if self.loaded {
            return;
        }
        self.loaded = true;
        if self.connection == ConnectionState::Connected {
            self.request_snapshot();
        }
    }

    pub fn post_now(&mut self, now: DateTime<Utc>) {
        tracing::info!("Requesting immediate post");
        if self.send(ClientEvent::PostTweet) {
            self.status = STATUS_POSTING.to_string();
            let slot = self.issue(ActionKind::PostNow, now, 0);
            self.post = Some(slot);
        }
    }

    /// Validate `input` and start the scheduler. Invalid input sets the
    /// status line and emits nothing.
    pub fn start_auto_posting(
        &mut self,
        input: &str,
        now: DateTime<Utc>,
    ) -> Result<(), IntervalError> {
        let interval = match parse_interval(input) {
            Ok(interval) => interval,
            Err(e) => {
                tracing::warn!(input, "Rejected auto-posting interval");
                self.status = e.to_string();
                return Err(e);
            }
        };

        tracing::info!(interval, "Starting auto-posting");
        if self.send(ClientEvent::StartAutoPosting { interval }) {
            self.status = STATUS_STARTING.to_string();
            self.auto_post = AutoPostState {
                active: true,
                interval: Some(interval),
                next_post_time: None,
            };
            self.issue_toggle(ActionKind::Start { interval }, now);
        }
        Ok(())
    }

    pub fn stop_auto_posting(&mut self, now: DateTime<Utc>) {
        tracing::info!("Stopping auto-posting");
        if self.send(ClientEvent::StopAutoPosting) {
            self.status = STATUS_STOPPING.to_string();
            self.auto_post = AutoPostState {
                active: false,
                ..self.auto_post.clone()
            };
            self.issue_toggle(ActionKind::Stop, now);
        }
    }

    /// Apply one transport event
    pub fn handle(&mut self, event: TransportEvent) {
        match event {
            TransportEvent::Connected => {
                self.connection = ConnectionState::Connected;
                self.status = STATUS_CONNECTED.to_string();
                if self.loaded {
                    self.request_snapshot();
                }
            }
            TransportEvent::Disconnected { reason } => {
                tracing::info!(%reason, "Disconnected from server");
                self.connection = ConnectionState::Disconnected;
                self.status = STATUS_DISCONNECTED.to_string();
                self.abandon_pending();
            }
            TransportEvent::ConnectError { message } => {
                tracing::warn!(error = %message, "Connection error");
                self.status = STATUS_CONNECT_ERROR.to_string();
            }
            TransportEvent::Event(ServerEvent::Status { message }) => {
                self.status = message;
                self.settle_reply();
            }
            TransportEvent::Event(ServerEvent::StatusUpdate { status }) => {
                self.status = status;
            }
            TransportEvent::Event(ServerEvent::AppStatus(snapshot)) => {
                self.apply_snapshot(snapshot);
            }
        }
    }

    /// Fail pending actions older than the confirmation timeout. An expired
    /// start or stop reverts to the last reported state.
    /// Returns true when something changed.
    pub fn expire_pending(&mut self, now: DateTime<Utc>) -> bool {
        let timeout = self.config.confirmation_timeout;
        let overdue = |slot: &Option<Slot>| {
            slot.as_ref()
                .is_some_and(|s| s.is_pending() && now - s.action.issued_at >= timeout)
        };
        let mut changed = false;

        if overdue(&self.post) {
            if let Some(slot) = self.post.as_mut() {
                tracing::warn!("Post request not confirmed in time");
                slot.fail(REASON_TIMEOUT);
            }
            self.status = STATUS_POST_UNCONFIRMED.to_string();
            changed = true;
        }

        if overdue(&self.toggle) {
            if let Some(slot) = self.toggle.as_mut() {
                tracing::warn!(action = ?slot.action.kind, "Action not confirmed in time, reverting");
                slot.fail(REASON_TIMEOUT);
            }
            self.auto_post = self.confirmed.clone();
            self.status = STATUS_UNCONFIRMED.to_string();
            changed = true;
        }

        changed
    }

    pub fn toggle_theme(&mut self) {
        self.dark_mode = !self.dark_mode;
    }

    pub fn phase(&self) -> Phase {
        match (self.connection, self.auto_post.active) {
            (ConnectionState::Disconnected, _) => Phase::Disconnected,
            (ConnectionState::Connected, false) => Phase::AutoPostOff,
            (ConnectionState::Connected, true) => Phase::AutoPostOn,
        }
    }

    pub fn auto_post(&self) -> &AutoPostState {
        &self.auto_post
    }

    /// Most recently issued action of either kind
    pub fn last_action(&self) -> Option<&TrackedAction> {
        [self.post.as_ref(), self.toggle.as_ref()]
            .into_iter()
            .flatten()
            .max_by_key(|slot| slot.seq)
            .map(|slot| &slot.action)
    }

    pub fn post_action(&self) -> Option<&TrackedAction> {
        self.post.as_ref().map(|slot| &slot.action)
    }

    pub fn toggle_action(&self) -> Option<&TrackedAction> {
        self.toggle.as_ref().map(|slot| &slot.action)
    }

    pub fn dark_mode(&self) -> bool {
        self.dark_mode
    }

    pub fn view(&self) -> DashboardView {
        DashboardView {
            connection: self.connection,
            status_line: format!("Current status: {}", self.status),
            auto_post_line: auto_post_line(&self.auto_post),
            start_enabled: !self.auto_post.active,
            stop_enabled: self.auto_post.active,
            activities: self.activities.iter().map(activity_line).collect(),
            dark_mode: self.dark_mode,
            last_action: self.last_action().cloned(),
        }
    }

    fn send(&mut self, event: ClientEvent) -> bool {
        match self.channel.emit(event) {
            Ok(()) => true,
            Err(e) => {
                tracing::error!(error = %e, "Failed to emit realtime event");
                self.status = e.to_string();
                false
            }
        }
    }

    fn request_snapshot(&mut self) {
        if self.send(ClientEvent::GetAppStatus) {
            self.snapshots_requested += 1;
        }
    }

    fn issue(&mut self, kind: ActionKind, now: DateTime<Utc>, settled_by: u64) -> Slot {
        self.issued += 1;
        self.replies.push_back(self.issued);
        Slot {
            action: TrackedAction {
                kind,
                state: ActionState::Pending,
                issued_at: now,
            },
            seq: self.issued,
            settled_by,
        }
    }

    /// Track a start or stop and ask for the snapshot that settles it
    fn issue_toggle(&mut self, kind: ActionKind, now: DateTime<Utc>) {
        let settled_by = self.snapshots_requested + 1;
        let slot = self.issue(kind, now, settled_by);
        self.toggle = Some(slot);
        self.request_snapshot();
    }

    /// A `status` answers the oldest command still owed one
    fn settle_reply(&mut self) {
        let Some(seq) = self.replies.pop_front() else {
            return;
        };
        if let Some(slot) = self.post.as_mut() {
            if slot.seq == seq && slot.is_pending() {
                slot.action.state = ActionState::Confirmed;
            }
        }
    }

    /// Replies to an abandoned connection never arrive
    fn abandon_pending(&mut self) {
        if let Some(slot) = self.post.as_mut().filter(|s| s.is_pending()) {
            slot.fail(REASON_CONNECTION_LOST);
        }
        if let Some(slot) = self.toggle.as_mut().filter(|s| s.is_pending()) {
            slot.fail(REASON_CONNECTION_LOST);
            self.auto_post = self.confirmed.clone();
        }
        self.replies.clear();
        self.snapshots_received = self.snapshots_requested;
    }

    fn apply_snapshot(&mut self, snapshot: AppStatus) {
        let state = AutoPostState::from_snapshot(&snapshot);
        if self.snapshots_received < self.snapshots_requested {
            self.snapshots_received += 1;
        }

        let received = self.snapshots_received;
        if let Some(slot) = self.toggle.as_mut() {
            if slot.is_pending() && received >= slot.settled_by {
                let expected = matches!(slot.action.kind, ActionKind::Start { .. });
                if expected == state.active {
                    slot.action.state = ActionState::Confirmed;
                } else {
                    tracing::warn!(action = ?slot.action.kind, "Server state contradicts action");
                    slot.fail(&format!(
                        "server reports auto-posting {}",
                        if state.active { "running" } else { "stopped" }
                    ));
                }
            }
        }

        self.status = snapshot.current_status;
        self.confirmed = state.clone();
        self.activities = snapshot.recent_activities;
        // An answer to an earlier request must not undo a pending toggle
        if !self.toggle.as_ref().is_some_and(Slot::is_pending) {
            self.auto_post = state;
        }
    }
}

fn auto_post_line(state: &AutoPostState) -> String {
    if !state.active {
        return "Auto-posting is stopped".to_string();
    }
    let interval = state
        .interval
        .map(|i| i.to_string())
        .unwrap_or_else(|| "?".to_string());
    let next = match state.next_post_time.as_deref() {
        Some(raw) => format_datetime(Some(raw)),
        None => "calculating...".to_string(),
    };
    format!("Auto-posting (interval: {} min, next post: {})", interval, next)
}

fn activity_line(activity: &Activity) -> String {
    format!(
        "{} - {}: {} ({})",
        format_datetime(Some(&activity.timestamp)),
        activity.account,
        activity.action,
        activity.result
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::realtime::ChannelError;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[derive(Clone, Default)]
    struct Recorder {
        sent: Rc<RefCell<Vec<ClientEvent>>>,
        closed: Rc<RefCell<bool>>,
    }

    impl RealtimeChannel for Recorder {
        fn emit(&self, event: ClientEvent) -> Result<(), ChannelError> {
            if *self.closed.borrow() {
                return Err(ChannelError::Closed);
            }
            self.sent.borrow_mut().push(event);
            Ok(())
        }
    }

    fn dashboard() -> (Dashboard<Recorder>, Recorder) {
        let recorder = Recorder::default();
        let mut dash = Dashboard::new(recorder.clone(), DashboardConfig::default());
        dash.handle(TransportEvent::Connected);
        (dash, recorder)
    }

    fn t0() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2024-03-01T12:00:00Z")
            .unwrap()
            .with_timezone(&Utc)
    }

    fn snapshot(active: bool, interval: u32, next: Option<&str>) -> TransportEvent {
        TransportEvent::Event(ServerEvent::AppStatus(AppStatus {
            current_status: if active { "auto posting" } else { "idle" }.to_string(),
            auto_posting_active: active,
            auto_posting_interval: interval,
            next_post_time: next.map(str::to_string),
            recent_activities: vec![Activity {
                timestamp: "2024-03-01 11:45:00".to_string(),
                account: "alice".to_string(),
                action: "post".to_string(),
                result: "ok".to_string(),
            }],
        }))
    }

    fn status(message: &str) -> TransportEvent {
        TransportEvent::Event(ServerEvent::Status {
            message: message.to_string(),
        })
    }

    fn status_update(text: &str) -> TransportEvent {
        TransportEvent::Event(ServerEvent::StatusUpdate {
            status: text.to_string(),
        })
    }

    #[test]
    fn test_parse_interval() {
        assert_eq!(parse_interval("15"), Ok(15));
        assert_eq!(parse_interval(" 1 "), Ok(1));
        assert_eq!(parse_interval(""), Err(IntervalError::Empty));
        assert_eq!(parse_interval("0"), Err(IntervalError::NotPositive(0)));
        assert_eq!(parse_interval("-3"), Err(IntervalError::NotPositive(-3)));
        assert!(matches!(parse_interval("abc"), Err(IntervalError::NotANumber(_))));
        assert!(matches!(parse_interval("1.5"), Err(IntervalError::NotANumber(_))));
        assert!(matches!(parse_interval("99999999999"), Err(IntervalError::NotANumber(_))));
    }

    #[test]
    fn test_on_load_requests_status_once() {
        let recorder = Recorder::default();
        let mut dash = Dashboard::new(recorder.clone(), DashboardConfig::default());
        dash.on_load();
        dash.on_load();
        // Nothing goes out before the channel is up
        assert!(recorder.sent.borrow().is_empty());
        assert_eq!(dash.phase(), Phase::Disconnected);

        dash.handle(TransportEvent::Connected);
        dash.on_load();
        assert_eq!(*recorder.sent.borrow(), vec![ClientEvent::GetAppStatus]);
    }

    #[test]
    fn test_on_load_when_connected_requests_immediately() {
        let (mut dash, recorder) = dashboard();
        assert!(recorder.sent.borrow().is_empty());
        dash.on_load();
        assert_eq!(*recorder.sent.borrow(), vec![ClientEvent::GetAppStatus]);
    }

    #[test]
    fn test_reconnect_requests_fresh_snapshot() {
        let (mut dash, recorder) = dashboard();
        dash.on_load();
        dash.handle(TransportEvent::Disconnected {
            reason: "transport close".to_string(),
        });
        dash.handle(TransportEvent::Connected);
        assert_eq!(
            *recorder.sent.borrow(),
            vec![ClientEvent::GetAppStatus, ClientEvent::GetAppStatus]
        );
    }

    #[test]
    fn test_invalid_interval_emits_nothing() {
        let (mut dash, recorder) = dashboard();
        for input in ["", "0", "-5", "ten", "2.5"] {
            assert!(dash.start_auto_posting(input, t0()).is_err());
        }
        assert!(recorder.sent.borrow().is_empty());
        assert!(dash.view().status_line.contains("Invalid interval"));
        assert!(!dash.auto_post().active);
        assert!(dash.last_action().is_none());
    }

    #[test]
    fn test_valid_interval_emits_exact_value() {
        let (mut dash, recorder) = dashboard();
        dash.start_auto_posting("15", t0()).unwrap();

        assert_eq!(
            *recorder.sent.borrow(),
            vec![
                ClientEvent::StartAutoPosting { interval: 15 },
                ClientEvent::GetAppStatus,
            ]
        );
        let view = dash.view();
        assert!(!view.start_enabled);
        assert!(view.stop_enabled);
        assert_eq!(
            view.auto_post_line,
            "Auto-posting (interval: 15 min, next post: calculating...)"
        );
        assert_eq!(dash.phase(), Phase::AutoPostOn);
        assert_eq!(dash.last_action().unwrap().state, ActionState::Pending);
    }

    #[test]
    fn test_post_now_settled_by_direct_reply() {
        let (mut dash, recorder) = dashboard();
        dash.post_now(t0());
        assert_eq!(*recorder.sent.borrow(), vec![ClientEvent::PostTweet]);
        assert_eq!(dash.view().status_line, "Current status: Posting tweet...");

        dash.handle(status_update("processing"));
        assert_eq!(dash.view().status_line, "Current status: processing");
        assert_eq!(dash.post_action().unwrap().state, ActionState::Pending);

        dash.handle(status("Bulk tweet completed"));
        assert_eq!(dash.post_action().unwrap().state, ActionState::Confirmed);
    }

    #[test]
    fn test_greeting_does_not_settle_post() {
        let (mut dash, _) = dashboard();
        dash.handle(status("Connected to server"));
        dash.post_now(t0());
        assert_eq!(dash.post_action().unwrap().state, ActionState::Pending);
    }

    #[test]
    fn test_app_status_reflection() {
        let (mut dash, _) = dashboard();
        let next = "2024-03-01T12:15:00";
        dash.handle(snapshot(true, 15, Some(next)));

        let view = dash.view();
        assert_eq!(view.status_line, "Current status: auto posting");
        assert_eq!(
            view.auto_post_line,
            format!(
                "Auto-posting (interval: 15 min, next post: {})",
                format_datetime(Some(next))
            )
        );
        assert!(!view.start_enabled);
        assert!(view.stop_enabled);
        assert_eq!(
            view.activities,
            vec![format!(
                "{} - alice: post (ok)",
                format_datetime(Some("2024-03-01 11:45:00"))
            )]
        );

        dash.handle(snapshot(false, 0, None));
        let view = dash.view();
        assert_eq!(view.auto_post_line, "Auto-posting is stopped");
        assert!(view.start_enabled);
        assert!(!view.stop_enabled);
        assert_eq!(dash.phase(), Phase::AutoPostOff);
    }

    #[test]
    fn test_app_status_with_utc_next_post_time() {
        let (mut dash, _) = dashboard();
        let next = "2024-01-01T10:00:00Z";
        dash.handle(snapshot(true, 15, Some(next)));

        let view = dash.view();
        assert_eq!(
            view.auto_post_line,
            format!(
                "Auto-posting (interval: 15 min, next post: {})",
                format_datetime(Some(next))
            )
        );
        assert!(!view.auto_post_line.contains("N/A"));
        assert!(!view.start_enabled);
        assert!(view.stop_enabled);
        assert_eq!(dash.phase(), Phase::AutoPostOn);
    }

    #[test]
    fn test_connection_events_have_distinct_status() {
        let (mut dash, _) = dashboard();
        let connected = dash.view().status_line;

        dash.handle(TransportEvent::Disconnected {
            reason: "transport close".to_string(),
        });
        let disconnected = dash.view().status_line;
        assert_eq!(dash.phase(), Phase::Disconnected);

        dash.handle(TransportEvent::ConnectError {
            message: "refused".to_string(),
        });
        let error = dash.view().status_line;

        assert_ne!(connected, disconnected);
        assert_ne!(disconnected, error);
        assert_ne!(connected, error);
    }

    #[test]
    fn test_matching_snapshot_confirms_start() {
        let (mut dash, _) = dashboard();
        dash.start_auto_posting("10", t0()).unwrap();
        dash.handle(status("Auto-posting started. Interval: 10 min"));
        assert_eq!(dash.toggle_action().unwrap().state, ActionState::Pending);

        dash.handle(snapshot(true, 10, Some("2024-03-01T12:10:00")));
        assert_eq!(dash.toggle_action().unwrap().state, ActionState::Confirmed);
        // Confirmed state survives the timeout
        assert!(!dash.expire_pending(t0() + Duration::seconds(60)));
        assert!(dash.auto_post().active);
    }

    #[test]
    fn test_broadcasts_do_not_confirm_start() {
        let (mut dash, _) = dashboard();
        dash.start_auto_posting("10", t0()).unwrap();
        dash.handle(status_update("Tweet posted by another client"));
        assert_eq!(dash.toggle_action().unwrap().state, ActionState::Pending);
        assert_eq!(
            dash.view().status_line,
            "Current status: Tweet posted by another client"
        );

        dash.handle(status("Bulk tweet completed"));
        assert_eq!(dash.toggle_action().unwrap().state, ActionState::Pending);

        assert!(dash.expire_pending(t0() + Duration::seconds(30)));
        assert!(matches!(
            dash.toggle_action().unwrap().state,
            ActionState::Failed(_)
        ));
        assert!(!dash.auto_post().active);
    }

    #[test]
    fn test_post_expiry_keeps_confirmed_start() {
        let (mut dash, _) = dashboard();
        dash.start_auto_posting("10", t0()).unwrap();
        dash.post_now(t0() + Duration::seconds(1));
        dash.handle(snapshot(true, 10, Some("2024-03-01T12:10:00")));
        dash.handle(status("Auto-posting started. Interval: 10 min"));
        dash.handle(status("Bulk tweet completed"));
        assert_eq!(dash.toggle_action().unwrap().state, ActionState::Confirmed);
        assert_eq!(dash.post_action().unwrap().state, ActionState::Confirmed);

        dash.post_now(t0() + Duration::seconds(2));
        assert!(dash.expire_pending(t0() + Duration::seconds(120)));

        assert!(matches!(
            dash.post_action().unwrap().state,
            ActionState::Failed(_)
        ));
        assert_eq!(dash.toggle_action().unwrap().state, ActionState::Confirmed);
        assert!(dash.auto_post().active);
        assert_eq!(dash.phase(), Phase::AutoPostOn);
        assert!(dash.view().status_line.contains(STATUS_POST_UNCONFIRMED));
    }

    #[test]
    fn test_last_action_is_most_recent_of_either_kind() {
        let (mut dash, _) = dashboard();
        dash.start_auto_posting("10", t0()).unwrap();
        dash.post_now(t0());
        assert_eq!(dash.last_action().unwrap().kind, ActionKind::PostNow);

        dash.stop_auto_posting(t0());
        assert_eq!(dash.view().last_action.unwrap().kind, ActionKind::Stop);
    }

    #[test]
    fn test_unconfirmed_start_reverts_after_timeout() {
        let (mut dash, _) = dashboard();
        dash.handle(snapshot(false, 0, None));
        dash.start_auto_posting("10", t0()).unwrap();

        assert!(!dash.expire_pending(t0() + Duration::seconds(29)));
        assert!(dash.auto_post().active);

        assert!(dash.expire_pending(t0() + Duration::seconds(30)));
        assert!(!dash.auto_post().active);
        assert!(matches!(
            dash.last_action().unwrap().state,
            ActionState::Failed(_)
        ));
        assert!(dash.view().start_enabled);
        assert!(dash.view().status_line.contains(STATUS_UNCONFIRMED));
    }

    #[test]
    fn test_unconfirmed_stop_reverts_to_running() {
        let (mut dash, _) = dashboard();
        dash.handle(snapshot(true, 5, Some("2024-03-01T12:05:00")));
        dash.stop_auto_posting(t0());
        assert!(!dash.auto_post().active);

        assert!(dash.expire_pending(t0() + Duration::minutes(5)));
        assert!(dash.auto_post().active);
        assert_eq!(dash.auto_post().interval, Some(5));
    }

    #[test]
    fn test_contradicting_snapshot_fails_action() {
        let (mut dash, _) = dashboard();
        dash.start_auto_posting("10", t0()).unwrap();
        dash.handle(snapshot(false, 0, None));

        assert_eq!(
            dash.last_action().unwrap().state,
            ActionState::Failed("server reports auto-posting stopped".to_string())
        );
        assert!(!dash.auto_post().active);
    }

    #[test]
    fn test_earlier_snapshot_does_not_settle_start() {
        let (mut dash, recorder) = dashboard();
        dash.on_load();
        dash.start_auto_posting("10", t0()).unwrap();
        assert_eq!(recorder.sent.borrow().len(), 3);

        // Answer to the load request, sent before the start was handled
        dash.handle(snapshot(false, 0, None));
        assert_eq!(dash.toggle_action().unwrap().state, ActionState::Pending);
        assert!(dash.auto_post().active);

        dash.handle(snapshot(true, 10, None));
        assert_eq!(dash.toggle_action().unwrap().state, ActionState::Confirmed);
    }

    #[test]
    fn test_disconnect_fails_pending_actions() {
        let (mut dash, _) = dashboard();
        dash.handle(snapshot(false, 0, None));
        dash.start_auto_posting("10", t0()).unwrap();
        dash.post_now(t0());

        dash.handle(TransportEvent::Disconnected {
            reason: "transport close".to_string(),
        });
        let lost = ActionState::Failed("connection lost before confirmation".to_string());
        assert_eq!(dash.toggle_action().unwrap().state, lost);
        assert_eq!(dash.post_action().unwrap().state, lost);
        assert!(!dash.auto_post().active);

        // The greeting after reconnecting settles nothing
        dash.handle(TransportEvent::Connected);
        dash.handle(status("Connected to server"));
        assert_eq!(dash.post_action().unwrap().state, lost);
    }

    #[test]
    fn test_closed_channel_does_not_go_optimistic() {
        let (mut dash, recorder) = dashboard();
        *recorder.closed.borrow_mut() = true;

        dash.start_auto_posting("10", t0()).unwrap();
        assert!(!dash.auto_post().active);
        assert!(dash.last_action().is_none());
        assert_eq!(
            dash.view().status_line,
            format!("Current status: {}", ChannelError::Closed)
        );
    }

    #[test]
    fn test_toggle_theme_twice_restores() {
        let (mut dash, _) = dashboard();
        let before = dash.dark_mode();
        dash.toggle_theme();
        assert_ne!(dash.dark_mode(), before);
        dash.toggle_theme();
        assert_eq!(dash.dark_mode(), before);
    }
}
