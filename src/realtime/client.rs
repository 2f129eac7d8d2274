//! Realtime Transport
//!
//! tokio WebSocket client for the Socket.IO endpoint. It answers pings,
//! joins the default namespace and reconnects with exponential backoff.
//! Emits are refused while the namespace is not joined, and events left
//! unsent when a connection drops are discarded rather than replayed.

use futures_util::{SinkExt, StreamExt};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::Message;

use super::packet::{connect_frame, encode_event, Packet};
use super::{
    interpret, socket_url, ChannelError, ClientEvent, RealtimeChannel, TransportEvent,
    DEFAULT_MAX_RECONNECT_ATTEMPTS, DEFAULT_RECONNECT_BASE_DELAY_MS, DEFAULT_RECONNECT_MAX_DELAY_MS,
};

/// Transport configuration
#[derive(Debug, Clone)]
pub struct TransportConfig {
    /// WebSocket URL, e.g. "ws://localhost:5000/socket.io/?EIO=4&transport=websocket"
    pub url: String,
    /// Consecutive failed attempts before giving up
    pub max_reconnect_attempts: u32,
    /// Delay before the first reconnect
    pub reconnect_base_delay: Duration,
    /// Upper bound for the backoff delay
    pub reconnect_max_delay: Duration,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            url: socket_url("http://localhost:5000", super::DEFAULT_SOCKET_PATH),
            max_reconnect_attempts: DEFAULT_MAX_RECONNECT_ATTEMPTS,
            reconnect_base_delay: Duration::from_millis(DEFAULT_RECONNECT_BASE_DELAY_MS),
            reconnect_max_delay: Duration::from_millis(DEFAULT_RECONNECT_MAX_DELAY_MS),
        }
    }
}

impl TransportConfig {
    /// Delay before reconnect attempt `attempt` (0-based)
    pub fn backoff(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt);
        self.reconnect_base_delay
            .checked_mul(factor)
            .unwrap_or(self.reconnect_max_delay)
            .min(self.reconnect_max_delay)
    }
}

/// Sending half handed to the dashboard
#[derive(Debug, Clone)]
pub struct RealtimeHandle {
    outbound: mpsc::UnboundedSender<ClientEvent>,
    joined: Arc<AtomicBool>,
}

impl RealtimeHandle {
    pub fn is_joined(&self) -> bool {
        self.joined.load(Ordering::SeqCst)
    }
}

impl RealtimeChannel for RealtimeHandle {
    fn emit(&self, event: ClientEvent) -> Result<(), ChannelError> {
        if self.outbound.is_closed() {
            return Err(ChannelError::Closed);
        }
        if !self.is_joined() {
            tracing::warn!(event = event.name(), "Refusing emit while not connected");
            return Err(ChannelError::NotConnected);
        }
        tracing::debug!(event = event.name(), "Queueing realtime event");
        self.outbound.send(event).map_err(|_| ChannelError::Closed)
    }
}

/// Start the transport task.
///
/// The task ends when the handle is dropped, when the event receiver is
/// dropped, or after `max_reconnect_attempts` consecutive failures.
pub fn connect(
    config: TransportConfig,
) -> (
    RealtimeHandle,
    mpsc::UnboundedReceiver<TransportEvent>,
    JoinHandle<()>,
) {
    let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();
    let (events_tx, events_rx) = mpsc::unbounded_channel();
    let joined = Arc::new(AtomicBool::new(false));

    let task = tokio::spawn(run(config, outbound_rx, events_tx, joined.clone()));

    let handle = RealtimeHandle {
        outbound: outbound_tx,
        joined,
    };
    (handle, events_rx, task)
}

enum SessionEnd {
    /// Handle or receiver dropped
    Shutdown,
    /// Connection failed or dropped
    Lost { joined: bool },
}

async fn run(
    config: TransportConfig,
    mut outbound: mpsc::UnboundedReceiver<ClientEvent>,
    events: mpsc::UnboundedSender<TransportEvent>,
    link: Arc<AtomicBool>,
) {
    let mut attempt = 0u32;

    loop {
        let end = session(&config, &mut outbound, &events, &link).await;
        link.store(false, Ordering::SeqCst);
        discard_unsent(&mut outbound);

        match end {
            SessionEnd::Shutdown => {
                tracing::debug!("Realtime transport shut down");
                return;
            }
            SessionEnd::Lost { joined } => {
                if joined {
                    attempt = 0;
                }
            }
        }

        if attempt >= config.max_reconnect_attempts {
            tracing::error!(attempts = attempt, "Max reconnect attempts reached");
            return;
        }

        let delay = config.backoff(attempt);
        attempt += 1;
        tracing::info!(attempt, delay_ms = delay.as_millis() as u64, "Reconnecting");
        tokio::time::sleep(delay).await;
    }
}

/// Drop events accepted for a connection that is gone
fn discard_unsent(outbound: &mut mpsc::UnboundedReceiver<ClientEvent>) {
    while let Ok(event) = outbound.try_recv() {
        tracing::warn!(event = event.name(), "Discarding event emitted before disconnect");
    }
}

async fn session(
    config: &TransportConfig,
    outbound: &mut mpsc::UnboundedReceiver<ClientEvent>,
    events: &mpsc::UnboundedSender<TransportEvent>,
    link: &AtomicBool,
) -> SessionEnd {
    let ws = match tokio_tungstenite::connect_async(config.url.as_str()).await {
        Ok((ws, _)) => ws,
        Err(e) => {
            tracing::warn!(url = %config.url, error = %e, "WebSocket connection failed");
            let event = TransportEvent::ConnectError {
                message: e.to_string(),
            };
            return if events.send(event).is_err() {
                SessionEnd::Shutdown
            } else {
                SessionEnd::Lost { joined: false }
            };
        }
    };

    let (mut sink, mut stream) = ws.split();
    let mut joined = false;

    // Report a lost connection and end the session
    let lost = |reason: String, joined: bool| {
        link.store(false, Ordering::SeqCst);
        if events.send(TransportEvent::Disconnected { reason }).is_err() {
            SessionEnd::Shutdown
        } else {
            SessionEnd::Lost { joined }
        }
    };

    loop {
        tokio::select! {
            frame = stream.next() => match frame {
                Some(Ok(Message::Text(text))) => {
                    let packet = match Packet::decode(&text) {
                        Ok(packet) => packet,
                        Err(e) => {
                            tracing::warn!(error = %e, "Dropping undecodable frame");
                            continue;
                        }
                    };

                    let reply = match &packet {
                        Packet::Open(handshake) => {
                            tracing::debug!(sid = %handshake.sid, "Engine.IO session opened");
                            Some(connect_frame())
                        }
                        Packet::Ping => Some(Packet::Pong.encode()),
                        _ => None,
                    };
                    if let Some(reply) = reply {
                        if let Err(e) = sink.send(Message::Text(reply)).await {
                            return lost(e.to_string(), joined);
                        }
                    }

                    let Some(event) = interpret(packet) else { continue };
                    match &event {
                        TransportEvent::Connected => {
                            tracing::info!(url = %config.url, "Realtime channel connected");
                            joined = true;
                            link.store(true, Ordering::SeqCst);
                        }
                        TransportEvent::Disconnected { .. } => {
                            link.store(false, Ordering::SeqCst);
                            return if events.send(event).is_err() {
                                SessionEnd::Shutdown
                            } else {
                                SessionEnd::Lost { joined }
                            };
                        }
                        TransportEvent::ConnectError { message } => {
                            tracing::warn!(error = %message, "Namespace join refused");
                            link.store(false, Ordering::SeqCst);
                            return if events.send(event).is_err() {
                                SessionEnd::Shutdown
                            } else {
                                SessionEnd::Lost { joined }
                            };
                        }
                        TransportEvent::Event(e) => {
                            tracing::debug!(event = e.name(), "Realtime event received");
                        }
                    }
                    if events.send(event).is_err() {
                        return SessionEnd::Shutdown;
                    }
                }
                Some(Ok(Message::Close(frame))) => {
                    let reason = frame
                        .map(|f| f.reason.to_string())
                        .filter(|r| !r.is_empty())
                        .unwrap_or_else(|| "closed by server".to_string());
                    return lost(reason, joined);
                }
                Some(Ok(_)) => {}
                Some(Err(e)) => return lost(e.to_string(), joined),
                None => return lost("stream ended".to_string(), joined),
            },
            next = outbound.recv(), if joined => match next {
                Some(event) => {
                    tracing::debug!(event = event.name(), "Emitting realtime event");
                    if let Err(e) = sink.send(Message::Text(encode_event(&event))).await {
                        return lost(e.to_string(), joined);
                    }
                }
                None => {
                    let _ = sink.send(Message::Close(None)).await;
                    return SessionEnd::Shutdown;
                }
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::realtime::ServerEvent;
    use axum::extract::ws::{Message as WsMessage, WebSocket, WebSocketUpgrade};
    use axum::response::Response;
    use axum::routing::get;
    use axum::Router;

    async fn fake_server(mut socket: WebSocket) {
        let open = r#"0{"sid":"s1","upgrades":[],"pingInterval":25000,"pingTimeout":20000}"#;
        if socket.send(WsMessage::Text(open.to_string())).await.is_err() {
            return;
        }

        while let Some(Ok(msg)) = socket.recv().await {
            let WsMessage::Text(text) = msg else { continue };
            let replies: Vec<String> = match text.as_str() {
                "40" => vec![
                    r#"40{"sid":"n1"}"#.to_string(),
                    "2".to_string(),
                    r#"42["status",{"message":"welcome"}]"#.to_string(),
                ],
                r#"42["get_app_status"]"# => vec![
                    r#"42["app_status",{"current_status":"idle","auto_posting_active":false,"auto_posting_interval":0,"next_post_time":null,"recent_activities":[]}]"#
                        .to_string(),
                ],
                "3" => vec![r#"42["status_update",{"status":"pong seen"}]"#.to_string()],
                _ => vec![],
            };
            for reply in replies {
                if socket.send(WsMessage::Text(reply)).await.is_err() {
                    return;
                }
            }
        }
    }

    /// Accepts the namespace join, then hangs up
    async fn dropping_server(mut socket: WebSocket) {
        let open = r#"0{"sid":"s2","upgrades":[],"pingInterval":25000,"pingTimeout":20000}"#;
        if socket.send(WsMessage::Text(open.to_string())).await.is_err() {
            return;
        }
        while let Some(Ok(msg)) = socket.recv().await {
            if matches!(msg, WsMessage::Text(ref text) if text == "40") {
                let _ = socket.send(WsMessage::Text(r#"40{"sid":"n2"}"#.to_string())).await;
                let _ = socket.send(WsMessage::Close(None)).await;
                return;
            }
        }
    }

    async fn upgrade(ws: WebSocketUpgrade) -> Response {
        ws.on_upgrade(fake_server)
    }

    async fn upgrade_dropping(ws: WebSocketUpgrade) -> Response {
        ws.on_upgrade(dropping_server)
    }

    async fn spawn_server() -> String {
        let app = Router::new()
            .route("/socket.io/", get(upgrade))
            .route("/dropping/", get(upgrade_dropping));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        socket_url(&format!("http://{}", addr), "/socket.io/")
    }

    async fn next_event(rx: &mut mpsc::UnboundedReceiver<TransportEvent>) -> TransportEvent {
        tokio::time::timeout(Duration::from_secs(5), rx.recv())
            .await
            .expect("timed out waiting for transport event")
            .expect("transport ended")
    }

    #[test]
    fn test_backoff_doubles_and_caps() {
        let config = TransportConfig::default();
        assert_eq!(config.backoff(0), Duration::from_secs(1));
        assert_eq!(config.backoff(1), Duration::from_secs(2));
        assert_eq!(config.backoff(4), Duration::from_secs(16));
        assert_eq!(config.backoff(5), Duration::from_secs(30));
        assert_eq!(config.backoff(40), Duration::from_secs(30));
    }

    #[tokio::test]
    async fn test_joins_answers_ping_and_round_trips_events() {
        let url = spawn_server().await;
        let (handle, mut events, task) = connect(TransportConfig {
            url,
            ..Default::default()
        });

        // Refused, not queued, before the namespace is joined
        assert_eq!(
            handle.emit(ClientEvent::GetAppStatus),
            Err(ChannelError::NotConnected)
        );

        assert_eq!(next_event(&mut events).await, TransportEvent::Connected);
        assert!(handle.is_joined());
        handle.emit(ClientEvent::GetAppStatus).unwrap();

        let mut seen = Vec::new();
        while seen.len() < 3 {
            if let TransportEvent::Event(e) = next_event(&mut events).await {
                seen.push(e);
            }
        }

        assert!(seen.contains(&ServerEvent::Status {
            message: "welcome".to_string()
        }));
        assert!(seen.contains(&ServerEvent::StatusUpdate {
            status: "pong seen".to_string()
        }));
        assert!(seen
            .iter()
            .any(|e| matches!(e, ServerEvent::AppStatus(s) if s.current_status == "idle")));

        drop(handle);
        tokio::time::timeout(Duration::from_secs(5), task)
            .await
            .expect("transport did not stop")
            .unwrap();
    }

    #[tokio::test]
    async fn test_emit_refused_after_connection_drops() {
        let url = spawn_server().await.replace("/socket.io/", "/dropping/");
        let (handle, mut events, task) = connect(TransportConfig {
            url,
            max_reconnect_attempts: 0,
            ..Default::default()
        });

        assert_eq!(next_event(&mut events).await, TransportEvent::Connected);
        assert!(matches!(
            next_event(&mut events).await,
            TransportEvent::Disconnected { .. }
        ));

        // Nothing waits in a queue for the next connection
        assert_eq!(
            handle.emit(ClientEvent::PostTweet),
            Err(ChannelError::NotConnected)
        );

        tokio::time::timeout(Duration::from_secs(5), task)
            .await
            .expect("transport did not stop")
            .unwrap();
        assert_eq!(handle.emit(ClientEvent::PostTweet), Err(ChannelError::Closed));
    }

    #[tokio::test]
    async fn test_gives_up_after_max_attempts() {
        let (_handle, mut events, task) = connect(TransportConfig {
            url: "ws://127.0.0.1:9/socket.io/?EIO=4&transport=websocket".to_string(),
            max_reconnect_attempts: 2,
            reconnect_base_delay: Duration::from_millis(10),
            reconnect_max_delay: Duration::from_millis(20),
        });

        let mut errors = 0;
        while let Some(event) = events.recv().await {
            assert!(matches!(event, TransportEvent::ConnectError { .. }));
            errors += 1;
        }
        // First attempt plus two reconnects
        assert_eq!(errors, 3);
        task.await.unwrap();
    }
}
