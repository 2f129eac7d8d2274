//! Realtime Channel
//!
//! Status and command events exchanged with the auto-posting server over a
//! Socket.IO connection.
//!
//! - [`messages`]: typed inbound/outbound events
//! - [`packet`]: Engine.IO/Socket.IO text framing
//! - [`client`]: tokio WebSocket transport with reconnect (native only)
//!
//! The transport owns connecting and reconnecting; consumers only see a
//! stream of [`TransportEvent`]s and emit through a [`RealtimeChannel`].

pub mod messages;
pub mod packet;

#[cfg(feature = "native")]
pub mod client;

use thiserror::Error;

pub use messages::{Activity, AppStatus, ClientEvent, ServerEvent};
pub use packet::{Packet, PacketError, SocketPacket};

#[cfg(feature = "native")]
pub use client::{connect, RealtimeHandle, TransportConfig};

/// Default Socket.IO endpoint path
pub const DEFAULT_SOCKET_PATH: &str = "/socket.io/";

/// Consecutive failed connection attempts before a transport gives up
pub const DEFAULT_MAX_RECONNECT_ATTEMPTS: u32 = 5;
/// Delay before the first reconnect, in milliseconds
pub const DEFAULT_RECONNECT_BASE_DELAY_MS: u64 = 1000;
/// Upper bound for the reconnect delay, in milliseconds
pub const DEFAULT_RECONNECT_MAX_DELAY_MS: u64 = 30_000;

/// Exponential backoff before reconnect attempt `attempt` (0-based)
pub fn backoff_ms(attempt: u32, base_ms: u64, max_ms: u64) -> u64 {
    2u64.saturating_pow(attempt)
        .saturating_mul(base_ms)
        .min(max_ms)
}

/// Outbound half of the realtime channel. Emits are fire-and-forget.
pub trait RealtimeChannel {
    fn emit(&self, event: ClientEvent) -> Result<(), ChannelError>;
}

/// Emit failures
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ChannelError {
    #[error("Realtime channel closed")]
    Closed,

    /// Not joined to the namespace right now; nothing is queued
    #[error("Not connected to server")]
    NotConnected,

    #[error("Failed to send on realtime channel: {0}")]
    Send(String),
}

/// What the transport reports to the page
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportEvent {
    /// Namespace joined
    Connected,
    /// Connection lost; the transport may reconnect
    Disconnected { reason: String },
    /// Connection attempt or namespace join refused
    ConnectError { message: String },
    /// Decoded server event
    Event(ServerEvent),
}

/// WebSocket URL of the Socket.IO endpoint for an HTTP base URL
pub fn socket_url(base_url: &str, path: &str) -> String {
    let base = base_url.trim_end_matches('/');
    let base = if let Some(rest) = base.strip_prefix("https://") {
        format!("wss://{}", rest)
    } else if let Some(rest) = base.strip_prefix("http://") {
        format!("ws://{}", rest)
    } else {
        base.to_string()
    };

    let path = if path.starts_with('/') {
        path.to_string()
    } else {
        format!("/{}", path)
    };

    format!(
        "{}{}?EIO={}&transport=websocket",
        base,
        path,
        packet::ENGINE_IO_VERSION
    )
}

/// Turn a decoded frame into what the page cares about.
///
/// Returns `None` for frames handled by the transport itself (open, ping,
/// noop) and for events the console does not know.
pub fn interpret(packet: Packet) -> Option<TransportEvent> {
    match packet {
        Packet::Message(SocketPacket::Connect(_)) => Some(TransportEvent::Connected),
        Packet::Message(SocketPacket::Disconnect) | Packet::Close => {
            Some(TransportEvent::Disconnected {
                reason: "server disconnect".to_string(),
            })
        }
        Packet::Message(SocketPacket::ConnectError(data)) => {
            let message = data
                .get("message")
                .and_then(|m| m.as_str())
                .map(str::to_string)
                .unwrap_or_else(|| data.to_string());
            Some(TransportEvent::ConnectError { message })
        }
        Packet::Message(SocketPacket::Event { name, payload }) => {
            match ServerEvent::from_parts(&name, payload) {
                Ok(event) => Some(TransportEvent::Event(event)),
                Err(e) => {
                    tracing::warn!(event = %name, error = %e, "Dropping unrecognised server event");
                    None
                }
            }
        }
        Packet::Open(_) | Packet::Ping | Packet::Pong | Packet::Noop => None,
    }
}
