//! Socket.IO Framing
//!
//! Text frames of Engine.IO protocol v4 carrying Socket.IO v5 packets, as
//! spoken over a plain WebSocket (`?EIO=4&transport=websocket`).
//!
//! ```text
//! 0{"sid":..}          open (server → client)
//! 2 / 3                ping / pong
//! 40                   connect to the default namespace
//! 42["status",{..}]    event
//! 44{"message":..}     connect error
//! ```

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use super::messages::ClientEvent;

/// Engine.IO protocol revision used in the connection URL
pub const ENGINE_IO_VERSION: u8 = 4;

/// Engine.IO open handshake
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Handshake {
    pub sid: String,
    #[serde(default)]
    pub upgrades: Vec<String>,
    /// Milliseconds between server pings
    pub ping_interval: u64,
    /// Milliseconds the server waits for a pong
    pub ping_timeout: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_payload: Option<u64>,
}

/// Engine.IO packet
#[derive(Debug, Clone, PartialEq)]
pub enum Packet {
    Open(Handshake),
    Close,
    Ping,
    Pong,
    Message(SocketPacket),
    Noop,
}

/// Socket.IO packet carried in an Engine.IO message
#[derive(Debug, Clone, PartialEq)]
pub enum SocketPacket {
    Connect(Option<Value>),
    Disconnect,
    Event { name: String, payload: Option<Value> },
    ConnectError(Value),
}

/// Frame decoding failures
#[derive(Debug, Error)]
pub enum PacketError {
    #[error("Empty frame")]
    Empty,

    #[error("Unknown packet type {0:?}")]
    UnknownType(char),

    #[error("Unsupported packet type {0:?}")]
    Unsupported(char),

    #[error("Invalid JSON in frame: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Malformed event: {0}")]
    MalformedEvent(String),

    #[error("Packet for namespace {0:?} ignored")]
    ForeignNamespace(String),
}

impl Packet {
    /// Decode one text frame
    pub fn decode(frame: &str) -> Result<Self, PacketError> {
        let mut chars = frame.chars();
        let kind = chars.next().ok_or(PacketError::Empty)?;
        let rest = chars.as_str();

        match kind {
            '0' => Ok(Packet::Open(serde_json::from_str(rest)?)),
            '1' => Ok(Packet::Close),
            '2' => Ok(Packet::Ping),
            '3' => Ok(Packet::Pong),
            '4' => Ok(Packet::Message(SocketPacket::decode(rest)?)),
            '5' => Err(PacketError::Unsupported(kind)),
            '6' => Ok(Packet::Noop),
            other => Err(PacketError::UnknownType(other)),
        }
    }

    /// Encode as one text frame
    pub fn encode(&self) -> String {
        match self {
            Packet::Open(handshake) => {
                // Handshake holds only strings and integers
                format!("0{}", serde_json::to_string(handshake).unwrap_or_default())
            }
            Packet::Close => "1".to_string(),
            Packet::Ping => "2".to_string(),
            Packet::Pong => "3".to_string(),
            Packet::Message(packet) => format!("4{}", packet.encode()),
            Packet::Noop => "6".to_string(),
        }
    }
}

impl SocketPacket {
    fn decode(body: &str) -> Result<Self, PacketError> {
        let mut chars = body.chars();
        let kind = chars.next().ok_or(PacketError::Empty)?;
        let data = strip_ack_id(strip_namespace(chars.as_str())?);

        match kind {
            '0' => Ok(SocketPacket::Connect(parse_optional(data)?)),
            '1' => Ok(SocketPacket::Disconnect),
            '2' => decode_event(data),
            '4' => Ok(SocketPacket::ConnectError(
                parse_optional(data)?.unwrap_or(Value::Null),
            )),
            '3' | '5' | '6' => Err(PacketError::Unsupported(kind)),
            other => Err(PacketError::UnknownType(other)),
        }
    }

    fn encode(&self) -> String {
        match self {
            SocketPacket::Connect(None) => "0".to_string(),
            SocketPacket::Connect(Some(auth)) => format!("0{}", auth),
            SocketPacket::Disconnect => "1".to_string(),
            SocketPacket::Event { name, payload } => {
                let mut args = vec![Value::String(name.clone())];
                args.extend(payload.clone());
                format!("2{}", Value::Array(args))
            }
            SocketPacket::ConnectError(data) => format!("4{}", data),
        }
    }
}

/// Drop a leading `/,` for the default namespace. Any other namespace is
/// refused so its events never reach the dashboard.
fn strip_namespace(data: &str) -> Result<&str, PacketError> {
    if !data.starts_with('/') {
        return Ok(data);
    }
    let (namespace, rest) = data.split_once(',').unwrap_or((data, ""));
    if namespace == "/" {
        Ok(rest)
    } else {
        Err(PacketError::ForeignNamespace(namespace.to_string()))
    }
}

/// Drop a leading numeric ack id
fn strip_ack_id(data: &str) -> &str {
    data.trim_start_matches(|c: char| c.is_ascii_digit())
}

fn parse_optional(data: &str) -> Result<Option<Value>, PacketError> {
    if data.trim().is_empty() {
        Ok(None)
    } else {
        Ok(Some(serde_json::from_str(data)?))
    }
}

fn decode_event(data: &str) -> Result<SocketPacket, PacketError> {
    let args: Vec<Value> = serde_json::from_str(data)?;
    let mut args = args.into_iter();

    let name = match args.next() {
        Some(Value::String(name)) => name,
        Some(other) => {
            return Err(PacketError::MalformedEvent(format!(
                "event name must be a string, got {}",
                other
            )))
        }
        None => return Err(PacketError::MalformedEvent("empty argument list".to_string())),
    };

    Ok(SocketPacket::Event {
        name,
        payload: args.next(),
    })
}

/// Frame for an outbound console event
pub fn encode_event(event: &ClientEvent) -> String {
    Packet::Message(SocketPacket::Event {
        name: event.name().to_string(),
        payload: event.payload(),
    })
    .encode()
}

/// Frame that joins the default namespace
pub fn connect_frame() -> String {
    Packet::Message(SocketPacket::Connect(None)).encode()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_decode_open() {
        let frame = r#"0{"sid":"abc","upgrades":[],"pingInterval":25000,"pingTimeout":20000,"maxPayload":1000000}"#;
        match Packet::decode(frame).unwrap() {
            Packet::Open(h) => {
                assert_eq!(h.sid, "abc");
                assert_eq!(h.ping_interval, 25000);
                assert_eq!(h.max_payload, Some(1_000_000));
            }
            other => panic!("Expected Open, got {:?}", other),
        }
    }

    #[test]
    fn test_decode_control_frames() {
        assert_eq!(Packet::decode("2").unwrap(), Packet::Ping);
        assert_eq!(Packet::decode("3").unwrap(), Packet::Pong);
        assert_eq!(Packet::decode("1").unwrap(), Packet::Close);
        assert_eq!(Packet::decode("6").unwrap(), Packet::Noop);
        assert_eq!(
            Packet::decode("41").unwrap(),
            Packet::Message(SocketPacket::Disconnect)
        );
    }

    #[test]
    fn test_decode_connect_ack() {
        assert_eq!(
            Packet::decode(r#"40{"sid":"xyz"}"#).unwrap(),
            Packet::Message(SocketPacket::Connect(Some(json!({"sid": "xyz"}))))
        );
    }

    #[test]
    fn test_decode_event() {
        let packet = Packet::decode(r#"42["status",{"message":"connected"}]"#).unwrap();
        assert_eq!(
            packet,
            Packet::Message(SocketPacket::Event {
                name: "status".to_string(),
                payload: Some(json!({"message": "connected"})),
            })
        );
    }

    #[test]
    fn test_decode_event_with_ack() {
        let packet = Packet::decode(r#"4217["status_update",{"status":"idle"}]"#).unwrap();
        assert!(matches!(
            packet,
            Packet::Message(SocketPacket::Event { ref name, .. }) if name == "status_update"
        ));
    }

    #[test]
    fn test_foreign_namespace_is_refused() {
        for frame in [
            r#"42/admin,17["status_update",{"status":"idle"}]"#,
            r#"42/admin,["app_status",{}]"#,
            "40/admin,",
            "41/admin",
        ] {
            assert!(
                matches!(
                    Packet::decode(frame),
                    Err(PacketError::ForeignNamespace(ref ns)) if ns == "/admin"
                ),
                "{}",
                frame
            );
        }
    }

    #[test]
    fn test_decode_event_with_default_namespace_and_ack() {
        let packet = Packet::decode(r#"42/,17["status_update",{"status":"idle"}]"#).unwrap();
        match packet {
            Packet::Message(SocketPacket::Event { name, payload }) => {
                assert_eq!(name, "status_update");
                assert_eq!(payload, Some(json!({"status": "idle"})));
            }
            other => panic!("Expected Event, got {:?}", other),
        }
    }

    #[test]
    fn test_decode_connect_error() {
        let packet = Packet::decode(r#"44{"message":"Not authorized"}"#).unwrap();
        assert_eq!(
            packet,
            Packet::Message(SocketPacket::ConnectError(json!({"message": "Not authorized"})))
        );
    }

    #[test]
    fn test_decode_rejects_garbage() {
        assert!(matches!(Packet::decode(""), Err(PacketError::Empty)));
        assert!(matches!(Packet::decode("9"), Err(PacketError::UnknownType('9'))));
        assert!(matches!(Packet::decode("42[1,2]"), Err(PacketError::MalformedEvent(_))));
        assert!(matches!(Packet::decode("42[]"), Err(PacketError::MalformedEvent(_))));
        assert!(matches!(Packet::decode("42{oops"), Err(PacketError::Json(_))));
        assert!(matches!(Packet::decode("b4AAAA"), Err(PacketError::UnknownType('b'))));
    }

    #[test]
    fn test_encode_client_events() {
        assert_eq!(encode_event(&ClientEvent::PostTweet), r#"42["post_tweet"]"#);
        assert_eq!(
            encode_event(&ClientEvent::StartAutoPosting { interval: 15 }),
            r#"42["start_auto_posting",{"interval":15}]"#
        );
        assert_eq!(encode_event(&ClientEvent::GetAppStatus), r#"42["get_app_status"]"#);
        assert_eq!(connect_frame(), "40");
        assert_eq!(Packet::Pong.encode(), "3");
    }
}
