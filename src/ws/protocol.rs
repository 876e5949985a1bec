//! WebSocket protocol message definitions
//! These are the wire types shared by the relay and its clients

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Wire kind strings
pub const KIND_UPDATE: &str = "update";
pub const KIND_JOIN: &str = "join";
pub const KIND_LEAVE: &str = "leave";
pub const KIND_STANDING: &str = "standing";

/// Maximum number of entries in a standing
pub const STANDING_CAPACITY: usize = 5;

/// Relay-assigned player identity, opaque to clients
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlayerId(String);

impl PlayerId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Fresh identity for a newly accepted connection
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PlayerId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

/// Player snapshot carried by update messages
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct User {
    #[serde(rename = "ID", alias = "id")]
    pub id: PlayerId,
    #[serde(rename = "Name", alias = "name")]
    pub name: String,
    /// Horizontal position in 1/16 px
    #[serde(rename = "X16", alias = "x16")]
    pub x16: i32,
    /// Vertical position in 1/16 px
    #[serde(rename = "Y16", alias = "y16")]
    pub y16: i32,
    /// Vertical velocity in 1/16 px per tick
    #[serde(rename = "VY16", alias = "vy16")]
    pub vy16: i32,
    /// Still in flight (false once crashed)
    #[serde(rename = "Running", alias = "running")]
    pub running: bool,
    #[serde(rename = "Score", alias = "score")]
    pub score: i32,
}

/// One leaderboard entry
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Record {
    #[serde(rename = "Name", alias = "name")]
    pub name: String,
    #[serde(rename = "Score", alias = "score")]
    pub score: i32,
}

impl Record {
    pub fn new(name: impl Into<String>, score: i32) -> Self {
        Self {
            name: name.into(),
            score,
        }
    }
}

/// Flat on-the-wire shape of every message
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WireMessage {
    #[serde(rename = "Kind", alias = "kind")]
    pub kind: String,
    #[serde(rename = "User", alias = "user")]
    pub user: User,
    #[serde(
        rename = "Standing",
        alias = "standing",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub standing: Vec<Record>,
}

/// Messages exchanged between relay and clients
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Message {
    /// A player's latest state
    Update(User),
    /// A session started (relay-internal, never forwarded)
    Join,
    /// A player disconnected
    Leave(PlayerId),
    /// Current leaderboard, best first
    Standing(Vec<Record>),
}

impl Message {
    pub fn kind(&self) -> &'static str {
        match self {
            Message::Update(_) => KIND_UPDATE,
            Message::Join => KIND_JOIN,
            Message::Leave(_) => KIND_LEAVE,
            Message::Standing(_) => KIND_STANDING,
        }
    }

    /// Whether the message is well-formed coming from a client.
    /// `Join` only ever originates inside the relay.
    pub fn is_client_sendable(&self) -> bool {
        !matches!(self, Message::Join)
    }

    /// Decode a text frame.
    ///
    /// Malformed JSON yields [`ProtocolError::Malformed`], which ends the
    /// connection. A well-formed frame with an unrecognised kind yields
    /// [`ProtocolError::UnknownKind`], which callers drop.
    pub fn decode(text: &str) -> Result<Self, ProtocolError> {
        let wire: WireMessage = serde_json::from_str(text)?;
        Message::try_from(wire)
    }

    /// Encode as a text frame
    pub fn encode(&self) -> Result<String, ProtocolError> {
        Ok(serde_json::to_string(&WireMessage::from(self))?)
    }
}

impl TryFrom<WireMessage> for Message {
    type Error = ProtocolError;

    fn try_from(wire: WireMessage) -> Result<Self, Self::Error> {
        match wire.kind.as_str() {
            KIND_UPDATE => Ok(Message::Update(wire.user)),
            KIND_JOIN => Ok(Message::Join),
            KIND_LEAVE => Ok(Message::Leave(wire.user.id)),
            KIND_STANDING => Ok(Message::Standing(wire.standing)),
            _ => Err(ProtocolError::UnknownKind(wire.kind)),
        }
    }
}

impl From<&Message> for WireMessage {
    fn from(msg: &Message) -> Self {
        let mut wire = WireMessage {
            kind: msg.kind().to_string(),
            ..Default::default()
        };
        match msg {
            Message::Update(user) => wire.user = user.clone(),
            Message::Join => {}
            Message::Leave(id) => wire.user.id = id.clone(),
            Message::Standing(records) => wire.standing = records.clone(),
        }
        wire
    }
}

/// Protocol decode/encode errors
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    #[error("Malformed message: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("Unknown message kind: {0:?}")]
    UnknownKind(String),
}

impl ProtocolError {
    /// Framing-level failures end the connection; the rest are dropped
    pub fn is_terminal(&self) -> bool {
        matches!(self, ProtocolError::Malformed(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_update_in_relay_field_style() {
        let text = r#"{"Kind":"update","User":{"ID":"","Name":"alice","X16":512,"Y16":1600,"VY16":-96,"Running":true,"Score":0}}"#;
        let msg = Message::decode(text).unwrap();

        match msg {
            Message::Update(user) => {
                assert_eq!(user.name, "alice");
                assert_eq!(user.x16, 512);
                assert_eq!(user.vy16, -96);
                assert!(user.running);
            }
            other => panic!("expected update, got {other:?}"),
        }
    }

    #[test]
    fn accepts_lowercase_fields_and_missing_user_fields() {
        let msg = Message::decode(r#"{"kind":"leave","user":{"id":"p1"}}"#).unwrap();
        assert_eq!(msg, Message::Leave(PlayerId::from("p1")));
    }

    #[test]
    fn unknown_kind_is_not_terminal() {
        let err = Message::decode(r#"{"Kind":"teleport"}"#).unwrap_err();
        assert!(matches!(err, ProtocolError::UnknownKind(ref k) if k == "teleport"));
        assert!(!err.is_terminal());
    }

    #[test]
    fn broken_json_is_terminal() {
        let err = Message::decode("{\"Kind\":").unwrap_err();
        assert!(err.is_terminal());
    }

    #[test]
    fn standing_field_only_present_when_non_empty() {
        let empty = Message::Standing(Vec::new()).encode().unwrap();
        assert!(!empty.contains("Standing"));

        let text = Message::Standing(vec![Record::new("bob", 30)]).encode().unwrap();
        let value: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value["Kind"], "standing");
        assert_eq!(value["Standing"][0]["Name"], "bob");
        assert_eq!(value["Standing"][0]["Score"], 30);
    }

    #[test]
    fn leave_encodes_identity_in_user() {
        let text = Message::Leave(PlayerId::from("p9")).encode().unwrap();
        let value: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value["Kind"], "leave");
        assert_eq!(value["User"]["ID"], "p9");
    }

    #[test]
    fn join_is_relay_only() {
        assert!(!Message::Join.is_client_sendable());
        assert!(Message::Update(User::default()).is_client_sendable());
        assert!(Message::Leave(PlayerId::default()).is_client_sendable());
        assert!(Message::Standing(Vec::new()).is_client_sendable());
    }
}
