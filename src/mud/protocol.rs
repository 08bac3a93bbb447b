//! Inbound frame parsing for the MUD channel.
//!
//! Frames are JSON objects tagged by a top-level `type` field. Outbound
//! traffic is raw command text, not JSON. A non-JSON inbound frame is legal:
//! it falls back to a plain display line (the caller decides).

use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

use crate::mud::state::{Player, Room};

#[derive(Debug, Clone, Deserialize)]
pub struct ChatMsg {
    pub sender: String,
    pub content: String,
    /// CSS channel tag ("channel-say", "channel-combat", ...).
    #[serde(default)]
    pub channel: Option<String>,
}

/// Partial update: absent fields leave the prior state untouched.
#[derive(Debug, Clone, Deserialize)]
pub struct GamestateMsg {
    #[serde(default)]
    pub player: Option<Player>,
    #[serde(default)]
    pub room: Option<Room>,
}

#[derive(Debug, Clone)]
pub enum ServerMsg {
    Chat(ChatMsg),
    Gamestate(GamestateMsg),
    /// Forward compatibility: logged and otherwise ignored.
    Unknown { kind: String, data: Value },
}

#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("frame is not json")]
    NotJson,
    #[error("frame has no type tag")]
    MissingTag,
    #[error("bad `{kind}` payload: {detail}")]
    BadPayload { kind: String, detail: String },
}

impl ServerMsg {
    pub fn parse(raw: &str) -> Result<ServerMsg, ProtocolError> {
        let value: Value = serde_json::from_str(raw).map_err(|_| ProtocolError::NotJson)?;
        let kind = value
            .get("type")
            .and_then(Value::as_str)
            .ok_or(ProtocolError::MissingTag)?
            .to_string();
        match kind.as_str() {
            "chat" => serde_json::from_value(value)
                .map(ServerMsg::Chat)
                .map_err(|err| bad_payload(kind, err)),
            "gamestate" => serde_json::from_value(value)
                .map(ServerMsg::Gamestate)
                .map_err(|err| bad_payload(kind, err)),
            _ => Ok(ServerMsg::Unknown { kind, data: value }),
        }
    }
}

fn bad_payload(kind: String, err: serde_json::Error) -> ProtocolError {
    ProtocolError::BadPayload {
        kind,
        detail: err.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_chat_with_default_channel() {
        let msg = ServerMsg::parse(r#"{"type":"chat","sender":"Vex","content":"hi"}"#).unwrap();
        match msg {
            ServerMsg::Chat(chat) => {
                assert_eq!(chat.sender, "Vex");
                assert_eq!(chat.content, "hi");
                assert!(chat.channel.is_none());
            }
            other => panic!("expected chat, got {other:?}"),
        }
    }

    #[test]
    fn parses_partial_gamestate() {
        let msg = ServerMsg::parse(
            r#"{"type":"gamestate","room":{"id":"start_zone","name":"Safe Zone","description":"Calm."}}"#,
        )
        .unwrap();
        match msg {
            ServerMsg::Gamestate(update) => {
                assert!(update.player.is_none());
                assert_eq!(update.room.unwrap().id, "start_zone");
            }
            other => panic!("expected gamestate, got {other:?}"),
        }
    }

    #[test]
    fn unknown_tag_is_preserved_not_rejected() {
        let msg = ServerMsg::parse(r#"{"type":"weather","data":{"sky":"red"}}"#).unwrap();
        assert!(matches!(msg, ServerMsg::Unknown { kind, .. } if kind == "weather"));
    }

    #[test]
    fn raw_text_frame_is_a_not_json_error() {
        assert!(matches!(
            ServerMsg::parse("You feel a chill."),
            Err(ProtocolError::NotJson)
        ));
    }

    #[test]
    fn untagged_object_is_a_missing_tag_error() {
        assert!(matches!(
            ServerMsg::parse(r#"{"sender":"x"}"#),
            Err(ProtocolError::MissingTag)
        ));
    }
}
