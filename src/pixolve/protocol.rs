//! Pixolve wire protocol: tagged `{"type": ..., "data": ...}` JSON frames in
//! both directions.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Score rows keep the server's emission order so equal scores stay in a
/// stable order across renders.
pub type Scores = Vec<(String, i64)>;

/// Identity object the server expects in membership frames; it reads fields
/// out of it rather than accepting a bare name.
#[derive(Debug, Clone, Serialize)]
pub struct PlayerRef {
    pub id: String,
    pub username: String,
}

impl PlayerRef {
    pub fn new(id: impl Into<String>, username: impl Into<String>) -> PlayerRef {
        PlayerRef {
            id: id.into(),
            username: username.into(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum ClientMsg {
    /// Presence frame; must be the first message after connect.
    JoinLobby { player: PlayerRef },
    PlayerReady { player_id: String, ready: bool },
    Chat { player: String, text: String },
    StartGame { player: PlayerRef },
    SubmitGuess { player_id: String, text: String },
}

impl ClientMsg {
    /// The frame every fresh connection announces itself with.
    pub fn presence(player: PlayerRef) -> ClientMsg {
        ClientMsg::JoinLobby { player }
    }

    pub fn to_frame(&self) -> Result<String, ProtocolError> {
        serde_json::to_string(self).map_err(|err| ProtocolError::Encode(err.to_string()))
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LobbyPlayer {
    pub id: String,
    pub username: String,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub ready: bool,
}

impl LobbyPlayer {
    pub fn label(&self) -> &str {
        self.display_name.as_deref().unwrap_or(&self.username)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChatData {
    pub player: String,
    pub text: String,
    #[serde(default)]
    pub ts: Option<f64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RevealStep {
    pub step_index: u32,
    pub pixelation: u32,
    /// Seconds since round start at which this step applies.
    #[serde(default)]
    pub time_offset: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GuessResult {
    pub player_id: String,
    pub correct: bool,
    #[serde(default)]
    pub points_awarded: i64,
    pub round_index: u32,
    #[serde(default)]
    pub xp_awarded: Option<i64>,
    #[serde(default)]
    pub reason: Option<String>,
}

#[derive(Debug, Clone)]
pub enum ServerMsg {
    LobbyUpdate { players: Vec<LobbyPlayer> },
    Chat(ChatData),
    GameStarted { game_id: String },
    StartRound { round_index: u32, image_id: String },
    RevealStep(RevealStep),
    GuessResult(GuessResult),
    ScoreboardUpdate { scores: Scores },
    EndRound { round_index: u32 },
    GameFinished { game_id: String, scores: Scores },
    ServerError { message: String },
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
    #[error("failed to encode frame: {0}")]
    Encode(String),
}

impl ServerMsg {
    pub fn parse(raw: &str) -> Result<ServerMsg, ProtocolError> {
        let value: Value = serde_json::from_str(raw).map_err(|_| ProtocolError::NotJson)?;
        let kind = value
            .get("type")
            .and_then(Value::as_str)
            .ok_or(ProtocolError::MissingTag)?
            .to_string();
        let data = value.get("data").cloned().unwrap_or(Value::Null);
        match kind.as_str() {
            "lobby_update" => {
                #[derive(Deserialize)]
                struct Payload {
                    players: Vec<LobbyPlayer>,
                }
                decode::<Payload>(&kind, data)
                    .map(|p| ServerMsg::LobbyUpdate { players: p.players })
            }
            "chat" => decode(&kind, data).map(ServerMsg::Chat),
            "game_started" => {
                #[derive(Deserialize)]
                struct Payload {
                    game_id: String,
                }
                decode::<Payload>(&kind, data).map(|p| ServerMsg::GameStarted { game_id: p.game_id })
            }
            "start_round" => {
                #[derive(Deserialize)]
                struct Payload {
                    round_index: u32,
                    image_id: String,
                }
                decode::<Payload>(&kind, data).map(|p| ServerMsg::StartRound {
                    round_index: p.round_index,
                    image_id: p.image_id,
                })
            }
            "reveal_step" => decode(&kind, data).map(ServerMsg::RevealStep),
            "guess_result" => decode(&kind, data).map(ServerMsg::GuessResult),
            "scoreboard_update" => {
                #[derive(Deserialize)]
                struct Payload {
                    scores: serde_json::Map<String, Value>,
                }
                decode::<Payload>(&kind, data).map(|p| ServerMsg::ScoreboardUpdate {
                    scores: scores_from_map(p.scores),
                })
            }
            "end_round" => {
                #[derive(Deserialize)]
                struct Payload {
                    round_index: u32,
                }
                decode::<Payload>(&kind, data)
                    .map(|p| ServerMsg::EndRound { round_index: p.round_index })
            }
            "game_finished" => {
                #[derive(Deserialize)]
                struct Payload {
                    game_id: String,
                    scores: serde_json::Map<String, Value>,
                }
                decode::<Payload>(&kind, data).map(|p| ServerMsg::GameFinished {
                    game_id: p.game_id,
                    scores: scores_from_map(p.scores),
                })
            }
            "error" => {
                let message = data
                    .as_str()
                    .map(str::to_string)
                    .or_else(|| {
                        data.get("message")
                            .and_then(Value::as_str)
                            .map(str::to_string)
                    })
                    .unwrap_or_else(|| "unknown server error".to_string());
                Ok(ServerMsg::ServerError { message })
            }
            _ => Ok(ServerMsg::Unknown { kind, data }),
        }
    }
}

fn decode<T: serde::de::DeserializeOwned>(kind: &str, data: Value) -> Result<T, ProtocolError> {
    serde_json::from_value(data).map_err(|err| ProtocolError::BadPayload {
        kind: kind.to_string(),
        detail: err.to_string(),
    })
}

/// The map keeps JSON document order (serde_json `preserve_order`), so the
/// resulting rows inherit the server's ordering.
fn scores_from_map(map: serde_json::Map<String, Value>) -> Scores {
    map.into_iter()
        .map(|(player, score)| (player, score.as_i64().unwrap_or(0)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn outbound_frames_carry_type_and_data() {
        let frame = ClientMsg::presence(PlayerRef::new("riko", "riko"))
            .to_frame()
            .unwrap();
        let value: Value = serde_json::from_str(&frame).unwrap();
        assert_eq!(value["type"], "join_lobby");
        assert_eq!(value["data"]["player"]["id"], "riko");
        assert_eq!(value["data"]["player"]["username"], "riko");

        let frame = ClientMsg::SubmitGuess {
            player_id: "p1".to_string(),
            text: "corgi".to_string(),
        }
        .to_frame()
        .unwrap();
        let value: Value = serde_json::from_str(&frame).unwrap();
        assert_eq!(value["type"], "submit_guess");
        assert_eq!(value["data"]["text"], "corgi");
    }

    #[test]
    fn membership_frames_send_a_player_object_not_a_name() {
        for msg in [
            ClientMsg::presence(PlayerRef::new("riko", "riko")),
            ClientMsg::StartGame {
                player: PlayerRef::new("riko", "riko"),
            },
        ] {
            let value: Value = serde_json::from_str(&msg.to_frame().unwrap()).unwrap();
            let player = &value["data"]["player"];
            assert!(player.is_object(), "player must be an object: {value}");
            assert_eq!(player["id"], "riko");
        }
    }

    #[test]
    fn lobby_update_replaces_the_membership_list() {
        let raw = r#"{"type":"lobby_update","data":{"players":[
            {"id":"p1","username":"riko","display_name":"Riko","ready":true},
            {"id":"p2","username":"nanachi"}]}}"#;
        match ServerMsg::parse(raw).unwrap() {
            ServerMsg::LobbyUpdate { players } => {
                assert_eq!(players.len(), 2);
                assert_eq!(players[0].label(), "Riko");
                assert!(players[0].ready);
                assert_eq!(players[1].label(), "nanachi");
                assert!(!players[1].ready);
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn scoreboard_rows_keep_document_order() {
        let raw = r#"{"type":"scoreboard_update","data":{"scores":{"zeta":30,"alpha":30,"mid":10}}}"#;
        match ServerMsg::parse(raw).unwrap() {
            ServerMsg::ScoreboardUpdate { scores } => {
                let names: Vec<&str> = scores.iter().map(|(n, _)| n.as_str()).collect();
                assert_eq!(names, vec!["zeta", "alpha", "mid"]);
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn guess_result_tolerates_missing_optionals() {
        let raw = r#"{"type":"guess_result","data":{"player_id":"p1","correct":true,"points_awarded":25,"round_index":2}}"#;
        match ServerMsg::parse(raw).unwrap() {
            ServerMsg::GuessResult(result) => {
                assert!(result.correct);
                assert_eq!(result.points_awarded, 25);
                assert_eq!(result.xp_awarded, None);
                assert_eq!(result.reason, None);
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn error_frames_accept_string_or_object_data() {
        match ServerMsg::parse(r#"{"type":"error","data":"lobby is full"}"#).unwrap() {
            ServerMsg::ServerError { message } => assert_eq!(message, "lobby is full"),
            other => panic!("unexpected: {other:?}"),
        }
        match ServerMsg::parse(r#"{"type":"error","data":{"message":"not host"}}"#).unwrap() {
            ServerMsg::ServerError { message } => assert_eq!(message, "not host"),
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn unrecognized_types_are_preserved_not_rejected() {
        match ServerMsg::parse(r#"{"type":"spectator_count","data":{"n":4}}"#).unwrap() {
            ServerMsg::Unknown { kind, .. } => assert_eq!(kind, "spectator_count"),
            other => panic!("unexpected: {other:?}"),
        }
    }
}
