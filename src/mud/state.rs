//! MUD client state: server-pushed player/room snapshots, the ordered chat
//! log, and the display-only values derived from them.

use std::collections::BTreeMap;

use serde::Deserialize;

use crate::mud::protocol::ServerMsg;

pub const DEFAULT_CHAT_CHANNEL: &str = "channel-say";
pub const SYSTEM_CHAT_CHANNEL: &str = "channel-system";

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Stats {
    #[serde(default)]
    pub hp: Option<i64>,
    #[serde(default)]
    pub max_hp: Option<i64>,
    #[serde(rename = "str", default)]
    pub strength: i64,
    #[serde(default)]
    pub dex: i64,
    #[serde(default)]
    pub int: i64,
    #[serde(default)]
    pub vit: i64,
}

impl Stats {
    /// HP falls back to a vitality-derived value when the server omits it.
    pub fn current_hp(&self) -> i64 {
        self.hp.unwrap_or(self.vit * 10)
    }

    pub fn max_hp(&self) -> i64 {
        self.max_hp.unwrap_or(self.vit * 10)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ItemSlot {
    pub item_id: String,
    #[serde(default = "default_qty")]
    pub qty: i64,
}

fn default_qty() -> i64 {
    1
}

#[derive(Debug, Clone, Deserialize)]
pub struct Player {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub race: String,
    pub level: i64,
    pub exp: i64,
    #[serde(default)]
    pub stats: Stats,
    #[serde(default)]
    pub inventory: Vec<ItemSlot>,
}

impl Player {
    /// Composite shown on the HUD; recomputed every render, never sent.
    pub fn power_level(&self) -> i64 {
        (self.stats.strength + self.stats.dex + self.stats.int + self.stats.vit)
            * 10
            * self.level
    }

    pub fn next_level_exp(&self) -> i64 {
        self.level * 1000
    }

    pub fn exp_percent(&self) -> f64 {
        let next = self.next_level_exp();
        if next <= 0 {
            return 0.0;
        }
        ((self.exp as f64 / next as f64) * 100.0).min(100.0)
    }

    pub fn hp_percent(&self) -> f64 {
        let max = self.stats.max_hp();
        if max <= 0 {
            return 0.0;
        }
        ((self.stats.current_hp() as f64 / max as f64) * 100.0).clamp(0.0, 100.0)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Room {
    pub id: String,
    pub name: String,
    pub description: String,
    #[serde(default)]
    pub mobs: Vec<String>,
    /// direction -> destination room id.
    #[serde(default)]
    pub exits: BTreeMap<String, String>,
}

const ROOM_IMAGE_FALLBACK: &str = "https://placehold.co/800x400/0f172a/cbd5e1?text=Zone";

const ROOM_IMAGES: &[(&str, &str)] = &[
    ("wasteland", "https://placehold.co/800x400/3f2e18/a88b68?text=Wasteland"),
    ("city", "https://placehold.co/800x400/1e293b/94a3b8?text=West+City"),
    ("capsule", "https://placehold.co/800x400/e2e8f0/0f172a?text=Capsule+Corp"),
    ("frieza", "https://placehold.co/800x400/311b92/b39ddb?text=Frieza+Ship"),
    ("start", "https://placehold.co/800x400/22c55e/f0fdf4?text=Safe+Zone"),
];

/// Mock zone art keyed on room-id substrings.
pub fn room_image_url(room_id: &str) -> &'static str {
    ROOM_IMAGES
        .iter()
        .find(|(needle, _)| room_id.contains(needle))
        .map(|(_, url)| *url)
        .unwrap_or(ROOM_IMAGE_FALLBACK)
}

#[derive(Debug, Clone)]
pub struct ChatLine {
    pub sender: String,
    pub text: String,
    pub channel: String,
    /// Wall-clock "HH:MM" captured at append time.
    pub timestamp: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MudEvent {
    StatsChanged,
    RoomChanged,
    LineAppended,
}

#[derive(Debug, Default)]
pub struct MudState {
    pub player: Option<Player>,
    pub room: Option<Room>,
    pub log: Vec<ChatLine>,
}

impl MudState {
    /// Projects one inbound message into the state. Chat lines are appended
    /// unconditionally: the server is authoritative and the client never
    /// deduplicates against its own optimistic echo.
    pub fn apply(&mut self, msg: ServerMsg, timestamp: &str) -> Vec<MudEvent> {
        let mut events = Vec::new();
        match msg {
            ServerMsg::Chat(chat) => {
                self.log.push(ChatLine {
                    sender: chat.sender,
                    text: chat.content,
                    channel: chat
                        .channel
                        .unwrap_or_else(|| DEFAULT_CHAT_CHANNEL.to_string()),
                    timestamp: timestamp.to_string(),
                });
                events.push(MudEvent::LineAppended);
            }
            ServerMsg::Gamestate(update) => {
                if let Some(player) = update.player {
                    self.player = Some(player);
                    events.push(MudEvent::StatsChanged);
                }
                if let Some(room) = update.room {
                    self.room = Some(room);
                    events.push(MudEvent::RoomChanged);
                }
            }
            ServerMsg::Unknown { .. } => {}
        }
        events
    }

    /// Local notice line ("Not connected.", link status, ...).
    pub fn push_system(&mut self, text: &str, timestamp: &str) {
        self.log.push(ChatLine {
            sender: "System".to_string(),
            text: text.to_string(),
            channel: SYSTEM_CHAT_CHANNEL.to_string(),
            timestamp: timestamp.to_string(),
        });
    }

    /// Display line for a frame that was not valid JSON.
    pub fn push_raw_fallback(&mut self, text: &str, timestamp: &str) {
        self.log.push(ChatLine {
            sender: "Unknown".to_string(),
            text: text.to_string(),
            channel: "channel-world".to_string(),
            timestamp: timestamp.to_string(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mud::protocol::ServerMsg;

    fn player_json() -> &'static str {
        r#"{"type":"gamestate","player":{"id":7,"name":"Vex","race":"saiyan","level":3,"exp":1200,
            "stats":{"str":10,"dex":8,"int":6,"vit":9},
            "inventory":[{"item_id":"senzu_bean","qty":2}]}}"#
    }

    #[test]
    fn power_level_and_thresholds_are_derived_from_profile_fields() {
        let mut state = MudState::default();
        state.apply(ServerMsg::parse(player_json()).unwrap(), "12:00");
        let player = state.player.as_ref().unwrap();
        assert_eq!(player.power_level(), (10 + 8 + 6 + 9) * 10 * 3);
        assert_eq!(player.next_level_exp(), 3000);
        assert_eq!(player.stats.current_hp(), 90);
        assert_eq!(player.stats.max_hp(), 90);
    }

    #[test]
    fn explicit_hp_overrides_the_vitality_fallback() {
        let stats = Stats {
            hp: Some(42),
            max_hp: Some(120),
            vit: 9,
            ..Stats::default()
        };
        assert_eq!(stats.current_hp(), 42);
        assert_eq!(stats.max_hp(), 120);
    }

    #[test]
    fn gamestate_with_only_room_leaves_player_untouched() {
        let mut state = MudState::default();
        state.apply(ServerMsg::parse(player_json()).unwrap(), "12:00");
        let events = state.apply(
            ServerMsg::parse(
                r#"{"type":"gamestate","room":{"id":"west_city","name":"West City","description":"Busy."}}"#,
            )
            .unwrap(),
            "12:01",
        );
        assert_eq!(events, vec![MudEvent::RoomChanged]);
        assert_eq!(state.player.as_ref().unwrap().name, "Vex");
        assert_eq!(state.room.as_ref().unwrap().name, "West City");
    }

    #[test]
    fn identical_chat_lines_are_both_kept() {
        let mut state = MudState::default();
        let frame = r#"{"type":"chat","sender":"Vex","content":"hello"}"#;
        state.apply(ServerMsg::parse(frame).unwrap(), "12:00");
        state.apply(ServerMsg::parse(frame).unwrap(), "12:00");
        assert_eq!(state.log.len(), 2);
        assert_eq!(state.log[0].channel, DEFAULT_CHAT_CHANNEL);
    }

    #[test]
    fn unknown_messages_change_nothing() {
        let mut state = MudState::default();
        let events = state.apply(
            ServerMsg::parse(r#"{"type":"weather","data":{}}"#).unwrap(),
            "12:00",
        );
        assert!(events.is_empty());
        assert!(state.log.is_empty());
    }

    #[test]
    fn room_images_match_on_id_substring() {
        assert!(room_image_url("north_wasteland").contains("Wasteland"));
        assert!(room_image_url("west_city_gate").contains("West+City"));
        assert!(room_image_url("nowhere").contains("Zone"));
    }
}
