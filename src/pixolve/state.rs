//! Pixolve client state projector. Pure: every inbound message folds into the
//! state and yields the UI deltas for the caller to render.

use crate::pixolve::protocol::{ChatData, GuessResult, LobbyPlayer, Scores, ServerMsg};

/// Coarsest pixelation step; the first round frame renders at this value.
pub const PIXEL_START: u32 = 32;
pub const ROUND_DURATION_SECS: u32 = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Lobby,
    InGame,
    Finished,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RoundView {
    pub round_index: u32,
    pub image_id: String,
    pub pixelation: u32,
    pub time_remaining_secs: u32,
    pub ended: bool,
}

#[derive(Debug, Clone)]
pub struct ChatLine {
    pub player: String,
    pub text: String,
    pub ts: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UiEvent {
    PlayersChanged,
    ChatAppended,
    FeedAppended,
    ScoresChanged,
    RoundChanged,
    ImageChanged,
    GamePhaseChanged,
    /// Visual pulse for a correct guess by anyone.
    PulseCorrect,
    ErrorReported(String),
}

#[derive(Debug, Default)]
pub struct PixolveState {
    phase: Option<Phase>,
    pub players: Vec<LobbyPlayer>,
    pub chat: Vec<ChatLine>,
    /// Game-event feed (round markers, guess outcomes), separate from chat.
    pub feed: Vec<String>,
    scores: Scores,
    pub round: Option<RoundView>,
    pub game_id: Option<String>,
    /// Snapshot taken at `game_finished`; stale scoreboard frames arriving
    /// afterwards cannot change what the final screen shows.
    final_scores: Option<Scores>,
}

impl PixolveState {
    pub fn phase(&self) -> Phase {
        self.phase.unwrap_or(Phase::Lobby)
    }

    /// Folds one inbound message into the state. Messages for a finished
    /// game only touch chat and the feed.
    pub fn apply(&mut self, msg: ServerMsg) -> Vec<UiEvent> {
        let mut events = Vec::new();
        match msg {
            ServerMsg::LobbyUpdate { players } => {
                // Wholesale replacement; the server list is the membership.
                self.players = players;
                events.push(UiEvent::PlayersChanged);
            }
            ServerMsg::Chat(chat) => {
                self.push_chat(chat);
                events.push(UiEvent::ChatAppended);
            }
            ServerMsg::GameStarted { game_id } => {
                self.game_id = Some(game_id);
                self.set_phase(Phase::InGame, &mut events);
            }
            ServerMsg::StartRound {
                round_index,
                image_id,
            } => {
                self.round = Some(RoundView {
                    round_index,
                    image_id,
                    pixelation: PIXEL_START,
                    time_remaining_secs: ROUND_DURATION_SECS,
                    ended: false,
                });
                self.set_phase(Phase::InGame, &mut events);
                self.feed.push(format!("Round {round_index} started"));
                events.push(UiEvent::FeedAppended);
                events.push(UiEvent::RoundChanged);
                events.push(UiEvent::ImageChanged);
            }
            ServerMsg::RevealStep(step) => {
                if let Some(round) = self.round.as_mut() {
                    // Last value wins; replaying the same step is a no-op.
                    if round.pixelation != step.pixelation {
                        round.pixelation = step.pixelation;
                        events.push(UiEvent::ImageChanged);
                    }
                }
            }
            ServerMsg::GuessResult(result) => {
                let pulse = result.correct;
                self.feed.push(guess_feed_line(&result));
                events.push(UiEvent::FeedAppended);
                if pulse {
                    events.push(UiEvent::PulseCorrect);
                }
            }
            ServerMsg::ScoreboardUpdate { scores } => {
                // The frozen final snapshot outlives any late update.
                if self.final_scores.is_none() {
                    self.scores = scores;
                    events.push(UiEvent::ScoresChanged);
                }
            }
            ServerMsg::EndRound { round_index } => {
                if let Some(round) = self.round.as_mut() {
                    round.ended = true;
                    round.time_remaining_secs = 0;
                }
                self.feed.push(format!("Round {round_index} ended"));
                events.push(UiEvent::FeedAppended);
                events.push(UiEvent::RoundChanged);
            }
            ServerMsg::GameFinished { game_id, scores } => {
                self.game_id = Some(game_id);
                self.final_scores = Some(scores);
                self.round = None;
                self.set_phase(Phase::Finished, &mut events);
                events.push(UiEvent::ScoresChanged);
            }
            ServerMsg::ServerError { message } => {
                events.push(UiEvent::ErrorReported(message));
            }
            ServerMsg::Unknown { .. } => {}
        }
        events
    }

    /// One-second countdown tick; returns true when the display changed.
    pub fn tick_second(&mut self) -> bool {
        match self.round.as_mut() {
            Some(round) if !round.ended && round.time_remaining_secs > 0 => {
                round.time_remaining_secs -= 1;
                true
            }
            _ => false,
        }
    }

    /// Unconditional append. Identical lines are all kept; the protocol
    /// carries no message ids to reconcile against.
    pub fn push_chat(&mut self, chat: ChatData) {
        self.chat.push(ChatLine {
            player: chat.player,
            text: chat.text,
            ts: chat.ts,
        });
    }

    /// Rows sorted by score descending. The sort is stable, so equal scores
    /// keep the server's emission order.
    pub fn standings(&self) -> Scores {
        let mut rows = self
            .final_scores
            .clone()
            .unwrap_or_else(|| self.scores.clone());
        rows.sort_by(|a, b| b.1.cmp(&a.1));
        rows
    }

    pub fn is_host(&self, player_id: &str, host_id: &str) -> bool {
        player_id == host_id
    }

    pub fn can_start(&self, player_id: &str, host_id: &str) -> bool {
        self.is_host(player_id, host_id) && self.players.len() >= 2
    }

    fn set_phase(&mut self, phase: Phase, events: &mut Vec<UiEvent>) {
        if self.phase != Some(phase) {
            self.phase = Some(phase);
            events.push(UiEvent::GamePhaseChanged);
        }
    }
}

fn guess_feed_line(result: &GuessResult) -> String {
    if result.correct {
        format!(
            "\u{2713} {} got it! +{}pts",
            result.player_id, result.points_awarded
        )
    } else {
        format!("\u{2717} {} guessed wrong", result.player_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pixolve::protocol::ServerMsg;

    fn parse(raw: &str) -> ServerMsg {
        ServerMsg::parse(raw).unwrap()
    }

    #[test]
    fn lobby_update_replaces_rather_than_merges() {
        let mut state = PixolveState::default();
        state.apply(parse(
            r#"{"type":"lobby_update","data":{"players":[
                {"id":"p1","username":"riko"},{"id":"p2","username":"reg"}]}}"#,
        ));
        state.apply(parse(
            r#"{"type":"lobby_update","data":{"players":[{"id":"p2","username":"reg","ready":true}]}}"#,
        ));
        assert_eq!(state.players.len(), 1);
        assert!(state.players[0].ready);
    }

    #[test]
    fn start_round_resets_pixelation_and_timer() {
        let mut state = PixolveState::default();
        state.apply(parse(r#"{"type":"game_started","data":{"game_id":"g1"}}"#));
        state.apply(parse(
            r#"{"type":"reveal_step","data":{"step_index":3,"pixelation":4,"time_offset":15.0}}"#,
        ));
        let events = state.apply(parse(
            r#"{"type":"start_round","data":{"round_index":1,"image_id":"dogs/corgi.png"}}"#,
        ));
        let round = state.round.as_ref().unwrap();
        assert_eq!(round.pixelation, PIXEL_START);
        assert_eq!(round.time_remaining_secs, ROUND_DURATION_SECS);
        assert!(!round.ended);
        assert!(events.contains(&UiEvent::ImageChanged));
    }

    #[test]
    fn repeated_reveal_step_is_idempotent() {
        let mut state = PixolveState::default();
        state.apply(parse(
            r#"{"type":"start_round","data":{"round_index":1,"image_id":"x"}}"#,
        ));
        let step = r#"{"type":"reveal_step","data":{"step_index":2,"pixelation":8,"time_offset":10.0}}"#;
        let first = state.apply(parse(step));
        let second = state.apply(parse(step));
        assert!(first.contains(&UiEvent::ImageChanged));
        assert!(second.is_empty());
        assert_eq!(state.round.as_ref().unwrap().pixelation, 8);
    }

    #[test]
    fn out_of_order_reveal_takes_the_last_value() {
        let mut state = PixolveState::default();
        state.apply(parse(
            r#"{"type":"start_round","data":{"round_index":1,"image_id":"x"}}"#,
        ));
        state.apply(parse(
            r#"{"type":"reveal_step","data":{"step_index":3,"pixelation":4,"time_offset":15.0}}"#,
        ));
        state.apply(parse(
            r#"{"type":"reveal_step","data":{"step_index":2,"pixelation":8,"time_offset":10.0}}"#,
        ));
        assert_eq!(state.round.as_ref().unwrap().pixelation, 8);
    }

    #[test]
    fn final_scores_are_immune_to_stale_scoreboard_updates() {
        let mut state = PixolveState::default();
        state.apply(parse(
            r#"{"type":"game_finished","data":{"game_id":"g1","scores":{"riko":50,"reg":30}}}"#,
        ));
        assert_eq!(state.phase(), Phase::Finished);
        let stale = state.apply(parse(
            r#"{"type":"scoreboard_update","data":{"scores":{"riko":10}}}"#,
        ));
        assert!(stale.is_empty());
        assert_eq!(
            state.standings(),
            vec![("riko".to_string(), 50), ("reg".to_string(), 30)]
        );
    }

    #[test]
    fn tied_scores_keep_server_order() {
        let mut state = PixolveState::default();
        state.apply(parse(
            r#"{"type":"scoreboard_update","data":{"scores":{"zeta":30,"alpha":30,"mid":10}}}"#,
        ));
        let names: Vec<String> = state.standings().into_iter().map(|(n, _)| n).collect();
        assert_eq!(names, vec!["zeta", "alpha", "mid"]);
    }

    #[test]
    fn identical_chat_messages_are_both_kept() {
        let mut state = PixolveState::default();
        let frame = r#"{"type":"chat","data":{"player":"riko","text":"hi","ts":12.5}}"#;
        state.apply(parse(frame));
        state.apply(parse(frame));
        assert_eq!(state.chat.len(), 2);
    }

    #[test]
    fn guess_results_feed_and_pulse() {
        let mut state = PixolveState::default();
        let events = state.apply(parse(
            r#"{"type":"guess_result","data":{"player_id":"riko","correct":true,"points_awarded":25,"round_index":1}}"#,
        ));
        assert!(events.contains(&UiEvent::PulseCorrect));
        assert_eq!(state.feed.last().unwrap(), "\u{2713} riko got it! +25pts");

        let events = state.apply(parse(
            r#"{"type":"guess_result","data":{"player_id":"reg","correct":false,"points_awarded":0,"round_index":1}}"#,
        ));
        assert!(!events.contains(&UiEvent::PulseCorrect));
        assert_eq!(state.feed.last().unwrap(), "\u{2717} reg guessed wrong");
    }

    #[test]
    fn countdown_stops_at_zero_and_after_round_end() {
        let mut state = PixolveState::default();
        state.apply(parse(
            r#"{"type":"start_round","data":{"round_index":1,"image_id":"x"}}"#,
        ));
        for _ in 0..ROUND_DURATION_SECS {
            assert!(state.tick_second());
        }
        assert!(!state.tick_second());

        state.apply(parse(
            r#"{"type":"start_round","data":{"round_index":2,"image_id":"y"}}"#,
        ));
        state.apply(parse(r#"{"type":"end_round","data":{"round_index":2}}"#));
        assert!(!state.tick_second());
    }
}
