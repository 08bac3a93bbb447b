//! End-to-end projections of realistic frame sequences, as the client would
//! receive them over a game.

use playdeck::pixolve::protocol::ServerMsg;
use playdeck::pixolve::state::{Phase, PixolveState, PIXEL_START};

fn feed(state: &mut PixolveState, frames: &[&str]) {
    for frame in frames {
        state.apply(ServerMsg::parse(frame).unwrap());
    }
}

#[test]
fn full_game_flow_from_lobby_to_final_screen() {
    let mut state = PixolveState::default();
    feed(
        &mut state,
        &[
            r#"{"type":"lobby_update","data":{"players":[
                {"id":"riko","username":"riko"},{"id":"reg","username":"reg"}]}}"#,
            r#"{"type":"game_started","data":{"game_id":"g1"}}"#,
            r#"{"type":"start_round","data":{"round_index":1,"image_id":"dogs/corgi.png"}}"#,
            r#"{"type":"reveal_step","data":{"step_index":1,"pixelation":16,"time_offset":5.0}}"#,
            r#"{"type":"guess_result","data":{"player_id":"riko","correct":false,"points_awarded":0,"round_index":1}}"#,
            r#"{"type":"reveal_step","data":{"step_index":2,"pixelation":8,"time_offset":10.0}}"#,
            r#"{"type":"guess_result","data":{"player_id":"riko","correct":true,"points_awarded":25,"round_index":1}}"#,
            r#"{"type":"scoreboard_update","data":{"scores":{"riko":25,"reg":0}}}"#,
            r#"{"type":"end_round","data":{"round_index":1}}"#,
            r#"{"type":"start_round","data":{"round_index":2,"image_id":"dogs/shiba.png"}}"#,
        ],
    );

    assert_eq!(state.phase(), Phase::InGame);
    let round = state.round.as_ref().unwrap();
    assert_eq!(round.round_index, 2);
    assert_eq!(round.pixelation, PIXEL_START);
    assert!(!round.ended);
    assert_eq!(state.feed.len(), 5);

    feed(
        &mut state,
        &[
            r#"{"type":"guess_result","data":{"player_id":"reg","correct":true,"points_awarded":40,"round_index":2}}"#,
            r#"{"type":"end_round","data":{"round_index":2}}"#,
            r#"{"type":"game_finished","data":{"game_id":"g1","scores":{"riko":25,"reg":40}}}"#,
        ],
    );

    assert_eq!(state.phase(), Phase::Finished);
    assert!(state.round.is_none());
    assert_eq!(
        state.standings(),
        vec![("reg".to_string(), 40), ("riko".to_string(), 25)]
    );
}

#[test]
fn late_scoreboard_after_game_finished_cannot_change_the_final_screen() {
    let mut state = PixolveState::default();
    feed(
        &mut state,
        &[
            r#"{"type":"game_started","data":{"game_id":"g1"}}"#,
            r#"{"type":"game_finished","data":{"game_id":"g1","scores":{"riko":50,"reg":30}}}"#,
            // Stale frame that was in flight when the game ended.
            r#"{"type":"scoreboard_update","data":{"scores":{"riko":10,"reg":5}}}"#,
        ],
    );
    assert_eq!(
        state.standings(),
        vec![("riko".to_string(), 50), ("reg".to_string(), 30)]
    );
}

#[test]
fn locally_appended_chat_and_server_echo_are_both_kept() {
    let mut state = PixolveState::default();
    state.push_chat(playdeck::pixolve::protocol::ChatData {
        player: "riko".to_string(),
        text: "gg".to_string(),
        ts: None,
    });
    feed(
        &mut state,
        &[r#"{"type":"chat","data":{"player":"riko","text":"gg","ts":99.0}}"#],
    );
    assert_eq!(state.chat.len(), 2);
    assert_eq!(state.chat[0].text, state.chat[1].text);
}

#[test]
fn unknown_frame_types_do_not_disturb_a_running_game() {
    let mut state = PixolveState::default();
    feed(
        &mut state,
        &[
            r#"{"type":"start_round","data":{"round_index":1,"image_id":"x"}}"#,
            r#"{"type":"spectator_joined","data":{"id":"ozen"}}"#,
        ],
    );
    assert_eq!(state.phase(), Phase::InGame);
    assert_eq!(state.round.as_ref().unwrap().round_index, 1);
}
