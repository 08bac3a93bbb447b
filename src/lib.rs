use wasm_bindgen::prelude::*;

pub mod channel;
pub mod config;
pub mod dom;
pub mod mud;
pub mod pixolve;
pub mod session;

/// Boots the MUD terminal client against the game page.
#[wasm_bindgen]
pub fn run_mud() -> Result<(), JsValue> {
    mud::app::run()
}

/// Boots the Pixolve lobby/game client against the Pixolve page.
#[wasm_bindgen]
pub fn run_pixolve() -> Result<(), JsValue> {
    pixolve::app::run()
}
