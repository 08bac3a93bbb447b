//! MUD web terminal client: chat log, stat HUD, minimap, command console.

pub mod app;
pub mod minimap;
pub mod protocol;
pub mod state;
