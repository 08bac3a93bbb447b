pub mod api;
pub mod app;
pub mod protocol;
pub mod state;
