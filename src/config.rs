//! Compile-time endpoints and storage keys. Base paths are fixed at build
//! time; they are not negotiated at runtime.

// --- MUD ---
pub const MUD_API_BASE: &str = "/api/v1";
pub const MUD_WS_BASE: &str = "ws://localhost:8000/ws";
pub const MUD_TOKEN_KEY: &str = "mud_token";
pub const MUD_ENTRY_PATH: &str = "/";
pub const MUD_CREATE_CHARACTER_PATH: &str = "/create-character";

// --- Pixolve ---
pub const PIXOLVE_WS_URL: &str = "ws://localhost:8000/ws";
pub const PIXOLVE_TOKEN_KEY: &str = "pixolve_token";
pub const PIXOLVE_USERNAME_KEY: &str = "pixolve_username";
pub const PIXOLVE_ENTRY_PATH: &str = "/";
