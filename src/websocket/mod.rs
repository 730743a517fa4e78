pub mod game_handlers;
pub mod handler;

pub use game_handlers::{schedule_clock, schedule_stun_expiry};
pub use handler::{broadcast_to_session, discard_unjoined_sessions, ws_index, PaintWebSocket};
