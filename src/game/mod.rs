pub mod board;
pub mod error;
pub mod player;
pub mod resolver;
pub mod session;
pub mod timer;
