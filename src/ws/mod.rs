//! WebSocket protocol, upgrade handler and per-connection sessions

pub mod handler;
pub mod protocol;
pub mod session;

pub use protocol::{Message, PlayerId, Record, User};
pub use session::{Session, SessionEnd, SessionOptions};
