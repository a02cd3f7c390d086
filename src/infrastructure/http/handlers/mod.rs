//! HTTP Handlers

mod ping;
mod session;
mod synthesis;
mod voice;
mod websocket;

pub use ping::*;
pub use session::*;
pub use synthesis::*;
pub use voice::*;
pub use websocket::*;
