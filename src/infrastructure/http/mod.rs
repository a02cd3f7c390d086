//! HTTP Layer - RESTful API + WebSocket
//!
//! 会话、标注、音色、合成四组接口，外加按会话推送事件的 WebSocket

pub mod dto;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod routes;
pub mod server;
pub mod state;

pub use error::ApiError;
pub use routes::create_routes;
pub use server::HttpServer;
pub use state::{AppDeps, AppState};
