//! Persistence Layer - 数据持久化
//!
//! Sled 存储：全局角色表与每个会话的行注解

mod state_store;

pub use state_store::SledStateStore;
