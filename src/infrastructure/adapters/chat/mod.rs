//! Chat Adapter - 对话模型客户端实现

mod fake_chat_client;
mod openai_chat_client;

pub use fake_chat_client::FakeChatClient;
pub use openai_chat_client::{OpenAiChatClient, OpenAiChatClientConfig};
