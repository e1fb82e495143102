//! 记忆层：单轮对话历史（短期）
//!
//! 跨轮持久化由外部会话存储负责（按会话 id 追加写），本层只维护一轮内
//! 由该轮独占的消息序列。

pub mod conversation;

pub use conversation::{ConversationMemory, Message, Role};
