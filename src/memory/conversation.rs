//! 单轮对话历史
//!
//! 一轮内的消息序列（用户提问、动作观察、后端回答），由该轮任务独占，
//! 超出 max_turns*2 条时自动丢弃最旧部分。

use serde::{Deserialize, Serialize};

/// 消息角色（与 LLM API 一致）
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Role {
    User,
    Assistant,
    System,
}

/// 单条消息
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }
}

/// 一轮内的对话历史：保留最近 max_turns 轮（约 max_turns*2 条消息）
#[derive(Clone, Debug)]
pub struct ConversationMemory {
    messages: Vec<Message>,
    max_turns: usize,
}

impl ConversationMemory {
    pub fn new(max_turns: usize) -> Self {
        Self {
            messages: Vec::new(),
            max_turns,
        }
    }

    pub fn push(&mut self, msg: Message) {
        self.messages.push(msg);
        self.prune();
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// 最近一条 User 消息的内容（动作观察也以 User 角色回填）
    pub fn last_user(&self) -> Option<&str> {
        self.messages
            .iter()
            .rev()
            .find(|m| m.role == Role::User)
            .map(|m| m.content.as_str())
    }

    pub fn clear(&mut self) {
        self.messages.clear();
    }

    /// 超出 max_turns*2 时丢弃最旧的消息
    fn prune(&mut self) {
        let keep = self.max_turns * 2;
        if self.messages.len() > keep {
            self.messages.drain(..self.messages.len() - keep);
        }
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prune_keeps_most_recent() {
        let mut memory = ConversationMemory::new(2);
        for i in 0..10 {
            memory.push(Message::user(format!("q{}", i)));
        }
        assert_eq!(memory.len(), 4);
        assert_eq!(memory.messages()[0].content, "q6");
    }

    #[test]
    fn test_last_user_skips_assistant() {
        let mut memory = ConversationMemory::new(10);
        memory.push(Message::user("读取 D100"));
        memory.push(Message::assistant("Action read | Result: D100 = 42"));
        assert_eq!(memory.last_user(), Some("读取 D100"));
    }

    #[test]
    fn test_last_user_empty() {
        let memory = ConversationMemory::new(10);
        assert!(memory.last_user().is_none());
        assert!(memory.is_empty());
    }
}
