//! LLM 客户端抽象
//!
//! 所有后端（OpenAI 兼容 / DeepSeek / Mock）实现 LlmClient；
//! 对话后端与专家 Agent 都只依赖这个接口。

use async_trait::async_trait;

use crate::memory::Message;

/// LLM 客户端 trait：输入完整消息序列，返回一条文本回复
#[async_trait]
pub trait LlmClient: Send + Sync {
    async fn complete(&self, messages: &[Message]) -> Result<String, String>;

    /// 累计 token 用量 (prompt_tokens, completion_tokens, total_tokens)；
    /// 默认返回 (0, 0, 0)，具体实现可覆盖
    fn token_usage(&self) -> (u64, u64, u64) {
        (0, 0, 0)
    }
}
