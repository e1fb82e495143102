//! Mock LLM 客户端（用于测试与无 Key 运行）
//!
//! 最后一条 User 消息含寄存器地址（如 D100）时返回网关读取动作 JSON，
//! 已带 Observation 时返回总结性回答，便于离线跑通完整编排链路。

use async_trait::async_trait;

use crate::llm::LlmClient;
use crate::memory::{Message, Role};

/// Mock 客户端：按最后一条 User 消息决定动作或回答
#[derive(Debug, Default)]
pub struct MockLlmClient;

/// 提取三菱风格的寄存器地址 token（D/M/X/Y + 数字）
fn find_register_token(text: &str) -> Option<String> {
    for word in text.split(|c: char| !c.is_ascii_alphanumeric()) {
        let mut chars = word.chars();
        if let Some(head) = chars.next() {
            let rest = chars.as_str();
            if matches!(head, 'D' | 'M' | 'X' | 'Y')
                && !rest.is_empty()
                && rest.chars().all(|c| c.is_ascii_digit())
            {
                return Some(word.to_string());
            }
        }
    }
    None
}

#[async_trait]
impl LlmClient for MockLlmClient {
    async fn complete(&self, messages: &[Message]) -> Result<String, String> {
        let last_user = messages
            .iter()
            .rev()
            .find(|m| m.role == Role::User)
            .map(|m| m.content.as_str())
            .unwrap_or("(no input)");

        if last_user.starts_with("Observation") {
            return Ok(format!("根据执行结果：{}", last_user));
        }

        if let Some(address) = find_register_token(last_user) {
            return Ok(format!(
                r#"{{"action": "gateway", "target": "read", "params": {{"address": "{}"}}}}"#,
                address
            ));
        }

        Ok(format!("(mock) {}", last_user))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find_register_token() {
        assert_eq!(
            find_register_token("Please read D100"),
            Some("D100".to_string())
        );
        assert_eq!(find_register_token("读一下 M20 的值"), Some("M20".to_string()));
        assert_eq!(find_register_token("你好"), None);
        // 裸字母不算地址
        assert_eq!(find_register_token("D is a letter"), None);
    }

    #[tokio::test]
    async fn test_register_question_yields_gateway_action() {
        let client = MockLlmClient;
        let output = client
            .complete(&[Message::user("Please read D100")])
            .await
            .unwrap();
        assert!(output.contains(r#""action": "gateway""#));
        assert!(output.contains("D100"));
    }

    #[tokio::test]
    async fn test_observation_yields_plain_answer() {
        let client = MockLlmClient;
        let output = client
            .complete(&[Message::user("Observation from read: D100 = 42")])
            .await
            .unwrap();
        assert!(output.contains("42"));
        assert!(!output.contains("\"action\""));
    }
}
