//! 对话后端：每轮的下一步决策
//!
//! ChatBackend 对当前对话给出 FinalAnswer 或 ActionProposal。
//! LlmChatBackend 基于 LlmClient 实现：动态 system（动作协议 + 可委派
//! Agent 目录）-> complete -> parse_backend_output 从文本提取 JSON 动作，
//! 非 JSON 输出视为最终回答。

use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;

use crate::agents::AgentCatalog;
use crate::llm::LlmClient;
use crate::memory::Message;
use crate::turn::events::ActionKind;

/// 后端提议的动作：类别 + 目标（网关 op 名或 Agent 名）+ 参数
#[derive(Debug, Clone)]
pub struct ActionProposal {
    pub kind: ActionKind,
    pub target: String,
    pub params: Value,
}

/// 后端对一轮的裁决
#[derive(Debug, Clone)]
pub enum BackendDecision {
    /// 直接给出最终回答
    FinalAnswer(String),
    /// 先执行一个动作，结果回填后再询问
    Action(ActionProposal),
}

/// 对话后端接口：异步，整体不可用时返回 Err
#[async_trait]
pub trait ChatBackend: Send + Sync {
    async fn decide(&self, messages: &[Message]) -> Result<BackendDecision, String>;

    /// 累计 token 用量，默认无统计
    fn token_usage(&self) -> (u64, u64, u64) {
        (0, 0, 0)
    }
}

/// LLM 输出中的动作 JSON：
/// {"action": "gateway"|"delegate", "target": "...", "params": {...}}
#[derive(Debug, Deserialize)]
struct RawAction {
    action: String,
    target: String,
    #[serde(default)]
    params: Value,
}

/// 从 LLM 文本提取动作：```json 围栏或首尾花括号跨度；
/// 无 JSON、解析失败或 action 未知时整段文本即最终回答。
pub fn parse_backend_output(output: &str) -> BackendDecision {
    let trimmed = output.trim();

    let json_str = if let Some(start) = trimmed.find("```json") {
        let rest = &trimmed[start + 7..];
        rest.find("```")
            .map(|end| rest[..end].trim())
            .unwrap_or(rest.trim())
    } else if let (Some(start), Some(end)) = (trimmed.find('{'), trimmed.rfind('}')) {
        if start < end {
            &trimmed[start..=end]
        } else {
            return BackendDecision::FinalAnswer(trimmed.to_string());
        }
    } else {
        return BackendDecision::FinalAnswer(trimmed.to_string());
    };

    match serde_json::from_str::<RawAction>(json_str) {
        Ok(raw) => {
            let kind = match raw.action.to_lowercase().as_str() {
                "gateway" | "tool" => ActionKind::Gateway,
                "delegate" => ActionKind::Delegate,
                _ => return BackendDecision::FinalAnswer(trimmed.to_string()),
            };
            if raw.target.trim().is_empty() {
                return BackendDecision::FinalAnswer(trimmed.to_string());
            }
            BackendDecision::Action(ActionProposal {
                kind,
                target: raw.target,
                params: raw.params,
            })
        }
        Err(_) => BackendDecision::FinalAnswer(trimmed.to_string()),
    }
}

/// 生成后端 system prompt：动作协议说明 + 可委派 Agent 目录
fn build_system_prompt(catalog: &AgentCatalog) -> String {
    let mut prompt = String::from(
        "You are an industrial-equipment assistant. Decide the next step for the user's question.\n\
         To call the device gateway, output ONLY JSON: \
         {\"action\": \"gateway\", \"target\": \"read\"|\"write\", \"params\": {\"address\": \"D100\", \"value\": 1}}\n\
         To delegate to a specialist agent, output ONLY JSON: \
         {\"action\": \"delegate\", \"target\": \"<agentName>\", \"params\": {\"question\": \"...\"}}\n\
         Otherwise answer the user directly in plain text.\n\nAvailable agents:\n",
    );
    for (name, description) in catalog.descriptions() {
        prompt.push_str(&format!("- {}: {}\n", name, description));
    }
    prompt
}

/// LLM 驱动的对话后端
pub struct LlmChatBackend {
    llm: Arc<dyn LlmClient>,
    system_prompt: String,
}

impl LlmChatBackend {
    pub fn new(llm: Arc<dyn LlmClient>, catalog: &AgentCatalog) -> Self {
        let system_prompt = build_system_prompt(catalog);
        Self { llm, system_prompt }
    }
}

#[async_trait]
impl ChatBackend for LlmChatBackend {
    async fn decide(&self, messages: &[Message]) -> Result<BackendDecision, String> {
        let mut full = vec![Message::system(self.system_prompt.clone())];
        full.extend_from_slice(messages);
        let output = self.llm.complete(&full).await?;
        Ok(parse_backend_output(&output))
    }

    fn token_usage(&self) -> (u64, u64, u64) {
        self.llm.token_usage()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_gateway_action() {
        let output = r#"{"action": "gateway", "target": "read", "params": {"address": "D100"}}"#;
        match parse_backend_output(output) {
            BackendDecision::Action(p) => {
                assert_eq!(p.kind, ActionKind::Gateway);
                assert_eq!(p.target, "read");
                assert_eq!(p.params["address"], "D100");
            }
            other => panic!("unexpected decision: {:?}", other),
        }
    }

    #[test]
    fn test_parse_delegate_action_in_fence() {
        let output = "好的，交给专家。\n```json\n{\"action\": \"delegate\", \"target\": \"iaiAgent\", \"params\": {}}\n```";
        match parse_backend_output(output) {
            BackendDecision::Action(p) => {
                assert_eq!(p.kind, ActionKind::Delegate);
                assert_eq!(p.target, "iaiAgent");
            }
            other => panic!("unexpected decision: {:?}", other),
        }
    }

    #[test]
    fn test_plain_text_is_final_answer() {
        match parse_backend_output("D100 当前值为 42。") {
            BackendDecision::FinalAnswer(text) => assert!(text.contains("42")),
            other => panic!("unexpected decision: {:?}", other),
        }
    }

    #[test]
    fn test_unknown_action_falls_back_to_final_answer() {
        let output = r#"{"action": "reboot", "target": "plc", "params": {}}"#;
        assert!(matches!(
            parse_backend_output(output),
            BackendDecision::FinalAnswer(_)
        ));
    }

    #[test]
    fn test_malformed_json_falls_back_to_final_answer() {
        let output = "数值区间为 {0, 1, 2}，属正常范围";
        assert!(matches!(
            parse_backend_output(output),
            BackendDecision::FinalAnswer(_)
        ));
    }

    #[test]
    fn test_empty_target_falls_back_to_final_answer() {
        let output = r#"{"action": "delegate", "target": "", "params": {}}"#;
        assert!(matches!(
            parse_backend_output(output),
            BackendDecision::FinalAnswer(_)
        ));
    }
}
