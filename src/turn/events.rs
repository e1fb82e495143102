//! 轮事件：一轮对话的有序输出流
//!
//! ActionRequest / ToolResult 按 round 成对出现，Completed 恒为终点且仅一次；
//! 被取消的轮直接截断，不发 Completed。可序列化为 JSON（tag=type）供
//! 前端 / SSE 展示。

use serde::Serialize;
use serde_json::Value;

/// 动作类别：网关工具调用 或 委派 Agent
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    Gateway,
    Delegate,
}

impl ActionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActionKind::Gateway => "gateway",
            ActionKind::Delegate => "delegate",
        }
    }
}

/// 一轮的 token 用量（来自后端的增量统计）
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct TurnUsage {
    pub prompt_tokens: u64,
    pub completion_tokens: u64,
    pub total_tokens: u64,
}

/// 轮事件
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ChatStreamEvent {
    /// 即将执行一个动作（网关调用或委派）
    ActionRequest {
        round: usize,
        kind: ActionKind,
        target: String,
        params: Value,
    },
    /// 与同 round 的 ActionRequest 配对的结果；ok=false 时 content 为错误说明
    ToolResult {
        round: usize,
        target: String,
        ok: bool,
        content: String,
    },
    /// 终止事件：最终回答
    Completed {
        conversation_id: String,
        content: String,
        /// 本轮实际执行的动作轮数
        rounds: usize,
        usage: Option<TurnUsage>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_events_serialize_with_type_tag() {
        let event = ChatStreamEvent::ActionRequest {
            round: 1,
            kind: ActionKind::Gateway,
            target: "read".to_string(),
            params: json!({"address": "D100"}),
        };
        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(value["type"], "action_request");
        assert_eq!(value["kind"], "gateway");
        assert_eq!(value["params"]["address"], "D100");
    }
}
