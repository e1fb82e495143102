//! 轮编排层：事件协议、后端决策与单轮主循环
//!
//! 一次 handle_turn = 一个 tokio 任务 + 一条事件流；backend / catalog /
//! policy / gateway 都是进程级只读组件，轮与轮之间没有共享可变状态。

pub mod backend;
pub mod events;
pub mod orchestrator;

/// 请求方身份：调用方创建，整轮只读传递
#[derive(Debug, Clone)]
pub struct UserContext {
    pub user_id: String,
    pub display_name: String,
}

impl UserContext {
    pub fn new(user_id: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            display_name: display_name.into(),
        }
    }
}

/// 一轮请求：身份 + 可选会话 id（缺省则由编排器生成）+ 问题文本
#[derive(Debug, Clone)]
pub struct TurnRequest {
    pub user: UserContext,
    pub conversation_id: Option<String>,
    pub text: String,
}

pub use backend::{
    parse_backend_output, ActionProposal, BackendDecision, ChatBackend, LlmChatBackend,
};
pub use events::{ActionKind, ChatStreamEvent, TurnUsage};
pub use orchestrator::{OrchestratorConfig, TurnOrchestrator};
