//! 智能体层：能力接口、目录与内置专家
//!
//! Agent 是可独立调用的命名能力单元（name / description / execute），
//! 进程级单例、可被多轮并发调用；AgentCatalog 启动时一次性构建，运行期只读。

pub mod catalog;
pub mod echo;
pub mod specialist;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::core::AgentError;

/// 单次 Agent 调用的结果：来源 Agent 名 + 文本内容
#[derive(Debug, Clone)]
pub struct AgentResult {
    pub agent: String,
    pub content: String,
}

/// 能力接口；实现不得持有轮内可变状态，execute 须及时响应取消
#[async_trait]
pub trait Agent: Send + Sync {
    /// 目录内大小写不敏感唯一
    fn name(&self) -> &str;

    /// 能力描述（用于后端提示与目录展示）
    fn description(&self) -> &str;

    async fn execute(
        &self,
        question: &str,
        cancel: CancellationToken,
    ) -> Result<AgentResult, AgentError>;
}

pub use catalog::AgentCatalog;
pub use echo::EchoAgent;
pub use specialist::{iai_agent, manual_agent, plc_agent, AnswerStyle, SpecialistAgent};
