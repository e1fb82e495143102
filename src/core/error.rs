//! 错误类型
//!
//! 一轮编排中可能出现的错误（后端、网关、委派、取消）。除编排器自身的
//! 不变量违规外，所有外部调用失败都会被转为事件或降级的 Completed，
//! 不会以异常形式越过事件流边界。

use thiserror::Error;

/// 编排一轮对话时可能出现的错误
#[derive(Error, Debug)]
pub enum AgentError {
    #[error("Backend unavailable: {0}")]
    BackendUnavailable(String),

    #[error("Gateway call failed: {0}")]
    GatewayFailed(String),

    /// 网关客户端内置超时（与轮取消相互独立）；payload 为 op 与地址
    #[error("Gateway timeout: {0}")]
    GatewayTimeout(String),

    /// 委派目标不在目录中（策略与目录配置漂移），按动作失败处理
    #[error("Unknown agent: {0}")]
    UnknownAgent(String),

    #[error("Delegation rejected: {0}")]
    DelegationRejected(String),

    #[error("Agent execution failed: {0}")]
    AgentFailed(String),

    #[error("Cancelled")]
    Cancelled,
}
