//! 核心层：错误类型与会话监管

pub mod error;
pub mod supervisor;

pub use error::AgentError;
pub use supervisor::TurnSupervisor;
