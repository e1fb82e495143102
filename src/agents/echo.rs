//! Echo Agent（测试用）

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::agents::{Agent, AgentResult};
use crate::core::AgentError;

/// 回显提问的 Agent，测试里充当任意名字的委派目标
pub struct EchoAgent {
    name: String,
    description: String,
}

impl EchoAgent {
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_description(name, "Echo the question back (for testing)")
    }

    pub fn with_description(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
        }
    }
}

#[async_trait]
impl Agent for EchoAgent {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        &self.description
    }

    async fn execute(
        &self,
        question: &str,
        cancel: CancellationToken,
    ) -> Result<AgentResult, AgentError> {
        if cancel.is_cancelled() {
            return Err(AgentError::Cancelled);
        }
        Ok(AgentResult {
            agent: self.name.clone(),
            content: format!("echo: {}", question),
        })
    }
}
