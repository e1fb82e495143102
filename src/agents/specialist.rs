//! 内置专家 Agent
//!
//! SpecialistAgent = LLM + AnswerStyle（构造时注入的格式化策略：回答前缀
//! 与领域 system 指引），不同专家之间除 name/description 外无共享状态；
//! iai / plc / manual 工厂函数给出具体专家。

use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::agents::{Agent, AgentResult};
use crate::core::AgentError;
use crate::llm::LlmClient;
use crate::memory::Message;

/// 回答风格：前缀 + 领域指引（组合注入，不用继承）
#[derive(Debug, Clone)]
pub struct AnswerStyle {
    /// 回答前缀（如 "[IAI]"），空串表示无前缀
    pub prefix: String,
    /// 领域 system 指引
    pub guide: String,
}

/// LLM 驱动的专家：按 AnswerStyle 组装提问并格式化回答
pub struct SpecialistAgent {
    name: String,
    description: String,
    style: AnswerStyle,
    llm: Arc<dyn LlmClient>,
}

impl SpecialistAgent {
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        style: AnswerStyle,
        llm: Arc<dyn LlmClient>,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            style,
            llm,
        }
    }
}

#[async_trait]
impl Agent for SpecialistAgent {
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
        let messages = vec![
            Message::system(self.style.guide.clone()),
            Message::user(question.to_string()),
        ];

        // biased：取消优先于已就绪的 LLM 结果
        let content = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(AgentError::Cancelled),
            r = self.llm.complete(&messages) => r.map_err(AgentError::AgentFailed)?,
        };

        let content = if self.style.prefix.is_empty() {
            content
        } else {
            format!("{} {}", self.style.prefix, content)
        };

        Ok(AgentResult {
            agent: self.name.clone(),
            content,
        })
    }
}

/// IAI 电缸/控制器专家
pub fn iai_agent(llm: Arc<dyn LlmClient>) -> SpecialistAgent {
    SpecialistAgent::new(
        "iaiAgent",
        "IAI 电缸与控制器：报警代码解读、参数与使用问题",
        AnswerStyle {
            prefix: "[IAI]".to_string(),
            guide: "你是 IAI 电缸与控制器专家。解读报警代码时先给出含义，\
                    再给出排查步骤；不确定时明确说明，不要编造代码含义。"
                .to_string(),
        },
        llm,
    )
}

/// 三菱 PLC 专家
pub fn plc_agent(llm: Arc<dyn LlmClient>) -> SpecialistAgent {
    SpecialistAgent::new(
        "plcAgent",
        "三菱 PLC：梯形图编程、软元件（D/M/X/Y）与通信问题",
        AnswerStyle {
            prefix: "[PLC]".to_string(),
            guide: "你是三菱 PLC 工程师。回答编程与软元件问题时给出具体指令\
                    或示例；涉及现场设备操作时提醒安全注意事项。"
                .to_string(),
        },
        llm,
    )
}

/// 设备手册问答专家
pub fn manual_agent(llm: Arc<dyn LlmClient>) -> SpecialistAgent {
    SpecialistAgent::new(
        "manualAgent",
        "设备手册：按手册口径回答操作规程与维护周期问题",
        AnswerStyle {
            prefix: "[手册]".to_string(),
            guide: "你按设备手册的口径回答：给出章节式、步骤式的说明；\
                    手册未覆盖的内容直接说明没有依据。"
                .to_string(),
        },
        llm,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedLlm(&'static str);

    #[async_trait]
    impl LlmClient for FixedLlm {
        async fn complete(&self, _messages: &[Message]) -> Result<String, String> {
            Ok(self.0.to_string())
        }
    }

    #[tokio::test]
    async fn test_execute_applies_prefix() {
        let agent = SpecialistAgent::new(
            "iaiAgent",
            "test",
            AnswerStyle {
                prefix: "[IAI]".to_string(),
                guide: "guide".to_string(),
            },
            Arc::new(FixedLlm("报警 E123 表示过载")),
        );

        let result = agent
            .execute("IAI alarm code E123", CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(result.agent, "iaiAgent");
        assert!(result.content.starts_with("[IAI] "));
    }

    #[tokio::test]
    async fn test_execute_respects_cancellation() {
        let agent = SpecialistAgent::new(
            "plcAgent",
            "test",
            AnswerStyle {
                prefix: String::new(),
                guide: "guide".to_string(),
            },
            Arc::new(FixedLlm("ok")),
        );

        let cancel = CancellationToken::new();
        cancel.cancel();
        let result = agent.execute("question", cancel).await;
        assert!(matches!(result, Err(AgentError::Cancelled)));
    }
}
