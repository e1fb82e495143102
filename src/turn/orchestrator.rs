//! 轮编排器：单轮主循环
//!
//! 每轮一个 tokio 任务：委派策略预裁决 -> 后端决策循环（动作轮数有上限）。
//! 事件即产即发：ActionRequest / ToolResult 按 round 成对，Completed 恒为
//! 终点；动作失败一律转为失败的 ToolResult 回填给后端；取消或接收端被
//! 丢弃时合作式终止，事件流截断且不发 Completed。

use std::sync::Arc;
use std::time::Instant;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::agents::AgentCatalog;
use crate::core::AgentError;
use crate::delegation::{DelegationDecision, DelegationPolicy};
use crate::gateway::{DeviceGateway, GatewayRequest};
use crate::memory::{ConversationMemory, Message};
use crate::turn::backend::{ActionProposal, BackendDecision, ChatBackend};
use crate::turn::events::{ActionKind, ChatStreamEvent, TurnUsage};
use crate::turn::TurnRequest;

/// 编排配置
#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    /// 单轮动作轮数上限，防止后端无限提议动作
    pub max_action_rounds: usize,
    /// 轮内对话历史保留轮数
    pub max_context_turns: usize,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            max_action_rounds: 8,
            max_context_turns: 20,
        }
    }
}

/// 轮编排器：进程级只读组件的组合，handle_turn 可被任意并发调用
pub struct TurnOrchestrator {
    backend: Arc<dyn ChatBackend>,
    catalog: Arc<AgentCatalog>,
    policy: Arc<DelegationPolicy>,
    gateway: Arc<dyn DeviceGateway>,
    config: OrchestratorConfig,
}

impl TurnOrchestrator {
    pub fn new(
        backend: Arc<dyn ChatBackend>,
        catalog: Arc<AgentCatalog>,
        policy: Arc<DelegationPolicy>,
        gateway: Arc<dyn DeviceGateway>,
        config: OrchestratorConfig,
    ) -> Self {
        Self {
            backend,
            catalog,
            policy,
            gateway,
            config,
        }
    }

    /// 处理一轮：立即返回事件接收端，事件由后台任务即产即发。
    /// 丢弃接收端或取消令牌都会让本轮合作式终止，不再发起外部调用。
    pub fn handle_turn(
        &self,
        request: TurnRequest,
        cancel: CancellationToken,
    ) -> mpsc::UnboundedReceiver<ChatStreamEvent> {
        let (tx, rx) = mpsc::unbounded_channel();
        let turn = TurnTask {
            backend: self.backend.clone(),
            catalog: self.catalog.clone(),
            policy: self.policy.clone(),
            gateway: self.gateway.clone(),
            config: self.config.clone(),
        };
        tokio::spawn(async move {
            turn.run(request, cancel, tx).await;
        });
        rx
    }
}

/// 单轮执行体：生命周期即一轮，持有只读组件的克隆
struct TurnTask {
    backend: Arc<dyn ChatBackend>,
    catalog: Arc<AgentCatalog>,
    policy: Arc<DelegationPolicy>,
    gateway: Arc<dyn DeviceGateway>,
    config: OrchestratorConfig,
}

impl TurnTask {
    async fn run(
        self,
        request: TurnRequest,
        cancel: CancellationToken,
        tx: mpsc::UnboundedSender<ChatStreamEvent>,
    ) {
        let conversation_id = request
            .conversation_id
            .clone()
            .unwrap_or_else(|| Uuid::new_v4().to_string());
        let usage_start = self.backend.token_usage();

        let mut history = ConversationMemory::new(self.config.max_context_turns);
        history.push(Message::user(request.text.clone()));

        let mut rounds = 0usize;

        // 委派策略预裁决：Reject 直接降级完结，DelegateTo 先执行一次委派动作
        match self.policy.decide(&request.text, &request.user) {
            DelegationDecision::Reject(reason) => {
                tracing::info!(
                    user = %request.user.user_id,
                    %reason,
                    "turn rejected by delegation policy"
                );
                self.complete(&tx, &conversation_id, reason, rounds, usage_start);
                return;
            }
            DelegationDecision::DelegateTo(name) => {
                rounds += 1;
                let proposal = ActionProposal {
                    kind: ActionKind::Delegate,
                    target: name,
                    params: serde_json::json!({ "question": request.text }),
                };
                if !self
                    .run_action(&tx, rounds, &proposal, &request, &mut history, &cancel)
                    .await
                {
                    return;
                }
            }
            DelegationDecision::Direct => {}
        }

        // 后端决策循环
        loop {
            if cancel.is_cancelled() {
                return;
            }

            let decision = tokio::select! {
                biased;
                _ = cancel.cancelled() => return,
                d = self.backend.decide(history.messages()) => d,
            };

            let decision = match decision {
                Ok(d) => d,
                Err(e) => {
                    let err = AgentError::BackendUnavailable(e);
                    tracing::warn!(error = %err, "chat backend unavailable");
                    self.complete(
                        &tx,
                        &conversation_id,
                        format!("抱歉，对话后端暂时不可用（{}），请稍后重试。", err),
                        rounds,
                        usage_start,
                    );
                    return;
                }
            };

            match decision {
                BackendDecision::FinalAnswer(text) => {
                    self.complete(&tx, &conversation_id, text, rounds, usage_start);
                    return;
                }
                BackendDecision::Action(proposal) => {
                    if rounds >= self.config.max_action_rounds {
                        tracing::warn!(rounds, "action budget exhausted");
                        self.complete(
                            &tx,
                            &conversation_id,
                            format!(
                                "在限定的 {} 次动作内未能得到确定回答，请换个问法或稍后重试。",
                                self.config.max_action_rounds
                            ),
                            rounds,
                            usage_start,
                        );
                        return;
                    }
                    rounds += 1;
                    if !self
                        .run_action(&tx, rounds, &proposal, &request, &mut history, &cancel)
                        .await
                    {
                        return;
                    }
                }
            }
        }
    }

    /// 执行一个动作并发出配对事件；返回 false 表示轮已终止（取消或接收端关闭）
    async fn run_action(
        &self,
        tx: &mpsc::UnboundedSender<ChatStreamEvent>,
        round: usize,
        proposal: &ActionProposal,
        request: &TurnRequest,
        history: &mut ConversationMemory,
        cancel: &CancellationToken,
    ) -> bool {
        if !emit(
            tx,
            ChatStreamEvent::ActionRequest {
                round,
                kind: proposal.kind,
                target: proposal.target.clone(),
                params: proposal.params.clone(),
            },
        ) {
            return false;
        }

        let start = Instant::now();
        let outcome = tokio::select! {
            biased;
            _ = cancel.cancelled() => return false,
            r = self.execute_action(proposal, request, cancel) => r,
        };
        if cancel.is_cancelled() {
            // 在途调用因取消而返回时不再发结果事件
            return false;
        }

        let (ok, content) = match outcome {
            Ok(content) => (true, content),
            Err(e) => (false, e.to_string()),
        };

        let audit = serde_json::json!({
            "event": "action_audit",
            "kind": proposal.kind.as_str(),
            "target": proposal.target,
            "ok": ok,
            "duration_ms": start.elapsed().as_millis() as u64,
            "ts": chrono::Utc::now().to_rfc3339(),
        });
        tracing::info!(audit = %audit.to_string(), "action");

        if !emit(
            tx,
            ChatStreamEvent::ToolResult {
                round,
                target: proposal.target.clone(),
                ok,
                content: content.clone(),
            },
        ) {
            return false;
        }

        // 动作与结果回填对话，供下一轮后端决策；失败同样回填
        history.push(Message::assistant(format!(
            "Action {} {} | Result: {}",
            proposal.kind.as_str(),
            proposal.target,
            content
        )));
        history.push(Message::user(format!(
            "Observation from {}: {}",
            proposal.target, content
        )));
        true
    }

    /// 网关调用或委派执行；一切失败以 Err 返回，绝不向事件流抛异常
    async fn execute_action(
        &self,
        proposal: &ActionProposal,
        request: &TurnRequest,
        cancel: &CancellationToken,
    ) -> Result<String, AgentError> {
        match proposal.kind {
            ActionKind::Gateway => {
                let gateway_request = GatewayRequest::from_params(&proposal.target, &proposal.params)
                    .map_err(AgentError::GatewayFailed)?;
                self.gateway.invoke(&gateway_request, cancel.clone()).await
            }
            ActionKind::Delegate => {
                let question = proposal
                    .params
                    .get("question")
                    .and_then(|v| v.as_str())
                    .unwrap_or(&request.text);

                // 后端提议的委派同样受策略约束：显式 Reject 即否决
                if let DelegationDecision::Reject(reason) =
                    self.policy.decide(question, &request.user)
                {
                    return Err(AgentError::DelegationRejected(reason));
                }

                let agent = self
                    .catalog
                    .find(&proposal.target)
                    .ok_or_else(|| AgentError::UnknownAgent(proposal.target.clone()))?;
                let result = agent.execute(question, cancel.clone()).await?;
                Ok(result.content)
            }
        }
    }

    fn complete(
        &self,
        tx: &mpsc::UnboundedSender<ChatStreamEvent>,
        conversation_id: &str,
        content: String,
        rounds: usize,
        usage_start: (u64, u64, u64),
    ) {
        let usage = usage_delta(usage_start, self.backend.token_usage());
        let _ = tx.send(ChatStreamEvent::Completed {
            conversation_id: conversation_id.to_string(),
            content,
            rounds,
            usage,
        });
    }
}

/// 发送事件；接收端已被丢弃时返回 false（视作取消）
fn emit(tx: &mpsc::UnboundedSender<ChatStreamEvent>, event: ChatStreamEvent) -> bool {
    tx.send(event).is_ok()
}

/// 本轮 token 用量 = 当前累计值 - 轮开始时的累计值；无统计时为 None
fn usage_delta(start: (u64, u64, u64), now: (u64, u64, u64)) -> Option<TurnUsage> {
    let prompt = now.0.saturating_sub(start.0);
    let completion = now.1.saturating_sub(start.1);
    if prompt == 0 && completion == 0 {
        None
    } else {
        Some(TurnUsage {
            prompt_tokens: prompt,
            completion_tokens: completion,
            total_tokens: prompt + completion,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_usage_delta_none_when_no_usage() {
        assert!(usage_delta((5, 3, 8), (5, 3, 8)).is_none());
    }

    #[test]
    fn test_usage_delta_counts_increment_only() {
        let usage = usage_delta((100, 50, 150), (130, 70, 200)).unwrap();
        assert_eq!(usage.prompt_tokens, 30);
        assert_eq!(usage.completion_tokens, 20);
        assert_eq!(usage.total_tokens, 50);
    }
}
