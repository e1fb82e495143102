//! Luban REPL：标准输入逐行提问，事件即到即打印
//!
//! 无 API Key 时自动退化为 Mock LLM，网关未配置 base_url 时使用 Mock 网关，
//! 可完全离线跑通编排链路；Ctrl+C 取消当前轮（事件流截断，无最终回答），
//! 输入 exit / quit 退出。

use std::io::Write;
use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, BufReader};

use luban::agents::{iai_agent, manual_agent, plc_agent, AgentCatalog};
use luban::config::{load_config, AppConfig};
use luban::core::TurnSupervisor;
use luban::delegation::DelegationPolicy;
use luban::gateway::{DeviceGateway, HttpDeviceGateway, MockDeviceGateway};
use luban::llm::{create_deepseek_client, LlmClient, MockLlmClient, OpenAiClient};
use luban::turn::{
    ActionKind, ChatStreamEvent, LlmChatBackend, OrchestratorConfig, TurnOrchestrator,
    TurnRequest, UserContext,
};

/// 根据配置与环境变量选择 LLM 后端（DeepSeek / OpenAI 兼容 / Mock）
fn create_llm_from_config(cfg: &AppConfig) -> Arc<dyn LlmClient> {
    let provider = cfg.llm.provider.to_lowercase();
    let use_deepseek = std::env::var("DEEPSEEK_API_KEY").is_ok()
        || (provider == "deepseek" && std::env::var("OPENAI_API_KEY").is_ok());
    let use_openai = std::env::var("OPENAI_API_KEY").is_ok() && provider != "deepseek";

    if use_deepseek {
        tracing::info!("Using DeepSeek LLM ({})", cfg.llm.model);
        Arc::new(create_deepseek_client(Some(&cfg.llm.model)))
    } else if use_openai {
        tracing::info!("Using OpenAI-compatible LLM ({})", cfg.llm.model);
        Arc::new(OpenAiClient::new(
            cfg.llm.base_url.as_deref(),
            &cfg.llm.model,
            std::env::var("OPENAI_API_KEY").ok().as_deref(),
        ))
    } else {
        tracing::warn!("No API key set, using Mock LLM");
        Arc::new(MockLlmClient)
    }
}

fn print_prompt() {
    print!("luban> ");
    let _ = std::io::stdout().flush();
}

fn print_event(event: &ChatStreamEvent, conversation_id: &mut Option<String>) {
    match event {
        ChatStreamEvent::ActionRequest {
            round,
            kind,
            target,
            params,
        } => {
            let kind = match kind {
                ActionKind::Gateway => "网关",
                ActionKind::Delegate => "委派",
            };
            println!("  [{}] -> {} {} {}", round, kind, target, params);
        }
        ChatStreamEvent::ToolResult {
            round,
            target,
            ok,
            content,
        } => {
            let mark = if *ok { "ok" } else { "failed" };
            println!("  [{}] <- {} ({}) {}", round, target, mark, content);
        }
        ChatStreamEvent::Completed {
            conversation_id: cid,
            content,
            rounds: _,
            usage,
        } => {
            *conversation_id = Some(cid.clone());
            println!("{}", content);
            if let Some(u) = usage {
                tracing::debug!(
                    prompt = u.prompt_tokens,
                    completion = u.completion_tokens,
                    "turn token usage"
                );
            }
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    luban::observability::init();

    let cfg = load_config(None).unwrap_or_else(|e| {
        tracing::warn!("Config load failed ({}), using defaults", e);
        AppConfig::default()
    });

    let llm = create_llm_from_config(&cfg);

    let catalog = Arc::new(AgentCatalog::new(vec![
        Arc::new(iai_agent(llm.clone())),
        Arc::new(plc_agent(llm.clone())),
        Arc::new(manual_agent(llm.clone())),
    ]));
    let policy = Arc::new(DelegationPolicy::from_config(&cfg.delegation));
    let gateway: Arc<dyn DeviceGateway> = match &cfg.gateway.base_url {
        Some(base) => Arc::new(HttpDeviceGateway::new(base.clone(), cfg.gateway.timeout_secs)),
        None => {
            tracing::warn!("No gateway base_url configured, using mock gateway");
            Arc::new(MockDeviceGateway::new())
        }
    };
    let backend = Arc::new(LlmChatBackend::new(llm, &catalog));

    let orchestrator = TurnOrchestrator::new(
        backend,
        catalog,
        policy,
        gateway,
        OrchestratorConfig {
            max_action_rounds: cfg.orchestrator.max_action_rounds,
            max_context_turns: cfg.app.max_context_turns,
        },
    );

    let supervisor = TurnSupervisor::new();
    let user = UserContext::new("local", "Local Operator");
    let mut conversation_id: Option<String> = None;

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    print_prompt();

    while let Some(line) = lines.next_line().await? {
        let text = line.trim().to_string();
        if text.is_empty() {
            print_prompt();
            continue;
        }
        if text == "exit" || text == "quit" {
            break;
        }

        let cancel = supervisor.begin_turn();
        let mut rx = orchestrator.handle_turn(
            TurnRequest {
                user: user.clone(),
                conversation_id: conversation_id.clone(),
                text,
            },
            cancel,
        );

        loop {
            tokio::select! {
                _ = tokio::signal::ctrl_c() => {
                    supervisor.cancel_current();
                    println!("(已取消本轮)");
                }
                ev = rx.recv() => match ev {
                    Some(event) => print_event(&event, &mut conversation_id),
                    None => break,
                }
            }
        }

        print_prompt();
    }

    Ok(())
}
