//! Luban - 工业设备对话助手的轮编排引擎
//!
//! 模块划分：
//! - **agents**: 能力接口、Agent 目录与内置专家（IAI / PLC / 手册）
//! - **config**: 应用配置加载（TOML + 环境变量）
//! - **core**: 错误类型与会话监管
//! - **delegation**: 配置驱动的委派策略（按配置顺序首个命中规则生效）
//! - **gateway**: 设备网关客户端（HTTP / Mock，自带独立超时）
//! - **llm**: LLM 客户端抽象与实现（OpenAI 兼容 / DeepSeek / Mock）
//! - **memory**: 单轮对话历史
//! - **observability**: tracing 初始化
//! - **turn**: 事件协议、后端决策与单轮编排主循环

pub mod agents;
pub mod config;
pub mod core;
pub mod delegation;
pub mod gateway;
pub mod llm;
pub mod memory;
pub mod observability;
pub mod turn;
