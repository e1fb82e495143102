//! 应用配置：从 config/default.toml 与环境变量加载
//!
//! 加载顺序：先读 TOML 文件，再用环境变量 `LUBAN__*` 覆盖（双下划线表示
//! 嵌套键，如 `LUBAN__GATEWAY__TIMEOUT_SECS=5`）。所有字段有默认值，
//! 配置文件缺失时退化为纯默认。

use std::path::PathBuf;

use serde::Deserialize;

use crate::delegation::DelegationRule;

/// 应用配置根（对应 config/default.toml 的顶层）
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    pub app: AppSection,
    pub llm: LlmSection,
    pub gateway: GatewaySection,
    pub delegation: DelegationSection,
    pub orchestrator: OrchestratorSection,
}

/// [app] 段：应用名与轮内对话历史上限
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AppSection {
    pub name: Option<String>,
    pub max_context_turns: usize,
}

impl Default for AppSection {
    fn default() -> Self {
        Self {
            name: None,
            max_context_turns: 20,
        }
    }
}

/// [llm] 段：后端选择与请求超时
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LlmSection {
    /// deepseek / openai；实际选择还取决于可用的 API Key
    pub provider: String,
    pub model: String,
    pub base_url: Option<String>,
    pub request_timeout_secs: u64,
}

impl Default for LlmSection {
    fn default() -> Self {
        Self {
            provider: "deepseek".to_string(),
            model: "deepseek-chat".to_string(),
            base_url: None,
            request_timeout_secs: 60,
        }
    }
}

/// [gateway] 段：设备网关地址与自身超时；base_url 未设置时使用 Mock 网关
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GatewaySection {
    pub base_url: Option<String>,
    pub timeout_secs: u64,
}

impl Default for GatewaySection {
    fn default() -> Self {
        Self {
            base_url: None,
            timeout_secs: 10,
        }
    }
}

/// [delegation] 段：委派开关与保序规则表
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DelegationSection {
    pub enabled: bool,
    /// 按配置顺序裁决，首个命中者生效
    pub rules: Vec<DelegationRule>,
}

impl Default for DelegationSection {
    fn default() -> Self {
        Self {
            enabled: true,
            rules: Vec::new(),
        }
    }
}

/// [orchestrator] 段：单轮动作轮数上限
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OrchestratorSection {
    pub max_action_rounds: usize,
}

impl Default for OrchestratorSection {
    fn default() -> Self {
        Self {
            max_action_rounds: 8,
        }
    }
}

/// 从 config 目录加载配置，环境变量 LUBAN__* 可覆盖
///
/// 1. 按顺序查找 config/default.toml、../config/default.toml、default.toml，找到则作为第一源
/// 2. 若传入 config_path 且文件存在，则追加该文件（可覆盖前面的键）
/// 3. 最后叠加环境变量 LUBAN__*（双下划线表示嵌套键）
pub fn load_config(config_path: Option<PathBuf>) -> Result<AppConfig, config::ConfigError> {
    let mut builder = config::Config::builder();

    let default_names = ["config/default", "../config/default", "default"];
    for name in default_names {
        let path = format!("{}.toml", name);
        if std::path::Path::new(&path).exists() {
            builder = builder.add_source(config::File::with_name(name).required(false));
            break;
        }
    }

    if let Some(ref path) = config_path {
        if path.exists() {
            builder = builder.add_source(config::File::from(path.clone()).required(false));
        }
    }

    builder = builder.add_source(
        config::Environment::with_prefix("LUBAN")
            .separator("__")
            .try_parsing(true),
    );

    let c = builder.build()?;
    c.try_deserialize()
}
