//! 委派策略
//!
//! 配置驱动：规则（触发词 -> 目标 Agent 或拒绝）按配置顺序匹配，首个命中者
//! 生效；裁决顺序永远是配置顺序，不依赖任何无序结构的迭代顺序。
//! 未启用、规则为空或无命中时一律 Direct，配置缺失不是错误。

use serde::Deserialize;

use crate::config::DelegationSection;
use crate::turn::UserContext;

/// 策略裁决结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DelegationDecision {
    /// 主对话路径直接处理
    Direct,
    /// 委派给目录中的命名 Agent
    DelegateTo(String),
    /// 拒绝处理，原因作为降级回答返回
    Reject(String),
}

/// 单条委派规则：问题含 contains（大小写不敏感）即命中
#[derive(Debug, Clone, Deserialize, Default)]
pub struct DelegationRule {
    pub contains: String,
    /// 命中后委派的目标 Agent 名
    #[serde(default)]
    pub agent: Option<String>,
    /// 命中后直接拒绝的原因；与 agent 同时设置时 reject 优先
    #[serde(default)]
    pub reject: Option<String>,
}

/// 委派策略：构建后只读，所有轮共享
pub struct DelegationPolicy {
    enabled: bool,
    rules: Vec<DelegationRule>,
}

impl DelegationPolicy {
    pub fn new(enabled: bool, rules: Vec<DelegationRule>) -> Self {
        Self { enabled, rules }
    }

    pub fn from_config(section: &DelegationSection) -> Self {
        Self::new(section.enabled, section.rules.clone())
    }

    /// 空策略：对任何输入都 Direct
    pub fn disabled() -> Self {
        Self::new(false, Vec::new())
    }

    /// 首个命中的规则生效；无规则、未启用或无命中时 Direct
    pub fn decide(&self, question: &str, user: &UserContext) -> DelegationDecision {
        if !self.enabled || self.rules.is_empty() {
            return DelegationDecision::Direct;
        }

        let lowered = question.to_lowercase();
        for rule in &self.rules {
            if rule.contains.is_empty() {
                continue;
            }
            if lowered.contains(&rule.contains.to_lowercase()) {
                tracing::debug!(
                    user = %user.user_id,
                    trigger = %rule.contains,
                    "delegation rule matched"
                );
                if let Some(reason) = &rule.reject {
                    return DelegationDecision::Reject(reason.clone());
                }
                if let Some(agent) = &rule.agent {
                    return DelegationDecision::DelegateTo(agent.clone());
                }
            }
        }

        DelegationDecision::Direct
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user() -> UserContext {
        UserContext::new("u1", "测试用户")
    }

    fn rule(contains: &str, agent: &str) -> DelegationRule {
        DelegationRule {
            contains: contains.to_string(),
            agent: Some(agent.to_string()),
            reject: None,
        }
    }

    #[test]
    fn test_empty_config_is_always_direct() {
        let policy = DelegationPolicy::new(true, Vec::new());
        assert_eq!(policy.decide("IAI 报警 E123", &user()), DelegationDecision::Direct);
        assert_eq!(policy.decide("", &user()), DelegationDecision::Direct);
    }

    #[test]
    fn test_disabled_policy_ignores_rules() {
        let policy = DelegationPolicy::new(false, vec![rule("IAI", "iaiAgent")]);
        assert_eq!(policy.decide("IAI 报警", &user()), DelegationDecision::Direct);
    }

    #[test]
    fn test_match_is_case_insensitive() {
        let policy = DelegationPolicy::new(true, vec![rule("IAI", "iaiAgent")]);
        assert_eq!(
            policy.decide("iai alarm code e123", &user()),
            DelegationDecision::DelegateTo("iaiAgent".to_string())
        );
    }

    #[test]
    fn test_first_configured_rule_wins() {
        let policy = DelegationPolicy::new(
            true,
            vec![rule("IAI 报警", "iaiAgent"), rule("报警", "plcAgent")],
        );
        // 两条规则都命中，取配置顺序在前者
        assert_eq!(
            policy.decide("IAI 报警代码", &user()),
            DelegationDecision::DelegateTo("iaiAgent".to_string())
        );
        // 只有第二条命中
        assert_eq!(
            policy.decide("伺服报警", &user()),
            DelegationDecision::DelegateTo("plcAgent".to_string())
        );
    }

    #[test]
    fn test_reject_rule() {
        let policy = DelegationPolicy::new(
            true,
            vec![DelegationRule {
                contains: "固件".to_string(),
                agent: None,
                reject: Some("不支持固件改写类请求".to_string()),
            }],
        );
        assert_eq!(
            policy.decide("帮我改固件", &user()),
            DelegationDecision::Reject("不支持固件改写类请求".to_string())
        );
    }
}
