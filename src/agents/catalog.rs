//! Agent 目录
//!
//! 启动时由全量 Agent 一次性折叠为名称索引：大小写不敏感，重名时后注册者
//! 覆盖先注册者（保留首次注册的位置）；构建后只读，多轮并发查找无需加锁。

use std::collections::HashMap;
use std::sync::Arc;

use crate::agents::Agent;

pub struct AgentCatalog {
    by_name: HashMap<String, Arc<dyn Agent>>,
    /// 注册顺序（小写键），list 稳定顺序的来源
    order: Vec<String>,
}

impl AgentCatalog {
    pub fn new(agents: Vec<Arc<dyn Agent>>) -> Self {
        let mut by_name: HashMap<String, Arc<dyn Agent>> = HashMap::new();
        let mut order = Vec::new();
        for agent in agents {
            let key = agent.name().to_lowercase();
            if by_name.insert(key.clone(), agent).is_none() {
                order.push(key);
            }
        }
        Self { by_name, order }
    }

    /// 大小写不敏感查找；空白或未知名称返回 None（不是错误）
    pub fn find(&self, name: &str) -> Option<Arc<dyn Agent>> {
        let name = name.trim();
        if name.is_empty() {
            return None;
        }
        self.by_name.get(&name.to_lowercase()).cloned()
    }

    /// 全部 Agent，按注册顺序（进程生命周期内稳定）
    pub fn list(&self) -> Vec<Arc<dyn Agent>> {
        self.order
            .iter()
            .filter_map(|key| self.by_name.get(key).cloned())
            .collect()
    }

    /// (name, description) 列表，供后端 system prompt 的可委派 Agent 段落
    pub fn descriptions(&self) -> Vec<(String, String)> {
        self.list()
            .iter()
            .map(|a| (a.name().to_string(), a.description().to_string()))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.by_name.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }
}
