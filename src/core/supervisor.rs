//! 会话监管：当前轮的取消令牌
//!
//! REPL 等前端每轮通过 begin_turn 换取新令牌；Ctrl+C 时 cancel_current
//! 只取消在途的一轮，不影响后续轮次。

use std::sync::Mutex;

use tokio_util::sync::CancellationToken;

/// 会话级取消管理：持有当前轮的令牌
#[derive(Debug)]
pub struct TurnSupervisor {
    current: Mutex<CancellationToken>,
}

impl TurnSupervisor {
    pub fn new() -> Self {
        Self {
            current: Mutex::new(CancellationToken::new()),
        }
    }

    /// 开始新一轮：换上新令牌并返回；上一轮的令牌从此不再受本监管影响
    pub fn begin_turn(&self) -> CancellationToken {
        let token = CancellationToken::new();
        if let Ok(mut current) = self.current.lock() {
            *current = token.clone();
        }
        token
    }

    /// 取消当前轮（用户 Ctrl+C）
    pub fn cancel_current(&self) {
        if let Ok(current) = self.current.lock() {
            current.cancel();
        }
    }
}

impl Default for TurnSupervisor {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_begin_turn_detaches_previous_token() {
        let supervisor = TurnSupervisor::new();
        let first = supervisor.begin_turn();
        let second = supervisor.begin_turn();

        supervisor.cancel_current();

        assert!(!first.is_cancelled());
        assert!(second.is_cancelled());
    }
}
