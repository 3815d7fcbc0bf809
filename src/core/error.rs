//! Agent 错误类型与恢复动作
//!
//! 步骤内错误（工具失败 / 超时）由 ExecutionEngine 就地吸收并交给 RecoveryEngine；
//! 只有计划级错误（InvalidPlan / Cancelled / DeadlineExceeded）会中止剩余步骤。

use thiserror::Error;

/// 编排过程中可能出现的错误
#[derive(Error, Debug)]
pub enum AgentError {
    #[error("Tool execution failed: {0}")]
    ToolExecutionFailed(String),

    #[error("Tool timeout: {0}")]
    ToolTimeout(String),

    #[error("Unknown tool: {0}")]
    UnknownTool(String),

    /// 计划不满足「步骤 id 为 1..N 且与位置一致」
    #[error("Invalid plan: {0}")]
    InvalidPlan(String),

    #[error("Unknown agent role: {0}")]
    UnknownRole(String),

    #[error("Execution cancelled before step {0}")]
    Cancelled(u32),

    #[error("Plan deadline exceeded before step {0}")]
    DeadlineExceeded(u32),

    #[error("Path escape attempt: {0}")]
    PathEscape(String),
}

/// 恢复引擎针对失败步骤给出的动作
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecoveryAction {
    /// 以替代结果将步骤标记为成功
    Substitute(String),
    /// 该动作没有注册恢复策略，步骤保持 error
    NotApplicable,
}
