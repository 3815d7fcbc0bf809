//! 会话记忆：任务上下文与长期目标

pub mod context;
pub mod goals;

pub use context::{ContextStore, SessionContext, TaskRecord, DEFAULT_HISTORY_LIMIT};
pub use goals::{Goal, GoalStatus, GoalTracker};
