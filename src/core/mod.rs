//! 核心层：错误与恢复、统计、会话监管

pub mod error;
pub mod recovery;
pub mod session_supervisor;
pub mod stats;

pub use error::{AgentError, RecoveryAction};
pub use recovery::RecoveryEngine;
pub use session_supervisor::SessionSupervisor;
pub use stats::{AgentStats, StatsSnapshot};
