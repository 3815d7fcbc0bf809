//! 进程级 Agent 统计
//!
//! 以 Arc 注入 TaskPlanner / ExecutionEngine / AgentService，计数器全部原子自增；
//! 报表读取允许最终一致。

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

/// 单调递增计数器
#[derive(Debug, Default)]
pub struct AgentStats {
    plans_created: AtomicU64,
    plans_completed: AtomicU64,
    steps_executed: AtomicU64,
    errors_recovered: AtomicU64,
    execution_errors: AtomicU64,
    agent_sessions: AtomicU64,
}

/// 统计快照（含派生比率），供 /agents/stats 与 demo 输出
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatsSnapshot {
    pub plans_created: u64,
    pub plans_completed: u64,
    pub steps_executed: u64,
    pub errors_recovered: u64,
    pub execution_errors: u64,
    pub agent_sessions: u64,
    pub success_rate: f64,
    pub avg_steps_per_session: f64,
    pub error_recovery_rate: f64,
}

impl AgentStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_plan_created(&self) {
        self.plans_created.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_plan_completed(&self) {
        self.plans_completed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_step_executed(&self) {
        self.steps_executed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_error_recovered(&self) {
        self.errors_recovered.fetch_add(1, Ordering::Relaxed);
    }

    /// 未恢复的步骤错误与计划级失败
    pub fn record_execution_error(&self) {
        self.execution_errors.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_session(&self) {
        self.agent_sessions.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        let plans_created = self.plans_created.load(Ordering::Relaxed);
        let plans_completed = self.plans_completed.load(Ordering::Relaxed);
        let steps_executed = self.steps_executed.load(Ordering::Relaxed);
        let errors_recovered = self.errors_recovered.load(Ordering::Relaxed);
        let execution_errors = self.execution_errors.load(Ordering::Relaxed);
        let agent_sessions = self.agent_sessions.load(Ordering::Relaxed);
        StatsSnapshot {
            plans_created,
            plans_completed,
            steps_executed,
            errors_recovered,
            execution_errors,
            agent_sessions,
            success_rate: plans_completed as f64 / plans_created.max(1) as f64,
            avg_steps_per_session: steps_executed as f64 / agent_sessions.max(1) as f64,
            error_recovery_rate: errors_recovered as f64 / steps_executed.max(1) as f64,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_snapshot_has_zero_rates() {
        let snap = AgentStats::new().snapshot();
        assert_eq!(snap.plans_created, 0);
        assert_eq!(snap.success_rate, 0.0);
        assert_eq!(snap.avg_steps_per_session, 0.0);
        assert_eq!(snap.error_recovery_rate, 0.0);
    }

    #[test]
    fn test_derived_rates() {
        let stats = AgentStats::new();
        stats.record_session();
        stats.record_session();
        stats.record_plan_created();
        stats.record_plan_created();
        stats.record_plan_completed();
        for _ in 0..8 {
            stats.record_step_executed();
        }
        stats.record_error_recovered();
        stats.record_error_recovered();

        let snap = stats.snapshot();
        assert_eq!(snap.success_rate, 0.5);
        assert_eq!(snap.avg_steps_per_session, 4.0);
        assert_eq!(snap.error_recovery_rate, 0.25);
    }

    #[tokio::test]
    async fn test_concurrent_increments() {
        let stats = std::sync::Arc::new(AgentStats::new());
        let mut handles = Vec::new();
        for _ in 0..16 {
            let stats = stats.clone();
            handles.push(tokio::spawn(async move {
                for _ in 0..100 {
                    stats.record_step_executed();
                }
            }));
        }
        for h in handles {
            h.await.unwrap();
        }
        assert_eq!(stats.snapshot().steps_executed, 1600);
    }
}
