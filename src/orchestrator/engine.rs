//! 计划执行引擎
//!
//! 严格按 id 升序逐步执行：动作映射到已注册工具则经 ToolExecutor 调用（带超时），
//! 否则模拟执行。失败步骤交给 RecoveryEngine 恢复至多一次，不重放工具调用。
//! 每步结果写入 ContextStore；全部步骤结束后计算完成度与后续建议。
//!
//! 取消、截止时间与非法步骤 id 在每步开始前检查，命中则中止：已执行的步骤保留，
//! 其余步骤不出现在结果中，completed=false，不产出后续建议。

use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::config::AgentSection;
use crate::core::{AgentError, AgentStats, RecoveryAction, RecoveryEngine};
use crate::memory::ContextStore;
use crate::orchestrator::outcome::{ExecutionResult, StepResult, ToolUsage};
use crate::orchestrator::plan::{Plan, Step};
use crate::tools::ToolExecutor;

pub const DEFAULT_COMPLETION_THRESHOLD_PERCENT: u32 = 70;
pub const DEFAULT_SIMULATED_STEP_DELAY: Duration = Duration::from_secs(1);
pub const MAX_FOLLOW_UPS: usize = 3;

const FOLLOW_UP_LOW: &str = "Consider breaking this task into smaller steps for better results";
const FOLLOW_UP_PARTIAL: &str = "Some steps had issues - would you like me to retry those specific parts?";
const FOLLOW_UP_DONE: &str = "Task completed successfully! Would you like me to create a summary report?";
const FOLLOW_UP_SEARCH: &str = "I can search for more recent information if needed";
const FOLLOW_UP_CALCULATION: &str = "I can perform additional calculations or show detailed workings";

pub struct ExecutionEngine {
    executor: Arc<ToolExecutor>,
    recovery: RecoveryEngine,
    context: Arc<ContextStore>,
    stats: Arc<AgentStats>,
    simulated_delay: Duration,
    completion_threshold_percent: u32,
    plan_deadline: Option<Duration>,
}

impl ExecutionEngine {
    pub fn new(executor: Arc<ToolExecutor>, context: Arc<ContextStore>, stats: Arc<AgentStats>) -> Self {
        Self {
            executor,
            recovery: RecoveryEngine::new(),
            context,
            stats,
            simulated_delay: DEFAULT_SIMULATED_STEP_DELAY,
            completion_threshold_percent: DEFAULT_COMPLETION_THRESHOLD_PERCENT,
            plan_deadline: None,
        }
    }

    /// 以 [agent] 配置段设置模拟延迟、完成阈值与截止时间
    pub fn from_config(
        executor: Arc<ToolExecutor>,
        context: Arc<ContextStore>,
        stats: Arc<AgentStats>,
        cfg: &AgentSection,
    ) -> Self {
        Self::new(executor, context, stats)
            .with_simulated_delay(Duration::from_millis(cfg.simulated_step_delay_ms))
            .with_completion_threshold_percent(cfg.completion_threshold_percent)
            .with_plan_deadline(cfg.plan_deadline_secs.map(Duration::from_secs))
    }

    pub fn with_simulated_delay(mut self, delay: Duration) -> Self {
        self.simulated_delay = delay;
        self
    }

    pub fn with_completion_threshold_percent(mut self, percent: u32) -> Self {
        self.completion_threshold_percent = percent.min(100);
        self
    }

    pub fn with_plan_deadline(mut self, deadline: Option<Duration>) -> Self {
        self.plan_deadline = deadline;
        self
    }

    pub fn executor(&self) -> &Arc<ToolExecutor> {
        &self.executor
    }

    pub async fn run(&self, plan: &Plan, session_id: &str) -> ExecutionResult {
        self.run_with_cancel(plan, session_id, CancellationToken::new()).await
    }

    pub async fn run_with_cancel(
        &self,
        plan: &Plan,
        session_id: &str,
        cancel_token: CancellationToken,
    ) -> ExecutionResult {
        let started = Instant::now();
        let deadline = self.plan_deadline.map(|d| started + d);
        tracing::info!(
            session_id = %session_id,
            role = %plan.role(),
            goal = %plan.goal(),
            steps = plan.steps().len(),
            "executing plan"
        );

        let mut results: Vec<StepResult> = Vec::with_capacity(plan.steps().len());
        let mut tools_used: Vec<String> = Vec::new();
        let mut failure: Option<AgentError> = None;

        if plan.steps().is_empty() {
            failure = Some(AgentError::InvalidPlan("plan has no steps".to_string()));
        }

        for (step, position) in plan.steps().iter().zip(1u32..) {
            if step.id() != position {
                failure = Some(AgentError::InvalidPlan(format!(
                    "step at position {position} has id {}",
                    step.id()
                )));
                break;
            }
            if cancel_token.is_cancelled() {
                failure = Some(AgentError::Cancelled(step.id()));
                break;
            }
            if deadline.is_some_and(|d| Instant::now() >= d) {
                failure = Some(AgentError::DeadlineExceeded(step.id()));
                break;
            }

            let result = self.execute_step(step).await;
            self.stats.record_step_executed();
            if let Some(ToolUsage::Registered(tool)) = &result.tool_used {
                if !tools_used.contains(tool) {
                    tools_used.push(tool.clone());
                }
            }
            self.context
                .update(session_id, serde_json::to_value(&result).unwrap_or(Value::Null))
                .await;
            results.push(result);
        }

        let execution_time_secs = started.elapsed().as_secs_f64();

        if let Some(err) = failure {
            tracing::warn!(session_id = %session_id, error = %err, executed = results.len(), "plan execution aborted");
            self.stats.record_execution_error();
            return ExecutionResult::new(
                false,
                results,
                tools_used,
                execution_time_secs,
                Vec::new(),
                Some(err.to_string()),
            );
        }

        let successes = results.iter().filter(|r| r.is_success()).count();
        let completed = is_completed(successes, results.len(), self.completion_threshold_percent);
        if completed {
            self.stats.record_plan_completed();
        }
        let follow_ups = follow_up_suggestions(successes, results.len(), &tools_used);
        tracing::info!(
            session_id = %session_id,
            successes,
            total = results.len(),
            completed,
            elapsed_secs = execution_time_secs,
            "plan finished"
        );
        ExecutionResult::new(completed, results, tools_used, execution_time_secs, follow_ups, None)
    }

    async fn execute_step(&self, step: &Step) -> StepResult {
        let action = step.action();
        let tool = action.tool_name().filter(|t| self.executor.has_tool(t));

        let Some(tool) = tool else {
            tracing::debug!(step = step.id(), action = %action, "no tool for action, simulating");
            tokio::time::sleep(self.simulated_delay).await;
            return StepResult::success(
                step,
                ToolUsage::Simulated,
                Value::String(format!("Simulated execution of {action}")),
            );
        };

        tracing::info!(step = step.id(), tool = %tool, "executing step");
        match self.executor.execute(tool, step.params().to_args()).await {
            Ok(payload) => StepResult::success(step, ToolUsage::Registered(tool.to_string()), payload),
            Err(err) => {
                tracing::warn!(step = step.id(), tool = %tool, error = %err, "step failed");
                let mut result = StepResult::failure(step, &err);
                match self.recovery.handle(action, &err) {
                    RecoveryAction::Substitute(substitute) => {
                        tracing::warn!(step = step.id(), substitute = %substitute, "step recovered");
                        result.recover_with(substitute);
                        self.stats.record_error_recovered();
                    }
                    RecoveryAction::NotApplicable => {
                        self.stats.record_execution_error();
                    }
                }
                result
            }
        }
    }
}

/// successes >= ceil(percent * total / 100)，整数运算
pub fn is_completed(successes: usize, total: usize, threshold_percent: u32) -> bool {
    let required = (threshold_percent as u64 * total as u64).div_ceil(100);
    successes as u64 >= required
}

/// 完成度档位消息在前，其后按首次出现顺序追加工具类别消息，最多 3 条
pub fn follow_up_suggestions(successes: usize, total: usize, tools_used: &[String]) -> Vec<String> {
    let mut suggestions = Vec::with_capacity(MAX_FOLLOW_UPS);
    let bucket = if 2 * successes < total {
        FOLLOW_UP_LOW
    } else if 5 * successes < 4 * total {
        FOLLOW_UP_PARTIAL
    } else {
        FOLLOW_UP_DONE
    };
    suggestions.push(bucket.to_string());

    for tool in tools_used {
        let message = match tool.as_str() {
            "search_web" => FOLLOW_UP_SEARCH,
            "calculate" => FOLLOW_UP_CALCULATION,
            _ => continue,
        };
        if !suggestions.iter().any(|s| s == message) {
            suggestions.push(message.to_string());
        }
    }
    suggestions.truncate(MAX_FOLLOW_UPS);
    suggestions
}
