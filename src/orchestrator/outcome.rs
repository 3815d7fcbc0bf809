//! 执行结果模型：StepResult / ExecutionResult
//!
//! ExecutionResult 只能由 ExecutionEngine 构造，completed 与 follow_up_suggestions 由引擎推导，外部只读。

use chrono::{DateTime, Utc};
use serde::{Serialize, Serializer};
use serde_json::Value;

use crate::core::AgentError;
use crate::orchestrator::plan::Step;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StepStatus {
    Success,
    Error,
}

/// 步骤由谁完成：已注册工具，或无对应工具时的模拟执行
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToolUsage {
    Registered(String),
    Simulated,
}

impl ToolUsage {
    pub fn as_str(&self) -> &str {
        match self {
            ToolUsage::Registered(name) => name,
            ToolUsage::Simulated => "simulated",
        }
    }
}

impl Serialize for ToolUsage {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// 单步执行结果；恢复时就地修改
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StepResult {
    pub step_id: u32,
    pub description: String,
    pub status: StepStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_used: Option<ToolUsage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub recovery_attempted: bool,
    pub timestamp: DateTime<Utc>,
}

impl StepResult {
    pub(crate) fn success(step: &Step, tool_used: ToolUsage, result: Value) -> Self {
        Self {
            step_id: step.id(),
            description: step.description().to_string(),
            status: StepStatus::Success,
            tool_used: Some(tool_used),
            result: Some(result),
            error: None,
            recovery_attempted: false,
            timestamp: Utc::now(),
        }
    }

    pub(crate) fn failure(step: &Step, err: &AgentError) -> Self {
        Self {
            step_id: step.id(),
            description: step.description().to_string(),
            status: StepStatus::Error,
            tool_used: None,
            result: None,
            error: Some(err.to_string()),
            recovery_attempted: false,
            timestamp: Utc::now(),
        }
    }

    /// 以替代结果把失败步骤标记为成功；保留原错误信息
    pub(crate) fn recover_with(&mut self, substitute: String) {
        self.status = StepStatus::Success;
        self.result = Some(Value::String(substitute));
        self.recovery_attempted = true;
    }

    pub fn is_success(&self) -> bool {
        self.status == StepStatus::Success
    }
}

/// 整个计划的执行结果
#[derive(Debug, Clone, Serialize)]
pub struct ExecutionResult {
    completed: bool,
    steps: Vec<StepResult>,
    tools_used: Vec<String>,
    #[serde(rename = "execution_time")]
    execution_time_secs: f64,
    #[serde(rename = "follow_up_suggestions")]
    follow_ups: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl ExecutionResult {
    pub(crate) fn new(
        completed: bool,
        steps: Vec<StepResult>,
        tools_used: Vec<String>,
        execution_time_secs: f64,
        follow_ups: Vec<String>,
        error: Option<String>,
    ) -> Self {
        Self {
            completed,
            steps,
            tools_used,
            execution_time_secs,
            follow_ups,
            error,
        }
    }

    pub fn completed(&self) -> bool {
        self.completed
    }

    pub fn steps(&self) -> &[StepResult] {
        &self.steps
    }

    pub fn tools_used(&self) -> &[String] {
        &self.tools_used
    }

    pub fn execution_time_secs(&self) -> f64 {
        self.execution_time_secs
    }

    pub fn follow_up_suggestions(&self) -> &[String] {
        &self.follow_ups
    }

    /// 引擎级失败（计划非法 / 取消 / 超过截止时间）
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn success_count(&self) -> usize {
        self.steps.iter().filter(|s| s.is_success()).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_step_result_wire_form() {
        let result = StepResult {
            step_id: 2,
            description: "Estimate".to_string(),
            status: StepStatus::Success,
            tool_used: Some(ToolUsage::Simulated),
            result: Some(Value::String("Simulated execution of analyze".to_string())),
            error: None,
            recovery_attempted: false,
            timestamp: Utc::now(),
        };
        let v = serde_json::to_value(&result).unwrap();
        assert_eq!(v["status"], "success");
        assert_eq!(v["tool_used"], "simulated");
        assert!(v.get("error").is_none());
        assert!(v.get("recovery_attempted").is_none());
    }

    #[test]
    fn test_execution_result_wire_names() {
        let result = ExecutionResult::new(true, vec![], vec!["calculate".to_string()], 0.5, vec![], None);
        let v = serde_json::to_value(&result).unwrap();
        assert_eq!(v["execution_time"], 0.5);
        assert_eq!(v["follow_up_suggestions"], serde_json::json!([]));
        assert_eq!(v["tools_used"], serde_json::json!(["calculate"]));
        assert!(v.get("error").is_none());
    }
}
