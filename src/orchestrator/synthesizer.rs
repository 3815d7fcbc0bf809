//! 把 ExecutionResult 渲染为面向用户的文本回复

use serde_json::Value;

use crate::orchestrator::outcome::{ExecutionResult, StepResult};
use crate::orchestrator::AgentRole;

const RESULT_PREVIEW_CHARS: usize = 100;

#[derive(Debug, Default)]
pub struct ResponseSynthesizer;

impl ResponseSynthesizer {
    pub fn new() -> Self {
        Self
    }

    pub fn render(&self, role: AgentRole, result: &ExecutionResult) -> String {
        let steps = result.steps();
        let successes = result.success_count();

        let mut out = format!(
            "I've completed your request using my {} capabilities.\n\n",
            role.display_name()
        );
        if successes == steps.len() {
            out.push_str(&format!("✅ Successfully completed all {} steps:\n\n", steps.len()));
        } else {
            out.push_str(&format!(
                "⚠️ Completed {successes} of {} steps (some had issues):\n\n",
                steps.len()
            ));
        }

        for (i, step) in steps.iter().enumerate() {
            render_step(&mut out, i + 1, step);
        }
        out.push('\n');

        if let Some((title, body)) = insight_block(role) {
            out.push_str(&format!("{title}\n{body}\n\n"));
        }

        if let Some(err) = result.error() {
            out.push_str(&format!("⛔ Execution stopped early: {err}\n\n"));
        }

        if !result.follow_up_suggestions().is_empty() {
            out.push_str("💡 **Next Steps:**\n");
            for suggestion in result.follow_up_suggestions() {
                out.push_str(&format!("• {suggestion}\n"));
            }
        }
        out
    }
}

fn render_step(out: &mut String, index: usize, step: &StepResult) {
    let icon = if step.is_success() { "✅" } else { "❌" };
    out.push_str(&format!("{icon} Step {index}: {}\n", step.description));
    if step.is_success() {
        if let Some(result) = &step.result {
            out.push_str(&format!("   Result: {}...\n", preview(result)));
        }
    } else {
        let error = step.error.as_deref().unwrap_or("Unknown error");
        out.push_str(&format!("   Error: {error}\n"));
    }
}

/// 结果预览：对象含 data 字段时只取 data；字符串不带引号；截断到 100 个字符
fn preview(result: &Value) -> String {
    let shown = result.get("data").unwrap_or(result);
    let text = match shown {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    };
    text.chars().take(RESULT_PREVIEW_CHARS).collect()
}

fn insight_block(role: AgentRole) -> Option<(&'static str, &'static str)> {
    match role {
        AgentRole::DataAnalyst => Some((
            "📊 **Key Insights:**",
            "Based on the data analysis, I've identified patterns and trends that can help inform your decisions.",
        )),
        AgentRole::ResearchAgent => Some((
            "🔍 **Research Summary:**",
            "I've gathered comprehensive information from multiple sources to give you a complete picture.",
        )),
        AgentRole::CustomerSupport => Some((
            "🎯 **Resolution Plan:**",
            "I've analyzed the customer issue and created a step-by-step resolution plan.",
        )),
        AgentRole::ProjectManager => Some((
            "📋 **Project Plan:**",
            "I've created a structured plan with timelines, dependencies, and key milestones.",
        )),
        AgentRole::TaskPlanner => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::orchestrator::outcome::{StepStatus, ToolUsage};
    use chrono::Utc;

    fn step(id: u32, ok: bool, result: Option<Value>) -> StepResult {
        StepResult {
            step_id: id,
            description: format!("Step number {id}"),
            status: if ok { StepStatus::Success } else { StepStatus::Error },
            tool_used: ok.then_some(ToolUsage::Simulated),
            result,
            error: (!ok).then(|| "Tool execution failed: boom".to_string()),
            recovery_attempted: false,
            timestamp: Utc::now(),
        }
    }

    #[test]
    fn test_render_partial_with_insights_and_next_steps() {
        let long = "x".repeat(250);
        let result = ExecutionResult::new(
            false,
            vec![step(1, true, Some(Value::String(long))), step(2, false, None)],
            vec![],
            0.1,
            vec!["Some steps had issues - would you like me to retry those specific parts?".to_string()],
            None,
        );
        let text = ResponseSynthesizer::new().render(AgentRole::DataAnalyst, &result);
        assert!(text.starts_with("I've completed your request using my data analyst capabilities."));
        assert!(text.contains("⚠️ Completed 1 of 2 steps (some had issues):"));
        assert!(text.contains(&format!("   Result: {}...\n", "x".repeat(100))));
        assert!(text.contains("❌ Step 2: Step number 2\n   Error: Tool execution failed: boom"));
        assert!(text.contains("📊 **Key Insights:**"));
        assert!(text.contains("💡 **Next Steps:**\n• Some steps had issues"));
    }

    #[test]
    fn test_render_task_planner_has_no_insight_block() {
        let result = ExecutionResult::new(true, vec![step(1, true, None)], vec![], 0.0, vec![], None);
        let text = ResponseSynthesizer::new().render(AgentRole::TaskPlanner, &result);
        assert!(text.contains("✅ Successfully completed all 1 steps:"));
        assert!(!text.contains("**Key Insights:**"));
        assert!(!text.contains("Next Steps"));
    }

    #[test]
    fn test_render_engine_failure_is_appended() {
        let result = ExecutionResult::new(
            false,
            vec![step(1, true, Some(serde_json::json!({"data": "rows"})))],
            vec![],
            0.0,
            vec![],
            Some("Execution cancelled before step 2".to_string()),
        );
        let text = ResponseSynthesizer::new().render(AgentRole::ResearchAgent, &result);
        assert!(text.contains("   Result: rows..."));
        assert!(text.contains("⛔ Execution stopped early: Execution cancelled before step 2"));
    }
}
