//! 任务规划：角色 → 固定模板 → Plan
//!
//! 每个角色对应一个纯函数模板，模板只产出步骤草稿；编号与元数据由 Plan::assemble 计算。

use std::sync::Arc;

use crate::core::{AgentError, AgentStats};
use crate::memory::SessionContext;
use crate::orchestrator::plan::{Plan, StepDraft, StepParams};
use crate::orchestrator::AgentRole;
use crate::tools::schema::{
    ContentArgs, DataArgs, ExpressionArgs, InputArgs, QueryArgs, RequestArgs, ToolsArgs,
};

pub struct TaskPlanner {
    stats: Arc<AgentStats>,
}

impl TaskPlanner {
    pub fn new(stats: Arc<AgentStats>) -> Self {
        Self { stats }
    }

    /// 按角色模板生成计划；每次调用计一次 plans_created
    pub fn create_plan(
        &self,
        request: &str,
        available_tools: &[String],
        role: AgentRole,
        context: &SessionContext,
    ) -> Result<Plan, AgentError> {
        let (goal, drafts) = match role {
            AgentRole::CustomerSupport => customer_support_template(),
            AgentRole::DataAnalyst => data_analysis_template(),
            AgentRole::ResearchAgent => research_template(),
            AgentRole::ProjectManager => project_template(),
            AgentRole::TaskPlanner => general_template(request, available_tools),
        };
        let plan = Plan::assemble(goal, role, drafts)?;
        self.stats.record_plan_created();
        tracing::info!(
            role = %role,
            goal = %plan.goal(),
            steps = plan.steps().len(),
            prior_tasks = context.task_history.len(),
            "plan created"
        );
        Ok(plan)
    }

    /// 以角色名规划；未知角色名使用通用模板
    pub fn create_plan_for_role_name(
        &self,
        request: &str,
        available_tools: &[String],
        role_name: &str,
        context: &SessionContext,
    ) -> Result<Plan, AgentError> {
        self.create_plan(
            request,
            available_tools,
            AgentRole::parse_or_default(role_name),
            context,
        )
    }
}

fn query(q: &str) -> QueryArgs {
    QueryArgs { query: q.to_string() }
}

fn expression(e: &str) -> ExpressionArgs {
    ExpressionArgs {
        expression: e.to_string(),
    }
}

fn data(d: &str) -> DataArgs {
    DataArgs { data: d.to_string() }
}

fn customer_support_template() -> (&'static str, Vec<StepDraft>) {
    (
        "Resolve customer issue efficiently",
        vec![
            StepDraft::new(
                "Gather customer information and issue details",
                StepParams::QueryData(query("customer information")),
                "customer_profile",
            ),
            StepDraft::new(
                "Analyze issue type and severity",
                StepParams::Calculate(expression("issue_analysis")),
                "issue_classification",
            ),
            StepDraft::new(
                "Generate resolution recommendations",
                StepParams::SearchWeb(query("solution for customer issue")),
                "resolution_options",
            ),
            StepDraft::new(
                "Create follow-up plan",
                StepParams::GenerateDocument(ContentArgs {
                    content: "follow_up_plan".to_string(),
                }),
                "action_plan",
            ),
        ],
    )
}

fn data_analysis_template() -> (&'static str, Vec<StepDraft>) {
    (
        "Analyze data and provide insights",
        vec![
            StepDraft::new(
                "Query relevant data sources",
                StepParams::QueryData(query("data retrieval")),
                "raw_data",
            ),
            StepDraft::new(
                "Perform statistical calculations",
                StepParams::Calculate(expression("statistical_analysis")),
                "statistics",
            ),
            StepDraft::new(
                "Search for industry benchmarks",
                StepParams::SearchWeb(query("industry benchmarks")),
                "benchmark_data",
            ),
            StepDraft::new(
                "Generate insights and recommendations",
                StepParams::Synthesize(data("analysis_results")),
                "insights_report",
            ),
        ],
    )
}

fn research_template() -> (&'static str, Vec<StepDraft>) {
    (
        "Conduct comprehensive research",
        vec![
            StepDraft::new(
                "Initial web search for overview",
                StepParams::SearchWeb(query("research topic overview")),
                "initial_findings",
            ),
            StepDraft::new(
                "Deep dive into specific aspects",
                StepParams::SearchWeb(query("detailed research")),
                "detailed_information",
            ),
            StepDraft::new(
                "Cross-reference with internal data",
                StepParams::QueryData(query("internal_data")),
                "internal_insights",
            ),
            StepDraft::new(
                "Compile comprehensive report",
                StepParams::Synthesize(data("all_research")),
                "research_report",
            ),
        ],
    )
}

fn project_template() -> (&'static str, Vec<StepDraft>) {
    (
        "Create comprehensive project plan",
        vec![
            StepDraft::new(
                "Define project scope and requirements",
                StepParams::Analyze(InputArgs {
                    input: "project_requirements".to_string(),
                }),
                "project_scope",
            ),
            StepDraft::new(
                "Estimate timeline and resources",
                StepParams::Calculate(expression("resource_calculation")),
                "resource_plan",
            ),
            StepDraft::new(
                "Research best practices and methodologies",
                StepParams::SearchWeb(query("project management best practices")),
                "methodology_guide",
            ),
            StepDraft::new(
                "Create detailed project timeline",
                StepParams::GeneratePlan(data("project_data")),
                "project_timeline",
            ),
        ],
    )
}

fn general_template(request: &str, available_tools: &[String]) -> (&'static str, Vec<StepDraft>) {
    (
        "Complete multi-step task efficiently",
        vec![
            StepDraft::new(
                "Analyze the request and gather information",
                StepParams::AnalyzeRequest(RequestArgs {
                    request: request.to_string(),
                }),
                "analysis",
            ),
            StepDraft::new(
                "Execute primary task using available tools",
                StepParams::ExecutePrimary(ToolsArgs {
                    tools: available_tools.to_vec(),
                }),
                "primary_result",
            ),
            StepDraft::new(
                "Validate and enhance results",
                StepParams::ValidateResults(data("primary_result")),
                "validated_result",
            ),
        ],
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::orchestrator::Action;

    fn planner() -> (TaskPlanner, Arc<AgentStats>) {
        let stats = Arc::new(AgentStats::new());
        (TaskPlanner::new(stats.clone()), stats)
    }

    fn actions(plan: &Plan) -> Vec<Action> {
        plan.steps().iter().map(|s| s.action()).collect()
    }

    #[test]
    fn test_customer_support_template() {
        let (planner, stats) = planner();
        let plan = planner
            .create_plan("late delivery", &[], AgentRole::CustomerSupport, &SessionContext::default())
            .unwrap();
        assert_eq!(plan.goal(), "Resolve customer issue efficiently");
        assert_eq!(
            actions(&plan),
            vec![Action::QueryData, Action::Calculate, Action::SearchWeb, Action::GenerateDocument]
        );
        assert_eq!(plan.metadata().estimated_duration_secs, 60);
        assert_eq!(plan.metadata().complexity_score, 0.6);
        assert_eq!(plan.metadata().agent_role, AgentRole::CustomerSupport);
        assert!(plan.validate().is_ok());
        assert_eq!(stats.snapshot().plans_created, 1);
    }

    #[test]
    fn test_research_template_searches_twice() {
        let (planner, _) = planner();
        let plan = planner
            .create_plan("x", &[], AgentRole::ResearchAgent, &SessionContext::default())
            .unwrap();
        assert_eq!(
            actions(&plan),
            vec![Action::SearchWeb, Action::SearchWeb, Action::QueryData, Action::Synthesize]
        );
        assert_eq!(plan.steps()[3].expected_output(), "research_report");
    }

    #[test]
    fn test_general_template_carries_request_and_tools() {
        let (planner, _) = planner();
        let tools = vec!["calculate".to_string(), "search_web".to_string()];
        let plan = planner
            .create_plan("do the thing", &tools, AgentRole::TaskPlanner, &SessionContext::default())
            .unwrap();
        assert_eq!(plan.steps().len(), 3);
        assert_eq!(plan.metadata().estimated_duration_secs, 37);
        assert_eq!(
            plan.steps()[0].params(),
            &StepParams::AnalyzeRequest(RequestArgs {
                request: "do the thing".to_string()
            })
        );
        assert_eq!(plan.steps()[1].params(), &StepParams::ExecutePrimary(ToolsArgs { tools }));
    }

    #[test]
    fn test_unknown_role_name_uses_general_template() {
        let (planner, stats) = planner();
        let plan = planner
            .create_plan_for_role_name("x", &[], "astronaut", &SessionContext::default())
            .unwrap();
        assert_eq!(plan.goal(), "Complete multi-step task efficiently");
        assert_eq!(plan.role(), AgentRole::TaskPlanner);

        let plan = planner
            .create_plan_for_role_name("x", &[], "project_manager", &SessionContext::default())
            .unwrap();
        assert_eq!(plan.goal(), "Create comprehensive project plan");
        assert_eq!(stats.snapshot().plans_created, 2);
    }
}
