//! Agent 编排：需求分级 → 角色选择 → 计划 → 执行 → 回复合成

pub mod classifier;
pub mod engine;
pub mod outcome;
pub mod plan;
pub mod planner;
pub mod role;
pub mod synthesizer;

pub use classifier::{AgentAnalysis, RequirementClassifier, TaskComplexity};
pub use engine::{follow_up_suggestions, is_completed, ExecutionEngine};
pub use outcome::{ExecutionResult, StepResult, StepStatus, ToolUsage};
pub use plan::{Action, Plan, PlanMetadata, Step, StepDraft, StepParams};
pub use planner::TaskPlanner;
pub use role::{AgentRole, RoleProfile, RoleSelector};
pub use synthesizer::ResponseSynthesizer;
