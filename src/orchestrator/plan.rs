//! 计划数据模型：Plan / Step / Action / StepParams
//!
//! 动作与参数是同一个带标签的值（StepParams），序列化为
//! `{"action": "search_web", "parameters": {"query": "..."}}`，步骤不可能带着别的动作的参数。
//! Plan 的字段只读；经 Plan::assemble 构造的计划保证步骤 id 为 1..N。

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::core::AgentError;
use crate::orchestrator::AgentRole;
use crate::tools::schema::{
    ContentArgs, DataArgs, ExpressionArgs, FilePathArgs, InputArgs, LocationArgs, QueryArgs,
    RequestArgs, SymbolArgs, ToolsArgs,
};

/// 封闭的动作目录
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    Calculate,
    QueryData,
    SearchWeb,
    GetWeather,
    GetStockPrice,
    ReadFile,
    Analyze,
    AnalyzeRequest,
    ExecutePrimary,
    ValidateResults,
    GenerateDocument,
    GeneratePlan,
    Synthesize,
}

impl Action {
    pub fn as_str(&self) -> &'static str {
        match self {
            Action::Calculate => "calculate",
            Action::QueryData => "query_data",
            Action::SearchWeb => "search_web",
            Action::GetWeather => "get_weather",
            Action::GetStockPrice => "get_stock_price",
            Action::ReadFile => "read_file",
            Action::Analyze => "analyze",
            Action::AnalyzeRequest => "analyze_request",
            Action::ExecutePrimary => "execute_primary",
            Action::ValidateResults => "validate_results",
            Action::GenerateDocument => "generate_document",
            Action::GeneratePlan => "generate_plan",
            Action::Synthesize => "synthesize",
        }
    }

    /// 动作到工具名的固定映射；None 表示该动作没有对应工具（走模拟执行）
    pub fn tool_name(&self) -> Option<&'static str> {
        match self {
            Action::Calculate
            | Action::QueryData
            | Action::SearchWeb
            | Action::GetWeather
            | Action::GetStockPrice
            | Action::ReadFile => Some(self.as_str()),
            Action::Analyze
            | Action::AnalyzeRequest
            | Action::ExecutePrimary
            | Action::ValidateResults
            | Action::GenerateDocument
            | Action::GeneratePlan
            | Action::Synthesize => None,
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 按动作区分的步骤参数
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", content = "parameters", rename_all = "snake_case")]
pub enum StepParams {
    Calculate(ExpressionArgs),
    QueryData(QueryArgs),
    SearchWeb(QueryArgs),
    GetWeather(LocationArgs),
    GetStockPrice(SymbolArgs),
    ReadFile(FilePathArgs),
    Analyze(InputArgs),
    AnalyzeRequest(RequestArgs),
    ExecutePrimary(ToolsArgs),
    ValidateResults(DataArgs),
    GenerateDocument(ContentArgs),
    GeneratePlan(DataArgs),
    Synthesize(DataArgs),
}

impl StepParams {
    pub fn action(&self) -> Action {
        match self {
            StepParams::Calculate(_) => Action::Calculate,
            StepParams::QueryData(_) => Action::QueryData,
            StepParams::SearchWeb(_) => Action::SearchWeb,
            StepParams::GetWeather(_) => Action::GetWeather,
            StepParams::GetStockPrice(_) => Action::GetStockPrice,
            StepParams::ReadFile(_) => Action::ReadFile,
            StepParams::Analyze(_) => Action::Analyze,
            StepParams::AnalyzeRequest(_) => Action::AnalyzeRequest,
            StepParams::ExecutePrimary(_) => Action::ExecutePrimary,
            StepParams::ValidateResults(_) => Action::ValidateResults,
            StepParams::GenerateDocument(_) => Action::GenerateDocument,
            StepParams::GeneratePlan(_) => Action::GeneratePlan,
            StepParams::Synthesize(_) => Action::Synthesize,
        }
    }

    /// 工具调用参数（JSON 对象）
    pub fn to_args(&self) -> Value {
        let args = match self {
            StepParams::Calculate(a) => serde_json::to_value(a),
            StepParams::QueryData(a) | StepParams::SearchWeb(a) => serde_json::to_value(a),
            StepParams::GetWeather(a) => serde_json::to_value(a),
            StepParams::GetStockPrice(a) => serde_json::to_value(a),
            StepParams::ReadFile(a) => serde_json::to_value(a),
            StepParams::Analyze(a) => serde_json::to_value(a),
            StepParams::AnalyzeRequest(a) => serde_json::to_value(a),
            StepParams::ExecutePrimary(a) => serde_json::to_value(a),
            StepParams::ValidateResults(a)
            | StepParams::GeneratePlan(a)
            | StepParams::Synthesize(a) => serde_json::to_value(a),
            StepParams::GenerateDocument(a) => serde_json::to_value(a),
        };
        args.unwrap_or_default()
    }
}

/// 计划中的一步（规划后不可变）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Step {
    id: u32,
    description: String,
    #[serde(flatten)]
    params: StepParams,
    expected_output: String,
}

impl Step {
    pub fn id(&self) -> u32 {
        self.id
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn action(&self) -> Action {
        self.params.action()
    }

    pub fn params(&self) -> &StepParams {
        &self.params
    }

    pub fn expected_output(&self) -> &str {
        &self.expected_output
    }
}

/// 尚未编号的步骤，由模板产出，Plan::assemble 按位置分配 id
#[derive(Debug, Clone)]
pub struct StepDraft {
    pub description: String,
    pub params: StepParams,
    pub expected_output: String,
}

impl StepDraft {
    pub fn new(
        description: impl Into<String>,
        params: StepParams,
        expected_output: impl Into<String>,
    ) -> Self {
        Self {
            description: description.into(),
            params,
            expected_output: expected_output.into(),
        }
    }
}

/// 计划元数据（计算得出，不来自模板）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanMetadata {
    pub created_at: DateTime<Utc>,
    pub agent_role: AgentRole,
    #[serde(rename = "estimated_duration")]
    pub estimated_duration_secs: u64,
    pub complexity_score: f64,
}

/// 执行计划：目标 + 有序步骤 + 元数据
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Plan {
    goal: String,
    steps: Vec<Step>,
    metadata: PlanMetadata,
}

impl Plan {
    /// 按位置编号（1..N）并计算元数据；空步骤列表返回 InvalidPlan
    pub fn assemble(
        goal: impl Into<String>,
        role: AgentRole,
        drafts: Vec<StepDraft>,
    ) -> Result<Self, AgentError> {
        if drafts.is_empty() {
            return Err(AgentError::InvalidPlan("plan has no steps".to_string()));
        }
        let steps: Vec<Step> = drafts
            .into_iter()
            .zip(1u32..)
            .map(|(draft, id)| Step {
                id,
                description: draft.description,
                params: draft.params,
                expected_output: draft.expected_output,
            })
            .collect();
        let n = steps.len();
        Ok(Self {
            goal: goal.into(),
            metadata: PlanMetadata {
                created_at: Utc::now(),
                agent_role: role,
                estimated_duration_secs: estimate_duration_secs(n),
                complexity_score: complexity_score(n),
            },
            steps,
        })
    }

    pub fn goal(&self) -> &str {
        &self.goal
    }

    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    pub fn metadata(&self) -> &PlanMetadata {
        &self.metadata
    }

    pub fn role(&self) -> AgentRole {
        self.metadata.agent_role
    }

    /// 校验步骤非空且 id 为 1..N（反序列化得到的计划不经过 assemble）
    pub fn validate(&self) -> Result<(), AgentError> {
        if self.steps.is_empty() {
            return Err(AgentError::InvalidPlan("plan has no steps".to_string()));
        }
        for (step, expected) in self.steps.iter().zip(1u32..) {
            if step.id != expected {
                return Err(AgentError::InvalidPlan(format!(
                    "step at position {expected} has id {}",
                    step.id
                )));
            }
        }
        Ok(())
    }
}

/// floor(5 * N * (1 + 0.5 * N))，整数运算
pub fn estimate_duration_secs(step_count: usize) -> u64 {
    let n = step_count as u64;
    5 * n * (n + 2) / 2
}

pub fn complexity_score(step_count: usize) -> f64 {
    match step_count {
        0..=2 => 0.3,
        3..=4 => 0.6,
        _ => 0.9,
    }
}
