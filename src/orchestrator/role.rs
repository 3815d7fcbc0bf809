//! Agent 角色与角色选择
//!
//! RoleSelector 按固定优先级扫描关键词组，首个命中即返回：
//! 客服 > 数据分析 > 调研 > 项目管理 > 通用任务规划（默认）。
//! 请求同时命中多组时总是落在排在前面的一组。

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::core::AgentError;

/// Agent 角色（封闭集合，match 穷尽检查）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentRole {
    TaskPlanner,
    ResearchAgent,
    DataAnalyst,
    CustomerSupport,
    ProjectManager,
}

impl AgentRole {
    pub const ALL: [AgentRole; 5] = [
        AgentRole::CustomerSupport,
        AgentRole::DataAnalyst,
        AgentRole::ResearchAgent,
        AgentRole::ProjectManager,
        AgentRole::TaskPlanner,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AgentRole::TaskPlanner => "task_planner",
            AgentRole::ResearchAgent => "research_agent",
            AgentRole::DataAnalyst => "data_analyst",
            AgentRole::CustomerSupport => "customer_support",
            AgentRole::ProjectManager => "project_manager",
        }
    }

    /// 面向用户的名称，如 "customer support"
    pub fn display_name(&self) -> String {
        self.as_str().replace('_', " ")
    }

    /// 未知角色名回退到默认的 TaskPlanner
    pub fn parse_or_default(name: &str) -> Self {
        name.parse().unwrap_or(AgentRole::TaskPlanner)
    }

    /// 角色简介与能力列表（/agents/available）
    pub fn profile(&self) -> RoleProfile {
        let (name, description, capabilities): (&str, &str, &[&str]) = match self {
            AgentRole::CustomerSupport => (
                "Customer Support Agent",
                "Handle customer issues professionally",
                &["issue triage", "resolution research", "follow-up planning"],
            ),
            AgentRole::DataAnalyst => (
                "Data Analysis Agent",
                "Analyze data and provide business insights",
                &["data retrieval", "statistical analysis", "benchmarking"],
            ),
            AgentRole::ResearchAgent => (
                "Research Agent",
                "Conduct comprehensive research and analysis",
                &["web research", "cross-referencing", "report compilation"],
            ),
            AgentRole::ProjectManager => (
                "Project Manager Agent",
                "Create detailed project plans and timelines",
                &["scope definition", "resource estimation", "timeline planning"],
            ),
            AgentRole::TaskPlanner => (
                "Task Planner Agent",
                "Break down and execute complex tasks",
                &["task decomposition", "tool orchestration", "result validation"],
            ),
        };
        RoleProfile {
            role: *self,
            name: name.to_string(),
            description: description.to_string(),
            capabilities: capabilities.iter().map(|c| c.to_string()).collect(),
        }
    }
}

impl fmt::Display for AgentRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AgentRole {
    type Err = AgentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        AgentRole::ALL
            .into_iter()
            .find(|role| role.as_str() == s)
            .ok_or_else(|| AgentError::UnknownRole(s.to_string()))
    }
}

/// 角色介绍
#[derive(Debug, Clone, Serialize)]
pub struct RoleProfile {
    pub role: AgentRole,
    pub name: String,
    pub description: String,
    pub capabilities: Vec<String>,
}

/// 按优先级排列的 (关键词组, 角色)
const ROLE_RULES: &[(&[&str], AgentRole)] = &[
    (
        &["customer", "support", "complaint", "issue", "problem", "help customer"],
        AgentRole::CustomerSupport,
    ),
    (
        &["analyze", "data", "metrics", "statistics", "trends", "performance"],
        AgentRole::DataAnalyst,
    ),
    (
        &["research", "investigate", "find information", "compare", "competitive"],
        AgentRole::ResearchAgent,
    ),
    (
        &["project", "plan", "timeline", "schedule", "manage", "coordinate"],
        AgentRole::ProjectManager,
    ),
];

/// 确定性的角色选择器（无状态）
#[derive(Debug, Default, Clone, Copy)]
pub struct RoleSelector;

impl RoleSelector {
    pub fn new() -> Self {
        Self
    }

    pub fn select(&self, request: &str) -> AgentRole {
        let lower = request.to_lowercase();
        ROLE_RULES
            .iter()
            .find(|(keywords, _)| keywords.iter().any(|k| lower.contains(k)))
            .map(|(_, role)| *role)
            .unwrap_or(AgentRole::TaskPlanner)
    }
}
