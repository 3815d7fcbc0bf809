//! 需求分级：决定请求是否升级为 Agent 计划
//!
//! 统计两组固定词表的命中数（大小写无关的子串判断，每个词只计一次），
//! 按「workflow > 0 → WORKFLOW；indicator ≥ 2 → COMPLEX；indicator = 1 → MODERATE；否则 SIMPLE」定级。

use serde::Serialize;

/// 多步骤任务指示词
const AGENT_INDICATORS: &[&str] = &[
    "analyze", "plan", "create", "generate", "research", "investigate", "compare", "optimize",
    "automate", "process", "workflow", "strategy", "report", "summary", "recommend", "solve",
    "handle", "manage",
];

/// 业务流程短语
const WORKFLOW_PATTERNS: &[&str] = &[
    "customer support",
    "data analysis",
    "project planning",
    "research",
    "sales process",
    "marketing campaign",
    "business plan",
    "competitive analysis",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskComplexity {
    /// 单次工具调用即可
    Simple,
    /// 2-3 步
    Moderate,
    /// 4 步以上，含决策点
    Complex,
    /// 业务流程
    Workflow,
}

/// 分级结果
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AgentAnalysis {
    pub needs_agent: bool,
    pub complexity: TaskComplexity,
    pub agent_score: usize,
    pub workflow_score: usize,
    pub confidence: f64,
}

#[derive(Debug, Default, Clone, Copy)]
pub struct RequirementClassifier;

impl RequirementClassifier {
    pub fn new() -> Self {
        Self
    }

    pub fn analyze(&self, request: &str) -> AgentAnalysis {
        let lower = request.to_lowercase();
        let agent_score = count_matches(&lower, AGENT_INDICATORS);
        let workflow_score = count_matches(&lower, WORKFLOW_PATTERNS);

        let complexity = if workflow_score > 0 {
            TaskComplexity::Workflow
        } else if agent_score >= 2 {
            TaskComplexity::Complex
        } else if agent_score == 1 {
            TaskComplexity::Moderate
        } else {
            TaskComplexity::Simple
        };

        AgentAnalysis {
            needs_agent: complexity != TaskComplexity::Simple,
            complexity,
            agent_score,
            workflow_score,
            confidence: ((agent_score + workflow_score) as f64 / 3.0).min(0.9),
        }
    }
}

fn count_matches(text: &str, words: &[&str]) -> usize {
    words.iter().filter(|w| text.contains(*w)).count()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simple_request() {
        let a = RequirementClassifier::new().analyze("What's the weather like in Tokyo?");
        assert_eq!(a.complexity, TaskComplexity::Simple);
        assert!(!a.needs_agent);
        assert_eq!(a.confidence, 0.0);
    }

    #[test]
    fn test_moderate_and_complex() {
        let c = RequirementClassifier::new();
        let moderate = c.analyze("Please summarize nothing, just optimize it");
        assert_eq!(moderate.agent_score, 1);
        assert_eq!(moderate.complexity, TaskComplexity::Moderate);
        assert!(moderate.needs_agent);

        let complex = c.analyze("Analyze the logs and recommend fixes");
        assert_eq!(complex.agent_score, 2);
        assert_eq!(complex.complexity, TaskComplexity::Complex);
    }

    #[test]
    fn test_workflow_takes_priority() {
        let a = RequirementClassifier::new().analyze("We need a marketing campaign");
        assert_eq!(a.workflow_score, 1);
        assert_eq!(a.agent_score, 0);
        assert_eq!(a.complexity, TaskComplexity::Workflow);
    }

    #[test]
    fn test_repeated_word_counts_once() {
        let a = RequirementClassifier::new().analyze("optimize optimize OPTIMIZE");
        assert_eq!(a.agent_score, 1);
    }

    #[test]
    fn test_confidence_capped() {
        // research 同时出现在两组词表中
        let a = RequirementClassifier::new()
            .analyze("Research, analyze and compare, then create a report");
        assert!(a.agent_score + a.workflow_score >= 3);
        assert_eq!(a.confidence, 0.9);
    }
}
