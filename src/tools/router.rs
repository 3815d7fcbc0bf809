//! 非 Agent 路径的工具路由
//!
//! 按关键词组挑选工具、从原始消息中抽取参数，经 ToolExecutor 执行后拼出交给对话模型的增强上下文。
//! 关键词组顺序即执行顺序：weather → calculate → read_file → search → stock → data。

use std::collections::HashMap;
use std::sync::{Arc, Mutex, OnceLock};

use regex::Regex;
use serde::Serialize;
use serde_json::Value;

use crate::tools::ToolExecutor;

const KEYWORD_GROUPS: &[(&str, &[&str])] = &[
    ("get_weather", &["weather", "temperature", "rain", "sunny", "cloudy"]),
    ("calculate", &["calculate", "compute", "+", "-", "*", "/", "math"]),
    ("read_file", &["read file", "file content", "document"]),
    ("search_web", &["search", "latest", "current news", "recent"]),
    ("get_stock_price", &["stock", "share price", "ticker", "market"]),
    ("query_data", &["data", "database", "records", "analytics"]),
];

const SEARCH_STOP_WORDS: &[&str] = &["what", "is", "the", "search", "for", "about", "tell", "me"];

const DEFAULT_LOCATION: &str = "New York";
const DEFAULT_EXPRESSION: &str = "2+2";
const DEFAULT_FILE_PATH: &str = "./documents/sample.txt";
const DEFAULT_SYMBOL: &str = "AAPL";

static MATH_RE: OnceLock<Option<Regex>> = OnceLock::new();

/// 关键词分析结果
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ToolAnalysis {
    pub needs_tools: bool,
    pub tools: Vec<String>,
    pub confidence: f64,
}

/// 单个工具的执行结果
#[derive(Debug, Clone, Serialize)]
pub struct ToolOutcome {
    pub tool: String,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub parameters: Value,
}

pub struct ToolRouter {
    executor: Arc<ToolExecutor>,
    usage: Mutex<HashMap<String, u64>>,
}

impl ToolRouter {
    pub fn new(executor: Arc<ToolExecutor>) -> Self {
        Self {
            executor,
            usage: Mutex::new(HashMap::new()),
        }
    }

    pub fn analyze(&self, message: &str) -> ToolAnalysis {
        let lower = message.to_lowercase();
        let tools: Vec<String> = KEYWORD_GROUPS
            .iter()
            .filter(|(_, words)| words.iter().any(|w| lower.contains(w)))
            .map(|(tool, _)| tool.to_string())
            .collect();
        ToolAnalysis {
            needs_tools: !tools.is_empty(),
            confidence: if tools.is_empty() { 0.1 } else { 0.8 },
            tools,
        }
    }

    /// 依次执行选中的工具；未注册的工具跳过，失败的工具记录错误并继续
    pub async fn execute(&self, tools: &[String], message: &str) -> Vec<ToolOutcome> {
        let mut outcomes = Vec::with_capacity(tools.len());
        for tool in tools {
            if !self.executor.has_tool(tool) {
                tracing::debug!(tool = %tool, "routed tool not registered, skipping");
                continue;
            }
            let parameters = extract_parameters(tool, message);
            let outcome = match self.executor.execute(tool, parameters.clone()).await {
                Ok(data) => ToolOutcome {
                    tool: tool.clone(),
                    success: true,
                    data: Some(data),
                    error: None,
                    parameters,
                },
                Err(e) => {
                    tracing::warn!(tool = %tool, error = %e, "routed tool failed");
                    ToolOutcome {
                        tool: tool.clone(),
                        success: false,
                        data: None,
                        error: Some(e.to_string()),
                        parameters,
                    }
                }
            };
            outcomes.push(outcome);
        }
        self.track_usage(tools);
        outcomes
    }

    /// 交给对话模型的上下文：原始消息 + 各工具结果
    pub fn enhanced_prompt(&self, message: &str, outcomes: &[ToolOutcome]) -> String {
        let mut prompt = format!("Original User Message: {message}\n\nTool Results:\n");
        for outcome in outcomes {
            match (&outcome.data, &outcome.error) {
                (Some(data), _) if outcome.success => {
                    let pretty = serde_json::to_string_pretty(data).unwrap_or_else(|_| data.to_string());
                    prompt.push_str(&format!("- {}: {}\n", outcome.tool, pretty));
                }
                (_, error) => {
                    let error = error.as_deref().unwrap_or("unknown error");
                    prompt.push_str(&format!("- {}: Error - {}\n", outcome.tool, error));
                }
            }
        }
        prompt.push_str("\nPlease provide a comprehensive response using the tool results above.");
        prompt
    }

    /// 各工具被路由的次数
    pub fn usage_stats(&self) -> HashMap<String, u64> {
        match self.usage.lock() {
            Ok(usage) => usage.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    fn track_usage(&self, tools: &[String]) {
        let mut usage = match self.usage.lock() {
            Ok(usage) => usage,
            Err(poisoned) => poisoned.into_inner(),
        };
        for tool in tools {
            *usage.entry(tool.clone()).or_insert(0) += 1;
        }
    }
}

/// 按工具从消息中抽取参数
pub fn extract_parameters(tool: &str, message: &str) -> Value {
    match tool {
        "get_weather" => serde_json::json!({ "location": extract_location(message) }),
        "calculate" => serde_json::json!({ "expression": extract_math_expression(message) }),
        "read_file" => serde_json::json!({ "file_path": extract_file_path(message) }),
        "search_web" => serde_json::json!({ "query": extract_search_query(message) }),
        "get_stock_price" => serde_json::json!({ "symbol": extract_stock_symbol(message) }),
        "query_data" => serde_json::json!({ "query": message }),
        _ => Value::Object(Default::default()),
    }
}

fn extract_location(message: &str) -> String {
    let words: Vec<&str> = message.split_whitespace().collect();
    words
        .windows(2)
        .find(|pair| matches!(pair[0].to_lowercase().as_str(), "in" | "at" | "for"))
        .map(|pair| pair[1].trim_matches(|c| matches!(c, '.' | ',' | '!' | '?')).to_string())
        .unwrap_or_else(|| DEFAULT_LOCATION.to_string())
}

fn extract_math_expression(message: &str) -> String {
    let re = MATH_RE.get_or_init(|| Regex::new(r"[\d+\-*/().]+\s*").ok());
    let joined: String = re
        .as_ref()
        .map(|re| re.find_iter(message).map(|m| m.as_str()).collect())
        .unwrap_or_default();
    if joined.is_empty() {
        DEFAULT_EXPRESSION.to_string()
    } else {
        joined
    }
}

fn extract_file_path(message: &str) -> String {
    message
        .split_whitespace()
        .find(|w| w.contains('.') && (w.contains('/') || w.contains('\\')))
        .unwrap_or(DEFAULT_FILE_PATH)
        .to_string()
}

fn extract_search_query(message: &str) -> String {
    message
        .split_whitespace()
        .filter(|w| !SEARCH_STOP_WORDS.contains(&w.to_lowercase().as_str()))
        .collect::<Vec<_>>()
        .join(" ")
}

fn extract_stock_symbol(message: &str) -> String {
    message
        .split_whitespace()
        .find(|w| {
            (1..=5).contains(&w.chars().count())
                && w.chars().any(|c| c.is_alphabetic())
                && !w.chars().any(|c| c.is_lowercase())
        })
        .unwrap_or(DEFAULT_SYMBOL)
        .to_string()
}
