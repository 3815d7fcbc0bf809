//! SearchWeb 工具：DuckDuckGo Instant Answer API
//!
//! GET 请求带超时与 User-Agent；从 JSON 响应中提取 Answer / Abstract / Definition 与前三个相关主题。

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;

use crate::tools::schema::{parse_args, schema_of, QueryArgs};
use crate::tools::Tool;

pub struct SearchWebTool {
    client: Client,
    endpoint: String,
}

impl SearchWebTool {
    pub fn new(endpoint: impl Into<String>, timeout_secs: u64) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .user_agent(concat!("taskpilot/", env!("CARGO_PKG_VERSION")))
            .build()
            .unwrap_or_default();
        Self {
            client,
            endpoint: endpoint.into(),
        }
    }
}

/// 从 Instant Answer 响应中取出摘要字段
pub fn summarize_instant_answer(query: &str, data: &Value) -> Value {
    let text = |key: &str| data.get(key).and_then(|v| v.as_str()).unwrap_or("").to_string();
    let related: Vec<String> = data
        .get("RelatedTopics")
        .and_then(|v| v.as_array())
        .map(|topics| {
            topics
                .iter()
                .take(3)
                .map(|t| t.get("Text").and_then(|v| v.as_str()).unwrap_or("").to_string())
                .collect()
        })
        .unwrap_or_default();
    serde_json::json!({
        "query": query,
        "answer": text("Answer"),
        "abstract": text("Abstract"),
        "definition": text("Definition"),
        "related_topics": related,
    })
}

#[async_trait]
impl Tool for SearchWebTool {
    fn name(&self) -> &str {
        "search_web"
    }

    fn description(&self) -> &str {
        "Search the internet for current information"
    }

    fn parameters_schema(&self) -> Value {
        schema_of::<QueryArgs>()
    }

    async fn execute(&self, args: Value) -> Result<Value, String> {
        let QueryArgs { query } = parse_args(self.name(), args)?;
        tracing::info!(query = %query, "search_web tool execute");
        let resp = self
            .client
            .get(&self.endpoint)
            .query(&[
                ("q", query.as_str()),
                ("format", "json"),
                ("no_html", "1"),
                ("skip_disambig", "1"),
            ])
            .send()
            .await
            .map_err(|e| format!("Web search error: {e}"))?;
        if !resp.status().is_success() {
            return Err(format!("Web search error: HTTP {}", resp.status()));
        }
        let data: Value = resp
            .json()
            .await
            .map_err(|e| format!("Web search error: {e}"))?;
        Ok(summarize_instant_answer(&query, &data))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summarize_takes_three_topics() {
        let data = serde_json::json!({
            "Answer": "",
            "Abstract": "Rust is a language.",
            "RelatedTopics": [
                {"Text": "a"}, {"Text": "b"}, {"Text": "c"}, {"Text": "d"}
            ]
        });
        let out = summarize_instant_answer("rust", &data);
        assert_eq!(out["abstract"], "Rust is a language.");
        assert_eq!(out["definition"], "");
        assert_eq!(out["related_topics"], serde_json::json!(["a", "b", "c"]));
    }

    #[test]
    fn test_summarize_tolerates_empty_payload() {
        let out = summarize_instant_answer("x", &Value::Null);
        assert_eq!(out["related_topics"], serde_json::json!([]));
    }
}
