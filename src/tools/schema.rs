//! 步骤参数类型与 JSON Schema（schemars 自动生成）
//!
//! 每个动作一份小型参数结构体：TaskPlanner 用它构造步骤，内置工具用它解析 args，
//! Tool::parameters_schema 用它生成声明的参数形状，三处共享同一定义。

use schemars::{schema_for, JsonSchema};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// calculate 参数
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ExpressionArgs {
    /// 算术表达式，如 "25 * 4 + 100"
    pub expression: String,
}

/// query_data / search_web 参数
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct QueryArgs {
    pub query: String,
}

/// get_weather 参数
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct LocationArgs {
    /// 城市名，如 "Tokyo"
    pub location: String,
}

/// get_stock_price 参数
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct SymbolArgs {
    /// 股票代码，如 "AAPL"
    pub symbol: String,
}

/// read_file 参数
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct FilePathArgs {
    pub file_path: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct InputArgs {
    pub input: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct RequestArgs {
    pub request: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct DataArgs {
    pub data: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ContentArgs {
    pub content: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ToolsArgs {
    pub tools: Vec<String>,
}

/// 返回参数类型的 JSON Schema，用作 Tool::parameters_schema
pub fn schema_of<T: JsonSchema>() -> Value {
    serde_json::to_value(schema_for!(T)).unwrap_or_else(|_| {
        serde_json::json!({
            "type": "object",
            "properties": {},
            "required": []
        })
    })
}

/// 把 args 解析为参数结构体，失败时给出工具侧错误信息
pub fn parse_args<T: for<'de> Deserialize<'de>>(tool: &str, args: Value) -> Result<T, String> {
    serde_json::from_value(args).map_err(|e| format!("Invalid arguments for {tool}: {e}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_lists_required_field() {
        let schema = schema_of::<ExpressionArgs>();
        let required = schema["required"].as_array().unwrap();
        assert!(required.iter().any(|v| v == "expression"));
        assert!(schema["properties"]["expression"].is_object());
    }

    #[test]
    fn test_parse_args_rejects_wrong_shape() {
        let err = parse_args::<SymbolArgs>("get_stock_price", serde_json::json!({"ticker": "AAPL"}))
            .unwrap_err();
        assert!(err.contains("get_stock_price"));
        let ok: SymbolArgs =
            parse_args("get_stock_price", serde_json::json!({"symbol": "AAPL"})).unwrap();
        assert_eq!(ok.symbol, "AAPL");
    }
}
