//! 外部行情类工具：天气（OpenWeatherMap）与股价（Alpha Vantage GLOBAL_QUOTE）
//!
//! 未配置 API Key 时直接返回错误，不发请求。

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;

use crate::tools::schema::{parse_args, schema_of, LocationArgs, SymbolArgs};
use crate::tools::Tool;

fn http_client(timeout_secs: u64) -> Client {
    Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .build()
        .unwrap_or_default()
}

/// get_weather 工具
pub struct WeatherTool {
    client: Client,
    endpoint: String,
    api_key: Option<String>,
}

impl WeatherTool {
    pub fn new(endpoint: impl Into<String>, api_key: Option<String>, timeout_secs: u64) -> Self {
        Self {
            client: http_client(timeout_secs),
            endpoint: endpoint.into(),
            api_key,
        }
    }
}

/// 提取温度、描述、湿度、风速
pub fn parse_weather(location: &str, data: &Value) -> Result<Value, String> {
    let missing = || format!("Weather data not found for {location}");
    Ok(serde_json::json!({
        "location": data.get("name").and_then(|v| v.as_str()).ok_or_else(missing)?,
        "temperature": data.pointer("/main/temp").and_then(|v| v.as_f64()).ok_or_else(missing)?,
        "description": data.pointer("/weather/0/description").and_then(|v| v.as_str()).unwrap_or(""),
        "humidity": data.pointer("/main/humidity").cloned().unwrap_or(Value::Null),
        "wind_speed": data.pointer("/wind/speed").cloned().unwrap_or(Value::Null),
    }))
}

#[async_trait]
impl Tool for WeatherTool {
    fn name(&self) -> &str {
        "get_weather"
    }

    fn description(&self) -> &str {
        "Get current weather for any location"
    }

    fn parameters_schema(&self) -> Value {
        schema_of::<LocationArgs>()
    }

    async fn execute(&self, args: Value) -> Result<Value, String> {
        let LocationArgs { location } = parse_args(self.name(), args)?;
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| "Weather API key not configured".to_string())?;
        let resp = self
            .client
            .get(&self.endpoint)
            .query(&[("q", location.as_str()), ("appid", api_key), ("units", "metric")])
            .send()
            .await
            .map_err(|e| format!("Weather service error: {e}"))?;
        if !resp.status().is_success() {
            return Err(format!("Weather data not found for {location}"));
        }
        let data: Value = resp
            .json()
            .await
            .map_err(|e| format!("Weather service error: {e}"))?;
        parse_weather(&location, &data)
    }
}

/// get_stock_price 工具
pub struct StockPriceTool {
    client: Client,
    endpoint: String,
    api_key: Option<String>,
}

impl StockPriceTool {
    pub fn new(endpoint: impl Into<String>, api_key: Option<String>, timeout_secs: u64) -> Self {
        Self {
            client: http_client(timeout_secs),
            endpoint: endpoint.into(),
            api_key,
        }
    }
}

/// 解析 "Global Quote" 对象
pub fn parse_quote(symbol: &str, data: &Value) -> Result<Value, String> {
    let quote = data
        .get("Global Quote")
        .filter(|q| q.as_object().is_some_and(|o| !o.is_empty()))
        .ok_or_else(|| format!("Stock data not found for {symbol}"))?;
    let field = |key: &str| quote.get(key).and_then(|v| v.as_str()).unwrap_or("").to_string();
    let price: f64 = field("05. price")
        .parse()
        .map_err(|_| format!("Stock data not found for {symbol}"))?;
    Ok(serde_json::json!({
        "symbol": field("01. symbol"),
        "price": price,
        "change": field("09. change"),
        "change_percent": field("10. change percent"),
        "volume": field("06. volume"),
    }))
}

#[async_trait]
impl Tool for StockPriceTool {
    fn name(&self) -> &str {
        "get_stock_price"
    }

    fn description(&self) -> &str {
        "Get current stock price information"
    }

    fn parameters_schema(&self) -> Value {
        schema_of::<SymbolArgs>()
    }

    async fn execute(&self, args: Value) -> Result<Value, String> {
        let SymbolArgs { symbol } = parse_args(self.name(), args)?;
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| "Stock API key not configured".to_string())?;
        let resp = self
            .client
            .get(&self.endpoint)
            .query(&[("function", "GLOBAL_QUOTE"), ("symbol", symbol.as_str()), ("apikey", api_key)])
            .send()
            .await
            .map_err(|e| format!("Stock service error: {e}"))?;
        let data: Value = resp
            .json()
            .await
            .map_err(|e| format!("Stock service error: {e}"))?;
        parse_quote(&symbol, &data)
    }
}
