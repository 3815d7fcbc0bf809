//! 应用配置：从 config/default.toml 与环境变量加载
//!
//! 加载顺序：先读 TOML 文件，再用环境变量 `TASKPILOT__*` 覆盖（双下划线表示嵌套，
//! 如 `TASKPILOT__AGENT__HISTORY_LIMIT=20`）。第三方 API Key 未配置时回退到
//! `OPENWEATHER_API_KEY` / `ALPHAVANTAGE_API_KEY`。

use std::path::PathBuf;

use serde::Deserialize;

/// 应用配置根（对应 config/default.toml 的顶层）
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub app: AppSection,
    pub agent: AgentSection,
    pub tools: ToolsSection,
    pub server: ServerSection,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppSection {
    pub name: Option<String>,
}

impl AppSection {
    /// 日志与 demo 标题使用的名称，未配置时为 "taskpilot"
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or("taskpilot")
    }
}

/// [agent] 段：会话记忆、完成阈值、模拟步骤延迟、会话淘汰与计划截止时间
#[derive(Debug, Clone, Deserialize)]
pub struct AgentSection {
    /// 每个会话保留的任务记录条数
    #[serde(default = "default_history_limit")]
    pub history_limit: usize,
    /// 成功步骤占比达到该百分比（向上取整）即视为完成
    #[serde(default = "default_completion_threshold_percent")]
    pub completion_threshold_percent: u32,
    /// 无对应工具的动作模拟执行耗时（毫秒）
    #[serde(default = "default_simulated_step_delay_ms")]
    pub simulated_step_delay_ms: u64,
    /// 会话上限；超出时淘汰最久未用的会话。未设置则不淘汰
    #[serde(default)]
    pub max_sessions: Option<usize>,
    /// 单个计划的总执行时限（秒）；每步开始前检查
    #[serde(default)]
    pub plan_deadline_secs: Option<u64>,
}

fn default_history_limit() -> usize {
    crate::memory::DEFAULT_HISTORY_LIMIT
}

fn default_completion_threshold_percent() -> u32 {
    70
}

fn default_simulated_step_delay_ms() -> u64 {
    1000
}

impl Default for AgentSection {
    fn default() -> Self {
        Self {
            history_limit: default_history_limit(),
            completion_threshold_percent: default_completion_threshold_percent(),
            simulated_step_delay_ms: default_simulated_step_delay_ms(),
            max_sessions: None,
            plan_deadline_secs: None,
        }
    }
}

/// [tools] 段：工具超时与各内置工具的设置
#[derive(Debug, Clone, Deserialize)]
pub struct ToolsSection {
    /// 单次工具调用超时（秒）
    #[serde(default = "default_tool_timeout_secs")]
    pub tool_timeout_secs: u64,
    #[serde(default)]
    pub files: FilesSection,
    #[serde(default)]
    pub search: SearchSection,
    #[serde(default)]
    pub weather: WeatherSection,
    #[serde(default)]
    pub stock: StockSection,
    #[serde(default)]
    pub data: DataSection,
}

fn default_tool_timeout_secs() -> u64 {
    30
}

impl Default for ToolsSection {
    fn default() -> Self {
        Self {
            tool_timeout_secs: default_tool_timeout_secs(),
            files: FilesSection::default(),
            search: SearchSection::default(),
            weather: WeatherSection::default(),
            stock: StockSection::default(),
            data: DataSection::default(),
        }
    }
}

/// [tools.files] 段：read_file 允许的目录与最大返回字符数
#[derive(Debug, Clone, Deserialize)]
pub struct FilesSection {
    #[serde(default = "default_allowed_dirs")]
    pub allowed_dirs: Vec<PathBuf>,
    #[serde(default = "default_max_file_chars")]
    pub max_chars: usize,
}

fn default_allowed_dirs() -> Vec<PathBuf> {
    vec!["./uploads".into(), "./documents".into(), "./data".into()]
}

fn default_max_file_chars() -> usize {
    5000
}

impl Default for FilesSection {
    fn default() -> Self {
        Self {
            allowed_dirs: default_allowed_dirs(),
            max_chars: default_max_file_chars(),
        }
    }
}

/// [tools.search] 段：DuckDuckGo Instant Answer
#[derive(Debug, Clone, Deserialize)]
pub struct SearchSection {
    #[serde(default = "default_search_endpoint")]
    pub endpoint: String,
    #[serde(default = "default_http_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_search_endpoint() -> String {
    "https://api.duckduckgo.com/".to_string()
}

fn default_http_timeout_secs() -> u64 {
    5
}

impl Default for SearchSection {
    fn default() -> Self {
        Self {
            endpoint: default_search_endpoint(),
            timeout_secs: default_http_timeout_secs(),
        }
    }
}

/// [tools.weather] 段：OpenWeatherMap
#[derive(Debug, Clone, Deserialize)]
pub struct WeatherSection {
    #[serde(default = "default_weather_endpoint")]
    pub endpoint: String,
    pub api_key: Option<String>,
    #[serde(default = "default_http_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_weather_endpoint() -> String {
    "http://api.openweathermap.org/data/2.5/weather".to_string()
}

impl Default for WeatherSection {
    fn default() -> Self {
        Self {
            endpoint: default_weather_endpoint(),
            api_key: None,
            timeout_secs: default_http_timeout_secs(),
        }
    }
}

impl WeatherSection {
    pub fn resolved_api_key(&self) -> Option<String> {
        self.api_key
            .clone()
            .or_else(|| std::env::var("OPENWEATHER_API_KEY").ok())
            .filter(|k| !k.is_empty())
    }
}

/// [tools.stock] 段：Alpha Vantage
#[derive(Debug, Clone, Deserialize)]
pub struct StockSection {
    #[serde(default = "default_stock_endpoint")]
    pub endpoint: String,
    pub api_key: Option<String>,
    #[serde(default = "default_http_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_stock_endpoint() -> String {
    "https://www.alphavantage.co/query".to_string()
}

impl Default for StockSection {
    fn default() -> Self {
        Self {
            endpoint: default_stock_endpoint(),
            api_key: None,
            timeout_secs: default_http_timeout_secs(),
        }
    }
}

impl StockSection {
    pub fn resolved_api_key(&self) -> Option<String> {
        self.api_key
            .clone()
            .or_else(|| std::env::var("ALPHAVANTAGE_API_KEY").ok())
            .filter(|k| !k.is_empty())
    }
}

/// [tools.data] 段：分析数据库（SQLite）
#[derive(Debug, Clone, Deserialize)]
pub struct DataSection {
    #[serde(default = "default_database_path")]
    pub database_path: PathBuf,
}

fn default_database_path() -> PathBuf {
    "data/chatbot_analytics.db".into()
}

impl Default for DataSection {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
        }
    }
}

/// [server] 段：HTTP 服务监听地址（taskpilot-web）
#[derive(Debug, Clone, Deserialize)]
pub struct ServerSection {
    #[serde(default = "default_bind")]
    pub bind: String,
}

fn default_bind() -> String {
    "127.0.0.1:8000".to_string()
}

impl Default for ServerSection {
    fn default() -> Self {
        Self { bind: default_bind() }
    }
}

pub const DEFAULT_CONFIG_PATH: &str = "config/default.toml";

/// 读取配置文件（未指定时为 config/default.toml，缺失则全部取默认值），再叠加 TASKPILOT__* 环境变量
pub fn load_config(config_path: Option<PathBuf>) -> Result<AppConfig, config::ConfigError> {
    let path = config_path.unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH));
    if !path.exists() {
        tracing::debug!(path = %path.display(), "config file not found, using defaults");
    }
    config::Config::builder()
        .add_source(config::File::from(path).required(false))
        .add_source(
            config::Environment::with_prefix("TASKPILOT")
                .separator("__")
                .try_parsing(true),
        )
        .build()?
        .try_deserialize()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cfg = AppConfig::default();
        assert_eq!(cfg.agent.history_limit, 10);
        assert_eq!(cfg.agent.completion_threshold_percent, 70);
        assert_eq!(cfg.agent.simulated_step_delay_ms, 1000);
        assert!(cfg.agent.max_sessions.is_none());
        assert_eq!(cfg.tools.tool_timeout_secs, 30);
        assert_eq!(cfg.tools.files.max_chars, 5000);
        assert_eq!(cfg.tools.files.allowed_dirs.len(), 3);
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let cfg: AppConfig = config::Config::builder()
            .add_source(config::File::from_str(
                "[agent]\nmax_sessions = 500\n[tools.files]\nmax_chars = 100\n",
                config::FileFormat::Toml,
            ))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();
        assert_eq!(cfg.agent.max_sessions, Some(500));
        assert_eq!(cfg.agent.history_limit, 10);
        assert_eq!(cfg.tools.files.max_chars, 100);
        assert_eq!(cfg.tools.files.allowed_dirs.len(), 3);
        assert_eq!(cfg.server.bind, "127.0.0.1:8000");
    }

    #[test]
    fn test_load_config_from_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("taskpilot.toml");
        std::fs::write(&path, "[app]\nname = \"pilot-test\"\n[agent]\nplan_deadline_secs = 45\n").unwrap();

        let cfg = load_config(Some(path)).unwrap();
        assert_eq!(cfg.app.name.as_deref(), Some("pilot-test"));
        assert_eq!(cfg.agent.plan_deadline_secs, Some(45));
        assert_eq!(cfg.agent.completion_threshold_percent, 70);
    }

    #[test]
    fn test_missing_config_file_uses_defaults() {
        let dir = tempfile::TempDir::new().unwrap();
        let cfg = load_config(Some(dir.path().join("absent.toml"))).unwrap();
        assert_eq!(cfg.tools.tool_timeout_secs, 30);
        assert_eq!(cfg.app.display_name(), "taskpilot");
    }
}
