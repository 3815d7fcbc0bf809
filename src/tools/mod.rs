pub mod calculate;
pub mod executor;
pub mod filesystem;
pub mod market;
pub mod query_data;
pub mod registry;
pub mod router;
pub mod schema;
pub mod search;

pub use calculate::CalculateTool;
pub use executor::ToolExecutor;
pub use filesystem::{ReadFileTool, SafeFs};
pub use market::{StockPriceTool, WeatherTool};
pub use query_data::QueryDataTool;
pub use registry::{Tool, ToolRegistry};
pub use router::{ToolAnalysis, ToolOutcome, ToolRouter};
pub use search::SearchWebTool;

use crate::config::ToolsSection;

/// 按配置注册全部内置工具
pub fn default_registry(cfg: &ToolsSection) -> ToolRegistry {
    let mut registry = ToolRegistry::new();
    registry.register(CalculateTool);
    registry.register(QueryDataTool::new(cfg.data.database_path.clone()));
    registry.register(ReadFileTool::new(&cfg.files.allowed_dirs, cfg.files.max_chars));
    registry.register(SearchWebTool::new(cfg.search.endpoint.clone(), cfg.search.timeout_secs));
    registry.register(WeatherTool::new(
        cfg.weather.endpoint.clone(),
        cfg.weather.resolved_api_key(),
        cfg.weather.timeout_secs,
    ));
    registry.register(StockPriceTool::new(
        cfg.stock.endpoint.clone(),
        cfg.stock.resolved_api_key(),
        cfg.stock.timeout_secs,
    ));
    registry
}
