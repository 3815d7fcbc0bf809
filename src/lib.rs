//! taskpilot - 任务规划与执行的对话后端
//!
//! 模块划分：
//! - **agent**: 无头 Agent 服务（demo 与 HTTP 前端调用）
//! - **config**: 应用配置加载（TOML + 环境变量）
//! - **core**: 错误与恢复、统计、会话监管
//! - **integrations**: 审核 / 语言 / 对话模型等外部协作方接口
//! - **memory**: 会话上下文与长期目标
//! - **orchestrator**: 需求分级、角色选择、计划、执行引擎、回复合成
//! - **tools**: 工具注册表、执行器、内置工具与非 Agent 路由

pub mod agent;
pub mod config;
pub mod core;
pub mod integrations;
pub mod memory;
pub mod observability;
pub mod orchestrator;
pub mod tools;

pub use agent::{AgentReply, AgentService};
