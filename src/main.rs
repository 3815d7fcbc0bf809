//! taskpilot demo
//!
//! 入口：初始化日志、加载配置，依次运行四个业务场景并打印回复与统计。

use anyhow::Context;
use taskpilot::{agent::AgentService, config::load_config, observability};

const SCENARIOS: &[(&str, &str)] = &[
    ("Analyze our Q4 sales performance and provide recommendations", "Data Analysis Agent"),
    ("Research our competitor's pricing strategy and compare with ours", "Research Agent"),
    ("Help me handle a customer complaint about late delivery", "Customer Support Agent"),
    ("Create a project plan for our new mobile app development", "Project Management Agent"),
];

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    observability::init();

    let cfg = load_config(None).context("Failed to load configuration")?;
    let service = AgentService::from_config(&cfg);

    println!("🤖 {} agent demo", cfg.app.display_name());
    println!("{}", "=".repeat(50));

    for (i, (message, label)) in SCENARIOS.iter().enumerate() {
        let session_id = format!("demo_session_{}", i + 1);
        println!("\n{}", "=".repeat(60));
        println!("Test {}: {label}", i + 1);
        println!("User: {message}");

        let reply = service
            .chat_with_agent(message, &session_id)
            .await
            .with_context(|| format!("Scenario {} failed", i + 1))?;

        println!("\n🤖 Agent Response:");
        println!("Agent Used: {}", reply.agent_used);
        println!(
            "Agent Role: {}",
            reply.agent_role.map(|r| r.to_string()).unwrap_or_else(|| "N/A".to_string())
        );
        println!("Steps Completed: {}", reply.steps_completed);
        println!("Tools Used: {:?}", reply.tools_used);
        println!("Response:\n{}", reply.response);
    }

    println!("\n{}", "=".repeat(60));
    println!("📊 Agent Performance Statistics:");
    let stats = serde_json::to_value(service.stats()).context("Failed to serialize stats")?;
    if let Some(map) = stats.as_object() {
        for (key, value) in map {
            println!("  {key}: {value}");
        }
    }
    Ok(())
}
