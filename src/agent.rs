//! Headless Agent 服务
//!
//! 供 demo 与 HTTP 前端调用的无界面入口：chat_with_agent 对单条消息完成
//! 审核 → 语言规范化 → 分级 →（升级时）角色选择 / 规划 / 执行 / 合成，否则走工具路由 + 对话模型，
//! 最后译回原语言并审核输出。组件在构造时一次性建好，可被多个会话并发共享。
//! 会话的监管器与目标随 ContextStore 的 LRU 淘汰一起清理。

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;

use crate::config::AppConfig;
use crate::core::{AgentError, AgentStats, SessionSupervisor, StatsSnapshot};
use crate::integrations::{
    AllowAll, ChatClient, ContentModerator, EchoChat, EnglishOnly, LanguagePipeline,
};
use crate::memory::{ContextStore, Goal, GoalStatus, GoalTracker};
use crate::orchestrator::{
    AgentAnalysis, AgentRole, ExecutionEngine, Plan, RequirementClassifier, ResponseSynthesizer,
    RoleProfile, RoleSelector, TaskPlanner,
};
use crate::tools::{default_registry, ToolExecutor, ToolOutcome, ToolRegistry, ToolRouter};

const CHAT_FALLBACK_REPLY: &str = "I'm sorry, I couldn't generate a response right now.";

/// chat_with_agent 的回复
#[derive(Debug, Clone, Serialize)]
pub struct AgentReply {
    pub response: String,
    pub agent_used: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub agent_role: Option<AgentRole>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub plan: Option<Plan>,
    pub steps_completed: usize,
    pub completed: bool,
    pub tools_used: Vec<String>,
    pub execution_time: f64,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tool_results: Vec<ToolOutcome>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub blocked: bool,
    pub language: String,
    pub analysis: AgentAnalysis,
    pub session_id: String,
    pub timestamp: DateTime<Utc>,
}

impl AgentReply {
    fn new(session_id: &str, analysis: AgentAnalysis, language: String) -> Self {
        Self {
            response: String::new(),
            agent_used: false,
            agent_role: None,
            plan: None,
            steps_completed: 0,
            completed: false,
            tools_used: Vec::new(),
            execution_time: 0.0,
            tool_results: Vec::new(),
            error: None,
            blocked: false,
            language,
            analysis,
            session_id: session_id.to_string(),
            timestamp: Utc::now(),
        }
    }
}

pub struct AgentService {
    classifier: RequirementClassifier,
    selector: RoleSelector,
    planner: TaskPlanner,
    engine: ExecutionEngine,
    synthesizer: ResponseSynthesizer,
    router: ToolRouter,
    context: Arc<ContextStore>,
    goals: Arc<GoalTracker>,
    stats: Arc<AgentStats>,
    moderator: Arc<dyn ContentModerator>,
    language: Arc<dyn LanguagePipeline>,
    chat: Arc<dyn ChatClient>,
    supervisors: Mutex<HashMap<String, Arc<SessionSupervisor>>>,
}

impl AgentService {
    /// 以配置注册全部内置工具
    pub fn from_config(cfg: &AppConfig) -> Self {
        Self::new(cfg, default_registry(&cfg.tools))
    }

    /// 使用给定的工具注册表（测试可注入脚本化工具）
    pub fn new(cfg: &AppConfig, registry: ToolRegistry) -> Self {
        let stats = Arc::new(AgentStats::new());
        let context = Arc::new(ContextStore::new(cfg.agent.history_limit, cfg.agent.max_sessions));
        let executor = Arc::new(ToolExecutor::with_timeout_secs(
            Arc::new(registry),
            cfg.tools.tool_timeout_secs,
        ));
        let engine = ExecutionEngine::from_config(executor.clone(), context.clone(), stats.clone(), &cfg.agent);
        Self {
            classifier: RequirementClassifier::new(),
            selector: RoleSelector::new(),
            planner: TaskPlanner::new(stats.clone()),
            engine,
            synthesizer: ResponseSynthesizer::new(),
            router: ToolRouter::new(executor),
            context,
            goals: Arc::new(GoalTracker::new()),
            stats,
            moderator: Arc::new(AllowAll),
            language: Arc::new(EnglishOnly),
            chat: Arc::new(EchoChat),
            supervisors: Mutex::new(HashMap::new()),
        }
    }

    pub fn with_moderator(mut self, moderator: Arc<dyn ContentModerator>) -> Self {
        self.moderator = moderator;
        self
    }

    pub fn with_language_pipeline(mut self, language: Arc<dyn LanguagePipeline>) -> Self {
        self.language = language;
        self
    }

    pub fn with_chat_client(mut self, chat: Arc<dyn ChatClient>) -> Self {
        self.chat = chat;
        self
    }

    pub async fn chat_with_agent(&self, message: &str, session_id: &str) -> Result<AgentReply, AgentError> {
        self.stats.record_session();

        let verdict = self.moderator.check(message).await;
        if !verdict.safe {
            let reason = verdict.reason.unwrap_or_else(|| "content not allowed".to_string());
            tracing::warn!(session_id = %session_id, reason = %reason, "input blocked by moderation");
            let mut reply = AgentReply::new(session_id, self.classifier.analyze(""), "en".to_string());
            reply.blocked = true;
            reply.response = format!("I can't help with that request: {reason}");
            return Ok(reply);
        }

        let input = self.language.to_english(message).await;
        let analysis = self.classifier.analyze(&input.english_text);
        tracing::info!(
            session_id = %session_id,
            complexity = ?analysis.complexity,
            needs_agent = analysis.needs_agent,
            language = %input.language,
            "request classified"
        );

        self.context
            .set_preference(session_id, "language", Value::String(input.language.clone()))
            .await;

        let mut reply = AgentReply::new(session_id, analysis.clone(), input.language.clone());
        let english_response = if analysis.needs_agent {
            self.run_agent(&input.english_text, session_id, &mut reply).await?
        } else {
            self.run_tools_and_chat(&input.english_text, session_id, &mut reply).await
        };

        let localized = self.language.from_english(&english_response, &input.language).await;
        let verdict = self.moderator.check(&localized).await;
        reply.response = if verdict.safe {
            localized
        } else {
            let reason = verdict.reason.unwrap_or_else(|| "content not allowed".to_string());
            tracing::warn!(session_id = %session_id, reason = %reason, "response blocked by moderation");
            reply.blocked = true;
            format!("Response withheld: {reason}")
        };
        self.release_evicted_sessions().await;
        Ok(reply)
    }

    /// 清理已被 ContextStore 淘汰的会话的监管器与目标
    async fn release_evicted_sessions(&self) {
        let evicted = self.context.take_evicted();
        if evicted.is_empty() {
            return;
        }
        {
            let mut map = match self.supervisors.lock() {
                Ok(map) => map,
                Err(poisoned) => poisoned.into_inner(),
            };
            for session_id in &evicted {
                map.remove(session_id);
            }
        }
        for session_id in &evicted {
            self.goals.remove_session(session_id).await;
        }
        tracing::debug!(count = evicted.len(), "released evicted sessions");
    }

    async fn run_agent(&self, request: &str, session_id: &str, reply: &mut AgentReply) -> Result<String, AgentError> {
        let role = self.selector.select(request);
        let context = self.context.get(session_id).await;
        let tools = self.engine.executor().tool_names();
        let plan = self.planner.create_plan(request, &tools, role, &context)?;
        self.context
            .set_business_context(session_id, "last_agent_role", Value::String(role.as_str().to_string()))
            .await;

        let goal_id = uuid::Uuid::new_v4().to_string();
        self.goals.add_goal(session_id, Goal::new(&goal_id, plan.goal())).await;

        let token = self.supervisor(session_id).child_token();
        let result = self.engine.run_with_cancel(&plan, session_id, token).await;

        let total = plan.steps().len().max(1) as f64;
        self.goals
            .update_progress(session_id, &goal_id, result.success_count() as f64 / total)
            .await;
        if result.completed() {
            self.goals.set_status(session_id, &goal_id, GoalStatus::Completed).await;
        }

        let text = self.synthesizer.render(role, &result);
        reply.agent_used = true;
        reply.agent_role = Some(role);
        reply.steps_completed = result.steps().len();
        reply.completed = result.completed();
        reply.tools_used = result.tools_used().to_vec();
        reply.execution_time = result.execution_time_secs();
        reply.error = result.error().map(str::to_string);
        reply.plan = Some(plan);
        Ok(text)
    }

    async fn run_tools_and_chat(&self, message: &str, session_id: &str, reply: &mut AgentReply) -> String {
        let analysis = self.router.analyze(message);
        let prompt = if analysis.needs_tools {
            let outcomes = self.router.execute(&analysis.tools, message).await;
            let prompt = self.router.enhanced_prompt(message, &outcomes);
            reply.tools_used = outcomes.iter().map(|o| o.tool.clone()).collect();
            reply.tool_results = outcomes;
            prompt
        } else {
            message.to_string()
        };
        match self.chat.respond(&prompt, session_id).await {
            Ok(text) => text,
            Err(e) => {
                tracing::warn!(session_id = %session_id, error = %e, "chat client failed, using fallback reply");
                CHAT_FALLBACK_REPLY.to_string()
            }
        }
    }

    /// 取消该会话正在执行的计划；会话不存在时返回 false
    pub fn cancel(&self, session_id: &str) -> bool {
        let supervisor = match self.supervisors.lock() {
            Ok(map) => map.get(session_id).cloned(),
            Err(poisoned) => poisoned.into_inner().get(session_id).cloned(),
        };
        match supervisor {
            Some(supervisor) => {
                tracing::info!(session_id = %session_id, "cancelling session execution");
                supervisor.cancel();
                true
            }
            None => false,
        }
    }

    /// 当前持有监管器的会话数
    pub fn supervised_sessions(&self) -> usize {
        match self.supervisors.lock() {
            Ok(map) => map.len(),
            Err(poisoned) => poisoned.into_inner().len(),
        }
    }

    fn supervisor(&self, session_id: &str) -> Arc<SessionSupervisor> {
        let mut map = match self.supervisors.lock() {
            Ok(map) => map,
            Err(poisoned) => poisoned.into_inner(),
        };
        map.entry(session_id.to_string()).or_default().clone()
    }

    pub fn available_agents(&self) -> Vec<RoleProfile> {
        AgentRole::ALL.iter().map(|role| role.profile()).collect()
    }

    pub fn stats(&self) -> StatsSnapshot {
        self.stats.snapshot()
    }

    pub fn context(&self) -> &Arc<ContextStore> {
        &self.context
    }

    pub fn goals(&self) -> &Arc<GoalTracker> {
        &self.goals
    }

    pub fn tool_catalog(&self) -> Vec<Value> {
        self.engine.executor().registry().catalog()
    }

    pub fn tool_usage(&self) -> HashMap<String, u64> {
        self.router.usage_stats()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::integrations::WordlistModerator;
    use crate::tools::CalculateTool;

    fn service() -> AgentService {
        let mut cfg = AppConfig::default();
        cfg.agent.simulated_step_delay_ms = 0;
        let mut registry = ToolRegistry::new();
        registry.register(CalculateTool);
        AgentService::new(&cfg, registry)
    }

    #[tokio::test]
    async fn test_simple_message_goes_to_chat_with_tools() {
        let service = service();
        let reply = service.chat_with_agent("calculate 6*7", "s1").await.unwrap();
        assert!(!reply.agent_used);
        assert_eq!(reply.tools_used, vec!["calculate"]);
        assert!(reply.response.starts_with("Echo: Original User Message: calculate 6*7"));
        assert_eq!(service.stats().agent_sessions, 1);
        assert_eq!(service.stats().plans_created, 0);
    }

    #[tokio::test]
    async fn test_project_request_runs_plan_and_tracks_goal() {
        let service = service();
        let reply = service
            .chat_with_agent("Create a project plan for our new mobile app", "s2")
            .await
            .unwrap();
        assert!(reply.agent_used);
        assert_eq!(reply.agent_role, Some(AgentRole::ProjectManager));
        assert_eq!(reply.steps_completed, 4);
        assert!(reply.completed);
        assert!(reply.response.contains("📋 **Project Plan:**"));

        let stats = service.stats();
        assert_eq!(stats.plans_created, 1);
        assert_eq!(stats.plans_completed, 1);
        assert_eq!(stats.steps_executed, 4);
        assert_eq!(stats.errors_recovered, 1);

        assert_eq!(service.context().get("s2").await.task_history.len(), 4);
        assert!(service.goals().get_active_goals("s2").await.is_empty());
    }

    #[tokio::test]
    async fn test_blocked_input_short_circuits() {
        let service = service().with_moderator(Arc::new(WordlistModerator::new(["forbidden"])));
        let reply = service.chat_with_agent("analyze forbidden things", "s3").await.unwrap();
        assert!(reply.blocked);
        assert!(!reply.agent_used);
        assert_eq!(service.stats().plans_created, 0);
    }

    #[tokio::test]
    async fn test_session_state_follows_context_eviction() {
        let mut cfg = AppConfig::default();
        cfg.agent.simulated_step_delay_ms = 0;
        cfg.agent.max_sessions = Some(3);
        let service = AgentService::new(&cfg, ToolRegistry::new());

        for i in 0..8 {
            let reply = service
                .chat_with_agent("Create a project plan for the launch", &format!("s{i}"))
                .await
                .unwrap();
            assert!(reply.agent_used);
        }
        assert!(service.context().session_count().await <= 3);
        assert!(service.supervised_sessions() <= 3);
        assert!(service.goals().session_count().await <= 3);

        let ctx = service.context().get("s7").await;
        assert_eq!(ctx.user_preferences["language"], "en");
        assert_eq!(ctx.business_context["last_agent_role"], "project_manager");
    }

    #[test]
    fn test_available_agents_lists_every_role() {
        let agents = service().available_agents();
        assert_eq!(agents.len(), 5);
        assert_eq!(agents[0].role, AgentRole::CustomerSupport);
    }

    #[test]
    fn test_cancel_unknown_session() {
        assert!(!service().cancel("nobody"));
    }
}
