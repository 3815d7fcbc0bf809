//! 长期目标跟踪
//!
//! 按会话保存目标列表（插入顺序）；进度范围 [0, 1] 由调用方保证，越界只记 warn。
//! 每个会话只保留最近 completed_limit 个已完成目标，更早的在完成时丢弃。

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GoalStatus {
    Active,
    Paused,
    Completed,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Goal {
    pub id: String,
    pub description: String,
    pub progress: f64,
    pub status: GoalStatus,
    pub last_updated: Option<DateTime<Utc>>,
}

impl Goal {
    pub fn new(id: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            description: description.into(),
            progress: 0.0,
            status: GoalStatus::Active,
            last_updated: None,
        }
    }
}

pub const DEFAULT_COMPLETED_GOAL_LIMIT: usize = 10;

pub struct GoalTracker {
    goals: RwLock<HashMap<String, Vec<Goal>>>,
    completed_limit: usize,
}

impl GoalTracker {
    pub fn new() -> Self {
        Self::with_completed_limit(DEFAULT_COMPLETED_GOAL_LIMIT)
    }

    pub fn with_completed_limit(completed_limit: usize) -> Self {
        Self {
            goals: RwLock::new(HashMap::new()),
            completed_limit,
        }
    }

    pub async fn add_goal(&self, session_id: &str, goal: Goal) {
        self.goals
            .write()
            .await
            .entry(session_id.to_string())
            .or_default()
            .push(goal);
    }

    /// 更新进度；找不到 goal_id 时什么也不做
    pub async fn update_progress(&self, session_id: &str, goal_id: &str, progress: f64) {
        if !(0.0..=1.0).contains(&progress) {
            tracing::warn!(session_id, goal_id, progress, "goal progress outside [0, 1]");
        }
        self.modify(session_id, goal_id, |goal| goal.progress = progress).await;
    }

    pub async fn set_status(&self, session_id: &str, goal_id: &str, status: GoalStatus) {
        self.modify(session_id, goal_id, |goal| goal.status = status).await;
        if status == GoalStatus::Completed {
            self.prune_completed(session_id).await;
        }
    }

    /// 丢弃该会话的全部目标（会话被淘汰时调用）
    pub async fn remove_session(&self, session_id: &str) {
        self.goals.write().await.remove(session_id);
    }

    pub async fn session_count(&self) -> usize {
        self.goals.read().await.len()
    }

    /// 该会话保存的目标总数（含已完成）
    pub async fn goal_count(&self, session_id: &str) -> usize {
        self.goals.read().await.get(session_id).map_or(0, Vec::len)
    }

    async fn prune_completed(&self, session_id: &str) {
        let mut goals = self.goals.write().await;
        let Some(list) = goals.get_mut(session_id) else {
            return;
        };
        let completed = list.iter().filter(|g| g.status == GoalStatus::Completed).count();
        let mut excess = completed.saturating_sub(self.completed_limit);
        list.retain(|g| {
            if excess > 0 && g.status == GoalStatus::Completed {
                excess -= 1;
                false
            } else {
                true
            }
        });
    }

    /// 未完成的目标，按插入顺序
    pub async fn get_active_goals(&self, session_id: &str) -> Vec<Goal> {
        self.goals
            .read()
            .await
            .get(session_id)
            .map(|goals| {
                goals
                    .iter()
                    .filter(|g| g.status != GoalStatus::Completed)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default()
    }

    async fn modify(&self, session_id: &str, goal_id: &str, f: impl Fn(&mut Goal)) {
        let mut goals = self.goals.write().await;
        if let Some(list) = goals.get_mut(session_id) {
            for goal in list.iter_mut().filter(|g| g.id == goal_id) {
                f(goal);
                goal.last_updated = Some(Utc::now());
            }
        }
    }
}

impl Default for GoalTracker {
    fn default() -> Self {
        Self::new()
    }
}
