//! 会话上下文存储
//!
//! 每个会话一份 SessionContext：最近 N 条任务结果（FIFO，默认 10）、用户偏好、业务上下文。
//! 外层 RwLock 只保护会话表的查找与插入，每个会话自带 Mutex，不同会话的更新互不阻塞。
//! 可选 max_sessions：达到上限时按最近访问淘汰最久未用的会话（LRU）。
//! 只淘汰当前无人持有的槽位，正在被 update 写入的会话不会被淘汰；全部槽位都在使用时暂时超出上限。
//! 被淘汰的会话 id 暂存起来，由 take_evicted 取走，供上层清理同一会话的其他状态。

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex as StdMutex};

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use tokio::sync::{Mutex, RwLock};

pub const DEFAULT_HISTORY_LIMIT: usize = 10;

/// 一条任务记录
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TaskRecord {
    pub timestamp: DateTime<Utc>,
    pub info: Value,
}

/// 会话上下文快照
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SessionContext {
    pub task_history: VecDeque<TaskRecord>,
    pub user_preferences: HashMap<String, Value>,
    pub business_context: HashMap<String, Value>,
}

struct SessionSlot {
    last_access: AtomicU64,
    context: Mutex<SessionContext>,
}

/// 会话上下文存储
pub struct ContextStore {
    sessions: RwLock<HashMap<String, Arc<SessionSlot>>>,
    history_limit: usize,
    max_sessions: Option<usize>,
    clock: AtomicU64,
    evicted: StdMutex<Vec<String>>,
}

impl ContextStore {
    pub fn new(history_limit: usize, max_sessions: Option<usize>) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            history_limit: history_limit.max(1),
            max_sessions: max_sessions.filter(|m| *m > 0),
            clock: AtomicU64::new(0),
            evicted: StdMutex::new(Vec::new()),
        }
    }

    /// 会话上下文快照；未知会话返回默认值（不创建会话）
    pub async fn get(&self, session_id: &str) -> SessionContext {
        let slot = self.sessions.read().await.get(session_id).cloned();
        match slot {
            Some(slot) => {
                self.touch(&slot);
                slot.context.lock().await.clone()
            }
            None => SessionContext::default(),
        }
    }

    /// 追加一条任务记录，只保留最近 history_limit 条
    pub async fn update(&self, session_id: &str, info: Value) {
        let slot = self.slot(session_id).await;
        let mut ctx = slot.context.lock().await;
        ctx.task_history.push_back(TaskRecord {
            timestamp: Utc::now(),
            info,
        });
        while ctx.task_history.len() > self.history_limit {
            ctx.task_history.pop_front();
        }
    }

    pub async fn set_preference(&self, session_id: &str, key: impl Into<String>, value: Value) {
        let slot = self.slot(session_id).await;
        slot.context.lock().await.user_preferences.insert(key.into(), value);
    }

    pub async fn set_business_context(&self, session_id: &str, key: impl Into<String>, value: Value) {
        let slot = self.slot(session_id).await;
        slot.context.lock().await.business_context.insert(key.into(), value);
    }

    pub async fn session_count(&self) -> usize {
        self.sessions.read().await.len()
    }

    /// 确保会话存在并刷新其访问时间
    pub async fn register(&self, session_id: &str) {
        self.slot(session_id).await;
    }

    /// 取走自上次调用以来被淘汰的会话 id
    pub fn take_evicted(&self) -> Vec<String> {
        match self.evicted.lock() {
            Ok(mut evicted) => std::mem::take(&mut *evicted),
            Err(poisoned) => std::mem::take(&mut *poisoned.into_inner()),
        }
    }

    fn touch(&self, slot: &SessionSlot) {
        let now = self.clock.fetch_add(1, Ordering::Relaxed);
        slot.last_access.store(now, Ordering::Relaxed);
    }

    /// 取得（必要时创建）会话槽位
    async fn slot(&self, session_id: &str) -> Arc<SessionSlot> {
        if let Some(slot) = self.sessions.read().await.get(session_id).cloned() {
            self.touch(&slot);
            return slot;
        }

        let mut sessions = self.sessions.write().await;
        if let Some(slot) = sessions.get(session_id).cloned() {
            self.touch(&slot);
            return slot;
        }
        if let Some(max) = self.max_sessions {
            while sessions.len() >= max {
                // strong_count == 1：只有会话表持有，没有进行中的读写
                let oldest = sessions
                    .iter()
                    .filter(|(_, slot)| Arc::strong_count(slot) == 1)
                    .min_by_key(|(_, slot)| slot.last_access.load(Ordering::Relaxed))
                    .map(|(id, _)| id.clone());
                let Some(id) = oldest else {
                    tracing::debug!(sessions = sessions.len(), "all session slots busy, exceeding cap");
                    break;
                };
                sessions.remove(&id);
                tracing::info!(session_id = %id, "evicted least recently used session context");
                match self.evicted.lock() {
                    Ok(mut evicted) => evicted.push(id),
                    Err(poisoned) => poisoned.into_inner().push(id),
                }
            }
        }
        let slot = Arc::new(SessionSlot {
            last_access: AtomicU64::new(self.clock.fetch_add(1, Ordering::Relaxed)),
            context: Mutex::new(SessionContext::default()),
        });
        sessions.insert(session_id.to_string(), slot.clone());
        slot
    }
}

impl Default for ContextStore {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_LIMIT, None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_get_unknown_session_is_default() {
        let store = ContextStore::default();
        let ctx = store.get("nobody").await;
        assert!(ctx.task_history.is_empty());
        assert_eq!(store.session_count().await, 0);
    }

    #[tokio::test]
    async fn test_history_keeps_most_recent_ten_in_order() {
        let store = ContextStore::default();
        for i in 0..25 {
            store.update("s1", json!({ "n": i })).await;
        }
        let ctx = store.get("s1").await;
        assert_eq!(ctx.task_history.len(), 10);
        let ns: Vec<i64> = ctx
            .task_history
            .iter()
            .map(|r| r.info["n"].as_i64().unwrap())
            .collect();
        assert_eq!(ns, (15..25).collect::<Vec<_>>());
    }

    #[tokio::test]
    async fn test_eleventh_entry_evicts_oldest() {
        let store = ContextStore::default();
        for i in 0..11 {
            store.update("s1", json!(i)).await;
        }
        let ctx = store.get("s1").await;
        assert_eq!(ctx.task_history.front().unwrap().info, json!(1));
        assert_eq!(ctx.task_history.back().unwrap().info, json!(10));
    }

    #[tokio::test]
    async fn test_sessions_are_isolated() {
        let store = ContextStore::default();
        store.update("a", json!("x")).await;
        store.set_preference("b", "language", json!("fr")).await;
        assert_eq!(store.get("a").await.task_history.len(), 1);
        assert!(store.get("b").await.task_history.is_empty());
        assert_eq!(store.get("b").await.user_preferences["language"], json!("fr"));
    }

    #[tokio::test]
    async fn test_concurrent_updates_same_session() {
        let store = Arc::new(ContextStore::new(100, None));
        let mut handles = Vec::new();
        for i in 0..50 {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                store.update("shared", json!(i)).await;
            }));
        }
        for h in handles {
            h.await.unwrap();
        }
        assert_eq!(store.get("shared").await.task_history.len(), 50);
    }

    #[tokio::test]
    async fn test_lru_eviction_on_session_cap() {
        let store = ContextStore::new(10, Some(2));
        store.update("a", json!(1)).await;
        store.update("b", json!(1)).await;
        // 访问 a，使 b 成为最久未用
        let _ = store.get("a").await;
        store.update("c", json!(1)).await;

        assert_eq!(store.session_count().await, 2);
        assert_eq!(store.get("a").await.task_history.len(), 1);
        assert!(store.get("b").await.task_history.is_empty());
        assert_eq!(store.get("c").await.task_history.len(), 1);
        assert_eq!(store.take_evicted(), vec!["b".to_string()]);
        assert!(store.take_evicted().is_empty());
    }

    #[tokio::test]
    async fn test_busy_slot_is_not_evicted() {
        let store = ContextStore::new(10, Some(1));
        store.update("a", json!(1)).await;
        let held = store.slot("a").await;
        store.update("b", json!(1)).await;
        // a 仍被持有，只能暂时超出上限
        assert_eq!(store.session_count().await, 2);
        assert!(store.take_evicted().is_empty());
        drop(held);

        store.register("c").await;
        assert_eq!(store.session_count().await, 1);
        assert_eq!(store.take_evicted().len(), 2);
    }

    #[tokio::test]
    async fn test_business_context_is_per_session() {
        let store = ContextStore::default();
        store.set_business_context("s1", "last_agent_role", json!("data_analyst")).await;
        assert_eq!(store.get("s1").await.business_context["last_agent_role"], json!("data_analyst"));
        assert!(store.get("s2").await.business_context.is_empty());
    }
}
