//! QueryData 工具：查询本地分析数据库（SQLite）
//!
//! 支持 "user count" 与 "recent chats" 两类查询，其余查询返回可用查询列表。
//! rusqlite 为同步接口，放到 spawn_blocking 中执行。

use std::path::PathBuf;

use async_trait::async_trait;
use rusqlite::{Connection, OpenFlags};
use serde_json::Value;

use crate::tools::schema::{parse_args, schema_of, QueryArgs};
use crate::tools::Tool;

pub struct QueryDataTool {
    database_path: PathBuf,
}

impl QueryDataTool {
    pub fn new(database_path: impl Into<PathBuf>) -> Self {
        Self {
            database_path: database_path.into(),
        }
    }
}

#[async_trait]
impl Tool for QueryDataTool {
    fn name(&self) -> &str {
        "query_data"
    }

    fn description(&self) -> &str {
        "Query internal data sources"
    }

    fn parameters_schema(&self) -> Value {
        schema_of::<QueryArgs>()
    }

    async fn execute(&self, args: Value) -> Result<Value, String> {
        let QueryArgs { query } = parse_args(self.name(), args)?;
        if !self.database_path.exists() {
            return Err("Analytics database not found".to_string());
        }
        let path = self.database_path.clone();
        let q = query.clone();
        let result = tokio::task::spawn_blocking(move || run_query(&path, &q))
            .await
            .map_err(|e| format!("Data query error: {e}"))??;
        Ok(serde_json::json!({
            "query": query,
            "result": result,
            "database": "chatbot_analytics",
        }))
    }
}

fn run_query(path: &std::path::Path, query: &str) -> Result<String, String> {
    let conn = Connection::open_with_flags(path, OpenFlags::SQLITE_OPEN_READ_ONLY)
        .map_err(|e| format!("Data query error: {e}"))?;
    let lower = query.to_lowercase();
    if lower.contains("user count") {
        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM users", [], |row| row.get(0))
            .map_err(|e| format!("Data query error: {e}"))?;
        Ok(format!("Total users: {count}"))
    } else if lower.contains("recent chats") {
        let count: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM conversations WHERE date > datetime('now', '-7 days')",
                [],
                |row| row.get(0),
            )
            .map_err(|e| format!("Data query error: {e}"))?;
        Ok(format!("Chats in last 7 days: {count}"))
    } else {
        Ok("Available queries: user count, recent chats".to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use tempfile::TempDir;

    fn seeded_db(dir: &TempDir) -> PathBuf {
        let path = dir.path().join("chatbot_analytics.db");
        let conn = Connection::open(&path).unwrap();
        conn.execute_batch(
            "CREATE TABLE users (id INTEGER PRIMARY KEY);
             INSERT INTO users (id) VALUES (1), (2), (3);
             CREATE TABLE conversations (id INTEGER PRIMARY KEY, date TEXT);
             INSERT INTO conversations (date) VALUES (datetime('now')), (datetime('now', '-30 days'));",
        )
        .unwrap();
        path
    }

    #[tokio::test]
    async fn test_user_count() {
        let dir = TempDir::new().unwrap();
        let tool = QueryDataTool::new(seeded_db(&dir));
        let out = tool
            .execute(serde_json::json!({"query": "What is the user count?"}))
            .await
            .unwrap();
        assert_eq!(out["result"], "Total users: 3");
    }

    #[tokio::test]
    async fn test_recent_chats_and_fallback_listing() {
        let dir = TempDir::new().unwrap();
        let tool = QueryDataTool::new(seeded_db(&dir));
        let recent = tool
            .execute(serde_json::json!({"query": "recent chats"}))
            .await
            .unwrap();
        assert_eq!(recent["result"], "Chats in last 7 days: 1");

        let other = tool
            .execute(serde_json::json!({"query": "customer information"}))
            .await
            .unwrap();
        assert_eq!(other["result"], "Available queries: user count, recent chats");
    }

    #[tokio::test]
    async fn test_missing_database_is_error() {
        let tool = QueryDataTool::new("/definitely/not/here.db");
        let err = tool
            .execute(serde_json::json!({"query": "user count"}))
            .await
            .unwrap_err();
        assert_eq!(err, "Analytics database not found");
    }
}
