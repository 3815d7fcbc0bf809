//! 受限文件读取工具
//!
//! SafeFs 绑定一组允许的根目录，路径经 resolve 规范化后必须落在某个根之下（禁止 ../ 逃逸）；
//! ReadFileTool 基于 SafeFs 读取文本，超过 max_chars 时截断并标记 truncated。

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde_json::Value;

use crate::core::AgentError;
use crate::tools::schema::{parse_args, schema_of, FilePathArgs};
use crate::tools::Tool;

/// 沙箱文件系统：多个允许的根目录
#[derive(Debug, Clone)]
pub struct SafeFs {
    roots: Vec<PathBuf>,
}

impl SafeFs {
    pub fn new(roots: impl IntoIterator<Item = impl AsRef<Path>>) -> Self {
        let roots = roots
            .into_iter()
            .map(|r| {
                let root = r.as_ref().to_path_buf();
                root.canonicalize().unwrap_or(root)
            })
            .collect();
        Self { roots }
    }

    /// 规范化路径并检查是否在允许的根目录下
    pub fn resolve(&self, path: &str) -> Result<PathBuf, AgentError> {
        let canonical = Path::new(path)
            .canonicalize()
            .map_err(|_| AgentError::ToolExecutionFailed(format!("File not found: {path}")))?;
        if self.roots.iter().any(|root| canonical.starts_with(root)) {
            Ok(canonical)
        } else {
            Err(AgentError::PathEscape(path.to_string()))
        }
    }

    pub fn read_file(&self, path: &str) -> Result<String, AgentError> {
        let resolved = self.resolve(path)?;
        std::fs::read_to_string(&resolved)
            .map_err(|e| AgentError::ToolExecutionFailed(format!("File read error: {e}")))
    }
}

/// read_file 工具
pub struct ReadFileTool {
    fs: SafeFs,
    max_chars: usize,
}

impl ReadFileTool {
    pub fn new(roots: impl IntoIterator<Item = impl AsRef<Path>>, max_chars: usize) -> Self {
        Self {
            fs: SafeFs::new(roots),
            max_chars,
        }
    }
}

#[async_trait]
impl Tool for ReadFileTool {
    fn name(&self) -> &str {
        "read_file"
    }

    fn description(&self) -> &str {
        "Read content from files"
    }

    fn parameters_schema(&self) -> Value {
        schema_of::<FilePathArgs>()
    }

    async fn execute(&self, args: Value) -> Result<Value, String> {
        let FilePathArgs { file_path } = parse_args(self.name(), args)?;
        tracing::info!(path = %file_path, "read_file tool execute");
        let content = self.fs.read_file(&file_path).map_err(|e| e.to_string())?;
        let total_chars = content.chars().count();
        let truncated = total_chars > self.max_chars;
        Ok(serde_json::json!({
            "file_path": file_path,
            "size_bytes": content.len(),
            "content": content.chars().take(self.max_chars).collect::<String>(),
            "truncated": truncated,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use tempfile::TempDir;

    #[tokio::test]
    async fn test_reads_and_truncates() {
        let tmp = TempDir::new().unwrap();
        let dir = tmp.path();
        let file = dir.join("notes.txt");
        std::fs::write(&file, "abcdefghij").unwrap();

        let tool = ReadFileTool::new([dir], 4);
        let out = tool
            .execute(serde_json::json!({"file_path": file.to_string_lossy()}))
            .await
            .unwrap();
        assert_eq!(out["content"], "abcd");
        assert_eq!(out["truncated"], true);
        assert_eq!(out["size_bytes"], 10);
    }

    #[tokio::test]
    async fn test_rejects_paths_outside_roots() {
        let allowed_tmp = TempDir::new().unwrap();
        let other_tmp = TempDir::new().unwrap();
        let allowed = allowed_tmp.path();
        let other = other_tmp.path();
        let secret = other.join("secret.txt");
        std::fs::write(&secret, "nope").unwrap();

        let tool = ReadFileTool::new([allowed], 100);
        let err = tool
            .execute(serde_json::json!({"file_path": secret.to_string_lossy()}))
            .await
            .unwrap_err();
        assert!(err.contains("Path escape"));

        let escape = allowed.join("..").join(other.file_name().unwrap()).join("secret.txt");
        let err = tool
            .execute(serde_json::json!({"file_path": escape.to_string_lossy()}))
            .await
            .unwrap_err();
        assert!(err.contains("Path escape"));
    }

    #[tokio::test]
    async fn test_missing_file() {
        let tmp = TempDir::new().unwrap();
        let dir = tmp.path();
        let tool = ReadFileTool::new([dir], 100);
        let err = tool
            .execute(serde_json::json!({"file_path": dir.join("none.txt").to_string_lossy()}))
            .await
            .unwrap_err();
        assert!(err.contains("File not found"));
    }
}
