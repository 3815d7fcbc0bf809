//! 外部协作方接口：内容审核、语言处理、对话模型
//!
//! AgentService 只依赖这三个 trait；默认实现（AllowAll / EnglishOnly / EchoChat）无需任何外部服务，
//! 用于 demo 与测试。

use async_trait::async_trait;
use serde::Serialize;

/// 审核结论
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Verdict {
    pub safe: bool,
    pub reason: Option<String>,
}

impl Verdict {
    pub fn allow() -> Self {
        Self {
            safe: true,
            reason: None,
        }
    }

    pub fn block(reason: impl Into<String>) -> Self {
        Self {
            safe: false,
            reason: Some(reason.into()),
        }
    }
}

#[async_trait]
pub trait ContentModerator: Send + Sync {
    async fn check(&self, text: &str) -> Verdict;
}

/// 全部放行
#[derive(Debug, Default)]
pub struct AllowAll;

#[async_trait]
impl ContentModerator for AllowAll {
    async fn check(&self, _text: &str) -> Verdict {
        Verdict::allow()
    }
}

pub const DEFAULT_MAX_MESSAGE_CHARS: usize = 10_000;

/// 词表 + 长度上限的本地审核
#[derive(Debug, Clone)]
pub struct WordlistModerator {
    blocked_words: Vec<String>,
    max_chars: usize,
}

impl WordlistModerator {
    pub fn new(blocked_words: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            blocked_words: blocked_words
                .into_iter()
                .map(|w| w.into().to_lowercase())
                .collect(),
            max_chars: DEFAULT_MAX_MESSAGE_CHARS,
        }
    }

    pub fn with_max_chars(mut self, max_chars: usize) -> Self {
        self.max_chars = max_chars;
        self
    }
}

#[async_trait]
impl ContentModerator for WordlistModerator {
    async fn check(&self, text: &str) -> Verdict {
        if text.trim().is_empty() {
            return Verdict::allow();
        }
        let lower = text.to_lowercase();
        if let Some(word) = self.blocked_words.iter().find(|w| lower.contains(w.as_str())) {
            return Verdict::block(format!("Content contains inappropriate material: '{word}'"));
        }
        if text.chars().count() > self.max_chars {
            return Verdict::block(format!(
                "Message too long. Please keep messages under {} characters",
                self.max_chars
            ));
        }
        Verdict::allow()
    }
}

/// 规范化后的输入：英文文本与检测到的语言代码
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NormalizedInput {
    pub english_text: String,
    pub language: String,
}

#[async_trait]
pub trait LanguagePipeline: Send + Sync {
    async fn to_english(&self, text: &str) -> NormalizedInput;
    async fn from_english(&self, text: &str, language: &str) -> String;
}

/// 只处理英文：原样透传
#[derive(Debug, Default)]
pub struct EnglishOnly;

#[async_trait]
impl LanguagePipeline for EnglishOnly {
    async fn to_english(&self, text: &str) -> NormalizedInput {
        NormalizedInput {
            english_text: text.to_string(),
            language: "en".to_string(),
        }
    }

    async fn from_english(&self, text: &str, _language: &str) -> String {
        text.to_string()
    }
}

/// 非 Agent 路径的对话模型
#[async_trait]
pub trait ChatClient: Send + Sync {
    async fn respond(&self, prompt: &str, session_id: &str) -> Result<String, String>;
}

/// 回显 prompt（无需 API）
#[derive(Debug, Default)]
pub struct EchoChat;

#[async_trait]
impl ChatClient for EchoChat {
    async fn respond(&self, prompt: &str, _session_id: &str) -> Result<String, String> {
        Ok(format!("Echo: {prompt}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_wordlist_moderator() {
        let moderator = WordlistModerator::new(["forbidden"]).with_max_chars(20);
        assert!(moderator.check("hello").await.safe);
        let verdict = moderator.check("this is FORBIDDEN").await;
        assert!(!verdict.safe);
        assert!(verdict.reason.unwrap().contains("'forbidden'"));
        assert!(!moderator.check(&"a".repeat(21)).await.safe);
    }

    #[tokio::test]
    async fn test_defaults_pass_through() {
        assert!(AllowAll.check("anything").await.safe);
        let input = EnglishOnly.to_english("Bonjour").await;
        assert_eq!(input.language, "en");
        assert_eq!(EnglishOnly.from_english("hi", "fr").await, "hi");
        assert_eq!(EchoChat.respond("ping", "s").await.unwrap(), "Echo: ping");
    }
}
