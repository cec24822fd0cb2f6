use async_trait::async_trait;

use crate::types::ChatMessage;

// ============================================
// Error Types
// ============================================

#[derive(Debug, Clone)]
pub struct ChatError(String);

impl ChatError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

impl std::fmt::Display for ChatError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::error::Error for ChatError {}

impl From<reqwest::Error> for ChatError {
    fn from(err: reqwest::Error) -> Self {
        ChatError::new(err.to_string())
    }
}

impl From<serde_json::Error> for ChatError {
    fn from(err: serde_json::Error) -> Self {
        ChatError::new(err.to_string())
    }
}

pub type ChatResult<T> = Result<T, ChatError>;

// ============================================
// Backend
// ============================================

/// A chat-completions provider.
///
/// `complete` receives the whole ordered context, system messages included,
/// and returns the text of the first choice. `Ok(None)` means the provider
/// answered without any content.
#[async_trait]
pub trait CompletionBackend: Send + Sync {
    /// Whether a credential is available. Callers check this before
    /// `complete` so an unconfigured backend never touches the network.
    fn is_configured(&self) -> bool;

    async fn complete(&self, messages: &[ChatMessage]) -> ChatResult<Option<String>>;

    fn name(&self) -> &str;
}
