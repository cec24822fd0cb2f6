//! Chat completion layer
//!
//! - `client` - error type and the [`CompletionBackend`] trait
//! - `openai` - OpenAI-compatible chat completions over HTTP
//!
//! # Usage
//!
//! ```rust,no_run
//! use print_debugger::ai::{CompletionBackend, OpenAiClient};
//! use print_debugger::config::Settings;
//! use print_debugger::types::ChatMessage;
//!
//! # async fn example() -> anyhow::Result<()> {
//! let ai = OpenAiClient::from_settings(&Settings::from_env());
//! let _reply = ai.complete(&[ChatMessage::user("Why is my print warping?")]).await?;
//! # Ok(())
//! # }
//! ```
mod client;
mod openai;

pub use client::{ChatError, ChatResult, CompletionBackend};
pub use openai::{OpenAiClient, parse_completion_body};
