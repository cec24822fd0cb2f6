//! Chat session
//!
//! A session owns the conversation, the currently loaded project and the
//! completion backend. Every transition takes `&mut self`, so at most one
//! completion call is ever outstanding.

use std::path::Path;

use crate::ai::CompletionBackend;
use crate::conversation::{Conversation, UPLOAD_ACK_MESSAGE};
use crate::issues::CommonIssue;
use crate::project::LoadedProject;
use crate::storage::SlotStore;
use crate::types::ChatMessage;

pub const NO_PROJECT_MESSAGE: &str =
    "Please upload a 3MF file first so I can help you debug your 3D print.";
pub const MISSING_KEY_MESSAGE: &str = "Error: OpenAI API key is missing. Please add your API key to the .env.local file as OPENAI_API_KEY.";
pub const EMPTY_REPLY_MESSAGE: &str = "I couldn't generate a response. Please try again.";
pub const APOLOGY_MESSAGE: &str = "I'm sorry, I encountered an error while processing your request. Please check your API key and connection, then try again.";

/// What happened when a common issue was picked.
#[derive(Clone, Debug, PartialEq)]
pub enum IssueOutcome {
    /// A project is loaded, so the question went straight to the assistant.
    Sent { question: String, reply: String },
    /// No project yet; the question is only offered as a prompt.
    Suggested(String),
}

pub struct Session {
    conversation: Conversation,
    project: Option<LoadedProject>,
    backend: Box<dyn CompletionBackend>,
    store: Option<SlotStore>,
}

impl Session {
    /// Start a session, restoring history from `store` when there is one.
    pub fn new(backend: Box<dyn CompletionBackend>, store: Option<SlotStore>) -> Self {
        let snapshot = store.as_ref().and_then(SlotStore::load_history);
        let conversation = Conversation::restore(snapshot);
        tracing::info!(
            backend = backend.name(),
            messages = conversation.len(),
            "session started"
        );

        let session = Self {
            conversation,
            project: None,
            backend,
            store,
        };
        session.persist();
        session
    }

    pub fn conversation(&self) -> &Conversation {
        &self.conversation
    }

    pub fn project(&self) -> Option<&LoadedProject> {
        self.project.as_ref()
    }

    /// Load a 3MF file, replacing any previous one.
    ///
    /// Extracted parameters become system context for the assistant. A
    /// failed extraction is kept on the project as `analysis_error`; the
    /// file still counts as loaded.
    pub fn load_project(&mut self, path: &Path) -> &LoadedProject {
        let project = LoadedProject::load(path);

        if let Some(params) = &project.parameters {
            tracing::info!(path = %path.display(), "slicing parameters extracted");
            self.conversation.push_parameters(&params.summary());
        }
        self.conversation.push(ChatMessage::assistant(UPLOAD_ACK_MESSAGE));
        self.persist();

        self.project.insert(project)
    }

    /// Forget the loaded file. The conversation is left as it is.
    pub fn unload_project(&mut self) {
        self.project = None;
    }

    /// Send a user message and wait for the assistant.
    ///
    /// Blank input is ignored and returns `None`. Otherwise the appended
    /// assistant reply is returned; failures become a placeholder reply.
    pub async fn send(&mut self, text: &str) -> Option<String> {
        if text.trim().is_empty() {
            return None;
        }

        self.conversation.push(ChatMessage::user(text));
        self.persist();

        let reply = self.request_reply().await;
        self.conversation.push(ChatMessage::assistant(reply.clone()));
        self.persist();
        Some(reply)
    }

    async fn request_reply(&self) -> String {
        if self.project.is_none() {
            return NO_PROJECT_MESSAGE.to_string();
        }
        if !self.backend.is_configured() {
            tracing::warn!(backend = self.backend.name(), "no credential configured");
            return MISSING_KEY_MESSAGE.to_string();
        }

        let context = self.conversation.completion_context();
        match self.backend.complete(&context).await {
            Ok(Some(content)) if !content.is_empty() => content,
            Ok(_) => EMPTY_REPLY_MESSAGE.to_string(),
            Err(err) => {
                tracing::error!(error = %err, "error generating response");
                APOLOGY_MESSAGE.to_string()
            }
        }
    }

    /// Ask about one of the common issues.
    pub async fn select_issue(&mut self, issue: &CommonIssue) -> IssueOutcome {
        let question = issue.question();
        if self.project.is_none() {
            return IssueOutcome::Suggested(question);
        }

        let reply = self.send(&question).await.unwrap_or_default();
        IssueOutcome::Sent { question, reply }
    }

    /// Reset to a single greeting.
    ///
    /// The loaded project survives, and its parameters are attached again as
    /// system context so the assistant still sees them.
    pub fn clear(&mut self) {
        self.conversation.clear();
        if let Some(params) = self.project.as_ref().and_then(|p| p.parameters.as_ref()) {
            self.conversation.push_parameters(&params.summary());
        }
        self.persist();
    }

    fn persist(&self) {
        let Some(store) = &self.store else {
            return;
        };
        if let Err(err) = store.save_history(self.conversation.messages()) {
            tracing::warn!(error = %err, "failed to save chat history");
        }
    }
}
