//! Conversation log
//!
//! The log only grows or is reset wholesale. The troubleshooting instruction
//! is not part of the log; it is prepended to every completion context.

use crate::types::{ChatMessage, Role};

pub const SYSTEM_PROMPT: &str = r#"You are a knowledgeable AI assistant integrated into a 3D printing slicer.
The user reports a printing issue. Your task is to guide the user through the troubleshooting process.

Follow these steps:
1. Determine if the print issue the user reported is clear. If not, respond with a message asking the user to clarify their intent.
2. Examine the slicing parameters and determine if any of them could be causing the issue.
3. If nothing stands out in the slicing parameters, determine other possible causes of the print issue, and how likely each cause is to be the issue.
4. In your response, list the possible causes of the print issue by order of likelihood.
5. Starting with the most likely cause:
    - If it's related to a parameter you can already see, suggest specific adjustments with target values.
    - If it's related to something not visible in the parameters, ask specific diagnostic questions.
6. Focus only on the SINGLE most likely cause for immediate action:
    - If it requires parameter adjustment, suggest to the user to change their parameter values.
    - If it requires diagnostic information, ask a specific question about it: "Does your print show [specific symptom]?" or "Have you checked [specific hardware component]?"
7. Wait for the user to respond about this single most likely cause before discussing other causes.
8. After suggesting a possible cause, ask the user if this resolved their issue.

Respond in a direct and engaging manner.
- Avoid referring to 'the user' and speak naturally.
- Avoid revealing your internal logic."#;

pub const WELCOME_MESSAGE: &str = "Hello! I'm your 3D printing assistant. Upload a 3MF file and ask me questions about your print or common 3D printing issues.";
pub const CLEARED_MESSAGE: &str = "Chat history cleared. How can I help you with your 3D printing?";
pub const UPLOAD_ACK_MESSAGE: &str =
    "I see you've uploaded a 3MF file. What would you like to know about your 3D print?";

pub fn parameters_context(summary: &str) -> String {
    format!("The user has uploaded a 3MF file with the following slicing parameters:\n\n{summary}")
}

#[derive(Clone, Debug)]
pub struct Conversation {
    preamble: String,
    messages: Vec<ChatMessage>,
}

impl Default for Conversation {
    fn default() -> Self {
        Self::new()
    }
}

impl Conversation {
    /// Fresh conversation holding only the welcome message.
    pub fn new() -> Self {
        Self {
            preamble: SYSTEM_PROMPT.to_string(),
            messages: vec![ChatMessage::assistant(WELCOME_MESSAGE)],
        }
    }

    /// Rebuild a conversation from a persisted snapshot.
    ///
    /// System entries are dropped. An absent or empty snapshot yields the
    /// welcome message.
    pub fn restore(snapshot: Option<Vec<ChatMessage>>) -> Self {
        let messages: Vec<ChatMessage> = snapshot
            .unwrap_or_default()
            .into_iter()
            .filter(|msg| msg.role != Role::System)
            .collect();

        if messages.is_empty() {
            return Self::new();
        }

        Self {
            preamble: SYSTEM_PROMPT.to_string(),
            messages,
        }
    }

    /// Messages that survive a restart: everything but system context.
    pub fn snapshot(&self) -> Vec<ChatMessage> {
        self.messages
            .iter()
            .filter(|msg| msg.role != Role::System)
            .cloned()
            .collect()
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn push(&mut self, message: ChatMessage) {
        self.messages.push(message);
    }

    /// Attach slicing parameters as system context for the assistant.
    pub fn push_parameters(&mut self, summary: &str) {
        self.push(ChatMessage::system(parameters_context(summary)));
    }

    /// Replace the whole log with the single post-clear greeting.
    pub fn clear(&mut self) {
        self.messages = vec![ChatMessage::assistant(CLEARED_MESSAGE)];
    }

    /// What is sent to the model: the instruction followed by the full log.
    pub fn completion_context(&self) -> Vec<ChatMessage> {
        let mut context = Vec::with_capacity(self.messages.len() + 1);
        context.push(ChatMessage::system(self.preamble.clone()));
        context.extend(self.messages.iter().cloned());
        context
    }

    /// Messages a person reads, i.e. without system context.
    pub fn visible(&self) -> impl Iterator<Item = &ChatMessage> {
        self.messages.iter().filter(|msg| msg.role != Role::System)
    }
}
