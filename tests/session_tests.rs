//! Integration tests for the chat session state machine

use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use print_debugger::ai::{ChatError, ChatResult, CompletionBackend};
use print_debugger::conversation::{
    CLEARED_MESSAGE, SYSTEM_PROMPT, UPLOAD_ACK_MESSAGE, WELCOME_MESSAGE,
};
use print_debugger::issues::COMMON_ISSUES;
use print_debugger::project::{MISSING_SETTINGS_WARNING, PROJECT_SETTINGS_ENTRY};
use print_debugger::session::{
    APOLOGY_MESSAGE, EMPTY_REPLY_MESSAGE, IssueOutcome, MISSING_KEY_MESSAGE, NO_PROJECT_MESSAGE,
    Session,
};
use print_debugger::storage::SlotStore;
use print_debugger::types::{ChatMessage, Role};
use zip::write::SimpleFileOptions;

#[derive(Clone, Copy)]
enum Reply {
    Text(&'static str),
    Empty,
    Fail,
}

#[derive(Clone)]
struct MockBackend {
    configured: bool,
    reply: Reply,
    calls: Arc<AtomicUsize>,
    last_context: Arc<Mutex<Vec<ChatMessage>>>,
}

impl MockBackend {
    fn new(reply: Reply) -> Self {
        Self {
            configured: true,
            reply,
            calls: Arc::new(AtomicUsize::new(0)),
            last_context: Arc::new(Mutex::new(Vec::new())),
        }
    }

    fn unconfigured() -> Self {
        Self {
            configured: false,
            ..Self::new(Reply::Text("unused"))
        }
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn last_context(&self) -> Vec<ChatMessage> {
        self.last_context.lock().unwrap().clone()
    }
}

#[async_trait]
impl CompletionBackend for MockBackend {
    fn is_configured(&self) -> bool {
        self.configured
    }

    async fn complete(&self, messages: &[ChatMessage]) -> ChatResult<Option<String>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_context.lock().unwrap() = messages.to_vec();
        match self.reply {
            Reply::Text(text) => Ok(Some(text.to_string())),
            Reply::Empty => Ok(None),
            Reply::Fail => Err(ChatError::new("connection refused")),
        }
    }

    fn name(&self) -> &str {
        "mock"
    }
}

fn write_3mf(dir: &Path, name: &str, settings: Option<&str>) -> PathBuf {
    let path = dir.join(name);
    let file = std::fs::File::create(&path).unwrap();
    let mut writer = zip::ZipWriter::new(file);
    writer
        .start_file("3D/3dmodel.model", SimpleFileOptions::default())
        .unwrap();
    writer.write_all(b"<model/>").unwrap();
    if let Some(settings) = settings {
        writer
            .start_file(PROJECT_SETTINGS_ENTRY, SimpleFileOptions::default())
            .unwrap();
        writer.write_all(settings.as_bytes()).unwrap();
    }
    writer.finish().unwrap();
    path
}

fn session_with(backend: &MockBackend) -> Session {
    Session::new(Box::new(backend.clone()), None)
}

mod upload_tests {
    use super::*;

    #[tokio::test]
    async fn test_upload_adds_parameter_context() {
        let dir = tempfile::tempdir().unwrap();
        let settings = "layer_height = 0.2\n# c\nwall_loops = 2";
        let path = write_3mf(dir.path(), "benchy.3mf", Some(settings));
        let backend = MockBackend::new(Reply::Text("ok"));
        let mut session = session_with(&backend);

        let project = session.load_project(&path);
        assert!(project.analysis_error.is_none());
        assert_eq!(project.metadata.as_ref().map(|m| m.name.as_str()), Some("benchy.3mf"));

        let messages = session.conversation().messages();
        assert_eq!(messages.len(), 3);
        assert_eq!(messages[1].role, Role::System);
        assert_eq!(
            messages[1].content,
            "The user has uploaded a 3MF file with the following slicing parameters:\n\nlayer_height: 0.2\nwall_loops: 2"
        );
        assert_eq!(messages[2].content, UPLOAD_ACK_MESSAGE);
    }

    #[tokio::test]
    async fn test_upload_without_settings_entry() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_3mf(dir.path(), "bare.3mf", None);
        let backend = MockBackend::new(Reply::Text("ok"));
        let mut session = session_with(&backend);

        let project = session.load_project(&path);
        assert_eq!(project.analysis_error.as_deref(), Some(MISSING_SETTINGS_WARNING));
        assert!(project.parameters.is_none());

        assert!(
            session
                .conversation()
                .messages()
                .iter()
                .all(|m| m.role != Role::System)
        );
        // The file still counts as loaded, so chatting works
        assert_eq!(session.send("help").await.as_deref(), Some("ok"));
    }

    #[tokio::test]
    async fn test_upload_with_falsy_json_settings() {
        let dir = tempfile::tempdir().unwrap();
        let backend = MockBackend::new(Reply::Text("ok"));
        let mut session = session_with(&backend);

        for (i, body) in ["false", "0", "\"\"", "null"].iter().enumerate() {
            let path = write_3mf(dir.path(), &format!("falsy{i}.3mf"), Some(body));
            let project = session.load_project(&path);
            assert_eq!(project.analysis_error.as_deref(), Some(MISSING_SETTINGS_WARNING));
            assert!(project.parameters.is_none());
        }
        assert!(
            session
                .conversation()
                .messages()
                .iter()
                .all(|m| m.role != Role::System)
        );
    }

    #[tokio::test]
    async fn test_upload_of_non_zip_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.3mf");
        std::fs::write(&path, "not a zip").unwrap();
        let backend = MockBackend::new(Reply::Text("ok"));
        let mut session = session_with(&backend);

        let project = session.load_project(&path);
        assert_eq!(project.analysis_error.as_deref(), Some(MISSING_SETTINGS_WARNING));
    }

    #[tokio::test]
    async fn test_unload_keeps_conversation() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_3mf(dir.path(), "a.3mf", Some("a=1"));
        let backend = MockBackend::new(Reply::Text("ok"));
        let mut session = session_with(&backend);

        session.load_project(&path);
        let before = session.conversation().len();
        session.unload_project();

        assert!(session.project().is_none());
        assert_eq!(session.conversation().len(), before);
    }
}

mod send_tests {
    use super::*;

    fn loaded_session(backend: &MockBackend) -> (tempfile::TempDir, Session) {
        let dir = tempfile::tempdir().unwrap();
        let path = write_3mf(dir.path(), "part.3mf", Some(r#"{"x": 5, "y": {"p": 1, "q": 2}}"#));
        let mut session = session_with(backend);
        session.load_project(&path);
        (dir, session)
    }

    #[tokio::test]
    async fn test_blank_message_is_ignored() {
        let backend = MockBackend::new(Reply::Text("ok"));
        let (_dir, mut session) = loaded_session(&backend);
        let before = session.conversation().len();

        assert_eq!(session.send("").await, None);
        assert_eq!(session.send("   \n\t").await, None);

        assert_eq!(session.conversation().len(), before);
        assert_eq!(backend.calls(), 0);
    }

    #[tokio::test]
    async fn test_reply_is_appended_with_full_context() {
        let backend = MockBackend::new(Reply::Text("Try lowering retraction distance."));
        let (_dir, mut session) = loaded_session(&backend);

        let reply = session.send("My print is stringing").await;
        assert_eq!(reply.as_deref(), Some("Try lowering retraction distance."));
        assert_eq!(backend.calls(), 1);

        let context = backend.last_context();
        assert_eq!(context[0].role, Role::System);
        assert_eq!(context[0].content, SYSTEM_PROMPT);
        assert!(
            context
                .iter()
                .any(|m| m.role == Role::System && m.content.ends_with("x: 5\ny:\n  p: 1\n  q: 2"))
        );
        assert_eq!(context.last().map(|m| m.content.as_str()), Some("My print is stringing"));

        let messages = session.conversation().messages();
        let last_two = &messages[messages.len() - 2..];
        assert_eq!(last_two[0].role, Role::User);
        assert_eq!(last_two[1].role, Role::Assistant);
    }

    #[tokio::test]
    async fn test_failure_becomes_apology() {
        let backend = MockBackend::new(Reply::Fail);
        let (_dir, mut session) = loaded_session(&backend);

        assert_eq!(session.send("help").await.as_deref(), Some(APOLOGY_MESSAGE));
        // Session stays usable
        assert_eq!(session.send("again").await.as_deref(), Some(APOLOGY_MESSAGE));
        assert_eq!(backend.calls(), 2);
    }

    #[tokio::test]
    async fn test_empty_reply_placeholder() {
        let backend = MockBackend::new(Reply::Empty);
        let (_dir, mut session) = loaded_session(&backend);

        assert_eq!(session.send("help").await.as_deref(), Some(EMPTY_REPLY_MESSAGE));
    }

    #[tokio::test]
    async fn test_missing_credential_skips_call() {
        let backend = MockBackend::unconfigured();
        let (_dir, mut session) = loaded_session(&backend);

        assert_eq!(session.send("help").await.as_deref(), Some(MISSING_KEY_MESSAGE));
        assert_eq!(backend.calls(), 0);
    }

    #[tokio::test]
    async fn test_no_project_loaded() {
        let backend = MockBackend::new(Reply::Text("ok"));
        let mut session = session_with(&backend);

        assert_eq!(session.send("help").await.as_deref(), Some(NO_PROJECT_MESSAGE));
        assert_eq!(backend.calls(), 0);
        // The user turn is still recorded
        assert_eq!(session.conversation().len(), 3);
    }
}

mod issue_tests {
    use super::*;

    #[tokio::test]
    async fn test_issue_without_project_is_only_suggested() {
        let backend = MockBackend::new(Reply::Text("ok"));
        let mut session = session_with(&backend);

        let outcome = session.select_issue(&COMMON_ISSUES[2]).await;
        assert_eq!(
            outcome,
            IssueOutcome::Suggested("I'm having warping, how can I fix it?".to_string())
        );
        assert_eq!(session.conversation().len(), 1);
        assert_eq!(backend.calls(), 0);
    }

    #[tokio::test]
    async fn test_issue_with_project_is_sent() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_3mf(dir.path(), "a.3mf", Some("a=1"));
        let backend = MockBackend::new(Reply::Text("Check bed temperature."));
        let mut session = session_with(&backend);
        session.load_project(&path);

        let outcome = session.select_issue(&COMMON_ISSUES[0]).await;
        assert_eq!(
            outcome,
            IssueOutcome::Sent {
                question: "I'm having layer shifting, how can I fix it?".to_string(),
                reply: "Check bed temperature.".to_string(),
            }
        );
    }
}

mod clear_tests {
    use super::*;

    #[tokio::test]
    async fn test_clear_always_leaves_one_assistant_message() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_3mf(dir.path(), "a.3mf", Some("a=1"));
        let backend = MockBackend::new(Reply::Text("ok"));
        let mut session = session_with(&backend);

        session.clear();
        assert_eq!(session.conversation().len(), 1);

        session.load_project(&path);
        for _ in 0..3 {
            session.send("question").await;
        }
        session.clear();

        let assistant: Vec<&ChatMessage> = session
            .conversation()
            .messages()
            .iter()
            .filter(|m| m.role == Role::Assistant)
            .collect();
        assert_eq!(assistant.len(), 1);
        assert_eq!(assistant[0].content, CLEARED_MESSAGE);
        assert!(session.conversation().messages().iter().all(|m| m.role != Role::User));
        assert!(session.project().is_some());
    }

    #[tokio::test]
    async fn test_clear_keeps_parameters_for_next_message() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_3mf(dir.path(), "a.3mf", Some("a=1"));
        let backend = MockBackend::new(Reply::Text("ok"));
        let mut session = session_with(&backend);

        session.load_project(&path);
        session.clear();

        assert_eq!(session.send("still there?").await.as_deref(), Some("ok"));
        assert_eq!(backend.calls(), 1);
        let context = backend.last_context();
        assert!(
            context
                .iter()
                .any(|m| m.role == Role::System && m.content.ends_with("parameters:\n\na: 1"))
        );
    }

    #[tokio::test]
    async fn test_clear_never_persists_parameter_context() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_3mf(dir.path(), "a.3mf", Some("a=1"));
        let store = SlotStore::new(dir.path().join("storage"));
        let backend = MockBackend::new(Reply::Text("ok"));
        let mut session = Session::new(Box::new(backend), Some(store.clone()));

        session.load_project(&path);
        session.clear();

        let persisted = store.load_history().expect("history persisted");
        assert_eq!(persisted.len(), 1);
        assert_eq!(persisted[0].content, CLEARED_MESSAGE);
    }
}

mod persistence_tests {
    use super::*;

    #[tokio::test]
    async fn test_history_survives_restart_without_system_entries() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_3mf(dir.path(), "a.3mf", Some("a=1"));
        let store = SlotStore::new(dir.path().join("storage"));
        let backend = MockBackend::new(Reply::Text("answer"));

        {
            let mut session = Session::new(Box::new(backend.clone()), Some(store.clone()));
            session.load_project(&path);
            session.send("question").await;
        }

        let persisted = store.load_history().expect("history persisted");
        assert!(persisted.iter().all(|m| m.role != Role::System));

        let restored = Session::new(Box::new(backend.clone()), Some(store.clone()));
        let contents: Vec<&str> = restored
            .conversation()
            .messages()
            .iter()
            .map(|m| m.content.as_str())
            .collect();
        assert_eq!(
            contents,
            vec![WELCOME_MESSAGE, UPLOAD_ACK_MESSAGE, "question", "answer"]
        );
    }

    #[tokio::test]
    async fn test_corrupt_history_restores_welcome() {
        let dir = tempfile::tempdir().unwrap();
        let store = SlotStore::new(dir.path());
        store
            .set(print_debugger::storage::HISTORY_SLOT, "[{\"role\":\"robot\"}]")
            .unwrap();
        let backend = MockBackend::new(Reply::Text("ok"));

        let session = Session::new(Box::new(backend), Some(store));
        let messages = session.conversation().messages();
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].content, WELCOME_MESSAGE);
    }
}
