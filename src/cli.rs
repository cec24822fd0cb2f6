use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};

use anyhow::Result;
use clap::{Parser, Subcommand};
use time::format_description::FormatItem;
use time::macros::format_description;
use time::UtcOffset;

use crate::ai::OpenAiClient;
use crate::config::Settings;
use crate::conversation::Conversation;
use crate::issues::{COMMON_ISSUES, find_issue};
use crate::project::LoadedProject;
use crate::session::{IssueOutcome, Session};
use crate::storage::{HISTORY_SLOT, SlotStore};
use crate::types::{ChatMessage, Role};

#[derive(Parser)]
#[command(name = "print-debugger")]
#[command(about = "Chat with an assistant about the slicing settings in a 3MF file", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Log filter used when RUST_LOG is not set
    #[arg(long, default_value = "warn", global = true)]
    pub log_level: String,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Show file information and the extracted slicing parameters
    Inspect { file: PathBuf },

    /// List common 3D printing issues
    Issues,

    /// Print the saved chat history
    History {
        /// Reset the saved history instead of printing it
        #[arg(long)]
        clear: bool,
    },

    /// Start an interactive troubleshooting chat
    Chat {
        /// 3MF file to load before the first message
        #[arg(long, short)]
        file: Option<PathBuf>,
    },
}

const MESSAGE_TIME_FORMAT: &[FormatItem<'static>] =
    format_description!("[hour repr:12 padding:zero]:[minute padding:zero] [period case:upper]");

const HELP: &str = "Commands:
  /load <path>     load a 3MF file
  /unload          forget the loaded file
  /params          show the extracted slicing parameters
  /issues          list common issues
  /issue <n|name>  ask about a common issue
  /clear           clear the chat history
  /exit            quit";

pub async fn run(cli: Cli, settings: Settings) -> Result<()> {
    let store = match &settings.data_dir {
        Some(dir) => SlotStore::new(dir),
        None => SlotStore::default_location(),
    };

    match cli.command {
        Commands::Inspect { file } => {
            print_project(&LoadedProject::load(&file));
        }
        Commands::Issues => print_issues(),
        Commands::History { clear } => {
            if clear {
                let mut conversation = Conversation::restore(store.load_history());
                conversation.clear();
                store.save_history(conversation.messages())?;
                println!("Chat history cleared.");
            } else {
                let conversation = Conversation::restore(store.load_history());
                for msg in conversation.visible() {
                    print_message(msg);
                }
            }
        }
        Commands::Chat { file } => {
            let backend = OpenAiClient::from_settings(&settings);
            tracing::info!(model = backend.model(), "using chat completions backend");
            let mut session = Session::new(Box::new(backend), Some(store));
            run_repl(&mut session, file.as_deref()).await?;
        }
    }

    Ok(())
}

async fn run_repl(session: &mut Session, file: Option<&Path>) -> Result<()> {
    println!("--- 3D Print Debugger ---");
    println!("History slot: {HISTORY_SLOT}");
    println!("Type /help for commands, /exit to quit.");
    println!("-------------------------");

    for msg in session.conversation().visible() {
        print_message(msg);
    }

    if let Some(path) = file {
        load(session, path);
    }

    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();
    loop {
        print!("\nYou> ");
        io::stdout().flush()?;

        let Some(line) = lines.next() else {
            break;
        };
        let line = line?;
        let text = line.trim();

        if text.is_empty() {
            continue;
        }

        let (command, arg) = match text.split_once(char::is_whitespace) {
            Some((cmd, rest)) => (cmd, rest.trim()),
            None => (text, ""),
        };

        match command {
            "/exit" | "/quit" => break,
            "/help" => println!("{HELP}"),
            "/load" if !arg.is_empty() => load(session, Path::new(arg)),
            "/load" => println!("Usage: /load <path>"),
            "/unload" => {
                session.unload_project();
                println!("File unloaded. Use /load to choose another one.");
            }
            "/params" => match session.project() {
                Some(project) => print_project(project),
                None => println!("No file loaded."),
            },
            "/issues" => print_issues(),
            "/issue" => match find_issue(arg) {
                Some(issue) => {
                    println!("Thinking...");
                    match session.select_issue(issue).await {
                        IssueOutcome::Sent { question, reply } => {
                            println!("You: {question}");
                            print_reply(&reply);
                        }
                        IssueOutcome::Suggested(question) => {
                            println!("Load a 3MF file first, then ask:\n  {question}");
                        }
                    }
                }
                None => println!("Unknown issue '{arg}'. Use /issues to list them."),
            },
            "/clear" => {
                session.clear();
                for msg in session.conversation().visible() {
                    print_message(msg);
                }
            }
            _ => {
                println!("Thinking...");
                if let Some(reply) = session.send(text).await {
                    print_reply(&reply);
                }
            }
        }
    }

    Ok(())
}

fn load(session: &mut Session, path: &Path) {
    let project = session.load_project(path);
    print_project(project);
    if let Some(msg) = session.conversation().messages().last() {
        print_message(msg);
    }
}

fn print_project(project: &LoadedProject) {
    println!("3MF File Information");
    match &project.metadata {
        Some(meta) => {
            println!("  Name:          {}", meta.name);
            println!("  Size:          {}", meta.size);
            println!("  Type:          {}", meta.mime_type);
            println!("  Last modified: {}", meta.last_modified);
        }
        None => println!("  Path:          {}", project.path.display()),
    }

    if let Some(err) = &project.analysis_error {
        println!("\n! {err}");
        return;
    }

    println!("\nSlicing Parameters");
    for line in project.summary().lines() {
        println!("  {line}");
    }
}

fn print_issues() {
    println!("Common 3D Printing Issues");
    for (i, issue) in COMMON_ISSUES.iter().enumerate() {
        println!("  {:>2}. {:<20} {}", i + 1, issue.name, issue.description);
    }
}

fn print_reply(reply: &str) {
    println!("\nAssistant> {reply}");
}

fn print_message(msg: &ChatMessage) {
    let who = match msg.role {
        Role::User => "You",
        Role::Assistant => "Assistant",
        Role::System => "System",
    };
    match format_message_timestamp(msg) {
        Some(time) => println!("\n[{time}] {who}> {}", msg.content),
        None => println!("\n{who}> {}", msg.content),
    }
}

fn format_message_timestamp(msg: &ChatMessage) -> Option<String> {
    let mut datetime = msg.created_at()?;
    if let Ok(offset) = UtcOffset::current_local_offset() {
        datetime = datetime.to_offset(offset);
    }
    datetime.format(MESSAGE_TIME_FORMAT).ok()
}
