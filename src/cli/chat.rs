//! CLI command handlers: the chat REPL, tool listing and context preview.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::warn;

use crate::config::CompassConfig;
use crate::context;
use crate::error::Result;
use crate::model::GeminiChatFactory;
use crate::session::{ConversationSession, TurnOutcome};
use crate::store::{AppState, InMemoryStateStore, StateMutationSink};
use crate::tools::{
    declarations, describe_request, GoogleCalendarClient, JournalCatalog, ToolExecutor,
};
use crate::types::{ApprovalDecision, Message, MessageKind, Role};

use super::{ChatArgs, StateArgs};

const HELP: &str = "Commands: /approve, /deny, /transcript, /reload, /quit";

/// Read the state document. A missing file yields an empty state.
pub fn load_state(path: Option<&Path>) -> Result<AppState> {
    let Some(path) = path else {
        return Ok(AppState::default());
    };
    match std::fs::read_to_string(path) {
        Ok(raw) => Ok(serde_json::from_str(&raw)?),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(AppState::default()),
        Err(e) => Err(e.into()),
    }
}

/// Write the state document as pretty JSON, creating parent directories.
pub fn save_state(path: &Path, state: &AppState) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    std::fs::write(path, serde_json::to_string_pretty(state)?)?;
    Ok(())
}

fn load_journal(path: Option<&Path>) -> Result<JournalCatalog> {
    match path {
        Some(path) => JournalCatalog::load(path),
        None => Ok(JournalCatalog::default()),
    }
}

fn today() -> chrono::NaiveDate {
    chrono::Local::now().date_naive()
}

/// Handle `compass tools`.
pub fn handle_tools() {
    for declaration in declarations() {
        println!(
            "{:<22} {:<9} {}",
            declaration.name,
            declaration.trust().to_string(),
            declaration.description
        );
    }
}

/// Handle `compass context`.
pub fn handle_context(config: &CompassConfig, args: &StateArgs) -> Result<()> {
    let state = load_state(args.state.as_deref().or(config.state_path.as_deref()))?;
    let journal = load_journal(args.journal.as_deref().or(config.journal_path.as_deref()))?;
    println!("{}", context::assemble(&state, &journal, today()));
    Ok(())
}

/// Handle `compass chat`.
pub async fn handle_chat(config: CompassConfig, args: ChatArgs) -> Result<()> {
    let config = match args.model {
        Some(model) => config.with_model(model),
        None => config,
    };
    let state_path: Option<PathBuf> = args.paths.state.or_else(|| config.state_path.clone());
    let journal = Arc::new(load_journal(
        args.paths.journal.as_deref().or(config.journal_path.as_deref()),
    )?);

    let store = Arc::new(InMemoryStateStore::new(load_state(state_path.as_deref())?));
    if let Some(path) = state_path {
        store.subscribe(Arc::new(move |state: &AppState| {
            if let Err(e) = save_state(&path, state) {
                warn!(path = %path.display(), error = %e, "failed to save state");
            }
        }));
    }

    let calendar = GoogleCalendarClient::new(config.calendar_token.clone())
        .with_base_url(&config.calendar_base_url);
    let executor = Arc::new(
        ToolExecutor::new(store.clone())
            .with_calendar(Arc::new(calendar))
            .with_journal(journal.clone()),
    );
    let factory = GeminiChatFactory::new(config.require_api_key()?)
        .with_model(&config.model)
        .with_base_url(&config.gemini_base_url);

    let instructions = context::assemble(&store.snapshot(), &journal, today());
    let session =
        ConversationSession::start(&factory, executor, &instructions, config.session.clone())?;

    eprintln!("compass ({}) {HELP}", factory.model());
    let mut printed = print_new(&session, 0);

    if let Some(prompt) = args.prompt {
        report(session.send_user_message(&prompt).await);
        printed = print_new(&session, printed);
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        match line {
            "/quit" | "/exit" => break,
            "/help" => eprintln!("{HELP}"),
            "/transcript" => {
                for message in session.transcript() {
                    print_message(&message);
                }
            }
            "/approve" | "/deny" => {
                let Some(action) = session.pending_action() else {
                    eprintln!("Nothing is waiting for approval.");
                    continue;
                };
                let decision = if line == "/approve" {
                    ApprovalDecision::Approve
                } else {
                    ApprovalDecision::Deny
                };
                report(session.resolve_pending_action(&action.id, decision).await);
            }
            "/reload" => {
                let instructions = context::assemble(&store.snapshot(), &journal, today());
                report(session.reinitialize(&factory, &instructions).map(|_| TurnOutcome::Settled));
            }
            text => report(session.send_user_message(text).await),
        }
        printed = print_new(&session, printed);
    }
    Ok(())
}

fn report(outcome: Result<TurnOutcome>) {
    match outcome {
        Ok(TurnOutcome::AwaitingApproval { .. }) => eprintln!("(type /approve or /deny)"),
        Ok(_) => {}
        Err(e) => eprintln!("{e}"),
    }
}

fn print_new(session: &ConversationSession, printed: usize) -> usize {
    let transcript = session.transcript();
    for message in transcript.iter().skip(printed) {
        if message.role != Role::User {
            print_message(message);
        }
    }
    transcript.len()
}

fn print_message(message: &Message) {
    let text = message.text.as_deref().unwrap_or_default();
    match (message.role, message.kind) {
        (Role::User, _) => println!("you> {text}"),
        (_, MessageKind::Action) => {
            let state = message
                .approval_state
                .map(|s| s.to_string())
                .unwrap_or_default();
            println!("[action: {state}]");
            for call in &message.pending_calls {
                println!("  - {}", describe_request(call));
            }
        }
        (_, MessageKind::Error) => eprintln!("{text}"),
        (_, MessageKind::Notice) => println!("[{text}]"),
        (_, MessageKind::Chat) => {
            println!("signal> {text}");
            for suggestion in &message.suggestions {
                println!("  > {suggestion}");
            }
        }
    }
}
