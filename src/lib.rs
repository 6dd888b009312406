//! Compass: tool-call orchestration for an approval-gated companion chat.
//!
//! A [`session::ConversationSession`] sends user text to a model, runs the
//! read-only tool calls it asks for on its own, and suspends on anything that
//! would change the user's data until the user approves or denies it.
//!
//! # Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use compass::prelude::*;
//!
//! # async fn example() -> compass::error::Result<()> {
//! let config = CompassConfig::load(None)?;
//! let store = Arc::new(InMemoryStateStore::default());
//! let executor = Arc::new(ToolExecutor::new(store.clone()));
//! let factory = GeminiChatFactory::new(config.require_api_key()?).with_model(&config.model);
//!
//! let instructions = compass::context::assemble(
//!     &store.snapshot(),
//!     &JournalCatalog::default(),
//!     chrono::Local::now().date_naive(),
//! );
//! let session = ConversationSession::start(&factory, executor, &instructions, config.session)?;
//!
//! if let TurnOutcome::AwaitingApproval { message_id } =
//!     session.send_user_message("Add a habit: morning run").await?
//! {
//!     session
//!         .resolve_pending_action(&message_id, ApprovalDecision::Approve)
//!         .await?;
//! }
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod context;
pub mod error;
pub mod http;
pub mod model;
pub mod prelude;
pub mod session;
pub mod store;
pub mod tools;
pub mod types;

#[cfg(feature = "cli")]
pub mod cli;
