//! CLI entry point for Compass.

pub mod chat;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Compass companion CLI
#[derive(Parser, Debug)]
#[command(name = "compass", version, about = "Approval-gated companion chat")]
pub struct Cli {
    /// Config file (defaults to ~/.compass/compass.toml)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Chat interactively; mutating tool calls wait for /approve or /deny
    Chat(ChatArgs),
    /// List the tool catalog
    Tools,
    /// Print the instruction text a new chat would start with
    Context(StateArgs),
}

/// Where the state document and journal catalog live.
#[derive(Parser, Debug, Default)]
pub struct StateArgs {
    /// JSON state file (read at start, rewritten after every commit)
    #[arg(short, long)]
    pub state: Option<PathBuf>,

    /// JSON journal catalog
    #[arg(short, long)]
    pub journal: Option<PathBuf>,
}

/// Arguments for the `chat` subcommand.
#[derive(Parser, Debug)]
pub struct ChatArgs {
    #[command(flatten)]
    pub paths: StateArgs,

    /// Gemini model name
    #[arg(short, long)]
    pub model: Option<String>,

    /// First message to send (the REPL continues afterwards)
    pub prompt: Option<String>,
}

impl Cli {
    /// Parse CLI arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_chat_with_defaults() {
        let cli = Cli::try_parse_from(["compass", "chat"]).unwrap();
        match cli.command {
            Commands::Chat(args) => {
                assert!(args.model.is_none());
                assert!(args.paths.state.is_none());
                assert!(args.prompt.is_none());
            }
            other => panic!("expected Chat, got {other:?}"),
        }
        assert!(cli.config.is_none());
    }

    #[test]
    fn parse_chat_with_all_options() {
        let cli = Cli::try_parse_from([
            "compass",
            "chat",
            "-m",
            "gemini-2.5-pro",
            "--state",
            "state.json",
            "--journal",
            "journal.json",
            "--config",
            "compass.toml",
            "How was my week?",
        ])
        .unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("compass.toml")));
        match cli.command {
            Commands::Chat(args) => {
                assert_eq!(args.model.as_deref(), Some("gemini-2.5-pro"));
                assert_eq!(args.paths.state, Some(PathBuf::from("state.json")));
                assert_eq!(args.paths.journal, Some(PathBuf::from("journal.json")));
                assert_eq!(args.prompt.as_deref(), Some("How was my week?"));
            }
            other => panic!("expected Chat, got {other:?}"),
        }
    }

    #[test]
    fn parse_tools_and_context() {
        let cli = Cli::try_parse_from(["compass", "tools"]).unwrap();
        assert!(matches!(cli.command, Commands::Tools));

        let cli = Cli::try_parse_from(["compass", "context", "-s", "s.json"]).unwrap();
        match cli.command {
            Commands::Context(args) => assert_eq!(args.state, Some(PathBuf::from("s.json"))),
            other => panic!("expected Context, got {other:?}"),
        }
    }

    #[test]
    fn parse_missing_subcommand_is_error() {
        assert!(Cli::try_parse_from(["compass"]).is_err());
    }
}
