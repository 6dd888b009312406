//! Compass CLI binary entry point.

use compass::cli::{chat, Cli, Commands};
use compass::config::CompassConfig;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse_args();

    let result = match CompassConfig::load(cli.config.as_deref()) {
        Ok(config) => match cli.command {
            Commands::Chat(args) => chat::handle_chat(config, args).await,
            Commands::Tools => {
                chat::handle_tools();
                Ok(())
            }
            Commands::Context(args) => chat::handle_context(&config, &args),
        },
        Err(e) => Err(e),
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
