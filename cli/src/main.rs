mod config;
mod replay;

use std::io::Write as _;
use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::config::ConfigStore;

#[derive(Parser, Debug)]
#[command(
    version,
    about = "Replay a script of host events against the chat message composer"
)]
struct Cli {
    /// Config file to read instead of `~/.chat-input/config.toml`.
    #[arg(long, env = "CHAT_INPUT_CONFIG", value_name = "PATH")]
    config: Option<PathBuf>,

    /// JSON-lines script of host events. Output is one JSON object per line
    /// on stdout, ending with the final composer state.
    script: PathBuf,
}

#[tokio::main(flavor = "multi_thread")]
async fn main() -> anyhow::Result<()> {
    // Logs go to stderr so stdout stays machine-readable.
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();

    let cli = Cli::parse();
    let output = load_and_replay(&cli).await?;

    let mut stdout = std::io::stdout().lock();
    for line in output {
        serde_json::to_writer(&mut stdout, &line).context("encode output line")?;
        writeln!(stdout).context("write output line")?;
    }
    stdout.flush().context("flush stdout")?;
    Ok(())
}

async fn load_and_replay(cli: &Cli) -> anyhow::Result<Vec<replay::ReplayOutput>> {
    let store = match &cli.config {
        Some(path) => ConfigStore::new(path.clone()),
        None => ConfigStore::new_default()?,
    };
    let settings = store
        .composer_settings()
        .with_context(|| format!("load settings from {}", store.path().display()))?;
    tracing::debug!(?settings, "resolved composer settings");

    let script = tokio::fs::read_to_string(&cli.script)
        .await
        .with_context(|| format!("read script {}", cli.script.display()))?;
    replay::run_script(&script, settings)
}
