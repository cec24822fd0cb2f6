use clap::Parser;
use print_debugger::cli::{self, Cli};
use print_debugger::config::{Settings, load_dotenv};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    load_dotenv();
    let settings = Settings::from_env();

    cli::run(cli, settings).await
}
