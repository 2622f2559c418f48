use clap::Parser;
use invite_bot::{server, Cli, Commands};
use invite_metrics::TracingService;
use invite_models::Config;
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = Config::load(cli.config_path().as_deref())?;
    TracingService::init(&config.logging)?;

    info!(
        admin_id = config.access.admin_id,
        target_chat_id = config.access.target_chat_id,
        "🚀 Starting Invite Bot"
    );

    match cli.command() {
        Commands::Run => server::run(config).await,
        Commands::Migrate => server::migrate(&config).await,
        Commands::Stats => server::stats(&config).await,
    }
}
