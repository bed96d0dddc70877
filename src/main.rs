use clap::Parser;
use thought_tree::{
    cli::{App, Cli},
    config::Settings,
    db::DbClient,
    repositories::scylla_stores,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Logs go to stderr so stdout stays clean for trees and JSON
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "thought_tree=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    // Load configuration
    let settings = Settings::from_env().map_err(|e| format!("Failed to load settings: {}", e))?;

    tracing::debug!("Connecting to ScyllaDB at: {:?}", settings.scylla.nodes);

    let db_client = DbClient::new(&settings.scylla)
        .await
        .map_err(|e| format!("Failed to connect to ScyllaDB: {}", e))?;

    let mut app = App::new(scylla_stores(db_client), settings.app.clone());

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    app.run(cli.command, &mut out).await?;

    Ok(())
}
