use anyhow::Result;
use translation_manager::{config, server};
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("translation_manager=info".parse()?),
        )
        .init();

    info!("Starting translation manager");

    let config = config::Config::from_env()?;
    info!("Messages: {}", config.messages_dir.display());
    info!("Frontend: {}", config.frontend_dir.display());
    info!("Reference locale: {}", config.reference_locale);

    server::serve(&config).await
}
