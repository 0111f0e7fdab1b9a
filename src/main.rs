use aide::adapters::secrets::Secrets;
use aide::agents::ChatService;
use aide::cli::Cli;
use aide::config::Settings;
use clap::Parser;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,tower_http=info")),
        )
        .init();

    let cli = Cli::parse();

    // Credentials are read once, after the dotenv file
    match &cli.env_file {
        Some(path) => {
            dotenvy::from_path(path)?;
            info!("Loaded environment from {}", path.display());
        }
        None => {
            if let Ok(path) = dotenvy::dotenv() {
                info!("Loaded environment from {}", path.display());
            }
        }
    }

    let settings = Settings::new_with_cli(&cli)?;
    if cli.print_config {
        println!("{}", settings.to_toml()?);
        return Ok(());
    }

    let secrets = Secrets::from_env(settings.credential_names());
    for name in settings.credential_names() {
        if !secrets.contains(&name) {
            warn!("Credential {} is not set", name);
        }
    }

    let chat = Arc::new(ChatService::from_settings(&settings, &secrets)?);
    info!(
        workers = chat.agents().len(),
        mode = ?settings.dispatch.mode,
        "Chat service ready"
    );

    let app = aide::create_app(chat, &settings);

    let addr: SocketAddr = format!("{}:{}", settings.server.host, settings.server.port).parse()?;
    info!("Listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
