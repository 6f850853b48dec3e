use server::ServerConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    // Load configuration from environment and config files
    let config = ServerConfig::load()?;

    // Start the server (blocks until shutdown)
    server::start_server(config).await?;

    Ok(())
}
