use clap::Parser;
use tandem::config::Cli;
use tandem::{TandemServer, logging};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    logging::init();

    let server = TandemServer::builder()
        .bind(&cli.bind_addr())
        .relay_config(cli.relay_config())
        .build()
        .await?;

    tracing::info!(addr = %server.local_addr()?, "tandem relay listening");

    server
        .run_until(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "failed to listen for shutdown signal");
                std::future::pending::<()>().await;
            }
        })
        .await?;
    Ok(())
}
