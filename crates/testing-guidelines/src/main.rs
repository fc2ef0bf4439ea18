mod config;
mod corpus;
mod error;
mod model;
mod parser;
mod reload;
mod search;
mod server;

use rmcp::{ServiceExt, transport::stdio};
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;

use config::Config;
use server::TestingGuidelinesServer;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // stdout is reserved for MCP JSON-RPC
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();

    info!("starting testing-guidelines MCP server");

    let config = Config::from_env()?;
    let guide = config.guidelines_file_path();
    info!(guide = %guide.display(), "configuration loaded");

    let corpus = parser::load_file(&guide)?;
    info!(
        title = corpus.title().unwrap_or("(untitled)"),
        sections = corpus.len(),
        categories = corpus.categories().len(),
        references = corpus.references().len(),
        digest = %corpus.digest(),
        "loaded guide"
    );
    if corpus.is_empty() {
        tracing::warn!(guide = %guide.display(), "guide contains no sections");
    }

    let server = TestingGuidelinesServer::new(corpus, config);

    if let Ok(addr) = std::env::var("MCP_TCP_LISTEN_ADDR") {
        let listener = TcpListener::bind(&addr).await?;
        info!(listen_addr = %addr, "MCP server ready, serving on TCP");
        loop {
            let (stream, peer) = listener.accept().await?;
            let server = server.clone();
            tokio::spawn(async move {
                tracing::info!(peer = %peer, "MCP client connected");
                let service = server.serve(stream).await.inspect_err(|e| {
                    tracing::error!(error = %e, "MCP server error");
                })?;
                service.waiting().await?;
                tracing::info!(peer = %peer, "MCP client disconnected");
                Ok::<(), anyhow::Error>(())
            });
        }
    } else {
        info!("MCP server ready, serving on stdio");
        let service = server.serve(stdio()).await.inspect_err(|e| {
            tracing::error!(error = %e, "MCP server error");
        })?;
        service.waiting().await?;
        info!("MCP server shut down");
    }
    Ok(())
}
