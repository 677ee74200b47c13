use anyhow::Result;
use axum::Router;
use clap::Parser;
use screen_core::NormalizerConfig;
use server::{build_app, ServerConfig};
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser)]
struct Args {
    /// Model directory path
    #[arg(long, default_value = "./model")]
    model: String,
    /// Host to bind
    #[arg(long, default_value = "0.0.0.0")]
    host: String,
    /// Port to bind
    #[arg(long, default_value_t = 8080)]
    port: u16,
    /// Reject ranking requests with more documents than this
    #[arg(long, default_value_t = 200)]
    max_documents: usize,
    /// Keep non-ASCII characters instead of blanking them
    #[arg(long, default_value_t = false)]
    keep_non_ascii: bool,
    /// Fold accented letters to their ASCII base before cleaning
    #[arg(long, default_value_t = false)]
    fold_diacritics: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();
    let args = Args::parse();
    let config = ServerConfig {
        max_documents: args.max_documents,
        normalizer: NormalizerConfig {
            strip_non_ascii: !args.keep_non_ascii,
            fold_diacritics: args.fold_diacritics,
            ..Default::default()
        },
    };
    let app: Router = build_app(&args.model, config)?;

    let addr: SocketAddr = format!("{}:{}", args.host, args.port).parse()?;
    let listener = TcpListener::bind(addr).await?;
    tracing::info!(%addr, "server listening");
    axum::serve(listener, app).await?;
    Ok(())
}
