use anyhow::Result;
use axum::Router;
use clap::Parser;
use shopsearch_core::ScoringMethod;
use shopsearch_server::{build_app, ServerConfig};
use std::net::SocketAddr;
use std::path::PathBuf;
use tokio::net::TcpListener;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser)]
struct Args {
    /// Data directory with the corpus and index/
    #[arg(long, default_value = "./data")]
    data_dir: PathBuf,
    /// Corpus file, when not under one of the data directory's default names
    #[arg(long)]
    corpus: Option<PathBuf>,
    /// Host to bind
    #[arg(long, default_value = "0.0.0.0")]
    host: String,
    /// Port to bind
    #[arg(long, default_value_t = 8080)]
    port: u16,
    /// Scoring method when a request names none: tfidf, bm25 or custom
    #[arg(long, default_value = "bm25")]
    method: String,
    /// Results per page when a request names none
    #[arg(long, default_value_t = shopsearch_core::DEFAULT_K)]
    k: usize,
}

#[tokio::main]
async fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();
    let args = Args::parse();
    let config = ServerConfig {
        data_dir: args.data_dir,
        corpus: args.corpus,
        default_method: ScoringMethod::parse_or_default(&args.method),
        default_k: args.k,
    };
    let app: Router = build_app(&config)?;

    let addr: SocketAddr = format!("{}:{}", args.host, args.port).parse()?;
    let listener = TcpListener::bind(addr).await?;
    tracing::info!(%addr, method = %config.default_method, "server listening");
    axum::serve(listener, app).await?;
    Ok(())
}
