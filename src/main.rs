mod clients;
mod config;
mod error;
mod facade;
mod mcp;
mod models;
mod routes;

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tokio::net::TcpListener;
use tokio::signal;
use tracing::info;

use clients::remote::RemoteClient;
use clients::KubeClient;
use facade::{ClusterQueries, QueryFacade};
use mcp::McpServer;

#[derive(Clone)]
pub struct AppState {
    pub queries: Arc<dyn ClusterQueries>,
    pub config: Arc<config::Config>,
    pub mcp: Arc<McpServer>,
}

#[derive(Parser)]
#[command(name = "cluster-query", version, about = "Read-only Kubernetes cluster queries over HTTP and MCP")]
struct Cli {
    /// YAML config file; environment variables override it
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Serve the HTTP API and MCP over HTTP
    Serve,
    /// Serve MCP over stdio against the cluster
    Mcp,
    /// Serve MCP over stdio, answering from a running HTTP API
    Bridge {
        #[arg(long, env = "MCP_API_BASE")]
        api_base: Option<String>,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // stdout belongs to the MCP transport.
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("cluster_query=info")),
        )
        .init();

    let cfg = config::Config::load(cli.config.as_deref()).unwrap_or_else(|e| {
        eprintln!("error loading config: {}", e);
        std::process::exit(1);
    });

    match cli.command {
        Command::Serve => serve(cfg).await,
        Command::Mcp => {
            let queries = cluster_queries(&cfg).await;
            run_stdio(McpServer::new(queries, &cfg)).await;
        }
        Command::Bridge { api_base } => {
            let Some(api_base) = api_base.or_else(|| cfg.api_base.clone()) else {
                eprintln!("bridge needs --api-base, MCP_API_BASE or api_base in the config");
                std::process::exit(1);
            };
            let remote = RemoteClient::new(api_base, cfg.upstream_timeout()).unwrap_or_else(|e| {
                eprintln!("error creating bridge client: {}", e);
                std::process::exit(1);
            });
            info!("bridging MCP to {}", remote.address);
            run_stdio(McpServer::new(Arc::new(remote), &cfg)).await;
        }
    }
}

async fn cluster_queries(cfg: &config::Config) -> Arc<dyn ClusterQueries> {
    let client = KubeClient::initialize(cfg.upstream_timeout()).await;
    if cfg.require_credentials {
        if let Some(e) = client.configuration_error() {
            eprintln!("cluster credentials required: {}", e);
            std::process::exit(1);
        }
    }
    Arc::new(QueryFacade::new(Arc::new(client), cfg))
}

async fn run_stdio(server: McpServer) {
    tokio::select! {
        result = server.serve_stdio() => {
            if let Err(e) = result {
                eprintln!("stdio error: {}", e);
                std::process::exit(1);
            }
        }
        _ = shutdown_signal() => info!("shutting down"),
    }
}

async fn serve(cfg: config::Config) {
    let queries = cluster_queries(&cfg).await;
    let cfg = Arc::new(cfg);

    let state = AppState {
        mcp: Arc::new(McpServer::new(queries.clone(), &cfg)),
        queries,
        config: cfg.clone(),
    };

    let router = routes::build_router(state);

    let listen_addr = cfg.listen_addr();
    let listener = TcpListener::bind(&listen_addr).await.unwrap_or_else(|e| {
        eprintln!("failed to bind {}: {}", listen_addr, e);
        std::process::exit(1);
    });

    info!(
        "cluster-query listening on {} for cluster {} ({})",
        listen_addr, cfg.cluster_name, cfg.region
    );

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .unwrap_or_else(|e| {
            eprintln!("server error: {}", e);
            std::process::exit(1);
        });
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c().await.expect("failed to listen for ctrl+c");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to listen for SIGTERM")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
