use banter_api::config::Config;
use banter_api::db::{BanterStorage, connect};
use banter_api::plaid::HttpPlaidFactory;
use banter_api::router::{BanterState, banter_router};
use banter_api::service::TokenExchangeWorkflow;
use clap::{Parser, Subcommand};
use mimalloc::MiMalloc;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

/// Plaid token exchange backend
#[derive(Parser)]
#[command(name = "banter-api", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Run the HTTP server (default)
    Serve,
    /// Create the database tables
    CreateDb,
    /// Drop the database tables
    DropDb,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let cfg = Config::load()?;

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(cfg.loglevel.clone()));
    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_level(true)
                .with_target(false),
        )
        .init();

    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => serve(cfg).await,
        Command::CreateDb => {
            let storage = BanterStorage::new(connect(&cfg.database_url).await?);
            storage.init_schema().await?;
            storage.pool().close().await;
            info!(database_url = %cfg.database_url, "Created database tables");
            Ok(())
        }
        Command::DropDb => {
            let storage = BanterStorage::new(connect(&cfg.database_url).await?);
            storage.drop_schema().await?;
            storage.pool().close().await;
            info!(database_url = %cfg.database_url, "Dropped database tables");
            Ok(())
        }
    }
}

async fn serve(cfg: Config) -> Result<(), Box<dyn std::error::Error>> {
    info!(
        database_url = %cfg.database_url,
        proxy = %cfg.proxy.as_ref().map(|u| u.as_str()).unwrap_or("<none>"),
        loglevel = %cfg.loglevel,
        plaid_env = %cfg.plaid.env,
        plaid_route = %cfg.plaid_route,
        persist_linked_items = cfg.persist_linked_items
    );

    let factory = HttpPlaidFactory::new(cfg.plaid.clone(), cfg.proxy.as_ref())?;
    let mut workflow = TokenExchangeWorkflow::new(Arc::new(factory));
    if cfg.persist_linked_items {
        let storage = BanterStorage::new(connect(&cfg.database_url).await?);
        storage.init_schema().await?;
        workflow = workflow.with_persistence(storage);
    }

    let app = banter_router(BanterState::new(workflow), &cfg);

    let listener = TcpListener::bind(cfg.listen_addr.as_str()).await?;
    info!("HTTP server listening on {}", cfg.listen_addr);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("Shutdown signal received");
    }
}
