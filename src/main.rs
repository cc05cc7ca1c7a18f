//! Student performance service entry point.

use std::net::SocketAddr;

use clap::{Parser, Subcommand};
use metrics_exporter_prometheus::PrometheusHandle;
use tokio::net::TcpListener;
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use student_performance::api::{cors_layer, create_router, AppState};
use student_performance::config::{Config, StoreBackend};
use student_performance::error::AppError;
use student_performance::metrics;
use student_performance::records::StudentService;
use student_performance::store::{MemoryStore, PgStore, StudentStore};
use student_performance::utils::shutdown_signal;

/// Student test score and attainment service.
#[derive(Parser, Debug)]
#[command(name = "student-performance")]
#[command(about = "Records student test scores and computes attainment levels")]
#[command(version)]
struct Args {
    /// Enable verbose logging.
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Command>,

    /// HTTP listen port (overrides PORT).
    #[arg(short, long)]
    port: Option<u16>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the HTTP server (default).
    Serve {
        /// HTTP listen port (overrides PORT).
        #[arg(short, long)]
        port: Option<u16>,

        /// Use the in-memory store regardless of STORE_BACKEND.
        #[arg(long)]
        memory: bool,
    },

    /// Check configuration validity.
    CheckConfig,

    /// Apply database migrations and exit.
    Migrate,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // Parse CLI arguments
    let args = Args::parse();

    // Initialize logging
    let filter = if args.verbose {
        EnvFilter::new("student_performance=debug,info")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(filter)
        .init();

    match args.command {
        Some(Command::CheckConfig) => cmd_check_config(),
        Some(Command::Migrate) => cmd_migrate().await,
        Some(Command::Serve { port, memory }) => cmd_serve(port.or(args.port), memory).await,
        None => cmd_serve(args.port, false).await,
    }
}

/// Load and validate configuration, logging why it failed.
fn load_config(
    port_override: Option<u16>,
    force_memory: bool,
) -> Result<Config, AppError> {
    let mut config = Config::load().map_err(|e| {
        error!("Failed to load configuration: {}", e);
        AppError::from(e)
    })?;

    if let Some(port) = port_override {
        config.port = port;
    }
    if force_memory {
        config.store_backend = StoreBackend::Memory;
    }

    config.validate().map_err(|e| {
        error!("Invalid configuration: {}", e);
        AppError::InvalidConfig(e)
    })?;

    Ok(config)
}

async fn connect_postgres(config: &Config) -> Result<PgStore, AppError> {
    let url = config
        .database_url
        .as_deref()
        .ok_or_else(|| AppError::InvalidConfig("DATABASE_URL is required".to_string()))?;

    let store = PgStore::connect(url, config.db_max_connections, config.db_acquire_timeout())
        .await
        .map_err(|e| {
            error!("Failed to connect to the database: {}", e);
            AppError::from(e)
        })?;

    store.migrate().await.map_err(|e| {
        error!("Database migration failed: {}", e);
        AppError::from(e)
    })?;

    Ok(store)
}

/// Check configuration validity.
fn cmd_check_config() -> anyhow::Result<()> {
    println!("======================================================================");
    println!("STUDENT PERFORMANCE - CONFIGURATION CHECK");
    println!("======================================================================");

    print!("Loading configuration... ");
    let config = match Config::load() {
        Ok(c) => {
            println!("OK");
            c
        }
        Err(e) => {
            println!("FAILED");
            println!("  Error: {}", e);
            return Err(anyhow::anyhow!("Configuration load failed"));
        }
    };

    print!("Validating configuration... ");
    match config.validate() {
        Ok(()) => println!("OK"),
        Err(e) => {
            println!("FAILED");
            println!("  Error: {}", e);
            return Err(anyhow::anyhow!("Configuration validation failed"));
        }
    }

    let policy = config.attainment_policy();

    println!("----------------------------------------------------------------------");
    println!("Configuration Summary:");
    println!("  Port: {}", config.port);
    println!("  Store Backend: {}", config.store_backend);
    println!(
        "  Database URL: {}",
        if config.database_url.is_some() { "set" } else { "not set" }
    );
    println!("  Pool Size: {}", config.db_max_connections);
    println!(
        "  CORS Origins: {}",
        config
            .cors_origins()
            .map(|o| o.join(", "))
            .unwrap_or_else(|| "any".to_string())
    );
    println!(
        "  Attainment: level {} above {}, level {} otherwise",
        policy.upper_level, policy.threshold, policy.default_level
    );
    println!("======================================================================");
    println!("CONFIGURATION CHECK PASSED");
    println!("======================================================================");

    Ok(())
}

/// Apply migrations against DATABASE_URL.
async fn cmd_migrate() -> anyhow::Result<()> {
    let mut config = load_config(None, false)?;
    config.store_backend = StoreBackend::Postgres;

    let store = connect_postgres(&config).await?;
    store.close().await;

    info!("Database schema is up to date");
    Ok(())
}

/// Run the HTTP server against the configured store.
async fn cmd_serve(port_override: Option<u16>, force_memory: bool) -> anyhow::Result<()> {
    info!("Loading configuration...");
    let config = load_config(port_override, force_memory)?;

    let handle = metrics::install_prometheus()?;
    metrics::init_metrics();

    info!("Configuration loaded successfully");
    info!("Store backend: {}", config.store_backend);
    info!("Attainment threshold: {}", config.attainment_threshold);

    match config.store_backend {
        StoreBackend::Memory => {
            warn!("Using the in-memory store; records are lost on exit");
            run_server(MemoryStore::new(), &config, handle).await
        }
        StoreBackend::Postgres => {
            let store = connect_postgres(&config).await?;
            run_server(store, &config, handle).await
        }
    }
}

async fn run_server<S: StudentStore>(
    store: S,
    config: &Config,
    metrics_handle: PrometheusHandle,
) -> anyhow::Result<()> {
    let service = StudentService::new(store.clone(), config.attainment_policy());
    let state = AppState::new(service).with_metrics(metrics_handle);
    let router = create_router(state, cors_layer(config.cors_origins().as_deref()));

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = TcpListener::bind(addr).await?;
    info!("HTTP server listening on {}", addr);

    let served = axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await;

    store.close().await;
    served?;

    info!("Server stopped");
    Ok(())
}
