use clap::{Parser, Subcommand};
use foodgram::db::{self, schema, services::catalog_service};
use foodgram::server::config::ServerConfig;
use foodgram::web;
use std::fs::File;
use std::sync::Arc;
use tracing::{error, info};
use tracing_appender::rolling;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the configuration file
    #[arg(short, long)]
    config: Option<String>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the HTTP server (default)
    Serve,
    /// Bulk-load ingredients from a `name,measurement_unit` CSV file
    LoadIngredients {
        /// Path to the CSV file
        path: String,
    },
    /// Create the default tags, skipping ones that already exist
    LoadTags,
}

fn init_logging(log_dir: &str) {
    // Log to a file: JSON format, daily rotation
    let file_appender = rolling::daily(log_dir, "server.log");
    let file_layer = fmt::layer()
        .with_writer(file_appender)
        .with_ansi(false)
        .json();

    // Log to stdout: human-readable format
    let stdout_layer = fmt::layer().with_writer(std::io::stdout);

    // Default to `info,sea_orm=warn` level if RUST_LOG is not set.
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,sea_orm=warn,sqlx::query=warn"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(file_layer)
        .with(stdout_layer)
        .init();
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "Failed to listen for shutdown signal.");
    }
    info!("Shutdown signal received.");
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let args = Args::parse();

    let loaded = ServerConfig::load(args.config.as_deref());
    let log_dir = loaded
        .as_ref()
        .map(|c| c.log_dir.clone())
        .unwrap_or_else(|_| "logs".to_string());
    init_logging(&log_dir);

    // --- Server Config Setup ---
    let server_config = match loaded {
        Ok(config) => Arc::new(config),
        Err(e) => {
            error!("Failed to load server configuration: {}", e);
            return Err(e.into());
        }
    };

    // --- Database Pool Setup ---
    let db_pool = db::connect(&server_config.database_url, server_config.db_max_connections).await?;
    if server_config.auto_create_schema {
        schema::create_tables(&db_pool).await?;
    }

    match args.command.unwrap_or(Command::Serve) {
        Command::LoadIngredients { path } => {
            let file = File::open(&path)?;
            let count = catalog_service::insert_ingredients(&db_pool, file).await?;
            info!(count, path = %path, "Ingredient import finished.");
        }
        Command::LoadTags => {
            let created = catalog_service::insert_default_tags(&db_pool).await?;
            info!(created, "Tag import finished.");
        }
        Command::Serve => {
            tokio::fs::create_dir_all(&server_config.media_dir).await?;

            let listen_addr = server_config.listen_addr.clone();
            let app = web::create_axum_router(db_pool, server_config);

            let listener = tokio::net::TcpListener::bind(&listen_addr).await?;
            info!("HTTP server listening on {}", listen_addr);
            axum::serve(listener, app)
                .with_graceful_shutdown(shutdown_signal())
                .await?;
            info!("HTTP server stopped.");
        }
    }

    Ok(())
}
