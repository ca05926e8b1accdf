use clap::{Parser, ValueEnum};
use dotenvy::dotenv;
use film_catalog_backend::config::AppConfig;
use film_catalog_backend::infrastructure::database;
use film_catalog_backend::services::worker::BackgroundWorker;
use film_catalog_backend::{AppState, create_app};
use std::net::SocketAddr;
use tokio::signal;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Mode {
    /// Serve HTTP only
    Api,
    /// Run the token pruning worker only
    Worker,
    /// Both in one process
    All,
}

#[derive(Parser, Debug)]
#[command(author, version, about = "Film catalog and social graph API")]
struct Args {
    #[arg(long, value_enum, default_value_t = Mode::All)]
    mode: Mode,

    #[arg(long, default_value_t = 3000)]
    port: u16,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    let args = Args::parse();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "film_catalog_backend=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("🚀 Starting Film Catalog Backend in {:?} mode...", args.mode);

    let config = AppConfig::for_environment(std::env::var("APP_ENV").ok().as_deref())?;
    info!(
        "🛡️  Token lifetimes: access={}m refresh={}d, min password length={}",
        config.access_token_lifetime_minutes,
        config.refresh_token_lifetime_days,
        config.min_password_length
    );

    let db = database::setup_database().await?;

    let (shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(false);

    let worker_handle = if args.mode != Mode::Api {
        let worker =
            BackgroundWorker::new(db.clone(), config.token_prune_interval_secs, shutdown_rx);
        Some(tokio::spawn(worker.run()))
    } else {
        None
    };

    if args.mode == Mode::Worker {
        shutdown_signal().await;
        let _ = shutdown_tx.send(true);
    } else {
        let app = create_app(AppState { db, config });

        let addr = SocketAddr::from(([0, 0, 0, 0], args.port));
        info!("✅ Server ready at http://{}", addr);
        info!("📖 Swagger UI: http://{}/swagger-ui", addr);

        let listener = tokio::net::TcpListener::bind(addr).await?;
        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                shutdown_signal().await;
                let _ = shutdown_tx.send(true);
            })
            .await?;
    }

    if let Some(handle) = worker_handle {
        handle.await?;
    }

    info!("🛑 Shut down gracefully.");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("⌨️  Ctrl+C received, starting graceful shutdown...");
        },
        _ = terminate => {
            info!("💤 SIGTERM received, starting graceful shutdown...");
        },
    }
}
