use crate::services::token_service::TokenService;
use sea_orm::DatabaseConnection;
use tokio::sync::watch;
use tokio::time::{Duration, sleep};

/// Periodically prunes expired refresh-token bookkeeping.
pub struct BackgroundWorker {
    db: DatabaseConnection,
    interval: Duration,
    shutdown: watch::Receiver<bool>,
}

impl BackgroundWorker {
    pub fn new(db: DatabaseConnection, interval_secs: u64, shutdown: watch::Receiver<bool>) -> Self {
        Self {
            db,
            interval: Duration::from_secs(interval_secs.max(1)),
            shutdown,
        }
    }

    pub async fn run(mut self) {
        tracing::info!("🚀 Background worker started (every {:?})", self.interval);

        loop {
            tokio::select! {
                _ = self.shutdown.changed() => {
                    tracing::info!("🛑 Background worker shutting down");
                    break;
                }
                _ = sleep(self.interval) => {
                    self.perform_cleanup().await;
                }
            }
        }
    }

    pub async fn perform_cleanup(&self) {
        tracing::debug!("🧹 Pruning expired tokens...");

        match TokenService::prune_expired(&self.db).await {
            Ok(0) => {}
            Ok(removed) => tracing::info!("✅ Pruned {} expired token rows", removed),
            Err(e) => tracing::error!("Token pruning failed: {}", e),
        }
    }
}
