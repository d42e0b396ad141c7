use crate::error::{EtlError, Result};
use crate::settings::DatabaseConfig;
use std::time::Instant;
use tokio::task::JoinHandle;
use tokio_postgres::{Client, NoTls};
use tracing::{debug, error, info, warn};

/// A live database session owned by one operation.
///
/// Holds the query client and the handle of the background task that drives
/// the socket. Call [`DbSession::release`] at the end of the operation; a
/// session dropped without it aborts the driver task instead.
pub struct DbSession {
    client: Client,
    connection: Option<JoinHandle<()>>,
    opened_at: Instant,
    target: String,
}

impl DbSession {
    pub async fn acquire(config: &DatabaseConfig) -> Result<Self> {
        let target = config.display_url();
        debug!("Connecting to {}", target);

        let (client, connection) = config
            .to_pg_config()
            .connect(NoTls)
            .await
            .map_err(EtlError::Connection)?;

        let driver_target = target.clone();
        let handle = tokio::spawn(async move {
            if let Err(e) = connection.await {
                error!("PostgreSQL connection to {} failed: {}", driver_target, e);
            }
        });

        info!("Connection to {} opened", target);

        Ok(Self {
            client,
            connection: Some(handle),
            opened_at: Instant::now(),
            target,
        })
    }

    pub fn client(&self) -> &Client {
        &self.client
    }

    pub fn client_mut(&mut self) -> &mut Client {
        &mut self.client
    }

    /// Close the client, then wait for the driver task to wind down.
    pub async fn release(mut self) {
        let handle = self.connection.take();
        let held = self.opened_at.elapsed();
        let target = std::mem::take(&mut self.target);

        // Dropping the client closes the socket and lets the driver task finish.
        drop(self);

        if let Some(handle) = handle {
            if let Err(e) = handle.await {
                warn!("Connection task for {} ended abnormally: {}", target, e);
            }
        }

        info!(
            "Released database connection to {}: held for {:.3} seconds",
            target,
            held.as_secs_f64()
        );
    }
}

impl Drop for DbSession {
    fn drop(&mut self) {
        if let Some(handle) = self.connection.take() {
            handle.abort();
            warn!(
                "Connection to {} dropped without release after {:.3} seconds",
                self.target,
                self.opened_at.elapsed().as_secs_f64()
            );
        }
    }
}
