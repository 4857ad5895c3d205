//! In-memory sponsor list served by `GET /sponsors`.
//!
//! Loaded in full at startup, then kept current by applying each sponsor
//! [`RowChange`] from the event bus. A full reload only happens when the
//! subscriber lags behind and changes were dropped.

use inmo_core::change_feed::{RowCache, RowChange, TABLE_SPONSORS};
use inmo_db::models::sponsor::Sponsor;
use inmo_db::repositories::SponsorRepo;
use inmo_db::DbPool;
use tokio::sync::{broadcast, RwLock};

pub struct SponsorCache {
    rows: RwLock<RowCache<Sponsor>>,
}

impl Default for SponsorCache {
    fn default() -> Self {
        Self::new()
    }
}

impl SponsorCache {
    pub fn new() -> Self {
        Self {
            rows: RwLock::new(RowCache::new(TABLE_SPONSORS)),
        }
    }

    /// Replace the cache with the current table contents.
    pub async fn load(&self, pool: &DbPool) -> Result<usize, sqlx::Error> {
        let sponsors = SponsorRepo::list(pool).await?;
        let count = sponsors.len();
        self.rows
            .write()
            .await
            .replace_all(sponsors.into_iter().map(|s| (s.id, s)));
        Ok(count)
    }

    pub async fn apply(&self, change: &RowChange) {
        if let Err(e) = self.rows.write().await.apply(change) {
            tracing::warn!(error = %e, id = change.id, "Ignoring malformed sponsor change");
        }
    }

    /// Active sponsors in display order.
    pub async fn active(&self) -> Vec<Sponsor> {
        let mut sponsors = self.rows.read().await.filtered(|s| s.is_active);
        sponsors.sort_by_key(|s| (s.display_order, s.id));
        sponsors
    }

    pub async fn len(&self) -> usize {
        self.rows.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.rows.read().await.is_empty()
    }

    /// Apply row changes until the bus closes.
    pub async fn run(&self, pool: DbPool, mut receiver: broadcast::Receiver<RowChange>) {
        loop {
            match receiver.recv().await {
                Ok(change) => {
                    if change.table == TABLE_SPONSORS {
                        self.apply(&change).await;
                    }
                }
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    tracing::warn!(skipped = n, "Sponsor cache lagged, reloading");
                    if let Err(e) = self.load(&pool).await {
                        tracing::error!(error = %e, "Sponsor cache reload failed");
                    }
                }
                Err(broadcast::error::RecvError::Closed) => {
                    tracing::info!("Event bus closed, sponsor cache stopping");
                    break;
                }
            }
        }
    }
}
