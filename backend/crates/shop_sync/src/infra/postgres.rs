//! PostgreSQL Repository Implementations

use crate::domain::entities::{CleanupCriteria, ShopResource, TERMINAL_TASK_STATUSES};
use crate::domain::repository::{ActivityRepository, CleanupRepository, ResourceRepository};
use crate::error::SyncResult;
use chrono::{TimeDelta, Utc};
use kernel::shop::ShopDomain;
use sqlx::{PgPool, Postgres, QueryBuilder};
use std::time::Duration;

/// Rows per INSERT statement; 7 binds each stays well under the 65535 limit
const UPSERT_CHUNK_SIZE: usize = 500;

/// PostgreSQL-backed repository
#[derive(Clone)]
pub struct PgSyncRepository {
    pool: PgPool,
}

impl PgSyncRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn to_time_delta(duration: Duration) -> TimeDelta {
    TimeDelta::from_std(duration).unwrap_or(TimeDelta::MAX)
}

impl ActivityRepository for PgSyncRepository {
    async fn record_activity(&self, shop: &ShopDomain) -> SyncResult<()> {
        sqlx::query(
            r#"
            INSERT INTO shop_activity (shop_domain, last_seen_at)
            VALUES ($1, NOW())
            ON CONFLICT (shop_domain) DO UPDATE SET last_seen_at = EXCLUDED.last_seen_at
            "#,
        )
        .bind(shop.as_str())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn is_shop_active(&self, shop: &ShopDomain, within: Duration) -> SyncResult<bool> {
        let now = Utc::now();
        let cutoff = now
            .checked_sub_signed(to_time_delta(within))
            .unwrap_or(chrono::DateTime::<Utc>::MIN_UTC);

        let active: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS (
                SELECT 1 FROM shop_activity
                WHERE shop_domain = $1 AND last_seen_at > $2
            )
            "#,
        )
        .bind(shop.as_str())
        .bind(cutoff)
        .fetch_one(&self.pool)
        .await?;

        Ok(active)
    }
}

impl CleanupRepository for PgSyncRepository {
    async fn delete_matching(&self, criteria: &CleanupCriteria) -> SyncResult<u64> {
        let deleted = match *criteria {
            CleanupCriteria::BackgroundTasks {
                terminal_before,
                now,
            } => {
                sqlx::query(
                    r#"
                    DELETE FROM background_tasks
                    WHERE (status = ANY($1) AND updated_at < $2)
                       OR (expires_at IS NOT NULL AND expires_at < $3)
                    "#,
                )
                .bind(&TERMINAL_TASK_STATUSES[..])
                .bind(terminal_before)
                .bind(now)
                .execute(&self.pool)
                .await?
                .rows_affected()
            }
            CleanupCriteria::RequestLogs { processed_before } => sqlx::query(
                "DELETE FROM request_logs WHERE processed = TRUE AND created_at < $1",
            )
            .bind(processed_before)
            .execute(&self.pool)
            .await?
            .rows_affected(),
        };

        tracing::debug!(criteria = ?criteria, deleted, "Cleanup delete executed");

        Ok(deleted)
    }
}

impl ResourceRepository for PgSyncRepository {
    async fn upsert_resources(
        &self,
        shop: &ShopDomain,
        resources: &[ShopResource],
    ) -> SyncResult<u64> {
        let mut written = 0;
        let mut tx = self.pool.begin().await?;

        for chunk in resources.chunks(UPSERT_CHUNK_SIZE) {
            let mut builder: QueryBuilder<Postgres> = QueryBuilder::new(
                "INSERT INTO shop_resources (shop_domain, gid, kind, handle, title, remote_updated_at, synced_at) ",
            );
            builder.push_values(chunk, |mut row, resource| {
                row.push_bind(shop.as_str())
                    .push_bind(&resource.gid)
                    .push_bind(resource.kind.as_str())
                    .push_bind(&resource.handle)
                    .push_bind(&resource.title)
                    .push_bind(resource.updated_at)
                    .push("NOW()");
            });
            builder.push(
                " ON CONFLICT (shop_domain, gid) DO UPDATE SET \
                 kind = EXCLUDED.kind, handle = EXCLUDED.handle, title = EXCLUDED.title, \
                 remote_updated_at = EXCLUDED.remote_updated_at, synced_at = EXCLUDED.synced_at",
            );

            written += builder.build().execute(&mut *tx).await?.rows_affected();
        }

        tx.commit().await?;

        tracing::debug!(shop = %shop, written, "Resources upserted");

        Ok(written)
    }
}
