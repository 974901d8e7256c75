use arena_core::repository::AvailabilityStore;
use arena_core::{
    Claimant, ClaimedItem, ClaimOutcome, CoreError, CoreResult, ItemKind, ReservationKey, ReservationRecord,
    ReservationStatus,
};
use arena_shared::pii::Masked;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use tracing::debug;

/// Claims backed by Postgres. `UNIQUE (numero, event_id, category)` on each
/// table is what serialises concurrent claims.
pub struct PostgresAvailabilityStore {
    pool: PgPool,
}

impl PostgresAvailabilityStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn table(kind: ItemKind) -> &'static str {
    match kind {
        ItemKind::Suite => "suites",
        ItemKind::Table => "mesas",
    }
}

fn store_error(err: sqlx::Error) -> CoreError {
    CoreError::StoreError(err.to_string())
}

const COLUMNS: &str = "numero, event_id, category, status, buyer_email, payment_reference, claimed_at";

#[derive(sqlx::FromRow)]
struct ReservationRow {
    numero: String,
    event_id: String,
    category: String,
    status: String,
    buyer_email: Option<String>,
    payment_reference: Option<String>,
    claimed_at: Option<DateTime<Utc>>,
}

impl ReservationRow {
    fn into_record(self, kind: ItemKind) -> ReservationRecord {
        let status = if self.status == ReservationStatus::Available.as_str() {
            ReservationStatus::Available
        } else {
            ReservationStatus::Claimed
        };

        ReservationRecord {
            key: ReservationKey::new(kind, self.numero, self.event_id, self.category),
            status,
            claimed_at: self.claimed_at,
            buyer_email: self.buyer_email.map(Masked),
            payment_reference: self.payment_reference,
        }
    }
}

#[derive(sqlx::FromRow)]
struct ClaimedRow {
    numero: String,
    category: String,
}

#[async_trait]
impl AvailabilityStore for PostgresAvailabilityStore {
    async fn is_claimed(&self, key: &ReservationKey) -> CoreResult<bool> {
        let sql = format!(
            "SELECT EXISTS(SELECT 1 FROM {} WHERE numero = $1 AND event_id = $2 AND category = $3 AND status = $4)",
            table(key.kind)
        );

        sqlx::query_scalar::<_, bool>(&sql)
            .bind(&key.item_id)
            .bind(&key.event_id)
            .bind(&key.category)
            .bind(ReservationStatus::Claimed.as_str())
            .fetch_one(&self.pool)
            .await
            .map_err(store_error)
    }

    async fn try_claim(&self, key: &ReservationKey, claimant: &Claimant) -> CoreResult<ClaimOutcome> {
        let sql = format!(
            r#"
            INSERT INTO {} (numero, event_id, category, status, buyer_email, payment_reference, claimed_at)
            VALUES ($1, $2, $3, $4, $5, $6, NOW())
            ON CONFLICT (numero, event_id, category) DO NOTHING
            RETURNING {}
            "#,
            table(key.kind),
            COLUMNS
        );

        let inserted = sqlx::query_as::<_, ReservationRow>(&sql)
            .bind(&key.item_id)
            .bind(&key.event_id)
            .bind(&key.category)
            .bind(ReservationStatus::Claimed.as_str())
            .bind(claimant.buyer_email.as_ref().map(|e| e.expose().as_str()))
            .bind(claimant.payment_reference.as_deref())
            .fetch_optional(&self.pool)
            .await
            .map_err(store_error)?;

        if let Some(row) = inserted {
            debug!("Inserted claim for {}", key);
            return Ok(ClaimOutcome::Claimed(row.into_record(key.kind)));
        }

        // Lost the insert: the winning row is committed and never deleted.
        let existing = self.get_record(key).await?.ok_or_else(|| {
            CoreError::StoreError(format!("conflicting claim for {} vanished", key))
        })?;
        Ok(ClaimOutcome::AlreadyClaimed(existing))
    }

    async fn list_claimed(&self, event_id: &str) -> CoreResult<Vec<ClaimedItem>> {
        let mut items = Vec::new();

        for kind in [ItemKind::Suite, ItemKind::Table] {
            let sql = format!(
                "SELECT numero, category FROM {} WHERE event_id = $1 AND status = $2 ORDER BY numero",
                table(kind)
            );
            let rows = sqlx::query_as::<_, ClaimedRow>(&sql)
                .bind(event_id)
                .bind(ReservationStatus::Claimed.as_str())
                .fetch_all(&self.pool)
                .await
                .map_err(store_error)?;

            items.extend(rows.into_iter().map(|row| ClaimedItem {
                kind,
                item_id: row.numero,
                category: row.category,
            }));
        }

        Ok(items)
    }

    async fn get_record(&self, key: &ReservationKey) -> CoreResult<Option<ReservationRecord>> {
        let sql = format!(
            "SELECT {} FROM {} WHERE numero = $1 AND event_id = $2 AND category = $3",
            COLUMNS,
            table(key.kind)
        );

        let row = sqlx::query_as::<_, ReservationRow>(&sql)
            .bind(&key.item_id)
            .bind(&key.event_id)
            .bind(&key.category)
            .fetch_optional(&self.pool)
            .await
            .map_err(store_error)?;

        Ok(row.map(|r| r.into_record(key.kind)))
    }
}
