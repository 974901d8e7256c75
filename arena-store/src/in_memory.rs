use arena_core::repository::AvailabilityStore;
use arena_core::{Claimant, ClaimedItem, ClaimOutcome, CoreResult, ReservationKey, ReservationRecord, ReservationStatus};
use async_trait::async_trait;
use chrono::Utc;
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use tokio::sync::RwLock;

/// Availability store for tests and local development. The write lock is
/// never held across an await point.
#[derive(Default)]
pub struct InMemoryAvailabilityStore {
    records: RwLock<HashMap<ReservationKey, ReservationRecord>>,
}

impl InMemoryAvailabilityStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }
}

#[async_trait]
impl AvailabilityStore for InMemoryAvailabilityStore {
    async fn is_claimed(&self, key: &ReservationKey) -> CoreResult<bool> {
        Ok(self
            .records
            .read()
            .await
            .get(key)
            .is_some_and(|r| r.status == ReservationStatus::Claimed))
    }

    async fn try_claim(&self, key: &ReservationKey, claimant: &Claimant) -> CoreResult<ClaimOutcome> {
        let mut records = self.records.write().await;

        match records.entry(key.clone()) {
            Entry::Occupied(existing) => Ok(ClaimOutcome::AlreadyClaimed(existing.get().clone())),
            Entry::Vacant(slot) => {
                let record = ReservationRecord {
                    key: key.clone(),
                    status: ReservationStatus::Claimed,
                    claimed_at: Some(Utc::now()),
                    buyer_email: claimant.buyer_email.clone(),
                    payment_reference: claimant.payment_reference.clone(),
                };
                slot.insert(record.clone());
                Ok(ClaimOutcome::Claimed(record))
            }
        }
    }

    async fn list_claimed(&self, event_id: &str) -> CoreResult<Vec<ClaimedItem>> {
        let records = self.records.read().await;
        let mut items: Vec<ClaimedItem> = records
            .values()
            .filter(|r| r.key.event_id == event_id && r.status == ReservationStatus::Claimed)
            .map(|r| ClaimedItem {
                kind: r.key.kind,
                item_id: r.key.item_id.clone(),
                category: r.key.category.clone(),
            })
            .collect();
        items.sort_by(|a, b| (a.kind.as_str(), &a.item_id).cmp(&(b.kind.as_str(), &b.item_id)));
        Ok(items)
    }

    async fn get_record(&self, key: &ReservationKey) -> CoreResult<Option<ReservationRecord>> {
        Ok(self.records.read().await.get(key).cloned())
    }
}
