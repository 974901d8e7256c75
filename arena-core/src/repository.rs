use async_trait::async_trait;

use crate::reservation::{Claimant, ClaimedItem, ClaimOutcome, ReservationKey, ReservationRecord, ReservationStatus};
use crate::CoreResult;

/// Persisted record of which items are claimed.
///
/// `try_claim` is the only operation with a correctness contract: for a given
/// key, concurrent calls produce exactly one `Claimed`, every other call sees
/// `AlreadyClaimed` with the stored record. Implementations rely on the
/// backing store's uniqueness constraint, not on in-process locks held
/// across I/O.
#[async_trait]
pub trait AvailabilityStore: Send + Sync {
    async fn is_claimed(&self, key: &ReservationKey) -> CoreResult<bool>;

    async fn try_claim(&self, key: &ReservationKey, claimant: &Claimant) -> CoreResult<ClaimOutcome>;

    /// Every item claimed for `event_id`, across both collections.
    async fn list_claimed(&self, event_id: &str) -> CoreResult<Vec<ClaimedItem>>;

    async fn get_record(&self, key: &ReservationKey) -> CoreResult<Option<ReservationRecord>>;

    /// Computed status; a missing record means available.
    async fn status(&self, key: &ReservationKey) -> CoreResult<ReservationStatus> {
        Ok(match self.get_record(key).await? {
            Some(record) => record.status,
            None => ReservationStatus::Available,
        })
    }
}
