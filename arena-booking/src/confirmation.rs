use arena_catalog::{InventoryCatalog, LiveEvent};
use arena_core::notification::ReservationDetails;
use arena_core::repository::AvailabilityStore;
use arena_core::signature::{SignatureError, SignatureVerifier};
use arena_core::webhook::PaymentEvent;
use arena_core::{ClaimOutcome, Claimant, ReservationKey, ReservationRecord};
use arena_shared::models::events::ReservationClaimedEvent;
use chrono::Utc;
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{error, info, warn};

use crate::dispatcher::NotificationDispatcher;

/// What happened to an authenticated notification. Every variant is
/// acknowledged to the provider with a 2xx.
#[derive(Debug, Clone, PartialEq)]
pub enum Acknowledgement {
    /// Not a completed checkout.
    Ignored,
    /// Unparseable body or missing metadata; acknowledged so it is not redelivered.
    Malformed,
    Claimed(ReservationKey),
    /// Same session delivered again.
    Redelivered(ReservationKey),
    /// A second, different payment for an item someone else already holds.
    ConflictingClaim(ReservationKey),
    StoreFailed(ReservationKey),
}

#[derive(Debug, thiserror::Error)]
pub enum ConfirmationError {
    #[error("Invalid webhook signature: {0}")]
    InvalidSignature(#[from] SignatureError),
}

pub struct ConfirmationReceiver {
    verifier: SignatureVerifier,
    store: Arc<dyn AvailabilityStore>,
    dispatcher: NotificationDispatcher,
    catalog: Arc<InventoryCatalog>,
    events_tx: broadcast::Sender<ReservationClaimedEvent>,
}

/// Same session, or when no session id was ever sent, the same buyer.
fn is_redelivery(record: &ReservationRecord, event: &PaymentEvent) -> bool {
    if record.payment_reference != event.session_id {
        return false;
    }
    record.payment_reference.is_some()
        || record.buyer_email.as_ref().map(|e| e.expose()) == event.buyer_email.as_ref()
}

impl ConfirmationReceiver {
    pub fn new(
        verifier: SignatureVerifier,
        store: Arc<dyn AvailabilityStore>,
        dispatcher: NotificationDispatcher,
        catalog: Arc<InventoryCatalog>,
        events_tx: broadcast::Sender<ReservationClaimedEvent>,
    ) -> Self {
        Self {
            verifier,
            store,
            dispatcher,
            catalog,
            events_tx,
        }
    }

    /// Authenticates the raw body, then claims the item named in its metadata.
    ///
    /// Only a signature failure is an error. Everything after verification is
    /// acknowledged, including store failures, so the provider stops
    /// redelivering.
    pub async fn on_notification(
        &self,
        payload: &[u8],
        signature: Option<&str>,
    ) -> Result<Acknowledgement, ConfirmationError> {
        self.verifier.verify(payload, signature, Utc::now().timestamp())?;

        let event = match PaymentEvent::parse(payload) {
            Ok(event) => event,
            Err(e) => {
                warn!("Verified webhook body could not be parsed: {}", e);
                return Ok(Acknowledgement::Malformed);
            }
        };

        if !event.is_checkout_completed() {
            info!("Ignoring webhook event {} of type {}", event.id, event.event_type);
            return Ok(Acknowledgement::Ignored);
        }

        let Some(metadata) = event.checkout_metadata() else {
            warn!("Webhook event {} is missing reservation metadata, acknowledging", event.id);
            return Ok(Acknowledgement::Malformed);
        };

        let key = metadata.reservation_key();
        let claimant = Claimant::new(event.buyer_email.clone(), event.session_id.clone());

        match self.store.try_claim(&key, &claimant).await {
            Ok(ClaimOutcome::Claimed(record)) => {
                info!("Claimed {} via session {:?}", key, event.session_id);
                self.publish(&record);
                self.notify(&record);
                Ok(Acknowledgement::Claimed(key))
            }
            Ok(ClaimOutcome::AlreadyClaimed(record)) => {
                if is_redelivery(&record, &event) {
                    info!("Redelivered confirmation for {}, nothing to do", key);
                    Ok(Acknowledgement::Redelivered(key))
                } else {
                    error!(
                        "Payment {:?} completed for {} which is already held by {:?}; manual refund required",
                        event.session_id, key, record.payment_reference
                    );
                    Ok(Acknowledgement::ConflictingClaim(key))
                }
            }
            Err(e) => {
                error!("Could not persist claim for {}: {}", key, e);
                Ok(Acknowledgement::StoreFailed(key))
            }
        }
    }

    fn publish(&self, record: &ReservationRecord) {
        let event = ReservationClaimedEvent {
            item_id: record.key.item_id.clone(),
            event_id: record.key.event_id.clone(),
            category: record.key.category.clone(),
            kind: record.key.kind.as_str().to_string(),
            claimed_at: record.claimed_at.unwrap_or_else(Utc::now),
        };
        // no subscribers is fine
        let _ = self.events_tx.send(event);
    }

    fn notify(&self, record: &ReservationRecord) {
        let Some(to) = record.buyer_email.clone() else {
            warn!("No buyer email for {}, skipping confirmation", record.key);
            return;
        };

        let live_event = self
            .catalog
            .event(&record.key.event_id)
            .cloned()
            .unwrap_or_else(|_| LiveEvent::unlisted(&record.key.event_id));

        let details = ReservationDetails {
            kind: record.key.kind,
            item_id: record.key.item_id.clone(),
            category: record.key.category.clone(),
            event_id: live_event.id,
            event_name: live_event.name,
            event_date: live_event.date,
            venue: live_event.venue,
        };
        self.dispatcher.dispatch(to, details);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::RecordingNotifier;
    use arena_catalog::CategoryDefinition;
    use arena_core::{ItemKind, ReservationStatus};
    use arena_store::InMemoryAvailabilityStore;
    use std::time::Duration;

    const SECRET: &str = "whsec_test";

    struct Fixture {
        receiver: ConfirmationReceiver,
        store: Arc<InMemoryAvailabilityStore>,
        notifier: Arc<RecordingNotifier>,
        events_rx: broadcast::Receiver<ReservationClaimedEvent>,
    }

    fn fixture() -> Fixture {
        let catalog = InventoryCatalog::new(
            &[CategoryDefinition {
                name: "Verde Suite Gold".to_string(),
                price_reference: "price_gold".to_string(),
                numbers: vec!["350".to_string()],
            }],
            &[],
            vec![LiveEvent {
                id: "15-feb-2026".to_string(),
                name: "Primer Jaripeo del Año".to_string(),
                date: "Domingo 15 de Febrero 2026".to_string(),
                venue: "Gomez Western Wear Arena".to_string(),
            }],
        )
        .unwrap();

        let store = Arc::new(InMemoryAvailabilityStore::new());
        let notifier = Arc::new(RecordingNotifier::new());
        let (events_tx, events_rx) = broadcast::channel(16);
        let receiver = ConfirmationReceiver::new(
            SignatureVerifier::new(SECRET, 300),
            store.clone(),
            NotificationDispatcher::new(notifier.clone()),
            Arc::new(catalog),
            events_tx,
        );
        Fixture {
            receiver,
            store,
            notifier,
            events_rx,
        }
    }

    fn completed(session: &str, email: Option<&str>) -> Vec<u8> {
        serde_json::to_vec(&serde_json::json!({
            "id": format!("evt_{}", session),
            "type": "checkout.session.completed",
            "data": { "object": {
                "id": session,
                "customer_details": { "email": email },
                "metadata": {
                    "itemId": "350",
                    "eventId": "15-feb-2026",
                    "category": "Verde Suite Gold",
                    "kind": "suite"
                }
            }}
        }))
        .unwrap()
    }

    fn sign(payload: &[u8]) -> String {
        SignatureVerifier::new(SECRET, 300)
            .sign(payload, Utc::now().timestamp())
            .unwrap()
    }

    fn key() -> ReservationKey {
        ReservationKey::new(ItemKind::Suite, "350", "15-feb-2026", "Verde Suite Gold")
    }

    #[tokio::test]
    async fn test_completed_payment_claims_and_notifies_once() {
        let mut f = fixture();
        let payload = completed("cs_1", Some("buyer@example.com"));

        let ack = f.receiver.on_notification(&payload, Some(sign(&payload).as_str())).await.unwrap();
        assert_eq!(ack, Acknowledgement::Claimed(key()));

        assert_eq!(f.store.len().await, 1);
        assert_eq!(f.store.status(&key()).await.unwrap(), ReservationStatus::Claimed);
        let record = f.store.get_record(&key()).await.unwrap().unwrap();
        assert_eq!(record.payment_reference.as_deref(), Some("cs_1"));

        assert_eq!(f.notifier.wait_for_attempts(1, Duration::from_secs(1)).await, 1);
        let sent = f.notifier.sent();
        assert_eq!(sent[0].0, "buyer@example.com");
        assert_eq!(sent[0].1.event_name, "Primer Jaripeo del Año");
        assert_eq!(sent[0].1.venue, "Gomez Western Wear Arena");

        let published = f.events_rx.try_recv().unwrap();
        assert_eq!(published.item_id, "350");
        assert_eq!(published.kind, "suite");
    }

    #[tokio::test]
    async fn test_redelivery_is_acknowledged_without_second_email() {
        let f = fixture();
        let payload = completed("cs_1", Some("buyer@example.com"));

        f.receiver.on_notification(&payload, Some(sign(&payload).as_str())).await.unwrap();
        let ack = f.receiver.on_notification(&payload, Some(sign(&payload).as_str())).await.unwrap();
        assert_eq!(ack, Acknowledgement::Redelivered(key()));

        assert_eq!(f.store.len().await, 1);
        f.notifier.wait_for_attempts(2, Duration::from_millis(100)).await;
        assert_eq!(f.notifier.attempts(), 1);
    }

    #[tokio::test]
    async fn test_second_payment_for_claimed_item_keeps_first_buyer() {
        let f = fixture();
        let first = completed("cs_1", Some("first@example.com"));
        let second = completed("cs_2", Some("second@example.com"));

        f.receiver.on_notification(&first, Some(sign(&first).as_str())).await.unwrap();
        let ack = f.receiver.on_notification(&second, Some(sign(&second).as_str())).await.unwrap();
        assert_eq!(ack, Acknowledgement::ConflictingClaim(key()));

        let record = f.store.get_record(&key()).await.unwrap().unwrap();
        assert_eq!(record.payment_reference.as_deref(), Some("cs_1"));
        assert_eq!(f.notifier.wait_for_attempts(1, Duration::from_secs(1)).await, 1);
        assert_eq!(f.notifier.sent()[0].0, "first@example.com");
    }

    fn without_session(email: &str) -> Vec<u8> {
        serde_json::to_vec(&serde_json::json!({
            "id": "evt_nosession",
            "type": "checkout.session.completed",
            "data": { "object": {
                "customer_email": email,
                "metadata": {
                    "itemId": "350",
                    "eventId": "15-feb-2026",
                    "category": "Verde Suite Gold",
                    "kind": "suite"
                }
            }}
        }))
        .unwrap()
    }

    #[tokio::test]
    async fn test_redelivery_without_session_id_matches_on_buyer() {
        let f = fixture();
        let payload = without_session("buyer@example.com");

        let ack = f.receiver.on_notification(&payload, Some(sign(&payload).as_str())).await.unwrap();
        assert_eq!(ack, Acknowledgement::Claimed(key()));
        let ack = f.receiver.on_notification(&payload, Some(sign(&payload).as_str())).await.unwrap();
        assert_eq!(ack, Acknowledgement::Redelivered(key()));

        let other = without_session("other@example.com");
        let ack = f.receiver.on_notification(&other, Some(sign(&other).as_str())).await.unwrap();
        assert_eq!(ack, Acknowledgement::ConflictingClaim(key()));

        assert_eq!(f.store.len().await, 1);
        f.notifier.wait_for_attempts(2, Duration::from_millis(100)).await;
        assert_eq!(f.notifier.attempts(), 1);
    }

    #[tokio::test]
    async fn test_bad_signature_has_no_side_effects() {
        let f = fixture();
        let payload = completed("cs_1", Some("buyer@example.com"));
        let forged = SignatureVerifier::new("whsec_other", 300)
            .sign(&payload, Utc::now().timestamp())
            .unwrap();

        let err = f.receiver.on_notification(&payload, Some(forged.as_str())).await.unwrap_err();
        assert!(matches!(err, ConfirmationError::InvalidSignature(SignatureError::NoMatchingSignature)));

        let err = f.receiver.on_notification(&payload, None).await.unwrap_err();
        assert!(matches!(err, ConfirmationError::InvalidSignature(SignatureError::MissingHeader)));

        assert!(f.store.is_empty().await);
        assert_eq!(f.notifier.attempts(), 0);
    }

    #[tokio::test]
    async fn test_other_event_types_are_ignored() {
        let f = fixture();
        let payload = serde_json::to_vec(&serde_json::json!({
            "id": "evt_9",
            "type": "payment_intent.created",
            "data": { "object": { "id": "pi_9" } }
        }))
        .unwrap();

        let ack = f.receiver.on_notification(&payload, Some(sign(&payload).as_str())).await.unwrap();
        assert_eq!(ack, Acknowledgement::Ignored);
        assert!(f.store.is_empty().await);
    }

    #[tokio::test]
    async fn test_missing_metadata_is_acknowledged() {
        let f = fixture();
        let payload = serde_json::to_vec(&serde_json::json!({
            "id": "evt_3",
            "type": "checkout.session.completed",
            "data": { "object": { "id": "cs_3", "metadata": { "itemId": "350" } } }
        }))
        .unwrap();

        let ack = f.receiver.on_notification(&payload, Some(sign(&payload).as_str())).await.unwrap();
        assert_eq!(ack, Acknowledgement::Malformed);
        assert!(f.store.is_empty().await);
        assert_eq!(f.notifier.attempts(), 0);
    }

    #[tokio::test]
    async fn test_claim_without_email_skips_notification() {
        let f = fixture();
        let payload = completed("cs_4", None);

        let ack = f.receiver.on_notification(&payload, Some(sign(&payload).as_str())).await.unwrap();
        assert_eq!(ack, Acknowledgement::Claimed(key()));
        f.notifier.wait_for_attempts(1, Duration::from_millis(100)).await;
        assert_eq!(f.notifier.attempts(), 0);
    }
}
