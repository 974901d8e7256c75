use arena_catalog::{CatalogError, InventoryCatalog};
use arena_core::payment::{CheckoutMetadata, CheckoutSession, CheckoutSessionRequest, PaymentProvider};
use arena_core::repository::AvailabilityStore;
use arena_core::{CoreError, ItemKind, ReservationKey};
use std::sync::Arc;
use tracing::{info, warn};

/// A buyer's request to pay for one item. Never persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct CheckoutRequest {
    pub item_id: String,
    pub event_id: String,
    pub category: Option<String>,
    pub kind: ItemKind,
    /// Only honoured for tables the catalog does not list.
    pub price_reference: Option<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum CheckoutError {
    #[error("{0}")]
    ItemNotFound(String),
    #[error("{0} is already sold")]
    AlreadyClaimed(ReservationKey),
    #[error("Upstream unavailable: {0}")]
    UpstreamUnavailable(CoreError),
}

impl From<CatalogError> for CheckoutError {
    fn from(err: CatalogError) -> Self {
        CheckoutError::ItemNotFound(err.to_string())
    }
}

/// Validates a request against the catalog and current availability, then
/// opens a hosted payment session. Writes nothing locally: an abandoned
/// session simply expires at the provider.
pub struct CheckoutInitiator {
    catalog: Arc<InventoryCatalog>,
    store: Arc<dyn AvailabilityStore>,
    provider: Arc<dyn PaymentProvider>,
}

impl CheckoutInitiator {
    pub fn new(
        catalog: Arc<InventoryCatalog>,
        store: Arc<dyn AvailabilityStore>,
        provider: Arc<dyn PaymentProvider>,
    ) -> Self {
        Self { catalog, store, provider }
    }

    pub async fn initiate(&self, request: &CheckoutRequest) -> Result<CheckoutSession, CheckoutError> {
        let item_id = request.item_id.trim();
        if item_id.is_empty() {
            return Err(CheckoutError::ItemNotFound("missing item number".to_string()));
        }
        let event = self.catalog.event(&request.event_id)?;

        // 1. resolve price and the category that forms the natural key
        let (category, price_reference) = self.resolve(request.kind, item_id, request)?;
        let key = ReservationKey::new(request.kind, item_id, &event.id, &category);

        // 2. best-effort pre-check; the webhook claim is authoritative
        let claimed = self.store.is_claimed(&key).await.map_err(|e| {
            warn!("Availability pre-check failed for {}: {}", key, e);
            CheckoutError::UpstreamUnavailable(e)
        })?;
        if claimed {
            info!("Rejected checkout for {}: already sold", key);
            return Err(CheckoutError::AlreadyClaimed(key));
        }

        // 3. hosted session with round-trip metadata
        let session_request = CheckoutSessionRequest {
            price_reference,
            metadata: CheckoutMetadata {
                item_id: key.item_id.clone(),
                event_id: key.event_id.clone(),
                category: key.category.clone(),
                kind: key.kind,
            },
        };
        let session = self
            .provider
            .create_checkout_session(&session_request)
            .await
            .map_err(|e| {
                warn!("Payment session creation failed for {}: {}", key, e);
                CheckoutError::UpstreamUnavailable(e)
            })?;

        info!("Checkout session {} opened for {}", session.id, key);
        Ok(session)
    }

    fn resolve(
        &self,
        kind: ItemKind,
        item_id: &str,
        request: &CheckoutRequest,
    ) -> Result<(String, String), CheckoutError> {
        let requested_category = request
            .category
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty());

        match self.catalog.lookup(kind, item_id) {
            Ok(item) => {
                if let Some(category) = requested_category {
                    if !self.catalog.belongs_to(kind, item_id, category) {
                        return Err(CheckoutError::ItemNotFound(format!(
                            "{} {} is not part of '{}'",
                            kind, item_id, category
                        )));
                    }
                }
                Ok((item.category.clone(), item.price_reference.clone()))
            }
            Err(err) if kind == ItemKind::Table => {
                let price = request
                    .price_reference
                    .as_deref()
                    .map(str::trim)
                    .filter(|p| !p.is_empty())
                    .ok_or(CheckoutError::from(err))?;
                let category = requested_category
                    .ok_or_else(|| CheckoutError::ItemNotFound(format!("table {} needs a category", item_id)))?;
                Ok((category.to_string(), price.to_string()))
            }
            Err(err) => Err(err.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockPaymentProvider;
    use arena_catalog::{CategoryDefinition, LiveEvent};
    use arena_core::Claimant;
    use arena_store::InMemoryAvailabilityStore;

    struct Fixture {
        initiator: CheckoutInitiator,
        store: Arc<InMemoryAvailabilityStore>,
        provider: Arc<MockPaymentProvider>,
    }

    fn fixture_with(provider: MockPaymentProvider) -> Fixture {
        let catalog = InventoryCatalog::new(
            &[CategoryDefinition {
                name: "Verde Suite Gold".to_string(),
                price_reference: "price_gold".to_string(),
                numbers: vec!["350".to_string(), "332".to_string()],
            }],
            &[CategoryDefinition {
                name: "Mesa VIP".to_string(),
                price_reference: "price_table_vip".to_string(),
                numbers: vec!["1".to_string()],
            }],
            vec![LiveEvent {
                id: "15-feb-2026".to_string(),
                name: "Primer Jaripeo del Año".to_string(),
                date: "Domingo 15 de Febrero 2026".to_string(),
                venue: "Gomez Western Wear Arena".to_string(),
            }],
        )
        .unwrap();

        let store = Arc::new(InMemoryAvailabilityStore::new());
        let provider = Arc::new(provider);
        Fixture {
            initiator: CheckoutInitiator::new(Arc::new(catalog), store.clone(), provider.clone()),
            store,
            provider,
        }
    }

    fn fixture() -> Fixture {
        fixture_with(MockPaymentProvider::new("https://pay.example.com"))
    }

    fn suite(item: &str, category: Option<&str>) -> CheckoutRequest {
        CheckoutRequest {
            item_id: item.to_string(),
            event_id: "15-feb-2026".to_string(),
            category: category.map(str::to_string),
            kind: ItemKind::Suite,
            price_reference: None,
        }
    }

    #[tokio::test]
    async fn test_suite_checkout_resolves_catalog_price() {
        let f = fixture();
        let session = f.initiator.initiate(&suite("350", Some("Verde Suite Gold"))).await.unwrap();

        assert!(session.url.starts_with("https://pay.example.com/mock-checkout/"));
        let requests = f.provider.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].price_reference, "price_gold");
        assert_eq!(requests[0].metadata.item_id, "350");
        assert_eq!(requests[0].metadata.category, "Verde Suite Gold");
        assert_eq!(requests[0].metadata.kind, ItemKind::Suite);
        // initiation writes nothing
        assert!(f.store.is_empty().await);
    }

    #[tokio::test]
    async fn test_suite_category_defaults_to_catalog() {
        let f = fixture();
        f.initiator.initiate(&suite("332", None)).await.unwrap();
        assert_eq!(f.provider.requests()[0].metadata.category, "Verde Suite Gold");
    }

    #[tokio::test]
    async fn test_client_supplied_price_is_ignored_for_suites() {
        let f = fixture();
        let mut request = suite("350", None);
        request.price_reference = Some("price_cheap".to_string());
        f.initiator.initiate(&request).await.unwrap();
        assert_eq!(f.provider.requests()[0].price_reference, "price_gold");
    }

    #[tokio::test]
    async fn test_unknown_suite_and_wrong_category_are_not_found() {
        let f = fixture();
        assert!(matches!(
            f.initiator.initiate(&suite("999", None)).await,
            Err(CheckoutError::ItemNotFound(_))
        ));
        assert!(matches!(
            f.initiator.initiate(&suite("350", Some("Rojo Suite Diamond"))).await,
            Err(CheckoutError::ItemNotFound(_))
        ));
        assert!(f.provider.requests().is_empty());
    }

    #[tokio::test]
    async fn test_unknown_event_is_not_found() {
        let f = fixture();
        let mut request = suite("350", None);
        request.event_id = "01-mar-2026".to_string();
        assert!(matches!(f.initiator.initiate(&request).await, Err(CheckoutError::ItemNotFound(_))));
    }

    #[tokio::test]
    async fn test_claimed_item_is_rejected_before_session_creation() {
        let f = fixture();
        let key = ReservationKey::new(ItemKind::Suite, "350", "15-feb-2026", "Verde Suite Gold");
        f.store.try_claim(&key, &Claimant::default()).await.unwrap();

        match f.initiator.initiate(&suite("350", Some("Verde Suite Gold"))).await {
            Err(CheckoutError::AlreadyClaimed(conflict)) => assert_eq!(conflict, key),
            other => panic!("expected conflict, got {:?}", other),
        }
        assert!(f.provider.requests().is_empty());
    }

    #[tokio::test]
    async fn test_uncatalogued_table_uses_supplied_price() {
        let f = fixture();
        let request = CheckoutRequest {
            item_id: "12".to_string(),
            event_id: "15-feb-2026".to_string(),
            category: Some("Mesa Oro".to_string()),
            kind: ItemKind::Table,
            price_reference: Some("price_table_oro".to_string()),
        };
        f.initiator.initiate(&request).await.unwrap();

        let sent = &f.provider.requests()[0];
        assert_eq!(sent.price_reference, "price_table_oro");
        assert_eq!(sent.metadata.kind, ItemKind::Table);
        assert_eq!(sent.metadata.category, "Mesa Oro");
    }

    #[tokio::test]
    async fn test_table_without_price_or_category_is_not_found() {
        let f = fixture();
        let mut request = CheckoutRequest {
            item_id: "12".to_string(),
            event_id: "15-feb-2026".to_string(),
            category: Some("Mesa Oro".to_string()),
            kind: ItemKind::Table,
            price_reference: None,
        };
        assert!(matches!(f.initiator.initiate(&request).await, Err(CheckoutError::ItemNotFound(_))));

        request.price_reference = Some("price_table_oro".to_string());
        request.category = None;
        assert!(matches!(f.initiator.initiate(&request).await, Err(CheckoutError::ItemNotFound(_))));
    }

    #[tokio::test]
    async fn test_catalogued_table_uses_catalog_price() {
        let f = fixture();
        let request = CheckoutRequest {
            item_id: "1".to_string(),
            event_id: "15-feb-2026".to_string(),
            category: None,
            kind: ItemKind::Table,
            price_reference: Some("price_other".to_string()),
        };
        f.initiator.initiate(&request).await.unwrap();
        assert_eq!(f.provider.requests()[0].price_reference, "price_table_vip");
    }

    #[tokio::test]
    async fn test_provider_outage_is_upstream_unavailable() {
        let f = fixture_with(MockPaymentProvider::unavailable());
        assert!(matches!(
            f.initiator.initiate(&suite("350", None)).await,
            Err(CheckoutError::UpstreamUnavailable(_))
        ));
    }
}
