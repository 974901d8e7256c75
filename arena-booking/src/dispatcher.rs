use arena_core::notification::{Notifier, ReservationDetails};
use arena_shared::pii::Masked;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{error, info};

/// Fire-and-forget confirmation delivery. A failed send is logged and has
/// no effect on the claim that triggered it.
#[derive(Clone)]
pub struct NotificationDispatcher {
    notifier: Arc<dyn Notifier>,
}

impl NotificationDispatcher {
    pub fn new(notifier: Arc<dyn Notifier>) -> Self {
        Self { notifier }
    }

    pub fn dispatch(&self, to: Masked<String>, details: ReservationDetails) -> JoinHandle<()> {
        let notifier = self.notifier.clone();
        tokio::spawn(async move {
            match notifier.send_confirmation(to.expose(), &details).await {
                Ok(()) => info!("Confirmation sent to {} for {} #{}", to.hint(), details.kind, details.item_id),
                Err(e) => error!("Confirmation to {} for {} #{} failed: {}", to.hint(), details.kind, details.item_id, e),
            }
        })
    }
}
