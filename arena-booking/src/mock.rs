//! In-process stand-ins for the payment provider and the mail transport.

use arena_core::notification::{Notifier, ReservationDetails};
use arena_core::payment::{CheckoutSession, CheckoutSessionRequest, PaymentProvider};
use arena_core::{CoreError, CoreResult};
use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

/// Issues fake hosted sessions. Used when no Stripe key is configured.
pub struct MockPaymentProvider {
    base_url: String,
    available: bool,
    counter: AtomicUsize,
    requests: Mutex<Vec<CheckoutSessionRequest>>,
}

impl MockPaymentProvider {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            available: true,
            counter: AtomicUsize::new(0),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Every call fails as if the provider were down.
    pub fn unavailable() -> Self {
        Self {
            available: false,
            ..Self::new("http://localhost")
        }
    }

    pub fn requests(&self) -> Vec<CheckoutSessionRequest> {
        self.requests.lock().map(|r| r.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl PaymentProvider for MockPaymentProvider {
    async fn create_checkout_session(&self, request: &CheckoutSessionRequest) -> CoreResult<CheckoutSession> {
        if !self.available {
            return Err(CoreError::PaymentError("Simulated payment provider outage".to_string()));
        }

        if let Ok(mut requests) = self.requests.lock() {
            requests.push(request.clone());
        }
        let n = self.counter.fetch_add(1, Ordering::SeqCst) + 1;
        let id = format!("cs_mock_{}", n);

        Ok(CheckoutSession {
            url: format!("{}/mock-checkout/{}", self.base_url, id),
            id,
        })
    }
}

/// Keeps every confirmation instead of sending it.
#[derive(Default)]
pub struct RecordingNotifier {
    fail: bool,
    attempts: AtomicUsize,
    sent: Mutex<Vec<(String, ReservationDetails)>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn sent(&self) -> Vec<(String, ReservationDetails)> {
        self.sent.lock().map(|s| s.clone()).unwrap_or_default()
    }

    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }

    /// Polls until `count` attempts were made or `timeout` elapses.
    pub async fn wait_for_attempts(&self, count: usize, timeout: Duration) -> usize {
        let deadline = tokio::time::Instant::now() + timeout;
        while self.attempts() < count && tokio::time::Instant::now() < deadline {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        self.attempts()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn send_confirmation(&self, to: &str, details: &ReservationDetails) -> CoreResult<()> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(CoreError::NotificationError("Simulated mail outage".to_string()));
        }
        if let Ok(mut sent) = self.sent.lock() {
            sent.push((to.to_string(), details.clone()));
        }
        Ok(())
    }
}
