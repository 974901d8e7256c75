use std::net::SocketAddr;
use std::sync::Arc;
use anyhow::Context;
use arena_api::{app, state::{AppState, RateLimit}};
use arena_booking::{CheckoutInitiator, ConfirmationReceiver, MockPaymentProvider, NotificationDispatcher};
use arena_core::notification::Notifier;
use arena_core::payment::PaymentProvider;
use arena_core::repository::AvailabilityStore;
use arena_core::signature::SignatureVerifier;
use arena_store::app_config::Config;
use arena_store::{ConsoleNotifier, DbClient, RedisClient, SmtpNotifier, StripeCheckoutClient};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "arena_api=debug,arena_booking=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::load().context("Failed to load config")?;
    tracing::info!("Starting Arena API on port {}", config.server.port);

    let catalog = Arc::new(config.catalog.build().context("Invalid catalog")?);
    tracing::info!("Catalog loaded: {} items across {} events", catalog.len(), catalog.events().len());

    // Postgres
    let db = DbClient::connect(&config.database)
        .await
        .context("Failed to connect to Postgres")?;
    db.migrate().await.context("Failed to run migrations")?;
    let store: Arc<dyn AvailabilityStore> = Arc::new(db.availability_store());

    // Payment provider
    let provider: Arc<dyn PaymentProvider> = if config.payment.stripe_secret_key.is_empty() {
        tracing::warn!("No Stripe key configured, using mock checkout sessions");
        Arc::new(MockPaymentProvider::new(&format!("http://localhost:{}", config.server.port)))
    } else {
        Arc::new(
            StripeCheckoutClient::new(
                &config.payment.stripe_secret_key,
                &config.payment.api_base,
                &config.payment.success_url,
                &config.payment.cancel_url,
            )
            .context("Failed to build Stripe client")?,
        )
    };

    // Mail
    let notifier: Arc<dyn Notifier> = match &config.mail.smtp_host {
        Some(host) => {
            let credentials = config.mail.smtp_username.clone().zip(config.mail.smtp_password.clone());
            Arc::new(
                SmtpNotifier::new(host, config.mail.smtp_port, credentials, &config.mail.from_email, &config.mail.from_name)
                    .context("Failed to configure SMTP")?,
            )
        }
        None => {
            tracing::warn!("No SMTP host configured, confirmations are logged only");
            Arc::new(ConsoleNotifier)
        }
    };

    // Redis (optional, rate limiting only)
    let rate_limit = match &config.redis.url {
        Some(url) => Some(RateLimit {
            limiter: Arc::new(RedisClient::new(url).context("Invalid Redis URL")?),
            per_minute: config.redis.rate_limit_per_minute,
        }),
        None => None,
    };

    // SSE Broadcast Channel
    let (sse_tx, _) = tokio::sync::broadcast::channel(100);

    let initiator = CheckoutInitiator::new(catalog.clone(), store.clone(), provider);
    let receiver = ConfirmationReceiver::new(
        SignatureVerifier::new(config.payment.webhook_secret.clone(), config.payment.signature_tolerance_secs),
        store.clone(),
        NotificationDispatcher::new(notifier),
        catalog,
        sse_tx.clone(),
    );

    let app_state = AppState {
        store,
        initiator: Arc::new(initiator),
        receiver: Arc::new(receiver),
        sse_tx,
        rate_limit,
        allowed_origin: config.server.allowed_origin.clone(),
    };

    let app = app(app_state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;
    Ok(())
}
