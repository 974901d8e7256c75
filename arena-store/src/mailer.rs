//! Confirmation mail delivery.

use arena_core::notification::{Notifier, ReservationDetails};
use arena_core::{CoreError, CoreResult, ItemKind};
use arena_shared::pii::Masked;
use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use tracing::info;

pub const CONFIRMATION_SUBJECT: &str = "✅ Pago Confirmado - Gomez Arena VIP";

/// Sends confirmations over SMTP. The transport pools connections, so one
/// instance is shared by every dispatch.
#[derive(Clone)]
pub struct SmtpNotifier {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl SmtpNotifier {
    pub fn new(
        smtp_host: &str,
        smtp_port: u16,
        credentials: Option<(String, String)>,
        from_email: &str,
        from_name: &str,
    ) -> CoreResult<Self> {
        let mut builder = AsyncSmtpTransport::<Tokio1Executor>::relay(smtp_host)
            .map_err(|e| CoreError::NotificationError(format!("SMTP relay error: {}", e)))?
            .port(smtp_port);
        if let Some((username, password)) = credentials {
            builder = builder.credentials(Credentials::new(username, password));
        }

        let from = format!("{} <{}>", from_name, from_email)
            .parse()
            .map_err(|e| CoreError::NotificationError(format!("Invalid from address: {}", e)))?;

        Ok(Self {
            transport: builder.build(),
            from,
        })
    }
}

#[async_trait]
impl Notifier for SmtpNotifier {
    async fn send_confirmation(&self, to: &str, details: &ReservationDetails) -> CoreResult<()> {
        let to: Mailbox = to
            .parse()
            .map_err(|e| CoreError::NotificationError(format!("Invalid to address: {}", e)))?;

        let email = Message::builder()
            .from(self.from.clone())
            .to(to)
            .subject(CONFIRMATION_SUBJECT)
            .header(ContentType::TEXT_HTML)
            .body(render_confirmation(details))
            .map_err(|e| CoreError::NotificationError(format!("Failed to build email: {}", e)))?;

        self.transport
            .send(email)
            .await
            .map_err(|e| CoreError::NotificationError(format!("Failed to send email: {}", e)))?;
        Ok(())
    }
}

/// Logs instead of sending. Used when no SMTP host is configured.
#[derive(Clone, Default)]
pub struct ConsoleNotifier;

#[async_trait]
impl Notifier for ConsoleNotifier {
    async fn send_confirmation(&self, to: &str, details: &ReservationDetails) -> CoreResult<()> {
        info!(
            to = %Masked(to.to_string()).hint(),
            item = %details.item_id,
            category = %details.category,
            event = %details.event_id,
            "Confirmation email (console)"
        );
        Ok(())
    }
}

pub fn render_confirmation(details: &ReservationDetails) -> String {
    let label = match details.kind {
        ItemKind::Suite => "Suite",
        ItemKind::Table => "Mesa",
    };

    format!(
        r#"<div style="font-family: Arial, sans-serif; background-color: #060504; color: white; padding: 30px; border-radius: 10px;">
  <h2 style="color: #d97706; text-align: center;">¡PAGO EXITOSO!</h2>
  <p>Tu pago ha sido confirmado. Tu lugar en <strong>{venue}</strong> ha sido reservado.</p>
  <div style="background-color: #1f2937; padding: 20px; border-radius: 8px; border-left: 4px solid #d97706;">
    <p><strong>{label} #:</strong> {item}</p>
    <p><strong>Categoría:</strong> {category}</p>
    <p><strong>Evento:</strong> {event}</p>
    <p><strong>Fecha:</strong> {date}</p>
  </div>
  <p style="text-align: center; font-size: 36px; color: #d97706; font-weight: bold;">{item}</p>
</div>"#,
        venue = escape(&details.venue),
        label = label,
        item = escape(&details.item_id),
        category = escape(&details.category),
        event = escape(&details.event_name),
        date = escape(&details.event_date),
    )
}

fn escape(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
