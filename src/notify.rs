//! Best-effort booking notifications. WhatsApp is the primary channel; email
//! is used only when WhatsApp is disabled and the recipient has an address.
//! Every failure is logged and dropped.

use std::sync::Arc;

use lettre::{
    message::header::ContentType, transport::smtp::authentication::Credentials,
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};
use serde_json::json;
use thiserror::Error;

use crate::config::{AppConfig, EmailConfig, WhatsAppConfig};

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("WhatsApp request failed: {0}")]
    WhatsApp(#[from] reqwest::Error),

    #[error("Email failed: {0}")]
    Email(String),
}

#[derive(Clone, Debug)]
pub struct NewBookingNotice {
    pub artist_phone: String,
    pub artist_email: Option<String>,
    pub artist_name: String,
    pub client_name: String,
    pub event_type: String,
    pub event_date: String,
    pub event_location: String,
}

#[derive(Clone, Debug)]
pub struct StatusNotice {
    pub client_phone: String,
    pub client_email: Option<String>,
    pub client_name: String,
    pub artist_name: String,
    pub status: String,
    pub event_date: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Outgoing {
    pub phone: String,
    pub email: Option<String>,
    pub subject: String,
    pub body: String,
}

impl NewBookingNotice {
    pub fn render(&self) -> Outgoing {
        let body = format!(
            "Hi {}, you have a new booking request from {}! Event: {} on {} at {}. \
             Log in to Folkstage to respond.",
            self.artist_name, self.client_name, self.event_type, self.event_date, self.event_location
        );
        Outgoing {
            phone: self.artist_phone.clone(),
            email: self.artist_email.clone(),
            subject: "New Booking Request - Folkstage".to_string(),
            body,
        }
    }
}

impl StatusNotice {
    pub fn render(&self) -> Outgoing {
        let body = format!(
            "Hi {}, your booking with {} on {} has been {}. Log in to Folkstage for details.",
            self.client_name,
            self.artist_name,
            self.event_date,
            self.status.to_lowercase()
        );
        Outgoing {
            phone: self.client_phone.clone(),
            email: self.client_email.clone(),
            subject: format!("Booking {} - Folkstage", self.status),
            body,
        }
    }
}

pub struct Notifier {
    whatsapp: Option<WhatsAppConfig>,
    email: Option<EmailConfig>,
    http: reqwest::Client,
}

impl Notifier {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            whatsapp: config.whatsapp.clone(),
            email: config.email.clone(),
            http: reqwest::Client::new(),
        }
    }

    pub fn disabled() -> Self {
        Self {
            whatsapp: None,
            email: None,
            http: reqwest::Client::new(),
        }
    }

    pub fn enabled(&self) -> bool {
        self.whatsapp.is_some() || self.email.is_some()
    }

    /// Fire-and-forget: the caller never waits on delivery.
    pub fn spawn(self: &Arc<Self>, outgoing: Outgoing) {
        if !self.enabled() {
            return;
        }
        let notifier = Arc::clone(self);
        tokio::spawn(async move {
            notifier.deliver(outgoing).await;
        });
    }

    pub async fn deliver(&self, outgoing: Outgoing) {
        if let Err(err) = self.try_deliver(&outgoing).await {
            log::warn!("Failed to send notification \"{}\": {err}", outgoing.subject);
        }
    }

    async fn try_deliver(&self, outgoing: &Outgoing) -> Result<(), NotifyError> {
        if let Some(whatsapp) = &self.whatsapp {
            return self.send_whatsapp(whatsapp, &outgoing.phone, &outgoing.body).await;
        }

        if let (Some(email), Some(to)) = (&self.email, outgoing.email.as_deref()) {
            let html = format!("<p>{}</p>", outgoing.body);
            return send_email(email, to, &outgoing.subject, html).await;
        }

        Ok(())
    }

    async fn send_whatsapp(
        &self,
        config: &WhatsAppConfig,
        to: &str,
        message: &str,
    ) -> Result<(), NotifyError> {
        let url = format!(
            "https://graph.facebook.com/{}/{}/messages",
            config.api_version, config.phone_number_id
        );

        self.http
            .post(url)
            .bearer_auth(&config.access_token)
            .json(&json!({
                "messaging_product": "whatsapp",
                "to": to,
                "type": "text",
                "text": { "body": message }
            }))
            .send()
            .await?
            .error_for_status()?;

        log::info!("WhatsApp message sent to {to}");
        Ok(())
    }
}

async fn send_email(
    config: &EmailConfig,
    to: &str,
    subject: &str,
    html: String,
) -> Result<(), NotifyError> {
    let message = Message::builder()
        .from(
            config
                .from
                .parse()
                .map_err(|e| NotifyError::Email(format!("Invalid from address: {e}")))?,
        )
        .to(to
            .parse()
            .map_err(|e| NotifyError::Email(format!("Invalid to address: {e}")))?)
        .subject(subject)
        .header(ContentType::TEXT_HTML)
        .body(html)
        .map_err(|e| NotifyError::Email(format!("Failed to build email: {e}")))?;

    let mailer = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host)
        .map_err(|e| NotifyError::Email(format!("SMTP relay error: {e}")))?
        .port(config.port)
        .credentials(Credentials::new(
            config.username.clone(),
            config.password.clone(),
        ))
        .build();

    mailer
        .send(message)
        .await
        .map_err(|e| NotifyError::Email(format!("Failed to send email: {e}")))?;

    log::info!("Email sent to {to}");
    Ok(())
}
