use std::time::Duration;

use async_trait::async_trait;
use leadflow_core::adapters::Mailer;
use leadflow_core::config::MailConfig;
use leadflow_core::{LeadflowError, Result};
use lettre::message::header::ContentType;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};

const ADAPTER: &str = "smtp";

/// Plain-text mail over SMTP with STARTTLS.
pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
    timeout: Duration,
}

impl SmtpMailer {
    pub fn new(config: &MailConfig, timeout: Duration) -> Result<Self> {
        let from = sender_mailbox(config)?;
        let transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.smtp_server)
            .map_err(|e| LeadflowError::transport(ADAPTER, e.to_string()))?
            .port(config.smtp_port)
            .credentials(Credentials::new(
                config.address.clone(),
                config.password.expose().to_string(),
            ))
            .timeout(Some(timeout))
            .build();
        Ok(Self {
            transport,
            from,
            timeout,
        })
    }

    fn map_error(&self, e: lettre::transport::smtp::Error) -> LeadflowError {
        if e.is_timeout() {
            return LeadflowError::AdapterTimeout {
                adapter: ADAPTER,
                secs: self.timeout.as_secs(),
            };
        }
        match e.status().map(|code| code.to_string()) {
            Some(code) if code == "535" || code == "534" => {
                LeadflowError::AdapterAuthFailure(ADAPTER)
            }
            Some(_) => LeadflowError::bad_response(ADAPTER, e.to_string()),
            None => LeadflowError::transport(ADAPTER, e.to_string()),
        }
    }
}

fn sender_mailbox(config: &MailConfig) -> Result<Mailbox> {
    let address = config.address.parse().map_err(|e| LeadflowError::ConfigInvalid {
        key: "SMTP_EMAIL".into(),
        reason: format!("{e}"),
    })?;
    Ok(Mailbox::new(Some(config.sender_name.clone()), address))
}

fn build_message(from: &Mailbox, to: &str, subject: &str, body: &str) -> Result<Message> {
    let to: Mailbox = to
        .parse()
        .map_err(|e| LeadflowError::bad_response(ADAPTER, format!("recipient {to:?}: {e}")))?;
    Message::builder()
        .from(from.clone())
        .to(to)
        .subject(subject)
        .header(ContentType::TEXT_PLAIN)
        .body(body.to_string())
        .map_err(|e| LeadflowError::bad_response(ADAPTER, e.to_string()))
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send(&self, to: &str, subject: &str, body: &str) -> Result<()> {
        let message = build_message(&self.from, to, subject, body)?;
        let response = self
            .transport
            .send(message)
            .await
            .map_err(|e| self.map_error(e))?;
        tracing::debug!(to, code = %response.code(), "mail accepted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use leadflow_core::config::Secret;

    fn mail_config() -> MailConfig {
        MailConfig {
            address: "sam@acme.io".into(),
            password: Secret::new("pw"),
            smtp_server: "smtp.acme.io".into(),
            smtp_port: 587,
            imap_server: "imap.acme.io".into(),
            imap_port: 993,
            sender_name: "Sam Rivera".into(),
        }
    }

    #[test]
    fn message_carries_sender_name_and_plain_body() {
        let from = sender_mailbox(&mail_config()).unwrap();
        let msg = build_message(&from, "ana@x.io", "Hello", "Hi Ana, nice to meet you.").unwrap();
        let raw = String::from_utf8(msg.formatted()).unwrap();

        assert!(raw.contains("Sam Rivera"));
        assert!(raw.contains("<sam@acme.io>"));
        assert!(raw.contains("To: ana@x.io"));
        assert!(raw.contains("Subject: Hello"));
        assert!(raw.contains("Content-Type: text/plain; charset=utf-8"));
        assert!(raw.contains("Hi Ana, nice to meet you."));
    }

    #[test]
    fn bad_recipient_is_rejected_before_sending() {
        let from = sender_mailbox(&mail_config()).unwrap();
        let err = build_message(&from, "not an address", "Hello", "body").unwrap_err();
        assert!(matches!(err, LeadflowError::AdapterBadResponse { adapter: "smtp", .. }));
    }

    #[test]
    fn bad_sender_address_is_config_error() {
        let mut config = mail_config();
        config.address = "nope".into();
        let err = sender_mailbox(&config).unwrap_err();
        assert!(err.to_string().contains("SMTP_EMAIL"));
    }

    #[tokio::test]
    async fn mailer_builds_without_connecting() {
        assert!(SmtpMailer::new(&mail_config(), Duration::from_secs(5)).is_ok());
    }
}
