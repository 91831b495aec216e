use lettre::message::header::ContentType;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{Message, SmtpTransport, Transport};

pub mod authtoken;

use crate::{
    conf::settings,
    prelude::{Error, Result},
};

#[async_trait::async_trait]
pub trait SendEmail {
    async fn send(&self, email: &str) -> Result<()>;
}

/// Sends one email through the configured SMTP relay. The transport is
/// blocking, so the actual send runs on the blocking pool; failures come
/// back to the caller instead of being dropped.
pub async fn send_email(email: &str, subject: &str, body: &str, is_html: bool) -> Result<()> {
    let (name, _) = email.split_once('@').unwrap_or(("unknown", ""));
    let name = name.to_string();
    let email = email.to_string();
    let subject = subject.to_string();
    let body = body.to_string();
    tracing::debug!("sending email to {}", &email);

    let sent = tokio::task::spawn_blocking(move || -> Result<()> {
        let content_type = if is_html {
            ContentType::TEXT_HTML
        } else {
            ContentType::TEXT_PLAIN
        };

        let from: Mailbox = format!("{} <{}>", &settings.service_name, &settings.from_email)
            .parse()
            .map_err(|e| Error::Email(format!("invalid sender address: {e}")))?;
        let to: Mailbox = format!("{name} <{email}>")
            .parse()
            .map_err(|e| Error::Email(format!("invalid recipient address: {e}")))?;

        let message = Message::builder()
            .from(from)
            .to(to)
            .subject(subject)
            .header(content_type)
            .body(body)
            .map_err(|e| Error::Email(format!("could not build email: {e}")))?;

        let creds = Credentials::new(settings.smtp_user.clone(), settings.smtp_pass.clone());
        let mailer = SmtpTransport::relay(&settings.smtp_server)
            .map_err(|e| Error::Email(format!("smtp relay setup failed: {e}")))?
            .port(settings.smtp_port)
            .credentials(creds)
            .build();

        mailer
            .send(&message)
            .map_err(|e| Error::Email(format!("could not send email: {e}")))?;
        Ok(())
    })
    .await;

    match sent {
        Ok(result) => result,
        Err(e) => Err(Error::Email(format!("email task failed: {e}"))),
    }
}
