use std::sync::{Arc, Mutex};

use anyhow::{Context, anyhow};
use async_trait::async_trait;
use lettre::{
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
    message::{Mailbox, header},
    transport::smtp::authentication::Credentials,
};
use tracing::info;

use crate::config::SmtpConfig;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mail {
    pub subject: String,
    pub body: String,
    pub from: String,
    pub to: Vec<String>,
}

/// Synchronous delivery; errors go back to the caller untouched.
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, mail: Mail) -> anyhow::Result<()>;
}

/// Picks SMTP when a host is configured, otherwise only logs.
pub fn from_config(smtp: &SmtpConfig) -> anyhow::Result<Arc<dyn Mailer>> {
    if smtp.host.trim().is_empty() {
        info!("SMTP host not configured; mail will only be logged");
        return Ok(Arc::new(LogMailer));
    }
    Ok(Arc::new(SmtpMailer::new(smtp)?))
}

pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
}

impl SmtpMailer {
    pub fn new(smtp: &SmtpConfig) -> anyhow::Result<Self> {
        let builder = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&smtp.host)
            .with_context(|| format!("configuring SMTP relay {}", smtp.host))?
            .port(smtp.port);

        let builder = match (&smtp.username, &smtp.password) {
            (Some(username), Some(password)) => {
                builder.credentials(Credentials::new(username.clone(), password.clone()))
            }
            _ => builder,
        };

        Ok(Self {
            transport: builder.build(),
        })
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send(&self, mail: Mail) -> anyhow::Result<()> {
        let mut message = Message::builder()
            .from(mail.from.parse::<Mailbox>()?)
            .subject(&mail.subject)
            .header(header::ContentType::TEXT_PLAIN);
        for to in &mail.to {
            message = message.to(to.parse::<Mailbox>()?);
        }
        let message = message.body(mail.body)?;

        self.transport.send(message).await?;
        info!(subject = %mail.subject, "mail sent");
        Ok(())
    }
}

pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, mail: Mail) -> anyhow::Result<()> {
        info!(
            subject = %mail.subject,
            from = %mail.from,
            to = ?mail.to,
            "no SMTP host; mail not delivered:\n{}",
            mail.body
        );
        Ok(())
    }
}

/// Keeps every mail in memory instead of delivering it.
#[derive(Default)]
pub struct Outbox {
    sent: Mutex<Vec<Mail>>,
}

impl Outbox {
    pub fn sent(&self) -> Vec<Mail> {
        self.sent.lock().map(|sent| sent.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl Mailer for Outbox {
    async fn send(&self, mail: Mail) -> anyhow::Result<()> {
        self.sent
            .lock()
            .map_err(|_| anyhow!("outbox lock poisoned"))?
            .push(mail);
        Ok(())
    }
}
