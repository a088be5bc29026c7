//! SMTP delivery via lettre.

use crate::email::{
    EmailSender, RESET_SUBJECT, WELCOME_SUBJECT, reset_email_html, welcome_email_html,
};
use anyhow::{Context, Result};
use lettre::{
    Message, SmtpTransport, Transport,
    message::header::ContentType,
    transport::smtp::{
        PoolConfig,
        authentication::Credentials,
        client::{Tls, TlsParameters},
    },
};
use secrecy::{ExposeSecret, SecretString};
use std::time::Duration;

#[derive(Clone, Debug)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    /// Empty means the relay accepts unauthenticated mail.
    pub username: String,
    pub password: SecretString,
    /// Address used in the From header.
    pub sender: String,
}

pub struct SmtpEmailSender {
    transport: SmtpTransport,
    sender: String,
}

impl SmtpEmailSender {
    /// Build a pooled transport for the configured relay. No connection is
    /// opened until the first send.
    ///
    /// # Errors
    ///
    /// Fails when the relay host or TLS parameters are unusable.
    pub fn new(config: &SmtpConfig) -> Result<Self> {
        let tls = TlsParameters::builder(config.host.clone())
            .build()
            .context("Failed to build TLS parameters")?;

        let mut builder = SmtpTransport::relay(&config.host)
            .context("Failed to create SMTP transport")?
            .port(config.port)
            .tls(Tls::Required(tls))
            .pool_config(PoolConfig::new().max_size(1))
            .timeout(Some(Duration::from_secs(10)));

        if !config.username.is_empty() {
            builder = builder.credentials(Credentials::new(
                config.username.clone(),
                config.password.expose_secret().to_string(),
            ));
        }

        Ok(Self {
            transport: builder.build(),
            sender: config.sender.clone(),
        })
    }

    fn send(&self, to_email: &str, subject: &str, html_body: &str) -> Result<()> {
        let message = Message::builder()
            .from(
                format!("RideAware <{}>", self.sender)
                    .parse()
                    .context("Invalid sender address")?,
            )
            .to(to_email.parse().context("Invalid recipient address")?)
            .subject(subject)
            .header(ContentType::TEXT_HTML)
            .body(html_body.to_string())
            .context("Failed to build email message")?;

        self.transport
            .send(&message)
            .context("Failed to send email")?;

        Ok(())
    }
}

impl EmailSender for SmtpEmailSender {
    fn send_welcome_email(&self, to_email: &str, display_name: &str) -> Result<()> {
        self.send(to_email, WELCOME_SUBJECT, &welcome_email_html(display_name))
    }

    fn send_password_reset_email(
        &self,
        to_email: &str,
        display_name: &str,
        reset_link: &str,
    ) -> Result<()> {
        self.send(
            to_email,
            RESET_SUBJECT,
            &reset_email_html(display_name, reset_link),
        )
    }
}
