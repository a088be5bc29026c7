use crate::{
    api,
    auth::TokenCodec,
    email::{
        EmailSender, LogEmailSender,
        smtp::{SmtpConfig, SmtpEmailSender},
    },
};
use anyhow::{Context, Result};
use secrecy::SecretString;
use std::sync::Arc;
use tracing::info;
use url::Url;

#[derive(Debug)]
pub struct Args {
    pub port: u16,
    pub dsn: String,
    pub signing_key: SecretString,
    pub base_url: String,
    pub smtp: Option<SmtpConfig>,
}

/// Execute the server action.
/// # Errors
/// Returns an error if the configuration is invalid or the server fails to start.
pub async fn execute(args: Args) -> Result<()> {
    let codec =
        TokenCodec::new(args.signing_key).context("Invalid token signing configuration")?;

    let base_url = Url::parse(&args.base_url)
        .with_context(|| format!("Invalid base URL: {}", args.base_url))?;

    let mailer: Arc<dyn EmailSender> = match args.smtp {
        Some(config) => {
            Arc::new(SmtpEmailSender::new(&config).context("Failed to build SMTP transport")?)
        }
        None => {
            info!("No SMTP host configured, emails will be logged instead of sent");
            Arc::new(LogEmailSender)
        }
    };

    api::new(args.port, args.dsn, codec, mailer, base_url).await
}
