use crate::email::smtp::SmtpConfig;
use clap::{Arg, ArgMatches, Command};
use secrecy::SecretString;

pub const ARG_SMTP_HOST: &str = "smtp-host";
pub const ARG_SMTP_PORT: &str = "smtp-port";
pub const ARG_SMTP_USERNAME: &str = "smtp-username";
pub const ARG_SMTP_PASSWORD: &str = "smtp-password";
pub const ARG_SMTP_SENDER: &str = "smtp-sender";

pub struct Options;

impl Options {
    /// Parse SMTP arguments from matches.
    ///
    /// Returns `None` when no host is configured, which selects the
    /// log-only email sender.
    ///
    /// # Errors
    /// Returns an error if a host is set without a sender address.
    pub fn parse(matches: &ArgMatches) -> anyhow::Result<Option<SmtpConfig>> {
        let get_non_empty = |id: &str| {
            matches
                .get_one::<String>(id)
                .cloned()
                .filter(|v| !v.trim().is_empty())
        };

        let Some(host) = get_non_empty(ARG_SMTP_HOST) else {
            return Ok(None);
        };

        let sender = match get_non_empty(ARG_SMTP_SENDER) {
            Some(value) => value,
            None => anyhow::bail!("missing required argument: --{ARG_SMTP_SENDER}"),
        };

        let port = matches
            .get_one::<u16>(ARG_SMTP_PORT)
            .copied()
            .unwrap_or(587);

        Ok(Some(SmtpConfig {
            host,
            port,
            username: get_non_empty(ARG_SMTP_USERNAME).unwrap_or_default(),
            password: SecretString::from(
                get_non_empty(ARG_SMTP_PASSWORD).unwrap_or_default(),
            ),
            sender,
        }))
    }
}

#[must_use]
pub fn with_args(command: Command) -> Command {
    command
        .arg(
            Arg::new(ARG_SMTP_HOST)
                .long(ARG_SMTP_HOST)
                .help("SMTP relay host, emails are logged instead of sent when unset")
                .env("RIDEAWARE_SMTP_HOST"),
        )
        .arg(
            Arg::new(ARG_SMTP_PORT)
                .long(ARG_SMTP_PORT)
                .help("SMTP relay port")
                .env("RIDEAWARE_SMTP_PORT")
                .default_value("587")
                .value_parser(clap::value_parser!(u16)),
        )
        .arg(
            Arg::new(ARG_SMTP_USERNAME)
                .long(ARG_SMTP_USERNAME)
                .help("SMTP username, leave unset for an unauthenticated relay")
                .env("RIDEAWARE_SMTP_USERNAME"),
        )
        .arg(
            Arg::new(ARG_SMTP_PASSWORD)
                .long(ARG_SMTP_PASSWORD)
                .help("SMTP password")
                .env("RIDEAWARE_SMTP_PASSWORD"),
        )
        .arg(
            Arg::new(ARG_SMTP_SENDER)
                .long(ARG_SMTP_SENDER)
                .help("Sender address for account and password reset emails")
                .env("RIDEAWARE_SMTP_SENDER"),
        )
}
