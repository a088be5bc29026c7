use clap::{Arg, ArgMatches, Command};
use secrecy::SecretString;

pub const ARG_SIGNING_KEY: &str = "signing-key";
pub const ARG_BASE_URL: &str = "base-url";

#[derive(Debug)]
pub struct Options {
    pub signing_key: SecretString,
    pub base_url: String,
}

impl Options {
    /// Parse token arguments from matches.
    ///
    /// # Errors
    /// Returns an error if the signing key is missing or empty.
    pub fn parse(matches: &ArgMatches) -> anyhow::Result<Self> {
        let signing_key = matches.get_one::<String>(ARG_SIGNING_KEY).cloned();
        let signing_key = match signing_key {
            Some(value) if !value.trim().is_empty() => SecretString::from(value),
            _ => anyhow::bail!("missing required argument: --{ARG_SIGNING_KEY}"),
        };

        let base_url = matches
            .get_one::<String>(ARG_BASE_URL)
            .cloned()
            .unwrap_or_else(|| "https://rideaware.app".to_string());

        Ok(Self {
            signing_key,
            base_url,
        })
    }
}

#[must_use]
pub fn with_args(command: Command) -> Command {
    command
        .arg(
            Arg::new(ARG_SIGNING_KEY)
                .long(ARG_SIGNING_KEY)
                .help("HMAC key used to sign and verify bearer tokens")
                .long_help(
                    "HMAC key used to sign and verify bearer tokens.\n\nEvery token issued by this service is signed with this key, so rotating it\ninvalidates all outstanding access and refresh tokens at once.",
                )
                .env("RIDEAWARE_SIGNING_KEY")
                .required(true),
        )
        .arg(
            Arg::new(ARG_BASE_URL)
                .long(ARG_BASE_URL)
                .help("Public base URL used for password reset links and the CORS allow-origin")
                .env("RIDEAWARE_BASE_URL")
                .default_value("https://rideaware.app"),
        )
}
