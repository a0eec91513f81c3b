//! [`Config`]-related definitions.

use std::time;

use config::{builder::DefaultState, ConfigBuilder, ConfigError};
use secrecy::SecretString;
use serde::Deserialize;
use service::{
    command::place_order,
    domain::pricing,
    infra::{gateway, gateway::nts, gateway::toss},
};
use smart_default::SmartDefault;

/// Application configuration.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Server configuration.
    pub server: Server,

    /// Service configuration.
    pub service: Service,

    /// Pricing policy of bookings.
    pub pricing: pricing::Policy,

    /// Booking rules configuration.
    pub booking: Booking,

    /// Toss Payments API configuration.
    pub toss: Toss,

    /// NTS business registry API configuration.
    pub nts: Nts,

    /// Third-party APIs client configuration.
    pub gateway: Gateway,

    /// Postgres configuration.
    pub postgres: Postgres,

    /// Log configuration.
    pub log: Log,
}

impl Config {
    /// Creates a new [`Config`] by:
    /// - loading it from the provided `path` (if any);
    /// - merging it with the environment variables (if any);
    /// - using default values for missing fields.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn new(path: impl AsRef<str>) -> Result<Self, ConfigError> {
        ConfigBuilder::<DefaultState>::default()
            .add_source(config::File::with_name(path.as_ref()).required(false))
            .add_source(config::Environment::with_prefix("CONF").separator("."))
            .build()?
            .try_deserialize()
    }

    /// Builds the [`service::Config`] out of the provided sections.
    #[must_use]
    pub fn service(
        service: Service,
        pricing: pricing::Policy,
        booking: Booking,
    ) -> service::Config {
        let Booking {
            strict_capacity,
            max_attempts,
        } = booking;
        let secret = service.jwt_secret.as_bytes();
        service::Config {
            jwt_encoding_key: jsonwebtoken::EncodingKey::from_secret(secret),
            jwt_decoding_key: jsonwebtoken::DecodingKey::from_secret(secret),
            pricing,
            place_order: place_order::Config { strict_capacity },
            max_attempts,
        }
    }
}

/// Server configuration.
#[derive(Clone, Debug, Deserialize, SmartDefault)]
#[serde(default)]
pub struct Server {
    /// Host to bind the server to.
    #[default("0.0.0.0".to_owned())]
    pub host: String,

    /// Port to bind the server to.
    #[default(8080)]
    pub port: u16,

    /// [CORS] configuration.
    ///
    /// [CORS]: https://developer.mozilla.org/en-US/docs/Web/HTTP/CORS
    pub cors: Cors,
}

/// [CORS] configuration.
///
/// [CORS]: https://developer.mozilla.org/en-US/docs/Web/HTTP/CORS
#[derive(Clone, Debug, Deserialize, SmartDefault)]
#[serde(default)]
pub struct Cors {
    /// List of allowed origins.
    #[default(vec!["*".to_owned()])]
    pub origins: Vec<String>,
}

/// Service configuration.
#[derive(Clone, Debug, Deserialize, SmartDefault)]
#[serde(default)]
pub struct Service {
    /// [JWT] secret.
    ///
    /// [JWT]: https://wikipedia.org/wiki/JSON_Web_Token
    #[default("secret".to_owned())]
    pub jwt_secret: String,
}

/// Booking rules configuration.
#[derive(Clone, Copy, Debug, Deserialize, SmartDefault)]
#[serde(default)]
pub struct Booking {
    /// Indicator whether booked units must fit into the remaining capacity
    /// of a date.
    pub strict_capacity: bool,

    /// Maximum number of attempts to execute an operation touching deposits
    /// or capacities in presence of concurrent modifications.
    #[default(3)]
    pub max_attempts: u8,
}

/// [Toss Payments] API configuration.
///
/// [Toss Payments]: https://docs.tosspayments.com/reference
#[derive(Clone, Debug, Deserialize, SmartDefault)]
#[serde(default)]
pub struct Toss {
    /// Base URL of the API.
    #[default("https://api.tosspayments.com".to_owned())]
    pub url: String,

    /// Secret key of the merchant.
    pub secret_key: String,
}

/// NTS business registry API configuration.
#[derive(Clone, Debug, Deserialize, SmartDefault)]
#[serde(default)]
pub struct Nts {
    /// URL of the business status endpoint.
    #[default(
        "https://api.odcloud.kr/api/nts-businessman/v1/status".to_owned()
    )]
    pub url: String,

    /// Service key issued by the public data portal.
    pub service_key: String,
}

/// Third-party APIs client configuration.
#[derive(Clone, Copy, Debug, Deserialize, SmartDefault)]
#[serde(default)]
pub struct Gateway {
    /// Timeout of a single request.
    #[default(time::Duration::from_secs(10))]
    #[serde(with = "humantime_serde")]
    pub timeout: time::Duration,
}

impl Gateway {
    /// Builds the [`gateway::Config`] out of this [`Gateway`] and the APIs
    /// configurations.
    #[must_use]
    pub fn with(self, toss: Toss, nts: Nts) -> gateway::Config {
        gateway::Config {
            timeout: self.timeout,
            toss: toss::Config {
                url: toss.url,
                secret_key: SecretString::from(toss.secret_key),
            },
            nts: nts::Config {
                url: nts.url,
                service_key: SecretString::from(nts.service_key),
            },
        }
    }
}

/// Postgres configuration.
#[derive(Clone, Debug, Deserialize, SmartDefault)]
#[serde(default)]
pub struct Postgres {
    /// Host to connect to.
    #[default("127.0.0.1".to_owned())]
    pub host: String,

    /// Port to connect to.
    #[default(5432)]
    pub port: u16,

    /// User to connect as.
    #[default("postgres".to_owned())]
    pub user: String,

    /// Password to connect with.
    #[default("postgres".to_owned())]
    pub password: String,

    /// Database name to connect to.
    #[default("postgres".to_owned())]
    pub dbname: String,
}

impl From<Postgres> for service::infra::postgres::Config {
    fn from(value: Postgres) -> Self {
        let Postgres {
            host,
            port,
            user,
            password,
            dbname,
        } = value;

        Self {
            host: Some(host),
            port: Some(port),
            user: Some(user),
            password: Some(password),
            dbname: Some(dbname),
            ..Self::default()
        }
    }
}

/// Log configuration.
#[derive(Clone, Copy, Debug, Default, Deserialize)]
#[serde(default)]
pub struct Log {
    /// Log level.
    pub level: LogLevel,
}

/// Log level.
#[derive(Clone, Copy, Debug, Default, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LogLevel {
    /// Designates very low priority, often extremely verbose, information.
    Trace,

    /// Designates lower priority information.
    Debug,

    /// Designates useful information.
    #[default]
    Info,

    /// Designates hazardous situations.
    Warn,

    /// Designates very serious errors.
    Error,
}

impl From<LogLevel> for tracing::Level {
    fn from(value: LogLevel) -> Self {
        match value {
            LogLevel::Trace => Self::TRACE,
            LogLevel::Debug => Self::DEBUG,
            LogLevel::Info => Self::INFO,
            LogLevel::Warn => Self::WARN,
            LogLevel::Error => Self::ERROR,
        }
    }
}

#[cfg(test)]
mod spec {
    use common::Money;
    use config::{builder::DefaultState, ConfigBuilder, FileFormat};
    use service::domain::pricing::SurchargeDays;

    use super::Config;

    #[test]
    fn defaults_without_sources() {
        let config = Config::new("non-existent.toml").unwrap();

        assert_eq!(config.server.port, 8080);
        assert_eq!(config.pricing.surcharge.amount, Money::new(600));
        assert_eq!(config.pricing.surcharge.days, SurchargeDays::Sunday);
        assert!(!config.booking.strict_capacity);
        assert_eq!(config.booking.max_attempts, 3);
        assert_eq!(config.gateway.timeout.as_secs(), 10);
        assert_eq!(config.toss.url, "https://api.tosspayments.com");
    }

    #[test]
    fn defaults_missing_sections() {
        let config = ConfigBuilder::<DefaultState>::default()
            .add_source(config::File::from_str(
                "[server]\nport = 9000\n",
                FileFormat::Toml,
            ))
            .build()
            .unwrap()
            .try_deserialize::<Config>()
            .unwrap();

        assert_eq!(config.server.port, 9000);
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.booking.max_attempts, 3);
        assert_eq!(config.pricing.surcharge.amount, Money::new(600));
        assert_eq!(config.postgres.port, 5432);
    }
}
