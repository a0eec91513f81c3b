//! [`Gateway`]s to third-party HTTP APIs.

pub mod nts;
#[cfg(test)]
pub mod stub;
pub mod toss;

use std::time::Duration;

use derive_more::{Display, Error as StdError, From};
use serde_json::Value as Json;
use tracerr::Traced;
use tracing as log;

#[cfg(test)]
pub use self::stub::Stub;

/// Operation of a third-party API.
pub use common::Handler as Gateway;

/// [`Http`] gateways configuration.
#[derive(Clone, Debug)]
pub struct Config {
    /// Timeout of a single request to a third-party API.
    pub timeout: Duration,

    /// [`toss`] payments API configuration.
    pub toss: toss::Config,

    /// [`nts`] business registry API configuration.
    pub nts: nts::Config,
}

/// [`Gateway`] talking to third-party APIs over HTTP.
#[derive(Clone, Debug)]
pub struct Http {
    /// HTTP client to perform requests with.
    client: reqwest::Client,

    /// [`toss`] payments API configuration.
    toss: toss::Config,

    /// [`nts`] business registry API configuration.
    nts: nts::Config,
}

impl Http {
    /// Creates a new [`Http`] gateway with the provided [`Config`].
    ///
    /// # Errors
    ///
    /// If failed to build the underlying HTTP client.
    pub fn new(config: Config) -> Result<Self, Traced<Error>> {
        let Config { timeout, toss, nts } = config;
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(tracerr::from_and_wrap!(=> Error))?;
        Ok(Self { client, toss, nts })
    }
}

/// [`Gateway`] error.
#[derive(Debug, Display, From, StdError)]
pub enum Error {
    /// Request to a third-party API failed to be performed.
    #[display("Request failed: {_0}")]
    Request(reqwest::Error),

    /// Third-party API responded with a non-success HTTP status.
    #[display("Rejected with `{status}` status: {payload}")]
    #[from(ignore)]
    Rejected {
        /// HTTP status of the response.
        status: u16,

        /// Body of the response.
        payload: Json,
    },

    /// Third-party API responded with an unexpected body.
    #[display("Unexpected response: {_0}")]
    #[from(ignore)]
    Malformed(#[error(not(source))] Json),
}

impl Error {
    /// Returns the upstream payload of this [`Error`], if any.
    #[must_use]
    pub fn payload(&self) -> Option<&Json> {
        match self {
            Self::Request(_) => None,
            Self::Rejected { payload, .. } | Self::Malformed(payload) => {
                Some(payload)
            }
        }
    }
}

/// Reads the JSON body of the provided [`reqwest::Response`], failing with
/// [`Error::Rejected`] on a non-success HTTP status.
async fn read_json(response: reqwest::Response) -> Result<Json, Traced<Error>> {
    let status = response.status();
    log::debug!("`{}` responded with `{status}`", response.url());

    let body = response
        .text()
        .await
        .map_err(tracerr::from_and_wrap!(=> Error))?;
    let payload = serde_json::from_str(&body).unwrap_or(Json::String(body));

    if !status.is_success() {
        log::warn!("upstream rejected request with `{status}`: {payload}");
        return Err(tracerr::new!(Error::Rejected {
            status: status.as_u16(),
            payload,
        }));
    }
    Ok(payload)
}
