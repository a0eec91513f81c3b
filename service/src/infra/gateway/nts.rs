//! Business registry API of the National Tax Service (NTS) of Korea.

use common::operations::{By, Select};
use secrecy::{ExposeSecret as _, SecretString};
use serde::Deserialize;
use serde_json::{json, Value as Json};
use tracerr::Traced;

use crate::domain::seller::BusinessNumber;

use super::{read_json, Error, Gateway, Http};

/// NTS business registry API configuration.
#[derive(Clone, Debug)]
pub struct Config {
    /// URL of the business status endpoint.
    pub url: String,

    /// Service key issued by the public data portal.
    pub service_key: SecretString,
}

/// Registration status of a business, as reported by the API.
#[derive(Clone, Debug)]
pub struct Status {
    /// Status code (`b_stt_cd`), if the business is known to the registry.
    pub code: Option<String>,

    /// Raw response of the API.
    pub payload: Json,
}

impl Status {
    /// Status code of a business running its activity.
    pub const ACTIVE: &'static str = "01";

    /// Parses a [`Status`] out of the provided API response.
    ///
    /// # Errors
    ///
    /// With [`Error::Malformed`] if the response has no `data` entries.
    pub fn parse(payload: Json) -> Result<Self, Error> {
        /// Fields of the response this [`Status`] is interested in.
        #[derive(Deserialize)]
        struct Body {
            /// Statuses of the requested businesses.
            data: Vec<Entry>,
        }

        /// Status of a single business.
        #[derive(Deserialize)]
        struct Entry {
            /// Status code, empty if the business is unknown.
            #[serde(default)]
            b_stt_cd: Option<String>,
        }

        let code = match Body::deserialize(&payload) {
            Ok(Body { data }) if !data.is_empty() => {
                data.into_iter().next().and_then(|e| e.b_stt_cd)
            }
            Ok(_) | Err(_) => return Err(Error::Malformed(payload)),
        };
        Ok(Self {
            code: code.filter(|c| !c.is_empty()),
            payload,
        })
    }

    /// Indicates whether the business is registered and active.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.code.as_deref() == Some(Self::ACTIVE)
    }
}

impl Gateway<Select<By<Status, BusinessNumber>>> for Http {
    type Ok = Status;
    type Err = Traced<Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Status, BusinessNumber>>,
    ) -> Result<Self::Ok, Self::Err> {
        let number = by.into_inner();

        let response = self
            .client
            .post(&self.nts.url)
            .query(&[("serviceKey", self.nts.service_key.expose_secret())])
            .json(&json!({ "b_no": [number.to_string()] }))
            .send()
            .await
            .map_err(tracerr::from_and_wrap!(=> Error))?;

        let payload = read_json(response).await.map_err(tracerr::wrap!())?;
        Status::parse(payload).map_err(tracerr::wrap!())
    }
}
