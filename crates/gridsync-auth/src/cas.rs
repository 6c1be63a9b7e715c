// SPDX-FileCopyrightText: 2026 Gridsync Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP client for the CAS ticket-granting endpoint.
//!
//! One call to [`AuthEndpoint::request_ticket`] is one POST. Retrying is the
//! caller's decision.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{ACCEPT, HeaderMap, HeaderValue};
use secrecy::{ExposeSecret, SecretString};
use tracing::debug;

use gridsync_core::{AuthEndpoint, GridsyncError};

/// Requests ticket-granting tickets with a username and password.
#[derive(Clone)]
pub struct CasTicketClient {
    client: reqwest::Client,
    url: String,
    username: String,
    password: SecretString,
}

impl CasTicketClient {
    /// Creates a client for the endpoint at `url`.
    pub fn new(
        url: impl Into<String>,
        username: impl Into<String>,
        password: SecretString,
        timeout: Duration,
    ) -> Result<Self, GridsyncError> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("text/plain"));

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()
            .map_err(|e| GridsyncError::Auth {
                message: format!("failed to build HTTP client: {e}"),
                source: Some(Box::new(e)),
            })?;

        Ok(Self {
            client,
            url: url.into(),
            username: username.into(),
            password,
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

impl std::fmt::Debug for CasTicketClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CasTicketClient")
            .field("url", &self.url)
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

#[async_trait]
impl AuthEndpoint for CasTicketClient {
    async fn request_ticket(&self) -> Result<String, GridsyncError> {
        let form = [
            ("username", self.username.as_str()),
            ("password", self.password.expose_secret()),
        ];

        let response = self
            .client
            .post(&self.url)
            .form(&form)
            .send()
            .await
            .map_err(|e| GridsyncError::Auth {
                message: format!("ticket request failed: {e}"),
                source: Some(Box::new(e)),
            })?;

        let status = response.status();
        debug!(status = %status, "ticket response received");

        let body = response.text().await.map_err(|e| GridsyncError::Auth {
            message: format!("failed to read ticket response: {e}"),
            source: Some(Box::new(e)),
        })?;

        if !matches!(status.as_u16(), 200 | 201) {
            return Err(GridsyncError::Auth {
                message: format!("ticket endpoint returned {status}: {}", body.trim()),
                source: None,
            });
        }

        let ticket = body.trim();
        if ticket.is_empty() {
            return Err(GridsyncError::Auth {
                message: format!("ticket endpoint returned {status} with an empty body"),
                source: None,
            });
        }

        Ok(ticket.to_string())
    }
}
