// SPDX-FileCopyrightText: 2026 Gridsync Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock authentication endpoint for deterministic testing.
//!
//! `MockAuthEndpoint` implements `AuthEndpoint` with scripted outcomes,
//! so credential lifecycle tests never touch the network.

use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use tokio::sync::Mutex;

use gridsync_core::{AuthEndpoint, GridsyncError};

/// A scripted outcome for one ticket request.
#[derive(Debug, Clone)]
enum Scripted {
    Ticket(String),
    Failure(String),
}

/// A mock auth endpoint that returns pre-configured outcomes.
///
/// Outcomes are popped from a FIFO queue. When the queue is empty, a fresh
/// ticket `TGT-mock-<n>` is issued, where `n` is the 1-based call number.
#[derive(Debug, Clone, Default)]
pub struct MockAuthEndpoint {
    script: Arc<Mutex<VecDeque<Scripted>>>,
    calls: Arc<AtomicUsize>,
}

impl MockAuthEndpoint {
    pub fn new() -> Self {
        Self::default()
    }

    /// Endpoint pre-loaded with tickets to hand out in order.
    pub fn with_tickets<I, S>(tickets: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let script = tickets
            .into_iter()
            .map(|t| Scripted::Ticket(t.into()))
            .collect();
        Self {
            script: Arc::new(Mutex::new(script)),
            calls: Arc::default(),
        }
    }

    /// Queue a successful ticket.
    pub async fn push_ticket(&self, ticket: impl Into<String>) {
        self.script.lock().await.push_back(Scripted::Ticket(ticket.into()));
    }

    /// Queue an authentication failure.
    pub async fn push_failure(&self, message: impl Into<String>) {
        self.script
            .lock()
            .await
            .push_back(Scripted::Failure(message.into()));
    }

    /// Number of ticket requests made so far.
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AuthEndpoint for MockAuthEndpoint {
    async fn request_ticket(&self) -> Result<String, GridsyncError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        match self.script.lock().await.pop_front() {
            Some(Scripted::Ticket(ticket)) => Ok(ticket),
            Some(Scripted::Failure(message)) => Err(GridsyncError::Auth {
                message,
                source: None,
            }),
            None => Ok(format!("TGT-mock-{call}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn scripted_outcomes_then_default_tickets() {
        let endpoint = MockAuthEndpoint::with_tickets(["TGT-first"]);
        endpoint.push_failure("bad password").await;

        assert_eq!(endpoint.request_ticket().await.unwrap(), "TGT-first");
        assert!(matches!(
            endpoint.request_ticket().await,
            Err(GridsyncError::Auth { .. })
        ));
        assert_eq!(endpoint.request_ticket().await.unwrap(), "TGT-mock-3");
        assert_eq!(endpoint.call_count(), 3);
    }
}
