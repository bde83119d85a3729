use std::sync::Arc;

use api::TestPlatform;
use exam_core::model::{SessionId, TestId, TopicId};

use crate::error::ResolveError;

/// External collaborator answering whether the caller is authenticated.
///
/// Session-cookie issuance and route gating live outside this engine; only
/// the boolean crosses in.
pub trait AuthProbe: Send + Sync {
    fn is_authenticated(&self) -> bool;
}

/// Fixed authentication state, for wiring and tests.
#[derive(Debug, Clone, Copy)]
pub struct StaticAuth(pub bool);

impl AuthProbe for StaticAuth {
    fn is_authenticated(&self) -> bool {
        self.0
    }
}

/// Reference to the session a controller should adopt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionRef {
    pub session_id: SessionId,
    pub test_id: TestId,
}

/// Finds or creates the one session a user should resume or start for a
/// topic.
pub struct SessionResolver {
    platform: Arc<dyn TestPlatform>,
    auth: Arc<dyn AuthProbe>,
}

impl SessionResolver {
    #[must_use]
    pub fn new(platform: Arc<dyn TestPlatform>, auth: Arc<dyn AuthProbe>) -> Self {
        Self { platform, auth }
    }

    /// Resolve a topic to a session reference.
    ///
    /// Takes the first test in the platform's own listing order (the remote
    /// ordering is authoritative, nothing is re-sorted) and requests a
    /// session for it. The platform enforces at-most-one-active-session per
    /// (user, test); this layer does not deduplicate. One attempt per call,
    /// no retry.
    ///
    /// # Errors
    ///
    /// `ResolveError::Unauthenticated` before any remote call when the auth
    /// probe says no; `ResolveError::NoTestAvailable` when the topic has no
    /// tests; `ResolveError::SessionCreationFailed` for any listing or
    /// creation failure.
    pub async fn resolve(&self, topic: &TopicId) -> Result<SessionRef, ResolveError> {
        if !self.auth.is_authenticated() {
            return Err(ResolveError::Unauthenticated);
        }

        let tests = self
            .platform
            .list_tests(topic)
            .await
            .map_err(ResolveError::SessionCreationFailed)?;
        let Some(first) = tests.first() else {
            return Err(ResolveError::NoTestAvailable);
        };

        let session = self
            .platform
            .create_session(&first.id)
            .await
            .map_err(ResolveError::SessionCreationFailed)?;
        tracing::info!(
            topic = %topic,
            test = %first.id,
            session = %session.id(),
            "session resolved"
        );

        Ok(SessionRef {
            session_id: session.id().clone(),
            test_id: session.test_id().clone(),
        })
    }
}
