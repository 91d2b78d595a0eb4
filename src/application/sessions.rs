//! Admin session verification.
//!
//! The admin surface that creates sessions lives outside this service; only
//! verification happens here, to honor the session leg of the invalidation
//! endpoint's OR-authorization. Tokens are stored as SHA-256 digests, so a
//! leaked sessions table does not yield usable tokens.

use std::sync::Arc;

use sha2::{Digest, Sha256};
use time::OffsetDateTime;

use crate::application::repos::{RepoError, SessionsRepo};

pub struct SessionService {
    repo: Arc<dyn SessionsRepo>,
}

impl SessionService {
    pub fn new(repo: Arc<dyn SessionsRepo>) -> Self {
        Self { repo }
    }

    /// True when `token` matches an unexpired session record.
    pub async fn authenticate(&self, token: &str) -> Result<bool, RepoError> {
        if token.is_empty() {
            return Ok(false);
        }

        let digest = hex::encode(Sha256::digest(token.as_bytes()));
        match self.repo.find_session(&digest).await? {
            Some(session) => Ok(session.expires_at > OffsetDateTime::now_utc()),
            None => Ok(false),
        }
    }
}

/// Digest a raw session token the way the sessions table stores it.
pub fn digest_token(token: &str) -> String {
    hex::encode(Sha256::digest(token.as_bytes()))
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use time::Duration;

    use crate::domain::entities::SessionRecord;

    use super::*;

    struct StubSessions {
        sessions: Vec<SessionRecord>,
    }

    #[async_trait]
    impl SessionsRepo for StubSessions {
        async fn find_session(
            &self,
            token_digest: &str,
        ) -> Result<Option<SessionRecord>, RepoError> {
            Ok(self
                .sessions
                .iter()
                .find(|s| s.token_digest == token_digest)
                .cloned())
        }
    }

    fn service_with(sessions: Vec<SessionRecord>) -> SessionService {
        SessionService::new(Arc::new(StubSessions { sessions }))
    }

    #[tokio::test]
    async fn valid_unexpired_session_authenticates() {
        let service = service_with(vec![SessionRecord {
            token_digest: digest_token("sess-abc"),
            expires_at: OffsetDateTime::now_utc() + Duration::hours(1),
        }]);

        assert!(service.authenticate("sess-abc").await.expect("checked"));
    }

    #[tokio::test]
    async fn expired_session_is_rejected() {
        let service = service_with(vec![SessionRecord {
            token_digest: digest_token("sess-abc"),
            expires_at: OffsetDateTime::now_utc() - Duration::minutes(1),
        }]);

        assert!(!service.authenticate("sess-abc").await.expect("checked"));
    }

    #[tokio::test]
    async fn unknown_or_empty_token_is_rejected() {
        let service = service_with(Vec::new());

        assert!(!service.authenticate("sess-abc").await.expect("checked"));
        assert!(!service.authenticate("").await.expect("checked"));
    }
}
