use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use foodbot::{
    Error, Result,
    models::Session,
    repository::{InMemoryStore, SessionRepository},
};

/// Session repository over the shared in-memory store whose next saves can
/// be made to fail, as a dropped database connection would.
pub struct FlakySessions {
    inner: Arc<InMemoryStore>,
    failing_saves: AtomicUsize,
}

impl FlakySessions {
    pub fn new(inner: Arc<InMemoryStore>) -> Self {
        Self {
            inner,
            failing_saves: AtomicUsize::new(0),
        }
    }

    /// Makes the next `count` saves fail without touching the store.
    pub fn fail_next_saves(&self, count: usize) {
        self.failing_saves.store(count, Ordering::SeqCst);
    }

    fn take_failure(&self) -> bool {
        self.failing_saves
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
    }
}

#[async_trait]
impl SessionRepository for FlakySessions {
    async fn find(&self, identifier: &str) -> Result<Option<Session>> {
        self.inner.find(identifier).await
    }

    async fn create(&self, session: Session) -> Result<Session> {
        self.inner.create(session).await
    }

    async fn save(&self, session: &Session) -> Result<Session> {
        if self.take_failure() {
            return Err(Error::Internal(format!(
                "Connection lost while saving session {}",
                session.identifier
            )));
        }
        self.inner.save(session).await
    }

    async fn delete_idle(&self, cutoff: DateTime<Utc>) -> Result<u64> {
        self.inner.delete_idle(cutoff).await
    }
}
