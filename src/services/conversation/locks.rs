use std::sync::Arc;

use tokio::sync::{Mutex, OwnedMutexGuard};

/// Serializes work per customer identifier.
///
/// Inbound messages and payment settlements for the same customer run one
/// at a time; different customers never wait on each other. Entries are
/// dropped once nobody holds or waits on them.
#[derive(Default)]
pub struct SessionLocks {
    locks: scc::HashMap<String, Arc<Mutex<()>>>,
}

/// Held while a customer's session is being worked on.
pub struct SessionGuard {
    identifier: String,
    _guard: OwnedMutexGuard<()>,
}

impl SessionLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Waits for the identifier's lock.
    pub async fn acquire(&self, identifier: &str) -> SessionGuard {
        let lock = self
            .locks
            .entry_async(identifier.to_string())
            .await
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .get()
            .clone();

        SessionGuard {
            identifier: identifier.to_string(),
            _guard: lock.lock_owned().await,
        }
    }

    /// Releases the lock and forgets the entry if no one else wants it.
    pub async fn release(&self, guard: SessionGuard) {
        let SessionGuard { identifier, _guard } = guard;
        drop(_guard);
        // The map holds one reference; anyone waiting holds another
        self.locks
            .remove_if_async(&identifier, |lock| Arc::strong_count(lock) == 1)
            .await;
    }

    /// Number of identifiers with a live lock entry.
    pub fn len(&self) -> usize {
        self.locks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locks.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_same_identifier_is_serialized() {
        let locks = Arc::new(SessionLocks::new());
        let first = locks.acquire("2348000000001").await;

        let contender = {
            let locks = locks.clone();
            tokio::spawn(async move {
                let guard = locks.acquire("2348000000001").await;
                locks.release(guard).await;
            })
        };

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!contender.is_finished());

        locks.release(first).await;
        tokio::time::timeout(Duration::from_secs(1), contender)
            .await
            .expect("contender should finish once released")
            .unwrap();
        assert!(locks.is_empty());
    }

    #[tokio::test]
    async fn test_different_identifiers_do_not_block() {
        let locks = SessionLocks::new();
        let a = locks.acquire("a").await;
        let b = tokio::time::timeout(Duration::from_millis(100), locks.acquire("b"))
            .await
            .expect("other identifier must not wait");
        assert_eq!(locks.len(), 2);

        locks.release(a).await;
        locks.release(b).await;
        assert!(locks.is_empty());
    }
}
