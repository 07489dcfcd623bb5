use async_trait::async_trait;
use time::OffsetDateTime;
use tokio::sync::RwLock;
use tracing::debug;

use super::repo_types::{NewUser, UserRecord};

#[async_trait]
pub trait UserStore: Send + Sync {
    /// Appends a user, stamping `joined_at`, and returns the stored record.
    async fn insert(&self, user: NewUser) -> UserRecord;
    /// All records in insertion order.
    async fn list(&self) -> Vec<UserRecord>;
    async fn len(&self) -> usize;

    async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

/// Append-only in-memory store living as long as the process.
#[derive(Debug)]
pub struct MemoryUserStore {
    records: RwLock<Vec<UserRecord>>,
    clock: fn() -> OffsetDateTime,
}

impl MemoryUserStore {
    pub fn new() -> Self {
        Self::with_clock(OffsetDateTime::now_utc)
    }

    pub fn with_clock(clock: fn() -> OffsetDateTime) -> Self {
        Self {
            records: RwLock::new(Vec::new()),
            clock,
        }
    }
}

impl Default for MemoryUserStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn insert(&self, user: NewUser) -> UserRecord {
        let mut records = self.records.write().await;
        // joined_at must never go backwards along the sequence, even if the wall clock does
        let now = (self.clock)();
        let joined_at = match records.last() {
            Some(prev) if prev.joined_at > now => prev.joined_at,
            _ => now,
        };
        let record = UserRecord {
            username: user.username,
            email: user.email,
            full_name: user.full_name,
            password_digest: user.password_digest,
            joined_at,
        };
        records.push(record.clone());
        debug!(count = records.len(), "user record appended");
        record
    }

    async fn list(&self) -> Vec<UserRecord> {
        self.records.read().await.clone()
    }

    async fn len(&self) -> usize {
        self.records.read().await.len()
    }
}

#[cfg(test)]
mod repo_tests {
    use super::*;
    use std::sync::{
        atomic::{AtomicI64, Ordering},
        Arc,
    };
    use time::{macros::datetime, Duration};

    fn new_user(name: &str) -> NewUser {
        NewUser {
            username: name.into(),
            email: format!("{}@example.com", name),
            full_name: None,
            password_digest: format!("hashed_{}", name),
        }
    }

    #[tokio::test]
    async fn appends_in_order() {
        let store = MemoryUserStore::new();
        assert!(store.is_empty().await);

        for name in ["ann", "bob", "cid"] {
            store.insert(new_user(name)).await;
        }

        let names: Vec<_> = store.list().await.into_iter().map(|r| r.username).collect();
        assert_eq!(names, vec!["ann", "bob", "cid"]);
        assert_eq!(store.len().await, 3);
    }

    static TICKS: AtomicI64 = AtomicI64::new(0);

    fn backwards_clock() -> OffsetDateTime {
        let n = TICKS.fetch_add(1, Ordering::SeqCst);
        datetime!(2024-01-01 12:00 UTC) - Duration::seconds(n)
    }

    #[tokio::test]
    async fn joined_at_never_decreases_when_clock_steps_back() {
        let store = MemoryUserStore::with_clock(backwards_clock);
        let first = store.insert(new_user("ann")).await;
        let second = store.insert(new_user("bob")).await;
        let third = store.insert(new_user("cid")).await;

        assert_eq!(first.joined_at, datetime!(2024-01-01 12:00 UTC));
        assert_eq!(second.joined_at, first.joined_at);
        assert_eq!(third.joined_at, first.joined_at);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_inserts_keep_timestamps_ordered() {
        let store = Arc::new(MemoryUserStore::new());
        let mut tasks = Vec::new();
        for i in 0..32 {
            let store = store.clone();
            tasks.push(tokio::spawn(async move {
                store.insert(new_user(&format!("user{}", i))).await
            }));
        }
        for t in tasks {
            t.await.unwrap();
        }

        let records = store.list().await;
        assert_eq!(records.len(), 32);
        assert!(records.windows(2).all(|w| w[0].joined_at <= w[1].joined_at));
    }
}
