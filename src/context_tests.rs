// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Unit tests for the per-intent lock map.
//!
//! Building a full `Context` needs a Kubernetes client, so these tests
//! exercise the lock-map behavior through a standalone map with the same
//! shape as the one `Context` holds.

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};

    type LockMap = Arc<Mutex<HashMap<String, Arc<tokio::sync::Mutex<()>>>>>;

    fn lock_for(locks: &LockMap, namespace: &str, name: &str) -> Arc<tokio::sync::Mutex<()>> {
        let key = format!("{namespace}/{name}");
        let mut locks = locks.lock().unwrap();
        locks.entry(key).or_default().clone()
    }

    #[test]
    fn test_same_intent_shares_one_lock() {
        let locks: LockMap = Arc::default();
        let first = lock_for(&locks, "default", "slice-embb-001");
        let second = lock_for(&locks, "default", "slice-embb-001");
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn test_different_intents_get_distinct_locks() {
        let locks: LockMap = Arc::default();
        let a = lock_for(&locks, "default", "slice-a");
        let b = lock_for(&locks, "default", "slice-b");
        let c = lock_for(&locks, "other", "slice-a");
        assert!(!Arc::ptr_eq(&a, &b));
        assert!(!Arc::ptr_eq(&a, &c));
    }

    /// S6: with the lock held by one worker, the second worker waits rather
    /// than reconciling concurrently.
    #[tokio::test]
    async fn test_lock_serializes_same_intent() {
        let locks: LockMap = Arc::default();
        let lock = lock_for(&locks, "default", "slice-embb-001");

        let guard = lock.lock().await;
        let contender = lock_for(&locks, "default", "slice-embb-001");
        assert!(contender.try_lock().is_err(), "second worker must wait");
        drop(guard);
        assert!(contender.try_lock().is_ok());
    }
}
