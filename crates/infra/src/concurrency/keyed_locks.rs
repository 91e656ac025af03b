use std::collections::HashMap;
use std::hash::Hash;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;

/// The wait for a key's lock exceeded the caller's deadline.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct LockWaitExpired;

/// Table of per-key mutexes.
///
/// Holders of different keys never contend; holders of the same key are
/// served one at a time (parking_lot mutexes are eventually fair, so a hot key
/// does not starve individual waiters). Slots are created on first use and
/// kept for the life of the table.
#[derive(Debug)]
pub struct KeyedLocks<K> {
    slots: Mutex<HashMap<K, Arc<Mutex<()>>>>,
}

impl<K> Default for KeyedLocks<K> {
    fn default() -> Self {
        Self {
            slots: Mutex::new(HashMap::new()),
        }
    }
}

impl<K> KeyedLocks<K>
where
    K: Eq + Hash + Copy,
{
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `f` while holding the lock for `key`.
    ///
    /// With `timeout == None` this waits indefinitely. With a timeout, an
    /// expired wait returns `LockWaitExpired` and `f` is never invoked.
    pub fn with_lock<T>(
        &self,
        key: K,
        timeout: Option<Duration>,
        f: impl FnOnce() -> T,
    ) -> Result<T, LockWaitExpired> {
        let slot = self.slot(key);

        let _guard = match timeout {
            Some(limit) => slot.try_lock_for(limit).ok_or(LockWaitExpired)?,
            None => slot.lock(),
        };

        Ok(f())
    }

    /// Whether some holder currently owns `key`.
    pub fn is_locked(&self, key: K) -> bool {
        self.slots
            .lock()
            .get(&key)
            .is_some_and(|slot| slot.is_locked())
    }

    /// Number of keys that have ever been locked.
    pub fn len(&self) -> usize {
        self.slots.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    // The table mutex is only held for the lookup, never while waiting on a slot.
    fn slot(&self, key: K) -> Arc<Mutex<()>> {
        self.slots.lock().entry(key).or_default().clone()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Barrier, mpsc};
    use std::thread;

    use super::*;

    #[test]
    fn same_key_holders_never_overlap() {
        let locks = Arc::new(KeyedLocks::<u64>::new());
        let inside = Arc::new(AtomicUsize::new(0));
        let max_seen = Arc::new(AtomicUsize::new(0));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let locks = locks.clone();
                let inside = inside.clone();
                let max_seen = max_seen.clone();
                thread::spawn(move || {
                    for _ in 0..50 {
                        locks
                            .with_lock(1, None, || {
                                let now = inside.fetch_add(1, Ordering::SeqCst) + 1;
                                max_seen.fetch_max(now, Ordering::SeqCst);
                                thread::yield_now();
                                inside.fetch_sub(1, Ordering::SeqCst);
                            })
                            .unwrap();
                    }
                })
            })
            .collect();

        for h in handles {
            h.join().unwrap();
        }
        assert_eq!(max_seen.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn different_keys_do_not_block_each_other() {
        let locks = Arc::new(KeyedLocks::<u64>::new());
        let (held_tx, held_rx) = mpsc::channel();
        let (release_tx, release_rx) = mpsc::channel::<()>();

        let holder = {
            let locks = locks.clone();
            thread::spawn(move || {
                locks
                    .with_lock(1, None, || {
                        held_tx.send(()).unwrap();
                        release_rx.recv().unwrap();
                    })
                    .unwrap();
            })
        };

        held_rx.recv().unwrap();
        assert!(locks.is_locked(1));

        // Key 2 is free even though key 1 is held.
        let got = locks.with_lock(2, Some(Duration::from_millis(50)), || 42);
        assert_eq!(got, Ok(42));

        release_tx.send(()).unwrap();
        holder.join().unwrap();
        assert!(!locks.is_locked(1));
    }

    #[test]
    fn expired_wait_does_not_run_the_closure() {
        let locks = Arc::new(KeyedLocks::<u64>::new());
        let barrier = Arc::new(Barrier::new(2));
        let (release_tx, release_rx) = mpsc::channel::<()>();

        let holder = {
            let locks = locks.clone();
            let barrier = barrier.clone();
            thread::spawn(move || {
                locks
                    .with_lock(7, None, || {
                        barrier.wait();
                        release_rx.recv().unwrap();
                    })
                    .unwrap();
            })
        };

        barrier.wait();
        let mut ran = false;
        let res = locks.with_lock(7, Some(Duration::from_millis(20)), || ran = true);
        assert_eq!(res, Err(LockWaitExpired));
        assert!(!ran);

        release_tx.send(()).unwrap();
        holder.join().unwrap();
        assert_eq!(locks.len(), 1);
    }
}
