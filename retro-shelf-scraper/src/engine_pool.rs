//! Fixed set of scrape engines with O(1) lease/return.

use std::ops::{Deref, DerefMut};
use std::sync::{Mutex, MutexGuard, PoisonError};

/// A fixed number of engines, each usable by one thread at a time.
///
/// Free engines are tracked as a stack of indices; leasing pops one and
/// dropping the [`EngineLease`] pushes it back.
pub struct EnginePool<E> {
    engines: Vec<Mutex<E>>,
    free: Mutex<Vec<usize>>,
}

impl<E> EnginePool<E> {
    pub fn new(engines: Vec<E>) -> Self {
        let count = engines.len();
        Self {
            engines: engines.into_iter().map(Mutex::new).collect(),
            // Reversed so index 0 is leased first.
            free: Mutex::new((0..count).rev().collect()),
        }
    }

    /// Lease a free engine without blocking. `None` when all are in use.
    pub fn allocate(&self) -> Option<EngineLease<'_, E>> {
        let index = self.free_list().pop()?;
        // The slot is ours alone now, so this lock never contends.
        let guard = self.engines[index]
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        log::trace!("Leased engine {}", index);
        Some(EngineLease {
            pool: self,
            index,
            guard: Some(guard),
        })
    }

    pub fn capacity(&self) -> usize {
        self.engines.len()
    }

    pub fn free_count(&self) -> usize {
        self.free_list().len()
    }

    fn free_list(&self) -> MutexGuard<'_, Vec<usize>> {
        self.free.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Exclusive access to one engine; returned to the pool on drop, including
/// during unwinding.
pub struct EngineLease<'a, E> {
    pool: &'a EnginePool<E>,
    index: usize,
    guard: Option<MutexGuard<'a, E>>,
}

impl<E> EngineLease<'_, E> {
    pub fn index(&self) -> usize {
        self.index
    }
}

impl<E> Deref for EngineLease<'_, E> {
    type Target = E;

    fn deref(&self) -> &E {
        // Only `drop` takes the guard.
        match self.guard {
            Some(ref guard) => guard,
            None => unreachable!("engine lease used after release"),
        }
    }
}

impl<E> DerefMut for EngineLease<'_, E> {
    fn deref_mut(&mut self) -> &mut E {
        match self.guard {
            Some(ref mut guard) => guard,
            None => unreachable!("engine lease used after release"),
        }
    }
}

impl<E> Drop for EngineLease<'_, E> {
    fn drop(&mut self) {
        // Unlock the engine before advertising it as free.
        self.guard.take();
        self.pool.free_list().push(self.index);
        log::trace!("Released engine {}", self.index);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn leases_until_exhausted() {
        let pool = EnginePool::new(vec![10, 20]);
        assert_eq!(pool.capacity(), 2);

        let a = pool.allocate().unwrap();
        let b = pool.allocate().unwrap();
        assert_eq!((a.index(), *a), (0, 10));
        assert_eq!((b.index(), *b), (1, 20));
        assert_eq!(pool.free_count(), 0);
        assert!(pool.allocate().is_none());

        drop(a);
        assert_eq!(pool.free_count(), 1);
        let c = pool.allocate().unwrap();
        assert_eq!(c.index(), 0);
    }

    #[test]
    fn mutation_through_lease_persists() {
        let pool = EnginePool::new(vec![String::new()]);
        pool.allocate().unwrap().push_str("used");
        assert_eq!(&*pool.allocate().unwrap(), "used");
    }

    #[test]
    fn released_on_panic() {
        let pool = EnginePool::new(vec![0u32]);
        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let mut lease = pool.allocate().unwrap();
            *lease += 1;
            panic!("engine blew up");
        }));
        assert!(result.is_err());
        assert_eq!(pool.free_count(), 1);
        // Poisoned slot is still usable.
        assert_eq!(*pool.allocate().unwrap(), 1);
    }

    #[test]
    fn concurrent_leases_are_exclusive() {
        let pool = Arc::new(EnginePool::new(vec![0u64; 3]));
        let handles: Vec<_> = (0..6)
            .map(|_| {
                let pool = pool.clone();
                std::thread::spawn(move || {
                    let mut done = 0;
                    while done < 200 {
                        if let Some(mut lease) = pool.allocate() {
                            *lease += 1;
                            done += 1;
                        } else {
                            std::thread::yield_now();
                        }
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }
        assert_eq!(pool.free_count(), 3);
        let leases: Vec<_> = (0..3).filter_map(|_| pool.allocate()).collect();
        assert_eq!(leases.len(), 3);
        assert_eq!(leases.iter().map(|l| **l).sum::<u64>(), 1200);
    }
}
