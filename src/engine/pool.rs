use std::sync::{Condvar, Mutex};

/// A fixed set of reusable worker slots.
///
/// `acquire` blocks the dispatching thread while every slot is busy; that
/// blocking is the pipeline's backpressure. At most pool-size windows are
/// ever in flight, and no pending-job queue can grow without bound.
pub struct WorkerPool<T> {
    available: Mutex<Vec<T>>,
    returned: Condvar,
    size: usize,
}

impl<T> WorkerPool<T> {
    /// Build a pool owning `slots`. At least one slot is required.
    pub fn new(slots: Vec<T>) -> Self {
        assert!(!slots.is_empty(), "worker pool requires at least one slot");
        let size = slots.len();
        WorkerPool {
            available: Mutex::new(slots),
            returned: Condvar::new(),
            size,
        }
    }

    /// Take an idle slot, blocking until one is returned. Which physical
    /// slot comes back is unspecified; slots are interchangeable.
    pub fn acquire(&self) -> T {
        let mut available = self.available.lock().unwrap();
        loop {
            if let Some(slot) = available.pop() {
                return slot;
            }
            available = self.returned.wait(available).unwrap();
        }
    }

    /// Return a slot to the pool and wake waiters.
    pub fn release(&self, slot: T) {
        let mut available = self.available.lock().unwrap();
        available.push(slot);
        self.returned.notify_all();
    }

    /// Block until every slot provisioned at construction is idle again.
    pub fn drain(&self) {
        let mut available = self.available.lock().unwrap();
        while available.len() < self.size {
            available = self.returned.wait(available).unwrap();
        }
    }
}
