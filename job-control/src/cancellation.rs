use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

/// Cooperative cancellation flag shared by every stage of one job.
///
/// Setting the flag never interrupts running work; stages poll
/// [`is_cancelled`] at their checkpoints (between pipeline stages, between
/// batch items) and report a cancelled outcome themselves. Once set the
/// flag stays set.
///
/// [`is_cancelled`]: CancellationFlag::is_cancelled
#[derive(Debug, Default)]
pub struct CancellationFlag {
    cancelled: AtomicBool,
}

impl CancellationFlag {
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

/// Process-wide map of job id to cancellation flag.
#[derive(Default)]
pub struct CancellationRegistry {
    flags: Mutex<HashMap<String, Arc<CancellationFlag>>>,
}

impl CancellationRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn flags(&self) -> std::sync::MutexGuard<'_, HashMap<String, Arc<CancellationFlag>>> {
        self.flags.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Get or create the flag for a job under one critical section, so
    /// concurrent registrations converge on the same flag object.
    pub fn register(&self, job_id: &str) -> Arc<CancellationFlag> {
        let mut guard = self.flags();
        Arc::clone(
            guard
                .entry(job_id.to_string())
                .or_insert_with(|| Arc::new(CancellationFlag::default())),
        )
    }

    pub fn get(&self, job_id: &str) -> Option<Arc<CancellationFlag>> {
        self.flags().get(job_id).cloned()
    }

    /// Set the flag for a job. Returns true iff a flag was registered.
    pub fn cancel(&self, job_id: &str) -> bool {
        let flag = self.get(job_id);
        match flag {
            Some(flag) => {
                flag.cancel();
                tracing::info!(job_id = %job_id, "job cancellation requested");
                true
            }
            None => false,
        }
    }

    pub fn is_cancelled(&self, job_id: &str) -> bool {
        self.get(job_id).is_some_and(|flag| flag.is_cancelled())
    }

    /// Drop the flag once the job reached a terminal state. Safe to call
    /// whether or not a flag exists.
    pub fn remove(&self, job_id: &str) {
        self.flags().remove(job_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cancel_is_monotonic_and_idempotent() {
        let registry = CancellationRegistry::new();
        let flag = registry.register("job-1");

        assert!(!flag.is_cancelled());
        assert!(registry.cancel("job-1"));
        assert!(registry.cancel("job-1"));
        assert!(flag.is_cancelled());
        assert!(registry.is_cancelled("job-1"));
    }

    #[test]
    fn test_cancel_on_unregistered_job_returns_false() {
        let registry = CancellationRegistry::new();

        assert!(!registry.cancel("ghost-job"));
        assert!(registry.get("ghost-job").is_none());
        assert!(!registry.is_cancelled("ghost-job"));
    }

    #[test]
    fn test_register_converges_on_one_flag() {
        let registry = CancellationRegistry::new();
        let first = registry.register("job-1");
        let second = registry.register("job-1");

        assert!(Arc::ptr_eq(&first, &second));

        // Cancellation through one handle is visible through the other
        first.cancel();
        assert!(second.is_cancelled());
    }

    #[test]
    fn test_concurrent_registration_yields_a_single_flag() {
        let registry = Arc::new(CancellationRegistry::new());

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let registry = Arc::clone(&registry);
                std::thread::spawn(move || registry.register("job-racy"))
            })
            .collect();

        let flags: Vec<_> = handles
            .into_iter()
            .map(|handle| handle.join().expect("thread join"))
            .collect();

        let first = flags.first().expect("at least one flag");
        assert!(flags.iter().all(|flag| Arc::ptr_eq(first, flag)));
    }

    #[test]
    fn test_remove_is_idempotent() {
        let registry = CancellationRegistry::new();
        registry.register("job-1");

        registry.remove("job-1");
        registry.remove("job-1");
        registry.remove("never-registered");

        assert!(registry.get("job-1").is_none());
        assert!(!registry.cancel("job-1"));
    }
}
