//! Injectable time and id sources
//!
//! The manager never calls `Utc::now()` or generates ids inline so
//! that tests can pin both and assert exact timestamps and documents.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;

/// Source of the current instant
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall-clock time
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock that reports a preset instant and can be advanced by hand.
///
/// Cloning shares the underlying instant, so a test can keep a handle
/// while the manager owns another.
#[derive(Debug, Clone)]
pub struct ManualClock {
    now: Arc<Mutex<DateTime<Utc>>>,
}

impl ManualClock {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            now: Arc::new(Mutex::new(now)),
        }
    }

    pub fn set(&self, now: DateTime<Utc>) {
        *self.now.lock().expect("clock poisoned") = now;
    }

    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock().expect("clock poisoned");
        *now += by;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().expect("clock poisoned")
    }
}

/// Source of fresh task and step ids
pub trait IdGenerator: Send + Sync {
    fn task_id(&self) -> String;
    fn step_id(&self) -> String;
}

/// Random UUIDv4 ids with a `task-`/`step-` prefix
#[derive(Debug, Clone, Copy, Default)]
pub struct UuidIds;

impl IdGenerator for UuidIds {
    fn task_id(&self) -> String {
        format!("task-{}", Uuid::new_v4())
    }

    fn step_id(&self) -> String {
        format!("step-{}", Uuid::new_v4())
    }
}

/// Deterministic sequential ids for tests
#[derive(Debug, Default)]
pub struct SequentialIds {
    tasks: AtomicU64,
    steps: AtomicU64,
}

impl IdGenerator for SequentialIds {
    fn task_id(&self) -> String {
        format!("task-{}", self.tasks.fetch_add(1, Ordering::SeqCst) + 1)
    }

    fn step_id(&self) -> String {
        format!("step-{}", self.steps.fetch_add(1, Ordering::SeqCst) + 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn manual_clock_advances() {
        let start = Utc.with_ymd_and_hms(2024, 1, 1, 9, 0, 0).unwrap();
        let clock = ManualClock::new(start);
        let handle = clock.clone();
        handle.advance(Duration::minutes(95));
        assert_eq!(clock.now(), start + Duration::minutes(95));
    }

    #[test]
    fn sequential_ids_are_unique() {
        let ids = SequentialIds::default();
        assert_eq!(ids.task_id(), "task-1");
        assert_eq!(ids.task_id(), "task-2");
        assert_eq!(ids.step_id(), "step-1");
    }
}
