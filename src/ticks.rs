//! Tick adapter: the bridge between domain cadence ("every N ticks") and
//! scheduler delays. World systems register named recurring jobs here;
//! re-registering a name replaces (and cancels) the previous job.

use crate::scheduler::{Scheduler, TaskFn, TaskHandle};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::time::Duration;

pub struct TickAdapter {
    scheduler: Scheduler,
    tick: Duration,
    jobs: Mutex<HashMap<String, TaskHandle>>,
}

impl TickAdapter {
    pub fn new(scheduler: Scheduler, tick: Duration) -> Self {
        Self {
            scheduler,
            tick,
            jobs: Mutex::new(HashMap::new()),
        }
    }

    pub fn tick_duration(&self) -> Duration {
        self.tick
    }

    /// Convert a tick count into a scheduler delay; zero counts as one tick
    pub fn delay(&self, ticks: u32) -> Duration {
        self.tick * ticks.max(1)
    }

    /// Register a named recurring job firing every `ticks` ticks
    pub fn every(&self, name: &str, ticks: u32, task: TaskFn) -> TaskHandle {
        let interval = self.delay(ticks);
        let handle = self.scheduler.schedule_repeating(interval, interval, task);
        if let Some(old) = self.jobs.lock().insert(name.to_string(), handle.clone()) {
            tracing::debug!(job = name, "replacing registered tick job");
            old.cancel();
        }
        handle
    }

    /// One-shot job after `ticks` ticks; not tracked by name
    pub fn after(&self, ticks: u32, task: TaskFn) -> TaskHandle {
        self.scheduler.schedule(self.delay(ticks), task)
    }

    pub fn cancel(&self, name: &str) {
        if let Some(handle) = self.jobs.lock().remove(name) {
            handle.cancel();
        }
    }

    pub fn job(&self, name: &str) -> Option<TaskHandle> {
        self.jobs.lock().get(name).cloned()
    }
}
