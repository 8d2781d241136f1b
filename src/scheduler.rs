//! Cooperative timer service.
//!
//! One spawned loop owns a min-heap of tasks ordered by `(run_at, seq)`;
//! the insertion sequence breaks same-instant ties deterministically.
//! Cancellation is lazy: a cancelled entry stays in the heap and is
//! discarded when it surfaces. Recurring tasks re-enqueue at
//! `now + interval` after the callback returns, so a slow callback shifts
//! that task's later firings by the same amount.
//!
//! The scheduler owns no domain knowledge; everything else talks to it
//! through `schedule` / `schedule_repeating` / [`TaskHandle`].

use futures::FutureExt;
use parking_lot::Mutex;
use std::cmp::Ordering as CmpOrdering;
use std::collections::BinaryHeap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;
use tokio::sync::Notify;
use tokio::time::Instant;

pub type TaskFuture = Pin<Box<dyn Future<Output = ()> + Send + 'static>>;
pub type TaskFn = Box<dyn FnMut() -> TaskFuture + Send + 'static>;

/// Box a closure into the scheduler's task shape
pub fn task<F, Fut>(mut f: F) -> TaskFn
where
    F: FnMut() -> Fut + Send + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    Box::new(move || Box::pin(f()))
}

/// Opaque reference to a scheduled task. Cancelling twice is a no-op.
#[derive(Debug, Clone)]
pub struct TaskHandle {
    cancelled: Arc<AtomicBool>,
    notify: Arc<Notify>,
}

impl TaskHandle {
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
        self.notify.notify_one();
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

struct Entry {
    run_at: Instant,
    seq: u64,
    interval: Option<Duration>,
    cancelled: Arc<AtomicBool>,
    task: TaskFn,
}

impl PartialEq for Entry {
    fn eq(&self, other: &Self) -> bool {
        self.run_at == other.run_at && self.seq == other.seq
    }
}

impl Eq for Entry {}

impl PartialOrd for Entry {
    fn partial_cmp(&self, other: &Self) -> Option<CmpOrdering> {
        Some(self.cmp(other))
    }
}

impl Ord for Entry {
    // reversed so the BinaryHeap surfaces the earliest entry first
    fn cmp(&self, other: &Self) -> CmpOrdering {
        other
            .run_at
            .cmp(&self.run_at)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

struct Inner {
    heap: Mutex<BinaryHeap<Entry>>,
    notify: Arc<Notify>,
    seq: AtomicU64,
    stopped: AtomicBool,
}

#[derive(Clone)]
pub struct Scheduler {
    inner: Arc<Inner>,
}

impl Scheduler {
    /// Create the scheduler and spawn its loop on the current runtime
    pub fn spawn() -> Self {
        let scheduler = Self {
            inner: Arc::new(Inner {
                heap: Mutex::new(BinaryHeap::new()),
                notify: Arc::new(Notify::new()),
                seq: AtomicU64::new(0),
                stopped: AtomicBool::new(false),
            }),
        };
        let inner = scheduler.inner.clone();
        tokio::spawn(run_loop(inner));
        scheduler
    }

    /// Run `task` once after `delay`
    pub fn schedule(&self, delay: Duration, task: TaskFn) -> TaskHandle {
        self.push(delay, None, task)
    }

    /// Run `task` after `delay`, then every `interval` until cancelled.
    /// A zero interval would keep the drain loop busy forever; it is
    /// clamped to one millisecond.
    pub fn schedule_repeating(&self, delay: Duration, interval: Duration, task: TaskFn) -> TaskHandle {
        self.push(delay, Some(interval.max(Duration::from_millis(1))), task)
    }

    /// Stop the loop; pending tasks never fire
    pub fn shutdown(&self) {
        self.inner.stopped.store(true, Ordering::SeqCst);
        self.inner.notify.notify_one();
    }

    fn push(&self, delay: Duration, interval: Option<Duration>, task: TaskFn) -> TaskHandle {
        let cancelled = Arc::new(AtomicBool::new(false));
        let entry = Entry {
            run_at: Instant::now() + delay,
            seq: self.inner.seq.fetch_add(1, Ordering::SeqCst),
            interval,
            cancelled: cancelled.clone(),
            task,
        };
        self.inner.heap.lock().push(entry);
        self.inner.notify.notify_one();
        TaskHandle {
            cancelled,
            notify: self.inner.notify.clone(),
        }
    }
}

async fn run_loop(inner: Arc<Inner>) {
    loop {
        if inner.stopped.load(Ordering::SeqCst) {
            return;
        }

        let next_due = inner.heap.lock().peek().map(|e| e.run_at);
        match next_due {
            None => inner.notify.notified().await,
            Some(at) => {
                tokio::select! {
                    _ = tokio::time::sleep_until(at) => {}
                    // a schedule, cancel or shutdown invalidates the wait
                    _ = inner.notify.notified() => continue,
                }
            }
        }

        // drain everything that is due right now
        loop {
            if inner.stopped.load(Ordering::SeqCst) {
                return;
            }

            let entry = {
                let mut heap = inner.heap.lock();
                let due = heap.peek().is_some_and(|e| e.run_at <= Instant::now());
                if due { heap.pop() } else { None }
            };
            let Some(mut entry) = entry else { break };

            if entry.cancelled.load(Ordering::SeqCst) {
                continue;
            }

            let fut = (entry.task)();
            if std::panic::AssertUnwindSafe(fut).catch_unwind().await.is_err() {
                tracing::warn!(seq = entry.seq, "scheduled task panicked");
            }

            if let Some(interval) = entry.interval {
                if !entry.cancelled.load(Ordering::SeqCst) {
                    entry.run_at = Instant::now() + interval;
                    entry.seq = inner.seq.fetch_add(1, Ordering::SeqCst);
                    inner.heap.lock().push(entry);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicU32;

    fn counter_task(counter: Arc<AtomicU32>) -> TaskFn {
        task(move || {
            let counter = counter.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
            }
        })
    }

    #[tokio::test(start_paused = true)]
    async fn t_one_shot_fires_once() {
        let sched = Scheduler::spawn();
        let fired = Arc::new(AtomicU32::new(0));
        sched.schedule(Duration::from_secs(1), counter_task(fired.clone()));

        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn t_one_shot_and_recurring_within_three_intervals() {
        let sched = Scheduler::spawn();
        let once = Arc::new(AtomicU32::new(0));
        let many = Arc::new(AtomicU32::new(0));
        let t = Duration::from_secs(2);

        sched.schedule(t, counter_task(once.clone()));
        sched.schedule_repeating(t, t, counter_task(many.clone()));

        tokio::time::sleep(3 * t + Duration::from_millis(10)).await;
        assert_eq!(once.load(Ordering::SeqCst), 1);
        assert!(many.load(Ordering::SeqCst) >= 2);
    }

    #[tokio::test(start_paused = true)]
    async fn t_cancelled_entry_is_skipped() {
        let sched = Scheduler::spawn();
        let fired = Arc::new(AtomicU32::new(0));
        let handle = sched.schedule(Duration::from_secs(1), counter_task(fired.clone()));

        handle.cancel();
        handle.cancel(); // idempotent
        assert!(handle.is_cancelled());

        tokio::time::sleep(Duration::from_secs(3)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn t_cancel_stops_recurrence() {
        let sched = Scheduler::spawn();
        let fired = Arc::new(AtomicU32::new(0));
        let handle =
            sched.schedule_repeating(Duration::from_secs(1), Duration::from_secs(1), counter_task(fired.clone()));

        tokio::time::sleep(Duration::from_millis(1500)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 1);
        handle.cancel();
        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn t_panicking_task_keeps_loop_and_recurrence_alive() {
        let sched = Scheduler::spawn();
        let fired = Arc::new(AtomicU32::new(0));
        let inner = fired.clone();
        sched.schedule_repeating(
            Duration::from_secs(1),
            Duration::from_secs(1),
            task(move || {
                let fired = inner.clone();
                async move {
                    let n = fired.fetch_add(1, Ordering::SeqCst);
                    if n == 0 {
                        panic!("first firing fails");
                    }
                }
            }),
        );
        let after = Arc::new(AtomicU32::new(0));
        sched.schedule(Duration::from_secs(4), counter_task(after.clone()));

        tokio::time::sleep(Duration::from_secs(5)).await;
        // the panic neither halted the loop nor unregistered the task
        assert!(fired.load(Ordering::SeqCst) >= 3);
        assert_eq!(after.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn t_same_instant_fires_in_insertion_order() {
        let sched = Scheduler::spawn();
        let order = Arc::new(Mutex::new(Vec::new()));
        for n in 0..4u32 {
            let order = order.clone();
            sched.schedule(
                Duration::from_secs(1),
                task(move || {
                    let order = order.clone();
                    async move {
                        order.lock().push(n);
                    }
                }),
            );
        }
        tokio::time::sleep(Duration::from_secs(2)).await;
        assert_eq!(*order.lock(), vec![0, 1, 2, 3]);
    }

    #[tokio::test(start_paused = true)]
    async fn t_shutdown_stops_firing() {
        let sched = Scheduler::spawn();
        let fired = Arc::new(AtomicU32::new(0));
        sched.schedule(Duration::from_secs(1), counter_task(fired.clone()));
        sched.shutdown();
        tokio::time::sleep(Duration::from_secs(3)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 0);
    }
}
