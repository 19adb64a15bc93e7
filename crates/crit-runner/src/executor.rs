//! Bounded-concurrency execution of planned tasks.
//!
//! The dispatcher walks the tasks in planner order and takes a permit from the
//! executor's own semaphore before spawning each one, so no more than
//! `concurrency()` units of work are ever in flight. Results land in slots
//! allocated before dispatch; [`BoundedExecutor::run`] returns only after every
//! spawned task has been joined.

use crate::error::HarnessError;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, warn};

#[derive(Debug)]
pub struct BoundedExecutor {
    gate: Arc<Semaphore>,
    concurrency: usize,
}

impl BoundedExecutor {
    /// `concurrency` of zero is treated as one.
    pub fn new(concurrency: usize) -> Self {
        let concurrency = concurrency.max(1);
        Self {
            gate: Arc::new(Semaphore::new(concurrency)),
            concurrency,
        }
    }

    pub fn concurrency(&self) -> usize {
        self.concurrency
    }

    /// Permits not held by running work.
    pub fn available_permits(&self) -> usize {
        self.gate.available_permits()
    }

    /// Runs `work` once per task with at most `concurrency()` units in flight
    /// and returns the results in task order.
    ///
    /// Tasks start in slice order but may finish in any order. `work` is
    /// expected to absorb its own failures into `R`; nothing is retried. A unit
    /// that panics still returns its permit, and leaves its slot empty.
    pub async fn run<T, R, F, Fut>(&self, tasks: &[T], work: F) -> Result<Vec<R>, HarnessError>
    where
        T: Clone,
        R: Send + 'static,
        F: Fn(usize, T) -> Fut,
        Fut: Future<Output = R> + Send + 'static,
    {
        let mut slots: Vec<Option<R>> = (0..tasks.len()).map(|_| None).collect();
        let mut in_flight = JoinSet::new();

        for (index, task) in tasks.iter().enumerate() {
            let permit = Arc::clone(&self.gate).acquire_owned().await?;
            let unit = work(index, task.clone());
            in_flight.spawn(async move {
                let _permit = permit;
                (index, unit.await)
            });
        }
        debug!(tasks = tasks.len(), "all tasks dispatched");

        while let Some(joined) = in_flight.join_next().await {
            match joined {
                Ok((index, result)) => {
                    if slots[index].replace(result).is_some() {
                        warn!(index, "result slot already written");
                    }
                }
                Err(err) => warn!(error = %err, "task ended without a result"),
            }
        }

        slots
            .into_iter()
            .enumerate()
            .map(|(index, slot)| slot.ok_or(HarnessError::UnfilledSlot { index }))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use tokio::time::{sleep, timeout, Duration};

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn in_flight_work_never_exceeds_the_cap() {
        for (n, cap) in [(1usize, 1usize), (7, 3), (25, 10), (12, 2), (4, 16)] {
            let executor = BoundedExecutor::new(cap);
            let live = Arc::new(AtomicUsize::new(0));
            let peak = Arc::new(AtomicUsize::new(0));
            let tasks: Vec<usize> = (0..n).collect();

            let results = executor
                .run(&tasks, |_, task| {
                    let live = Arc::clone(&live);
                    let peak = Arc::clone(&peak);
                    async move {
                        let now = live.fetch_add(1, Ordering::SeqCst) + 1;
                        peak.fetch_max(now, Ordering::SeqCst);
                        sleep(Duration::from_millis(10)).await;
                        live.fetch_sub(1, Ordering::SeqCst);
                        task * 2
                    }
                })
                .await
                .expect("run");

            assert_eq!(results, tasks.iter().map(|t| t * 2).collect::<Vec<_>>());
            let peak = peak.load(Ordering::SeqCst);
            assert!(peak <= cap, "peak {} exceeded cap {}", peak, cap);
            assert!(peak >= 1);
            assert_eq!(live.load(Ordering::SeqCst), 0);
            assert_eq!(executor.available_permits(), cap);
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn later_tasks_wait_for_a_returned_permit() {
        let executor = BoundedExecutor::new(1);
        let first_done = Arc::new(AtomicBool::new(false));

        let results = executor
            .run(&[0usize, 1], |index, _| {
                let first_done = Arc::clone(&first_done);
                async move {
                    if index == 0 {
                        sleep(Duration::from_millis(30)).await;
                        first_done.store(true, Ordering::SeqCst);
                        true
                    } else {
                        first_done.load(Ordering::SeqCst)
                    }
                }
            })
            .await
            .expect("run");

        assert_eq!(results, vec![true, true]);
    }

    #[tokio::test]
    async fn empty_task_list_returns_immediately() {
        let executor = BoundedExecutor::new(4);
        let results: Vec<u8> = executor
            .run(&[] as &[u8], |_, t| async move { t })
            .await
            .expect("run");
        assert!(results.is_empty());
    }

    #[tokio::test]
    async fn zero_concurrency_is_clamped_to_one() {
        let executor = BoundedExecutor::new(0);
        assert_eq!(executor.concurrency(), 1);
        let results = executor
            .run(&[1usize, 2, 3], |i, t| async move { i + t })
            .await
            .expect("run");
        assert_eq!(results, vec![1, 3, 5]);
    }

    #[tokio::test]
    async fn panicking_work_returns_its_permit() {
        let executor = BoundedExecutor::new(1);
        let run = executor.run(&[0usize, 1, 2], |index, t| async move {
            if index == 0 {
                panic!("solver wrapper blew up");
            }
            t
        });
        let err = timeout(Duration::from_secs(5), run)
            .await
            .expect("later tasks were admitted")
            .expect_err("panicked slot stays empty");
        assert!(matches!(err, HarnessError::UnfilledSlot { index: 0 }));
        assert_eq!(executor.available_permits(), 1);
    }
}
