//! Run progress, owned by a single consumer task
//!
//! Entity tasks never touch counters or the error list. They send
//! [`ProgressEvent`]s through a [`ProgressHandle`]; the aggregator task
//! applies them one at a time and calls the observer after each. A panicking
//! observer is logged and otherwise ignored.

use super::types::{RunPhase, RunProgress};
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};
use tokio::task::JoinHandle;
use tracing::{error, warn};

/// Receives a snapshot after every progress change.
pub trait ProgressObserver: Send + Sync {
    fn on_progress(&self, progress: &RunProgress);
}

impl<F> ProgressObserver for F
where
    F: Fn(&RunProgress) + Send + Sync,
{
    fn on_progress(&self, progress: &RunProgress) {
        self(progress)
    }
}

#[derive(Debug, Clone)]
pub enum ProgressEvent {
    PhaseStarted {
        phase: RunPhase,
        total: usize,
        label: Option<String>,
    },
    EntityCompleted {
        item: String,
        /// Formatted error string on failure
        error: Option<String>,
    },
    Finished {
        total: usize,
    },
}

/// Sending side, cloned into each entity task.
#[derive(Debug, Clone)]
pub struct ProgressHandle {
    tx: UnboundedSender<ProgressEvent>,
}

impl ProgressHandle {
    pub fn phase_started(&self, phase: RunPhase, total: usize, label: Option<String>) {
        self.send(ProgressEvent::PhaseStarted {
            phase,
            total,
            label,
        });
    }

    pub fn entity_completed(&self, item: impl Into<String>, error: Option<String>) {
        self.send(ProgressEvent::EntityCompleted {
            item: item.into(),
            error,
        });
    }

    pub fn finished(&self, total: usize) {
        self.send(ProgressEvent::Finished { total });
    }

    fn send(&self, event: ProgressEvent) {
        if self.tx.send(event).is_err() {
            warn!("progress aggregator stopped; event dropped");
        }
    }
}

/// Final state once every handle has been dropped
#[derive(Debug, Clone, Default)]
pub struct ProgressTotals {
    pub completed: usize,
    pub errors: Vec<String>,
}

pub struct ProgressAggregator {
    state: RunProgress,
    /// Completions across all phases
    completed_overall: usize,
    observer: Option<Arc<dyn ProgressObserver>>,
}

impl ProgressAggregator {
    pub fn new(observer: Option<Arc<dyn ProgressObserver>>) -> Self {
        Self {
            state: RunProgress::new(),
            completed_overall: 0,
            observer,
        }
    }

    /// Start the consumer task.
    ///
    /// The task ends when every clone of the returned handle is dropped.
    pub fn spawn(self) -> (ProgressHandle, ProgressTask) {
        let (tx, rx) = unbounded_channel();
        let join = tokio::spawn(self.consume(rx));
        (ProgressHandle { tx }, ProgressTask { join })
    }

    async fn consume(mut self, mut rx: UnboundedReceiver<ProgressEvent>) -> ProgressTotals {
        while let Some(event) = rx.recv().await {
            self.apply(event);
            self.notify();
        }
        ProgressTotals {
            completed: self.completed_overall,
            errors: self.state.errors,
        }
    }

    pub fn apply(&mut self, event: ProgressEvent) {
        match event {
            ProgressEvent::PhaseStarted {
                phase,
                total,
                label,
            } => {
                self.state.phase = phase;
                self.state.completed = 0;
                self.state.total = total;
                self.state.current_item = label;
            }
            ProgressEvent::EntityCompleted { item, error } => {
                self.state.completed += 1;
                self.completed_overall += 1;
                self.state.current_item = Some(item);
                if let Some(error) = error {
                    self.state.errors.push(error);
                }
            }
            ProgressEvent::Finished { total } => {
                self.state.phase = RunPhase::Complete;
                self.state.completed = total;
                self.state.total = total;
                self.state.current_item = None;
            }
        }
    }

    pub fn progress(&self) -> &RunProgress {
        &self.state
    }

    fn notify(&self) {
        let Some(observer) = &self.observer else {
            return;
        };
        let state = &self.state;
        if catch_unwind(AssertUnwindSafe(|| observer.on_progress(state))).is_err() {
            warn!(phase = %state.phase, "progress observer panicked; continuing");
        }
    }
}

/// Consumer side; yields the totals after the last handle is gone.
pub struct ProgressTask {
    join: JoinHandle<ProgressTotals>,
}

impl ProgressTask {
    pub async fn finish(self) -> ProgressTotals {
        match self.join.await {
            Ok(totals) => totals,
            Err(e) => {
                error!("progress aggregator task failed: {}", e);
                ProgressTotals::default()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    fn recording() -> (Arc<dyn ProgressObserver>, Arc<Mutex<Vec<RunProgress>>>) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let observer: Arc<dyn ProgressObserver> =
            Arc::new(move |p: &RunProgress| sink.lock().unwrap().push(p.clone()));
        (observer, seen)
    }

    #[tokio::test]
    async fn events_are_applied_in_order() {
        let (observer, seen) = recording();
        let (handle, task) = ProgressAggregator::new(Some(observer)).spawn();

        handle.phase_started(RunPhase::Regional, 2, None);
        handle.entity_completed("tokyo", None);
        handle.entity_completed("osaka", Some("regional:osaka failed: boom".into()));
        handle.finished(3);
        drop(handle);

        let totals = task.finish().await;
        assert_eq!(totals.completed, 2);
        assert_eq!(totals.errors, vec!["regional:osaka failed: boom".to_string()]);

        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 4);
        assert_eq!((seen[0].completed, seen[0].total), (0, 2));
        assert_eq!(seen[1].current_item.as_deref(), Some("tokyo"));
        assert_eq!(seen[2].errors.len(), 1);
        assert_eq!(seen[3].phase, RunPhase::Complete);
        assert_eq!((seen[3].completed, seen[3].total), (3, 3));
    }

    #[tokio::test]
    async fn panicking_observer_does_not_stop_aggregation() {
        let observer: Arc<dyn ProgressObserver> = Arc::new(|_: &RunProgress| panic!("observer bug"));
        let (handle, task) = ProgressAggregator::new(Some(observer)).spawn();

        handle.phase_started(RunPhase::Block, 1, None);
        handle.entity_completed("kinki", Some("block:kinki failed: x".into()));
        drop(handle);

        let totals = task.finish().await;
        assert_eq!(totals.completed, 1);
        assert_eq!(totals.errors.len(), 1);
    }

    #[test]
    fn phase_start_resets_phase_counters_but_keeps_errors() {
        let mut aggregator = ProgressAggregator::new(None);
        aggregator.apply(ProgressEvent::EntityCompleted {
            item: "national".into(),
            error: Some("national:national failed: x".into()),
        });
        aggregator.apply(ProgressEvent::PhaseStarted {
            phase: RunPhase::Regional,
            total: 47,
            label: None,
        });

        let progress = aggregator.progress();
        assert_eq!(progress.completed, 0);
        assert_eq!(progress.total, 47);
        assert_eq!(progress.errors.len(), 1);
    }
}
