use tokio::sync::{Mutex, Notify};
use std::{sync::Arc, collections::VecDeque};
use crate::control::scheduler::Scheduler;

/// manual transitions requested from outside the tick loop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Override {
    WakeUp,
    Sleep,
}

/// queue of overrides and a handle to wake the tick loop, shared with the web server.
/// the tick loop is the only one applying them, so the scheduler itself is never shared.
#[derive(Debug, Clone, Default)]
pub struct Queue {
    overrides: Arc<Mutex<VecDeque<Override>>>,
    notify: Arc<Notify>,
}

impl Queue {
    pub fn new() -> Self {
        Self::default()
    }

    /// queue `request` and wake the tick loop so it is applied right away
    pub async fn enqueue(&self, request: Override) {
        self.overrides.lock().await.push_back(request);
        self.notify.notify_one();
    }

    /// apply and then remove each override, starting from the front.
    /// returns how many were applied.
    pub async fn apply_all(&self, scheduler: &mut Scheduler) -> usize {
        let mut overrides = self.overrides.lock().await;
        let applied = overrides.len();
        while let Some(request) = overrides.pop_front() {
            match request {
                Override::WakeUp => scheduler.force_wake_up(),
                Override::Sleep => scheduler.force_sleep(),
            }
        }
        applied
    }

    /// resolves once `enqueue()` was called, immediately if that happened while nobody waited
    pub async fn notified(&self) {
        self.notify.notified().await;
    }
}
