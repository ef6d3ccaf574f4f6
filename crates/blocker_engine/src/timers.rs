use std::collections::HashMap;
use std::time::Duration;

use blocker_core::{ActionId, Timer};
use futures_util::StreamExt;
use tokio_util::time::delay_queue::{DelayQueue, Key};

/// Settle and backoff timers, tagged with the action that started them.
#[derive(Debug)]
pub struct TimerQueue {
    queue: DelayQueue<(ActionId, Timer)>,
    keys: HashMap<ActionId, Vec<Key>>,
}

impl Default for TimerQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl TimerQueue {
    pub fn new() -> Self {
        Self {
            queue: DelayQueue::new(),
            keys: HashMap::new(),
        }
    }

    pub fn start(&mut self, action_id: ActionId, timer: Timer, delay: Duration) {
        let key = self.queue.insert((action_id, timer), delay);
        self.keys.entry(action_id).or_default().push(key);
    }

    /// Drops every pending timer of `action_id`.
    pub fn cancel(&mut self, action_id: ActionId) {
        for key in self.keys.remove(&action_id).unwrap_or_default() {
            // Keys are forgotten as soon as they expire, so every remaining key is live.
            self.queue.remove(&key);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    /// Waits for the next timer to expire. Returns `None` right away when nothing is pending.
    pub async fn next(&mut self) -> Option<(ActionId, Timer)> {
        let expired = self.queue.next().await?;
        let key = expired.key();
        let (action_id, timer) = expired.into_inner();
        if let Some(keys) = self.keys.get_mut(&action_id) {
            keys.retain(|pending| *pending != key);
            if keys.is_empty() {
                self.keys.remove(&action_id);
            }
        }
        Some((action_id, timer))
    }
}
