//! In-process dispatcher that keeps every message it accepts.
//!
//! Stands in for the queue in tests and local runs.

use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;

use super::{DispatchError, Dispatcher, QueueMessage};

#[derive(Debug, Default)]
pub struct RecordingDispatcher {
    messages: Mutex<Vec<QueueMessage>>,
    unavailable: AtomicBool,
}

impl RecordingDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// A dispatcher whose transport is down: every enqueue fails.
    pub fn unavailable() -> Self {
        let dispatcher = Self::default();
        dispatcher.set_unavailable(true);
        dispatcher
    }

    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    pub fn messages(&self) -> Vec<QueueMessage> {
        self.messages
            .lock()
            .map(|m| m.clone())
            .unwrap_or_default()
    }

    pub fn last(&self) -> Option<QueueMessage> {
        self.messages().pop()
    }

    pub fn len(&self) -> usize {
        self.messages.lock().map(|m| m.len()).unwrap_or_default()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl Dispatcher for RecordingDispatcher {
    async fn enqueue(&self, message: QueueMessage) -> Result<(), DispatchError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(DispatchError::Unavailable("recording dispatcher is down".into()));
        }
        self.messages
            .lock()
            .map_err(|_| DispatchError::Unavailable("recording dispatcher poisoned".into()))?
            .push(message);
        Ok(())
    }
}
