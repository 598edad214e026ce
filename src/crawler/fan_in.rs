//! Counting join over a level of child probes
//!
//! The number of children of a node is only known once its descriptor has
//! been parsed, so a level is collected with a counter instead of a fixed
//! set of futures. Every child gets a slot in catalog order before any probe
//! starts; probes fill or drop their slot as they complete, in any order.
//! The level is complete when the counter reaches zero.
//!
//! The counter starts at one for the registration phase. [`LevelJoin::seal`]
//! releases that count, so a level with no pending slots completes
//! immediately and a level cannot complete while slots are still being
//! handed out.

use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::oneshot;

enum Slot<T> {
    Pending,
    Ready(T),
    Dropped,
}

struct JoinState<T> {
    slots: Vec<Slot<T>>,
    outstanding: usize,
    done: Option<oneshot::Sender<Vec<T>>>,
}

impl<T> JoinState<T> {
    /// Decrements the counter and fires the completion once it hits zero
    fn release(&mut self) {
        self.outstanding = self.outstanding.saturating_sub(1);
        if self.outstanding > 0 {
            return;
        }

        if let Some(done) = self.done.take() {
            let results = std::mem::take(&mut self.slots)
                .into_iter()
                .filter_map(|slot| match slot {
                    Slot::Ready(value) => Some(value),
                    Slot::Pending | Slot::Dropped => None,
                })
                .collect();
            // The waiting level may have been abandoned
            let _ = done.send(results);
        }
    }
}

fn lock<T>(state: &Mutex<JoinState<T>>) -> MutexGuard<'_, JoinState<T>> {
    state.lock().unwrap_or_else(|e| e.into_inner())
}

/// Order-preserving counting join
///
/// # Example
///
/// ```
/// use catalog_ripple::crawler::LevelJoin;
///
/// # tokio_test_block(async {
/// let join = LevelJoin::new();
/// join.push_ready("folder");
/// let slot = join.reserve();
/// let failed = join.reserve();
/// tokio::spawn(async move { slot.fill("service") });
/// drop(failed);
/// assert_eq!(join.seal().await, vec!["folder", "service"]);
/// # });
/// # fn tokio_test_block<F: std::future::Future>(f: F) {
/// #     tokio::runtime::Runtime::new().unwrap().block_on(f);
/// # }
/// ```
pub struct LevelJoin<T> {
    state: Arc<Mutex<JoinState<T>>>,
    done: oneshot::Receiver<Vec<T>>,
}

impl<T> Default for LevelJoin<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> LevelJoin<T> {
    pub fn new() -> Self {
        let (tx, rx) = oneshot::channel();
        Self {
            state: Arc::new(Mutex::new(JoinState {
                slots: Vec::new(),
                outstanding: 1,
                done: Some(tx),
            })),
            done: rx,
        }
    }

    /// Adds a child that needs no probe
    pub fn push_ready(&self, value: T) {
        lock(&self.state).slots.push(Slot::Ready(value));
    }

    /// Reserves a placeholder for a child whose probe is about to start
    pub fn reserve(&self) -> SlotHandle<T> {
        let mut state = lock(&self.state);
        state.slots.push(Slot::Pending);
        state.outstanding += 1;
        SlotHandle {
            state: Arc::clone(&self.state),
            index: state.slots.len() - 1,
            finished: false,
        }
    }

    /// Number of reserved slots whose probe has not finished
    pub fn outstanding(&self) -> usize {
        lock(&self.state).outstanding.saturating_sub(1)
    }

    /// Ends registration and waits for every reserved slot
    ///
    /// Returns the filled values in registration order.
    pub async fn seal(self) -> Vec<T> {
        lock(&self.state).release();
        self.done.await.unwrap_or_default()
    }
}

/// Placeholder for one pending child
///
/// Dropping the handle without filling it removes the child from the level,
/// which covers failed probes and panicking tasks alike.
pub struct SlotHandle<T> {
    state: Arc<Mutex<JoinState<T>>>,
    index: usize,
    finished: bool,
}

impl<T> SlotHandle<T> {
    /// Keeps the child in the level
    pub fn fill(mut self, value: T) {
        self.finish(Slot::Ready(value));
    }

    /// Removes the child from the level
    pub fn discard(mut self) {
        self.finish(Slot::Dropped);
    }

    fn finish(&mut self, slot: Slot<T>) {
        if self.finished {
            return;
        }
        self.finished = true;

        let mut state = lock(&self.state);
        if let Some(entry) = state.slots.get_mut(self.index) {
            *entry = slot;
        }
        state.release();
    }
}

impl<T> Drop for SlotHandle<T> {
    fn drop(&mut self) {
        self.finish(Slot::Dropped);
    }
}
