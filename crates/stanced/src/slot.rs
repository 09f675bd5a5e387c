//! Single-slot frame mailbox with keep-only-latest semantics.

use std::sync::{Condvar, Mutex};

struct SlotState<T> {
    value: Option<T>,
    closed: bool,
}

/// A one-deep mailbox between the capture and inference threads.
///
/// `publish` overwrites any unconsumed value, so a slow consumer always
/// sees the newest frame and never works through a backlog.
pub struct LatestSlot<T> {
    inner: Mutex<SlotState<T>>,
    ready: Condvar,
}

impl<T> LatestSlot<T> {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(SlotState {
                value: None,
                closed: false,
            }),
            ready: Condvar::new(),
        }
    }

    /// Store a value, replacing any unconsumed one.
    ///
    /// Returns true when an unconsumed value was replaced. Publishing to
    /// a closed slot is ignored.
    pub fn publish(&self, value: T) -> bool {
        let mut state = self.inner.lock().expect("slot lock poisoned");
        if state.closed {
            return false;
        }
        let replaced = state.value.is_some();
        state.value = Some(value);
        drop(state);
        self.ready.notify_one();
        replaced
    }

    /// Block until a value is available or the slot is closed.
    ///
    /// A value published before close is still delivered; `None` means
    /// closed and drained.
    pub fn take(&self) -> Option<T> {
        let mut state = self.inner.lock().expect("slot lock poisoned");
        loop {
            if let Some(value) = state.value.take() {
                return Some(value);
            }
            if state.closed {
                return None;
            }
            state = self.ready.wait(state).expect("slot lock poisoned");
        }
    }

    /// Close the slot and wake every waiter.
    pub fn close(&self) {
        let mut state = self.inner.lock().expect("slot lock poisoned");
        state.closed = true;
        drop(state);
        self.ready.notify_all();
    }
}

impl<T> Default for LatestSlot<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_publish_take() {
        let slot = LatestSlot::new();
        assert!(!slot.publish(7));
        assert_eq!(slot.take(), Some(7));
    }

    #[test]
    fn test_publish_overwrites_unconsumed() {
        let slot = LatestSlot::new();
        assert!(!slot.publish(1));
        assert!(slot.publish(2));
        assert!(slot.publish(3));
        assert_eq!(slot.take(), Some(3));
    }

    #[test]
    fn test_take_drains_after_close() {
        let slot = LatestSlot::new();
        slot.publish(42);
        slot.close();
        assert_eq!(slot.take(), Some(42));
        assert_eq!(slot.take(), None);
    }

    #[test]
    fn test_publish_after_close_ignored() {
        let slot = LatestSlot::new();
        slot.close();
        assert!(!slot.publish(1));
        assert_eq!(slot.take(), None);
    }

    #[test]
    fn test_take_unblocks_on_close() {
        let slot: Arc<LatestSlot<u32>> = Arc::new(LatestSlot::new());
        let taker = {
            let slot = Arc::clone(&slot);
            std::thread::spawn(move || slot.take())
        };
        std::thread::sleep(std::time::Duration::from_millis(20));
        slot.close();
        assert_eq!(taker.join().unwrap(), None);
    }

    #[test]
    fn test_threaded_producer_consumer() {
        let slot: Arc<LatestSlot<u32>> = Arc::new(LatestSlot::new());
        let producer = {
            let slot = Arc::clone(&slot);
            std::thread::spawn(move || {
                for i in 0..100 {
                    slot.publish(i);
                }
                slot.close();
            })
        };

        let mut received = Vec::new();
        while let Some(v) = slot.take() {
            received.push(v);
        }
        producer.join().unwrap();

        // The consumer sees a strictly increasing subset ending with the
        // final published value.
        assert!(!received.is_empty());
        assert!(received.windows(2).all(|w| w[0] < w[1]));
        assert_eq!(*received.last().unwrap(), 99);
    }
}
