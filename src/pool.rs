//! Optional message pool (`pool` feature): a bounded stack of reusable
//! `Message` buffers behind a `Mutex`, for callers that parse or build
//! at a rate where the MTI/field-map allocations would otherwise
//! dominate. Not on the critical path of `parse`/`build`/`validate`.

use std::sync::Mutex;

use crate::message::Message;
use crate::schema::Version;

/// A fixed-capacity stack of recycled [`Message`] buffers.
///
/// `acquire` hands out a buffer reset to an empty `0000` message;
/// `release` pushes it back if the pool has room, otherwise drops it.
/// A message acquired from the pool and never released is simply
/// dropped normally — the pool only recycles what it's given back.
pub struct MessagePool {
    slots: Mutex<Vec<Message>>,
    capacity: usize,
}

impl MessagePool {
    pub fn new(capacity: usize) -> Self {
        MessagePool {
            slots: Mutex::new(Vec::with_capacity(capacity)),
            capacity,
        }
    }

    /// Take a buffer from the pool, or allocate a fresh one if empty.
    pub fn acquire(&self) -> Message {
        let mut slots = self.slots.lock().expect("pool mutex poisoned");
        slots.pop().unwrap_or_else(|| Message::new("0000", Version::default()))
    }

    /// Return a buffer to the pool for reuse. Its field map is cleared
    /// first so the next `acquire` sees an empty message; releasing
    /// the same buffer twice, or using it again after release, is a
    /// caller bug the pool does not detect.
    pub fn release(&self, mut message: Message) {
        message.clear();
        let mut slots = self.slots.lock().expect("pool mutex poisoned");
        if slots.len() < self.capacity {
            slots.push(message);
        }
    }

    pub fn len(&self) -> usize {
        self.slots.lock().expect("pool mutex poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::FieldValue;

    #[test]
    fn acquire_on_empty_pool_allocates() {
        let pool = MessagePool::new(2);
        let message = pool.acquire();
        assert_eq!(message.mti, "0000");
    }

    #[test]
    fn release_then_acquire_reuses_buffer() {
        let pool = MessagePool::new(2);
        let mut message = pool.acquire();
        message.set_field(2, FieldValue::Text("4111111111111111".to_string()));
        pool.release(message);
        assert_eq!(pool.len(), 1);

        let reused = pool.acquire();
        assert!(reused.field(2).is_none(), "released buffer must come back cleared");
        assert_eq!(pool.len(), 0);
    }

    #[test]
    fn release_beyond_capacity_drops_excess() {
        let pool = MessagePool::new(1);
        pool.release(Message::new("0000", Version::default()));
        pool.release(Message::new("0000", Version::default()));
        assert_eq!(pool.len(), 1);
    }
}
