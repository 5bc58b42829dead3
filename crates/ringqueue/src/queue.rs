//! The blocking, refcounted queue built on top of [`crate::ring::Ring`].

use crate::config::{next_pow2, DEFAULT_MIN_CAP};
use crate::error::QueueError;
use crate::ring::Ring;
use std::sync::{Arc, Condvar, Mutex};

struct QueueState {
    ring: Ring,
    producer_refcount: usize,
    consumer_refcount: usize,
}

/// Shared state behind every producer/consumer handle on one queue.
///
/// `elem_size` and `max_cap` are immutable after construction and are
/// stored outside the mutex so they can be read without locking
/// (SPEC_FULL.md §5, "Shared resources").
struct QueueInner {
    state: Mutex<QueueState>,
    just_pushed: Condvar,
    just_popped: Condvar,
    elem_size: usize,
    max_cap: usize,
}

impl QueueInner {
    #[inline]
    fn lock(&self) -> std::sync::MutexGuard<'_, QueueState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn reserve(&self, count: usize) {
        let mut state = self.lock();
        if count == 0 {
            state.ring.reset_min_cap();
            return;
        }
        if count <= state.ring.elem_count() {
            return;
        }
        let target = count.min(self.max_cap);
        state.ring.raise_min_cap(target);
    }
}

/// A queue-wide, role-agnostic capability. Only constructed by
/// [`Queue::new`]; producers and consumers obtain their actual handles from
/// that call, then `Clone` to duplicate.
pub struct Queue;

impl Queue {
    /// Constructs a queue carrying `elem_size`-byte elements and returns one
    /// producer handle and one consumer handle, each starting at refcount 1
    /// (SPEC_FULL.md §3, "Lifecycle"; §9 on why two handles are returned
    /// instead of one dual-role handle).
    ///
    /// `limit == 0` means unbounded; otherwise the queue never holds more
    /// than `next_pow2(max(limit, min_cap))` elements.
    ///
    /// # Panics
    ///
    /// Panics (via `debug_assert!`) if `elem_size == 0` in debug builds;
    /// see SPEC_FULL.md §7 on `InvalidUsage`.
    pub fn new(elem_size: usize, limit: usize) -> Result<(ProducerHandle, ConsumerHandle), QueueError> {
        debug_assert_ne!(elem_size, 0, "InvalidUsage: elem_size must be nonzero");

        let min_cap = DEFAULT_MIN_CAP;
        let max_cap = if limit == 0 {
            usize::MAX
        } else {
            next_pow2(limit.max(min_cap))
        };

        elem_size
            .checked_mul(max_cap.min(isize::MAX as usize))
            .ok_or(QueueError::AllocFailure { elem_size })?;

        let ring = Ring::new(elem_size, min_cap, max_cap);
        let inner = Arc::new(QueueInner {
            state: Mutex::new(QueueState {
                ring,
                producer_refcount: 1,
                consumer_refcount: 1,
            }),
            just_pushed: Condvar::new(),
            just_popped: Condvar::new(),
            elem_size,
            max_cap,
        });

        tracing::debug!(elem_size, limit, max_cap, "queue constructed");

        Ok((
            ProducerHandle { inner: Arc::clone(&inner) },
            ConsumerHandle { inner },
        ))
    }
}

/// A capability to push elements into a queue. Cloning bumps the producer
/// refcount; dropping releases it (SPEC_FULL.md §9, "Handle type
/// distinction").
pub struct ProducerHandle {
    inner: Arc<QueueInner>,
}

/// A capability to pop elements from a queue. Cloning bumps the consumer
/// refcount; dropping releases it.
pub struct ConsumerHandle {
    inner: Arc<QueueInner>,
}

impl ProducerHandle {
    /// The fixed byte size of one element. Read-only, no lock needed.
    #[inline]
    #[must_use]
    pub fn elem_size(&self) -> usize {
        self.inner.elem_size
    }

    /// The queue's capacity ceiling (`usize::MAX` if unbounded).
    #[inline]
    #[must_use]
    pub fn max_cap(&self) -> usize {
        self.inner.max_cap
    }

    /// Raises `min_cap` to `min(count, max_cap)` so a subsequent burst of
    /// pushes up to `count` elements does not reallocate mid-push.
    /// `count == 0` resets `min_cap` to the construction-time default.
    pub fn reserve(&self, count: usize) {
        self.inner.reserve(count);
    }

    /// Pushes `count` elements (`count * elem_size` bytes) from `src`.
    ///
    /// Blocks while the queue is at capacity and at least one consumer
    /// remains. If all consumers have released their handles, the push is
    /// silently dropped (SPEC_FULL.md §4.2, "Design rationale").
    ///
    /// # Panics
    ///
    /// Panics (via `debug_assert!`) in debug builds if
    /// `src.len() != count * elem_size`.
    pub fn push(&self, src: &[u8], count: usize) {
        if count == 0 {
            return;
        }
        let elem_size = self.inner.elem_size;
        debug_assert_eq!(src.len(), count * elem_size, "InvalidUsage: src/count mismatch");

        let mut offset = 0usize;
        let mut remaining = count;
        while remaining > 0 {
            let mut state = self.inner.lock();
            state = self
                .inner
                .just_popped
                .wait_while(state, |s| {
                    s.ring.elem_count() == self.inner.max_cap && s.consumer_refcount > 0
                })
                .unwrap_or_else(|poisoned| poisoned.into_inner());

            if state.consumer_refcount == 0 {
                tracing::trace!(dropped = remaining, "push dropped: no consumers remain");
                return;
            }

            let space = self.inner.max_cap - state.ring.elem_count();
            let admitted = remaining.min(space);
            let byte_off = offset * elem_size;
            let byte_len = admitted * elem_size;

            state.ring.grow_for(admitted);
            state.ring.push_bytes(&src[byte_off..byte_off + byte_len], admitted);
            drop(state);

            self.inner.just_pushed.notify_all();
            offset += admitted;
            remaining -= admitted;
        }
    }
}

impl ConsumerHandle {
    /// The fixed byte size of one element. Read-only, no lock needed.
    #[inline]
    #[must_use]
    pub fn elem_size(&self) -> usize {
        self.inner.elem_size
    }

    /// The queue's capacity ceiling (`usize::MAX` if unbounded).
    #[inline]
    #[must_use]
    pub fn max_cap(&self) -> usize {
        self.inner.max_cap
    }

    /// Raises `min_cap` to `min(count, max_cap)`; see
    /// [`ProducerHandle::reserve`].
    pub fn reserve(&self, count: usize) {
        self.inner.reserve(count);
    }

    /// Pops up to `count` elements into `dst`, blocking until the request
    /// can be fully satisfied or every producer has released its handle.
    ///
    /// Returns the number of elements actually written. Zero means
    /// end-of-stream: no producers remain and the buffer is empty
    /// (SPEC_FULL.md §4.2).
    ///
    /// # Panics
    ///
    /// Panics (via `debug_assert!`) in debug builds if
    /// `dst.len() < count * elem_size`.
    pub fn pop(&self, dst: &mut [u8], count: usize) -> usize {
        let elem_size = self.inner.elem_size;
        let count = count.min(self.inner.max_cap);
        debug_assert!(dst.len() >= count * elem_size, "InvalidUsage: dst too small");

        let mut state = self.inner.lock();
        state = self
            .inner
            .just_pushed
            .wait_while(state, |s| s.ring.elem_count() < count && s.producer_refcount > 0)
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        let admitted = count.min(state.ring.elem_count());
        if admitted > 0 {
            state.ring.pop_bytes(&mut dst[..admitted * elem_size], admitted);
            state.ring.maybe_shrink();
        }
        drop(state);

        if admitted > 0 {
            self.inner.just_popped.notify_all();
        } else {
            tracing::trace!("pop returned end-of-stream");
        }
        admitted
    }
}

impl Clone for ProducerHandle {
    fn clone(&self) -> Self {
        let mut state = self.inner.lock();
        state.producer_refcount += 1;
        drop(state);
        ProducerHandle { inner: Arc::clone(&self.inner) }
    }
}

impl Clone for ConsumerHandle {
    fn clone(&self) -> Self {
        let mut state = self.inner.lock();
        state.consumer_refcount += 1;
        drop(state);
        ConsumerHandle { inner: Arc::clone(&self.inner) }
    }
}

impl Drop for ProducerHandle {
    fn drop(&mut self) {
        let mut state = self.inner.lock();
        debug_assert!(state.producer_refcount > 0, "InvalidUsage: double release of producer handle");
        state.producer_refcount -= 1;
        let producer_gone = state.producer_refcount == 0;
        drop(state);

        if producer_gone {
            tracing::debug!("last producer released: queue transitions to DrainOnly");
            // Wake blocked consumers so they observe end-of-stream.
            self.inner.just_pushed.notify_all();
        }
    }
}

impl Drop for ConsumerHandle {
    fn drop(&mut self) {
        let mut state = self.inner.lock();
        debug_assert!(state.consumer_refcount > 0, "InvalidUsage: double release of consumer handle");
        state.consumer_refcount -= 1;
        let consumer_gone = state.consumer_refcount == 0;
        if consumer_gone {
            state.ring.release();
        }
        drop(state);

        if consumer_gone {
            tracing::debug!("last consumer released: queue transitions to Discard, buffer freed");
            // Wake blocked producers so they observe consumer_refcount == 0
            // and drop their pending data instead of blocking forever.
            self.inner.just_popped.notify_all();
        }
    }
}
