//! A thread-safe, mutex-backed bounded/unbounded MPMC queue of fixed-size
//! byte records, built on a resizable ring buffer.
//!
//! ```
//! use ringqueue::Queue;
//!
//! let (producer, consumer) = Queue::new(4, 0).unwrap();
//! producer.push(&[1, 2, 3, 4], 1);
//! drop(producer);
//!
//! let mut out = [0u8; 4];
//! assert_eq!(consumer.pop(&mut out, 1), 1);
//! assert_eq!(consumer.pop(&mut out, 1), 0); // end of stream
//! ```

mod config;
mod error;
mod invariants;
mod queue;
mod ring;

pub use error::QueueError;
pub use queue::{ConsumerHandle, ProducerHandle, Queue};
