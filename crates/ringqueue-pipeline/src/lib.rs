//! Chains [`ringqueue::Queue`]s together, one worker thread per stage.
//!
//! Each stage owns exactly one consumer handle on its input queue and one
//! producer handle on its output queue. It pops batches of up to [`BATCH`]
//! elements, runs the stage's transform, and loops until its input queue
//! reports end-of-stream.

use ringqueue::{ConsumerHandle, ProducerHandle, Queue, QueueError};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use thiserror::Error;

/// Maximum number of elements a stage worker pops into its stack buffer per
/// iteration.
const BATCH: usize = 32;

/// Errors that can occur building a [`Pipeline`].
#[derive(Debug, Error)]
pub enum PipelineError {
    /// `pipeline()` was called with an empty stage list.
    #[error("pipeline must have at least one stage")]
    NoStages,
    /// Constructing one of the pipeline's internal queues failed.
    #[error("failed constructing a pipeline stage queue: {0}")]
    Queue(#[from] QueueError),
}

/// One stage in a pipeline: the transform function plus the element size of
/// the queue it writes into.
pub struct Stage<Aux> {
    /// Output element size for this stage, used to size the queue the stage
    /// writes into.
    pub out_elem_size: usize,
    /// Upper bound on elements buffered between this stage and the next.
    /// `0` means unbounded.
    pub out_limit: usize,
    /// The transform itself. Invoked serially on this stage's own worker
    /// thread with each popped batch; pushes zero or more elements to `out`.
    pub proc: Box<dyn Fn(&[u8], usize, &ProducerHandle, &Aux) + Send>,
}

impl<Aux> Stage<Aux> {
    /// Convenience constructor for an unbounded stage.
    pub fn new(
        out_elem_size: usize,
        proc: impl Fn(&[u8], usize, &ProducerHandle, &Aux) + Send + 'static,
    ) -> Self {
        Self {
            out_elem_size,
            out_limit: 0,
            proc: Box::new(proc),
        }
    }

    /// Convenience constructor for a bounded stage.
    pub fn bounded(
        out_elem_size: usize,
        out_limit: usize,
        proc: impl Fn(&[u8], usize, &ProducerHandle, &Aux) + Send + 'static,
    ) -> Self {
        Self {
            out_elem_size,
            out_limit,
            proc: Box::new(proc),
        }
    }
}

/// A running pipeline: the head producer handle to feed input into, and the
/// worker threads' join handles.
///
/// Dropping `Pipeline` without calling [`Pipeline::join`] leaves the worker
/// threads running detached, draining whatever is already buffered; that is
/// the normal "fire and forget" mode. Releasing `head` (the only remaining
/// producer handle on the first queue) is what lets the chain drain and
/// every worker thread exit.
pub struct Pipeline {
    /// Producer handle onto the first stage's input queue.
    pub head: ProducerHandle,
    /// Consumer handle onto the last stage's output queue.
    pub tail: ConsumerHandle,
    workers: Vec<JoinHandle<()>>,
}

impl Pipeline {
    /// Blocks until every worker thread has exited, which happens once the
    /// chain has fully drained after the head producer (and any clones of
    /// it) are dropped.
    ///
    /// # Panics
    ///
    /// Panics if a worker thread itself panicked.
    pub fn join(self) {
        for worker in self.workers {
            worker.join().expect("pipeline worker thread panicked");
        }
    }
}

fn stage_worker<Aux: Send + Sync + 'static>(
    input_elem_size: usize,
    input: ConsumerHandle,
    output: ProducerHandle,
    proc: Box<dyn Fn(&[u8], usize, &ProducerHandle, &Aux) + Send>,
    aux: Arc<Aux>,
) -> JoinHandle<()> {
    thread::spawn(move || {
        let mut buf = vec![0u8; BATCH * input_elem_size];
        loop {
            let n = input.pop(&mut buf, BATCH);
            if n == 0 {
                tracing::debug!("stage worker draining: end of stream");
                break;
            }
            (proc)(&buf[..n * input_elem_size], n, &output, &aux);
        }
    })
}

/// Builds an `n`-stage pipeline: `n + 1` queues of the declared element
/// sizes, one worker thread per stage, returning the head producer and tail
/// consumer handles.
///
/// `head_elem_size` is the element size of the very first queue, the one
/// `Pipeline::head` pushes into. Each `Stage` in `stages` describes the
/// queue it writes *into* (so `stages[i].out_elem_size` is the element size
/// of the `(i+1)`-th queue) and the transform that reads from the queue
/// behind it.
pub fn pipeline<Aux: Send + Sync + 'static>(
    head_elem_size: usize,
    stages: Vec<Stage<Aux>>,
    aux: Aux,
) -> Result<Pipeline, PipelineError> {
    if stages.is_empty() {
        return Err(PipelineError::NoStages);
    }

    let aux = Arc::new(aux);
    let mut workers = Vec::with_capacity(stages.len());

    let (head_producer, mut current_consumer) = Queue::new(head_elem_size, 0)?;
    let mut current_elem_size = head_elem_size;

    for stage in stages {
        let (out_producer, out_consumer) = Queue::new(stage.out_elem_size, stage.out_limit)?;
        workers.push(stage_worker(
            current_elem_size,
            current_consumer,
            out_producer,
            stage.proc,
            Arc::clone(&aux),
        ));
        current_consumer = out_consumer;
        current_elem_size = stage.out_elem_size;
    }

    tracing::info!(stage_count = workers.len(), "pipeline started");

    Ok(Pipeline {
        head: head_producer,
        tail: current_consumer,
        workers,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn doubles_bytes_through_two_stages() {
        let stages = vec![
            Stage::new(1, |batch: &[u8], n, out: &ProducerHandle, _aux: &()| {
                let doubled: Vec<u8> = batch[..n].iter().map(|b| b.wrapping_mul(2)).collect();
                out.push(&doubled, n);
            }),
            Stage::new(1, |batch: &[u8], n, out: &ProducerHandle, _aux: &()| {
                out.push(&batch[..n], n);
            }),
        ];

        let p = pipeline(1, stages, ()).unwrap();
        p.head.push(&[1, 2, 3], 3);
        drop(p.head);

        let mut out = [0u8; 3];
        assert_eq!(p.tail.pop(&mut out, 3), 3);
        assert_eq!(out, [2, 4, 6]);
        assert_eq!(p.tail.pop(&mut out, 1), 0);

        p.join();
    }

    #[test]
    fn empty_stage_list_is_rejected() {
        let err = pipeline::<()>(1, Vec::new(), ()).unwrap_err();
        assert!(matches!(err, PipelineError::NoStages));
    }
}
