// ============================================================
// Layer 4 — Window Batcher
// ============================================================
// Converts a Vec<Window> into GPU-ready tensors and walks the
// dataset in fixed, sequential order.
//
// How batching works here:
//   Input:  N windows, each with L input ids and L target ids
//   Output: WindowBatch with two Int tensors of shape [N, L]
//
// Order matters. The trainer carries recurrent state from one
// batch to the next, so batch k+1 must be the windows that follow
// batch k. Nothing in here shuffles, and the prefetching variant
// delivers exactly the same sequence as the inline one.

use std::sync::{mpsc, Arc};
use std::thread;

use burn::{data::dataset::Dataset, prelude::*};

use crate::data::dataset::{Window, WindowDataset};

// ─── WindowBatch ──────────────────────────────────────────────────────────────
#[derive(Debug, Clone)]
pub struct WindowBatch<B: Backend> {
    /// Input ids — shape: [batch_size, sequence_length]
    pub inputs: Tensor<B, 2, Int>,

    /// Next-token targets — shape: [batch_size, sequence_length]
    pub targets: Tensor<B, 2, Int>,
}

// ─── WindowBatcher ────────────────────────────────────────────────────────────
#[derive(Clone, Debug, Default)]
pub struct WindowBatcher;

impl WindowBatcher {
    pub fn new() -> Self {
        Self
    }

    /// Stack windows row by row. All windows share one length.
    pub fn batch<B: Backend>(&self, items: Vec<Window>, device: &B::Device) -> WindowBatch<B> {
        let batch_size = items.len();
        let seq_len    = items.first().map_or(0, |w| w.input.len());

        let input_flat: Vec<i32> = items
            .iter()
            .flat_map(|w| w.input.iter().map(|&x| x as i32))
            .collect();

        let target_flat: Vec<i32> = items
            .iter()
            .flat_map(|w| w.target.iter().map(|&x| x as i32))
            .collect();

        let inputs = Tensor::<B, 1, Int>::from_ints(input_flat.as_slice(), device)
            .reshape([batch_size, seq_len]);

        let targets = Tensor::<B, 1, Int>::from_ints(target_flat.as_slice(), device)
            .reshape([batch_size, seq_len]);

        WindowBatch { inputs, targets }
    }
}

// ─── Sequential iteration ─────────────────────────────────────────────────────
/// Consecutive chunks of `batch_size` windows: [0..B), [B..2B), ...
/// The last chunk holds whatever is left and may be shorter.
pub struct SequentialBatches<'a> {
    dataset:    &'a WindowDataset,
    batch_size: usize,
    next:       usize,
}

impl<'a> SequentialBatches<'a> {
    pub fn new(dataset: &'a WindowDataset, batch_size: usize) -> Self {
        Self { dataset, batch_size: batch_size.max(1), next: 0 }
    }
}

impl Iterator for SequentialBatches<'_> {
    type Item = Vec<Window>;

    fn next(&mut self) -> Option<Self::Item> {
        let chunk = collect_chunk(self.dataset, self.next, self.batch_size)?;
        self.next += chunk.len();
        Some(chunk)
    }
}

fn collect_chunk(dataset: &WindowDataset, start: usize, batch_size: usize) -> Option<Vec<Window>> {
    let end = (start + batch_size).min(dataset.len());
    if start >= end {
        return None;
    }
    Some((start..end).filter_map(|i| dataset.get(i)).collect())
}

// ─── Prefetched iteration ─────────────────────────────────────────────────────
/// Same chunks as `SequentialBatches`, materialised ahead of time by one
/// worker thread into a bounded channel of `depth` slots.
///
/// A single producer keeps delivery order identical to the inline
/// iterator. Dropping the iterator closes the channel and the worker
/// stops at its next send.
pub struct PrefetchedBatches {
    receiver: mpsc::Receiver<Vec<Window>>,
    worker:   Option<thread::JoinHandle<()>>,
}

impl PrefetchedBatches {
    pub fn spawn(dataset: Arc<WindowDataset>, batch_size: usize, depth: usize) -> Self {
        let (sender, receiver) = mpsc::sync_channel(depth.max(1));
        let batch_size = batch_size.max(1);

        let worker = thread::spawn(move || {
            let mut start = 0;
            while let Some(chunk) = collect_chunk(&dataset, start, batch_size) {
                start += chunk.len();
                if sender.send(chunk).is_err() {
                    tracing::debug!("Batch consumer went away, stopping prefetch");
                    break;
                }
            }
        });

        Self { receiver, worker: Some(worker) }
    }
}

impl Iterator for PrefetchedBatches {
    type Item = Vec<Window>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.receiver.recv() {
            Ok(chunk) => Some(chunk),
            Err(_) => {
                // Channel closed: the worker has finished
                if let Some(worker) = self.worker.take() {
                    if worker.join().is_err() {
                        tracing::warn!("Prefetch worker panicked");
                    }
                }
                None
            }
        }
    }
}

/// Batch source for one epoch, inline or prefetched.
pub enum EpochBatches<'a> {
    Inline(SequentialBatches<'a>),
    Prefetched(PrefetchedBatches),
}

impl<'a> EpochBatches<'a> {
    /// `prefetch == 0` walks the dataset inline on the calling thread.
    pub fn new(dataset: &'a Arc<WindowDataset>, batch_size: usize, prefetch: usize) -> Self {
        if prefetch == 0 {
            Self::Inline(SequentialBatches::new(dataset, batch_size))
        } else {
            Self::Prefetched(PrefetchedBatches::spawn(Arc::clone(dataset), batch_size, prefetch))
        }
    }
}

impl Iterator for EpochBatches<'_> {
    type Item = Vec<Window>;

    fn next(&mut self) -> Option<Self::Item> {
        match self {
            Self::Inline(it)     => it.next(),
            Self::Prefetched(it) => it.next(),
        }
    }
}
