//! Grow-only scratch storage for batched training.
//!
//! A training call with batch size `m` needs, in one flat buffer:
//!
//! - `Y`:       targets, `(output_width, m)`
//! - `A[i]`:    activations for every layer `i` in `0..=L`, `(n_i, m)`
//! - `delta[i]`: error signals, same shapes as `A[i]`
//! - `dW`:      weight gradients, laid out exactly like the network's weight buffer
//!
//! All per-neuron blocks are neuron-major: row `k` holds neuron `k` for every example, so the
//! kernels stream whole batches per neuron.
//!
//! The buffer only ever grows. Training with a large batch and then with `m = 1` reuses the
//! large allocation.

use tracing::debug;

use crate::topology::Topology;
use crate::{Error, Result};

/// Resizable `f64` buffer whose length never shrinks.
#[derive(Debug, Clone, Default)]
pub struct GrowBuffer {
    data: Vec<f64>,
}

impl GrowBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of elements currently allocated.
    #[inline]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Returns the first `len` elements, growing the buffer first if needed.
    ///
    /// Contents of the returned slice are unspecified (stale values from earlier calls).
    pub fn ensure(&mut self, len: usize) -> Result<&mut [f64]> {
        if len > self.data.len() {
            let additional = len - self.data.len();
            self.data.try_reserve_exact(additional).map_err(|e| {
                Error::AllocationFailure(format!("growing scratch to {len} elements: {e}"))
            })?;
            debug!(old = self.data.len(), new = len, "growing training scratch");
            self.data.resize(len, 0.0);
        }
        Ok(&mut self.data[..len])
    }
}

/// Element counts of each scratch region for a given topology and batch size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScratchLayout {
    pub batch_size: usize,
    pub targets: usize,
    pub activations: usize,
    pub deltas: usize,
    pub weight_grads: usize,
}

impl ScratchLayout {
    pub fn new(topology: &Topology, batch_size: usize) -> Result<Self> {
        let overflow =
            || Error::AllocationFailure(format!("scratch size overflow for m = {batch_size}"));
        let targets = topology
            .output_width()
            .checked_mul(batch_size)
            .ok_or_else(overflow)?;
        let activations = topology
            .total_neurons()
            .checked_mul(batch_size)
            .ok_or_else(overflow)?;
        Ok(Self {
            batch_size,
            targets,
            activations,
            deltas: activations,
            weight_grads: topology.total_weights(),
        })
    }

    pub fn total(&self) -> usize {
        self.targets + self.activations + self.deltas + self.weight_grads
    }
}

/// Disjoint mutable regions carved out of the scratch buffer for one training call.
pub(crate) struct ScratchRegions<'a> {
    pub targets: &'a mut [f64],
    pub activations: &'a mut [f64],
    pub deltas: &'a mut [f64],
    pub weight_grads: &'a mut [f64],
}

/// Scratch owned by a network; tracks the largest batch it has been sized for.
#[derive(Debug, Clone, Default)]
pub struct TrainScratch {
    buffer: GrowBuffer,
    largest_batch: usize,
}

impl TrainScratch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocated element count (`data_size`).
    #[inline]
    pub fn capacity(&self) -> usize {
        self.buffer.len()
    }

    /// Largest batch size this scratch has been grown for.
    #[inline]
    pub fn largest_batch(&self) -> usize {
        self.largest_batch
    }

    pub(crate) fn regions(
        &mut self,
        topology: &Topology,
        batch_size: usize,
    ) -> Result<ScratchRegions<'_>> {
        let layout = ScratchLayout::new(topology, batch_size)?;
        let total = layout
            .targets
            .checked_add(layout.activations)
            .and_then(|n| n.checked_add(layout.deltas))
            .and_then(|n| n.checked_add(layout.weight_grads))
            .ok_or_else(|| Error::AllocationFailure("scratch size overflow".to_owned()))?;

        let buf = self.buffer.ensure(total)?;
        self.largest_batch = self.largest_batch.max(batch_size);

        let (targets, rest) = buf.split_at_mut(layout.targets);
        let (activations, rest) = rest.split_at_mut(layout.activations);
        let (deltas, weight_grads) = rest.split_at_mut(layout.deltas);
        Ok(ScratchRegions {
            targets,
            activations,
            deltas,
            weight_grads,
        })
    }
}
