//! Network topology: the validated layer-size sequence plus precomputed offset tables.
//!
//! Layers are numbered `0..=L` where layer 0 is the input and layer `L` the output. Weight
//! blocks are numbered by the layer they *feed*, so valid weight-layer indices are `1..=L`.

use crate::{Error, Result};

/// Location and shape of one transposed weight block inside the flat weight buffer.
///
/// `rows` is the width of the layer being fed, `cols` the width of the layer feeding it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LayerShape {
    pub offset: usize,
    pub rows: usize,
    pub cols: usize,
}

impl LayerShape {
    #[inline]
    pub fn len(&self) -> usize {
        self.rows * self.cols
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[inline]
    pub fn range(&self) -> std::ops::Range<usize> {
        self.offset..self.offset + self.len()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Topology {
    neuron_counts: Vec<usize>,
    /// `neuron_offsets[i]` = Σ_{k<i} neuron_counts[k]; one extra trailing entry equal to the total.
    neuron_offsets: Vec<usize>,
    /// Index `l - 1` describes the block feeding layer `l`.
    weight_shapes: Vec<LayerShape>,
    total_neurons: usize,
    total_weights: usize,
}

impl Topology {
    /// Build from the full layer-size sequence (input, hidden..., output).
    pub fn new(neuron_counts: &[usize]) -> Result<Self> {
        if neuron_counts.len() < 2 {
            return Err(Error::InvalidTopology(format!(
                "need at least input and output layers, got {} layer sizes",
                neuron_counts.len()
            )));
        }
        if let Some(i) = neuron_counts.iter().position(|&n| n == 0) {
            return Err(Error::InvalidTopology(format!(
                "layer {i} has zero neurons; all layer sizes must be > 0"
            )));
        }
        // Everything must fit the i32 fields of the binary file format.
        if let Some(&n) = neuron_counts.iter().find(|&&n| n > i32::MAX as usize) {
            return Err(Error::InvalidTopology(format!(
                "layer size {n} exceeds {}",
                i32::MAX
            )));
        }

        let mut neuron_offsets = Vec::with_capacity(neuron_counts.len() + 1);
        let mut total_neurons = 0_usize;
        for &n in neuron_counts {
            neuron_offsets.push(total_neurons);
            total_neurons = total_neurons
                .checked_add(n)
                .ok_or_else(|| Error::InvalidTopology("neuron count overflow".to_owned()))?;
        }
        neuron_offsets.push(total_neurons);

        let mut weight_shapes = Vec::with_capacity(neuron_counts.len() - 1);
        let mut total_weights = 0_usize;
        for w in neuron_counts.windows(2) {
            let (cols, rows) = (w[0], w[1]);
            let len = rows
                .checked_mul(cols)
                .ok_or_else(|| Error::InvalidTopology("weight count overflow".to_owned()))?;
            weight_shapes.push(LayerShape {
                offset: total_weights,
                rows,
                cols,
            });
            total_weights = total_weights
                .checked_add(len)
                .ok_or_else(|| Error::InvalidTopology("weight count overflow".to_owned()))?;
        }

        if total_neurons > i32::MAX as usize || total_weights > i32::MAX as usize {
            return Err(Error::InvalidTopology(format!(
                "network too large: {total_neurons} neurons, {total_weights} weights"
            )));
        }

        Ok(Self {
            neuron_counts: neuron_counts.to_vec(),
            neuron_offsets,
            weight_shapes,
            total_neurons,
            total_weights,
        })
    }

    /// Build from an explicit hidden-layer count.
    ///
    /// `neuron_counts.len()` must equal `num_hidden_layers + 2`.
    pub fn with_hidden_layers(num_hidden_layers: usize, neuron_counts: &[usize]) -> Result<Self> {
        if num_hidden_layers.checked_add(2) != Some(neuron_counts.len()) {
            return Err(Error::InvalidTopology(format!(
                "{num_hidden_layers} hidden layers require {} layer sizes, got {}",
                num_hidden_layers.saturating_add(2),
                neuron_counts.len()
            )));
        }
        Self::new(neuron_counts)
    }

    #[inline]
    pub fn neuron_counts(&self) -> &[usize] {
        &self.neuron_counts
    }

    #[inline]
    pub fn num_hidden_layers(&self) -> usize {
        self.neuron_counts.len() - 2
    }

    /// Number of weight layers (`L`); also the index of the output layer.
    #[inline]
    pub fn num_weight_layers(&self) -> usize {
        self.neuron_counts.len() - 1
    }

    #[inline]
    pub fn input_width(&self) -> usize {
        self.neuron_counts[0]
    }

    #[inline]
    pub fn output_width(&self) -> usize {
        self.neuron_counts[self.neuron_counts.len() - 1]
    }

    #[inline]
    pub fn total_neurons(&self) -> usize {
        self.total_neurons
    }

    #[inline]
    pub fn total_weights(&self) -> usize {
        self.total_weights
    }

    /// Width of layer `layer` (0 = input).
    #[inline]
    pub fn layer_width(&self, layer: usize) -> Option<usize> {
        self.neuron_counts.get(layer).copied()
    }

    /// Offset of layer `layer` in the bias/activation buffers.
    #[inline]
    pub fn neuron_offset(&self, layer: usize) -> Option<usize> {
        if layer < self.neuron_counts.len() {
            Some(self.neuron_offsets[layer])
        } else {
            None
        }
    }

    /// Range of layer `layer` in the bias/activation buffers.
    #[inline]
    pub fn neuron_range(&self, layer: usize) -> Option<std::ops::Range<usize>> {
        let start = self.neuron_offset(layer)?;
        Some(start..self.neuron_offsets[layer + 1])
    }

    /// Shape of the weight block feeding layer `layer` (`1..=L`).
    #[inline]
    pub fn weight_shape(&self, layer: usize) -> Option<LayerShape> {
        layer
            .checked_sub(1)
            .and_then(|i| self.weight_shapes.get(i))
            .copied()
    }

    /// Iterates over `(layer, shape)` for every weight layer, input side first.
    pub fn weight_shapes(&self) -> impl Iterator<Item = (usize, LayerShape)> + '_ {
        self.weight_shapes
            .iter()
            .enumerate()
            .map(|(i, s)| (i + 1, *s))
    }

    /// Panicking accessors for hot paths where `layer` is known to be in range.
    #[inline]
    pub(crate) fn shape(&self, layer: usize) -> LayerShape {
        self.weight_shapes[layer - 1]
    }

    #[inline]
    pub(crate) fn offset(&self, layer: usize) -> usize {
        self.neuron_offsets[layer]
    }

    #[inline]
    pub(crate) fn width(&self, layer: usize) -> usize {
        self.neuron_counts[layer]
    }
}
