use std::fmt;

use rand::Rng;
use tracing::debug;

use crate::activation::sigmoid;
use crate::init::fill_uniform;
use crate::matrix::{MatrixMut, MatrixRef};
use crate::scratch::TrainScratch;
use crate::topology::Topology;
use crate::{Error, Result};

/// A feed-forward network stored in three flat buffers.
///
/// - `weights`: every layer's weight matrix, stored transposed (`(out, in)`), packed back to back.
/// - `biases`: one vector per layer, the input layer included (its entries are unused).
/// - `outputs`: the activations of the most recent forward pass, laid out like `biases`.
///
/// All three are sized once from the [`Topology`] and never reallocated. Training additionally
/// uses a grow-only scratch buffer owned by the network.
#[derive(Debug)]
pub struct Network {
    pub(crate) topology: Topology,
    pub(crate) weights: Vec<f64>,
    pub(crate) biases: Vec<f64>,
    pub(crate) outputs: Vec<f64>,
    pub(crate) scratch: TrainScratch,
}

fn zeroed(len: usize, what: &str) -> Result<Vec<f64>> {
    let mut v = Vec::new();
    v.try_reserve_exact(len)
        .map_err(|e| Error::AllocationFailure(format!("{what} ({len} elements): {e}")))?;
    v.resize(len, 0.0);
    Ok(v)
}

impl Network {
    /// Creates a zero-initialized network from the full layer-size sequence.
    pub fn new(neuron_counts: &[usize]) -> Result<Self> {
        Self::from_topology(Topology::new(neuron_counts)?)
    }

    /// Creates a zero-initialized network with an explicit hidden-layer count.
    pub fn with_hidden_layers(num_hidden_layers: usize, neuron_counts: &[usize]) -> Result<Self> {
        Self::from_topology(Topology::with_hidden_layers(num_hidden_layers, neuron_counts)?)
    }

    pub fn from_topology(topology: Topology) -> Result<Self> {
        let weights = zeroed(topology.total_weights(), "weights")?;
        let biases = zeroed(topology.total_neurons(), "biases")?;
        let outputs = zeroed(topology.total_neurons(), "outputs")?;
        debug!(
            neuron_counts = ?topology.neuron_counts(),
            total_neurons = topology.total_neurons(),
            total_weights = topology.total_weights(),
            "created network"
        );
        Ok(Self {
            topology,
            weights,
            biases,
            outputs,
            scratch: TrainScratch::new(),
        })
    }

    /// Assembles a network from existing parameter buffers.
    ///
    /// `weights.len()` must equal `total_weights` and `biases.len()` must equal `total_neurons`.
    pub fn from_parts(topology: Topology, weights: Vec<f64>, biases: Vec<f64>) -> Result<Self> {
        if weights.len() != topology.total_weights() {
            return Err(Error::ShapeMismatch(format!(
                "weights length {} does not match total_weights {}",
                weights.len(),
                topology.total_weights()
            )));
        }
        if biases.len() != topology.total_neurons() {
            return Err(Error::ShapeMismatch(format!(
                "biases length {} does not match total_neurons {}",
                biases.len(),
                topology.total_neurons()
            )));
        }
        let outputs = zeroed(topology.total_neurons(), "outputs")?;
        Ok(Self {
            topology,
            weights,
            biases,
            outputs,
            scratch: TrainScratch::new(),
        })
    }

    #[inline]
    pub fn topology(&self) -> &Topology {
        &self.topology
    }

    #[inline]
    pub fn neuron_counts(&self) -> &[usize] {
        self.topology.neuron_counts()
    }

    #[inline]
    pub fn input_dim(&self) -> usize {
        self.topology.input_width()
    }

    #[inline]
    pub fn output_dim(&self) -> usize {
        self.topology.output_width()
    }

    #[inline]
    pub fn weights(&self) -> &[f64] {
        &self.weights
    }

    #[inline]
    pub fn weights_mut(&mut self) -> &mut [f64] {
        &mut self.weights
    }

    #[inline]
    pub fn biases(&self) -> &[f64] {
        &self.biases
    }

    #[inline]
    pub fn biases_mut(&mut self) -> &mut [f64] {
        &mut self.biases
    }

    /// Activations of every layer from the last forward pass.
    #[inline]
    pub fn outputs(&self) -> &[f64] {
        &self.outputs
    }

    /// Final-layer activations from the last forward pass.
    #[inline]
    pub fn output(&self) -> &[f64] {
        let last = self.topology.num_weight_layers();
        &self.outputs[self.topology.offset(last)..]
    }

    /// Elements currently allocated for training scratch (grow-only).
    #[inline]
    pub fn scratch_capacity(&self) -> usize {
        self.scratch.capacity()
    }

    /// Largest batch size the training scratch has been grown for.
    #[inline]
    pub fn largest_batch(&self) -> usize {
        self.scratch.largest_batch()
    }

    /// Fills every weight with a uniform draw in `[min, max)`.
    pub fn randomize_weights<R: Rng + ?Sized>(
        &mut self,
        rng: &mut R,
        min: f64,
        max: f64,
    ) -> Result<()> {
        fill_uniform(&mut self.weights, rng, min, max)
    }

    /// Fills every bias (the unused input-layer entries included) with a uniform draw in
    /// `[min, max)`.
    pub fn randomize_bias<R: Rng + ?Sized>(&mut self, rng: &mut R, min: f64, max: f64) -> Result<()> {
        fill_uniform(&mut self.biases, rng, min, max)
    }

    /// Transposed weight block feeding `layer` (`1..=L`), shape `(n_layer, n_{layer-1})`.
    pub fn layer_weights(&self, layer: usize) -> Option<MatrixRef<'_>> {
        let shape = self.topology.weight_shape(layer)?;
        Some(MatrixRef::from_parts(
            &self.weights[shape.range()],
            shape.rows,
            shape.cols,
        ))
    }

    pub fn layer_weights_mut(&mut self, layer: usize) -> Option<MatrixMut<'_>> {
        let shape = self.topology.weight_shape(layer)?;
        Some(MatrixMut::from_parts(
            &mut self.weights[shape.range()],
            shape.rows,
            shape.cols,
        ))
    }

    /// Bias vector of `layer` (`0..=L`).
    pub fn layer_bias(&self, layer: usize) -> Option<&[f64]> {
        let range = self.topology.neuron_range(layer)?;
        Some(&self.biases[range])
    }

    pub fn layer_bias_mut(&mut self, layer: usize) -> Option<&mut [f64]> {
        let range = self.topology.neuron_range(layer)?;
        Some(&mut self.biases[range])
    }

    /// Activations of `layer` (`0..=L`) from the last forward pass.
    pub fn layer_output(&self, layer: usize) -> Option<&[f64]> {
        let range = self.topology.neuron_range(layer)?;
        Some(&self.outputs[range])
    }

    /// Forward pass for a single input vector.
    ///
    /// Overwrites the activation buffer and returns the output layer. On a length mismatch
    /// nothing is written.
    pub fn run(&mut self, input: &[f64]) -> Result<&[f64]> {
        let in_dim = self.input_dim();
        if input.len() != in_dim {
            return Err(Error::ShapeMismatch(format!(
                "input len {} does not match network input width {in_dim}",
                input.len()
            )));
        }

        self.outputs[..in_dim].copy_from_slice(input);
        for layer in 1..=self.topology.num_weight_layers() {
            self.forward_layer(layer);
        }
        Ok(self.output())
    }

    /// Computes `A_layer = sigmoid(b + W · A_{layer-1})` in the activation buffer.
    #[inline]
    fn forward_layer(&mut self, layer: usize) {
        let shape = self.topology.shape(layer);
        let start = self.topology.offset(layer);
        let prev_start = self.topology.offset(layer - 1);

        let (before, after) = self.outputs.split_at_mut(start);
        let prev = &before[prev_start..];
        let out = &mut after[..shape.rows];
        let weights = &self.weights[shape.range()];
        let bias = &self.biases[start..start + shape.rows];

        for (k, o) in out.iter_mut().enumerate() {
            let row = &weights[k * shape.cols..(k + 1) * shape.cols];
            let mut sum = bias[k];
            for (&w, &x) in row.iter().zip(prev) {
                sum = w.mul_add(x, sum);
            }
            *o = sigmoid(sum);
        }
    }
}

impl Clone for Network {
    /// Deep copy of parameters and activations; the clone starts with an empty training scratch.
    fn clone(&self) -> Self {
        Self {
            topology: self.topology.clone(),
            weights: self.weights.clone(),
            biases: self.biases.clone(),
            outputs: self.outputs.clone(),
            scratch: TrainScratch::new(),
        }
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let t = &self.topology;
        writeln!(f, "Neural Network Structure:")?;
        writeln!(f, "Inputs: {}", t.input_width())?;
        writeln!(f, "Hidden Layers: {}", t.num_hidden_layers())?;
        for layer in 1..=t.num_hidden_layers() {
            writeln!(f, "Hidden Layer {layer}: {} neurons", t.width(layer))?;
        }
        writeln!(f, "Outputs: {}", t.output_width())?;

        write!(f, "\nT_Weights:")?;
        for (layer, shape) in t.weight_shapes() {
            writeln!(f, "\nLayer {}-{layer}:", layer - 1)?;
            let block = &self.weights[shape.range()];
            for row in block.chunks(shape.cols) {
                let cells: Vec<String> = row.iter().map(|w| format!("{w:.3}")).collect();
                writeln!(f, "[{}]", cells.join(", "))?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn random_network(counts: &[usize], seed: u64) -> Network {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut net = Network::new(counts).unwrap();
        net.randomize_weights(&mut rng, -1.0, 1.0).unwrap();
        net.randomize_bias(&mut rng, -0.5, 0.5).unwrap();
        net
    }

    #[test]
    fn new_network_is_zeroed_and_sized_from_topology() {
        let net = Network::new(&[3, 20, 4, 3, 4, 5]).unwrap();
        assert_eq!(net.weights().len(), net.topology().total_weights());
        assert_eq!(net.biases().len(), net.topology().total_neurons());
        assert_eq!(net.outputs().len(), net.topology().total_neurons());
        assert!(net.weights().iter().all(|&w| w == 0.0));
        assert_eq!(net.scratch_capacity(), 0);
    }

    #[test]
    fn invalid_topology_is_rejected() {
        assert!(matches!(
            Network::new(&[2, 0, 1]),
            Err(Error::InvalidTopology(_))
        ));
        assert!(Network::with_hidden_layers(1, &[2, 1]).is_err());
    }

    #[test]
    fn zero_weights_give_half_activations() {
        let mut net = Network::new(&[2, 3, 2]).unwrap();
        let out = net.run(&[0.4, -0.9]).unwrap();
        assert_eq!(out, &[0.5, 0.5]);
    }

    #[test]
    fn run_matches_manual_computation() {
        let mut net = Network::new(&[2, 1]).unwrap();
        {
            let mut w = net.layer_weights_mut(1).unwrap();
            w.as_mut_slice().copy_from_slice(&[0.5, -1.5]);
        }
        net.layer_bias_mut(1).unwrap()[0] = 0.25;

        let out = net.run(&[2.0, 1.0]).unwrap()[0];
        let expected = sigmoid(0.25 + 0.5 * 2.0 - 1.5 * 1.0);
        assert!((out - expected).abs() < 1e-15);
        assert_eq!(net.layer_output(0).unwrap(), &[2.0, 1.0]);
    }

    #[test]
    fn outputs_stay_inside_sigmoid_range() {
        let mut net = random_network(&[4, 8, 8, 3], 11);
        let mut rng = StdRng::seed_from_u64(12);
        for _ in 0..100 {
            let input: Vec<f64> = (0..4).map(|_| rng.gen_range(-10.0..10.0)).collect();
            let out = net.run(&input).unwrap();
            assert!(out.iter().all(|&y| y > 0.0 && y < 1.0), "{out:?}");
        }
    }

    #[test]
    fn run_rejects_wrong_input_length_without_writing() {
        let mut net = random_network(&[2, 3, 1], 0);
        net.run(&[0.1, 0.2]).unwrap();
        let before = net.outputs().to_vec();

        assert!(matches!(
            net.run(&[0.1, 0.2, 0.3]),
            Err(Error::ShapeMismatch(_))
        ));
        assert_eq!(net.outputs(), before.as_slice());
    }

    #[test]
    fn layer_views_point_into_shared_buffers() {
        let mut net = Network::new(&[2, 3, 1]).unwrap();
        for (i, w) in net.weights_mut().iter_mut().enumerate() {
            *w = i as f64;
        }

        let w1 = net.layer_weights(1).unwrap();
        assert_eq!((w1.rows(), w1.cols()), (3, 2));
        assert_eq!(w1.as_slice(), &[0.0, 1.0, 2.0, 3.0, 4.0, 5.0]);

        let w2 = net.layer_weights(2).unwrap();
        assert_eq!((w2.rows(), w2.cols()), (1, 3));
        assert_eq!(w2.as_slice(), &[6.0, 7.0, 8.0]);

        assert!(net.layer_weights(0).is_none());
        assert!(net.layer_weights(3).is_none());
        assert_eq!(net.layer_bias(1).unwrap().len(), 3);
        assert!(net.layer_bias(3).is_none());
    }

    #[test]
    fn randomize_respects_bounds() {
        let net = random_network(&[3, 5, 2], 3);
        assert!(net.weights().iter().all(|&w| (-1.0..1.0).contains(&w)));
        assert!(net.biases().iter().all(|&b| (-0.5..0.5).contains(&b)));
    }

    #[test]
    fn randomize_rejects_overflowing_range_without_writing() {
        let mut net = random_network(&[3, 5, 2], 3);
        let weights = net.weights().to_vec();
        let biases = net.biases().to_vec();
        let mut rng = StdRng::seed_from_u64(4);

        let err = net.randomize_weights(&mut rng, -f64::MAX, f64::MAX);
        assert!(matches!(err, Err(Error::InvalidConfig(_))));
        let err = net.randomize_bias(&mut rng, f64::MIN, f64::MAX);
        assert!(matches!(err, Err(Error::InvalidConfig(_))));

        assert_eq!(net.weights(), weights.as_slice());
        assert_eq!(net.biases(), biases.as_slice());
    }

    #[test]
    fn clone_is_independent() {
        let mut a = random_network(&[2, 3, 1], 5);
        a.run(&[0.3, 0.6]).unwrap();
        let mut b = a.clone();

        assert_eq!(a.weights(), b.weights());
        assert_eq!(a.biases(), b.biases());
        assert_eq!(a.outputs(), b.outputs());

        b.weights_mut()[0] += 1.0;
        b.run(&[0.9, 0.1]).unwrap();
        assert_ne!(a.weights()[0], b.weights()[0]);
        assert_ne!(a.outputs(), b.outputs());
    }

    #[test]
    fn seeded_randomization_is_deterministic() {
        let mut a = random_network(&[2, 3, 1], 123);
        let mut b = random_network(&[2, 3, 1], 123);
        let out_a = a.run(&[0.3, -0.7]).unwrap().to_vec();
        let out_b = b.run(&[0.3, -0.7]).unwrap().to_vec();
        assert_eq!(out_a, out_b);
    }

    #[test]
    fn display_lists_structure_and_blocks() {
        let net = Network::new(&[2, 3, 1]).unwrap();
        let text = net.to_string();
        assert!(text.contains("Inputs: 2"));
        assert!(text.contains("Hidden Layer 1: 3 neurons"));
        assert!(text.contains("Outputs: 1"));
        assert!(text.contains("Layer 0-1:"));
        assert!(text.contains("[0.000, 0.000, 0.000]"));
    }
}
