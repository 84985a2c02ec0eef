//! Mini-batch gradient descent.
//!
//! `Network::train` works on a batch of `m` examples at once. Inputs and targets arrive
//! example-major (`(m, width)`, one row per example) and are transposed into neuron-major
//! scratch blocks (`(width, m)`), so every kernel inner loop walks one neuron across the whole
//! batch.
//!
//! One call:
//! 1. forward: `A_l = sigmoid(b_l + W_l · A_{l-1})` for every layer,
//! 2. cost + output delta: `delta_L = (A_L - Y) / m ⊙ A_L (1 - A_L)`,
//! 3. backward, from `L` down to 1:
//!    `dW_l = delta_l · A_{l-1}ᵗ`, `delta_{l-1} = (W_lᵗ · delta_l) ⊙ A_{l-1} (1 - A_{l-1})`,
//!    `b_l -= lr · Σ_batch delta_l`,
//! 4. `W -= lr · dW` for all layers at once, so backprop only ever sees pre-update weights.

use crate::activation::{sigmoid_grad_from_output, sigmoid_in_place};
use crate::matrix::{self, MatrixMut, MatrixRef};
use crate::scratch::ScratchRegions;
use crate::{Error, Network, Result, cost};

impl Network {
    /// Runs one gradient-descent step on a batch and returns the batch cost (before the update).
    ///
    /// Shapes:
    /// - `inputs`: `(m, input_dim)`
    /// - `desired`: `(m, output_dim)`
    ///
    /// On any validation error nothing is mutated.
    pub fn train(
        &mut self,
        inputs: MatrixRef<'_>,
        desired: MatrixRef<'_>,
        learning_rate: f64,
    ) -> Result<f64> {
        self.validate_batch(inputs, desired, learning_rate)?;
        let m = inputs.rows();

        let Network {
            topology,
            weights,
            biases,
            outputs,
            scratch,
        } = self;
        let ScratchRegions {
            targets,
            activations,
            deltas,
            weight_grads,
        } = scratch.regions(topology, m)?;
        let last = topology.num_weight_layers();

        transpose_into(inputs, &mut activations[..topology.input_width() * m]);
        transpose_into(desired, targets);

        // Forward.
        for layer in 1..=last {
            let shape = topology.shape(layer);
            let start = topology.offset(layer) * m;
            let prev_start = topology.offset(layer - 1) * m;

            let (before, after) = activations.split_at_mut(start);
            let prev = MatrixRef::from_parts(&before[prev_start..], shape.cols, m);
            let current = &mut after[..shape.rows * m];

            let bias = &biases[topology.offset(layer)..topology.offset(layer) + shape.rows];
            for (row, &b) in current.chunks_exact_mut(m).zip(bias) {
                row.fill(b);
            }

            let w = MatrixRef::from_parts(&weights[shape.range()], shape.rows, shape.cols);
            let mut z = MatrixMut::from_parts(current, shape.rows, m);
            matrix::multiply_accumulate(w, prev, &mut z)?;
            sigmoid_in_place(z.as_mut_slice());
        }

        let out_start = topology.offset(last) * m;
        let out_end = out_start + topology.output_width() * m;
        let cost = cost::output_delta(
            &activations[out_start..out_end],
            targets,
            m,
            &mut deltas[out_start..out_end],
        );

        // Backward.
        for layer in (1..=last).rev() {
            let shape = topology.shape(layer);
            let start = topology.offset(layer) * m;
            let end = start + shape.rows * m;
            let prev_start = topology.offset(layer - 1) * m;

            {
                let delta = MatrixRef::from_parts(&deltas[start..end], shape.rows, m);
                let prev_act = MatrixRef::from_parts(&activations[prev_start..start], shape.cols, m);
                let mut grad =
                    MatrixMut::from_parts(&mut weight_grads[shape.range()], shape.rows, shape.cols);
                matrix::multiply_transpose_b(delta, prev_act, &mut grad, true)?;
            }

            if layer > 1 {
                let (lower, upper) = deltas.split_at_mut(start);
                let delta = MatrixRef::from_parts(&upper[..shape.rows * m], shape.rows, m);
                let w = MatrixRef::from_parts(&weights[shape.range()], shape.rows, shape.cols);
                let mut prev_delta = MatrixMut::from_parts(&mut lower[prev_start..], shape.cols, m);
                matrix::multiply_transpose_a(w, delta, &mut prev_delta, true)?;

                for (d, &a) in prev_delta
                    .as_mut_slice()
                    .iter_mut()
                    .zip(&activations[prev_start..start])
                {
                    *d *= sigmoid_grad_from_output(a);
                }
            }

            let bias_start = topology.offset(layer);
            let bias = &mut biases[bias_start..bias_start + shape.rows];
            for (b, row) in bias.iter_mut().zip(deltas[start..end].chunks_exact(m)) {
                let grad: f64 = row.iter().sum();
                *b -= learning_rate * grad;
            }
        }

        for (w, &g) in weights.iter_mut().zip(weight_grads.iter()) {
            *w -= learning_rate * g;
        }

        // Leave the activation buffer holding the last example of the batch.
        for layer in 0..=last {
            let off = topology.offset(layer);
            let dst = &mut outputs[off..off + topology.width(layer)];
            for (k, o) in dst.iter_mut().enumerate() {
                *o = activations[(off + k) * m + m - 1];
            }
        }

        Ok(cost)
    }

    /// [`Network::train`] over flat row-major buffers; `m` is inferred from `inputs`.
    pub fn train_flat(&mut self, inputs: &[f64], desired: &[f64], learning_rate: f64) -> Result<f64> {
        let in_dim = self.input_dim();
        let out_dim = self.output_dim();
        if inputs.len() % in_dim != 0 {
            return Err(Error::ShapeMismatch(format!(
                "inputs length {} is not a multiple of input width {in_dim}",
                inputs.len()
            )));
        }
        let m = inputs.len() / in_dim;
        let inputs = MatrixRef::new(inputs, m, in_dim)?;
        let desired = MatrixRef::new(desired, m, out_dim)?;
        self.train(inputs, desired, learning_rate)
    }

    /// Single-example step (`m = 1`).
    pub fn train_one(&mut self, input: &[f64], desired: &[f64], learning_rate: f64) -> Result<f64> {
        let inputs = MatrixRef::new(input, 1, input.len())?;
        let desired = MatrixRef::new(desired, 1, desired.len())?;
        self.train(inputs, desired, learning_rate)
    }

    /// Batch cost without updating parameters (runs one forward pass per example).
    pub fn evaluate(&mut self, inputs: MatrixRef<'_>, desired: MatrixRef<'_>) -> Result<f64> {
        self.validate_shapes(inputs, desired)?;
        let m = inputs.rows();
        let mut total = 0.0_f64;
        for e in 0..m {
            let pred = self.run(inputs.row(e))?;
            total += cost::half_squared_error(pred, desired.row(e));
        }
        Ok(total / m as f64)
    }

    fn validate_batch(
        &self,
        inputs: MatrixRef<'_>,
        desired: MatrixRef<'_>,
        learning_rate: f64,
    ) -> Result<()> {
        self.validate_shapes(inputs, desired)?;
        if !(learning_rate.is_finite() && learning_rate > 0.0) {
            return Err(Error::InvalidConfig(format!(
                "learning rate must be finite and > 0, got {learning_rate}"
            )));
        }
        Ok(())
    }

    fn validate_shapes(&self, inputs: MatrixRef<'_>, desired: MatrixRef<'_>) -> Result<()> {
        if inputs.cols() != self.input_dim() {
            return Err(Error::ShapeMismatch(format!(
                "inputs have {} columns, network input width is {}",
                inputs.cols(),
                self.input_dim()
            )));
        }
        if desired.cols() != self.output_dim() {
            return Err(Error::ShapeMismatch(format!(
                "desired outputs have {} columns, network output width is {}",
                desired.cols(),
                self.output_dim()
            )));
        }
        if inputs.rows() != desired.rows() {
            return Err(Error::ShapeMismatch(format!(
                "inputs/desired row mismatch: {} vs {}",
                inputs.rows(),
                desired.rows()
            )));
        }
        if inputs.rows() == 0 {
            return Err(Error::ShapeMismatch("batch must not be empty".to_owned()));
        }
        Ok(())
    }
}

/// Writes `src` (`(m, n)`) into `dst` as `(n, m)`.
fn transpose_into(src: MatrixRef<'_>, dst: &mut [f64]) {
    let (m, n) = (src.rows(), src.cols());
    debug_assert_eq!(dst.len(), m * n);
    for e in 0..m {
        for (j, &v) in src.row(e).iter().enumerate() {
            dst[j * m + e] = v;
        }
    }
}
