//! Example accumulation and learning-rate scheduling around [`Network::train`].
//!
//! A simulation produces one `(input, desired)` pair per agent per tick. `TrainingSession`
//! collects them until `batch_size` are pending, then runs one batched training step and decays
//! the learning rate:
//!
//! `lr = max(lr * decay^m, lr_min)`
//!
//! Each step is one epoch.

use tracing::info;

use crate::config::TrainerConfig;
use crate::matrix::MatrixRef;
use crate::{Error, Network, Result};

#[derive(Debug, Clone)]
pub struct TrainingSession {
    network: Network,
    config: TrainerConfig,
    learning_rate: f64,
    epoch: u64,
    last_cost: Option<f64>,
    // Example-major, `pending * width` values each.
    pending_inputs: Vec<f64>,
    pending_targets: Vec<f64>,
}

impl TrainingSession {
    pub fn new(network: Network, config: TrainerConfig) -> Result<Self> {
        config.validate()?;
        let batch = config.batch_size;
        Ok(Self {
            pending_inputs: Vec::with_capacity(batch * network.input_dim()),
            pending_targets: Vec::with_capacity(batch * network.output_dim()),
            learning_rate: config.learning_rate,
            network,
            config,
            epoch: 0,
            last_cost: None,
        })
    }

    /// Queues one example; trains once `batch_size` examples are pending.
    ///
    /// Returns the batch cost when a training step ran.
    pub fn push(&mut self, input: &[f64], desired: &[f64]) -> Result<Option<f64>> {
        if input.len() != self.network.input_dim() {
            return Err(Error::ShapeMismatch(format!(
                "input len {} does not match network input width {}",
                input.len(),
                self.network.input_dim()
            )));
        }
        if desired.len() != self.network.output_dim() {
            return Err(Error::ShapeMismatch(format!(
                "desired len {} does not match network output width {}",
                desired.len(),
                self.network.output_dim()
            )));
        }

        self.pending_inputs.extend_from_slice(input);
        self.pending_targets.extend_from_slice(desired);
        if self.pending() >= self.config.batch_size {
            return self.step().map(Some);
        }
        Ok(None)
    }

    /// Trains on whatever is pending, even a partial batch.
    pub fn flush(&mut self) -> Result<Option<f64>> {
        if self.pending() == 0 {
            return Ok(None);
        }
        self.step().map(Some)
    }

    /// Inference on the owned network.
    pub fn predict(&mut self, input: &[f64]) -> Result<&[f64]> {
        self.network.run(input)
    }

    fn step(&mut self) -> Result<f64> {
        let m = self.pending();
        let inputs = MatrixRef::new(&self.pending_inputs, m, self.network.input_dim())?;
        let targets = MatrixRef::new(&self.pending_targets, m, self.network.output_dim())?;
        let cost = self.network.train(inputs, targets, self.learning_rate)?;

        self.pending_inputs.clear();
        self.pending_targets.clear();
        self.last_cost = Some(cost);

        if self.epoch % self.config.log_interval() == 0 {
            info!(
                epoch = self.epoch,
                cost,
                learning_rate = self.learning_rate,
                progress = self.progress(),
                "training progress"
            );
        }
        self.learning_rate = self.config.decayed(self.learning_rate, m);
        self.epoch += 1;
        Ok(cost)
    }

    /// Examples waiting for the next step.
    #[inline]
    pub fn pending(&self) -> usize {
        self.pending_inputs.len() / self.network.input_dim()
    }

    /// How far the learning rate has decayed from its initial value toward the floor, in `[0, 1]`.
    pub fn progress(&self) -> f64 {
        let start = self.config.learning_rate;
        let floor = self.config.learning_rate_min;
        if start <= floor {
            return 1.0;
        }
        (1.0 - (self.learning_rate / floor).ln() / (start / floor).ln()).clamp(0.0, 1.0)
    }

    #[inline]
    pub fn learning_rate(&self) -> f64 {
        self.learning_rate
    }

    /// Training steps run so far.
    #[inline]
    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    #[inline]
    pub fn last_cost(&self) -> Option<f64> {
        self.last_cost
    }

    #[inline]
    pub fn config(&self) -> &TrainerConfig {
        &self.config
    }

    #[inline]
    pub fn network(&self) -> &Network {
        &self.network
    }

    #[inline]
    pub fn network_mut(&mut self) -> &mut Network {
        &mut self.network
    }

    pub fn into_network(self) -> Network {
        self.network
    }
}
