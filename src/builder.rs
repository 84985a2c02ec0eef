//! Network builder.
//!
//! `NetworkBuilder` is the recommended way to create a trained-from-scratch network: it makes the
//! layer widths explicit and applies a weight/bias initializer in one step.
//!
//! Defaults:
//! - weights: [`Init::Glorot`] with the network-wide bound `glorot_bound(input_dim, output_dim)`
//! - biases: uniform in `[-0.01, 0.01)`

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::init::{self, Init};
use crate::{Error, Network, Result, Topology};

const DEFAULT_BIAS_RANGE: (f64, f64) = (-0.01, 0.01);

#[derive(Debug, Clone)]
/// Builder for a [`Network`].
///
/// Example:
///
/// ```rust
/// use antnet::{Init, NetworkBuilder};
///
/// # fn main() -> antnet::Result<()> {
/// let net = NetworkBuilder::new(4)?
///     .add_layer(8)?
///     .add_layer(2)?
///     .weight_init(Init::Uniform { min: -0.5, max: 0.5 })
///     .build_with_seed(0)?;
/// assert_eq!(net.neuron_counts(), &[4, 8, 2]);
/// # Ok(())
/// # }
/// ```
pub struct NetworkBuilder {
    input_dim: usize,
    layers: Vec<usize>,
    weight_init: Init,
    bias_range: (f64, f64),
}

impl NetworkBuilder {
    /// Start building a network that accepts inputs of length `input_dim`.
    pub fn new(input_dim: usize) -> Result<Self> {
        if input_dim == 0 {
            return Err(Error::InvalidTopology("input_dim must be > 0".to_owned()));
        }
        Ok(Self {
            input_dim,
            layers: Vec::new(),
            weight_init: Init::default(),
            bias_range: DEFAULT_BIAS_RANGE,
        })
    }

    /// Convenience constructor from the full layer-size sequence (input and output included).
    pub fn from_sizes(sizes: &[usize]) -> Result<Self> {
        let Some((&input_dim, rest)) = sizes.split_first() else {
            return Err(Error::InvalidTopology(
                "sizes must include input and output widths".to_owned(),
            ));
        };
        let mut b = Self::new(input_dim)?;
        for &width in rest {
            b = b.add_layer(width)?;
        }
        Ok(b)
    }

    /// Add a layer of `width` sigmoid neurons. The last layer added is the output layer.
    pub fn add_layer(mut self, width: usize) -> Result<Self> {
        if width == 0 {
            return Err(Error::InvalidTopology("layer width must be > 0".to_owned()));
        }
        self.layers.push(width);
        Ok(self)
    }

    pub fn weight_init(mut self, init: Init) -> Self {
        self.weight_init = init;
        self
    }

    /// Uniform bias range `[min, max)`; `min == max` sets every bias to that constant.
    pub fn bias_range(mut self, min: f64, max: f64) -> Self {
        self.bias_range = (min, max);
        self
    }

    /// Build using a deterministic seed.
    pub fn build_with_seed(self, seed: u64) -> Result<Network> {
        let mut rng = StdRng::seed_from_u64(seed);
        self.build_with_rng(&mut rng)
    }

    /// Build using the provided RNG.
    pub fn build_with_rng<R: Rng + ?Sized>(self, rng: &mut R) -> Result<Network> {
        if self.layers.is_empty() {
            return Err(Error::InvalidTopology(
                "network must have at least one layer after the input".to_owned(),
            ));
        }
        let (bias_min, bias_max) = self.bias_range;
        init::validate_range(bias_min, bias_max)?;
        if let Init::Uniform { min, max } = self.weight_init {
            init::validate_range(min, max)?;
        }

        let mut counts = Vec::with_capacity(self.layers.len() + 1);
        counts.push(self.input_dim);
        counts.extend_from_slice(&self.layers);
        let mut net = Network::from_topology(Topology::new(&counts)?)?;

        match self.weight_init {
            Init::Zeros => {}
            Init::Uniform { min, max } => net.randomize_weights(rng, min, max)?,
            Init::Glorot => {
                let bound = init::glorot_bound(net.input_dim(), net.output_dim());
                net.randomize_weights(rng, -bound, bound)?;
            }
        }
        net.randomize_bias(rng, bias_min, bias_max)?;
        Ok(net)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_empty_or_zero_widths() {
        assert!(NetworkBuilder::new(0).is_err());
        assert!(NetworkBuilder::new(2).unwrap().add_layer(0).is_err());
        assert!(NetworkBuilder::new(2).unwrap().build_with_seed(0).is_err());
        assert!(NetworkBuilder::from_sizes(&[]).is_err());
        assert!(NetworkBuilder::from_sizes(&[3]).unwrap().build_with_seed(0).is_err());
    }

    #[test]
    fn glorot_weights_respect_network_wide_bound() {
        let net = NetworkBuilder::from_sizes(&[10, 30, 6])
            .unwrap()
            .build_with_seed(3)
            .unwrap();
        let bound = init::glorot_bound(10, 6);
        assert!(net.weights().iter().all(|w| w.abs() <= bound));
        assert!(net.weights().iter().any(|&w| w != 0.0));
        assert!(net.biases().iter().all(|b| b.abs() <= 0.01));
    }

    #[test]
    fn zeros_and_constant_bias() {
        let net = NetworkBuilder::new(2)
            .unwrap()
            .add_layer(3)
            .unwrap()
            .weight_init(Init::Zeros)
            .bias_range(0.25, 0.25)
            .build_with_seed(0)
            .unwrap();
        assert!(net.weights().iter().all(|&w| w == 0.0));
        assert!(net.biases().iter().all(|&b| b == 0.25));
    }

    #[test]
    fn invalid_ranges_are_config_errors() {
        let err = NetworkBuilder::new(2)
            .unwrap()
            .add_layer(1)
            .unwrap()
            .bias_range(1.0, -1.0)
            .build_with_seed(0)
            .unwrap_err();
        assert!(matches!(err, Error::InvalidConfig(_)));

        let err = NetworkBuilder::new(2)
            .unwrap()
            .add_layer(1)
            .unwrap()
            .weight_init(Init::Uniform {
                min: f64::NAN,
                max: 1.0,
            })
            .build_with_seed(0)
            .unwrap_err();
        assert!(matches!(err, Error::InvalidConfig(_)));
    }

    #[test]
    fn same_seed_builds_same_network() {
        let b = NetworkBuilder::from_sizes(&[3, 4, 2]).unwrap();
        let a = b.clone().build_with_seed(11).unwrap();
        let c = b.build_with_seed(11).unwrap();
        assert_eq!(a.weights(), c.weights());
        assert_eq!(a.biases(), c.biases());
    }
}
