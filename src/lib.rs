//! A flat-buffer feed-forward network engine for simulation agents.
//!
//! `antnet` is a from-scratch sigmoid MLP sized for agent policies: every ant in a foraging
//! simulation feeds its senses through a network once per tick, and the simulation trains the
//! network on the actions it wanted the ant to take.
//!
//! # Design goals
//!
//! - Flat storage: weights, biases and activations each live in one contiguous buffer, addressed
//!   through precomputed [`Topology`] offset tables.
//! - Batched training: [`Network::train`] runs a whole mini-batch through matrix kernels in
//!   neuron-major layout, reusing one grow-only scratch buffer.
//! - Clear contracts: shapes are validated at the API boundary and every failing call leaves the
//!   network untouched.
//!
//! # Data layout and shapes
//!
//! - Scalars are `f64`.
//! - Layer `l` (`1..=L`) is fed by a weight block stored transposed, `(n_l, n_{l-1})` row-major.
//! - Biases and activations keep one entry per neuron for every layer, input layer included.
//! - Batches are passed as [`MatrixRef`] views, one row per example:
//!   - inputs: `(m, input_dim)`
//!   - desired outputs: `(m, output_dim)`
//!
//! # MSRV
//!
//! This crate's minimum supported Rust version (MSRV) is specified in `Cargo.toml`.

//! # Quick start
//!
//! ```rust
//! use antnet::{Matrix, NetworkBuilder};
//!
//! # fn main() -> antnet::Result<()> {
//! let xs = Matrix::from_rows(&[
//!     vec![0.0, 0.0],
//!     vec![0.0, 1.0],
//!     vec![1.0, 0.0],
//!     vec![1.0, 1.0],
//! ])?;
//! let ys = Matrix::from_rows(&[vec![0.0], vec![1.0], vec![1.0], vec![0.0]])?;
//!
//! let mut net = NetworkBuilder::new(2)?
//!     .add_layer(4)?
//!     .add_layer(1)?
//!     .build_with_seed(0)?;
//!
//! let mut cost = f64::INFINITY;
//! for _ in 0..200 {
//!     cost = net.train(xs.view(), ys.view(), 2.0)?;
//! }
//! assert!(cost.is_finite());
//!
//! let y = net.run(&[1.0, 0.0])?;
//! assert_eq!(y.len(), 1);
//! Ok(())
//! # }
//! ```

//! # Per-tick training
//!
//! A simulation usually produces one example per agent per tick. [`TrainingSession`] collects
//! them, trains whenever a batch is full and decays the learning rate:
//!
//! ```rust
//! use antnet::{NetworkBuilder, TrainerConfig, TrainingSession};
//!
//! # fn main() -> antnet::Result<()> {
//! let net = NetworkBuilder::from_sizes(&[3, 8, 2])?.build_with_seed(7)?;
//! let config = TrainerConfig {
//!     batch_size: 2,
//!     ..TrainerConfig::default()
//! };
//! let mut session = TrainingSession::new(net, config)?;
//!
//! assert!(session.push(&[0.1, 0.5, 0.9], &[1.0, 0.0])?.is_none());
//! assert!(session.push(&[0.9, 0.5, 0.1], &[0.0, 1.0])?.is_some());
//! assert_eq!(session.epoch(), 1);
//! Ok(())
//! # }
//! ```
//!
//! [`BackgroundTrainer`] runs the same loop on a worker thread and hands finished snapshots back.

pub mod activation;
pub mod background;
pub mod builder;
pub mod config;
pub mod cost;
pub mod error;
pub mod init;
pub mod matrix;
pub mod network;
pub mod scratch;
pub mod serialize;
pub mod session;
pub mod topology;
mod trainer;

pub use background::BackgroundTrainer;
pub use builder::NetworkBuilder;
pub use config::{BackgroundConfig, TrainerConfig};
pub use error::{Error, Result};
pub use init::Init;
pub use matrix::{Matrix, MatrixMut, MatrixRef};
pub use network::Network;
pub use serialize::{NETWORK_FORMAT_VERSION, SerializedNetwork};
pub use session::TrainingSession;
pub use topology::{LayerShape, Topology};
