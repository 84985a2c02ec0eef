//! Network persistence.
//!
//! Binary format (all little-endian):
//!
//! ```text
//! i32                      num_hidden_layers
//! i32                      total_neurons
//! i32                      total_weights
//! i32 x (hidden + 2)       neuron counts
//! f64 x total_weights      weights (transposed blocks, packed)
//! f64 x total_neurons      biases (input layer included)
//! ```
//!
//! The activation buffer and training scratch are not persisted.
//!
//! With the `serde` feature a versioned JSON document ([`SerializedNetwork`]) is also available.
//! As with the binary reader, loading validates everything before a `Network` is assembled.

use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{Error, Network, Result, Topology};

impl Network {
    /// Writes the binary representation to `w`.
    pub fn write_to<W: Write>(&self, mut w: W) -> Result<()> {
        let t = &self.topology;
        write_i32(&mut w, t.num_hidden_layers())?;
        write_i32(&mut w, t.total_neurons())?;
        write_i32(&mut w, t.total_weights())?;
        for &count in t.neuron_counts() {
            write_i32(&mut w, count)?;
        }
        for v in self.weights.iter().chain(self.biases.iter()) {
            w.write_all(&v.to_le_bytes())?;
        }
        w.flush()?;
        Ok(())
    }

    /// Saves the network to `path`, replacing any existing file.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let p = path.as_ref();
        let file = File::create(p)?;
        self.write_to(BufWriter::new(file))?;
        debug!(
            path = %p.display(),
            total_neurons = self.topology.total_neurons(),
            total_weights = self.topology.total_weights(),
            "saved network"
        );
        Ok(())
    }

    /// Reads a network written by [`Network::write_to`].
    pub fn read_from<R: Read>(mut r: R) -> Result<Self> {
        let num_hidden = read_i32(&mut r)?;
        let total_neurons = read_i32(&mut r)?;
        let total_weights = read_i32(&mut r)?;
        if num_hidden < 0 {
            return Err(Error::InvalidData(format!(
                "negative hidden layer count {num_hidden}"
            )));
        }
        if total_neurons <= 0 || total_weights <= 0 {
            return Err(Error::InvalidData(format!(
                "header totals must be positive, got neurons={total_neurons} weights={total_weights}"
            )));
        }

        let num_layers = num_hidden as usize + 2;
        // Grown as counts are read so a bogus header cannot trigger a huge allocation.
        let mut counts = Vec::new();
        for i in 0..num_layers {
            let count = read_i32(&mut r)?;
            if count <= 0 {
                return Err(Error::InvalidData(format!(
                    "layer {i} has non-positive neuron count {count}"
                )));
            }
            counts.push(count as usize);
        }

        let topology = Topology::new(&counts)
            .map_err(|e| Error::InvalidData(format!("stored topology is invalid: {e}")))?;
        if topology.total_neurons() != total_neurons as usize
            || topology.total_weights() != total_weights as usize
        {
            return Err(Error::InvalidData(format!(
                "header totals (neurons={total_neurons}, weights={total_weights}) disagree with \
                 counts {counts:?} (neurons={}, weights={})",
                topology.total_neurons(),
                topology.total_weights()
            )));
        }

        let weights = read_f64s(&mut r, topology.total_weights())?;
        let biases = read_f64s(&mut r, topology.total_neurons())?;
        Network::from_parts(topology, weights, biases)
    }

    /// Loads a network saved with [`Network::save`].
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let p = path.as_ref();
        let file = File::open(p)?;
        let net = Self::read_from(BufReader::new(file))?;
        debug!(
            path = %p.display(),
            neuron_counts = ?net.neuron_counts(),
            "loaded network"
        );
        Ok(net)
    }
}

fn write_i32<W: Write>(w: &mut W, value: usize) -> Result<()> {
    let v = i32::try_from(value)
        .map_err(|_| Error::InvalidData(format!("{value} does not fit the i32 file field")))?;
    w.write_all(&v.to_le_bytes())?;
    Ok(())
}

fn read_i32<R: Read>(r: &mut R) -> Result<i32> {
    let mut buf = [0u8; 4];
    r.read_exact(&mut buf)?;
    Ok(i32::from_le_bytes(buf))
}

// Values reserved per step while reading a payload.
const READ_CHUNK: usize = 1 << 16;

/// Reads `len` values, growing the buffer only as bytes actually arrive.
fn read_f64s<R: Read>(r: &mut R, len: usize) -> Result<Vec<f64>> {
    let mut out = Vec::new();
    let mut buf = [0u8; 8];
    while out.len() < len {
        let chunk = (len - out.len()).min(READ_CHUNK);
        out.try_reserve_exact(chunk)
            .map_err(|e| Error::AllocationFailure(format!("reading {len} values: {e}")))?;
        for _ in 0..chunk {
            r.read_exact(&mut buf)?;
            out.push(f64::from_le_bytes(buf));
        }
    }
    Ok(out)
}

pub const NETWORK_FORMAT_VERSION: u32 = 1;

/// Stable JSON document for a [`Network`].
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct SerializedNetwork {
    pub format_version: u32,
    pub neuron_counts: Vec<usize>,
    /// Transposed `(out, in)` blocks, packed in layer order.
    pub weights: Vec<f64>,
    pub biases: Vec<f64>,
}

impl SerializedNetwork {
    pub fn validate(&self) -> Result<()> {
        if self.format_version != NETWORK_FORMAT_VERSION {
            return Err(Error::InvalidData(format!(
                "unsupported network format_version {}; expected {}",
                self.format_version, NETWORK_FORMAT_VERSION
            )));
        }
        let topology = Topology::new(&self.neuron_counts)?;
        if self.weights.len() != topology.total_weights() {
            return Err(Error::InvalidData(format!(
                "weights length {} does not match total_weights {}",
                self.weights.len(),
                topology.total_weights()
            )));
        }
        if self.biases.len() != topology.total_neurons() {
            return Err(Error::InvalidData(format!(
                "biases length {} does not match total_neurons {}",
                self.biases.len(),
                topology.total_neurons()
            )));
        }
        if self.weights.iter().any(|v| !v.is_finite()) {
            return Err(Error::InvalidData(
                "weights must contain only finite values".to_owned(),
            ));
        }
        if self.biases.iter().any(|v| !v.is_finite()) {
            return Err(Error::InvalidData(
                "biases must contain only finite values".to_owned(),
            ));
        }
        Ok(())
    }
}

impl From<&Network> for SerializedNetwork {
    fn from(net: &Network) -> Self {
        Self {
            format_version: NETWORK_FORMAT_VERSION,
            neuron_counts: net.neuron_counts().to_vec(),
            weights: net.weights().to_vec(),
            biases: net.biases().to_vec(),
        }
    }
}

impl TryFrom<SerializedNetwork> for Network {
    type Error = Error;

    fn try_from(value: SerializedNetwork) -> std::result::Result<Self, Self::Error> {
        value.validate()?;
        let topology = Topology::new(&value.neuron_counts)?;
        Network::from_parts(topology, value.weights, value.biases)
    }
}

#[cfg(feature = "serde")]
impl Network {
    /// Serialize the network to a pretty-printed JSON string.
    pub fn to_json_string_pretty(&self) -> Result<String> {
        let ser = SerializedNetwork::from(self);
        serde_json::to_string_pretty(&ser)
            .map_err(|e| Error::InvalidData(format!("failed to serialize network: {e}")))
    }

    /// Serialize the network to a compact JSON string.
    pub fn to_json_string(&self) -> Result<String> {
        let ser = SerializedNetwork::from(self);
        serde_json::to_string(&ser)
            .map_err(|e| Error::InvalidData(format!("failed to serialize network: {e}")))
    }

    /// Parse a network from a JSON string.
    pub fn from_json_str(s: &str) -> Result<Self> {
        let ser: SerializedNetwork = serde_json::from_str(s)
            .map_err(|e| Error::InvalidData(format!("failed to parse network json: {e}")))?;
        ser.try_into()
    }

    /// Save the network to a JSON file (pretty-printed).
    pub fn save_json<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let s = self.to_json_string_pretty()?;
        let p = path.as_ref();
        std::fs::write(p, s)?;
        debug!(path = %p.display(), "saved network json");
        Ok(())
    }

    /// Load a network from a JSON file.
    pub fn load_json<P: AsRef<Path>>(path: P) -> Result<Self> {
        let p = path.as_ref();
        let s = std::fs::read_to_string(p)?;
        Self::from_json_str(&s)
    }
}
