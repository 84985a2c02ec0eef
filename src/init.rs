//! Parameter initialization and input encoding helpers.

use rand::Rng;
use rand::distributions::{Distribution, Uniform};

use crate::{Error, Result};

/// Weight initialization scheme used by [`crate::NetworkBuilder`].
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum Init {
    /// Leave every weight at zero.
    Zeros,
    /// Uniform draw in `[min, max)`.
    Uniform { min: f64, max: f64 },
    /// Uniform draw in `[-b, b)` with `b = glorot_bound(input_width, output_width)`.
    #[default]
    Glorot,
}

/// Glorot/Xavier uniform bound: `sqrt(6 / (fan_in + fan_out))`.
#[inline]
pub fn glorot_bound(fan_in: usize, fan_out: usize) -> f64 {
    (6.0 / (fan_in + fan_out) as f64).sqrt()
}

/// Checks that `[min, max)` is a usable sampling range.
pub fn validate_range(min: f64, max: f64) -> Result<()> {
    if !(min.is_finite() && max.is_finite()) {
        return Err(Error::InvalidConfig(format!(
            "range bounds must be finite, got [{min}, {max})"
        )));
    }
    if min > max {
        return Err(Error::InvalidConfig(format!(
            "range min {min} is greater than max {max}"
        )));
    }
    if !(max - min).is_finite() {
        return Err(Error::InvalidConfig(format!(
            "range width of [{min}, {max}) overflows"
        )));
    }
    Ok(())
}

/// Fills `values` with uniform draws in `[min, max)`; `min == max` fills the constant.
pub fn fill_uniform<R: Rng + ?Sized>(
    values: &mut [f64],
    rng: &mut R,
    min: f64,
    max: f64,
) -> Result<()> {
    validate_range(min, max)?;
    if min == max {
        values.fill(min);
        return Ok(());
    }
    let dist = Uniform::new(min, max);
    for v in values {
        *v = dist.sample(rng);
    }
    Ok(())
}

/// Maps a value in `[-1, 1]` to `[0, 1]`.
#[inline]
pub fn encode(v: f64) -> f64 {
    (v + 1.0) * 0.5
}

/// Inverse of [`encode`].
#[inline]
pub fn decode(v: f64) -> f64 {
    v * 2.0 - 1.0
}
