//! Activation function.
//!
//! Every layer computes `z = W x + b` and then applies the logistic sigmoid element-wise.
//! Activations are cached post-sigmoid, so backprop expresses the derivative in terms of the
//! cached output `y` instead of keeping a separate `z` buffer.

/// Logistic sigmoid `1 / (1 + e^-x)`.
///
/// Mathematically the result lies in `(0, 1)`, but `f64` rounding saturates it: it is exactly
/// `1.0` for `x` above about 37 and exactly `0.0` once `e^x` underflows (`x` below about -745).
/// Callers should treat the range as `[0, 1]`.
#[inline]
pub fn sigmoid(x: f64) -> f64 {
    // Branch on the sign so `exp` never sees a large positive argument.
    if x >= 0.0 {
        let z = (-x).exp();
        1.0 / (1.0 + z)
    } else {
        let z = x.exp();
        z / (1.0 + z)
    }
}

/// Derivative of the sigmoid expressed through its output: `y * (1 - y)`.
#[inline]
pub fn sigmoid_grad_from_output(y: f64) -> f64 {
    y * (1.0 - y)
}

#[inline]
pub(crate) fn sigmoid_in_place(values: &mut [f64]) {
    for v in values {
        *v = sigmoid(*v);
    }
}
