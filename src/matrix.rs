//! Dense row-major matrices and the GEMM kernels used by batched training.
//!
//! Kernels operate on views (`MatrixRef` / `MatrixMut`) so the trainer can point them at regions
//! of its flat scratch buffer and at per-layer blocks of the weight buffer without copying.
//!
//! Every kernel validates shapes up front and returns `Error::ShapeMismatch` without writing to
//! the output on mismatch.
//!
//! Backends:
//! - default: `i,k,j` loops; the innermost loop streams a contiguous row of the second operand
//!   (and of the output), which keeps the trainer cache friendly for small layers.
//! - optional: `matrixmultiply::dgemm` via the `matrixmultiply` feature.

use crate::{Error, Result};

/// Owned row-major matrix with shape `(rows, cols)`.
#[derive(Debug, Clone, PartialEq)]
pub struct Matrix {
    data: Vec<f64>,
    rows: usize,
    cols: usize,
}

/// Borrowed read-only row-major matrix view.
#[derive(Debug, Clone, Copy)]
pub struct MatrixRef<'a> {
    data: &'a [f64],
    rows: usize,
    cols: usize,
}

/// Borrowed mutable row-major matrix view.
#[derive(Debug)]
pub struct MatrixMut<'a> {
    data: &'a mut [f64],
    rows: usize,
    cols: usize,
}

fn check_len(len: usize, rows: usize, cols: usize) -> Result<()> {
    let expected = rows
        .checked_mul(cols)
        .ok_or_else(|| Error::ShapeMismatch(format!("matrix shape ({rows}, {cols}) overflows")))?;
    if len != expected {
        return Err(Error::ShapeMismatch(format!(
            "buffer length {len} does not match rows * cols ({rows} * {cols})"
        )));
    }
    Ok(())
}

impl Matrix {
    pub fn zeros(rows: usize, cols: usize) -> Self {
        Self {
            data: vec![0.0; rows * cols],
            rows,
            cols,
        }
    }

    /// Wrap a flat row-major buffer.
    pub fn from_flat(data: Vec<f64>, rows: usize, cols: usize) -> Result<Self> {
        check_len(data.len(), rows, cols)?;
        Ok(Self { data, rows, cols })
    }

    /// Build a matrix from per-row vectors (copies into contiguous storage).
    ///
    /// All rows must have the same non-zero length.
    pub fn from_rows(rows: &[Vec<f64>]) -> Result<Self> {
        let cols = rows.first().map(Vec::len).unwrap_or(0);
        if cols == 0 {
            return Err(Error::ShapeMismatch(
                "rows must not be empty and must have at least one column".to_owned(),
            ));
        }
        let mut data = Vec::with_capacity(rows.len() * cols);
        for (i, row) in rows.iter().enumerate() {
            if row.len() != cols {
                return Err(Error::ShapeMismatch(format!(
                    "row {i} has len {}, expected {cols}",
                    row.len()
                )));
            }
            data.extend_from_slice(row);
        }
        Ok(Self {
            data,
            rows: rows.len(),
            cols,
        })
    }

    #[inline]
    pub fn rows(&self) -> usize {
        self.rows
    }

    #[inline]
    pub fn cols(&self) -> usize {
        self.cols
    }

    #[inline]
    pub fn as_slice(&self) -> &[f64] {
        &self.data
    }

    #[inline]
    pub fn as_mut_slice(&mut self) -> &mut [f64] {
        &mut self.data
    }

    #[inline]
    pub fn into_vec(self) -> Vec<f64> {
        self.data
    }

    /// Returns `None` when out of bounds.
    #[inline]
    pub fn get(&self, row: usize, col: usize) -> Option<f64> {
        self.view().get(row, col)
    }

    #[inline]
    pub fn row(&self, row: usize) -> &[f64] {
        let start = row * self.cols;
        &self.data[start..start + self.cols]
    }

    #[inline]
    pub fn view(&self) -> MatrixRef<'_> {
        MatrixRef {
            data: &self.data,
            rows: self.rows,
            cols: self.cols,
        }
    }

    #[inline]
    pub fn view_mut(&mut self) -> MatrixMut<'_> {
        MatrixMut {
            data: &mut self.data,
            rows: self.rows,
            cols: self.cols,
        }
    }
}

impl<'a> MatrixRef<'a> {
    pub fn new(data: &'a [f64], rows: usize, cols: usize) -> Result<Self> {
        check_len(data.len(), rows, cols)?;
        Ok(Self { data, rows, cols })
    }

    /// Caller guarantees `data.len() == rows * cols`.
    #[inline]
    pub(crate) fn from_parts(data: &'a [f64], rows: usize, cols: usize) -> Self {
        debug_assert_eq!(data.len(), rows * cols);
        Self { data, rows, cols }
    }

    #[inline]
    pub fn rows(&self) -> usize {
        self.rows
    }

    #[inline]
    pub fn cols(&self) -> usize {
        self.cols
    }

    #[inline]
    pub fn as_slice(&self) -> &'a [f64] {
        self.data
    }

    #[inline]
    pub fn get(&self, row: usize, col: usize) -> Option<f64> {
        if row >= self.rows || col >= self.cols {
            return None;
        }
        Some(self.data[row * self.cols + col])
    }

    #[inline]
    pub fn row(&self, row: usize) -> &'a [f64] {
        let start = row * self.cols;
        &self.data[start..start + self.cols]
    }
}

impl<'a> MatrixMut<'a> {
    pub fn new(data: &'a mut [f64], rows: usize, cols: usize) -> Result<Self> {
        check_len(data.len(), rows, cols)?;
        Ok(Self { data, rows, cols })
    }

    #[inline]
    pub(crate) fn from_parts(data: &'a mut [f64], rows: usize, cols: usize) -> Self {
        debug_assert_eq!(data.len(), rows * cols);
        Self { data, rows, cols }
    }

    #[inline]
    pub fn rows(&self) -> usize {
        self.rows
    }

    #[inline]
    pub fn cols(&self) -> usize {
        self.cols
    }

    #[inline]
    pub fn as_slice(&self) -> &[f64] {
        &*self.data
    }

    #[inline]
    pub fn as_mut_slice(&mut self) -> &mut [f64] {
        &mut *self.data
    }

    #[inline]
    pub fn as_view(&self) -> MatrixRef<'_> {
        MatrixRef {
            data: &*self.data,
            rows: self.rows,
            cols: self.cols,
        }
    }

    #[inline]
    pub fn row_mut(&mut self, row: usize) -> &mut [f64] {
        let start = row * self.cols;
        &mut self.data[start..start + self.cols]
    }
}

/// `out = a * b`.
///
/// Shapes: `a (n, k)`, `b (k, p)`, `out (n, p)`.
pub fn multiply(a: MatrixRef<'_>, b: MatrixRef<'_>, out: &mut MatrixMut<'_>) -> Result<()> {
    check_product(a.rows, a.cols, b.rows, b.cols, out)?;
    gemm_nn(a, b, out, false);
    Ok(())
}

/// `out += a * b`.
///
/// `out` must be zeroed or pre-seeded by the caller (the trainer seeds it with biases).
pub fn multiply_accumulate(
    a: MatrixRef<'_>,
    b: MatrixRef<'_>,
    out: &mut MatrixMut<'_>,
) -> Result<()> {
    check_product(a.rows, a.cols, b.rows, b.cols, out)?;
    gemm_nn(a, b, out, true);
    Ok(())
}

/// `out = aᵗ * b` (or `out += aᵗ * b` when `zero_init` is false).
///
/// Shapes: `a (k, n)`, `b (k, p)`, `out (n, p)`.
pub fn multiply_transpose_a(
    a: MatrixRef<'_>,
    b: MatrixRef<'_>,
    out: &mut MatrixMut<'_>,
    zero_init: bool,
) -> Result<()> {
    check_product(a.cols, a.rows, b.rows, b.cols, out)?;
    gemm_tn(a, b, out, !zero_init);
    Ok(())
}

/// `out = a * bᵗ` (or `out += a * bᵗ` when `zero_init` is false).
///
/// Shapes: `a (n, k)`, `b (p, k)`, `out (n, p)`.
pub fn multiply_transpose_b(
    a: MatrixRef<'_>,
    b: MatrixRef<'_>,
    out: &mut MatrixMut<'_>,
    zero_init: bool,
) -> Result<()> {
    check_product(a.rows, a.cols, b.cols, b.rows, out)?;
    gemm_nt(a, b, out, !zero_init);
    Ok(())
}

/// Validates `(n, k) x (k2, p) -> out` where the operands are already expressed in their
/// effective (post-transpose) shapes.
fn check_product(n: usize, k: usize, k2: usize, p: usize, out: &MatrixMut<'_>) -> Result<()> {
    if k != k2 {
        return Err(Error::ShapeMismatch(format!(
            "inner dimensions differ: ({n}, {k}) x ({k2}, {p})"
        )));
    }
    if out.rows != n || out.cols != p {
        return Err(Error::ShapeMismatch(format!(
            "output shape ({}, {}) does not match product shape ({n}, {p})",
            out.rows, out.cols
        )));
    }
    Ok(())
}

#[cfg(not(feature = "matrixmultiply"))]
fn gemm_nn(a: MatrixRef<'_>, b: MatrixRef<'_>, out: &mut MatrixMut<'_>, accumulate: bool) {
    if !accumulate {
        out.data.fill(0.0);
    }
    let p = b.cols;
    for i in 0..a.rows {
        let a_i = a.row(i);
        let out_i = &mut out.data[i * p..(i + 1) * p];
        for (k, &a_ik) in a_i.iter().enumerate() {
            let b_k = b.row(k);
            for (o, &bv) in out_i.iter_mut().zip(b_k) {
                *o = a_ik.mul_add(bv, *o);
            }
        }
    }
}

#[cfg(not(feature = "matrixmultiply"))]
fn gemm_tn(a: MatrixRef<'_>, b: MatrixRef<'_>, out: &mut MatrixMut<'_>, accumulate: bool) {
    if !accumulate {
        out.data.fill(0.0);
    }
    let p = b.cols;
    // Walk the shared dimension first so both `a` and `b` are read row by row.
    for k in 0..a.rows {
        let a_k = a.row(k);
        let b_k = b.row(k);
        for (i, &a_ki) in a_k.iter().enumerate() {
            let out_i = &mut out.data[i * p..(i + 1) * p];
            for (o, &bv) in out_i.iter_mut().zip(b_k) {
                *o = a_ki.mul_add(bv, *o);
            }
        }
    }
}

#[cfg(not(feature = "matrixmultiply"))]
fn gemm_nt(a: MatrixRef<'_>, b: MatrixRef<'_>, out: &mut MatrixMut<'_>, accumulate: bool) {
    let p = b.rows;
    for i in 0..a.rows {
        let a_i = a.row(i);
        let out_i = &mut out.data[i * p..(i + 1) * p];
        for (j, o) in out_i.iter_mut().enumerate() {
            let b_j = b.row(j);
            let mut sum = 0.0_f64;
            for (&av, &bv) in a_i.iter().zip(b_j) {
                sum = av.mul_add(bv, sum);
            }
            *o = if accumulate { *o + sum } else { sum };
        }
    }
}

#[cfg(feature = "matrixmultiply")]
fn gemm_nn(a: MatrixRef<'_>, b: MatrixRef<'_>, out: &mut MatrixMut<'_>, accumulate: bool) {
    dgemm(
        a.rows, a.cols, b.cols, a.data, a.cols, 1, b.data, b.cols, 1, out, accumulate,
    );
}

#[cfg(feature = "matrixmultiply")]
fn gemm_tn(a: MatrixRef<'_>, b: MatrixRef<'_>, out: &mut MatrixMut<'_>, accumulate: bool) {
    // aᵗ has shape (a.cols, a.rows): row stride 1, column stride a.cols.
    dgemm(
        a.cols, a.rows, b.cols, a.data, 1, a.cols, b.data, b.cols, 1, out, accumulate,
    );
}

#[cfg(feature = "matrixmultiply")]
fn gemm_nt(a: MatrixRef<'_>, b: MatrixRef<'_>, out: &mut MatrixMut<'_>, accumulate: bool) {
    // bᵗ has shape (b.cols, b.rows): row stride 1, column stride b.cols.
    dgemm(
        a.rows, a.cols, b.rows, a.data, a.cols, 1, b.data, 1, b.cols, out, accumulate,
    );
}

#[cfg(feature = "matrixmultiply")]
#[allow(clippy::too_many_arguments)]
#[inline]
fn dgemm(
    m: usize,
    k: usize,
    n: usize,
    a: &[f64],
    rsa: usize,
    csa: usize,
    b: &[f64],
    rsb: usize,
    csb: usize,
    out: &mut MatrixMut<'_>,
    accumulate: bool,
) {
    if m == 0 || n == 0 {
        return;
    }
    if k == 0 {
        if !accumulate {
            out.data.fill(0.0);
        }
        return;
    }
    let beta = if accumulate { 1.0 } else { 0.0 };

    // Shapes and buffer lengths are validated by the public kernels.
    unsafe {
        matrixmultiply::dgemm(
            m,
            k,
            n,
            1.0,
            a.as_ptr(),
            rsa as isize,
            csa as isize,
            b.as_ptr(),
            rsb as isize,
            csb as isize,
            beta,
            out.data.as_mut_ptr(),
            out.cols as isize,
            1,
        );
    }
}
