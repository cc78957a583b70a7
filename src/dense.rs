use anyhow::{bail, Result};
use faer::Mat;

/// Builds an `n x 1` matrix from a slice.
pub(crate) fn column(v: &[f64]) -> Mat<f64> {
    let mut m = Mat::zeros(v.len(), 1);
    for (i, &vi) in v.iter().enumerate() {
        m.write(i, 0, vi);
    }
    m
}

pub(crate) fn col_to_vec(m: &Mat<f64>, col: usize) -> Vec<f64> {
    (0..m.nrows()).map(|i| m.read(i, col)).collect()
}

/// Overwrites every entry with zero.
pub(crate) fn zero(m: &mut Mat<f64>) {
    for j in 0..m.ncols() {
        for i in 0..m.nrows() {
            m.write(i, j, 0.0);
        }
    }
}

pub(crate) fn copy_into(src: &Mat<f64>, dst: &mut Mat<f64>) {
    debug_assert_eq!((src.nrows(), src.ncols()), (dst.nrows(), dst.ncols()));
    for j in 0..src.ncols() {
        for i in 0..src.nrows() {
            dst.write(i, j, src.read(i, j));
        }
    }
}

/// Fails on the first NaN or infinite entry.
pub(crate) fn ensure_finite(m: &Mat<f64>) -> Result<()> {
    for j in 0..m.ncols() {
        for i in 0..m.nrows() {
            if !m.read(i, j).is_finite() {
                bail!("non-finite solution at row {}, column {}", i, j);
            }
        }
    }
    Ok(())
}

/// Returns the row-wise maximum and minimum over all columns.
pub(crate) fn row_max_min(m: &Mat<f64>, row: usize) -> (f64, f64) {
    let mut hi = f64::NEG_INFINITY;
    let mut lo = f64::INFINITY;
    for j in 0..m.ncols() {
        let v = m.read(row, j);
        hi = hi.max(v);
        lo = lo.min(v);
    }
    (hi, lo)
}
