use crate::dense::ensure_finite;
use crate::traits::LinearSolver;
use anyhow::{anyhow, bail, Context, Result};
use faer::prelude::*;
use faer::solvers::PartialPivLu;
use faer::sparse::linalg::solvers::Lu;
use faer::sparse::SparseColMat;
use faer::Mat;

/// Largest accepted `|A x - r| / |r|` of a sparse solve.
const RESIDUAL_TOL: f64 = 1e-6;

/// Sparse LU factors of a reduced admittance matrix.
///
/// Cholesky is not used since negative branch reactances make the
/// matrix indefinite.
pub struct SparseLu {
    dim: usize,
    a: SparseColMat<usize, f64>,
    lu: Option<Lu<usize, f64>>,
}

impl SparseLu {
    /// Factorizes `a`. Structural singularity is reported here, numerical
    /// singularity when a solve leaves non-finite values or a large
    /// residual.
    pub fn factor(a: &SparseColMat<usize, f64>) -> Result<Self> {
        let dim = a.nrows();
        if dim != a.ncols() {
            bail!("matrix must be square ({} x {})", a.nrows(), a.ncols());
        }
        if dim == 0 {
            return Ok(Self {
                dim,
                a: a.to_owned()?,
                lu: None,
            });
        }
        let lu = a
            .as_ref()
            .sp_lu()
            .map_err(|err| anyhow!("singular admittance matrix: {:?}", err))?;
        Ok(Self {
            dim,
            a: a.to_owned()?,
            lu: Some(lu),
        })
    }

    /// Fails if some column of `x` does not solve `A x = r`. A numerically
    /// singular `A` factorizes without error but leaves a large residual.
    fn check_residual(&self, r: &Mat<f64>, x: &Mat<f64>) -> Result<()> {
        let a = self.a.as_ref();
        let mut ax = vec![0.0; self.dim];
        for col in 0..x.ncols() {
            ax.iter_mut().for_each(|v| *v = 0.0);
            for j in 0..self.dim {
                let xj = x.read(j, col);
                if xj == 0.0 {
                    continue;
                }
                for (i, &v) in a.row_indices_of_col(j).zip(a.values_of_col(j)) {
                    ax[i] += v * xj;
                }
            }

            let mut r_norm = 0.0_f64;
            let mut res = 0.0_f64;
            for (i, axi) in ax.iter().enumerate() {
                let ri = r.read(i, col);
                r_norm = r_norm.max(ri.abs());
                res = res.max((axi - ri).abs());
            }
            if res > RESIDUAL_TOL * r_norm {
                bail!(
                    "singular admittance matrix: relative residual {:e} in column {}",
                    res / r_norm,
                    col
                );
            }
        }
        Ok(())
    }
}

impl LinearSolver for SparseLu {
    fn dim(&self) -> usize {
        self.dim
    }

    fn solve(&self, rhs: &mut Mat<f64>) -> Result<()> {
        if rhs.nrows() != self.dim {
            bail!(
                "right hand side has {} rows, expected {}",
                rhs.nrows(),
                self.dim
            );
        }
        let lu = match &self.lu {
            Some(lu) if rhs.ncols() > 0 => lu,
            _ => return Ok(()),
        };
        let r = rhs.clone();
        lu.solve_in_place(rhs.as_mut());
        ensure_finite(rhs).context("singular admittance matrix")?;
        self.check_residual(&r, rhs)
    }
}

/// Dense LU factors of a small compensation matrix.
pub struct DenseLu {
    dim: usize,
    lu: PartialPivLu<f64>,
}

impl DenseLu {
    /// Factorizes `a`. Fails when the smallest pivot magnitude is at most
    /// `pivot_tol` times the largest one.
    pub fn factor(a: &Mat<f64>, pivot_tol: f64) -> Result<Self> {
        if a.nrows() != a.ncols() {
            bail!("matrix must be square ({} x {})", a.nrows(), a.ncols());
        }
        let dim = a.nrows();
        let lu = PartialPivLu::new(a.as_ref());

        if dim > 0 {
            let u = lu.compute_u();
            let (mut lo, mut hi) = (f64::INFINITY, 0.0_f64);
            for i in 0..dim {
                let d = u.read(i, i).abs();
                lo = lo.min(d);
                hi = hi.max(d);
            }
            if !lo.is_finite() || !hi.is_finite() || lo <= pivot_tol * hi || hi == 0.0 {
                bail!(
                    "singular compensation matrix (pivots {:e} to {:e})",
                    lo,
                    hi
                );
            }
        }
        Ok(Self { dim, lu })
    }
}

impl LinearSolver for DenseLu {
    fn dim(&self) -> usize {
        self.dim
    }

    fn solve(&self, rhs: &mut Mat<f64>) -> Result<()> {
        if rhs.nrows() != self.dim {
            bail!(
                "right hand side has {} rows, expected {}",
                rhs.nrows(),
                self.dim
            );
        }
        if self.dim > 0 && rhs.ncols() > 0 {
            self.lu.solve_in_place(rhs.as_mut());
        }
        ensure_finite(rhs).context("singular compensation matrix")
    }
}
