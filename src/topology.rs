use crate::admittance::{make_admittance, status_union};
use crate::case::{Branch, Interval};
use crate::factor::{DenseLu, SparseLu};
use crate::incidence::Incidence;
use crate::traits::LinearSolver;
use anyhow::{Context, Result};
use faer::Mat;
use serde::{Deserialize, Serialize};
use std::time::Instant;

/// How each interval's admittance model is obtained.
#[derive(Debug, PartialEq, Copy, Clone, Default, Serialize, Deserialize)]
pub enum TopologyStrategy {
    /// Rebuild and refactorize `A_t` for every interval.
    #[default]
    Exact,
    /// Keep the factors of the static base pattern and apply a rank-k
    /// correction for the branches switched off in the interval.
    Chained,
}

/// Static data of the chained strategy.
struct ChainedBase {
    /// Factors of `A0`, built from the union of in-service patterns.
    lu: SparseLu,
    /// Column of each branch in `w`, for branches in service in some
    /// interval and out of service in another.
    col: Vec<Option<usize>>,
    /// `A0⁻¹ M_Δ` for those branches.
    w: Mat<f64>,
}

/// Produces the linear model of each interval's topology.
pub struct TopologyUpdater {
    strategy: TopologyStrategy,
    /// Relative pivot magnitude below which a compensation matrix is
    /// rejected.
    pivot_tol: f64,
    base: Option<ChainedBase>,
}

impl TopologyUpdater {
    pub fn new(
        strategy: TopologyStrategy,
        pivot_tol: f64,
        inc: &Incidence,
        branch: &[Branch],
        interval: &[Interval],
    ) -> Result<Self> {
        let base = match strategy {
            TopologyStrategy::Exact => None,
            TopologyStrategy::Chained => {
                let t0 = Instant::now();
                let on = status_union(branch.len(), interval);
                inc.check_connected(&on)
                    .context("static base topology disconnects the network")?;
                let a0 = make_admittance(inc, branch, &on)?;
                let lu = SparseLu::factor(&a0).context("static base admittance matrix")?;
                log::info!(
                    "factor static bus admittance matrix. time: {:?}",
                    t0.elapsed()
                );

                let switched: Vec<usize> = (0..branch.len())
                    .filter(|&j| on[j] && interval.iter().any(|iv| !iv.in_service[j]))
                    .collect();
                let mut col = vec![None; branch.len()];
                let mut w = Mat::zeros(inc.dim(), switched.len());
                for (c, &j) in switched.iter().enumerate() {
                    col[j] = Some(c);
                    inc.set_branch_column(j, 1.0, &mut w, c);
                }
                lu.solve(&mut w).context("static topology sensitivities")?;
                log::info!("switched branches: {}", switched.len());

                Some(ChainedBase { lu, col, w })
            }
        };
        Ok(Self {
            strategy,
            pivot_tol,
            base,
        })
    }

    pub fn strategy(&self) -> TopologyStrategy {
        self.strategy
    }

    /// Returns the linear model of the network with the given in-service
    /// pattern.
    pub fn interval<'a>(
        &'a self,
        inc: &'a Incidence,
        branch: &[Branch],
        status: &[bool],
    ) -> Result<IntervalSystem<'a>> {
        inc.check_connected(status)
            .context("interval topology disconnects the network")?;
        match &self.base {
            None => {
                let a = make_admittance(inc, branch, status)?;
                Ok(IntervalSystem::Exact(SparseLu::factor(&a)?))
            }
            Some(base) => {
                // branches in the base pattern that are out in this interval
                let off: Vec<(usize, usize)> = (0..branch.len())
                    .filter(|&j| !status[j])
                    .filter_map(|j| base.col[j].map(|c| (j, c)))
                    .collect();
                let update = if off.is_empty() {
                    None
                } else {
                    Some(
                        LowRankUpdate::new(inc, branch, base, off, self.pivot_tol)
                            .context("interval topology disconnects the network")?,
                    )
                };
                Ok(IntervalSystem::Chained {
                    base: &base.lu,
                    update,
                })
            }
        }
    }

    /// Solves `A0 X = M_j` for the given branches on the static base
    /// pattern. Only the chained strategy needs these.
    pub fn static_sensitivities(
        &self,
        inc: &Incidence,
        branches: &[usize],
    ) -> Result<Option<Mat<f64>>> {
        match &self.base {
            None => Ok(None),
            Some(base) => {
                let mut w = Mat::zeros(inc.dim(), branches.len());
                for (c, &j) in branches.iter().enumerate() {
                    inc.set_branch_column(j, 1.0, &mut w, c);
                }
                base.lu.solve(&mut w)?;
                Ok(Some(w))
            }
        }
    }
}

/// SMW correction from the static base pattern to an interval's pattern.
///
/// With `W = A0⁻¹ M_t` and `V = diag(1/b) + M_tᵗ W`,
/// `A_t⁻¹ x = A0⁻¹ x - W V⁻¹ M_tᵗ A0⁻¹ x`.
pub struct LowRankUpdate<'a> {
    inc: &'a Incidence,
    branches: Vec<usize>,
    w: Mat<f64>,
    v: DenseLu,
}

impl<'a> LowRankUpdate<'a> {
    fn new(
        inc: &'a Incidence,
        branch: &[Branch],
        base: &ChainedBase,
        off: Vec<(usize, usize)>,
        pivot_tol: f64,
    ) -> Result<Self> {
        let (n, k) = (inc.dim(), off.len());

        let mut w = Mat::zeros(n, k);
        for (c, &(_, src)) in off.iter().enumerate() {
            for r in 0..n {
                w.write(r, c, base.w.read(r, src));
            }
        }

        let branches: Vec<usize> = off.iter().map(|&(j, _)| j).collect();
        let mut v = Mat::zeros(k, k);
        for (r, &i) in branches.iter().enumerate() {
            for c in 0..k {
                v.write(r, c, inc.branch_dot(i, &w, c));
            }
            v.write(r, r, v.read(r, r) + 1.0 / branch[i].b);
        }

        Ok(Self {
            inc,
            branches,
            w,
            v: DenseLu::factor(&v, pivot_tol)?,
        })
    }

    pub fn rank(&self) -> usize {
        self.branches.len()
    }

    /// Maps `x = A0⁻¹ r` to `A_t⁻¹ r` in place.
    pub fn correct(&self, x: &mut Mat<f64>) -> Result<()> {
        let (k, c) = (self.branches.len(), x.ncols());
        let mut p = Mat::zeros(k, c);
        for (r, &j) in self.branches.iter().enumerate() {
            for col in 0..c {
                p.write(r, col, self.inc.branch_dot(j, x, col));
            }
        }
        self.v
            .solve(&mut p)
            .context("interval topology disconnects the network")?;

        let delta = &self.w * &p;
        for col in 0..c {
            for r in 0..x.nrows() {
                x.write(r, col, x.read(r, col) - delta.read(r, col));
            }
        }
        Ok(())
    }
}

/// Linear model of one interval's in-service network.
pub enum IntervalSystem<'a> {
    Exact(SparseLu),
    Chained {
        base: &'a SparseLu,
        update: Option<LowRankUpdate<'a>>,
    },
}

impl<'a> IntervalSystem<'a> {
    /// Number of branches in the topology correction.
    pub fn rank(&self) -> usize {
        match self {
            IntervalSystem::Exact(_) => 0,
            IntervalSystem::Chained { update, .. } => update.as_ref().map_or(0, |u| u.rank()),
        }
    }

    /// Overwrites `w` with `A_t⁻¹ M_j` for each branch `j` in `branches`.
    ///
    /// `w0` holds the static `A0⁻¹ M_j` columns, required by the chained
    /// strategy.
    pub fn branch_sensitivities(
        &self,
        inc: &Incidence,
        branches: &[usize],
        w0: Option<&Mat<f64>>,
        w: &mut Mat<f64>,
    ) -> Result<()> {
        match (self, w0) {
            (IntervalSystem::Chained { update, .. }, Some(w0)) => {
                crate::dense::copy_into(w0, w);
                if let Some(update) = update {
                    update.correct(w)?;
                }
                Ok(())
            }
            _ => {
                crate::dense::zero(w);
                for (c, &j) in branches.iter().enumerate() {
                    inc.set_branch_column(j, 1.0, w, c);
                }
                self.solve(w)
            }
        }
    }
}

impl<'a> LinearSolver for IntervalSystem<'a> {
    fn dim(&self) -> usize {
        match self {
            IntervalSystem::Exact(lu) => lu.dim(),
            IntervalSystem::Chained { base, .. } => base.dim(),
        }
    }

    fn solve(&self, rhs: &mut Mat<f64>) -> Result<()> {
        match self {
            IntervalSystem::Exact(lu) => lu.solve(rhs),
            IntervalSystem::Chained { base, update } => {
                base.solve(rhs)?;
                if let Some(update) = update {
                    update.correct(rhs)?;
                }
                Ok(())
            }
        }
    }
}
