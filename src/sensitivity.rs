use crate::case::{Branch, Interval, Network, Outage, OutageKind};
use crate::incidence::Incidence;
use crate::topology::IntervalSystem;
use crate::traits::LinearSolver;
use anyhow::{bail, Result};
use faer::Mat;
use std::collections::BTreeMap;

/// Contingencies that outage devices of the same kind.
///
/// Only devices outaged by at least one contingency get a column.
/// Contingencies outaging the same device share its column.
pub struct Family {
    pub kind: OutageKind,

    /// Outaged device of each column, ascending. Branch indices for the
    /// line and transformer families, DC line indices otherwise.
    pub device: Vec<usize>,

    /// `(contingency, column)` of every contingency in the family,
    /// in contingency order.
    pub members: Vec<(usize, usize)>,

    /// First contingency outaging the device of each column.
    pub first_ctg: Vec<usize>,

    /// `A0⁻¹ M_k` on the static base pattern. Only set by the chained
    /// topology strategy.
    pub(crate) w0: Option<Mat<f64>>,
}

impl Family {
    /// Partitions the contingencies of `net` by outage kind, in
    /// `OutageKind::ALL` order.
    pub fn build(net: &Network) -> [Family; 3] {
        OutageKind::ALL.map(|kind| {
            let outaged: Vec<(usize, usize)> = net
                .contingency
                .iter()
                .enumerate()
                .filter(|&(k, _)| net.outage_kind(k) == kind)
                .map(|(k, ctg)| match ctg.outage {
                    Outage::Branch(i) | Outage::DcLine(i) => (k, i),
                })
                .collect();

            let mut col: BTreeMap<usize, usize> = outaged.iter().map(|&(_, i)| (i, 0)).collect();
            for (c, v) in col.values_mut().enumerate() {
                *v = c;
            }
            let device: Vec<usize> = col.keys().copied().collect();

            let mut first_ctg = vec![usize::MAX; device.len()];
            let members = outaged
                .iter()
                .map(|&(k, i)| {
                    let c = col[&i];
                    first_ctg[c] = first_ctg[c].min(k);
                    (k, c)
                })
                .collect();

            Family {
                kind,
                device,
                members,
                first_ctg,
                w0: None,
            }
        })
    }

    pub fn len(&self) -> usize {
        self.device.len()
    }

    pub fn is_empty(&self) -> bool {
        self.device.is_empty()
    }

    /// Removing the device changes the admittance matrix.
    pub fn updates_matrix(&self) -> bool {
        self.kind != OutageKind::DcLine
    }

    /// Removing the device changes the bus injections.
    pub fn adjusts_rhs(&self) -> bool {
        self.kind != OutageKind::Line
    }

    /// Branch removed from the network by the contingencies of column `col`.
    pub fn outaged_branch(&self, col: usize) -> Option<usize> {
        if self.updates_matrix() {
            Some(self.device[col])
        } else {
            None
        }
    }
}

/// Per-family buffers, overwritten every interval.
pub struct FamilyScratch {
    /// `A_t⁻¹ M_k`.
    w: Mat<f64>,
    /// `A_t⁻¹ r_k` for the injection change `r_k` of each outage.
    y: Mat<f64>,
    /// Reciprocal compensation terms, zero for masked columns.
    pub v_inv: Vec<f64>,
    /// Reduction of the reduced angles under each outage.
    pub delta_theta: Mat<f64>,
    /// Change of every branch flow under each outage.
    pub delta_flow: Mat<f64>,
}

impl FamilyScratch {
    pub fn new(fam: &Family, num_row: usize, num_branch: usize) -> Self {
        let c = fam.len();
        let wc = if fam.updates_matrix() { c } else { 0 };
        Self {
            w: Mat::zeros(num_row, wc),
            y: Mat::zeros(num_row, c),
            v_inv: vec![0.0; c],
            delta_theta: Mat::zeros(num_row, c),
            delta_flow: Mat::zeros(num_branch, c),
        }
    }
}

/// Computes the branch flow change of every contingency column of `fam`.
///
/// With `w = A_t⁻¹ m_k`, `v = 1/b_k + m_kᵗ w` and `y = A_t⁻¹ r_k`, the
/// post-contingency angles are `θ - Δθ` where
/// `Δθ = w · (m_kᵗ (θ + y)) / v - y`. Columns whose branch is already out
/// of service have `1/v` forced to zero. On return `delta_flow` holds
/// `b ⊙ u ⊙ (Mᵗ Δθ)` with the outaged branch's own entry zeroed.
#[allow(clippy::too_many_arguments)]
pub(crate) fn contingency_deltas(
    fam: &Family,
    inc: &Incidence,
    branch: &[Branch],
    iv: &Interval,
    sys: &IntervalSystem,
    theta: &Mat<f64>,
    pivot_tol: f64,
    s: &mut FamilyScratch,
) -> Result<()> {
    let n = inc.dim();
    let c = fam.len();
    if c == 0 {
        return Ok(());
    }

    if fam.updates_matrix() {
        sys.branch_sensitivities(inc, &fam.device, fam.w0.as_ref(), &mut s.w)?;
    }

    crate::dense::zero(&mut s.y);
    if fam.adjusts_rhs() {
        for (col, &d) in fam.device.iter().enumerate() {
            let r = match fam.kind {
                OutageKind::DcLine => iv.dc_p[d],
                _ if iv.in_service[d] => branch[d].b * iv.phase[d],
                _ => 0.0,
            };
            if r != 0.0 {
                match fam.kind {
                    OutageKind::DcLine => inc.set_dc_column(d, r, &mut s.y, col),
                    _ => inc.set_branch_column(d, r, &mut s.y, col),
                }
            }
        }
        sys.solve(&mut s.y)?;
    }

    for (col, &d) in fam.device.iter().enumerate() {
        let scale = if fam.updates_matrix() && iv.in_service[d] {
            let v = 1.0 / branch[d].b + inc.branch_dot(d, &s.w, col);
            if !v.is_finite() || v.abs() <= pivot_tol * (1.0 / branch[d].b).abs() {
                bail!(
                    "contingency {}: outage of branch {} disconnects the network (v = {})",
                    fam.first_ctg[col],
                    d,
                    v
                );
            }
            s.v_inv[col] = 1.0 / v;
            s.v_inv[col] * (inc.branch_dot(d, theta, 0) + inc.branch_dot(d, &s.y, col))
        } else {
            s.v_inv[col] = 0.0;
            0.0
        };

        for r in 0..n {
            let w = if scale != 0.0 { s.w.read(r, col) * scale } else { 0.0 };
            s.delta_theta.write(r, col, w - s.y.read(r, col));
        }
    }

    for (i, br) in branch.iter().enumerate() {
        let bu = if iv.in_service[i] { br.b } else { 0.0 };
        for col in 0..c {
            let d = if bu != 0.0 {
                bu * inc.branch_dot(i, &s.delta_theta, col)
            } else {
                0.0
            };
            s.delta_flow.write(i, col, d);
        }
    }
    for col in 0..c {
        if let Some(i) = fam.outaged_branch(col) {
            s.delta_flow.write(i, col, 0.0);
        }
    }
    Ok(())
}
