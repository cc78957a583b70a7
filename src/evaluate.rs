use crate::case::{Branch, Interval};
use crate::sensitivity::Family;
use faer::Mat;

pub fn apparent(p: f64, q: f64) -> f64 {
    (p * p + q * q).sqrt()
}

/// Apparent power above the limit of a branch with base flow `p`,
/// contingency flow change `d` and reactive flow `q`.
pub fn excess(p: f64, d: f64, q: f64, s_max: f64) -> f64 {
    (apparent(p + d, q) - s_max).max(0.0)
}

/// Largest excess of one family for one monitored branch kind.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Candidate {
    pub value: f64,
    pub branch: usize,
    pub col: usize,
}

/// Exact evaluation of one family in one interval.
#[derive(Debug, Clone, Default)]
pub struct FamilyEval {
    /// Total excess over all monitored branches, per family column.
    pub col_excess: Vec<f64>,
    /// Largest excess, indexed by `BranchKind`.
    pub worst: [Option<Candidate>; 2],
}

impl FamilyEval {
    pub fn new(num_col: usize) -> Self {
        Self {
            col_excess: vec![0.0; num_col],
            worst: [None, None],
        }
    }

    fn reset(&mut self) {
        self.col_excess.iter_mut().for_each(|e| *e = 0.0);
        self.worst = [None, None];
    }
}

/// Evaluates the surviving branches against every column of the family.
///
/// A branch is not monitored under the outage of itself, nor while out
/// of service. Branches are scanned in `survivors` order, then by column;
/// the first maximum is kept.
#[allow(clippy::too_many_arguments)]
pub(crate) fn evaluate_survivors(
    fam: &Family,
    branch: &[Branch],
    iv: &Interval,
    flow: &[f64],
    q: &[f64],
    delta: &Mat<f64>,
    survivors: &[usize],
    out: &mut FamilyEval,
) {
    out.reset();
    for &i in survivors {
        if !iv.in_service[i] {
            continue;
        }
        let br = &branch[i];
        for col in 0..delta.ncols() {
            if fam.outaged_branch(col) == Some(i) {
                continue;
            }
            let e = excess(flow[i], delta.read(i, col), q[i], br.s_max_ctg);
            if e <= 0.0 {
                continue;
            }
            out.col_excess[col] += e;

            let worst = &mut out.worst[br.kind as usize];
            if worst.map_or(true, |w| e > w.value) {
                *worst = Some(Candidate {
                    value: e,
                    branch: i,
                    col,
                });
            }
        }
    }
}
