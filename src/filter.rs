use crate::dense::row_max_min;
use crate::evaluate::apparent;
use faer::Mat;
use serde::{Deserialize, Serialize};

/// Selection of the branches evaluated exactly for a contingency family.
#[derive(Debug, PartialEq, Copy, Clone, Default, Serialize, Deserialize)]
pub enum FilterMode {
    /// Discard branches whose flow bracket over all contingencies
    /// cannot exceed the limit.
    #[default]
    Bracket,
    /// Evaluate every branch.
    Exhaustive,
}

impl FilterMode {
    /// Writes the branches that need exact evaluation to `survivors`, in
    /// ascending order, and returns their number.
    pub fn select(
        self,
        flow: &[f64],
        q: &[f64],
        s_max: &[f64],
        delta: &Mat<f64>,
        survivors: &mut Vec<usize>,
    ) -> usize {
        match self {
            FilterMode::Bracket => bracket_filter(flow, q, s_max, delta, survivors),
            FilterMode::Exhaustive => {
                survivors.clear();
                if delta.ncols() > 0 {
                    survivors.extend(0..flow.len());
                }
                survivors.len()
            }
        }
    }
}

/// Keeps the rows `i` with `sqrt(a² + q²) > s_max` where
/// `a = max(|p + hi|, |p + lo|)` and `hi`, `lo` are the largest and
/// smallest flow change of row `i` over all columns of `delta`.
///
/// Every row with an exceeding column survives.
pub fn bracket_filter(
    flow: &[f64],
    q: &[f64],
    s_max: &[f64],
    delta: &Mat<f64>,
    survivors: &mut Vec<usize>,
) -> usize {
    survivors.clear();
    if delta.ncols() == 0 {
        return 0;
    }
    for (i, &p) in flow.iter().enumerate() {
        let (hi, lo) = row_max_min(delta, i);
        let a = (p + hi).abs().max((p + lo).abs());
        if apparent(a, q[i]) - s_max[i] > 0.0 {
            survivors.push(i);
        }
    }
    survivors.len()
}
