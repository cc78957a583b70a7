use crate::case::{Branch, Interval};
use crate::incidence::Incidence;
use anyhow::{anyhow, Result};
use faer::sparse::SparseColMat;
use std::collections::BTreeMap;

/// Builds the negative nodal admittance matrix on the non-reference buses.
///
/// Returns `A = -(M * diag(b .* status) * Mᵗ)`, where `M` is the reduced
/// bus-branch incidence. Branches with `status[j] == false` contribute
/// nothing. `A` is symmetric, and nonsingular when the in-service network
/// is connected. It may be indefinite if some susceptances are negative.
pub fn make_admittance(
    inc: &Incidence,
    branch: &[Branch],
    status: &[bool],
) -> Result<SparseColMat<usize, f64>> {
    let n = inc.dim();
    let triplets = admittance_triplets(inc, branch, status);

    SparseColMat::<usize, f64>::try_new_from_triplets(n, n, &triplets)
        .map_err(|err| anyhow!("failed to assemble admittance matrix: {:?}", err))
}

/// Returns the `(row, col, value)` entries of the reduced negative
/// admittance matrix, one per position, in column-major order.
pub(crate) fn admittance_triplets(
    inc: &Incidence,
    branch: &[Branch],
    status: &[bool],
) -> Vec<(usize, usize, f64)> {
    // keyed (col, row) so iteration is column-major
    let mut entries: BTreeMap<(usize, usize), f64> = BTreeMap::new();
    for (j, br) in branch.iter().enumerate() {
        if !status[j] {
            continue;
        }
        let b = br.b;
        let (f, t) = inc.branch_ends(j);

        if let Some(f) = f {
            *entries.entry((f, f)).or_default() -= b;
        }
        if let Some(t) = t {
            *entries.entry((t, t)).or_default() -= b;
        }
        if let (Some(f), Some(t)) = (f, t) {
            *entries.entry((t, f)).or_default() += b;
            *entries.entry((f, t)).or_default() += b;
        }
    }

    entries
        .into_iter()
        .map(|((j, i), v)| (i, j, v))
        .collect()
}

/// Returns the status pattern of branches in service in at least one
/// interval. This is the static base pattern of the chained strategy.
pub fn status_union(num_branch: usize, interval: &[Interval]) -> Vec<bool> {
    let mut on = vec![false; num_branch];
    for iv in interval {
        for (j, &u) in iv.in_service.iter().enumerate() {
            on[j] |= u;
        }
    }
    on
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::fixtures::{three_bus, two_parallel};

    fn dense(inc: &Incidence, branch: &[Branch], status: &[bool]) -> Vec<Vec<f64>> {
        let n = inc.dim();
        let mut d = vec![vec![0.0; n]; n];
        for (i, j, v) in admittance_triplets(inc, branch, status) {
            d[i][j] += v;
        }
        d
    }

    #[test]
    fn parallel_branches_add() {
        let case = two_parallel();
        let inc = Incidence::new(&case.network, 0).unwrap();
        let branch = &case.network.branch;
        assert_eq!(dense(&inc, branch, &[true, true]), vec![vec![-200.0]]);
        assert_eq!(dense(&inc, branch, &[true, false]), vec![vec![-100.0]]);

        let a = make_admittance(&inc, branch, &[true, true]).unwrap();
        assert_eq!((a.nrows(), a.ncols()), (1, 1));
    }

    #[test]
    fn matrix_is_symmetric() {
        let case = three_bus();
        let inc = Incidence::new(&case.network, 2).unwrap();
        let d = dense(&inc, &case.network.branch, &[true; 3]);
        // buses 0 and 1 remain, branch 0 connects them
        let b0 = case.network.branch[0].b;
        let b2 = case.network.branch[2].b;
        let b1 = case.network.branch[1].b;
        assert_eq!(d[0][1], b0);
        assert_eq!(d[1][0], b0);
        assert_eq!(d[0][0], -(b0 + b2));
        assert_eq!(d[1][1], -(b0 + b1));
    }

    #[test]
    fn union_of_status() {
        let mut case = two_parallel();
        case.interval[0].in_service = vec![true, false];
        let mut iv = case.interval[0].clone();
        iv.in_service = vec![false, false];
        case.interval.push(iv);
        assert_eq!(status_union(2, &case.interval), vec![true, false]);
    }
}
