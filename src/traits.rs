use anyhow::Result;
use faer::Mat;

/// Repeated solves with a fixed square system `A x = b`.
pub trait LinearSolver {
    /// Dimension of the system.
    fn dim(&self) -> usize;

    /// Overwrites every column of `rhs` with the corresponding solution.
    fn solve(&self, rhs: &mut Mat<f64>) -> Result<()>;

    fn solve_vec(&self, rhs: &[f64]) -> Result<Vec<f64>> {
        let mut x = crate::dense::column(rhs);
        self.solve(&mut x)?;
        Ok(crate::dense::col_to_vec(&x, 0))
    }
}
