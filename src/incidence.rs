use crate::case::Network;
use anyhow::{bail, Result};
use faer::Mat;
use sparsetools::coo::Coo;
use sparsetools::csr::CSR;

/// Bus-branch and bus-DC-line incidence restricted to the non-reference
/// buses.
///
/// Column `j` of `M` has +1 in the row of the branch's "from" bus and -1
/// in the row of its "to" bus. Rows of the reference bus are dropped, so
/// a branch touching the reference bus has a single entry.
pub struct Incidence {
    ref_bus: usize,

    /// Reduced row of each bus, `None` for the reference bus.
    bus_row: Vec<Option<usize>>,

    /// Reduced rows of the "from" and "to" end of each branch.
    br_ends: Vec<(Option<usize>, Option<usize>)>,
    /// Reduced rows of the "from" and "to" end of each DC line.
    dc_ends: Vec<(Option<usize>, Option<usize>)>,

    /// `Mᵗ`, branches by non-reference buses.
    pub(crate) br_bus: CSR<usize, f64>,
    /// `M`, non-reference buses by branches.
    pub(crate) bus_br: CSR<usize, f64>,
    /// Non-reference buses by DC lines.
    pub(crate) bus_dc: CSR<usize, f64>,
}

impl Incidence {
    pub fn new(net: &Network, ref_bus: usize) -> Result<Self> {
        let nb = net.num_bus;
        if ref_bus >= nb {
            bail!("reference bus {} out of range (num_bus = {})", ref_bus, nb);
        }
        let n = nb - 1;
        let (nbr, ndc) = (net.branch.len(), net.dc_line.len());

        let bus_row: Vec<Option<usize>> = (0..nb)
            .map(|i| match i.cmp(&ref_bus) {
                std::cmp::Ordering::Less => Some(i),
                std::cmp::Ordering::Equal => None,
                std::cmp::Ordering::Greater => Some(i - 1),
            })
            .collect();

        let br_ends: Vec<(Option<usize>, Option<usize>)> = net
            .branch
            .iter()
            .map(|br| (bus_row[br.from_bus], bus_row[br.to_bus]))
            .collect();
        let dc_ends: Vec<(Option<usize>, Option<usize>)> = net
            .dc_line
            .iter()
            .map(|dc| (bus_row[dc.from_bus], bus_row[dc.to_bus]))
            .collect();

        let mut br_bus = Coo::with_capacity(nbr, n, 2 * nbr);
        let mut bus_br = Coo::with_capacity(n, nbr, 2 * nbr);
        for (j, &(f, t)) in br_ends.iter().enumerate() {
            if let Some(f) = f {
                br_bus.push(j, f, 1.0);
                bus_br.push(f, j, 1.0);
            }
            if let Some(t) = t {
                br_bus.push(j, t, -1.0);
                bus_br.push(t, j, -1.0);
            }
        }
        let mut bus_dc = Coo::with_capacity(n, ndc, 2 * ndc);
        for (j, &(f, t)) in dc_ends.iter().enumerate() {
            if let Some(f) = f {
                bus_dc.push(f, j, 1.0);
            }
            if let Some(t) = t {
                bus_dc.push(t, j, -1.0);
            }
        }

        Ok(Self {
            ref_bus,
            bus_row,
            br_ends,
            dc_ends,
            br_bus: br_bus.to_csr(),
            bus_br: bus_br.to_csr(),
            bus_dc: bus_dc.to_csr(),
        })
    }

    pub fn ref_bus(&self) -> usize {
        self.ref_bus
    }

    /// Number of non-reference buses.
    pub fn dim(&self) -> usize {
        self.bus_row.len() - 1
    }

    pub(crate) fn branch_ends(&self, j: usize) -> (Option<usize>, Option<usize>) {
        self.br_ends[j]
    }

    pub(crate) fn reduce(&self, full: &[f64]) -> Vec<f64> {
        full.iter()
            .enumerate()
            .filter(|&(i, _)| i != self.ref_bus)
            .map(|(_, &v)| v)
            .collect()
    }

    /// Inserts a zero angle for the reference bus.
    pub(crate) fn expand(&self, reduced: &[f64]) -> Vec<f64> {
        self.bus_row
            .iter()
            .map(|row| row.map_or(0.0, |r| reduced[r]))
            .collect()
    }

    /// Returns `m_jᵗ x[:, col]` for branch `j`.
    pub(crate) fn branch_dot(&self, j: usize, x: &Mat<f64>, col: usize) -> f64 {
        ends_dot(self.br_ends[j], x, col)
    }

    /// Writes `scale * m_j` into column `col` of `x`, which must be zero.
    pub(crate) fn set_branch_column(&self, j: usize, scale: f64, x: &mut Mat<f64>, col: usize) {
        set_ends(self.br_ends[j], scale, x, col)
    }

    /// Returns a bus with no in-service path to the reference bus.
    pub fn isolated_bus(&self, status: &[bool]) -> Option<usize> {
        let n = self.dim();
        // node `n` stands for the reference bus
        let mut adj = vec![Vec::new(); n + 1];
        for (j, &(f, t)) in self.br_ends.iter().enumerate() {
            if !status[j] {
                continue;
            }
            let (f, t) = (f.unwrap_or(n), t.unwrap_or(n));
            adj[f].push(t);
            adj[t].push(f);
        }

        let mut seen = vec![false; n + 1];
        let mut stack = vec![n];
        seen[n] = true;
        while let Some(u) = stack.pop() {
            for &v in adj[u].iter() {
                if !seen[v] {
                    seen[v] = true;
                    stack.push(v);
                }
            }
        }
        seen[..n]
            .iter()
            .position(|&s| !s)
            .map(|r| if r < self.ref_bus { r } else { r + 1 })
    }

    /// Fails if the in-service branches leave some bus without a path to
    /// the reference bus.
    pub fn check_connected(&self, status: &[bool]) -> Result<()> {
        match self.isolated_bus(status) {
            None => Ok(()),
            Some(bus) => bail!(
                "singular admittance matrix: bus {} has no path to reference bus {}",
                bus,
                self.ref_bus
            ),
        }
    }

    /// Writes `scale * m_dc` for DC line `j` into column `col` of `x`,
    /// which must be zero.
    pub(crate) fn set_dc_column(&self, j: usize, scale: f64, x: &mut Mat<f64>, col: usize) {
        set_ends(self.dc_ends[j], scale, x, col)
    }
}

fn ends_dot(ends: (Option<usize>, Option<usize>), x: &Mat<f64>, col: usize) -> f64 {
    let (f, t) = ends;
    f.map_or(0.0, |f| x.read(f, col)) - t.map_or(0.0, |t| x.read(t, col))
}

fn set_ends(ends: (Option<usize>, Option<usize>), scale: f64, x: &mut Mat<f64>, col: usize) {
    let (f, t) = ends;
    if let Some(f) = f {
        x.write(f, col, scale);
    }
    if let Some(t) = t {
        x.write(t, col, -scale);
    }
}
