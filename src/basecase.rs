use crate::case::{Branch, Interval};
use crate::debug::format_f64_vec;
use crate::incidence::Incidence;
use crate::traits::LinearSolver;
use anyhow::Result;

/// Pre-contingency state of one interval.
#[derive(Debug, Clone, Default)]
pub struct BaseCase {
    /// Voltage angle at every bus (radians), zero at the reference bus.
    pub theta: Vec<f64>,
    /// Real power flow of every branch, "from" to "to".
    pub flow: Vec<f64>,
}

/// Builds the right hand side of the reduced DC power flow.
///
/// The mismatch of the net injections is spread equally over all buses
/// (distributed slack). DC line set-points and the phase shift injections
/// `b * u * phi` are moved to the injection side so that `M * p` equals the
/// net injection at every bus.
pub(crate) fn make_rhs(inc: &Incidence, branch: &[Branch], iv: &Interval) -> Vec<f64> {
    let nb = iv.p_inj.len();
    let mean = iv.p_inj.iter().sum::<f64>() / nb as f64;

    let ubphi: Vec<f64> = branch
        .iter()
        .zip(iv.in_service.iter().zip(&iv.phase))
        .map(|(br, (&u, &phi))| if u { br.b * phi } else { 0.0 })
        .collect();

    let p_dc = &inc.bus_dc * &iv.dc_p;
    let p_phi = &inc.bus_br * &ubphi;

    inc.reduce(&iv.p_inj)
        .iter()
        .zip(p_dc.iter().zip(&p_phi))
        .map(|(p, (dc, phi))| p - mean - dc - phi)
        .collect()
}

/// Returns the "from" to "to" flow of every branch, given the reduced
/// angles.
pub(crate) fn branch_flows(
    inc: &Incidence,
    branch: &[Branch],
    iv: &Interval,
    theta: &[f64],
) -> Vec<f64> {
    let dtheta = &inc.br_bus * &theta.to_vec();
    branch
        .iter()
        .enumerate()
        .map(|(j, br)| {
            if iv.in_service[j] {
                -br.b * (dtheta[j] - iv.phase[j])
            } else {
                0.0
            }
        })
        .collect()
}

/// Solves the pre-contingency DC power flow of one interval.
///
/// Returns the base case and the reduced angles, which are the
/// right hand side of the branch outage corrections.
pub(crate) fn solve_base_case(
    inc: &Incidence,
    branch: &[Branch],
    iv: &Interval,
    solver: &dyn LinearSolver,
) -> Result<(BaseCase, Vec<f64>)> {
    let rhs = make_rhs(inc, branch, iv);
    let theta = solver.solve_vec(&rhs)?;
    let flow = branch_flows(inc, branch, iv, &theta);

    log::trace!("theta: {}", format_f64_vec(&theta));
    log::trace!("flow: {}", format_f64_vec(&flow));

    Ok((
        BaseCase {
            theta: inc.expand(&theta),
            flow,
        },
        theta,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::factor::SparseLu;
    use crate::tests::fixtures::{five_bus, two_parallel};
    use crate::admittance::make_admittance;

    fn solve(case: &crate::case::Case, ref_bus: usize, t: usize) -> BaseCase {
        let net = &case.network;
        let iv = &case.interval[t];
        let inc = Incidence::new(net, ref_bus).unwrap();
        let a = make_admittance(&inc, &net.branch, &iv.in_service).unwrap();
        let lu = SparseLu::factor(&a).unwrap();
        solve_base_case(&inc, &net.branch, iv, &lu).unwrap().0
    }

    #[test]
    fn parallel_branches_share_flow() {
        let base = solve(&two_parallel(), 0, 0);
        assert!((base.flow[0] - 40.0).abs() < 1e-9);
        assert!((base.flow[1] - 40.0).abs() < 1e-9);
        assert_eq!(base.theta[0], 0.0);
    }

    #[test]
    fn mismatch_is_distributed() {
        let mut case = two_parallel();
        case.interval[0].p_inj = vec![100.0, -60.0];
        let base = solve(&case, 0, 0);
        // 20 of the 40 mismatch stays at each bus
        assert!((base.flow[0] + base.flow[1] - 80.0).abs() < 1e-9);
    }

    #[test]
    fn flows_satisfy_kcl_with_phase_shift() {
        let case = five_bus();
        let net = &case.network;
        for (t, iv) in case.interval.iter().enumerate() {
            let base = solve(&case, 0, t);
            let nb = net.num_bus;
            let mean = iv.p_inj.iter().sum::<f64>() / nb as f64;

            // net outflow of every bus equals its injection
            let mut out = vec![0.0; nb];
            for (j, br) in net.branch.iter().enumerate() {
                out[br.from_bus] += base.flow[j];
                out[br.to_bus] -= base.flow[j];
            }
            for (j, dc) in net.dc_line.iter().enumerate() {
                out[dc.from_bus] += iv.dc_p[j];
                out[dc.to_bus] -= iv.dc_p[j];
            }
            for i in 0..nb {
                let expect = iv.p_inj[i] - mean;
                assert!(
                    (out[i] - expect).abs() < 1e-9,
                    "interval {} bus {}: {} != {}",
                    t,
                    i,
                    out[i],
                    expect
                );
            }
        }
    }

    #[test]
    fn reference_bus_does_not_change_flows() {
        let case = five_bus();
        for t in 0..case.num_interval() {
            let f0 = solve(&case, 0, t).flow;
            let f3 = solve(&case, 3, t).flow;
            for (a, b) in f0.iter().zip(&f3) {
                assert!((a - b).abs() < 1e-9);
            }
        }
    }
}
