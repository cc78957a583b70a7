use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};

/// Kind of AC branch.
#[derive(Debug, PartialEq, Eq, Copy, Clone, Serialize, Deserialize)]
pub enum BranchKind {
    /// AC transmission line.
    Line = 0,
    /// Two winding transformer, possibly phase shifting.
    Transformer = 1,
}

/// AC line or transformer connecting two buses.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Branch {
    pub kind: BranchKind,

    /// "From" bus index.
    pub from_bus: usize,
    /// "To" bus index.
    pub to_bus: usize,

    /// Series susceptance (p.u.). Must be non-zero, sign is unrestricted.
    pub b: f64,

    /// Apparent power rating under normal conditions.
    pub s_max: f64,
    /// Apparent power rating under contingency conditions.
    pub s_max_ctg: f64,
}

impl Branch {
    pub fn is_transformer(&self) -> bool {
        self.kind == BranchKind::Transformer
    }
}

/// DC line. Only contributes to bus injections, never to the
/// admittance matrix.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DcLine {
    pub from_bus: usize,
    pub to_bus: usize,
}

/// The single device removed from service by a contingency.
#[derive(Debug, PartialEq, Eq, Copy, Clone, Serialize, Deserialize)]
pub enum Outage {
    /// Index into `Network::branch`.
    Branch(usize),
    /// Index into `Network::dc_line`.
    DcLine(usize),
}

/// Outaged device family. Each family has its own correction formula.
#[derive(Debug, PartialEq, Eq, Copy, Clone, Hash, Serialize, Deserialize)]
pub enum OutageKind {
    Line = 0,
    DcLine = 1,
    Transformer = 2,
}

impl OutageKind {
    pub const ALL: [OutageKind; 3] = [OutageKind::Line, OutageKind::DcLine, OutageKind::Transformer];

    pub fn index(self) -> usize {
        self as usize
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Contingency {
    pub outage: Outage,
}

/// Static network topology and limits. Immutable for a run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Network {
    pub num_bus: usize,

    /// AC lines and transformers. The position in this list is the
    /// branch index used in all results.
    pub branch: Vec<Branch>,

    pub dc_line: Vec<DcLine>,

    pub contingency: Vec<Contingency>,
}

impl Network {
    /// Returns the family of the device outaged by contingency `k`.
    pub fn outage_kind(&self, k: usize) -> OutageKind {
        match self.contingency[k].outage {
            Outage::Branch(i) => match self.branch[i].kind {
                BranchKind::Line => OutageKind::Line,
                BranchKind::Transformer => OutageKind::Transformer,
            },
            Outage::DcLine(_) => OutageKind::DcLine,
        }
    }
}

/// Schedule data for one time interval of the horizon.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Interval {
    /// Interval duration, weights the penalty.
    pub duration: f64,

    /// Net real power injection at each bus from producers, consumers
    /// and shunts, before the distributed slack is applied.
    pub p_inj: Vec<f64>,

    /// Branch in-service status.
    pub in_service: Vec<bool>,

    /// Phase shift angle of each branch (radians). Only transformers
    /// are expected to have non-zero values.
    pub phase: Vec<f64>,

    /// Reactive power flow at the "from" end of each branch.
    pub q_fr: Vec<f64>,
    /// Reactive power flow at the "to" end of each branch.
    pub q_to: Vec<f64>,

    /// Real power set-point of each DC line, from bus to to bus.
    pub dc_p: Vec<f64>,
}

/// Network, schedule and penalty cost for a complete run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Case {
    pub network: Network,

    pub interval: Vec<Interval>,

    /// Cost per unit of apparent power excess per unit duration.
    pub violation_cost: f64,
}

impl Case {
    pub fn num_interval(&self) -> usize {
        self.interval.len()
    }

    /// Checks dimensions, indices and finiteness before the interval loop.
    ///
    /// Connectivity depends on the interval's in-service pattern and is
    /// checked when its topology is built.
    pub fn validate(&self) -> Result<()> {
        let net = &self.network;
        let (nb, nbr, ndc) = (net.num_bus, net.branch.len(), net.dc_line.len());

        if nb == 0 {
            bail!("case contains no buses");
        }
        for (i, br) in net.branch.iter().enumerate() {
            if br.from_bus >= nb || br.to_bus >= nb {
                bail!(
                    "branch {}: bus index out of range ({} -> {}, num_bus = {})",
                    i,
                    br.from_bus,
                    br.to_bus,
                    nb
                );
            }
            if br.from_bus == br.to_bus {
                bail!("branch {}: from and to bus are both {}", i, br.from_bus);
            }
            if br.b == 0.0 || !br.b.is_finite() {
                bail!("branch {}: series susceptance must be finite and non-zero", i);
            }
            if br.s_max.is_nan() || br.s_max_ctg.is_nan() {
                bail!("branch {}: rating is NaN", i);
            }
        }
        for (i, dc) in net.dc_line.iter().enumerate() {
            if dc.from_bus >= nb || dc.to_bus >= nb {
                bail!("dc line {}: bus index out of range", i);
            }
        }
        for (k, ctg) in net.contingency.iter().enumerate() {
            match ctg.outage {
                Outage::Branch(i) if i >= nbr => {
                    bail!("contingency {}: outaged branch {} does not exist", k, i)
                }
                Outage::DcLine(i) if i >= ndc => {
                    bail!("contingency {}: outaged dc line {} does not exist", k, i)
                }
                _ => {}
            }
        }

        if !self.violation_cost.is_finite() {
            bail!("violation cost must be finite, got {}", self.violation_cost);
        }

        for (t, iv) in self.interval.iter().enumerate() {
            let checks = [
                ("p_inj", iv.p_inj.len(), nb),
                ("in_service", iv.in_service.len(), nbr),
                ("phase", iv.phase.len(), nbr),
                ("q_fr", iv.q_fr.len(), nbr),
                ("q_to", iv.q_to.len(), nbr),
                ("dc_p", iv.dc_p.len(), ndc),
            ];
            for (name, len, expect) in checks {
                if len != expect {
                    bail!(
                        "interval {}: {} has length {}, expected {}",
                        t,
                        name,
                        len,
                        expect
                    );
                }
            }
            if !(iv.duration >= 0.0 && iv.duration.is_finite()) {
                bail!("interval {}: duration must be finite and non-negative", t);
            }
            let values = [
                ("p_inj", &iv.p_inj),
                ("phase", &iv.phase),
                ("q_fr", &iv.q_fr),
                ("q_to", &iv.q_to),
                ("dc_p", &iv.dc_p),
            ];
            for (name, v) in values {
                if let Some(i) = v.iter().position(|x| !x.is_finite()) {
                    bail!("interval {}: {}[{}] is not finite ({})", t, name, i, v[i]);
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::fixtures::two_parallel;

    #[test]
    fn validate_accepts_fixture() {
        assert!(two_parallel().validate().is_ok());
    }

    #[test]
    fn validate_rejects_short_status() {
        let mut case = two_parallel();
        case.interval[0].in_service.pop();
        let err = case.validate().unwrap_err();
        assert!(err.to_string().contains("in_service"));
    }

    #[test]
    fn validate_rejects_unknown_outage() {
        let mut case = two_parallel();
        case.network.contingency.push(Contingency {
            outage: Outage::DcLine(3),
        });
        assert!(case.validate().is_err());
    }

    #[test]
    fn validate_rejects_non_finite_values() {
        let mut case = two_parallel();
        case.interval[0].q_fr[1] = f64::NAN;
        let err = case.validate().unwrap_err();
        assert_eq!(err.to_string(), "interval 0: q_fr[1] is not finite (NaN)");

        let mut case = two_parallel();
        case.interval[0].p_inj[0] = f64::INFINITY;
        assert!(case.validate().unwrap_err().to_string().contains("p_inj[0]"));

        let mut case = two_parallel();
        case.violation_cost = f64::NAN;
        assert!(case.validate().unwrap_err().to_string().contains("violation cost"));

        let mut case = two_parallel();
        case.network.branch[1].s_max_ctg = f64::NAN;
        assert!(case.validate().unwrap_err().to_string().contains("branch 1"));
    }

    #[test]
    fn outage_kind_follows_branch_kind() {
        let mut case = two_parallel();
        assert_eq!(case.network.outage_kind(0), OutageKind::Line);
        case.network.branch[0].kind = BranchKind::Transformer;
        assert_eq!(case.network.outage_kind(0), OutageKind::Transformer);
    }
}
