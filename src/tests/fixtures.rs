use crate::case::{Branch, BranchKind, Case, Contingency, DcLine, Interval, Network, Outage};
use crate::tests::idx;
use serde::Deserialize;

/// Network tables in row form, one row per device.
#[derive(Deserialize)]
struct TableCase {
    num_bus: usize,
    branch: Vec<Vec<f64>>,
    #[serde(default)]
    dcline: Vec<Vec<f64>>,
    contingency: Vec<Vec<f64>>,
    interval: Vec<Interval>,
    violation_cost: f64,
}

fn array_to_branch(a: &[f64]) -> Branch {
    Branch {
        kind: match a[idx::BR_KIND] as usize {
            idx::XFR => BranchKind::Transformer,
            idx::LINE => BranchKind::Line,
            _ => BranchKind::Line,
        },

        from_bus: a[idx::F_BUS] as usize,
        to_bus: a[idx::T_BUS] as usize,

        b: a[idx::BR_B],

        s_max: a[idx::RATE_A],
        s_max_ctg: a[idx::RATE_C],
    }
}

fn array_to_dcline(a: &[f64]) -> DcLine {
    DcLine {
        from_bus: a[idx::DC_F_BUS] as usize,
        to_bus: a[idx::DC_T_BUS] as usize,
    }
}

fn array_to_contingency(a: &[f64]) -> Contingency {
    let i = a[idx::CTG_DEVICE] as usize;
    Contingency {
        outage: match a[idx::CTG_TYPE] as usize {
            idx::OUT_DCLINE => Outage::DcLine(i),
            idx::OUT_BRANCH => Outage::Branch(i),
            _ => Outage::Branch(i),
        },
    }
}

fn parse_case(json: &str) -> Case {
    let tc: TableCase = serde_json::from_str(json).unwrap();
    Case {
        network: Network {
            num_bus: tc.num_bus,
            branch: tc.branch.iter().map(|a| array_to_branch(a)).collect(),
            dc_line: tc.dcline.iter().map(|a| array_to_dcline(a)).collect(),
            contingency: tc.contingency.iter().map(|a| array_to_contingency(a)).collect(),
        },
        interval: tc.interval,
        violation_cost: tc.violation_cost,
    }
}

/// Two parallel lines between buses 0 and 1 carrying 80 MW, the first
/// one outaged by contingency 0.
pub(crate) fn two_parallel() -> Case {
    parse_case(
        r#"{
        "num_bus": 2,
        "branch": [
            [0, 0, 1, 100, 50, 50],
            [0, 0, 1, 100, 50, 50]
        ],
        "contingency": [[0, 0]],
        "interval": [{
            "duration": 1,
            "p_inj": [80, -80],
            "in_service": [true, true],
            "phase": [0, 0],
            "q_fr": [0, 0],
            "q_to": [0, 0],
            "dc_p": []
        }],
        "violation_cost": 1
    }"#,
    )
}

/// Triangle of lines 0-1, 1-2 and 0-2 with distinct susceptances.
pub(crate) fn three_bus() -> Case {
    parse_case(
        r#"{
        "num_bus": 3,
        "branch": [
            [0, 0, 1, 10, 1, 1],
            [0, 1, 2, 20, 1, 1],
            [0, 0, 2, 30, 1, 1]
        ],
        "contingency": [[0, 1]],
        "interval": [{
            "duration": 1,
            "p_inj": [1.0, 0.5, -1.5],
            "in_service": [true, true, true],
            "phase": [0, 0, 0],
            "q_fr": [0, 0, 0],
            "q_to": [0, 0, 0],
            "dc_p": []
        }],
        "violation_cost": 1
    }"#,
    )
}

/// Line 0-1 and a triangle on buses 2, 3 and 4 with no branch between
/// the two groups.
pub(crate) fn island() -> Case {
    parse_case(
        r#"{
        "num_bus": 5,
        "branch": [
            [0, 0, 1, -10.3, 1, 1],
            [0, 2, 3, -7.7, 1, 1],
            [0, 3, 4, -3.1, 1, 1],
            [0, 2, 4, -13.7, 1, 1]
        ],
        "contingency": [[0, 1]],
        "interval": [{
            "duration": 1,
            "p_inj": [0.4, -0.2, 0.2, 0.5, -0.9],
            "in_service": [true, true, true, true],
            "phase": [0, 0, 0, 0],
            "q_fr": [0, 0, 0, 0],
            "q_to": [0, 0, 0, 0],
            "dc_p": []
        }],
        "violation_cost": 1
    }"#,
    )
}

/// Meshed five bus network with two phase shifting transformers, two DC
/// lines and eight contingencies over three intervals.
///
/// Branch 4 is switched off in interval 1, branches 2 and 7 in
/// interval 2. Contingencies 5 and 7 outage those branches, contingency
/// 0 is a line outage.
pub(crate) fn five_bus() -> Case {
    parse_case(
        r#"{
        "num_bus": 5,
        "branch": [
            [0, 0, 1, -10, 1.0, 0.9],
            [0, 0, 2, -8, 1.0, 0.8],
            [0, 1, 2, -12, 1.0, 0.6],
            [1, 1, 3, -15, 1.0, 0.7],
            [0, 2, 3, -9, 1.0, 0.6],
            [0, 3, 4, -11, 1.0, 0.4],
            [1, 2, 4, -7, 1.0, 0.6],
            [0, 1, 4, -6, 1.0, 0.35]
        ],
        "dcline": [
            [0, 4],
            [1, 3]
        ],
        "contingency": [
            [0, 0], [0, 3], [1, 0], [0, 5], [0, 6], [0, 2], [1, 1], [0, 7]
        ],
        "interval": [
            {
                "duration": 1,
                "p_inj": [1.2, -0.3, 0.5, -0.6, -0.9],
                "in_service": [true, true, true, true, true, true, true, true],
                "phase": [0, 0, 0, 0.02, 0, 0, -0.03, 0],
                "q_fr": [0.05, -0.02, 0, 0.1, 0, 0.03, -0.08, 0],
                "q_to": [-0.06, 0.02, 0, -0.09, 0, -0.04, 0.07, 0],
                "dc_p": [0.3, -0.2]
            },
            {
                "duration": 0.5,
                "p_inj": [0.9, -0.5, 0.8, -0.4, -0.6],
                "in_service": [true, true, true, true, false, true, true, true],
                "phase": [0, 0, 0, 0.04, 0, 0, 0.01, 0],
                "q_fr": [0.02, 0.01, 0.05, 0.12, 0, 0.02, -0.05, 0.01],
                "q_to": [-0.02, -0.01, -0.06, -0.1, 0, -0.02, 0.04, -0.01],
                "dc_p": [0.1, 0.25]
            },
            {
                "duration": 2,
                "p_inj": [1.5, -0.2, 0.1, -0.7, -0.5],
                "in_service": [true, true, false, true, true, true, true, false],
                "phase": [0, 0, 0, -0.02, 0, 0, 0.05, 0],
                "q_fr": [0.1, 0.04, 0, 0.08, 0.02, 0.06, -0.03, 0],
                "q_to": [-0.11, -0.05, 0, -0.07, -0.02, -0.05, 0.02, 0],
                "dc_p": [-0.2, 0]
            }
        ],
        "violation_cost": 1000
    }"#,
    )
}

/// `five_bus` with every branch in service in every interval.
pub(crate) fn five_bus_static() -> Case {
    let mut case = five_bus();
    for iv in case.interval.iter_mut() {
        iv.in_service.iter_mut().for_each(|u| *u = true);
    }
    case
}
