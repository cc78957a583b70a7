use crate::case::{BranchKind, OutageKind};
use crate::evaluate::FamilyEval;
use crate::sensitivity::Family;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Monitored branch kind crossed with outaged device kind.
#[derive(Debug, PartialEq, Eq, Copy, Clone, Serialize, Deserialize)]
pub struct Category {
    pub monitored: BranchKind,
    pub outage: OutageKind,
}

impl Category {
    pub const ALL: [Category; 6] = [
        Category::new(BranchKind::Line, OutageKind::Line),
        Category::new(BranchKind::Line, OutageKind::DcLine),
        Category::new(BranchKind::Line, OutageKind::Transformer),
        Category::new(BranchKind::Transformer, OutageKind::Line),
        Category::new(BranchKind::Transformer, OutageKind::DcLine),
        Category::new(BranchKind::Transformer, OutageKind::Transformer),
    ];

    pub const fn new(monitored: BranchKind, outage: OutageKind) -> Self {
        Self { monitored, outage }
    }

    pub fn index(self) -> usize {
        self.monitored as usize * OutageKind::ALL.len() + self.outage.index()
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let monitored = match self.monitored {
            BranchKind::Line => "acl",
            BranchKind::Transformer => "xfr",
        };
        let outage = match self.outage {
            OutageKind::Line => "acl",
            OutageKind::DcLine => "dcl",
            OutageKind::Transformer => "xfr",
        };
        write!(f, "{}/{}", monitored, outage)
    }
}

/// Apparent power excess of a monitored branch under a contingency.
#[derive(Debug, PartialEq, Copy, Clone, Serialize, Deserialize)]
pub struct Violation {
    pub value: f64,
    /// Monitored branch.
    pub branch: usize,
    /// Outaged branch or DC line.
    pub device: usize,
    /// First contingency outaging `device`.
    pub contingency: usize,
    pub interval: usize,
}

/// Largest violation of each category.
#[derive(Debug, PartialEq, Clone, Default, Serialize, Deserialize)]
pub struct WorstViolations([Option<Violation>; 6]);

impl WorstViolations {
    pub fn get(&self, cat: Category) -> Option<&Violation> {
        self.0[cat.index()].as_ref()
    }

    /// Keeps `v` if it is strictly larger than the current record.
    pub fn offer(&mut self, cat: Category, v: Violation) -> bool {
        let slot = &mut self.0[cat.index()];
        if slot.map_or(true, |w| v.value > w.value) {
            *slot = Some(v);
            true
        } else {
            false
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (Category, Option<&Violation>)> + '_ {
        Category::ALL.iter().map(move |&cat| (cat, self.get(cat)))
    }
}

/// Collects the worst violations and the penalty of every
/// `(interval, contingency)` pair.
pub struct Aggregator {
    cost: f64,
    worst: WorstViolations,
    penalty: Vec<Vec<f64>>,
}

impl Aggregator {
    pub fn new(num_interval: usize, num_contingency: usize, cost: f64) -> Self {
        Self {
            cost,
            worst: WorstViolations::default(),
            penalty: vec![vec![0.0; num_contingency]; num_interval],
        }
    }

    /// Adds the evaluation of `fam` in interval `t`.
    pub fn record(&mut self, t: usize, duration: f64, fam: &Family, eval: &FamilyEval) {
        for monitored in [BranchKind::Line, BranchKind::Transformer] {
            if let Some(c) = eval.worst[monitored as usize] {
                self.worst.offer(
                    Category::new(monitored, fam.kind),
                    Violation {
                        value: c.value,
                        branch: c.branch,
                        device: fam.device[c.col],
                        contingency: fam.first_ctg[c.col],
                        interval: t,
                    },
                );
            }
        }

        let scale = duration * self.cost;
        for &(k, col) in fam.members.iter() {
            self.penalty[t][k] += scale * eval.col_excess[col];
        }
    }

    pub fn worst(&self) -> &WorstViolations {
        &self.worst
    }

    pub fn penalty(&self) -> &[Vec<f64>] {
        &self.penalty
    }

    pub fn finish(self) -> (WorstViolations, Vec<Vec<f64>>) {
        (self.worst, self.penalty)
    }
}
