use crate::aggregate::{Aggregator, WorstViolations};
use crate::basecase::{solve_base_case, BaseCase};
use crate::case::{BranchKind, Case, OutageKind};
use crate::debug::format_f64_vec;
use crate::evaluate::{evaluate_survivors, FamilyEval};
use crate::incidence::Incidence;
use crate::mpopt::ScreenOpt;
use crate::sensitivity::{contingency_deltas, Family, FamilyScratch};
use crate::topology::TopologyUpdater;
use anyhow::{bail, Context, Result};
use faer::Mat;
use serde::Serialize;
use std::time::{Duration, Instant};

/// Work done in one interval.
#[derive(Debug, Clone, Default, Serialize)]
pub struct IntervalMetrics {
    pub elapsed: Duration,
    /// Rank of the topology correction (chained strategy only).
    pub switched: usize,
    /// Branches passed to the filter, per outage family.
    pub candidates: [usize; 3],
    /// Branches evaluated exactly, per outage family.
    pub survivors: [usize; 3],
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ScreenMetrics {
    pub setup: Duration,
    pub static_sensitivities: Duration,
    pub interval: Vec<IntervalMetrics>,
}

impl ScreenMetrics {
    pub fn total_survivors(&self) -> usize {
        self.interval
            .iter()
            .map(|m| m.survivors.iter().sum::<usize>())
            .sum()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ScreenResult {
    pub worst: WorstViolations,
    /// Penalty of each contingency in each interval, indexed `[t][k]`.
    pub penalty: Vec<Vec<f64>>,
    pub metrics: ScreenMetrics,
}

impl ScreenResult {
    pub fn total_penalty(&self) -> f64 {
        self.penalty.iter().flatten().sum()
    }
}

/// Buffers reused by every interval.
struct Scratch {
    theta: Mat<f64>,
    q: Vec<f64>,
    survivors: Vec<usize>,
    family: [FamilyScratch; 3],
    eval: [FamilyEval; 3],
}

/// Post-contingency screening of a multi-interval schedule.
pub struct Screener<'a> {
    case: &'a Case,
    opt: ScreenOpt,
    inc: Incidence,
    updater: TopologyUpdater,
    family: [Family; 3],
    s_max: Vec<f64>,
    metrics: ScreenMetrics,
}

impl<'a> Screener<'a> {
    /// Validates the case and computes everything shared by the intervals.
    pub fn new(case: &'a Case, opt: ScreenOpt) -> Result<Self> {
        let t0 = Instant::now();
        case.validate()?;

        let net = &case.network;
        let num_xfr = net.branch.iter().filter(|br| br.is_transformer()).count();
        log::info!(
            "problem dimensions. bus: {}, acl: {}, xfr: {}, dcl: {}, k: {}, t: {}",
            net.num_bus,
            net.branch.len() - num_xfr,
            num_xfr,
            net.dc_line.len(),
            net.contingency.len(),
            case.num_interval()
        );

        if !(opt.pivot_tol >= 0.0 && opt.pivot_tol.is_finite()) {
            bail!("pivot_tol must be finite and non-negative, got {}", opt.pivot_tol);
        }
        let inc = Incidence::new(net, opt.ref_bus)?;
        let updater = TopologyUpdater::new(
            opt.topology,
            opt.pivot_tol,
            &inc,
            &net.branch,
            &case.interval,
        )?;
        let setup = t0.elapsed();

        let t0 = Instant::now();
        let mut family = Family::build(net);
        for fam in family.iter_mut().filter(|f| f.updates_matrix()) {
            fam.w0 = updater
                .static_sensitivities(&inc, &fam.device)
                .with_context(|| format!("{:?} outage sensitivities", fam.kind))?;
        }
        log::info!(
            "contingency delta devices. acl: {}, xfr: {}, dcl: {}",
            family[OutageKind::Line.index()].len(),
            family[OutageKind::Transformer.index()].len(),
            family[OutageKind::DcLine.index()].len()
        );

        Ok(Self {
            case,
            opt,
            inc,
            updater,
            family,
            s_max: net.branch.iter().map(|br| br.s_max_ctg).collect(),
            metrics: ScreenMetrics {
                setup,
                static_sensitivities: t0.elapsed(),
                interval: Vec::with_capacity(case.num_interval()),
            },
        })
    }

    pub fn families(&self) -> &[Family; 3] {
        &self.family
    }

    /// Solves the pre-contingency power flow of interval `t`.
    pub fn base_case(&self, t: usize) -> Result<BaseCase> {
        let net = &self.case.network;
        let iv = &self.case.interval[t];
        let sys = self
            .updater
            .interval(&self.inc, &net.branch, &iv.in_service)
            .with_context(|| format!("interval {}", t))?;
        let (base, _) = solve_base_case(&self.inc, &net.branch, iv, &sys)
            .with_context(|| format!("interval {}", t))?;
        Ok(base)
    }

    /// Screens every interval in order.
    pub fn run(mut self) -> Result<ScreenResult> {
        let case = self.case;
        let net = &case.network;
        let (n, nbr) = (self.inc.dim(), net.branch.len());

        let mut scratch = Scratch {
            theta: Mat::zeros(n, 1),
            q: vec![0.0; nbr],
            survivors: Vec::with_capacity(nbr),
            family: [0, 1, 2].map(|f| FamilyScratch::new(&self.family[f], n, nbr)),
            eval: [0, 1, 2].map(|f| FamilyEval::new(self.family[f].len())),
        };
        let mut agg = Aggregator::new(
            case.num_interval(),
            net.contingency.len(),
            case.violation_cost,
        );

        for t in 0..case.num_interval() {
            let m = self
                .screen_interval(t, &mut scratch, &mut agg)
                .with_context(|| format!("interval {}", t))?;
            log::debug!(
                "interval {}: switched: {}, survivors: {:?}, time: {:?}",
                t,
                m.switched,
                m.survivors,
                m.elapsed
            );
            self.metrics.interval.push(m);
        }

        for (cat, v) in agg.worst().iter() {
            if let Some(v) = v {
                log::info!("max viol {}: {:?}", cat, v);
            }
        }

        let (worst, penalty) = agg.finish();
        Ok(ScreenResult {
            worst,
            penalty,
            metrics: self.metrics,
        })
    }

    fn screen_interval(
        &self,
        t: usize,
        s: &mut Scratch,
        agg: &mut Aggregator,
    ) -> Result<IntervalMetrics> {
        let t0 = Instant::now();
        let net = &self.case.network;
        let iv = &self.case.interval[t];

        let sys = self.updater.interval(&self.inc, &net.branch, &iv.in_service)?;
        let (base, theta) = solve_base_case(&self.inc, &net.branch, iv, &sys)?;
        for (r, &v) in theta.iter().enumerate() {
            s.theta.write(r, 0, v);
        }
        for (j, q) in s.q.iter_mut().enumerate() {
            *q = iv.q_fr[j].abs().max(iv.q_to[j].abs());
        }

        let mut m = IntervalMetrics {
            switched: sys.rank(),
            ..Default::default()
        };
        for (f, fam) in self.family.iter().enumerate() {
            if fam.is_empty() {
                continue;
            }
            let fs = &mut s.family[f];
            contingency_deltas(
                fam,
                &self.inc,
                &net.branch,
                iv,
                &sys,
                &s.theta,
                self.opt.pivot_tol,
                fs,
            )?;

            m.candidates[f] = net.branch.len();
            m.survivors[f] = self.opt.filter.select(
                &base.flow,
                &s.q,
                &self.s_max,
                &fs.delta_flow,
                &mut s.survivors,
            );

            let eval = &mut s.eval[f];
            evaluate_survivors(
                fam,
                &net.branch,
                iv,
                &base.flow,
                &s.q,
                &fs.delta_flow,
                &s.survivors,
                eval,
            );
            agg.record(t, iv.duration, fam, eval);

            for kind in [BranchKind::Line, BranchKind::Transformer] {
                if let Some(c) = eval.worst[kind as usize] {
                    log::trace!(
                        "{:?} outages, worst {:?}: {} on branch {} column {}",
                        fam.kind,
                        kind,
                        c.value,
                        c.branch,
                        c.col
                    );
                }
            }
        }
        log::trace!("penalty[{}]: {}", t, format_f64_vec(&agg.penalty()[t]));

        m.elapsed = t0.elapsed();
        Ok(m)
    }
}

/// Screens `case` for post-contingency thermal violations.
pub fn screen(case: &Case, opt: ScreenOpt) -> Result<ScreenResult> {
    Screener::new(case, opt)?.run()
}
