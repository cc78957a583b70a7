use crate::filter::FilterMode;
use crate::topology::TopologyStrategy;
use derive_builder::Builder;

/// Screening options.
#[derive(Debug, Clone, Builder)]
#[builder(default, build_fn(validate = "Self::validate"))]
pub struct ScreenOpt {
    /// How interval topologies are reached from the static network.
    pub topology: TopologyStrategy,

    /// Which branches are evaluated exactly.
    pub filter: FilterMode,

    /// Reference bus. Any bus of the connected network gives the same
    /// flows and violations.
    pub ref_bus: usize,

    /// Relative magnitude below which an unmasked compensation term is
    /// treated as singular. Default value is 1e-10.
    pub pivot_tol: f64,
}

impl Default for ScreenOpt {
    fn default() -> Self {
        Self {
            topology: TopologyStrategy::Exact,
            filter: FilterMode::Bracket,
            ref_bus: 0,
            pivot_tol: 1e-10,
        }
    }
}

impl ScreenOptBuilder {
    fn validate(&self) -> Result<(), String> {
        if let Some(tol) = self.pivot_tol {
            if !(tol >= 0.0 && tol.is_finite()) {
                return Err(format!(
                    "pivot_tol must be finite and non-negative, got {}",
                    tol
                ));
            }
        }
        Ok(())
    }
}
