// Branch //

// define branch kinds
pub(crate) const LINE: usize = 0;
pub(crate) const XFR: usize = 1;

// define the indices
pub(crate) const BR_KIND: usize = 0; // kind, 0 - AC line, 1 - transformer
pub(crate) const F_BUS: usize = 1; // f, from bus number
pub(crate) const T_BUS: usize = 2; // t, to bus number
pub(crate) const BR_B: usize = 3; // b, series susceptance (p.u.)
pub(crate) const RATE_A: usize = 4; // rateA, normal rating (p.u.)
pub(crate) const RATE_C: usize = 5; // rateC, contingency rating (p.u.)

// DC line //

pub(crate) const DC_F_BUS: usize = 0; // f, from bus number
pub(crate) const DC_T_BUS: usize = 1; // t, to bus number

// Contingency //

// define outaged device types
pub(crate) const OUT_BRANCH: usize = 0;
pub(crate) const OUT_DCLINE: usize = 1;

pub(crate) const CTG_TYPE: usize = 0; // type of outaged device
pub(crate) const CTG_DEVICE: usize = 1; // index of outaged device
