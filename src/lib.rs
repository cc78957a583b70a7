mod admittance;
mod aggregate;
mod basecase;
mod case;
mod dense;
mod evaluate;
mod factor;
mod filter;
mod incidence;
mod loadcase;
mod mpopt;
mod screen;
mod sensitivity;
mod topology;
mod traits;

pub mod debug;

pub use admittance::*;
pub use aggregate::*;
pub use basecase::*;
pub use case::*;
pub use evaluate::*;
pub use factor::*;
pub use filter::*;
pub use incidence::*;
pub use loadcase::*;
pub use mpopt::*;
pub use screen::*;
pub use sensitivity::*;
pub use topology::*;
pub use traits::*;

#[cfg(test)]
mod tests;
