mod geo;
mod jail;

pub use geo::*;
pub use jail::*;
