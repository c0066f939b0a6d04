mod lazy_linear;

pub use lazy_linear::{LazyLinear, LazyLinearConfig};
