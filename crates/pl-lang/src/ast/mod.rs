mod display;
mod eval;
mod expr;
mod rule;
mod value;

pub use expr::*;
pub use rule::*;
pub use value::*;
