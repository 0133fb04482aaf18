pub mod rules;
pub mod stay;

pub use rules::*;
