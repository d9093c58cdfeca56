pub mod env;
pub mod math;
