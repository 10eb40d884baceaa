#[macro_use]
pub mod log;
pub mod fixed;
pub mod math;
