// Model modules
pub mod common;
pub mod credits;
pub mod training;
