pub mod equation;
pub mod search;
pub mod stats;
