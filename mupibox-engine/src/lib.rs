pub mod effects;
pub mod report;
pub mod runner;
pub mod traits;
pub mod workflow;
