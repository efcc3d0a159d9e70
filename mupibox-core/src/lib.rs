pub mod config;
pub mod mutator;
pub mod request;
pub mod telemetry;
pub mod types;

// Keep the public surface small and intentional.
pub use config::*;
pub use mutator::*;
pub use request::*;
pub use telemetry::*;
pub use types::*;
