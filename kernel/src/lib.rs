pub mod logging;
pub mod registry;
pub mod state_machine;
pub mod store;
pub mod test_harness;
pub mod types;
pub mod visibility;

pub mod api;
pub mod error;
pub mod handle;

pub use api::*;
pub use error::*;
pub use handle::*;
pub use types::*;

/// Re-export test harness for external use
pub use test_harness::{run_simulator, SimulatorConfig, TestHarness};
