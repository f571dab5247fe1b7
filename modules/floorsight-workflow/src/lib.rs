pub mod analyst;
pub mod answer;
pub mod router;
pub mod scope;
pub mod state;
pub mod stats;
pub mod traits;
pub mod verifier;
pub mod workflow;

#[cfg(any(test, feature = "test-support"))]
pub mod testing;

pub use stats::RunStats;
pub use state::WorkflowState;
pub use workflow::{RunOptions, Workflow};
