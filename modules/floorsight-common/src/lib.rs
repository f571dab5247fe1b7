pub mod config;
pub mod error;
pub mod finding;
pub mod types;
pub mod verdict;

pub use config::Config;
pub use error::FloorsightError;
pub use finding::*;
pub use types::*;
pub use verdict::*;
