pub mod client;
pub mod rows;
pub mod templates;
#[cfg(feature = "test-utils")]
pub mod testutil;

pub use client::GraphClient;
pub use templates::{template, Template, TemplateArgs};
