//! CLI argument types and parsing helpers.
mod cli;
mod defaults;
pub(crate) mod parsers;
mod types;

#[cfg(test)]
mod tests;

pub use cli::ExporterArgs;
pub use types::{EndpointArg, OutputFormat, PositiveUsize};

pub use defaults::default_endpoints;
pub(crate) use defaults::DEFAULT_USER_AGENT;
