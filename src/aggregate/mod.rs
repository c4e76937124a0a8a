//! Access-log parsing and per-bucket aggregation.
//!
//! Scan tasks feed parsed [`Observation`]s into the [`AggregateStore`]; the
//! exporter side only ever sees [`StoreSnapshot`] copies taken under read
//! locks.
mod parser;
mod snapshot;
mod store;

#[cfg(test)]
mod tests;

pub use parser::{LogLineParser, LogMethod, Observation};
pub use snapshot::{BucketSample, StoreSnapshot};
pub use store::{AggregateStore, BucketMetrics, TagSet, UNKNOWN_OWNER};
