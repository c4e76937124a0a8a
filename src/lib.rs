//! Core library for the `bucketstat` CLI.
//!
//! The exporter discovers buckets on one or more S3-compatible endpoints,
//! reads the access-log objects each bucket writes under a key prefix, and
//! keeps per-bucket request counts and byte totals for each HTTP method.
//! [`scan::CycleScheduler`] refreshes those figures on a fixed interval;
//! [`aggregate::AggregateStore::snapshot`] is the read side for exporters.
pub mod aggregate;
pub mod args;
pub mod config;
pub mod entry;
pub mod error;
pub mod logger;
pub mod scan;
pub mod shutdown;
pub mod storage;
mod summary;
