//! Test utilities and helpers for the sift crates.
//!
//! - Data generation: deterministic random posting lists and text corpora
//! - Fault injection: an output stream that fails on demand
//!
//! The crate depends only on `sift-io`, so that `sift-postings` can use it as a
//! dev-dependency. Generated data is plain Rust values which tests feed into the
//! postings writer themselves.

pub mod data_gen;
pub mod faulty;
