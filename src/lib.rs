//! Model-Compass core library
//!
//! Reconciles noisy, inconsistently-named LLM benchmark data into a
//! queryable, rankable catalog: heuristic name normalization, exact-match
//! entity resolution, vector-similarity benchmark lookup, cross-benchmark
//! score calibration, and constraint-filtered multi-criteria ranking.
//!
//! Every engine computes from an immutable snapshot passed in by the caller;
//! concurrent ranking requests against the same snapshot need no locking. The
//! only shared mutation is the on-disk index artifact, which is published by
//! atomic rename.

pub mod calibrate;
pub mod catalog;
pub mod config;
pub mod embedding;
pub mod error;
pub mod index;
pub mod ingest;
pub mod normalize;
pub mod rank;
pub mod resolve;
