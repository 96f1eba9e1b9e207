//! Veta - Sequence pattern miner for anomaly-associated sensor readings
//!
//! This library searches multi-dimensional time-ordered readings for short,
//! fixed-length value sequences whose occurrences are statistically
//! associated with externally labeled anomalous rows. The subset lattice is
//! walked under sound pruning (apriori or bi-directional upper-bound) with
//! a run-global memo so repeated windows are never re-evaluated.

pub mod cli;
pub mod config;
pub mod lattice;
pub mod loader;
pub mod miner;
pub mod pattern;
pub mod pattern_store;
pub mod pruning;
pub mod report;
pub mod sequence_index;
