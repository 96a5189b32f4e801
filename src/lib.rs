//! Synthetic population generation.
//!
//! For each geographic area, draws a population of individuals with
//! replacement from a shared pool of survey microdata records so that
//! the selected records' aggregated attribute totals match the area's
//! census constraint totals as closely as possible under a chosen
//! divergence. The search is simulated annealing over multisets of
//! record indices, run in parallel across areas.
//!
//! - **[`divergence`]**: Divergence metrics between target and
//!   achieved totals, selected by name from configuration.
//! - **[`population`]**: The microdata pool, per-area constraints,
//!   the feasibility predicate, and result records.
//! - **[`annealer`]**: The per-area proposal/accept loop with
//!   incremental aggregate bookkeeping, stagnation detection, and
//!   reheating.
//! - **[`coordinator`]**: The worker pool that fans anneals out
//!   across areas and streams results to the output sinks.
//! - **[`random`]**: Master/worker RNG seeding for reproducible runs.
//! - **[`error`]**: The crate-wide error taxonomy.
//!
//! # Architecture
//!
//! The crate performs no input parsing and no I/O of its own: callers
//! hand it an in-memory constraint table and microdata pool, and it
//! hands every per-area solution to injected sinks. Scheduling is
//! parallel across areas and sequential within an area; each worker
//! owns its random source and its search state exclusively.

pub mod annealer;
pub mod coordinator;
pub mod divergence;
pub mod error;
pub mod population;
pub mod random;
