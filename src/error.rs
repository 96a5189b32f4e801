//! Error types for population synthesis.

use thiserror::Error;

/// Errors that can occur during population synthesis.
///
/// Configuration and schema errors are detected before any annealing
/// starts. Feasibility and sink errors arise while a run is in flight
/// and are surfaced by the coordinator after shutdown.
#[derive(Debug, Error)]
pub enum SynthError {
    /// A configuration parameter is out of range, non-finite, or names
    /// an unknown divergence.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// The constraint table and the microdata table disagree on the
    /// attribute ordering.
    #[error("attribute schema mismatch: constraints [{}] vs microdata [{}]", constraints.join(", "), microdata.join(", "))]
    SchemaMismatch {
        /// Attribute names carried by the constraint table.
        constraints: Vec<String>,
        /// Attribute names carried by the microdata table.
        microdata: Vec<String>,
    },

    /// One or more areas have no microdata record satisfying their
    /// zero-constraints.
    #[error("no feasible microdata records for area(s): {}", areas.join(", "))]
    NoFeasibleRecords {
        /// Identifiers of every affected area.
        areas: Vec<String>,
    },

    /// A result sink failed to accept a write.
    #[error("sink write error: {0}")]
    SinkWrite(#[from] std::io::Error),
}

/// Result type for population synthesis operations.
pub type SynthResult<T> = Result<T, SynthError>;
