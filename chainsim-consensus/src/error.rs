//! Error types for the consensus simulator

use thiserror::Error;

/// Failures surfaced by the core consensus operations.
///
/// Integrity violations are deliberately not represented here: tamper
/// detection and chain validation report booleans, and the append path
/// decides the remedial action (rollback) itself.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConsensusError {
    #[error("no eligible stakeholder with positive stake to select from")]
    EmptyRegistry,

    #[error("registration rejected: {id} was ejected and cannot rejoin the network")]
    RejectedRegistration { id: String },

    #[error("mining gave up after {attempts} attempts without meeting the difficulty target")]
    MiningTimeout { attempts: u64 },

    #[error("serialization error: {0}")]
    Serialization(String),
}
