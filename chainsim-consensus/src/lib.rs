//! Hybrid PoW/PoS consensus simulator
//!
//! This crate models a single linear ledger secured by a hybrid scheme:
//! stake-weighted selection picks the validator attributed to each block,
//! while a proof-of-work search actually seals it. A tamper monitor runs
//! after every append and rolls the chain back from a single backup
//! snapshot when the hash linkage breaks, and an attack simulator models a
//! majority-stake rewrite attempt against the chain tip.

pub mod attack;
pub mod block;
pub mod chain;
pub mod consensus;
pub mod error;
pub mod monitor;
pub mod stake;

pub use attack::AttackSimulator;
pub use block::{Block, TransactionData};
pub use chain::{Chain, ChainConfig};
pub use consensus::ConsensusEngine;
pub use error::ConsensusError;
pub use monitor::MaliciousActivityMonitor;
pub use stake::StakeRegistry;

/// Result type for consensus operations
pub type Result<T> = std::result::Result<T, ConsensusError>;

/// Stake amount held by a participant (using u64 for simplicity)
pub type StakeAmount = u64;

/// Block height in the ledger
pub type BlockHeight = u64;

/// Participant identity label (nominal only, no cryptographic binding)
pub type ValidatorId = String;

/// Simulator protocol version
pub const PROTOCOL_VERSION: &str = "0.1.0";

/// Ledger configuration constants
pub mod constants {
    /// `previous_hash` sentinel carried by the genesis block
    pub const GENESIS_PREVIOUS_HASH: &str = "0";

    /// Fixed payload marker of the genesis block
    pub const GENESIS_PAYLOAD: &str = "Genesis Block";

    /// Default number of leading zero hex digits a sealed hash must carry
    pub const DEFAULT_DIFFICULTY: usize = 4;

    /// Length of a Sha3-256 digest in lowercase hex characters
    pub const HASH_HEX_LEN: usize = 64;

    /// Default attempt budget for the bounded mining used on the attack path
    pub const DEFAULT_ATTACK_MINING_ATTEMPTS: u64 = 1 << 20;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_constant() {
        assert!(!PROTOCOL_VERSION.is_empty());
    }

    #[test]
    fn test_genesis_sentinel_is_not_a_real_digest() {
        assert_ne!(
            constants::GENESIS_PREVIOUS_HASH.len(),
            constants::HASH_HEX_LEN
        );
    }
}
