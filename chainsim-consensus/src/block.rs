//! Ledger blocks: construction, canonical hashing, and proof-of-work mining

use crate::{constants, BlockHeight, ConsensusError, Result};
use serde::{Deserialize, Serialize};
use sha3::{Digest, Sha3_256};
use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::debug;

/// Opaque transaction payload, captured as canonical bytes at construction.
///
/// The digest over a block must be byte-stable for identical field values,
/// so payloads are frozen into their canonical encoding once instead of
/// being re-serialized on every hash. Anything `Serialize` can be encoded;
/// callers with pre-canonicalized data can wrap raw bytes directly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionData(Vec<u8>);

impl TransactionData {
    /// Encode any serializable value into its canonical byte form.
    pub fn encode<T: Serialize>(value: &T) -> Result<Self> {
        let bytes = serde_json::to_vec(value)
            .map_err(|e| ConsensusError::Serialization(e.to_string()))?;
        Ok(Self(bytes))
    }

    /// Wrap bytes that are already in canonical form.
    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }

    /// Canonical bytes entering the block digest.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Display for TransactionData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", String::from_utf8_lossy(&self.0))
    }
}

/// A single block in the ledger.
///
/// Identity fields (`index`, `previous_hash`, `transactions`, `timestamp`)
/// are fixed at construction; only `nonce` and `hash` move, and only
/// together, during mining or an explicit adversarial replacement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    /// Position in the chain, strictly increasing by 1 from genesis
    pub index: BlockHeight,

    /// Hex digest of the preceding block, or the genesis sentinel `"0"`
    pub previous_hash: String,

    /// Opaque payload committed by this block
    pub transactions: TransactionData,

    /// Creation instant in seconds since the Unix epoch; hashed but
    /// otherwise informational
    pub timestamp: u64,

    /// Proof-of-work search counter, starts at 0
    pub nonce: u64,

    /// Sha3-256 digest over the five fields above, lowercase hex
    pub hash: String,
}

/// Borrow view of the hashed fields, excluding `hash` itself.
#[derive(Serialize)]
struct HashableBlock<'a> {
    index: BlockHeight,
    previous_hash: &'a str,
    transactions: &'a TransactionData,
    timestamp: u64,
    nonce: u64,
}

impl Block {
    /// Create a new block with `nonce = 0` and its hash computed immediately.
    pub fn new(
        index: BlockHeight,
        previous_hash: String,
        transactions: TransactionData,
        timestamp: u64,
    ) -> Result<Self> {
        let mut block = Block {
            index,
            previous_hash,
            transactions,
            timestamp,
            nonce: 0,
            hash: String::new(),
        };
        block.hash = block.calculate_hash()?;
        Ok(block)
    }

    /// Create the canonical index-0 block.
    pub fn genesis(timestamp: u64) -> Result<Self> {
        Block::new(
            0,
            constants::GENESIS_PREVIOUS_HASH.to_string(),
            TransactionData::from_bytes(constants::GENESIS_PAYLOAD.as_bytes().to_vec()),
            timestamp,
        )
    }

    /// Recompute the digest over the block's hashed fields.
    ///
    /// Pure function of `(index, previous_hash, transactions, timestamp,
    /// nonce)`: identical inputs always produce identical output.
    pub fn calculate_hash(&self) -> Result<String> {
        let preimage = HashableBlock {
            index: self.index,
            previous_hash: &self.previous_hash,
            transactions: &self.transactions,
            timestamp: self.timestamp,
            nonce: self.nonce,
        };
        let bytes = serde_json::to_vec(&preimage)
            .map_err(|e| ConsensusError::Serialization(e.to_string()))?;

        let mut hasher = Sha3_256::new();
        hasher.update(&bytes);
        Ok(hex::encode(hasher.finalize()))
    }

    /// Whether the stored hash starts with `difficulty` zero hex digits.
    pub fn meets_difficulty(&self, difficulty: usize) -> bool {
        self.hash.len() >= difficulty
            && self.hash.bytes().take(difficulty).all(|b| b == b'0')
    }

    /// Proof-of-work search: increment `nonce` and re-hash until the digest
    /// meets the difficulty target.
    ///
    /// Blocking and unbounded; expected ~16^difficulty attempts. Use
    /// [`mine_bounded`](Self::mine_bounded) where giving up must be possible.
    pub fn mine(&mut self, difficulty: usize) -> Result<()> {
        while !self.meets_difficulty(difficulty) {
            self.nonce += 1;
            self.hash = self.calculate_hash()?;
        }
        debug!(index = self.index, nonce = self.nonce, hash = %self.hash, "block mined");
        Ok(())
    }

    /// Bounded proof-of-work search, failing with
    /// [`ConsensusError::MiningTimeout`] once `max_attempts` nonce
    /// increments have been spent without meeting the target.
    pub fn mine_bounded(&mut self, difficulty: usize, max_attempts: u64) -> Result<()> {
        let mut attempts = 0u64;
        while !self.meets_difficulty(difficulty) {
            if attempts >= max_attempts {
                return Err(ConsensusError::MiningTimeout { attempts });
            }
            self.nonce += 1;
            self.hash = self.calculate_hash()?;
            attempts += 1;
        }
        debug!(index = self.index, nonce = self.nonce, hash = %self.hash, "block mined");
        Ok(())
    }
}

/// Current wall-clock time in seconds since the Unix epoch.
pub(crate) fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}
