//! Linear ledger: append, validation, and single-snapshot rollback

use crate::block::unix_now;
use crate::monitor::MaliciousActivityMonitor;
use crate::{constants, Block, BlockHeight, Result, StakeRegistry, TransactionData, ValidatorId};
use rand::Rng;
use tracing::info;

/// Tunables for chain growth.
#[derive(Debug, Clone)]
pub struct ChainConfig {
    /// Leading zero hex digits required of every sealed block hash
    pub difficulty: usize,

    /// Attempt budget for mining during append; `None` searches without
    /// bound, matching the classic blocking behavior
    pub max_mining_attempts: Option<u64>,
}

impl Default for ChainConfig {
    fn default() -> Self {
        Self {
            difficulty: constants::DEFAULT_DIFFICULTY,
            max_mining_attempts: None,
        }
    }
}

/// Ordered sequence of blocks plus the single rollback snapshot.
///
/// The snapshot holds exactly one generation of history: it is overwritten
/// immediately before each append, so a rollback always lands on the state
/// that preceded the in-flight block. Tampering older than one append cycle
/// cannot be undone through it; a bounded ring of N snapshots is the natural
/// extension point if deeper rollback is ever wanted.
#[derive(Debug, Clone)]
pub struct Chain {
    blocks: Vec<Block>,
    config: ChainConfig,
    backup: Option<Vec<Block>>,
}

impl Chain {
    /// Create a chain holding only the genesis block.
    pub fn new(config: ChainConfig) -> Result<Self> {
        let genesis = Block::genesis(unix_now())?;
        Ok(Self {
            blocks: vec![genesis],
            config,
            backup: None,
        })
    }

    /// The newest block. The chain always holds at least genesis.
    pub fn tip(&self) -> &Block {
        self.blocks.last().expect("chain always holds genesis")
    }

    /// Height of the tip (genesis is height 0).
    pub fn height(&self) -> BlockHeight {
        self.blocks.len() as BlockHeight - 1
    }

    /// All blocks in order.
    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    /// Block at the given height, if present.
    pub fn block(&self, height: BlockHeight) -> Option<&Block> {
        self.blocks.get(height as usize)
    }

    /// Standing proof-of-work difficulty.
    pub fn difficulty(&self) -> usize {
        self.config.difficulty
    }

    /// Whether a rollback snapshot is currently held.
    pub fn has_backup(&self) -> bool {
        self.backup.is_some()
    }

    /// Mine and append a block carrying `transactions`.
    ///
    /// The step order is load-bearing: the validator label is drawn first,
    /// the snapshot is taken before the new block exists, and the tamper
    /// monitor runs after the push so a detected violation rolls the chain
    /// back to the pre-append state. The selected validator is attribution
    /// only; it does not perform the mining. A `MiningTimeout` (when a
    /// budget is configured) propagates before the push, leaving the chain
    /// unchanged.
    pub fn append<R: Rng + ?Sized>(
        &mut self,
        transactions: TransactionData,
        registry: &StakeRegistry,
        rng: &mut R,
    ) -> Result<ValidatorId> {
        let validator = registry.select_validator(rng)?;

        self.backup = Some(self.blocks.clone());

        let mut block = Block::new(
            self.blocks.len() as BlockHeight,
            self.tip().hash.clone(),
            transactions,
            unix_now(),
        )?;

        info!(height = block.index, %validator, "mining initiated");
        match self.config.max_mining_attempts {
            Some(budget) => block.mine_bounded(self.config.difficulty, budget)?,
            None => block.mine(self.config.difficulty)?,
        }

        self.blocks.push(block);
        MaliciousActivityMonitor::audit(self, &validator);

        Ok(validator)
    }

    /// Full integrity check: every non-genesis block's stored hash must
    /// equal its recomputed digest, and its `previous_hash` must match the
    /// prior block's hash. Short-circuits on the first violation.
    pub fn validate(&self) -> bool {
        for pair in self.blocks.windows(2) {
            let (previous, current) = (&pair[0], &pair[1]);

            match current.calculate_hash() {
                Ok(digest) if digest == current.hash => {}
                _ => return false,
            }

            if current.previous_hash != previous.hash {
                return false;
            }
        }
        true
    }

    /// Replace the live blocks with the rollback snapshot. Returns `false`
    /// when no snapshot has been taken yet. The snapshot itself stays in
    /// place until the next append overwrites it.
    pub fn restore(&mut self) -> bool {
        match &self.backup {
            Some(snapshot) => {
                info!(height = snapshot.len() - 1, "chain restored from snapshot");
                self.blocks = snapshot.clone();
                true
            }
            None => false,
        }
    }

    /// Overwrite the tip block in place. Only the attack simulator performs
    /// this; regular growth goes through [`append`](Self::append).
    pub(crate) fn replace_tip(&mut self, block: Block) {
        let last = self.blocks.len() - 1;
        self.blocks[last] = block;
    }

    #[cfg(test)]
    pub(crate) fn blocks_mut(&mut self) -> &mut Vec<Block> {
        &mut self.blocks
    }
}
