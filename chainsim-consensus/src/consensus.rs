//! Engine facade tying the registry, chain, monitor, and attack simulator
//! together behind the surface a driver consumes.

use crate::{
    AttackSimulator, Chain, ChainConfig, Result, StakeAmount, StakeRegistry, TransactionData,
    ValidatorId,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// The simulator's top-level engine.
///
/// Owns the ledger, the stake registry, and the injected randomness source;
/// all sampling flows through the one RNG, so an engine built from a seed
/// replays identically.
pub struct ConsensusEngine<R: Rng> {
    chain: Chain,
    registry: StakeRegistry,
    simulator: AttackSimulator,
    rng: R,
}

impl ConsensusEngine<StdRng> {
    /// Build an engine whose randomness derives entirely from `seed`.
    pub fn from_seed(seed: u64, config: ChainConfig) -> Result<Self> {
        Self::with_rng(StdRng::seed_from_u64(seed), config)
    }
}

impl<R: Rng> ConsensusEngine<R> {
    /// Build an engine around an explicit randomness source.
    pub fn with_rng(rng: R, config: ChainConfig) -> Result<Self> {
        Ok(Self {
            chain: Chain::new(config)?,
            registry: StakeRegistry::new(),
            simulator: AttackSimulator::default(),
            rng,
        })
    }

    /// Register a stakeholder; rejected if the identity was ejected.
    pub fn register_stakeholder(
        &mut self,
        id: impl Into<ValidatorId>,
        stake: StakeAmount,
    ) -> Result<()> {
        self.registry.register(id, stake)
    }

    /// Draw a stake-weighted validator without appending anything.
    pub fn select_validator(&mut self) -> Result<ValidatorId> {
        self.registry.select_validator(&mut self.rng)
    }

    /// Mine and append a block; returns the validator label attributed to
    /// the append.
    pub fn append_block(&mut self, transactions: TransactionData) -> Result<ValidatorId> {
        self.chain.append(transactions, &self.registry, &mut self.rng)
    }

    /// Full hash-and-linkage integrity check over the whole chain.
    pub fn is_chain_valid(&self) -> bool {
        self.chain.validate()
    }

    /// Linkage-only tamper scan.
    pub fn detect_tampering(&self) -> bool {
        crate::MaliciousActivityMonitor::detect(self.chain.blocks())
    }

    /// Permanently eject the given identities from the stake registry.
    pub fn eject(&mut self, ids: &[ValidatorId]) {
        self.registry.eject(ids);
    }

    /// Roll the chain back to its single retained snapshot.
    pub fn restore(&mut self) -> bool {
        self.chain.restore()
    }

    /// Run the majority-attack simulation against the chain tip.
    pub fn simulate_attack(&mut self, attacker_ids: &[ValidatorId]) -> Result<bool> {
        self.simulator.simulate_majority_attack(&mut self.chain, attacker_ids)
    }

    /// Override the attack path's bounded mining budget.
    pub fn set_attack_mining_attempts(&mut self, max_attempts: u64) {
        self.simulator = AttackSimulator::new(max_attempts);
    }

    /// Read access to the ledger.
    pub fn chain(&self) -> &Chain {
        &self.chain
    }

    /// Read access to the stake registry.
    pub fn registry(&self) -> &StakeRegistry {
        &self.registry
    }
}
