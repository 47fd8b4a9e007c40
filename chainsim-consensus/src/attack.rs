//! Majority-stake attack simulation against the chain tip

use crate::block::unix_now;
use crate::monitor::MaliciousActivityMonitor;
use crate::{constants, Block, Chain, ConsensusError, Result, TransactionData, ValidatorId};
use tracing::{info, warn};

/// Payload substituted by the forged block
const FORGED_PAYLOAD: &str = "Fake Transactions";

/// Models a pooled-stake attempt to rewrite the newest block.
///
/// The forged block mines with a bounded attempt budget, so an attack can
/// genuinely fail to meet the difficulty criterion; the unbounded search
/// used for honest appends would make the failure branch unreachable.
/// Whether the attackers' pooled stake clears the majority threshold is the
/// caller's policy decision, not enforced here.
#[derive(Debug, Clone)]
pub struct AttackSimulator {
    /// Nonce increments the forged block may spend before giving up
    pub max_attempts: u64,
}

impl Default for AttackSimulator {
    fn default() -> Self {
        Self {
            max_attempts: constants::DEFAULT_ATTACK_MINING_ATTEMPTS,
        }
    }
}

impl AttackSimulator {
    /// Create a simulator with an explicit mining budget.
    pub fn new(max_attempts: u64) -> Self {
        Self { max_attempts }
    }

    /// Attempt to substitute a forged block for the current tip.
    ///
    /// The forgery reuses the tip's index and `previous_hash` and swaps in
    /// adversarial transactions. On a successful mine the tip is replaced
    /// in place (a direct ledger overwrite, modeling a rewrite with no
    /// competing validating peers) and the tamper monitor runs afterwards;
    /// since the forgery's linkage is intact, the linkage-only scan does
    /// not undo it. Returns `Ok(false)` with no ledger mutation when the
    /// mining budget runs out.
    pub fn simulate_majority_attack(
        &self,
        chain: &mut Chain,
        attacker_ids: &[ValidatorId],
    ) -> Result<bool> {
        let tip = chain.tip();
        let label: ValidatorId = attacker_ids.join(", ");
        info!(height = tip.index, attackers = %label, "simulating majority attack on the tip");

        let mut forged = Block::new(
            tip.index,
            tip.previous_hash.clone(),
            TransactionData::encode(&FORGED_PAYLOAD)?,
            unix_now(),
        )?;

        match forged.mine_bounded(chain.difficulty(), self.max_attempts) {
            Ok(()) => {
                warn!(hash = %forged.hash, "forged block replaced the tip");
                chain.replace_tip(forged);
                MaliciousActivityMonitor::audit(chain, &label);
                Ok(true)
            }
            Err(ConsensusError::MiningTimeout { attempts }) => {
                info!(attempts, "attack failed to meet the difficulty criterion");
                Ok(false)
            }
            Err(e) => Err(e),
        }
    }
}
