//! Tamper detection over the chain and the automatic rollback trigger

use crate::{Block, Chain, ValidatorId};
use tracing::{debug, warn};

/// Watches the chain for hash-linkage breaks after every append.
///
/// Detection is association, not proof: the validator label reported on a
/// hit is simply the identity attributed to the append that preceded the
/// scan.
pub struct MaliciousActivityMonitor;

impl MaliciousActivityMonitor {
    /// Scan consecutive blocks for a `previous_hash` that does not match
    /// the prior block's stored hash.
    ///
    /// Deliberately weaker than [`Chain::validate`]: each block's own
    /// digest is not recomputed, so an in-place rewrite whose hash was
    /// recomputed (and whose linkage is intact) passes unnoticed here.
    pub fn detect(blocks: &[Block]) -> bool {
        blocks
            .windows(2)
            .any(|pair| pair[1].previous_hash != pair[0].hash)
    }

    /// Post-append audit: on detection, restore the chain from its snapshot
    /// unconditionally and report the validator label associated with the
    /// append. Returns whether tampering was found.
    pub fn audit(chain: &mut Chain, validator: &ValidatorId) -> bool {
        if Self::detect(chain.blocks()) {
            warn!(%validator, "malicious activity detected, restoring chain");
            chain.restore();
            true
        } else {
            debug!(%validator, "no malicious activity detected");
            false
        }
    }
}
