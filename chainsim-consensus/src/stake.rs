//! Stake registry and stake-weighted validator selection

use crate::{ConsensusError, Result, StakeAmount, ValidatorId};
use rand::Rng;
use std::collections::{BTreeMap, BTreeSet};
use tracing::{info, warn};

/// Mapping of participant identity to stake, with permanent ejection.
///
/// Stakeholders live in ordered maps so that selection under a seeded RNG
/// is reproducible run to run.
#[derive(Debug, Clone, Default)]
pub struct StakeRegistry {
    /// Active stakeholders and their stake
    stakeholders: BTreeMap<ValidatorId, StakeAmount>,

    /// Identities permanently barred from re-registering
    ejected: BTreeSet<ValidatorId>,
}

impl StakeRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a stakeholder, overwriting any previous stake for the same
    /// identity. Rejected without state change if the identity was ejected.
    pub fn register(&mut self, id: impl Into<ValidatorId>, stake: StakeAmount) -> Result<()> {
        let id = id.into();
        if self.ejected.contains(&id) {
            warn!(%id, "ejected participant attempted to rejoin");
            return Err(ConsensusError::RejectedRegistration { id });
        }
        self.stakeholders.insert(id, stake);
        Ok(())
    }

    /// Draw one stakeholder with probability proportional to its share of
    /// the total active stake.
    ///
    /// Fails with [`ConsensusError::EmptyRegistry`] when nobody is
    /// registered or the total stake is zero.
    pub fn select_validator<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<ValidatorId> {
        let total = self.total_stake();
        if total == 0 {
            return Err(ConsensusError::EmptyRegistry);
        }

        let target = rng.gen_range(0..total);
        let mut cumulative = 0u64;
        for (id, stake) in &self.stakeholders {
            cumulative += stake;
            if cumulative > target {
                return Ok(id.clone());
            }
        }

        // total > 0 guarantees the walk terminates inside the loop
        Err(ConsensusError::EmptyRegistry)
    }

    /// Remove each identity's stake and bar it from ever re-registering.
    /// Already-ejected identities are left untouched.
    pub fn eject(&mut self, ids: &[ValidatorId]) {
        for id in ids {
            if self.stakeholders.remove(id).is_some() {
                info!(%id, "stakeholder ejected from the network");
            }
            self.ejected.insert(id.clone());
        }
    }

    /// Total stake across active stakeholders.
    pub fn total_stake(&self) -> StakeAmount {
        self.stakeholders.values().sum()
    }

    /// Stake held by `id`, 0 when absent.
    pub fn stake_of(&self, id: &str) -> StakeAmount {
        self.stakeholders.get(id).copied().unwrap_or(0)
    }

    /// Whether `id` has been permanently ejected.
    pub fn is_ejected(&self, id: &str) -> bool {
        self.ejected.contains(id)
    }

    /// Combined stake of the given identities.
    pub fn pooled_stake(&self, ids: &[ValidatorId]) -> StakeAmount {
        ids.iter().map(|id| self.stake_of(id)).sum()
    }

    /// Whether the given identities together hold a strict majority of the
    /// total stake. Policy helper for callers; nothing in the core enforces
    /// it.
    pub fn has_majority(&self, ids: &[ValidatorId]) -> bool {
        let total = self.total_stake();
        total > 0 && self.pooled_stake(ids) * 2 > total
    }

    /// Iterate over active stakeholders in identity order.
    pub fn stakeholders(&self) -> impl Iterator<Item = (&ValidatorId, StakeAmount)> {
        self.stakeholders.iter().map(|(id, stake)| (id, *stake))
    }

    /// Number of active stakeholders.
    pub fn len(&self) -> usize {
        self.stakeholders.len()
    }

    /// Whether no stakeholder is registered.
    pub fn is_empty(&self) -> bool {
        self.stakeholders.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn ids(names: &[&str]) -> Vec<ValidatorId> {
        names.iter().map(|n| n.to_string()).collect()
    }

    #[test]
    fn test_register_and_totals() {
        let mut registry = StakeRegistry::new();
        registry.register("alice", 30).unwrap();
        registry.register("bob", 70).unwrap();

        assert_eq!(registry.total_stake(), 100);
        assert_eq!(registry.stake_of("alice"), 30);
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn test_register_overwrites_stake() {
        let mut registry = StakeRegistry::new();
        registry.register("alice", 30).unwrap();
        registry.register("alice", 55).unwrap();

        assert_eq!(registry.stake_of("alice"), 55);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_empty_registry_selection_fails() {
        let registry = StakeRegistry::new();
        let mut rng = StdRng::seed_from_u64(7);

        assert_eq!(
            registry.select_validator(&mut rng),
            Err(ConsensusError::EmptyRegistry)
        );
    }

    #[test]
    fn test_zero_total_stake_selection_fails() {
        let mut registry = StakeRegistry::new();
        registry.register("alice", 0).unwrap();
        let mut rng = StdRng::seed_from_u64(7);

        assert_eq!(
            registry.select_validator(&mut rng),
            Err(ConsensusError::EmptyRegistry)
        );
    }

    #[test]
    fn test_ejected_identity_cannot_rejoin() {
        let mut registry = StakeRegistry::new();
        registry.register("mallory", 40).unwrap();
        registry.eject(&ids(&["mallory"]));

        let result = registry.register("mallory", 10);
        assert_eq!(
            result,
            Err(ConsensusError::RejectedRegistration {
                id: "mallory".to_string()
            })
        );
        assert_eq!(registry.stake_of("mallory"), 0);
        assert!(registry.is_ejected("mallory"));
    }

    #[test]
    fn test_eject_is_idempotent() {
        let mut registry = StakeRegistry::new();
        registry.register("mallory", 40).unwrap();
        registry.eject(&ids(&["mallory"]));
        registry.eject(&ids(&["mallory"]));

        assert!(registry.is_ejected("mallory"));
        assert_eq!(registry.len(), 0);
    }

    #[test]
    fn test_selection_never_returns_ejected() {
        let mut registry = StakeRegistry::new();
        registry.register("alice", 50).unwrap();
        registry.register("mallory", 50).unwrap();
        registry.eject(&ids(&["mallory"]));

        let mut rng = StdRng::seed_from_u64(11);
        for _ in 0..200 {
            let picked = registry.select_validator(&mut rng).unwrap();
            assert_eq!(picked, "alice");
        }
    }

    #[test]
    fn test_selection_tracks_stake_weights() {
        let mut registry = StakeRegistry::new();
        registry.register("a", 30).unwrap();
        registry.register("b", 70).unwrap();

        let mut rng = StdRng::seed_from_u64(42);
        let draws = 10_000;
        let mut b_count = 0u32;
        for _ in 0..draws {
            if registry.select_validator(&mut rng).unwrap() == "b" {
                b_count += 1;
            }
        }

        let freq = f64::from(b_count) / f64::from(draws);
        assert!(
            (freq - 0.70).abs() < 0.03,
            "expected b to win ~70% of draws, got {freq}"
        );
    }

    #[test]
    fn test_majority_policy_helper() {
        let mut registry = StakeRegistry::new();
        registry.register("a", 30).unwrap();
        registry.register("b", 70).unwrap();

        assert!(registry.has_majority(&ids(&["b"])));
        assert!(!registry.has_majority(&ids(&["a"])));
        assert!(registry.has_majority(&ids(&["a", "b"])));
    }
}
