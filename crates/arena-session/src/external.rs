//! Abstract contracts for the external collaborators the orchestrator
//! consumes. All implementations live outside this crate; tests use
//! hand-rolled fakes.

use battle_engine::{roll_critical, CombatantStats};

use crate::error::Result;
use crate::lobby::NftRef;
use crate::movelog::MoveRecord;

/// Read-only view of the player's wallet extension. Fact gathering
/// only; the core never performs signing.
pub trait WalletProvider: Send + Sync {
    fn connected_primary_account(&self) -> Option<String>;
    fn connected_secondary_account(&self) -> Option<String>;
    fn on_expected_network(&self) -> bool;
}

/// Resolves NFT metadata into combat stats. Consumed exactly once per
/// combatant at battle initialization; a failure fails `start` closed.
pub trait CombatantResolver: Send + Sync {
    fn resolve_combatant_stats(&self, nft: &NftRef) -> Result<CombatantStats>;
}

/// Submits a move as an on-chain transaction. Fire-and-forget from the
/// state machine's perspective: the returned hash is attached to the
/// move record after the fact, and a failure never rolls back the move.
pub trait SettlementSubmitter: Send + Sync {
    fn submit_move_transaction(
        &self,
        move_record: &MoveRecord,
    ) -> std::result::Result<String, String>;
}

/// Critical-hit decision source, injectable so tests are deterministic.
pub trait CritRoll: Send + Sync {
    fn roll(&self) -> bool;
}

/// Production roll: independent uniform draw at a fixed chance.
pub struct RandomCrit {
    chance: f64,
}

impl RandomCrit {
    pub fn new(chance: f64) -> Self {
        Self { chance }
    }
}

impl Default for RandomCrit {
    fn default() -> Self {
        Self::new(battle_engine::damage::CRIT_CHANCE)
    }
}

impl CritRoll for RandomCrit {
    fn roll(&self) -> bool {
        roll_critical(&mut rand::rng(), self.chance)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn random_crit_at_extremes() {
        assert!(!RandomCrit::new(0.0).roll());
        assert!(RandomCrit::new(1.0).roll());
    }
}
