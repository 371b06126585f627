use serde::{Deserialize, Serialize};

use crate::external::WalletProvider;
use crate::identity::IdentityLinkRegistry;

/// Environmental facts about one player, gathered from the wallet
/// provider and the identity registry. These capture "I am able",
/// as opposed to the lobby ready flag which captures "I am ready".
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerFacts {
    pub primary_connected: bool,
    pub secondary_connected: bool,
    pub on_correct_network: bool,
    pub has_linked_address: bool,
}

impl PlayerFacts {
    pub fn eligible(&self) -> bool {
        self.primary_connected
            && self.secondary_connected
            && self.on_correct_network
            && self.has_linked_address
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GateDecision {
    pub creator_ready: bool,
    pub joiner_ready: bool,
    pub can_start: bool,
}

/// Pure gate evaluation. Re-run on every relevant fact change; the
/// result never persists anywhere, which is what keeps a wallet
/// disconnect from leaving a stale "ready" behind.
pub fn evaluate(creator: PlayerFacts, joiner: PlayerFacts) -> GateDecision {
    let creator_ready = creator.eligible();
    let joiner_ready = joiner.eligible();
    GateDecision {
        creator_ready,
        joiner_ready,
        can_start: creator_ready && joiner_ready,
    }
}

/// Gather one player's facts from the external collaborators. The
/// wallet is only ever read here — the core never signs anything.
pub fn gather_facts(
    wallet: &dyn WalletProvider,
    registry: &IdentityLinkRegistry,
    primary_address: &str,
) -> PlayerFacts {
    let primary = wallet.connected_primary_account();
    PlayerFacts {
        primary_connected: primary.as_deref() == Some(primary_address),
        secondary_connected: wallet.connected_secondary_account().is_some(),
        on_correct_network: wallet.on_expected_network(),
        has_linked_address: registry.resolve(primary_address).is_some(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn all_true() -> PlayerFacts {
        PlayerFacts {
            primary_connected: true,
            secondary_connected: true,
            on_correct_network: true,
            has_linked_address: true,
        }
    }

    #[test]
    fn all_facts_true_can_start() {
        let decision = evaluate(all_true(), all_true());
        assert!(decision.creator_ready);
        assert!(decision.joiner_ready);
        assert!(decision.can_start);
    }

    #[test]
    fn any_false_fact_blocks_that_player() {
        let variants = [
            PlayerFacts { primary_connected: false, ..all_true() },
            PlayerFacts { secondary_connected: false, ..all_true() },
            PlayerFacts { on_correct_network: false, ..all_true() },
            PlayerFacts { has_linked_address: false, ..all_true() },
        ];
        for facts in variants {
            let decision = evaluate(facts, all_true());
            assert!(!decision.creator_ready);
            assert!(decision.joiner_ready);
            assert!(!decision.can_start);
        }
    }

    #[test]
    fn both_players_must_be_eligible() {
        let blocked = PlayerFacts { on_correct_network: false, ..all_true() };
        assert!(!evaluate(all_true(), blocked).can_start);
        assert!(!evaluate(blocked, all_true()).can_start);
        assert!(!evaluate(blocked, blocked).can_start);
    }

    #[test]
    fn default_facts_are_not_eligible() {
        assert!(!PlayerFacts::default().eligible());
    }
}
