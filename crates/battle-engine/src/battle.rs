use serde::{Deserialize, Serialize};

use crate::damage::compute_damage;
use crate::types::{BattleStatus, Combatant, CombatantStats, MoveAction};

/// Move rejection reasons surfaced by the state machine.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum BattleError {
    /// The battle already reached a terminal state.
    BattleFinished,
    /// The submitting player is not the active player (or not a
    /// combatant at all).
    NotActivePlayer,
}

impl std::fmt::Display for BattleError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BattleError::BattleFinished => write!(f, "battle is finished"),
            BattleError::NotActivePlayer => write!(f, "not the active player"),
        }
    }
}

impl std::error::Error for BattleError {}

/// Result of one accepted move.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveOutcome {
    /// Turn the move was executed on.
    pub turn_number: u32,
    pub damage: u32,
    pub was_critical: bool,
    /// Type multiplier x100 that was applied.
    pub mult_x100: u32,
    pub finished: bool,
    pub winner: Option<String>,
}

/// Turn-based battle state for exactly two combatants.
///
/// Index 0 is always the lobby creator and acts first. The struct is
/// the single writer of HP and turn fields; callers decide the
/// critical roll and pass it in so the transition stays deterministic.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BattleState {
    combatants: [Combatant; 2],
    turn_number: u32,
    active_idx: usize,
    status: BattleStatus,
    winner: Option<String>,
}

impl BattleState {
    /// Initialize from resolved NFT stats. Creator is combatant 0 and
    /// takes turn 1.
    pub fn init(
        creator_address: impl Into<String>,
        creator_stats: CombatantStats,
        joiner_address: impl Into<String>,
        joiner_stats: CombatantStats,
    ) -> Self {
        Self {
            combatants: [
                Combatant::new(creator_address, creator_stats),
                Combatant::new(joiner_address, joiner_stats),
            ],
            turn_number: 1,
            active_idx: 0,
            status: BattleStatus::Active,
            winner: None,
        }
    }

    pub fn combatants(&self) -> &[Combatant; 2] {
        &self.combatants
    }

    pub fn turn_number(&self) -> u32 {
        self.turn_number
    }

    pub fn active_player(&self) -> &str {
        &self.combatants[self.active_idx].address
    }

    pub fn status(&self) -> BattleStatus {
        self.status
    }

    pub fn winner(&self) -> Option<&str> {
        self.winner.as_deref()
    }

    pub fn is_finished(&self) -> bool {
        self.status == BattleStatus::Finished
    }

    /// Execute one move for `player`.
    ///
    /// Rejected moves leave the state untouched. An accepted move
    /// applies damage to the defender (clamped at 0), and either
    /// finishes the battle or advances the turn and flips the active
    /// player.
    pub fn apply_move(
        &mut self,
        player: &str,
        action: MoveAction,
        critical: bool,
    ) -> Result<MoveOutcome, BattleError> {
        if self.status == BattleStatus::Finished {
            return Err(BattleError::BattleFinished);
        }
        if player != self.combatants[self.active_idx].address {
            return Err(BattleError::NotActivePlayer);
        }

        let defender_idx = 1 - self.active_idx;
        let (damage, mult_x100) = compute_damage(
            action,
            self.combatants[self.active_idx].nft_type,
            self.combatants[defender_idx].nft_type,
            critical,
        );

        let defender = &mut self.combatants[defender_idx];
        defender.current_hp = defender.current_hp.saturating_sub(damage);

        let executed_turn = self.turn_number;
        let finished = self.combatants[defender_idx].is_defeated();

        if finished {
            self.status = BattleStatus::Finished;
            self.winner = Some(self.combatants[self.active_idx].address.clone());
        } else {
            self.turn_number += 1;
            self.active_idx = defender_idx;
        }

        Ok(MoveOutcome {
            turn_number: executed_turn,
            damage,
            was_critical: critical,
            mult_x100,
            finished,
            winner: self.winner.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::NftType;

    fn stats(max_hp: u32, nft_type: NftType) -> CombatantStats {
        CombatantStats { max_hp, nft_type }
    }

    fn fresh_battle() -> BattleState {
        // Creator Fire vs joiner Grass: creator is strong, joiner weak.
        BattleState::init(
            "creator",
            stats(100, NftType::Fire),
            "joiner",
            stats(100, NftType::Grass),
        )
    }

    #[test]
    fn init_sets_turn_1_creator_active() {
        let battle = fresh_battle();
        assert_eq!(battle.turn_number(), 1);
        assert_eq!(battle.active_player(), "creator");
        assert_eq!(battle.status(), BattleStatus::Active);
        assert_eq!(battle.winner(), None);
        assert_eq!(battle.combatants()[0].current_hp, 100);
        assert_eq!(battle.combatants()[1].current_hp, 100);
    }

    #[test]
    fn non_active_player_rejected_state_unchanged() {
        let mut battle = fresh_battle();
        let before = battle.clone();

        let err = battle
            .apply_move("joiner", MoveAction::Strike, false)
            .unwrap_err();
        assert_eq!(err, BattleError::NotActivePlayer);
        assert_eq!(battle, before);
    }

    #[test]
    fn unknown_player_rejected() {
        let mut battle = fresh_battle();
        let err = battle
            .apply_move("stranger", MoveAction::Strike, false)
            .unwrap_err();
        assert_eq!(err, BattleError::NotActivePlayer);
    }

    #[test]
    fn accepted_move_advances_turn_and_flips_active() {
        let mut battle = fresh_battle();

        // Fire strike vs Grass: 20 * 150 / 100 = 30
        let outcome = battle
            .apply_move("creator", MoveAction::Strike, false)
            .unwrap();
        assert_eq!(outcome.turn_number, 1);
        assert_eq!(outcome.damage, 30);
        assert!(!outcome.was_critical);
        assert!(!outcome.finished);

        assert_eq!(battle.combatants()[1].current_hp, 70);
        assert_eq!(battle.turn_number(), 2);
        assert_eq!(battle.active_player(), "joiner");
    }

    #[test]
    fn turn_numbers_strictly_increase_and_players_alternate() {
        let mut battle = fresh_battle();
        let mut expected_turn = 1;

        while !battle.is_finished() {
            let player = battle.active_player().to_string();
            let outcome = battle
                .apply_move(&player, MoveAction::Strike, false)
                .unwrap();
            assert_eq!(outcome.turn_number, expected_turn);
            expected_turn += 1;
            if !battle.is_finished() {
                assert_ne!(battle.active_player(), player);
                assert_eq!(battle.turn_number(), expected_turn);
            }
            assert!(expected_turn < 100, "battle did not terminate");
        }
    }

    #[test]
    fn hp_clamped_at_zero_and_battle_finishes() {
        let mut battle = BattleState::init(
            "creator",
            stats(100, NftType::Fire),
            "joiner",
            stats(10, NftType::Grass),
        );

        // 30 damage into 10 HP: clamp at 0, not underflow
        let outcome = battle
            .apply_move("creator", MoveAction::Strike, false)
            .unwrap();
        assert!(outcome.finished);
        assert_eq!(outcome.winner.as_deref(), Some("creator"));
        assert_eq!(battle.combatants()[1].current_hp, 0);
        assert_eq!(battle.status(), BattleStatus::Finished);
        assert_eq!(battle.winner(), Some("creator"));
        // Turn does not advance past the finishing move
        assert_eq!(battle.turn_number(), 1);
    }

    #[test]
    fn no_moves_accepted_after_finish() {
        let mut battle = BattleState::init(
            "creator",
            stats(100, NftType::Fire),
            "joiner",
            stats(10, NftType::Grass),
        );
        battle
            .apply_move("creator", MoveAction::Strike, false)
            .unwrap();

        for player in ["creator", "joiner"] {
            let err = battle
                .apply_move(player, MoveAction::Strike, false)
                .unwrap_err();
            assert_eq!(err, BattleError::BattleFinished);
        }
    }

    #[test]
    fn critical_strike_doubles_damage() {
        let mut battle = fresh_battle();
        let outcome = battle
            .apply_move("creator", MoveAction::Strike, true)
            .unwrap();
        assert!(outcome.was_critical);
        assert_eq!(outcome.damage, 60);
        assert_eq!(battle.combatants()[1].current_hp, 40);
    }

    #[test]
    fn hp_never_exceeds_max_nor_goes_negative() {
        let mut battle = fresh_battle();
        while !battle.is_finished() {
            let player = battle.active_player().to_string();
            battle
                .apply_move(&player, MoveAction::SpecialAttack, true)
                .unwrap();
            for c in battle.combatants() {
                assert!(c.current_hp <= c.max_hp);
            }
        }
        assert!(battle
            .combatants()
            .iter()
            .any(|c| c.current_hp == 0));
    }
}
