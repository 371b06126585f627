use battle_engine::{BattleState, CombatantStats, MoveAction};
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::movelog::{MoveLog, MoveRecord};

/// A started battle: the authoritative state plus its move log.
/// The machine is the only writer of both; the move log is appended
/// in the same step that applies the move, so log length always
/// equals the number of accepted moves.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BattleSession {
    state: BattleState,
    log: MoveLog,
}

/// What `submit_move` hands back: the refreshed state and the record
/// that was appended for this move.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MoveResult {
    pub state: BattleState,
    pub record: MoveRecord,
}

impl BattleSession {
    pub fn start(
        creator_address: &str,
        creator_stats: CombatantStats,
        joiner_address: &str,
        joiner_stats: CombatantStats,
    ) -> Self {
        Self {
            state: BattleState::init(
                creator_address,
                creator_stats,
                joiner_address,
                joiner_stats,
            ),
            log: MoveLog::new(),
        }
    }

    pub fn state(&self) -> &BattleState {
        &self.state
    }

    pub fn log(&self) -> &MoveLog {
        &self.log
    }

    /// Apply a move and append its record. The critical decision is
    /// made by the caller before entering this transition, so nothing
    /// stochastic or blocking happens while state is being updated.
    pub fn submit_move(
        &mut self,
        player: &str,
        action: MoveAction,
        critical: bool,
    ) -> Result<MoveResult> {
        let outcome = self.state.apply_move(player, action, critical)?;

        let record = MoveRecord {
            turn_number: outcome.turn_number,
            player: player.to_string(),
            action,
            damage: action.is_damaging().then_some(outcome.damage),
            was_critical: action.is_damaging().then_some(outcome.was_critical),
            tx_hash: None,
        };
        self.log.append(record.clone());

        Ok(MoveResult {
            state: self.state.clone(),
            record,
        })
    }

    pub fn attach_settlement(&mut self, turn_number: u32, tx_hash: &str) -> Result<MoveRecord> {
        self.log
            .attach_settlement(turn_number, tx_hash)
            .map(|r| r.clone())
    }
}
