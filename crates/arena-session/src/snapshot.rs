use battle_engine::BattleState;
use serde::{Deserialize, Serialize};

use crate::lobby::Lobby;
use crate::movelog::MoveRecord;

/// Serializable view of one session, published to subscribers on every
/// committed mutation and returned from every facade operation.
/// `version` is the lobby store version the snapshot was taken at —
/// callers pass it back as the compare-and-swap token.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub version: u64,
    pub lobby: Lobby,
    pub battle_state: Option<BattleState>,
    pub move_log: Option<Vec<MoveRecord>>,
}
