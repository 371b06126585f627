use serde::{Deserialize, Serialize};

/// Combatant type used for damage modifiers. Three types forming a
/// strict advantage cycle; only mirror matchups are neutral.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u8)]
pub enum NftType {
    Fire = 0,
    Water = 1,
    Grass = 2,
}

/// Attack variants a player can submit on their turn.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum MoveAction {
    Strike,
    SpecialAttack,
}

impl MoveAction {
    /// Every current action deals damage. Kept as a method so a future
    /// non-damaging variant only has to change this one place.
    pub fn is_damaging(&self) -> bool {
        matches!(self, MoveAction::Strike | MoveAction::SpecialAttack)
    }
}

/// Stats resolved from NFT metadata at battle initialization.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CombatantStats {
    pub max_hp: u32,
    pub nft_type: NftType,
}

/// One side of an active battle.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Combatant {
    pub address: String,
    pub nft_type: NftType,
    pub max_hp: u32,
    pub current_hp: u32,
}

impl Combatant {
    pub fn new(address: impl Into<String>, stats: CombatantStats) -> Self {
        Self {
            address: address.into(),
            nft_type: stats.nft_type,
            max_hp: stats.max_hp,
            current_hp: stats.max_hp,
        }
    }

    pub fn is_defeated(&self) -> bool {
        self.current_hp == 0
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum BattleStatus {
    Active,
    Finished,
}
