//! Deterministic combat math for two-combatant NFT battles.
//!
//! Everything in this crate is pure state transition: no I/O, no clocks,
//! no hidden randomness. The critical-hit draw is the single stochastic
//! input and is always passed in by the caller, so every outcome is
//! reproducible in tests.

pub mod battle;
pub mod damage;
pub mod elements;
pub mod types;

pub use battle::{BattleError, BattleState, MoveOutcome};
pub use damage::{compute_damage, roll_critical};
pub use elements::type_multiplier;
pub use types::{BattleStatus, Combatant, CombatantStats, MoveAction, NftType};
