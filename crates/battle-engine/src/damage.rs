use rand::Rng;

use crate::elements::type_multiplier;
use crate::types::{MoveAction, NftType};

/// Base damage per action, before type and critical modifiers.
pub const STRIKE_BASE: u32 = 20;
pub const SPECIAL_BASE: u32 = 30;

/// Critical hits multiply damage by 2x at a fixed 10% chance.
pub const CRIT_CHANCE: f64 = 0.10;
pub const CRIT_MULTIPLIER_X100: u32 = 200;

pub fn base_damage(action: MoveAction) -> u32 {
    match action {
        MoveAction::Strike => STRIKE_BASE,
        MoveAction::SpecialAttack => SPECIAL_BASE,
    }
}

/// Calculate damage for an attack.
/// Returns (damage, type_multiplier_x100).
pub fn compute_damage(
    action: MoveAction,
    attacker: NftType,
    defender: NftType,
    critical: bool,
) -> (u32, u32) {
    let mult_x100 = type_multiplier(attacker, defender);

    // u64 intermediate so base * mult * crit cannot overflow
    let mut raw = (base_damage(action) as u64) * (mult_x100 as u64) / 100;
    if critical {
        raw = raw * (CRIT_MULTIPLIER_X100 as u64) / 100;
    }

    ((raw as u32).max(1), mult_x100)
}

/// Independent uniform draw for the critical-hit decision.
pub fn roll_critical<R: Rng + ?Sized>(rng: &mut R, chance: f64) -> bool {
    rng.random_bool(chance.clamp(0.0, 1.0))
}
