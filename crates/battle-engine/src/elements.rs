use crate::types::NftType;

/// Type advantage cycle: Fire -> Grass -> Water -> Fire.
/// Returns multiplier x100: 150 = strong, 67 = weak, 100 = mirror matchup.
/// With three types in a cycle every distinct pair is decided; only a
/// type against itself resolves neutral.
pub fn type_multiplier(attacker: NftType, defender: NftType) -> u32 {
    if attacker == defender {
        return 100;
    }

    let attacker_beats = match attacker {
        NftType::Fire => NftType::Grass,
        NftType::Grass => NftType::Water,
        NftType::Water => NftType::Fire,
    };

    if attacker_beats == defender {
        150
    } else {
        67
    }
}
