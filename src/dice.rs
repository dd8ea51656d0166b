use bracket_random::prelude::RandomNumberGenerator;

const ROLL_RESOLUTION: i32 = 10_000;

/// Uniform roll in `[0, 1]`.
pub fn unit_roll(rng: &mut RandomNumberGenerator) -> f32 {
    rng.range(0, ROLL_RESOLUTION + 1) as f32 / ROLL_RESOLUTION as f32
}

/// True with probability `p`. `p <= 0` never passes, `p >= 1` always does.
pub fn chance(rng: &mut RandomNumberGenerator, p: f32) -> bool {
    if p <= 0.0 {
        return false;
    }
    if p >= 1.0 {
        return true;
    }
    (rng.range(0, ROLL_RESOLUTION) as f32) < p * ROLL_RESOLUTION as f32
}
