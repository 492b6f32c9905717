//! Level ↔ position mapping and axis stepping.

use asrs_common::consts::{LEVEL_BASE_Y, LEVEL_MAX, LEVEL_MIN, LEVEL_PITCH_Y};

/// PositionY of the centre of `level`.
#[inline]
pub const fn level_to_y(level: i64) -> i64 {
    LEVEL_BASE_Y + (level - 1) * LEVEL_PITCH_Y
}

/// Level derived from PositionY, clamped to `[LEVEL_MIN, LEVEL_MAX]`.
#[inline]
pub fn y_to_level(y: i64) -> i64 {
    ((y - LEVEL_BASE_Y).div_euclid(LEVEL_PITCH_Y) + 1).clamp(LEVEL_MIN, LEVEL_MAX)
}

/// Level register value forced into the reachable range.
///
/// Used for touring / free-move targets so that an unset (zero) level
/// targets level 1 instead of a negative PositionY.
#[inline]
pub fn reachable_level(level: i64) -> i64 {
    level.clamp(LEVEL_MIN, LEVEL_MAX)
}

/// Move `current` toward `target` by at most `step`, never overshooting.
#[inline]
pub fn step_toward(current: i64, target: i64, step: i64) -> i64 {
    if current < target {
        (current + step).min(target)
    } else if current > target {
        (current - step).max(target)
    } else {
        current
    }
}

/// Horizontal travel direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Toward X_MAX (BayEnd).
    Right,
    /// Toward X_MIN (BayStart).
    Left,
}

impl Direction {
    /// Direction at sweep `level`: even offset from `level_start` goes right.
    #[inline]
    pub fn for_sweep_level(level: i64, level_start: i64) -> Self {
        if (level - level_start).rem_euclid(2) == 0 {
            Self::Right
        } else {
            Self::Left
        }
    }

    /// Direction of the last sweep pass, from the absolute parity of
    /// `level_end` (odd goes right).
    #[inline]
    pub fn for_final_level(level_end: i64) -> Self {
        if level_end.rem_euclid(2) == 1 {
            Self::Right
        } else {
            Self::Left
        }
    }

    /// Bound this direction travels toward.
    #[inline]
    pub fn bound(self, x_min: i64, x_max: i64) -> i64 {
        match self {
            Self::Right => x_max,
            Self::Left => x_min,
        }
    }

    /// True while `x` has not reached `target` in this direction.
    #[inline]
    pub fn short_of(self, x: i64, target: i64) -> bool {
        match self {
            Self::Right => x < target,
            Self::Left => x > target,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn level_one_is_at_base() {
        assert_eq!(level_to_y(1), 500);
        assert_eq!(level_to_y(20), 19_500);
    }

    #[test]
    fn y_to_level_clamps() {
        assert_eq!(y_to_level(0), 1);
        assert_eq!(y_to_level(499), 1);
        assert_eq!(y_to_level(1499), 1);
        assert_eq!(y_to_level(1500), 2);
        assert_eq!(y_to_level(65_535), 20);
    }

    #[test]
    fn step_toward_never_overshoots() {
        assert_eq!(step_toward(1000, 1500, 1000), 1500);
        assert_eq!(step_toward(1000, 5000, 1000), 2000);
        assert_eq!(step_toward(5000, 4800, 250), 4800);
        assert_eq!(step_toward(5000, 1000, 250), 4750);
        assert_eq!(step_toward(42, 42, 250), 42);
    }

    #[test]
    fn final_direction_uses_absolute_parity() {
        assert_eq!(Direction::for_final_level(5), Direction::Right);
        assert_eq!(Direction::for_final_level(4), Direction::Left);
    }

    #[test]
    fn short_of_respects_direction() {
        assert!(Direction::Right.short_of(100, 200));
        assert!(!Direction::Right.short_of(200, 200));
        assert!(Direction::Left.short_of(300, 200));
        assert!(!Direction::Left.short_of(150, 200));
    }

    proptest! {
        #[test]
        fn level_mapping_round_trips(level in 1i64..=20) {
            let y = level_to_y(level);
            prop_assert_eq!(y, 500 + (level - 1) * 1000);
            prop_assert_eq!(y_to_level(y), level);
        }

        #[test]
        fn positions_inside_a_level_band_map_to_it(level in 1i64..=19, offset in 0i64..1000) {
            prop_assert_eq!(y_to_level(level_to_y(level) + offset), level);
        }

        #[test]
        fn direction_alternates_from_level_start(start in 1i64..=19, k in 0i64..19) {
            let expected = if k % 2 == 0 { Direction::Right } else { Direction::Left };
            prop_assert_eq!(Direction::for_sweep_level(start + k, start), expected);
        }
    }
}
