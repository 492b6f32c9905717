//! Source of randomized step sizes and start positions.

use asrs_common::config::MotionConfig;
use asrs_common::consts::{START_X_MAX, START_X_MIN, START_Y_MAX, START_Y_MIN};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Supplies the random quantities the state machine consumes.
///
/// Production uses [`RandomMotion`]; tests substitute fixed values.
pub trait Motion {
    /// Horizontal step for one tick.
    fn x_step(&mut self) -> i64;

    /// Vertical step for one tick.
    fn y_step(&mut self) -> i64;

    /// Start position `(x, y)` after line start or reset.
    fn start_position(&mut self) -> (i64, i64);
}

/// RNG-backed motion within configured step ranges.
#[derive(Debug, Clone)]
pub struct RandomMotion<R: Rng = StdRng> {
    rng: R,
    limits: MotionConfig,
}

impl RandomMotion<StdRng> {
    /// Seeded from `seed + line_number` when a seed is given, else from entropy.
    pub fn for_line(seed: Option<u64>, line_number: u8, limits: MotionConfig) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed.wrapping_add(line_number as u64)),
            None => StdRng::from_entropy(),
        };
        Self::with_rng(rng, limits)
    }
}

impl<R: Rng> RandomMotion<R> {
    /// Wrap an existing RNG.
    pub fn with_rng(rng: R, limits: MotionConfig) -> Self {
        Self { rng, limits }
    }
}

impl<R: Rng> Motion for RandomMotion<R> {
    fn x_step(&mut self) -> i64 {
        self.rng
            .gen_range(self.limits.x_step_min..=self.limits.x_step_max)
    }

    fn y_step(&mut self) -> i64 {
        self.rng
            .gen_range(self.limits.y_step_min..=self.limits.y_step_max)
    }

    fn start_position(&mut self) -> (i64, i64) {
        (
            self.rng.gen_range(START_X_MIN..=START_X_MAX),
            self.rng.gen_range(START_Y_MIN..=START_Y_MAX),
        )
    }
}
