use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
#[cfg(test)]
use std::collections::VecDeque;

use crate::config::FaultConfig;

/// Source of uniform integer draws, inclusive on both ends.
pub trait DrawSource {
    fn draw(&mut self, low: u32, high: u32) -> u32;
}

/// Draws backed by a `rand` generator.
pub struct RngDraws<R> {
    rng: R,
}

impl<R: Rng> RngDraws<R> {
    pub fn new(rng: R) -> Self {
        Self { rng }
    }
}

impl RngDraws<StdRng> {
    pub fn from_entropy() -> Self {
        Self::new(StdRng::from_entropy())
    }

    #[cfg(test)]
    pub fn seeded(seed: u64) -> Self {
        Self::new(StdRng::seed_from_u64(seed))
    }
}

impl<R: Rng> DrawSource for RngDraws<R> {
    fn draw(&mut self, low: u32, high: u32) -> u32 {
        self.rng.gen_range(low..=high)
    }
}

/// Replays fixed values in order, clamped into the requested range.
/// Falls back to `low` once exhausted.
#[cfg(test)]
#[derive(Debug, Default)]
pub struct ScriptedDraws {
    values: VecDeque<u32>,
}

#[cfg(test)]
impl ScriptedDraws {
    pub fn new(values: impl IntoIterator<Item = u32>) -> Self {
        Self {
            values: values.into_iter().collect(),
        }
    }
}

#[cfg(test)]
impl DrawSource for ScriptedDraws {
    fn draw(&mut self, low: u32, high: u32) -> u32 {
        self.values
            .pop_front()
            .map(|value| value.clamp(low, high))
            .unwrap_or(low)
    }
}

/// Picks the fault code for one tick.
///
/// The roll is taken over `[0, draw_max]`; below `threshold` a code is drawn
/// over the full `[0, max_code]` range, zero included, so a "fault" roll can
/// still publish 0.
#[derive(Debug, Clone)]
pub struct FaultGenerator {
    config: FaultConfig,
}

impl FaultGenerator {
    pub fn new(config: FaultConfig) -> Self {
        Self { config }
    }

    pub fn next_code<D: DrawSource + ?Sized>(&self, draws: &mut D) -> u8 {
        let chance = draws.draw(0, self.config.draw_max);
        if chance < self.config.threshold {
            draws.draw(0, u32::from(self.config.max_code)) as u8
        } else {
            0
        }
    }
}
