//! Price process - mid-price generation for the simulation.
//!
//! The process never owns randomness: each step borrows the run's generator,
//! so the whole run is driven by one seeded stream. Step 0 is the initial
//! price and draws nothing; every later walk step draws one N(0,1).

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rand_distr::{Distribution, StandardNormal};
use std::sync::Arc;

use crate::core::{PriceConfig, PricePoint, Result};

/// Floor applied to the additive walk so prices stay positive.
pub const MIN_PRICE: f64 = 1e-8;

#[derive(Debug, Clone)]
enum PriceModel {
    RandomWalk { volatility: f64, drift: f64 },
    Geometric { volatility: f64, drift: f64 },
    Replay { prices: Arc<[f64]> },
}

/// Stateful mid-price generator
#[derive(Debug, Clone)]
pub struct PriceProcess {
    model: PriceModel,
    next_step: u64,
    last_mid: f64,
}

impl PriceProcess {
    pub fn from_config(config: &PriceConfig) -> Result<Self> {
        config.validate()?;
        let (model, initial) = match config {
            PriceConfig::RandomWalk {
                initial_price,
                volatility,
                drift,
            } => (
                PriceModel::RandomWalk {
                    volatility: *volatility,
                    drift: *drift,
                },
                *initial_price,
            ),
            PriceConfig::Geometric {
                initial_price,
                volatility,
                drift,
            } => (
                PriceModel::Geometric {
                    volatility: *volatility,
                    drift: *drift,
                },
                *initial_price,
            ),
            PriceConfig::Replay { prices } => (
                PriceModel::Replay {
                    prices: Arc::from(prices.as_slice()),
                },
                prices[0],
            ),
        };
        Ok(Self {
            model,
            next_step: 0,
            last_mid: initial,
        })
    }

    /// Number of points this process can still emit, if bounded
    pub fn remaining(&self) -> Option<u64> {
        match &self.model {
            PriceModel::Replay { prices } => {
                Some((prices.len() as u64).saturating_sub(self.next_step))
            }
            _ => None,
        }
    }

    /// Advance one step. Returns `None` once a replay series is exhausted.
    pub fn next_point<R: Rng>(&mut self, rng: &mut R) -> Option<PricePoint> {
        let step = self.next_step;
        let mid = if step == 0 {
            self.last_mid
        } else {
            match &self.model {
                PriceModel::RandomWalk { volatility, drift } => {
                    let z: f64 = StandardNormal.sample(rng);
                    let next = self.last_mid + drift + volatility * self.last_mid * z;
                    next.max(MIN_PRICE)
                }
                PriceModel::Geometric { volatility, drift } => {
                    let z: f64 = StandardNormal.sample(rng);
                    (self.last_mid * (drift + volatility * z).exp()).max(MIN_PRICE)
                }
                PriceModel::Replay { prices } => *prices.get(step as usize)?,
            }
        };
        self.last_mid = mid;
        self.next_step += 1;
        Some(PricePoint { step, mid })
    }
}

/// Standalone finite price path with its own seeded generator.
///
/// For pre-generating a path outside a simulation; the simulation loop
/// drives `PriceProcess` with the run's shared generator instead.
pub struct PricePath {
    process: PriceProcess,
    rng: ChaCha8Rng,
    remaining: u64,
}

impl PricePath {
    pub fn new(config: &PriceConfig, seed: u64, steps: u64) -> Result<Self> {
        Ok(Self {
            process: PriceProcess::from_config(config)?,
            rng: ChaCha8Rng::seed_from_u64(seed),
            remaining: steps,
        })
    }
}

impl Iterator for PricePath {
    type Item = PricePoint;

    fn next(&mut self) -> Option<PricePoint> {
        if self.remaining == 0 {
            return None;
        }
        self.remaining -= 1;
        self.process.next_point(&mut self.rng)
    }
}
