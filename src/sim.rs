//! Simulation loop - one strictly ordered pass per step:
//! price -> signal -> quote -> execution -> risk -> record.
//!
//! The loop owns the run's only random generator, seeded once from the
//! config, and lends it to the price process and the execution simulator.
//! Inventory reaches the quote generator one step late: quotes for step `t`
//! use the position after step `t - 1`.

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use std::io::Write;
use std::sync::Arc;
use tracing::info;

use crate::core::{Result, SimConfig, StepRecord};
use crate::execution::ExecutionSimulator;
use crate::price::PriceProcess;
use crate::quote::QuoteGenerator;
use crate::risk::RiskManager;
use crate::signal::{SignalEngine, SignalTracker};

const MAX_PREALLOCATED_RECORDS: u64 = 1 << 20;

pub struct Simulation {
    config: SimConfig,
    rng: ChaCha8Rng,
    price: PriceProcess,
    signal: SignalTracker,
    quoter: QuoteGenerator,
    execution: ExecutionSimulator,
    risk: RiskManager,
    records: Vec<StepRecord>,
    finished: bool,
}

impl Simulation {
    /// Validate the whole config and build every component.
    /// Fails with `Error::Config` before any step runs.
    pub fn new(config: SimConfig) -> Result<Self> {
        config.validate()?;

        let price = PriceProcess::from_config(&config.price)?;
        let signal = SignalTracker::from_config(&config.signal)?
            .with_volatility_window(config.quote.volatility_window);
        let quoter = QuoteGenerator::new(config.quote.clone(), config.risk)?;
        let execution = ExecutionSimulator::new(config.execution.clone())?;
        let risk = RiskManager::new(config.risk, config.initial_cash)?;

        let capacity = match price.remaining() {
            Some(n) => n.min(config.steps),
            None => config.steps,
        }
        .min(MAX_PREALLOCATED_RECORDS);

        Ok(Self {
            rng: ChaCha8Rng::seed_from_u64(config.seed),
            price,
            signal,
            quoter,
            execution,
            risk,
            records: Vec::with_capacity(capacity as usize),
            finished: false,
            config,
        })
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    pub fn records(&self) -> &[StepRecord] {
        &self.records
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Run one atomic step. Returns `None` once the run is over.
    ///
    /// An `InvariantViolation` ends the run; later calls return `None`.
    pub fn step(&mut self) -> Result<Option<&StepRecord>> {
        if self.finished {
            return Ok(None);
        }
        match self.advance() {
            Ok(true) => Ok(self.records.last()),
            Ok(false) => {
                self.finished = true;
                Ok(None)
            }
            Err(e) => {
                self.finished = true;
                Err(e)
            }
        }
    }

    fn advance(&mut self) -> Result<bool> {
        if self.records.len() as u64 >= self.config.steps {
            return Ok(false);
        }
        let Some(price) = self.price.next_point(&mut self.rng) else {
            return Ok(false);
        };

        let signal = self.signal.update(&price);
        let quote = self.quoter.quote(
            &price,
            &signal,
            self.risk.position(),
            self.risk.is_halted(),
            self.signal.realized_volatility(),
        )?;

        self.execution.observe(&price);
        let fills = self.execution.execute(&quote, &mut self.rng)?;
        let (fills, inventory) = self.risk.apply(&price, fills)?;

        self.records.push(StepRecord {
            price,
            signal,
            quote,
            fills,
            inventory,
        });

        if self.config.stop_on_halt && self.risk.halted_at() == Some(price.step) {
            self.finished = true;
        }
        Ok(true)
    }

    /// Drive the run to completion
    pub fn run(mut self) -> Result<SimulationRun> {
        info!(
            seed = self.config.seed,
            steps = self.config.steps,
            signal = self.signal.strategy().name(),
            "▶️ simulation starting"
        );

        while self.step()?.is_some() {}

        let run = SimulationRun {
            seed: self.config.seed,
            halted_at: self.risk.halted_at(),
            records: Arc::from(self.records),
        };

        let last = run.final_inventory();
        info!(
            seed = run.seed,
            steps = run.len(),
            fills = run.fill_count(),
            position = last.map(|s| s.position).unwrap_or(0),
            pnl = last.map(|s| s.mark_to_market_pnl).unwrap_or(0.0),
            halted = run.halted_at.is_some(),
            "🏁 simulation finished"
        );
        Ok(run)
    }
}

/// Completed, immutable run output. Cloning shares the record buffer.
#[derive(Debug, Clone)]
pub struct SimulationRun {
    pub seed: u64,
    pub halted_at: Option<u64>,
    records: Arc<[StepRecord]>,
}

impl SimulationRun {
    pub fn records(&self) -> &[StepRecord] {
        &self.records
    }

    /// Shared handle to the records for downstream consumers
    pub fn shared(&self) -> Arc<[StepRecord]> {
        Arc::clone(&self.records)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn final_inventory(&self) -> Option<crate::core::InventoryState> {
        self.records.last().map(|r| r.inventory)
    }

    pub fn fill_count(&self) -> usize {
        self.records.iter().map(|r| r.fills.len()).sum()
    }
}

/// Write records as JSON lines, one `StepRecord` per line
pub fn write_records_jsonl<W: Write>(records: &[StepRecord], mut writer: W) -> Result<()> {
    for record in records {
        serde_json::to_writer(&mut writer, record)?;
        writer.write_all(b"\n")?;
    }
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{
        Error, ExecutionConfig, PriceConfig, QuoteConfig, RiskLimits, SignalConfig, Side,
    };

    /// seed 42, 1% vol, symmetric quoting with the signal switched off
    fn symmetric_config() -> SimConfig {
        SimConfig {
            seed: 42,
            steps: 1000,
            stop_on_halt: false,
            initial_cash: 0.0,
            price: PriceConfig::RandomWalk {
                initial_price: 100.0,
                volatility: 0.01,
                drift: 0.0,
            },
            signal: SignalConfig::Momentum {
                lookback: 5,
                smoothing_span: None,
            },
            quote: QuoteConfig {
                base_spread: 0.02,
                inventory_skew_coefficient: 0.001,
                signal_bias_coefficient: 0.0,
                size_per_quote: 1,
                volatility_multiplier: 0.0,
                volatility_window: 20,
            },
            risk: RiskLimits {
                max_abs_position: 50,
                stop_loss_threshold: f64::NEG_INFINITY,
            },
            execution: ExecutionConfig {
                base_fill_prob: 0.3,
                aggressiveness_decay: 50.0,
                latency_steps: 0,
            },
        }
    }

    /// Deterministic decline; a saturated mean-reversion signal keeps the
    /// bid at mid so the agent accumulates a long position into the drop.
    fn adverse_drift_config() -> SimConfig {
        SimConfig {
            price: PriceConfig::RandomWalk {
                initial_price: 100.0,
                volatility: 0.0,
                drift: -0.05,
            },
            signal: SignalConfig::MeanReversion {
                window: 20,
                z_scale: 1.0,
            },
            quote: QuoteConfig {
                base_spread: 0.02,
                inventory_skew_coefficient: 0.0,
                signal_bias_coefficient: 0.01,
                size_per_quote: 1,
                volatility_multiplier: 0.0,
                volatility_window: 20,
            },
            risk: RiskLimits {
                max_abs_position: 50,
                stop_loss_threshold: -500.0,
            },
            execution: ExecutionConfig {
                base_fill_prob: 1.0,
                aggressiveness_decay: 500.0,
                latency_steps: 0,
            },
            ..symmetric_config()
        }
    }

    #[test]
    fn test_symmetric_scenario_properties() {
        let run = Simulation::new(symmetric_config()).unwrap().run().unwrap();
        assert_eq!(run.len(), 1000);
        assert!(run.fill_count() > 0);
        assert_eq!(run.halted_at, None);

        for r in run.records() {
            assert!(r.quote.bid_price < r.quote.ask_price, "crossed at {}", r.step());
            assert!((-1.0..=1.0).contains(&r.signal.value));
            assert!(r.inventory.position.unsigned_abs() <= 50);
            assert!(r.price.mid > 0.0);
        }

        let mean_position = run
            .records()
            .iter()
            .map(|r| r.inventory.position as f64)
            .sum::<f64>()
            / run.len() as f64;
        assert!(mean_position.abs() < 10.0, "mean position {}", mean_position);
    }

    #[test]
    fn test_same_seed_is_byte_identical() {
        let a = Simulation::new(symmetric_config()).unwrap().run().unwrap();
        let b = Simulation::new(symmetric_config()).unwrap().run().unwrap();
        assert_eq!(a.records(), b.records());

        let mut bytes_a = Vec::new();
        let mut bytes_b = Vec::new();
        write_records_jsonl(a.records(), &mut bytes_a).unwrap();
        write_records_jsonl(b.records(), &mut bytes_b).unwrap();
        assert_eq!(bytes_a, bytes_b);
        assert_eq!(bytes_a.iter().filter(|&&c| c == b'\n').count(), 1000);

        let c = Simulation::new(symmetric_config().with_seed(43))
            .unwrap()
            .run()
            .unwrap();
        assert_ne!(a.records(), c.records());
    }

    /// Cash moves only by fill cash flows; PnL fields follow from cash
    fn assert_cash_conserved(records: &[StepRecord], initial_cash: f64) {
        let mut prev_cash = initial_cash;
        for r in records {
            let flow: f64 = r
                .fills
                .iter()
                .map(|f| match f.side {
                    Side::Sell => -f.price * f.size as f64,
                    Side::Buy => f.price * f.size as f64,
                })
                .sum();
            let expected = prev_cash + flow;
            assert!(
                (r.inventory.cash - expected).abs() < 1e-6,
                "cash drift at step {}",
                r.step()
            );
            assert!((r.inventory.realized_pnl - (r.inventory.cash - initial_cash)).abs() < 1e-6);
            let mtm = r.inventory.position as f64 * r.price.mid + r.inventory.cash - initial_cash;
            assert!((r.inventory.mark_to_market_pnl - mtm).abs() < 1e-6);
            prev_cash = r.inventory.cash;
        }
    }

    #[test]
    fn test_cash_conservation() {
        let cfg = SimConfig {
            initial_cash: 10_000.0,
            signal: signal_override(),
            ..symmetric_config()
        };
        let run = Simulation::new(cfg).unwrap().run().unwrap();
        assert_cash_conserved(run.records(), 10_000.0);
    }

    fn signal_override() -> SignalConfig {
        SignalConfig::Momentum {
            lookback: 5,
            smoothing_span: Some(10),
        }
    }

    #[test]
    fn test_cold_start_in_records() {
        let cfg = SimConfig {
            signal: SignalConfig::Crossover { short: 3, long: 12 },
            quote: QuoteConfig {
                signal_bias_coefficient: 0.05,
                ..symmetric_config().quote
            },
            ..symmetric_config()
        };
        let run = Simulation::new(cfg).unwrap().run().unwrap();
        for r in &run.records()[..11] {
            assert_eq!(r.signal.value, 0.0);
        }
        assert!(run.records()[11..].iter().any(|r| r.signal.value != 0.0));
    }

    #[test]
    fn test_stop_loss_halts_and_stays_flat() {
        let run = Simulation::new(adverse_drift_config()).unwrap().run().unwrap();
        assert_eq!(run.len(), 1000);

        let halted_at = run.halted_at.expect("adverse drift should trip the stop-loss") as usize;
        assert!(halted_at < 400, "halted late at {}", halted_at);

        let records = run.records();
        let halt = &records[halted_at];
        assert!(halt.inventory.halted);
        assert_eq!(halt.inventory.position, 0);
        assert!(halt.inventory.mark_to_market_pnl < -500.0);
        assert!(halt.fills.iter().any(|f| f.liquidation && f.price == halt.price.mid));
        assert_cash_conserved(records, 0.0);

        for r in &records[..halted_at] {
            assert!(!r.inventory.halted);
        }
        for r in &records[halted_at + 1..] {
            assert!(r.inventory.halted);
            assert_eq!(r.inventory.position, 0);
            assert_eq!((r.quote.bid_size, r.quote.ask_size), (0, 0));
            assert!(r.fills.is_empty());
            assert!(r.quote.bid_price < r.quote.ask_price);
        }
    }

    #[test]
    fn test_stop_on_halt_ends_run() {
        let cfg = SimConfig {
            stop_on_halt: true,
            ..adverse_drift_config()
        };
        let run = Simulation::new(cfg).unwrap().run().unwrap();
        let halted_at = run.halted_at.unwrap() as usize;
        assert_eq!(run.len(), halted_at + 1);
        assert!(run.final_inventory().unwrap().halted);
    }

    #[test]
    fn test_replay_ends_with_series() {
        let cfg = SimConfig {
            steps: 100,
            price: PriceConfig::Replay {
                prices: vec![100.0, 100.02, 99.98, 100.05, 100.1, 100.0, 99.9, 99.95, 100.0, 100.01],
            },
            ..symmetric_config()
        };
        let mut sim = Simulation::new(cfg).unwrap();
        let mut n = 0;
        while let Some(r) = sim.step().unwrap() {
            assert_eq!(r.step(), n);
            n += 1;
        }
        assert_eq!(n, 10);
        assert!(sim.is_finished());
        assert!(sim.step().unwrap().is_none());
    }

    #[test]
    fn test_latency_mode_respects_limits() {
        let cfg = SimConfig {
            execution: ExecutionConfig {
                latency_steps: 5,
                ..symmetric_config().execution
            },
            risk: RiskLimits {
                max_abs_position: 5,
                stop_loss_threshold: f64::NEG_INFINITY,
            },
            ..symmetric_config()
        };
        let run = Simulation::new(cfg).unwrap().run().unwrap();
        assert!(run
            .records()
            .iter()
            .all(|r| r.inventory.position.unsigned_abs() <= 5));
    }

    #[test]
    fn test_invalid_config_fails_before_running() {
        let cfg = SimConfig {
            quote: QuoteConfig {
                base_spread: 0.0,
                ..QuoteConfig::default()
            },
            ..SimConfig::default()
        };
        assert!(matches!(Simulation::new(cfg), Err(Error::Config(_))));
    }

    #[test]
    fn test_quote_size_beyond_signed_range_fails_before_running() {
        let cfg = SimConfig {
            steps: 1,
            quote: QuoteConfig {
                size_per_quote: 1 << 63,
                ..symmetric_config().quote
            },
            risk: RiskLimits {
                max_abs_position: 1 << 63,
                stop_loss_threshold: f64::NEG_INFINITY,
            },
            execution: ExecutionConfig {
                base_fill_prob: 1.0,
                aggressiveness_decay: 0.0,
                latency_steps: 0,
            },
            ..symmetric_config()
        };
        assert!(matches!(Simulation::new(cfg), Err(Error::Config(_))));
    }

    #[test]
    fn test_shared_records_are_the_same_buffer() {
        let run = Simulation::new(SimConfig {
            steps: 50,
            ..symmetric_config()
        })
        .unwrap()
        .run()
        .unwrap();
        let shared = run.shared();
        assert!(std::ptr::eq(shared.as_ptr(), run.records().as_ptr()));
        assert_eq!(shared.len(), 50);
    }
}
