//! Monte Carlo batch runner - independent runs on a scoped worker pool
//!
//! Jobs go out on one flume channel and results come back on another, tagged
//! with the job index so the output keeps the input order regardless of which
//! worker finished first.

use tracing::{debug, info};

use crate::core::{Error, Result, SimConfig};
use crate::sim::{Simulation, SimulationRun};

/// One config per seed, everything else shared
pub fn seed_sweep(base: &SimConfig, seeds: impl IntoIterator<Item = u64>) -> Vec<SimConfig> {
    seeds.into_iter().map(|seed| base.with_seed(seed)).collect()
}

/// Run every config to completion on `workers` threads.
///
/// All configs are validated before any thread starts. The lowest-index
/// failing run decides the returned error.
pub fn run_batch(configs: Vec<SimConfig>, workers: usize) -> Result<Vec<SimulationRun>> {
    if configs.is_empty() {
        return Ok(Vec::new());
    }
    for config in &configs {
        config.validate()?;
    }

    let total = configs.len();
    let workers = workers.clamp(1, total);
    info!(runs = total, workers, "🎲 batch starting");

    let (job_tx, job_rx) = flume::unbounded::<(usize, SimConfig)>();
    let (result_tx, result_rx) = flume::unbounded::<(usize, Result<SimulationRun>)>();

    for job in configs.into_iter().enumerate() {
        job_tx
            .send(job)
            .map_err(|_| Error::Worker("job queue closed".to_string()))?;
    }
    drop(job_tx);

    let collected = crossbeam::thread::scope(|scope| {
        for worker in 0..workers {
            let jobs = job_rx.clone();
            let results = result_tx.clone();
            scope.spawn(move |_| {
                let mut done = 0usize;
                for (index, config) in jobs.iter() {
                    let outcome = Simulation::new(config).and_then(Simulation::run);
                    if results.send((index, outcome)).is_err() {
                        break;
                    }
                    done += 1;
                }
                debug!(worker, runs = done, "batch worker drained");
            });
        }
        drop(result_tx);

        let mut slots: Vec<Option<SimulationRun>> = (0..total).map(|_| None).collect();
        let mut first_error: Option<(usize, Error)> = None;
        for (index, outcome) in result_rx.iter() {
            match outcome {
                Ok(run) => slots[index] = Some(run),
                Err(e) => {
                    if first_error.as_ref().is_none_or(|(i, _)| index < *i) {
                        first_error = Some((index, e));
                    }
                }
            }
        }
        (slots, first_error)
    })
    .map_err(|_| Error::Worker("batch worker panicked".to_string()))?;

    let (slots, first_error) = collected;
    if let Some((index, e)) = first_error {
        return Err(match e {
            Error::InvariantViolation { step, reason } => Error::InvariantViolation {
                step,
                reason: format!("run {}: {}", index, reason),
            },
            other => other,
        });
    }

    let runs = slots
        .into_iter()
        .enumerate()
        .map(|(i, slot)| slot.ok_or_else(|| Error::Worker(format!("run {} produced no result", i))))
        .collect::<Result<Vec<_>>>()?;

    info!(
        runs = runs.len(),
        halted = runs.iter().filter(|r| r.halted_at.is_some()).count(),
        "✅ batch finished"
    );
    Ok(runs)
}
