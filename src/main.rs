use anyhow::Context;
use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, EnvFilter};

use mm_sim::batch::{run_batch, seed_sweep};
use mm_sim::config::AppConfig;
use mm_sim::sim::{write_records_jsonl, Simulation, SimulationRun};
use mm_sim::PerformanceSummary;

fn main() -> anyhow::Result<()> {
    // 1. Resolve config: explicit path argument, else config.toml, else defaults
    let path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .or_else(AppConfig::default_path);
    let config = match &path {
        Some(p) => AppConfig::load(p).with_context(|| format!("loading {}", p.display()))?,
        None => AppConfig::default(),
    };

    // 2. Logger
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.output.log_level));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(false)
        .with_level(true)
        .init();

    info!("🦀 mm-sim starting");
    match &path {
        Some(p) => info!("📋 Loaded config from {}", p.display()),
        None => warn!("⚠️ No config.toml found, using defaults"),
    }

    if let Err(e) = run(&config) {
        error!("❌ {:#}", e);
        return Err(e);
    }
    Ok(())
}

fn run(config: &AppConfig) -> anyhow::Result<()> {
    let periods = config.output.periods_per_year;

    if config.output.batch_seeds.is_empty() {
        let run = Simulation::new(config.sim.clone())?.run()?;
        report(&run, periods)?;
        if let Some(path) = &config.output.records_path {
            export(&run, path)?;
        }
        return Ok(());
    }

    let configs = seed_sweep(&config.sim, config.output.batch_seeds.iter().copied());
    let runs = run_batch(configs, config.output.workers)?;

    let mut pnl_sum = 0.0;
    for run in &runs {
        let summary = report(run, periods)?;
        pnl_sum += summary.total_pnl;
        if let Some(path) = config.records_path_for_seed(run.seed) {
            export(run, &path)?;
        }
    }
    info!(
        runs = runs.len(),
        mean_pnl = pnl_sum / runs.len() as f64,
        halted = runs.iter().filter(|r| r.halted_at.is_some()).count(),
        "📈 seed sweep complete"
    );
    Ok(())
}

fn report(run: &SimulationRun, periods_per_year: f64) -> anyhow::Result<PerformanceSummary> {
    let summary = PerformanceSummary::from_records(run.records(), periods_per_year);
    info!(seed = run.seed, "📊 {}", serde_json::to_string(&summary)?);
    Ok(summary)
}

fn export(run: &SimulationRun, path: &Path) -> anyhow::Result<()> {
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir)?;
    }
    let file = File::create(path).with_context(|| format!("creating {}", path.display()))?;
    write_records_jsonl(run.records(), BufWriter::new(file))?;
    info!("💾 Wrote {} records to {}", run.len(), path.display());
    Ok(())
}
