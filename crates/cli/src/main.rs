mod output;

use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::Context;
use clap::Parser;
use cstr_reactor::RunConfig;

#[derive(Debug, Parser)]
#[command(author, version, about = "Jacketed CSTR simulation with a mid-run feed disturbance")]
struct Cli {
    /// Run configuration in TOML (the reference run is used when omitted)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Final simulation time in seconds
    #[arg(long)]
    end_time: Option<f64>,

    /// Spacing of output samples in seconds
    #[arg(long)]
    output_step: Option<f64>,

    /// Relative error tolerance of the integrator
    #[arg(long)]
    rtol: Option<f64>,

    /// Absolute error tolerance of the integrator
    #[arg(long)]
    atol: Option<f64>,

    /// Keep the nominal feed temperature and coolant flow for the whole run
    #[arg(long)]
    no_disturbance: bool,

    /// Write the sampled trajectory to this CSV file
    #[arg(long)]
    csv: Option<PathBuf>,
}

impl Cli {
    /// Applies command-line overrides on top of a loaded configuration.
    fn apply(&self, config: &mut RunConfig) {
        let integration = &mut config.integration;
        if let Some(v) = self.end_time {
            integration.end_time = v;
        }
        if let Some(v) = self.output_step {
            integration.output_step = v;
        }
        if let Some(v) = self.rtol {
            integration.rtol = v;
        }
        if let Some(v) = self.atol {
            integration.atol = v;
        }
        if self.no_disturbance {
            config.disturbance.enabled = false;
        }
    }
}

fn load_config(path: &Path) -> anyhow::Result<RunConfig> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("failed to read config {}", path.display()))?;
    toml::from_str(&text).with_context(|| format!("failed to parse config {}", path.display()))
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => load_config(path)?,
        None => RunConfig::reference(),
    };
    cli.apply(&mut config);

    let simulation = config.build().context("invalid run configuration")?;
    let settings = simulation.settings();
    log::info!(
        "simulating {} s to {} s, sampled every {} s",
        settings.start_time(),
        settings.end_time(),
        settings.output_step()
    );

    let trajectory = simulation
        .run(config.initial_state(&simulation))
        .context("simulation failed")?;
    let summary = simulation.summarize(&trajectory)?;
    log::info!(
        "peak reactor temperature {:.2} K at t = {} s",
        summary.peak_temperature,
        summary.peak_temperature_time
    );

    if let Some(path) = &cli.csv {
        output::write_csv(path, &simulation, &trajectory)?;
        log::info!("wrote {} samples to {}", trajectory.len(), path.display());
    }

    println!("{summary}");

    Ok(())
}
