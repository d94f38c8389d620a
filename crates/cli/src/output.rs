use std::{fs::File, io, path::Path};

use anyhow::Context;
use cstr_reactor::{Simulation, Trajectory};
use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
struct Record {
    time_s: f64,
    concentration_mol_m3: f64,
    temperature_k: f64,
    jacket_temperature_k: f64,
    conversion: f64,
}

/// Writes the trajectory with per-sample conversion to a CSV file at `path`.
pub fn write_csv(
    path: &Path,
    simulation: &Simulation,
    trajectory: &Trajectory,
) -> anyhow::Result<()> {
    let file = File::create(path)
        .with_context(|| format!("failed to create CSV file {}", path.display()))?;
    write_records(file, simulation, trajectory)
        .with_context(|| format!("failed to write CSV file {}", path.display()))
}

fn write_records<W: io::Write>(
    writer: W,
    simulation: &Simulation,
    trajectory: &Trajectory,
) -> anyhow::Result<()> {
    let conversion = simulation.conversion(trajectory)?;
    let mut writer = csv::Writer::from_writer(writer);

    for (sample, (_, conversion)) in trajectory.iter().zip(conversion.iter()) {
        writer.serialize(Record {
            time_s: sample.time,
            concentration_mol_m3: sample.state.concentration,
            temperature_k: sample.state.temperature,
            jacket_temperature_k: sample.state.jacket_temperature,
            conversion,
        })?;
    }
    writer.flush()?;

    Ok(())
}
