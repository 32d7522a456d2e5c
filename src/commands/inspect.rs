use std::{fmt::Write as _, path::Path};

use anyhow::{Context, Result};
use dynamics::{Weights, checkpoint};

/// Describes `weights`: dims, per-tensor norms and the checkpoint they encode to.
pub fn report(weights: &Weights) -> Result<String> {
    let mut out = String::new();

    writeln!(out, "dims: {}", weights.dims())?;
    writeln!(out, "through: {}", weights.has_through())?;
    writeln!(out, "parameters: {}", weights.len())?;
    writeln!(out)?;

    for (name, tensor) in weights.tensors() {
        let norm = tensor.mapv(|x| x * x).sum().sqrt();
        writeln!(out, "{name:<12} shape {:?} norm {norm:.6}", tensor.shape())?;
    }
    writeln!(out)?;

    let mut encoded = Vec::new();
    checkpoint::write_weights(weights, &mut encoded)?;
    out.push_str(&String::from_utf8(encoded)?);

    Ok(out)
}

/// Loads a checkpoint and prints its report.
pub fn run(path: &Path) -> Result<()> {
    let weights =
        checkpoint::load(path).with_context(|| format!("cannot load '{}'", path.display()))?;

    print!("{}", report(&weights)?);
    Ok(())
}
