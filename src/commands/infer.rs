use std::{
    fs::File,
    io::{BufWriter, Write},
    path::Path,
};

use anyhow::{Context, Result, bail};
use dynamics::{DynModel, Real, checkpoint};
use log::info;
use ndarray::Array1;

/// The integration step used when none is given.
pub const DEFAULT_DT: Real = 0.01;

/// The value every input coordinate starts at when no start point is given.
pub const DEFAULT_START: Real = 0.5;

/// Replays a model autonomously, feeding every output back as the next input.
///
/// Writes a CSV with a header and one row per step holding that step's output.
///
/// # Arguments
/// * `model` - The model to replay, its input and output sizes must match.
/// * `start` - The first input.
/// * `steps` - The amount of steps to run.
/// * `writer` - Where to write the CSV to.
pub fn replay<W: Write>(
    model: &DynModel,
    start: Array1<Real>,
    steps: usize,
    mut writer: W,
) -> Result<()> {
    let dims = model.dims();
    if dims.input != dims.output {
        bail!("cannot feed outputs back as inputs with {dims}");
    }
    if start.len() != dims.input {
        bail!(
            "the start point has {} coordinates, the model takes {}",
            start.len(),
            dims.input
        );
    }

    writeln!(writer, "{}", header(dims.output))?;

    let mut input = start;
    let mut latent = Array1::zeros(dims.latent);
    for _ in 0..steps {
        let (output, next) = model.forward(input.view(), latent.view());
        input = output;
        latent = next;

        let row: Vec<_> = input.iter().map(Real::to_string).collect();
        writeln!(writer, "{}", row.join(", "))?;
    }

    writer.flush()?;
    Ok(())
}

/// Loads a checkpoint and replays it into a CSV file, see `replay`.
pub fn run(
    checkpoint_path: &Path,
    steps: usize,
    output: &Path,
    start: Option<Vec<Real>>,
    dt: Real,
) -> Result<()> {
    let weights = checkpoint::load(checkpoint_path)
        .with_context(|| format!("cannot load '{}'", checkpoint_path.display()))?;
    let model = DynModel::from_weights(weights, dt);

    let start = match start {
        Some(start) => Array1::from_vec(start),
        None => Array1::from_elem(model.dims().input, DEFAULT_START),
    };

    let file =
        File::create(output).with_context(|| format!("cannot create '{}'", output.display()))?;
    replay(&model, start, steps, BufWriter::new(file))?;

    info!(steps = steps; "wrote {}", output.display());
    Ok(())
}

fn header(dim: usize) -> String {
    const NAMES: [&str; 3] = ["x", "y", "z"];

    let names: Vec<_> = (0..dim)
        .map(|i| match NAMES.get(i) {
            Some(name) if dim <= NAMES.len() => name.to_string(),
            _ => format!("x{i}"),
        })
        .collect();
    names.join(", ")
}

#[cfg(test)]
mod tests {
    use dynamics::Dims;
    use ndarray::array;

    use super::*;

    #[test]
    fn header_names() {
        assert_eq!(header(2), "x, y");
        assert_eq!(header(3), "x, y, z");
        assert_eq!(header(4), "x0, x1, x2, x3");
    }

    #[test]
    fn replay_feeds_outputs_back() {
        let mut model = DynModel::new(Dims::new(2, 2, 1), 0.1);
        model.weights_mut().m_through = Some(array![[0.5, 0.0], [0.0, 2.0]]);

        let mut buf = Vec::new();
        replay(&model, array![1.0, 1.0], 3, &mut buf).unwrap();

        let csv = String::from_utf8(buf).unwrap();
        assert_eq!(csv, "x, y\n0.5, 2\n0.25, 4\n0.125, 8\n");
    }

    #[test]
    fn replay_requires_matching_sizes() {
        let model = DynModel::new(Dims::new(2, 3, 1), 0.1);
        assert!(replay(&model, array![1.0, 1.0], 3, Vec::new()).is_err());

        let model = DynModel::new(Dims::new(2, 2, 1), 0.1);
        assert!(replay(&model, array![1.0], 3, Vec::new()).is_err());
    }
}
