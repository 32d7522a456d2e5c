use std::{env, path::Path, process};

use anyhow::{Context, Result, bail};
use dynamics::Real;
use quadratic_dynamics::{
    TrainConfig,
    commands::{infer, inspect, tape, train},
};

const USAGE: &str = "Usage:
    quadratic-dynamics train <config.json>
    quadratic-dynamics infer <checkpoint> <steps> <output.csv> [x0 x1 ...]
    quadratic-dynamics inspect <checkpoint>
    quadratic-dynamics tape <program> [iterations]";

fn main() {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    if let Err(e) = dispatch(args.get(1..).unwrap_or_default()) {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}

fn dispatch(args: &[String]) -> Result<()> {
    let Some((mode, rest)) = args.split_first() else {
        bail!("missing command\n\n{USAGE}");
    };

    match (mode.as_str(), rest) {
        ("train", [config]) => {
            let config = TrainConfig::load(config)?;
            train::run(&config)?;
        }
        ("infer", [checkpoint, steps, output, start @ ..]) => {
            let steps = steps
                .parse()
                .with_context(|| format!("invalid step count '{steps}'"))?;

            let start = if start.is_empty() {
                None
            } else {
                Some(parse_reals(start)?)
            };

            // The checkpoint doesn't carry dt.
            let dt = match env::var("DT") {
                Ok(dt) => dt.parse().with_context(|| format!("invalid DT '{dt}'"))?,
                Err(_) => infer::DEFAULT_DT,
            };

            infer::run(Path::new(checkpoint), steps, Path::new(output), start, dt)?;
        }
        ("inspect", [checkpoint]) => inspect::run(Path::new(checkpoint))?,
        ("tape", [program, iterations @ ..]) => {
            let iterations = match iterations {
                [] => tape::DEFAULT_ITERATIONS,
                [n] => n
                    .parse()
                    .with_context(|| format!("invalid iteration count '{n}'"))?,
                _ => bail!("too many arguments\n\n{USAGE}"),
            };

            tape::run(Path::new(program), iterations)?;
        }
        _ => bail!("unknown command or wrong arguments\n\n{USAGE}"),
    }

    Ok(())
}

fn parse_reals(values: &[String]) -> Result<Vec<Real>> {
    values
        .iter()
        .map(|v| {
            v.parse()
                .with_context(|| format!("invalid start coordinate '{v}'"))
        })
        .collect()
}
