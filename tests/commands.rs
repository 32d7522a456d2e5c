use std::{env, fs, path::PathBuf, process};

use dynamics::checkpoint;
use quadratic_dynamics::{
    TrainConfig,
    commands::{infer, inspect, train},
};

fn scratch_dir(name: &str) -> PathBuf {
    let dir = env::temp_dir().join(format!("quadratic-dynamics-{name}-{}", process::id()));
    fs::create_dir_all(&dir).unwrap();
    dir
}

fn config(dir: &PathBuf) -> TrainConfig {
    let json = format!(
        r#"{{
            "field": {{ "van_der_pol": {{ "mu": 1.5 }} }},
            "dt": 0.01,
            "steps": 30,
            "latent_dim": 3,
            "seed": 42,
            "domain": [-1.0, 1.0],
            "report_every": 5,
            "checkpoint_every": 10,
            "checkpoint_dir": {:?},
            "max_updates": 25,
            "check_finite": true
        }}"#,
        dir.display().to_string()
    );

    let config: TrainConfig = serde_json::from_str(&json).unwrap();
    config.validate().unwrap();
    config
}

#[test]
fn train_writes_periodic_and_final_checkpoints() {
    let dir = scratch_dir("train");
    let outcome = train::run(&config(&dir)).unwrap();

    assert_eq!(outcome.updates, 25);
    assert!(outcome.mean_error.is_finite());

    for name in ["model_save_10.txt", "model_save_20.txt", "model_final.txt"] {
        assert!(dir.join(name).exists(), "{name}");
    }
    assert!(!dir.join("model_save_0.txt").exists());

    let weights = checkpoint::load(dir.join("model_final.txt")).unwrap();
    assert_eq!(weights.dims(), dynamics::Dims::new(2, 2, 3));

    fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn same_seed_trains_the_same_model() {
    let first_dir = scratch_dir("seed-a");
    let second_dir = scratch_dir("seed-b");

    train::run(&config(&first_dir)).unwrap();
    train::run(&config(&second_dir)).unwrap();

    let first = checkpoint::load(first_dir.join("model_final.txt")).unwrap();
    let second = checkpoint::load(second_dir.join("model_final.txt")).unwrap();
    assert_eq!(first, second);

    fs::remove_dir_all(&first_dir).unwrap();
    fs::remove_dir_all(&second_dir).unwrap();
}

#[test]
fn resumed_training_continues_from_the_checkpoint() {
    let dir = scratch_dir("resume");
    train::run(&config(&dir)).unwrap();

    let mut resumed = config(&dir);
    resumed.resume = Some(dir.join("model_final.txt"));
    resumed.max_updates = Some(3);
    resumed.checkpoint_every = None;
    train::run(&resumed).unwrap();

    let weights = checkpoint::load(dir.join("model_final.txt")).unwrap();
    assert_eq!(weights.dims().latent, 3);

    fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn resuming_a_checkpoint_of_another_layout_fails() {
    let dir = scratch_dir("resume-layout");
    train::run(&config(&dir)).unwrap();

    let mut wider = config(&dir);
    wider.resume = Some(dir.join("model_final.txt"));
    wider.latent_dim = 4;
    let err = train::run(&wider).unwrap_err();
    assert!(err.to_string().contains("latent=3"), "{err}");

    let mut no_through = config(&dir);
    no_through.resume = Some(dir.join("model_final.txt"));
    no_through.through = false;
    assert!(train::run(&no_through).is_err());

    fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn infer_and_inspect_read_a_trained_checkpoint() {
    let dir = scratch_dir("infer");
    train::run(&config(&dir)).unwrap();

    let checkpoint_path = dir.join("model_final.txt");
    let csv_path = dir.join("output.csv");
    infer::run(&checkpoint_path, 50, &csv_path, None, 0.01).unwrap();

    let csv = fs::read_to_string(&csv_path).unwrap();
    let lines: Vec<_> = csv.lines().collect();
    assert_eq!(lines.len(), 51);
    assert_eq!(lines[0], "x, y");
    assert!(lines[1..].iter().all(|l| l.split(", ").count() == 2));

    let weights = checkpoint::load(&checkpoint_path).unwrap();
    let report = inspect::report(&weights).unwrap();
    assert!(report.starts_with("dims: input=2 output=2 latent=3"));

    fs::remove_dir_all(&dir).unwrap();
}
