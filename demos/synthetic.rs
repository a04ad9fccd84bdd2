//! Trains a small convolutional network to tell horizontal bars from
//! vertical ones on generated 6x6 grids.
//!
//!   cargo run --example synthetic

use std::collections::HashMap;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use ferrite_cnn::data::Example;
use ferrite_cnn::network::{Hyperparameters, LayerSpec, NetworkSpec};
use ferrite_cnn::train::{predict_loop, test_loop, train_loop, TerminationConditions, TrainConfig};
use ferrite_cnn::Matrix;

const SIZE: usize = 6;

fn bar(horizontal: bool, line: usize, rng: &mut StdRng) -> Matrix {
    let mut grid = Matrix::zeros(SIZE, SIZE);
    for y in 0..SIZE {
        for x in 0..SIZE {
            let on = if horizontal { y == line } else { x == line };
            // Background stays above zero; input errors divide by pixel values.
            let value = if on { rng.gen_range(0.8..1.0) } else { rng.gen_range(0.05..0.2) };
            grid.set(y, x, value);
        }
    }
    grid
}

fn dataset(count: usize, prefix: &str, rng: &mut StdRng) -> (Vec<Example>, HashMap<String, Vec<Matrix>>) {
    let mut examples = Vec::with_capacity(count);
    let mut grids = HashMap::new();
    for i in 0..count {
        let horizontal = i % 2 == 0;
        let name = format!("{prefix}{i:03}");
        grids.insert(name.clone(), vec![bar(horizontal, rng.gen_range(0..SIZE), rng)]);
        examples.push(Example::new(name, if horizontal { "horizontal" } else { "vertical" }));
    }
    (examples, grids)
}

fn main() -> ferrite_cnn::Result<()> {
    tracing_subscriber::fmt().with_target(false).init();

    let spec = NetworkSpec {
        name: "bars".to_string(),
        hyperparameters: Hyperparameters {
            learning_rate: 0.05,
            momentum: 0.1,
            ..Default::default()
        },
        layers: vec![
            LayerSpec::Input { width: SIZE, height: SIZE, channels: 1 },
            LayerSpec::Convolution { filters: 2, filter_size: 3, stride: 1, activation: "sigmoid".into() },
            LayerSpec::Pool { pool_size: 2, stride: 2, pool_type: "max".into() },
            LayerSpec::Flatten,
            LayerSpec::FullyConnected { units: 4, activation: "sigmoid".into() },
            LayerSpec::Output { classes: 2 },
        ],
        labels: vec!["horizontal".into(), "vertical".into()],
        termination: TerminationConditions::epochs(20).with_target_error(0.001),
    };

    let mut network = spec.build()?;
    network.validate()?;

    let mut rng = StdRng::seed_from_u64(7);
    let (train, train_grids) = dataset(60, "train", &mut rng);
    let (test, test_grids) = dataset(20, "test", &mut rng);

    let report = train_loop(&mut network, &train, &train_grids, &TrainConfig::new(spec.termination.clone()))?;
    for stats in &report.epochs {
        println!("Epoch {}: mean mse = {:.6}", stats.epoch, stats.mean_mse);
    }
    println!("Stopped: {}", report.reason);

    let scored = test_loop(&mut network, &test, &test_grids)?;
    println!("Accuracy: {:.1}%", scored.accuracy() * 100.0);

    for p in predict_loop(&mut network, &test[..4], &test_grids)? {
        println!("{} -> {}", p.name, p.label.unwrap_or_default());
    }
    Ok(())
}
