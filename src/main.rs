//! `ferrite-cnn`: train, test and run a convolutional network on an image
//! directory described by a CSV manifest.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use ferrite_cnn::data::{load_manifest, ImageDirectory, DEFAULT_SKIP_SUFFIX};
use ferrite_cnn::train::{predict_loop, test_loop, train_loop, TrainConfig};
use ferrite_cnn::{Network, NetworkError, NetworkSpec, Result};

#[derive(Parser, Debug)]
#[command(name = "ferrite-cnn", version, about, long_about = None)]
struct Cli {
    /// Increase verbosity (-v, -vv)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Build a network from a JSON spec and train it
    Train {
        /// Network spec (JSON)
        #[arg(long)]
        spec: PathBuf,
        /// Directory holding the images and the manifest
        #[arg(long)]
        data: PathBuf,
        #[arg(long, default_value = "trainingImages.csv")]
        manifest: String,
        /// Directory the trained archive is written to
        #[arg(long, default_value = ".")]
        save_dir: PathBuf,
        /// Archive name; defaults to the spec's name
        #[arg(long)]
        reference: Option<String>,
        /// CSV file receiving every example's MSE
        #[arg(long)]
        error_log: Option<PathBuf>,
        /// Image file extension
        #[arg(long, default_value = "png")]
        extension: String,
    },
    /// Score a saved network against a labeled manifest
    Test {
        /// Saved network archive (.zip)
        #[arg(long)]
        model: PathBuf,
        #[arg(long)]
        data: PathBuf,
        #[arg(long, default_value = "testImages.csv")]
        manifest: String,
        /// Write `Actual;Predicted;Error` rows here
        #[arg(long)]
        results: Option<PathBuf>,
        #[arg(long, default_value = "png")]
        extension: String,
    },
    /// Print a predicted label for every image in a manifest
    Predict {
        #[arg(long)]
        model: PathBuf,
        #[arg(long)]
        data: PathBuf,
        #[arg(long, default_value = "testImages.csv")]
        manifest: String,
        #[arg(long, default_value = "png")]
        extension: String,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let default_level = match cli.verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt().with_target(false).with_env_filter(filter).init();

    match run(cli.command) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "Aborting");
            ExitCode::FAILURE
        }
    }
}

fn run(command: Command) -> Result<()> {
    match command {
        Command::Train { spec, data, manifest, save_dir, reference, error_log, extension } => {
            let spec = NetworkSpec::load_json(&spec)?;
            let mut network = spec.build()?;
            network.validate()?;

            let source = image_source(&network, &data, &extension)?;
            let examples = load_manifest(&data.join(&manifest), DEFAULT_SKIP_SUFFIX)?;

            let reference = reference.unwrap_or_else(|| spec.name.clone());
            let mut config = TrainConfig::new(spec.termination.clone()).save_to(save_dir, reference);
            if let Some(path) = error_log {
                config = config.log_errors_to(path);
            }

            let report = train_loop(&mut network, &examples, &source, &config)?;
            info!(
                reason = %report.reason,
                epochs = report.epochs.len(),
                last_mse = report.last_mse().unwrap_or(0.0),
                "Training complete"
            );
            if let Some(path) = report.saved_to {
                println!("{}", path.display());
            }
        }
        Command::Test { model, data, manifest, results, extension } => {
            let mut network = load_validated(&model)?;
            let source = image_source(&network, &data, &extension)?;
            let examples = load_manifest(&data.join(&manifest), DEFAULT_SKIP_SUFFIX)?;

            let report = test_loop(&mut network, &examples, &source)?;
            println!(
                "correct: {}  incorrect: {}  skipped: {}  accuracy: {:.2}%",
                report.correct,
                report.incorrect,
                report.skipped,
                report.accuracy() * 100.0
            );
            if let Some(path) = results {
                report.save_csv(&path)?;
            }
        }
        Command::Predict { model, data, manifest, extension } => {
            let mut network = load_validated(&model)?;
            let source = image_source(&network, &data, &extension)?;
            let examples = load_manifest(&data.join(&manifest), DEFAULT_SKIP_SUFFIX)?;

            for p in predict_loop(&mut network, &examples, &source)? {
                let label = p.label.unwrap_or_else(|| p.class.to_string());
                println!("{};{}", p.name, label);
            }
        }
    }
    Ok(())
}

fn load_validated(path: &Path) -> Result<Network> {
    let mut network = Network::load(path)?;
    network.validate()?;
    Ok(network)
}

/// Images are resized to the input layer's width and height.
fn image_source(network: &Network, dir: &Path, extension: &str) -> Result<ImageDirectory> {
    let shape = network
        .layers()
        .first()
        .map(|layer| layer.input_shape())
        .ok_or(NetworkError::InvalidNetwork)?;
    let source = ImageDirectory::new(dir, shape.channels.max(0) as usize)?
        .with_extension(extension)
        .with_size(shape.width.max(0) as u32, shape.height.max(0) as u32);
    Ok(source)
}
