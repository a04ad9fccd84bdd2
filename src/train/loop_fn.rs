use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::Instant;

use tracing::{debug, info, warn};

use crate::data::{Example, ExampleSource};
use crate::error::{NetworkError, Result};
use crate::network::network::{argmax, Network};
use crate::train::epoch_stats::EpochStats;
use crate::train::termination::TerminationReason;
use crate::train::train_config::TrainConfig;

/// Flush the CSV error log after this many rows.
const ERROR_LOG_FLUSH_EVERY: usize = 50;

/// Outcome of a completed `train_loop` run.
#[derive(Debug, Clone)]
pub struct TrainingReport {
    pub epochs: Vec<EpochStats>,
    pub reason: TerminationReason,
    pub saved_to: Option<PathBuf>,
}

impl TrainingReport {
    pub fn last_mse(&self) -> Option<f64> {
        self.epochs.last().map(|e| e.last_mse)
    }
}

// ---------------------------------------------------------------------------
// Public entry point
// ---------------------------------------------------------------------------

/// Trains `network` one example at a time until a termination condition
/// fires, then saves it if `config.save` is set.
///
/// # Errors
/// - `InvalidNetwork` if the network has not been validated
/// - `MissingTerminationCondition` if `config.termination` sets nothing
/// - `NoUsableExamples` if a whole epoch trains nothing
/// - any fatal error raised while training or saving
///
/// Examples whose data cannot be loaded, or whose label is not in the
/// network's label map, are logged and skipped.
pub fn train_loop<S>(
    network: &mut Network,
    examples: &[Example],
    source: &S,
    config: &TrainConfig,
) -> Result<TrainingReport>
where
    S: ExampleSource + ?Sized,
{
    if !network.is_valid() {
        return Err(NetworkError::InvalidNetwork);
    }
    config.termination.ensure_set()?;

    let mut error_log = match &config.error_log {
        Some(path) => Some(ErrorLog::create(path)?),
        None => None,
    };

    info!(examples = examples.len(), "Starting training");
    let started = Instant::now();
    let mut epochs = Vec::new();
    let mut epoch = 0;

    let reason = loop {
        epoch += 1;
        let (stats, stop) = run_one_epoch(network, examples, source, config, epoch, started, error_log.as_mut())?;
        info!(
            epoch,
            examples = stats.examples,
            skipped = stats.skipped,
            mean_mse = stats.mean_mse,
            elapsed_ms = stats.elapsed_ms,
            "Epoch finished"
        );
        epochs.push(stats);

        if let Some(reason) = stop.or_else(|| config.termination.after_epoch(epoch)) {
            break reason;
        }
    };

    if let Some(log) = error_log.as_mut() {
        log.flush()?;
    }
    info!(%reason, epochs = epoch, "Training finished");

    let saved_to = match &config.save {
        Some(target) => Some(network.save(&target.dir, &target.reference)?),
        None => None,
    };

    Ok(TrainingReport { epochs, reason, saved_to })
}

// ---------------------------------------------------------------------------
// Private helpers
// ---------------------------------------------------------------------------

/// Runs one pass over the examples. Returns the epoch's statistics and the
/// reason to stop if a per-example condition fired.
fn run_one_epoch<S>(
    network: &mut Network,
    examples: &[Example],
    source: &S,
    config: &TrainConfig,
    epoch: usize,
    started: Instant,
    mut error_log: Option<&mut ErrorLog>,
) -> Result<(EpochStats, Option<TerminationReason>)>
where
    S: ExampleSource + ?Sized,
{
    let epoch_start = Instant::now();
    let mut trained = 0;
    let mut skipped = 0;
    let mut total_mse = 0.0;
    let mut last_mse = 0.0;
    let mut stop = None;

    for (index, example) in examples.iter().enumerate() {
        let Some(class) = network.labels().class_of(&example.label) else {
            debug!(name = %example.name, label = %example.label, "Skipping unlabeled example");
            skipped += 1;
            continue;
        };

        let mse = match source.load(&example.name).and_then(|grids| network.train_example(grids, class)) {
            Ok(mse) => mse,
            Err(e) if e.is_recoverable() => {
                warn!(name = %example.name, error = %e, "Skipping training example");
                skipped += 1;
                continue;
            }
            Err(e) => return Err(e),
        };

        trained += 1;
        total_mse += mse;
        last_mse = mse;

        if let Some(log) = error_log.as_deref_mut() {
            log.record(epoch, index, mse)?;
        }

        if config.log_every > 0 && trained % config.log_every == 0 {
            let predicted = network
                .layers()
                .last()
                .map(|layer| argmax(&layer.outputs()))
                .and_then(|class| network.labels().label_of(class))
                .unwrap_or("?");
            debug!(epoch, example = index, mse, actual = %example.label, predicted, "Training progress");
        }

        if let Some(reason) = config.termination.after_example(started.elapsed(), mse) {
            stop = Some(reason);
            break;
        }
    }

    if trained == 0 {
        return Err(NetworkError::NoUsableExamples);
    }

    let stats = EpochStats {
        epoch,
        examples: trained,
        skipped,
        mean_mse: total_mse / trained as f64,
        last_mse,
        elapsed_ms: epoch_start.elapsed().as_millis() as u64,
    };
    Ok((stats, stop))
}

/// `Epoch;Example;MSE` CSV written while training.
struct ErrorLog {
    writer: BufWriter<File>,
    rows: usize,
}

impl ErrorLog {
    fn create(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let mut writer = BufWriter::new(File::create(path)?);
        writeln!(writer, "Epoch;Example;MSE")?;
        Ok(ErrorLog { writer, rows: 0 })
    }

    fn record(&mut self, epoch: usize, example: usize, mse: f64) -> Result<()> {
        writeln!(self.writer, "{epoch};{example};{mse}")?;
        self.rows += 1;
        if self.rows % ERROR_LOG_FLUSH_EVERY == 0 {
            self.writer.flush()?;
        }
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::matrix::Matrix;
    use crate::network::{LabelMap, TrainingContext};
    use crate::train::termination::TerminationConditions;
    use std::collections::HashMap;

    fn network() -> Network {
        let mut net = Network::new(TrainingContext::new(0.01, 0.0, 0.1)).with_labels(LabelMap::new(["low", "high"]));
        net.add_input(2, 2, 1)
            .and_then(|n| n.add_flatten())
            .and_then(|n| n.add_output(2))
            .unwrap();
        net.validate().unwrap();
        net
    }

    fn data() -> (Vec<Example>, HashMap<String, Vec<Matrix>>) {
        let examples = vec![
            Example::new("a", "low"),
            Example::new("b", "high"),
            Example::new("c", "unknown"),
            Example::new("d", "high"),
        ];
        let mut source = HashMap::new();
        source.insert("a".to_string(), vec![Matrix::zeros(2, 2)]);
        source.insert("b".to_string(), vec![Matrix::from_data(vec![vec![1.0; 2]; 2])]);
        source.insert("c".to_string(), vec![Matrix::zeros(2, 2)]);
        (examples, source)
    }

    #[test]
    fn stops_at_epoch_limit_and_counts_skips() {
        let mut net = network();
        let (examples, source) = data();
        let report = train_loop(&mut net, &examples, &source, &TrainConfig::new(TerminationConditions::epochs(3))).unwrap();

        assert_eq!(report.reason, TerminationReason::EpochLimit);
        assert_eq!(report.epochs.len(), 3);
        // "c" is unlabeled and "d" has no data.
        assert_eq!(report.epochs[0].examples, 2);
        assert_eq!(report.epochs[0].skipped, 2);
        assert!(report.saved_to.is_none());
    }

    #[test]
    fn requires_validation_and_a_condition() {
        let mut unvalidated = Network::new(TrainingContext::default());
        let (examples, source) = data();
        let config = TrainConfig::new(TerminationConditions::epochs(1));
        assert!(matches!(
            train_loop(&mut unvalidated, &examples, &source, &config),
            Err(NetworkError::InvalidNetwork)
        ));

        let mut net = network();
        assert!(matches!(
            train_loop(&mut net, &examples, &source, &TrainConfig::new(TerminationConditions::default())),
            Err(NetworkError::MissingTerminationCondition)
        ));
    }

    #[test]
    fn epoch_without_usable_examples_fails() {
        let mut net = network();
        let examples = vec![Example::new("ghost", "low")];
        let source: HashMap<String, Vec<Matrix>> = HashMap::new();
        assert!(matches!(
            train_loop(&mut net, &examples, &source, &TrainConfig::new(TerminationConditions::epochs(1))),
            Err(NetworkError::NoUsableExamples)
        ));
    }

    #[test]
    fn target_error_stops_mid_epoch() {
        let mut net = network();
        let (examples, source) = data();
        let config = TrainConfig::new(TerminationConditions::default().with_target_error(1.0));
        let report = train_loop(&mut net, &examples, &source, &config).unwrap();
        assert_eq!(report.reason, TerminationReason::TargetError);
        assert_eq!(report.epochs.len(), 1);
        assert_eq!(report.epochs[0].examples, 1);
    }

    #[test]
    fn writes_error_log_and_saves() {
        let dir = tempfile::tempdir().unwrap();
        let mut net = network();
        let (examples, source) = data();
        let config = TrainConfig::new(TerminationConditions::epochs(2))
            .log_errors_to(dir.path().join("logs/mse.csv"))
            .save_to(dir.path(), "run");
        let report = train_loop(&mut net, &examples, &source, &config).unwrap();

        let log = std::fs::read_to_string(dir.path().join("logs/mse.csv")).unwrap();
        let lines: Vec<&str> = log.lines().collect();
        assert_eq!(lines[0], "Epoch;Example;MSE");
        assert_eq!(lines.len(), 1 + 4);
        assert!(lines[1].starts_with("1;0;"));
        assert!(lines[4].starts_with("2;1;"));

        assert_eq!(report.saved_to, Some(dir.path().join("run.zip")));
        assert!(dir.path().join("run.zip").exists());
    }
}
