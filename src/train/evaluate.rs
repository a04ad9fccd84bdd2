use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::data::{Example, ExampleSource};
use crate::error::{NetworkError, Result};
use crate::network::network::Network;

/// One scored test example.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestResult {
    pub name: String,
    pub actual: String,
    pub predicted: String,
    pub mse: f64,
}

impl TestResult {
    pub fn is_correct(&self) -> bool {
        self.actual == self.predicted
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TestReport {
    pub results: Vec<TestResult>,
    pub correct: usize,
    pub incorrect: usize,
    pub skipped: usize,
}

impl TestReport {
    /// Share of scored examples predicted correctly; 0 when nothing was scored.
    pub fn accuracy(&self) -> f64 {
        let scored = self.correct + self.incorrect;
        if scored == 0 {
            0.0
        } else {
            self.correct as f64 / scored as f64
        }
    }

    pub fn mean_mse(&self) -> f64 {
        if self.results.is_empty() {
            return 0.0;
        }
        self.results.iter().map(|r| r.mse).sum::<f64>() / self.results.len() as f64
    }

    /// Writes `Actual;Predicted;Error`, one row per scored example.
    pub fn save_csv(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let mut writer = BufWriter::new(File::create(path)?);
        writeln!(writer, "Actual;Predicted;Error")?;
        for r in &self.results {
            writeln!(writer, "{};{};{}", r.actual, r.predicted, r.mse)?;
        }
        writer.flush()?;
        Ok(())
    }
}

/// A prediction for an unlabeled example. `label` is `None` when the
/// network carries no label for the class.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    pub name: String,
    pub class: usize,
    pub label: Option<String>,
}

/// Scores every example against its label without changing parameters.
///
/// Unlabeled or unloadable examples are skipped and counted.
pub fn test_loop<S>(network: &mut Network, examples: &[Example], source: &S) -> Result<TestReport>
where
    S: ExampleSource + ?Sized,
{
    if !network.is_valid() {
        return Err(NetworkError::InvalidNetwork);
    }

    let mut report = TestReport::default();
    for (index, example) in examples.iter().enumerate() {
        let Some(class) = network.labels().class_of(&example.label) else {
            debug!(name = %example.name, label = %example.label, "Skipping unlabeled example");
            report.skipped += 1;
            continue;
        };

        let (predicted, mse) = match source.load(&example.name).and_then(|grids| network.test_example(grids, class)) {
            Ok(scored) => scored,
            Err(e) if e.is_recoverable() => {
                warn!(name = %example.name, error = %e, "Skipping test example");
                report.skipped += 1;
                continue;
            }
            Err(e) => return Err(e),
        };

        let predicted = label_text(network, predicted);
        if (index + 1) % 10 == 0 {
            debug!(example = index, actual = %example.label, predicted = %predicted, mse, "Test progress");
        }

        let result = TestResult {
            name: example.name.clone(),
            actual: example.label.trim().to_string(),
            predicted,
            mse,
        };
        if result.is_correct() {
            report.correct += 1;
        } else {
            report.incorrect += 1;
        }
        report.results.push(result);
    }

    info!(
        correct = report.correct,
        incorrect = report.incorrect,
        skipped = report.skipped,
        accuracy = report.accuracy(),
        "Testing finished"
    );
    Ok(report)
}

/// Predicts a class for every example; labels in `examples` are ignored.
pub fn predict_loop<S>(network: &mut Network, examples: &[Example], source: &S) -> Result<Vec<Prediction>>
where
    S: ExampleSource + ?Sized,
{
    if !network.is_valid() {
        return Err(NetworkError::InvalidNetwork);
    }

    let mut predictions = Vec::with_capacity(examples.len());
    for example in examples {
        let class = match source.load(&example.name).and_then(|grids| network.predict_example(grids)) {
            Ok(class) => class,
            Err(e) if e.is_recoverable() => {
                warn!(name = %example.name, error = %e, "Skipping example");
                continue;
            }
            Err(e) => return Err(e),
        };
        predictions.push(Prediction {
            name: example.name.clone(),
            class,
            label: network.labels().label_of(class).map(str::to_string),
        });
    }

    info!(predicted = predictions.len(), total = examples.len(), "Prediction finished");
    Ok(predictions)
}

fn label_text(network: &Network, class: usize) -> String {
    network
        .labels()
        .label_of(class)
        .map(str::to_string)
        .unwrap_or_else(|| class.to_string())
}
