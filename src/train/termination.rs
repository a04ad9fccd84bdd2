use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{NetworkError, Result};

/// When a training run stops. Any condition that is set can end the run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TerminationConditions {
    /// Stop after this many completed epochs (counts when > 0).
    pub max_epochs: Option<usize>,
    /// Stop once an example's MSE is at or below this (counts when >= 0).
    pub target_error: Option<f64>,
    /// Stop once training has run this many milliseconds (counts when > 0).
    pub max_duration_ms: Option<u64>,
}

/// Why the training loop stopped.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TerminationReason {
    EpochLimit,
    TargetError,
    Duration,
}

impl fmt::Display for TerminationReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            TerminationReason::EpochLimit => "epoch limit reached",
            TerminationReason::TargetError => "target error reached",
            TerminationReason::Duration => "duration limit reached",
        };
        f.write_str(text)
    }
}

impl TerminationConditions {
    pub fn epochs(max_epochs: usize) -> Self {
        TerminationConditions {
            max_epochs: Some(max_epochs),
            ..Default::default()
        }
    }

    pub fn with_target_error(mut self, target: f64) -> Self {
        self.target_error = Some(target);
        self
    }

    pub fn with_duration(mut self, duration: Duration) -> Self {
        self.max_duration_ms = Some(u64::try_from(duration.as_millis()).unwrap_or(u64::MAX));
        self
    }

    fn epoch_limit(&self) -> Option<usize> {
        self.max_epochs.filter(|n| *n > 0)
    }

    fn target(&self) -> Option<f64> {
        self.target_error.filter(|t| *t >= 0.0)
    }

    fn duration(&self) -> Option<Duration> {
        self.max_duration_ms.filter(|ms| *ms > 0).map(Duration::from_millis)
    }

    pub fn is_set(&self) -> bool {
        self.epoch_limit().is_some() || self.target().is_some() || self.duration().is_some()
    }

    pub fn ensure_set(&self) -> Result<()> {
        if self.is_set() {
            Ok(())
        } else {
            Err(NetworkError::MissingTerminationCondition)
        }
    }

    /// Checked after every trained example.
    pub fn after_example(&self, elapsed: Duration, mse: f64) -> Option<TerminationReason> {
        if self.duration().is_some_and(|limit| elapsed > limit) {
            return Some(TerminationReason::Duration);
        }
        if self.target().is_some_and(|target| mse <= target) {
            return Some(TerminationReason::TargetError);
        }
        None
    }

    /// Checked when an epoch completes; `completed` counts from 1.
    pub fn after_epoch(&self, completed: usize) -> Option<TerminationReason> {
        self.epoch_limit()
            .filter(|limit| completed >= *limit)
            .map(|_| TerminationReason::EpochLimit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nothing_set_by_default() {
        let none = TerminationConditions::default();
        assert!(!none.is_set());
        assert!(matches!(none.ensure_set(), Err(NetworkError::MissingTerminationCondition)));

        let zeroed = TerminationConditions {
            max_epochs: Some(0),
            target_error: Some(-1.0),
            max_duration_ms: Some(0),
        };
        assert!(!zeroed.is_set());
    }

    #[test]
    fn zero_target_error_counts_as_set() {
        let conditions = TerminationConditions::default().with_target_error(0.0);
        assert!(conditions.is_set());
        assert_eq!(
            conditions.after_example(Duration::ZERO, 0.0),
            Some(TerminationReason::TargetError)
        );
        assert_eq!(conditions.after_example(Duration::ZERO, 1e-9), None);
    }

    #[test]
    fn epoch_limit_only_after_epoch() {
        let conditions = TerminationConditions::epochs(2);
        assert_eq!(conditions.after_example(Duration::from_secs(999), 0.0), None);
        assert_eq!(conditions.after_epoch(1), None);
        assert_eq!(conditions.after_epoch(2), Some(TerminationReason::EpochLimit));
    }

    #[test]
    fn duration_limit() {
        let conditions = TerminationConditions::default().with_duration(Duration::from_secs(5));
        assert_eq!(conditions.after_example(Duration::from_secs(5), 1.0), None);
        assert_eq!(
            conditions.after_example(Duration::from_secs(6), 1.0),
            Some(TerminationReason::Duration)
        );
    }

    #[test]
    fn sub_second_duration_is_kept() {
        let conditions = TerminationConditions::default().with_duration(Duration::from_millis(500));
        assert!(conditions.is_set());
        assert_eq!(conditions.max_duration_ms, Some(500));
        assert_eq!(conditions.after_example(Duration::from_millis(400), 1.0), None);
        assert_eq!(
            conditions.after_example(Duration::from_millis(501), 1.0),
            Some(TerminationReason::Duration)
        );
    }

    #[test]
    fn partial_json_uses_defaults() {
        let conditions: TerminationConditions = serde_json::from_str(r#"{ "target_error": 0.01 }"#).unwrap();
        assert_eq!(conditions.max_epochs, None);
        assert!(conditions.is_set());
    }
}
