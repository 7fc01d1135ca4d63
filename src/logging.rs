use chrono::{DateTime, Utc};
use tracing::{error, info, Level};

use crate::models::{ProvisioningResult, StepOutcome};

/// Install the process-wide subscriber. Call once, at startup.
///
/// Progress goes out at INFO; `debug` adds request/response detail.
pub fn init_tracing(debug: bool) {
    let level = if debug { Level::DEBUG } else { Level::INFO };

    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(debug)
        .with_writer(std::io::stderr)
        .init();
}

/// Per-outcome step totals of a run
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct OutcomeCounts {
    pub created: usize,
    pub existing: usize,
    pub applied: usize,
    pub failed: usize,
}

impl OutcomeCounts {
    pub fn tally(result: &ProvisioningResult) -> Self {
        result
            .steps
            .iter()
            .fold(Self::default(), |mut counts, record| {
                match record.outcome {
                    StepOutcome::Created => counts.created += 1,
                    StepOutcome::AlreadyExists => counts.existing += 1,
                    StepOutcome::Applied => counts.applied += 1,
                    StepOutcome::Failed(_) => counts.failed += 1,
                }
                counts
            })
    }
}

/// Write one line per step and a totals line for a finished run
pub fn log_summary(result: &ProvisioningResult, started_at: DateTime<Utc>) {
    let finished_at = Utc::now();
    let elapsed = finished_at - started_at;

    for record in &result.steps {
        info!(target: "summary", "{:<48} {}", record.step.to_string(), record.outcome);
    }

    let counts = OutcomeCounts::tally(result);
    let line = format!(
        "{} steps in {}ms ({} created, {} already existed, {} grants applied, {} failed), finished {}",
        result.steps.len(),
        elapsed.num_milliseconds(),
        counts.created,
        counts.existing,
        counts.applied,
        counts.failed,
        finished_at.format("%Y-%m-%d %H:%M:%S UTC")
    );

    if result.is_success() {
        info!(target: "summary", "Provisioning succeeded: {}", line);
    } else {
        error!(target: "summary", "Provisioning failed: {}", line);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Step;

    #[test]
    fn test_outcomes_are_tallied() {
        let mut result = ProvisioningResult::default();
        result.record(
            Step::Admin {
                user: "admin".to_string(),
            },
            StepOutcome::AlreadyExists,
        );
        result.record(
            Step::Database {
                name: "metrics".to_string(),
            },
            StepOutcome::Created,
        );
        result.record(
            Step::Database {
                name: "events".to_string(),
            },
            StepOutcome::Failed("timeout".to_string()),
        );

        assert_eq!(
            OutcomeCounts::tally(&result),
            OutcomeCounts {
                created: 1,
                existing: 1,
                applied: 0,
                failed: 1,
            }
        );
    }

    #[test]
    fn test_empty_run_tallies_to_zero() {
        assert_eq!(
            OutcomeCounts::tally(&ProvisioningResult::default()),
            OutcomeCounts::default()
        );
    }
}
