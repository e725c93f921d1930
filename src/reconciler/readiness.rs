//! Aggregates the readiness checks gathered during one reconcile pass.

use std::fmt::{self, Display};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckOutcome {
    Satisfied,
    Unsatisfied,
    /// The step was gated off before it could be checked.
    NotEvaluated,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadinessCheck {
    pub name: &'static str,
    pub outcome: CheckOutcome,
}

/// Readiness checks in the order they were recorded.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReadinessChecks {
    checks: Vec<ReadinessCheck>,
}

impl ReadinessChecks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records whether the step's secondary resource was observed.
    pub fn record(&mut self, name: &'static str, present: bool) {
        let outcome = if present {
            CheckOutcome::Satisfied
        } else {
            CheckOutcome::Unsatisfied
        };
        self.checks.push(ReadinessCheck { name, outcome });
    }

    pub fn not_evaluated(&mut self, name: &'static str) {
        self.checks.push(ReadinessCheck {
            name,
            outcome: CheckOutcome::NotEvaluated,
        });
    }

    /// Ready when at least one check was recorded and every check is satisfied.
    pub fn verdict(&self) -> bool {
        !self.checks.is_empty()
            && self
                .checks
                .iter()
                .all(|check| check.outcome == CheckOutcome::Satisfied)
    }

    pub fn pending(&self) -> impl Iterator<Item = &ReadinessCheck> {
        self.checks
            .iter()
            .filter(|check| check.outcome != CheckOutcome::Satisfied)
    }

    pub fn checks(&self) -> &[ReadinessCheck] {
        &self.checks
    }
}

/// Lists the pending checks, e.g. `output-queue, config-map (not evaluated)`.
impl Display for ReadinessChecks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, check) in self.pending().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            f.write_str(check.name)?;
            if check.outcome == CheckOutcome::NotEvaluated {
                f.write_str(" (not evaluated)")?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_check_set_is_not_ready() {
        assert!(!ReadinessChecks::new().verdict());
    }

    #[test]
    fn every_check_must_be_satisfied() {
        let mut checks = ReadinessChecks::new();
        checks.record("input-queue", true);
        checks.record("output-queue", true);
        assert!(checks.verdict());

        checks.record("config-map", false);
        assert!(!checks.verdict());
        assert_eq!(checks.to_string(), "config-map");
    }

    #[test]
    fn not_evaluated_counts_as_unsatisfied() {
        let mut checks = ReadinessChecks::new();
        checks.record("input-queue", true);
        checks.record("output-queue", false);
        checks.not_evaluated("config-map");
        assert!(!checks.verdict());
        assert_eq!(
            checks.to_string(),
            "output-queue, config-map (not evaluated)"
        );
    }

    #[test]
    fn checks_keep_recording_order() {
        let mut checks = ReadinessChecks::new();
        checks.record("output-queue", true);
        checks.not_evaluated("config-map");
        checks.record("input-queue", false);

        let outcomes: Vec<_> = checks
            .checks()
            .iter()
            .map(|check| (check.name, check.outcome))
            .collect();
        assert_eq!(
            outcomes,
            vec![
                ("output-queue", CheckOutcome::Satisfied),
                ("config-map", CheckOutcome::NotEvaluated),
                ("input-queue", CheckOutcome::Unsatisfied),
            ]
        );
    }
}
