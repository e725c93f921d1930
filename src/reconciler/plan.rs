//! # Reconcile Plan
//!
//! The fixed order in which a solver's dependents converge, written as data: a list of
//! named steps, each with the [`Gate`] that must hold for it to run. A plan is validated
//! once at construction, so a gate can only look at dependents that an earlier step has
//! already observed.

use super::{DependentKey, ReconcileError};
use crate::model::{ClusterObject, Solver};
use std::collections::{BTreeMap, BTreeSet};

/// Precondition of a plan step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Gate {
    Always,
    /// Holds when the solver scales dynamically.
    DynamicScaling,
    /// Holds when both message queues have been observed.
    QueuesPresent,
}

/// What a skipped step contributes to readiness.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WhenSkipped {
    /// Nothing; the step is not part of the solver's configuration.
    Omitted,
    /// A check that was not evaluated and so is not satisfied.
    NotEvaluated,
}

impl Gate {
    /// Dependents whose observed state the gate reads.
    pub fn inputs(self) -> &'static [DependentKey] {
        match self {
            Gate::Always | Gate::DynamicScaling => &[],
            Gate::QueuesPresent => &[DependentKey::INPUT_QUEUE, DependentKey::OUTPUT_QUEUE],
        }
    }

    pub fn holds(self, solver: &Solver, observed: &BTreeMap<DependentKey, ClusterObject>) -> bool {
        match self {
            Gate::Always => true,
            Gate::DynamicScaling => solver.is_dynamic(),
            Gate::QueuesPresent => self.inputs().iter().all(|key| observed.contains_key(key)),
        }
    }

    pub fn when_skipped(self) -> WhenSkipped {
        match self {
            Gate::Always | Gate::DynamicScaling => WhenSkipped::Omitted,
            Gate::QueuesPresent => WhenSkipped::NotEvaluated,
        }
    }
}

/// One convergence step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Step {
    pub name: &'static str,
    pub key: DependentKey,
    pub gate: Gate,
    /// Whether the step's read-back counts toward readiness.
    pub readiness_check: bool,
}

impl Step {
    pub const fn new(name: &'static str, key: DependentKey, gate: Gate) -> Self {
        Self {
            name,
            key,
            gate,
            readiness_check: true,
        }
    }

    /// A step that converges its dependent but never affects readiness.
    pub fn without_check(mut self) -> Self {
        self.readiness_check = false;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconcilePlan {
    steps: Vec<Step>,
}

impl ReconcilePlan {
    /// Validates and builds a plan. Step names and keys must be unique, and every
    /// dependent a gate reads must be converged by an earlier step.
    pub fn new(steps: Vec<Step>) -> Result<Self, ReconcileError> {
        if steps.is_empty() {
            return Err(ReconcileError::InvalidPlan("plan has no steps".into()));
        }

        let mut names = BTreeSet::new();
        let mut earlier = BTreeSet::new();
        for step in &steps {
            if !names.insert(step.name) {
                return Err(ReconcileError::InvalidPlan(format!(
                    "step name {} used twice",
                    step.name
                )));
            }
            if let Some(missing) = step.gate.inputs().iter().find(|k| !earlier.contains(*k)) {
                return Err(ReconcileError::InvalidPlan(format!(
                    "step {} is gated on {missing}, which no earlier step converges",
                    step.name
                )));
            }
            if !earlier.insert(step.key) {
                return Err(ReconcileError::InvalidPlan(format!(
                    "{} is converged by more than one step",
                    step.key
                )));
            }
        }
        Ok(Self { steps })
    }

    /// Deployment, both queues, the scaling pair when dynamic, then the config map once
    /// both queues exist.
    pub fn standard() -> Self {
        Self {
            steps: vec![
                Step::new("deployment", DependentKey::DEPLOYMENT, Gate::Always).without_check(),
                Step::new("input-queue", DependentKey::INPUT_QUEUE, Gate::Always),
                Step::new("output-queue", DependentKey::OUTPUT_QUEUE, Gate::Always),
                Step::new(
                    "trigger-authentication",
                    DependentKey::TRIGGER_AUTH,
                    Gate::DynamicScaling,
                ),
                Step::new("autoscaler", DependentKey::SCALED_OBJECT, Gate::DynamicScaling),
                Step::new("config-map", DependentKey::CONFIG_MAP, Gate::QueuesPresent),
            ],
        }
    }

    pub fn steps(&self) -> &[Step] {
        &self.steps
    }
}

impl Default for ReconcilePlan {
    fn default() -> Self {
        Self::standard()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{dynamic_solver, static_solver};

    #[test]
    fn standard_plan_passes_validation() {
        let standard = ReconcilePlan::standard();
        assert_eq!(ReconcilePlan::new(standard.steps().to_vec()), Ok(standard));
    }

    #[test]
    fn gate_on_a_later_step_is_rejected() {
        let steps = vec![
            Step::new("config-map", DependentKey::CONFIG_MAP, Gate::QueuesPresent),
            Step::new("input-queue", DependentKey::INPUT_QUEUE, Gate::Always),
            Step::new("output-queue", DependentKey::OUTPUT_QUEUE, Gate::Always),
        ];
        let err = ReconcilePlan::new(steps).unwrap_err();
        assert_eq!(
            err.to_string(),
            "invalid reconcile plan: step config-map is gated on MessageQueue[input], which no earlier step converges"
        );
    }

    #[test]
    fn duplicate_steps_are_rejected() {
        let steps = vec![
            Step::new("deployment", DependentKey::DEPLOYMENT, Gate::Always),
            Step::new("deployment-again", DependentKey::DEPLOYMENT, Gate::Always),
        ];
        assert!(matches!(
            ReconcilePlan::new(steps),
            Err(ReconcileError::InvalidPlan(_))
        ));
        assert!(ReconcilePlan::new(Vec::new()).is_err());
    }

    #[test]
    fn gates_follow_scaling_mode_and_observed_queues() {
        let mut observed = BTreeMap::new();
        assert!(!Gate::DynamicScaling.holds(&static_solver("s", 1), &observed));
        assert!(Gate::DynamicScaling.holds(&dynamic_solver("s", 1), &observed));

        let queue = crate::dependents::QueueDependent::new(
            crate::cluster::InMemoryCluster::new(),
            crate::model::MessageAddress::Input,
        )
        .desired(&static_solver("s", 1));
        observed.insert(DependentKey::INPUT_QUEUE, ClusterObject::MessageQueue(queue));
        assert!(!Gate::QueuesPresent.holds(&static_solver("s", 1), &observed));
        assert_eq!(Gate::QueuesPresent.when_skipped(), WhenSkipped::NotEvaluated);
        assert_eq!(Gate::DynamicScaling.when_skipped(), WhenSkipped::Omitted);
    }
}
