use super::{
    error_reporter, status, DependentKey, DependentRegistry, ReadinessChecks, ReconcileError,
    ReconcilePlan, WhenSkipped,
};
use crate::cluster::InMemoryCluster;
use crate::model::{ClusterObject, Solver, SolverStatus};
use async_trait::async_trait;
use operator_framework::{
    Context, EventSourceContext, EventSources, FrameworkError, PrimaryResource, Reconciler,
};
use std::collections::BTreeMap;
use tracing::{debug, info, instrument};

/// Drives one solver's dependents through a [`ReconcilePlan`].
///
/// Holds no per-solver state: everything a pass needs is read from the solver snapshot
/// and the dependents, so passes can be repeated freely.
#[derive(Debug, Clone)]
pub struct SolverReconciler {
    registry: DependentRegistry,
    plan: ReconcilePlan,
}

impl SolverReconciler {
    /// Fails when a step of `plan` has no dependent in `registry`.
    pub fn new(registry: DependentRegistry, plan: ReconcilePlan) -> Result<Self, ReconcileError> {
        if let Some(step) = plan.steps().iter().find(|s| !registry.contains(&s.key)) {
            return Err(ReconcileError::UnregisteredDependent(step.key));
        }
        Ok(Self { registry, plan })
    }

    /// The standard plan over the six cluster-backed dependents.
    pub fn for_cluster(cluster: &InMemoryCluster) -> Self {
        Self {
            registry: DependentRegistry::for_cluster(cluster),
            plan: ReconcilePlan::standard(),
        }
    }

    /// Runs one pass and always yields the status to write: the rendered one, or the
    /// Error status when the pass failed.
    pub async fn reconcile_or_report(&self, solver: &Solver, ctx: &Context) -> SolverStatus {
        match self.run_plan(solver, ctx).await {
            Ok(status) => status,
            Err(err) => self.error_status(solver, ctx, &err),
        }
    }

    #[instrument(
        name = "reconcile",
        skip_all,
        fields(
            solver = %solver.metadata.object_ref(),
            generation = solver.generation(),
            attempt = ctx.retry_attempt
        )
    )]
    async fn run_plan(&self, solver: &Solver, ctx: &Context) -> Result<SolverStatus, ReconcileError> {
        let mut observed = BTreeMap::new();
        let mut checks = ReadinessChecks::new();

        for step in self.plan.steps() {
            let dependent = self.registry.resolve(&step.key)?;

            if !step.gate.holds(solver, &observed) {
                match step.gate.when_skipped() {
                    WhenSkipped::Omitted => debug!(step = step.name, "Skipped"),
                    WhenSkipped::NotEvaluated => {
                        debug!(step = step.name, gate = ?step.gate, "Gate closed, not evaluated");
                        if step.readiness_check {
                            checks.not_evaluated(step.name);
                        }
                    }
                }
                continue;
            }

            dependent
                .reconcile(solver, ctx)
                .await
                .map_err(|source| ReconcileError::Convergence {
                    step: step.name,
                    source,
                })?;

            let secondary = dependent.secondary_resource(solver);
            debug!(step = step.name, present = secondary.is_some(), "Read back");
            if step.readiness_check {
                checks.record(step.name, secondary.is_some());
            }
            if let Some(secondary) = secondary {
                observed.insert(step.key, secondary);
            }
        }

        let ready = checks.verdict();
        if !ready {
            info!(pending = %checks, "Not ready yet");
        }
        let queue = |key: DependentKey| observed.get(&key).and_then(ClusterObject::as_queue);
        let status = status::render(
            solver.generation(),
            ready,
            queue(DependentKey::INPUT_QUEUE),
            queue(DependentKey::OUTPUT_QUEUE),
        )?;
        info!(ready, "Reconciled");
        Ok(status)
    }
}

#[async_trait]
impl Reconciler<Solver> for SolverReconciler {
    type Error = ReconcileError;

    async fn reconcile(&self, solver: &Solver, ctx: &Context) -> Result<SolverStatus, Self::Error> {
        self.run_plan(solver, ctx).await
    }

    fn error_status(&self, solver: &Solver, _ctx: &Context, error: &ReconcileError) -> SolverStatus {
        error_reporter::on_error(solver.generation(), error)
    }

    fn prepare_event_sources(
        &self,
        ctx: &EventSourceContext,
    ) -> Result<EventSources, FrameworkError> {
        EventSources::named(
            self.registry
                .iter()
                .map(|(_, dependent)| dependent.init_event_source(ctx)),
        )
    }
}
