use operator_framework::{ControllerConfig, ObjectMeta, ObjectRef};
use solver_operator::dependents::config_map::INPUT_QUEUE_KEY;
use solver_operator::lifecycle::SolverSystem;
use solver_operator::model::{
    AmqBroker, ClusterObject, ResourceKind, Scaling, Solver, SolverSpec, SolverStatus,
};
use std::time::Duration;

// --- Helpers ---

fn solver(name: &str, generation: i64, dynamic: bool) -> Solver {
    Solver::new(
        ObjectMeta::new("default", name).with_generation(generation),
        SolverSpec {
            solver_image: "quay.io/optaplanner/school-timetabling:latest".to_string(),
            amq_broker: AmqBroker {
                host: "amq-broker".to_string(),
                port: 5672,
                username_secret_ref: None,
                password_secret_ref: None,
            },
            scaling: Scaling {
                dynamic,
                ..Scaling::default()
            },
        },
    )
}

fn fast_retries() -> ControllerConfig {
    ControllerConfig::default().with_backoff(Duration::from_millis(10), Duration::from_millis(50))
}

/// Polls the status store until `done` holds for the solver's latest status.
async fn wait_for_status(
    system: &SolverSystem,
    solver: &Solver,
    done: impl Fn(&SolverStatus) -> bool,
) -> SolverStatus {
    tokio::time::timeout(Duration::from_secs(5), async {
        loop {
            if let Some(status) = system.status(solver) {
                if done(&status) {
                    return status;
                }
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("status never reached the expected state")
}

// --- Tests ---

#[tokio::test]
async fn static_solver_becomes_ready_in_one_pass() {
    let system = SolverSystem::new(fast_retries()).unwrap();
    let s = solver("school-timetabling", 1, false);

    // 1. Apply and wait for the first written status
    let status = system.apply(s.clone()).await.unwrap();

    // 2. Queues and config map were created in the same pass
    assert_eq!(
        status,
        SolverStatus::ready(1, "school-timetabling-input", "school-timetabling-output")
    );
    let config = system
        .cluster
        .get(
            ResourceKind::ConfigMap,
            &ObjectRef::new("default", "school-timetabling"),
        )
        .unwrap();
    assert_eq!(
        config.as_config_map().unwrap().data[INPUT_QUEUE_KEY],
        "school-timetabling-input"
    );

    // 3. No scaling objects for a static solver
    assert!(system.cluster.list(ResourceKind::ScaledObject).is_empty());
    assert!(system.cluster.list(ResourceKind::TriggerAuthentication).is_empty());

    // 4. The status was written back onto the stored solver
    let stored = system
        .get(&ObjectRef::new("default", "school-timetabling"))
        .unwrap();
    assert_eq!(stored.status, Some(status));

    system.shutdown().await.unwrap();
}

#[tokio::test]
async fn dynamic_solver_gets_autoscaling_objects() {
    let system = SolverSystem::new(fast_retries()).unwrap();

    // 1. Start static, then switch to dynamic as a new generation
    let mut s = solver("s", 1, false);
    system.apply(s.clone()).await.unwrap();
    s.spec.scaling.dynamic = true;
    s.metadata.generation = 2;
    let status = system.apply(s.clone()).await.unwrap();

    // 2. Ready for the new generation, with the scaling pair in place
    assert_eq!(status, SolverStatus::ready(2, "s-input", "s-output"));
    let scaled = system.cluster.list(ResourceKind::ScaledObject);
    assert_eq!(scaled.len(), 1);
    let ClusterObject::ScaledObject(scaled) = &scaled[0] else {
        panic!("unexpected object {:?}", scaled[0]);
    };
    assert_eq!(scaled.queue_name, "s-input");
    assert_eq!(system.cluster.list(ResourceKind::TriggerAuthentication).len(), 1);

    system.shutdown().await.unwrap();
}

#[tokio::test]
async fn rejected_config_map_reports_error_then_recovers_on_retry() {
    let system = SolverSystem::new(fast_retries()).unwrap();
    system
        .cluster
        .fail_applies(ResourceKind::ConfigMap, "quota exceeded");
    let s = solver("s", 3, false);

    // 1. First attempt fails at the config map step
    let status = system.apply(s.clone()).await.unwrap();
    assert_eq!(
        status,
        SolverStatus::error(
            3,
            "failed to converge config-map: ConfigMap default/s rejected: quota exceeded"
        )
    );

    // 2. Earlier steps still converged
    assert_eq!(system.cluster.list(ResourceKind::MessageQueue).len(), 2);

    // 3. Once the cluster accepts it, a retry turns the status Ready
    system.cluster.clear_failures();
    let status = wait_for_status(&system, &s, SolverStatus::is_ready).await;
    assert_eq!(status, SolverStatus::ready(3, "s-input", "s-output"));

    system.shutdown().await.unwrap();
}

#[tokio::test]
async fn deleted_queue_is_recreated_by_change_event() {
    let system = SolverSystem::new(fast_retries()).unwrap();
    let s = solver("s", 1, false);
    system.apply(s.clone()).await.unwrap();

    // 1. Remove the output queue behind the operator's back
    let output = ObjectRef::new("default", "s-output");
    system.cluster.delete(ResourceKind::MessageQueue, &output);

    // 2. The delete event re-enqueues the owner, which recreates the queue
    tokio::time::timeout(Duration::from_secs(5), async {
        while system.cluster.get(ResourceKind::MessageQueue, &output).is_none() {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("queue was not recreated");

    let status = wait_for_status(&system, &s, SolverStatus::is_ready).await;
    assert_eq!(status, SolverStatus::ready(1, "s-input", "s-output"));

    system.shutdown().await.unwrap();
}

#[tokio::test]
async fn solvers_reconcile_independently() {
    let system = SolverSystem::new(fast_retries()).unwrap();

    let a = solver("a", 1, false);
    let b = solver("b", 4, true);
    let (status_a, status_b) = tokio::join!(system.apply(a), system.apply(b));

    assert_eq!(status_a.unwrap(), SolverStatus::ready(1, "a-input", "a-output"));
    assert_eq!(status_b.unwrap(), SolverStatus::ready(4, "b-input", "b-output"));
    assert_eq!(system.cluster.list(ResourceKind::MessageQueue).len(), 4);

    system.shutdown().await.unwrap();
}

#[tokio::test]
async fn removed_solver_is_no_longer_reconciled() {
    let system = SolverSystem::new(fast_retries()).unwrap();
    let s = solver("s", 1, false);
    let object = ObjectRef::new("default", "s");
    system.apply(s.clone()).await.unwrap();
    // Let the passes triggered by the first pass's own changes settle
    tokio::time::sleep(Duration::from_millis(100)).await;

    let removed = system.remove(&object).await.unwrap().unwrap();
    assert_eq!(removed.status, Some(SolverStatus::ready(1, "s-input", "s-output")));
    assert!(system.get(&object).is_none());

    // Deleting an owned queue no longer brings it back
    let writes = system.statuses.history(&object).len();
    let output = ObjectRef::new("default", "s-output");
    system.cluster.delete(ResourceKind::MessageQueue, &output);
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert!(system.cluster.get(ResourceKind::MessageQueue, &output).is_none());
    assert_eq!(system.statuses.history(&object).len(), writes);

    system.shutdown().await.unwrap();
}
