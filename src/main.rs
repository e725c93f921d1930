use operator_framework::tracing::setup_tracing;
use operator_framework::{ControllerConfig, ObjectMeta};
use solver_operator::lifecycle::SolverSystem;
use solver_operator::model::{
    AmqBroker, ResourceKind, Scaling, SecretKeyRef, Solver, SolverSpec,
};
use tracing::{info, Instrument};

fn sample_solver() -> Solver {
    let credentials = |key: &str| SecretKeyRef {
        name: "amq-credentials".to_string(),
        key: key.to_string(),
    };
    Solver::new(
        ObjectMeta::new("default", "school-timetabling").with_generation(1),
        SolverSpec {
            solver_image: "quay.io/optaplanner/school-timetabling:latest".to_string(),
            amq_broker: AmqBroker {
                host: "amq-broker.default.svc".to_string(),
                port: 5672,
                username_secret_ref: Some(credentials("username")),
                password_secret_ref: Some(credentials("password")),
            },
            scaling: Scaling::default(),
        },
    )
}

fn to_json<T: serde::Serialize>(value: &T) -> Result<String, String> {
    serde_json::to_string_pretty(value).map_err(|e| e.to_string())
}

#[tokio::main]
async fn main() -> Result<(), String> {
    setup_tracing();

    let config = ControllerConfig::from_env("SOLVER_OPERATOR").map_err(|e| e.to_string())?;
    info!(?config, "Starting solver operator");
    let system = SolverSystem::new(config).map_err(|e| e.to_string())?;

    // Static scaling
    let mut solver = sample_solver();
    let span = tracing::info_span!("static_scaling");
    let status = async {
        info!("Applying solver");
        system.apply(solver.clone()).await.map_err(|e| e.to_string())
    }
    .instrument(span)
    .await?;
    println!("{}", to_json(&status)?);

    // Switch to dynamic scaling as a new generation
    solver.spec.scaling.dynamic = true;
    solver.spec.scaling.max_replicas = 5;
    solver.metadata.generation += 1;
    let span = tracing::info_span!("dynamic_scaling");
    let status = async {
        info!("Applying solver with dynamic scaling");
        system.apply(solver.clone()).await.map_err(|e| e.to_string())
    }
    .instrument(span)
    .await?;
    println!("{}", to_json(&status)?);

    for kind in [ResourceKind::TriggerAuthentication, ResourceKind::ScaledObject] {
        for object in system.cluster.list(kind) {
            println!("{}", to_json(&object)?);
        }
    }

    system.shutdown().await?;

    info!("Solver operator stopped");
    Ok(())
}
