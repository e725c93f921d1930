//! Solver fixtures shared by unit tests.

use crate::model::{AmqBroker, Scaling, Solver, SolverSpec};
use operator_framework::ObjectMeta;

pub(crate) const SOLVER_IMAGE: &str = "quay.io/optaplanner/school-timetabling:latest";

pub(crate) fn static_solver(name: &str, generation: i64) -> Solver {
    Solver::new(
        ObjectMeta::new("default", name).with_generation(generation),
        SolverSpec {
            solver_image: SOLVER_IMAGE.to_string(),
            amq_broker: AmqBroker {
                host: "amq-broker".to_string(),
                port: 5672,
                username_secret_ref: None,
                password_secret_ref: None,
            },
            scaling: Scaling::default(),
        },
    )
}

pub(crate) fn dynamic_solver(name: &str, generation: i64) -> Solver {
    let mut solver = static_solver(name, generation);
    solver.spec.scaling.dynamic = true;
    solver
}
