use super::{apply_desired, DependentError};
use crate::cluster::InMemoryCluster;
use crate::model::{ClusterObject, Deployment, ResourceKind, Solver};
use async_trait::async_trait;
use operator_framework::{Context, DependentResource, EventSource, EventSourceContext, ObjectRef};
use std::collections::BTreeMap;

pub const AMQ_HOST_ENV: &str = "SOLVER_MESSAGE_AMQP_HOST";
pub const AMQ_PORT_ENV: &str = "SOLVER_MESSAGE_AMQP_PORT";

/// Runs the solver image, configured from the solver's config map.
#[derive(Debug, Clone)]
pub struct DeploymentDependent {
    cluster: InMemoryCluster,
}

impl DeploymentDependent {
    pub const NAME: &'static str = "deployment";

    pub fn new(cluster: InMemoryCluster) -> Self {
        Self { cluster }
    }

    pub fn desired(solver: &Solver) -> Deployment {
        let broker = &solver.spec.amq_broker;
        let mut env = BTreeMap::new();
        env.insert(AMQ_HOST_ENV.to_string(), broker.host.clone());
        env.insert(AMQ_PORT_ENV.to_string(), broker.port.to_string());

        Deployment {
            metadata: solver.owned_meta(solver.name()),
            image: solver.spec.solver_image.clone(),
            replicas: solver.spec.scaling.replicas,
            env,
            config_map: solver.name().to_string(),
        }
    }
}

#[async_trait]
impl DependentResource<Solver> for DeploymentDependent {
    type Secondary = ClusterObject;
    type Error = DependentError;

    async fn reconcile(&self, solver: &Solver, _ctx: &Context) -> Result<(), Self::Error> {
        let desired = ClusterObject::Deployment(Self::desired(solver));
        apply_desired(&self.cluster, Self::NAME, solver, desired)
    }

    fn secondary_resource(&self, solver: &Solver) -> Option<ClusterObject> {
        let object = ObjectRef::new(solver.namespace(), solver.name());
        self.cluster.get(ResourceKind::Deployment, &object)
    }

    fn init_event_source(&self, ctx: &EventSourceContext) -> EventSource {
        EventSource::new(Self::NAME, ResourceKind::Deployment.as_str())
            .owned_by(ctx.primary_kind)
    }
}
