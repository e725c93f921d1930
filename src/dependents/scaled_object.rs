use super::{apply_desired, DependentError, QueueDependent, TriggerAuthDependent};
use crate::cluster::InMemoryCluster;
use crate::model::{ClusterObject, MessageAddress, ResourceKind, ScaledObject, Solver};
use async_trait::async_trait;
use operator_framework::{Context, DependentResource, EventSource, EventSourceContext, ObjectRef};

/// Scales the solver deployment on the depth of the input queue.
#[derive(Debug, Clone)]
pub struct ScaledObjectDependent {
    cluster: InMemoryCluster,
}

impl ScaledObjectDependent {
    pub const NAME: &'static str = "scaled-object";

    pub fn new(cluster: InMemoryCluster) -> Self {
        Self { cluster }
    }

    pub fn desired(solver: &Solver) -> ScaledObject {
        let scaling = &solver.spec.scaling;
        let auth = TriggerAuthDependent::desired(solver);
        ScaledObject {
            metadata: solver.owned_meta(solver.name()),
            scale_target: solver.name().to_string(),
            min_replicas: scaling.replicas,
            max_replicas: scaling.max_replicas.max(scaling.replicas),
            queue_name: QueueDependent::queue_name(solver, MessageAddress::Input),
            authentication_ref: auth.metadata.name,
        }
    }
}

#[async_trait]
impl DependentResource<Solver> for ScaledObjectDependent {
    type Secondary = ClusterObject;
    type Error = DependentError;

    async fn reconcile(&self, solver: &Solver, _ctx: &Context) -> Result<(), Self::Error> {
        let desired = ClusterObject::ScaledObject(Self::desired(solver));
        apply_desired(&self.cluster, Self::NAME, solver, desired)
    }

    fn secondary_resource(&self, solver: &Solver) -> Option<ClusterObject> {
        let object = ObjectRef::new(solver.namespace(), solver.name());
        self.cluster.get(ResourceKind::ScaledObject, &object)
    }

    fn init_event_source(&self, ctx: &EventSourceContext) -> EventSource {
        EventSource::new(Self::NAME, ResourceKind::ScaledObject.as_str())
            .owned_by(ctx.primary_kind)
    }
}
