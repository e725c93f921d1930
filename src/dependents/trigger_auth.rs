use super::{apply_desired, DependentError};
use crate::cluster::InMemoryCluster;
use crate::model::{ClusterObject, ResourceKind, SecretTargetRef, Solver, TriggerAuthentication};
use async_trait::async_trait;
use operator_framework::{Context, DependentResource, EventSource, EventSourceContext, ObjectRef};

/// Broker credentials the autoscaler uses to read the input queue depth.
#[derive(Debug, Clone)]
pub struct TriggerAuthDependent {
    cluster: InMemoryCluster,
}

impl TriggerAuthDependent {
    pub const NAME: &'static str = "trigger-authentication";

    pub fn new(cluster: InMemoryCluster) -> Self {
        Self { cluster }
    }

    pub fn desired(solver: &Solver) -> TriggerAuthentication {
        let broker = &solver.spec.amq_broker;
        let secret_target_refs = [
            ("username", &broker.username_secret_ref),
            ("password", &broker.password_secret_ref),
        ]
        .into_iter()
        .filter_map(|(parameter, secret)| {
            secret.as_ref().map(|secret| SecretTargetRef {
                parameter: parameter.to_string(),
                name: secret.name.clone(),
                key: secret.key.clone(),
            })
        })
        .collect();

        TriggerAuthentication {
            metadata: solver.owned_meta(solver.name()),
            secret_target_refs,
        }
    }
}

#[async_trait]
impl DependentResource<Solver> for TriggerAuthDependent {
    type Secondary = ClusterObject;
    type Error = DependentError;

    async fn reconcile(&self, solver: &Solver, _ctx: &Context) -> Result<(), Self::Error> {
        let desired = ClusterObject::TriggerAuthentication(Self::desired(solver));
        apply_desired(&self.cluster, Self::NAME, solver, desired)
    }

    fn secondary_resource(&self, solver: &Solver) -> Option<ClusterObject> {
        let object = ObjectRef::new(solver.namespace(), solver.name());
        self.cluster.get(ResourceKind::TriggerAuthentication, &object)
    }

    fn init_event_source(&self, ctx: &EventSourceContext) -> EventSource {
        EventSource::new(Self::NAME, ResourceKind::TriggerAuthentication.as_str())
            .owned_by(ctx.primary_kind)
    }
}
