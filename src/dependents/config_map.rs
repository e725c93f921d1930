use super::{apply_desired, DependentError, QueueDependent};
use crate::cluster::InMemoryCluster;
use crate::model::{ClusterObject, ConfigMap, MessageAddress, ResourceKind, Solver};
use async_trait::async_trait;
use operator_framework::{Context, DependentResource, EventSource, EventSourceContext, ObjectRef};
use std::collections::BTreeMap;

pub const AMQP_HOST_KEY: &str = "solver.amqp.host";
pub const AMQP_PORT_KEY: &str = "solver.amqp.port";
pub const INPUT_QUEUE_KEY: &str = "solver.message.input";
pub const OUTPUT_QUEUE_KEY: &str = "solver.message.output";

/// Configuration handed to the solver containers.
///
/// The queue names are taken from the queues the cluster actually holds, so this
/// dependent can only converge once both queues exist.
#[derive(Debug, Clone)]
pub struct ConfigMapDependent {
    cluster: InMemoryCluster,
    input: QueueDependent,
    output: QueueDependent,
}

impl ConfigMapDependent {
    pub const NAME: &'static str = "config-map";

    pub fn new(cluster: InMemoryCluster) -> Self {
        Self {
            input: QueueDependent::new(cluster.clone(), MessageAddress::Input),
            output: QueueDependent::new(cluster.clone(), MessageAddress::Output),
            cluster,
        }
    }

    fn observed_queue_name(
        queue: &QueueDependent,
        solver: &Solver,
    ) -> Result<String, DependentError> {
        queue
            .secondary_resource(solver)
            .as_ref()
            .and_then(ClusterObject::as_queue)
            .map(|q| q.queue_name.clone())
            .ok_or_else(|| DependentError::MissingInput {
                dependent: Self::NAME,
                missing: format!("{} queue", queue.address()),
            })
    }

    pub fn desired(&self, solver: &Solver) -> Result<ConfigMap, DependentError> {
        let broker = &solver.spec.amq_broker;
        let mut data = BTreeMap::new();
        data.insert(AMQP_HOST_KEY.to_string(), broker.host.clone());
        data.insert(AMQP_PORT_KEY.to_string(), broker.port.to_string());
        data.insert(
            INPUT_QUEUE_KEY.to_string(),
            Self::observed_queue_name(&self.input, solver)?,
        );
        data.insert(
            OUTPUT_QUEUE_KEY.to_string(),
            Self::observed_queue_name(&self.output, solver)?,
        );

        Ok(ConfigMap {
            metadata: solver.owned_meta(solver.name()),
            data,
        })
    }
}

#[async_trait]
impl DependentResource<Solver> for ConfigMapDependent {
    type Secondary = ClusterObject;
    type Error = DependentError;

    async fn reconcile(&self, solver: &Solver, _ctx: &Context) -> Result<(), Self::Error> {
        let desired = ClusterObject::ConfigMap(self.desired(solver)?);
        apply_desired(&self.cluster, Self::NAME, solver, desired)
    }

    fn secondary_resource(&self, solver: &Solver) -> Option<ClusterObject> {
        let object = ObjectRef::new(solver.namespace(), solver.name());
        self.cluster.get(ResourceKind::ConfigMap, &object)
    }

    fn init_event_source(&self, ctx: &EventSourceContext) -> EventSource {
        EventSource::new(Self::NAME, ResourceKind::ConfigMap.as_str())
            .owned_by(ctx.primary_kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::static_solver;

    #[tokio::test]
    async fn refuses_to_converge_without_both_queues() {
        let cluster = InMemoryCluster::new();
        let solver = static_solver("s", 1);
        QueueDependent::new(cluster.clone(), MessageAddress::Input)
            .reconcile(&solver, &Context::first_attempt())
            .await
            .unwrap();

        let config = ConfigMapDependent::new(cluster.clone());
        let err = config
            .reconcile(&solver, &Context::first_attempt())
            .await
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "config-map requires the output queue, which does not exist yet"
        );
        assert!(config.secondary_resource(&solver).is_none());
    }

    #[tokio::test]
    async fn data_holds_broker_and_observed_queue_names() {
        let cluster = InMemoryCluster::new();
        let solver = static_solver("s", 1);
        for address in MessageAddress::ALL {
            QueueDependent::new(cluster.clone(), address)
                .reconcile(&solver, &Context::first_attempt())
                .await
                .unwrap();
        }

        let config = ConfigMapDependent::new(cluster);
        config
            .reconcile(&solver, &Context::first_attempt())
            .await
            .unwrap();
        let observed = config.secondary_resource(&solver).unwrap();
        let data = &observed.as_config_map().unwrap().data;
        assert_eq!(data[AMQP_HOST_KEY], "amq-broker");
        assert_eq!(data[AMQP_PORT_KEY], "5672");
        assert_eq!(data[INPUT_QUEUE_KEY], "s-input");
        assert_eq!(data[OUTPUT_QUEUE_KEY], "s-output");
    }
}
