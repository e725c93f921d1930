use super::{apply_desired, DependentError};
use crate::cluster::InMemoryCluster;
use crate::model::{
    ClusterObject, MessageAddress, MessageQueue, ResourceKind, Solver, MESSAGE_ADDRESS_LABEL,
};
use async_trait::async_trait;
use operator_framework::{
    Context, DependentResource, EventSource, EventSourceContext, LabelSelector, PrimaryResource,
};

/// One of the solver's two message queues.
///
/// Input and output queues are the same resource kind. Each instance owns one role: it
/// labels the queue with [`MESSAGE_ADDRESS_LABEL`] and only ever reads back queues
/// carrying that label.
#[derive(Debug, Clone)]
pub struct QueueDependent {
    cluster: InMemoryCluster,
    address: MessageAddress,
    selector: LabelSelector,
}

impl QueueDependent {
    pub fn new(cluster: InMemoryCluster, address: MessageAddress) -> Self {
        Self {
            cluster,
            address,
            selector: LabelSelector::eq(MESSAGE_ADDRESS_LABEL, address.name()),
        }
    }

    pub fn address(&self) -> MessageAddress {
        self.address
    }

    /// Name of both the queue object and the broker queue.
    pub fn queue_name(solver: &Solver, address: MessageAddress) -> String {
        format!("{}-{}", solver.name(), address.name())
    }

    pub fn desired(&self, solver: &Solver) -> MessageQueue {
        let name = Self::queue_name(solver, self.address);
        MessageQueue {
            metadata: solver
                .owned_meta(name.clone())
                .with_label(MESSAGE_ADDRESS_LABEL, self.address.name()),
            address: self.address,
            queue_name: name,
        }
    }

    fn event_source_name(&self) -> String {
        format!("queue-{}", self.address.name())
    }
}

#[async_trait]
impl DependentResource<Solver> for QueueDependent {
    type Secondary = ClusterObject;
    type Error = DependentError;

    async fn reconcile(&self, solver: &Solver, _ctx: &Context) -> Result<(), Self::Error> {
        let desired = ClusterObject::MessageQueue(self.desired(solver));
        let dependent = match self.address {
            MessageAddress::Input => "input-queue",
            MessageAddress::Output => "output-queue",
        };
        apply_desired(&self.cluster, dependent, solver, desired)
    }

    fn secondary_resource(&self, solver: &Solver) -> Option<ClusterObject> {
        self.cluster.find_owned(
            ResourceKind::MessageQueue,
            Solver::KIND,
            &solver.object_ref(),
            &self.selector,
        )
    }

    fn init_event_source(&self, ctx: &EventSourceContext) -> EventSource {
        EventSource::new(self.event_source_name(), ResourceKind::MessageQueue.as_str())
            .with_selector(self.selector.clone())
            .owned_by(ctx.primary_kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::static_solver;

    #[tokio::test]
    async fn each_role_reads_back_only_its_own_queue() {
        let cluster = InMemoryCluster::new();
        let input = QueueDependent::new(cluster.clone(), MessageAddress::Input);
        let output = QueueDependent::new(cluster.clone(), MessageAddress::Output);
        let solver = static_solver("school-timetabling", 1);

        input
            .reconcile(&solver, &Context::first_attempt())
            .await
            .unwrap();
        let queue = input.secondary_resource(&solver).unwrap();
        assert_eq!(
            queue.as_queue().unwrap().queue_name,
            "school-timetabling-input"
        );
        assert!(output.secondary_resource(&solver).is_none());

        output
            .reconcile(&solver, &Context::first_attempt())
            .await
            .unwrap();
        let queue = output.secondary_resource(&solver).unwrap();
        assert_eq!(queue.as_queue().unwrap().address, MessageAddress::Output);
    }

    #[tokio::test]
    async fn queues_of_other_solvers_are_not_observed() {
        let cluster = InMemoryCluster::new();
        let input = QueueDependent::new(cluster.clone(), MessageAddress::Input);

        input
            .reconcile(&static_solver("a", 1), &Context::first_attempt())
            .await
            .unwrap();
        assert!(input.secondary_resource(&static_solver("b", 1)).is_none());
    }

    #[test]
    fn event_sources_are_named_and_filtered_by_role() {
        let cluster = InMemoryCluster::new();
        let ctx = EventSourceContext {
            primary_kind: Solver::KIND,
        };
        let input = QueueDependent::new(cluster.clone(), MessageAddress::Input)
            .init_event_source(&ctx);
        let output = QueueDependent::new(cluster, MessageAddress::Output).init_event_source(&ctx);

        assert_eq!(input.name(), "queue-input");
        assert_eq!(output.name(), "queue-output");
        assert_eq!(input.kind(), "MessageQueue");
        assert_eq!(input.owner_kind(), Some("Solver"));
        assert_eq!(
            input.selector().to_string(),
            "solver.operator/message-address=input"
        );
    }
}
