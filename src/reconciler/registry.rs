//! Maps `(kind, role)` keys to the dependent that owns them.

use super::ReconcileError;
use crate::cluster::InMemoryCluster;
use crate::dependents::{
    ConfigMapDependent, DependentError, DeploymentDependent, QueueDependent,
    ScaledObjectDependent, SolverDependent, TriggerAuthDependent,
};
use crate::model::{ClusterObject, MessageAddress, ResourceKind, Solver};
use operator_framework::DependentResource;
use std::collections::BTreeMap;
use std::fmt::{self, Display};
use std::sync::Arc;

/// Identifies one dependent. The role only distinguishes instances of a shared kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DependentKey {
    pub kind: ResourceKind,
    pub role: Option<MessageAddress>,
}

impl DependentKey {
    pub const DEPLOYMENT: Self = Self::of(ResourceKind::Deployment);
    pub const INPUT_QUEUE: Self = Self::queue(MessageAddress::Input);
    pub const OUTPUT_QUEUE: Self = Self::queue(MessageAddress::Output);
    pub const CONFIG_MAP: Self = Self::of(ResourceKind::ConfigMap);
    pub const TRIGGER_AUTH: Self = Self::of(ResourceKind::TriggerAuthentication);
    pub const SCALED_OBJECT: Self = Self::of(ResourceKind::ScaledObject);

    pub const fn of(kind: ResourceKind) -> Self {
        Self { kind, role: None }
    }

    pub const fn queue(address: MessageAddress) -> Self {
        Self {
            kind: ResourceKind::MessageQueue,
            role: Some(address),
        }
    }
}

impl Display for DependentKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.role {
            Some(role) => write!(f, "{}[{}]", self.kind, role),
            None => write!(f, "{}", self.kind),
        }
    }
}

/// Every dependent of a solver, resolved by key.
#[derive(Clone, Default)]
pub struct DependentRegistry {
    dependents: BTreeMap<DependentKey, Arc<SolverDependent>>,
}

impl DependentRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// The six dependents of a solver, all backed by `cluster`.
    pub fn for_cluster(cluster: &InMemoryCluster) -> Self {
        Self::new()
            .with(
                DependentKey::DEPLOYMENT,
                DeploymentDependent::new(cluster.clone()),
            )
            .with(
                DependentKey::INPUT_QUEUE,
                QueueDependent::new(cluster.clone(), MessageAddress::Input),
            )
            .with(
                DependentKey::OUTPUT_QUEUE,
                QueueDependent::new(cluster.clone(), MessageAddress::Output),
            )
            .with(
                DependentKey::TRIGGER_AUTH,
                TriggerAuthDependent::new(cluster.clone()),
            )
            .with(
                DependentKey::SCALED_OBJECT,
                ScaledObjectDependent::new(cluster.clone()),
            )
            .with(
                DependentKey::CONFIG_MAP,
                ConfigMapDependent::new(cluster.clone()),
            )
    }

    /// Registers `dependent` under `key`, returning the one it replaced.
    pub fn register<D>(&mut self, key: DependentKey, dependent: D) -> Option<Arc<SolverDependent>>
    where
        D: DependentResource<Solver, Secondary = ClusterObject, Error = DependentError> + 'static,
    {
        self.dependents.insert(key, Arc::new(dependent))
    }

    pub fn with<D>(mut self, key: DependentKey, dependent: D) -> Self
    where
        D: DependentResource<Solver, Secondary = ClusterObject, Error = DependentError> + 'static,
    {
        self.register(key, dependent);
        self
    }

    pub fn resolve(&self, key: &DependentKey) -> Result<&SolverDependent, ReconcileError> {
        self.dependents
            .get(key)
            .map(|dependent| &**dependent)
            .ok_or(ReconcileError::UnregisteredDependent(*key))
    }

    pub fn contains(&self, key: &DependentKey) -> bool {
        self.dependents.contains_key(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&DependentKey, &SolverDependent)> {
        self.dependents.iter().map(|(key, dependent)| (key, &**dependent))
    }

    pub fn len(&self) -> usize {
        self.dependents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dependents.is_empty()
    }
}

impl fmt::Debug for DependentRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.dependents.keys()).finish()
    }
}
