//! Objects stored in the backing cluster and owned by a solver.

use super::MessageAddress;
use operator_framework::ObjectMeta;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt::{self, Display};

/// Kind of an owned object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ResourceKind {
    Deployment,
    MessageQueue,
    ConfigMap,
    TriggerAuthentication,
    ScaledObject,
}

impl ResourceKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ResourceKind::Deployment => "Deployment",
            ResourceKind::MessageQueue => "MessageQueue",
            ResourceKind::ConfigMap => "ConfigMap",
            ResourceKind::TriggerAuthentication => "TriggerAuthentication",
            ResourceKind::ScaledObject => "ScaledObject",
        }
    }
}

impl Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Deployment {
    pub metadata: ObjectMeta,
    pub image: String,
    pub replicas: u32,
    pub env: BTreeMap<String, String>,
    /// Name of the config map mounted into the solver containers.
    pub config_map: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageQueue {
    pub metadata: ObjectMeta,
    pub address: MessageAddress,
    pub queue_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigMap {
    pub metadata: ObjectMeta,
    pub data: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecretTargetRef {
    pub parameter: String,
    pub name: String,
    pub key: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TriggerAuthentication {
    pub metadata: ObjectMeta,
    pub secret_target_refs: Vec<SecretTargetRef>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScaledObject {
    pub metadata: ObjectMeta,
    pub scale_target: String,
    pub min_replicas: u32,
    pub max_replicas: u32,
    pub queue_name: String,
    pub authentication_ref: String,
}

/// Any object the solver operator owns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum ClusterObject {
    Deployment(Deployment),
    MessageQueue(MessageQueue),
    ConfigMap(ConfigMap),
    TriggerAuthentication(TriggerAuthentication),
    ScaledObject(ScaledObject),
}

impl ClusterObject {
    pub fn kind(&self) -> ResourceKind {
        match self {
            ClusterObject::Deployment(_) => ResourceKind::Deployment,
            ClusterObject::MessageQueue(_) => ResourceKind::MessageQueue,
            ClusterObject::ConfigMap(_) => ResourceKind::ConfigMap,
            ClusterObject::TriggerAuthentication(_) => ResourceKind::TriggerAuthentication,
            ClusterObject::ScaledObject(_) => ResourceKind::ScaledObject,
        }
    }

    pub fn metadata(&self) -> &ObjectMeta {
        match self {
            ClusterObject::Deployment(o) => &o.metadata,
            ClusterObject::MessageQueue(o) => &o.metadata,
            ClusterObject::ConfigMap(o) => &o.metadata,
            ClusterObject::TriggerAuthentication(o) => &o.metadata,
            ClusterObject::ScaledObject(o) => &o.metadata,
        }
    }

    pub fn as_queue(&self) -> Option<&MessageQueue> {
        match self {
            ClusterObject::MessageQueue(queue) => Some(queue),
            _ => None,
        }
    }

    pub fn as_config_map(&self) -> Option<&ConfigMap> {
        match self {
            ClusterObject::ConfigMap(config_map) => Some(config_map),
            _ => None,
        }
    }
}
