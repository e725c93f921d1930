//! # Primary Resources
//!
//! The `PrimaryResource` trait is the contract a user-declared object (the thing a
//! controller reconciles) must satisfy. It exposes the metadata the framework needs to
//! key work queues, correlate secondary resources, and stamp status with a generation.
//!
//! Metadata is deliberately small: identity, a generation counter, labels, and an
//! optional owner reference. Secondary resources reuse the same [`ObjectMeta`] so their
//! owner can be resolved when a watch fires.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt::{self, Debug, Display};

/// Identity of an object: namespace plus name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ObjectRef {
    pub namespace: String,
    pub name: String,
}

impl ObjectRef {
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            name: name.into(),
        }
    }
}

impl Display for ObjectRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.namespace, self.name)
    }
}

/// Reference from a secondary object to the primary that owns it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OwnerReference {
    pub kind: String,
    pub name: String,
}

/// Metadata shared by primary and secondary objects.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectMeta {
    pub name: String,
    pub namespace: String,
    /// Incremented by the system of record on every spec change.
    #[serde(default)]
    pub generation: i64,
    #[serde(default)]
    pub labels: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner: Option<OwnerReference>,
}

impl ObjectMeta {
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            namespace: namespace.into(),
            ..Self::default()
        }
    }

    pub fn with_generation(mut self, generation: i64) -> Self {
        self.generation = generation;
        self
    }

    pub fn with_label(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.labels.insert(key.into(), value.into());
        self
    }

    pub fn with_owner(mut self, kind: impl Into<String>, name: impl Into<String>) -> Self {
        self.owner = Some(OwnerReference {
            kind: kind.into(),
            name: name.into(),
        });
        self
    }

    pub fn object_ref(&self) -> ObjectRef {
        ObjectRef::new(self.namespace.clone(), self.name.clone())
    }

    pub fn is_owned_by(&self, kind: &str, owner: &ObjectRef) -> bool {
        self.namespace == owner.namespace
            && self
                .owner
                .as_ref()
                .is_some_and(|o| o.kind == kind && o.name == owner.name)
    }
}

/// Trait that any user-declared resource must implement to be reconciled by a
/// [`Controller`](crate::Controller).
///
/// # Status Ownership
/// The `Status` associated type is written only by the controller, as a full
/// replacement, once per reconcile invocation. It is never merged with a previous value.
pub trait PrimaryResource: Clone + Send + Sync + Debug + 'static {
    /// Kind name used in owner references and event-source matching.
    const KIND: &'static str;

    /// The observable status rendered by the reconciler.
    type Status: Clone + Send + Sync + Debug + PartialEq + 'static;

    fn metadata(&self) -> &ObjectMeta;

    fn object_ref(&self) -> ObjectRef {
        self.metadata().object_ref()
    }

    fn generation(&self) -> i64 {
        self.metadata().generation
    }
}
