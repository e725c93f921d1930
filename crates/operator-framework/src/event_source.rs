//! # Event Sources
//!
//! An event source is a named watch over one owned resource kind. When a matching
//! secondary object changes, the controller re-enqueues its owning primary so the
//! reconcile loop runs again. The watch transport itself belongs to the host; this
//! module only describes *what* is watched and decides whether an event matches.
//!
//! Two instances of the same dependent type (e.g. input and output queues) are told
//! apart by a [`LabelSelector`] and must be registered under distinct names.

use crate::error::FrameworkError;
use crate::resource::{ObjectRef, OwnerReference};
use std::collections::BTreeMap;
use std::fmt::{self, Display};

/// Equality-based label selector: `key=value[,key=value...]`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LabelSelector {
    requirements: BTreeMap<String, String>,
}

impl LabelSelector {
    /// A selector that matches everything.
    pub fn everything() -> Self {
        Self::default()
    }

    pub fn eq(key: impl Into<String>, value: impl Into<String>) -> Self {
        let mut requirements = BTreeMap::new();
        requirements.insert(key.into(), value.into());
        Self { requirements }
    }

    /// Parses `key=value` pairs separated by commas. Blank input matches everything.
    pub fn parse(input: &str) -> Result<Self, FrameworkError> {
        let mut requirements = BTreeMap::new();
        for term in input.split(',').map(str::trim).filter(|t| !t.is_empty()) {
            let (key, value) = term
                .split_once('=')
                .ok_or_else(|| FrameworkError::InvalidSelector(input.to_string()))?;
            let key = key.trim();
            if key.is_empty() {
                return Err(FrameworkError::InvalidSelector(input.to_string()));
            }
            requirements.insert(key.to_string(), value.trim().to_string());
        }
        Ok(Self { requirements })
    }

    pub fn matches(&self, labels: &BTreeMap<String, String>) -> bool {
        self.requirements
            .iter()
            .all(|(key, value)| labels.get(key) == Some(value))
    }

    pub fn is_empty(&self) -> bool {
        self.requirements.is_empty()
    }
}

impl Display for LabelSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let terms: Vec<String> = self
            .requirements
            .iter()
            .map(|(k, v)| format!("{k}={v}"))
            .collect();
        write!(f, "{}", terms.join(","))
    }
}

/// Change notification for an owned object, as delivered by the host's watch.
#[derive(Debug, Clone, PartialEq)]
pub struct ResourceEvent {
    pub kind: String,
    pub object: ObjectRef,
    pub labels: BTreeMap<String, String>,
    /// The object's owner reference. Owners live in the object's namespace.
    pub owner: Option<OwnerReference>,
}

impl ResourceEvent {
    /// The owner, if it is of kind `owner_kind`.
    pub fn owner_of_kind(&self, owner_kind: &str) -> Option<ObjectRef> {
        self.owner
            .as_ref()
            .filter(|owner| owner.kind == owner_kind)
            .map(|owner| ObjectRef::new(self.object.namespace.clone(), owner.name.clone()))
    }
}

/// A named watch over one resource kind, optionally filtered by labels and by the
/// kind of the owner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventSource {
    name: String,
    kind: String,
    selector: LabelSelector,
    owner_kind: Option<String>,
}

impl EventSource {
    pub fn new(name: impl Into<String>, kind: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: kind.into(),
            selector: LabelSelector::everything(),
            owner_kind: None,
        }
    }

    /// Only objects owned by a primary of `kind` match.
    pub fn owned_by(mut self, kind: impl Into<String>) -> Self {
        self.owner_kind = Some(kind.into());
        self
    }

    pub fn with_selector(mut self, selector: LabelSelector) -> Self {
        self.selector = selector;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> &str {
        &self.kind
    }

    pub fn selector(&self) -> &LabelSelector {
        &self.selector
    }

    pub fn owner_kind(&self) -> Option<&str> {
        self.owner_kind.as_deref()
    }

    pub fn matches(&self, event: &ResourceEvent) -> bool {
        let owner_matches = match &self.owner_kind {
            Some(kind) => event.owner_of_kind(kind).is_some(),
            None => true,
        };
        self.kind == event.kind && self.selector.matches(&event.labels) && owner_matches
    }
}

/// Context handed to dependents when they register their event source.
#[derive(Debug, Clone)]
pub struct EventSourceContext {
    /// Kind of the primary the sources re-enqueue.
    pub primary_kind: &'static str,
}

/// Event sources keyed by their unique name.
#[derive(Debug, Clone, Default)]
pub struct EventSources {
    sources: BTreeMap<String, EventSource>,
}

impl EventSources {
    /// Names a set of event sources, rejecting duplicate names.
    pub fn named(sources: impl IntoIterator<Item = EventSource>) -> Result<Self, FrameworkError> {
        let mut named = BTreeMap::new();
        for source in sources {
            let name = source.name().to_string();
            if named.insert(name.clone(), source).is_some() {
                return Err(FrameworkError::DuplicateEventSource(name));
            }
        }
        Ok(Self { sources: named })
    }

    pub fn get(&self, name: &str) -> Option<&EventSource> {
        self.sources.get(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.sources.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    /// Name of the first source that matches the event.
    pub fn matching(&self, event: &ResourceEvent) -> Option<&str> {
        self.sources
            .values()
            .find(|source| source.matches(event))
            .map(EventSource::name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labels(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn selector_parse_and_match() {
        let selector = LabelSelector::parse("app=solver, role=input").unwrap();
        assert!(selector.matches(&labels(&[("app", "solver"), ("role", "input"), ("x", "y")])));
        assert!(!selector.matches(&labels(&[("app", "solver"), ("role", "output")])));
        assert!(!selector.matches(&labels(&[("app", "solver")])));
        assert_eq!(selector.to_string(), "app=solver,role=input");
    }

    #[test]
    fn blank_selector_matches_everything() {
        let selector = LabelSelector::parse("  ").unwrap();
        assert!(selector.is_empty());
        assert!(selector.matches(&labels(&[])));
    }

    #[test]
    fn selector_rejects_terms_without_value() {
        assert_eq!(
            LabelSelector::parse("app"),
            Err(FrameworkError::InvalidSelector("app".to_string()))
        );
        assert!(LabelSelector::parse("=x").is_err());
    }

    #[test]
    fn duplicate_event_source_names_are_rejected() {
        let result = EventSources::named([
            EventSource::new("queue", "MessageQueue"),
            EventSource::new("queue", "MessageQueue"),
        ]);
        assert_eq!(
            result.unwrap_err(),
            FrameworkError::DuplicateEventSource("queue".to_string())
        );
    }

    #[test]
    fn matching_honours_kind_and_selector() {
        let sources = EventSources::named([
            EventSource::new("queue-input", "MessageQueue")
                .with_selector(LabelSelector::eq("role", "input")),
            EventSource::new("queue-output", "MessageQueue")
                .with_selector(LabelSelector::eq("role", "output")),
        ])
        .unwrap();

        let event = ResourceEvent {
            kind: "MessageQueue".into(),
            object: ObjectRef::new("ns", "q"),
            labels: labels(&[("role", "output")]),
            owner: None,
        };
        assert_eq!(sources.matching(&event), Some("queue-output"));

        let other_kind = ResourceEvent {
            kind: "ConfigMap".into(),
            ..event
        };
        assert_eq!(sources.matching(&other_kind), None);
    }

    #[test]
    fn owned_source_ignores_objects_of_other_owner_kinds() {
        let source = EventSource::new("queue", "MessageQueue").owned_by("Solver");
        let mut event = ResourceEvent {
            kind: "MessageQueue".into(),
            object: ObjectRef::new("ns", "q"),
            labels: BTreeMap::new(),
            owner: Some(OwnerReference {
                kind: "Benchmark".into(),
                name: "s".into(),
            }),
        };
        assert!(!source.matches(&event));
        assert_eq!(event.owner_of_kind("Solver"), None);

        event.owner = Some(OwnerReference {
            kind: "Solver".into(),
            name: "s".into(),
        });
        assert!(source.matches(&event));
        assert_eq!(event.owner_of_kind("Solver"), Some(ObjectRef::new("ns", "s")));
    }
}
