use operator_framework::{ObjectMeta, PrimaryResource};
use serde::{Deserialize, Serialize};

/// The user-declared solver: desired state for a solver deployment and its queues.
///
/// # Operator Framework
/// This struct implements [`PrimaryResource`], so it can be driven by a
/// [`Controller`](operator_framework::Controller). Its `status` is written only by the
/// controller's status writer, as a full replacement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Solver {
    pub metadata: ObjectMeta,
    pub spec: SolverSpec,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<SolverStatus>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SolverSpec {
    pub solver_image: String,
    pub amq_broker: AmqBroker,
    #[serde(default)]
    pub scaling: Scaling,
}

/// Connection details of the message broker hosting the solver's queues.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AmqBroker {
    pub host: String,
    pub port: u16,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username_secret_ref: Option<SecretKeyRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password_secret_ref: Option<SecretKeyRef>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecretKeyRef {
    pub name: String,
    pub key: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Scaling {
    /// Replicas follow the input queue depth through an autoscaler.
    #[serde(default)]
    pub dynamic: bool,
    /// Fixed replica count, or the minimum when scaling is dynamic.
    #[serde(default = "Scaling::default_replicas")]
    pub replicas: u32,
    #[serde(default = "Scaling::default_max_replicas")]
    pub max_replicas: u32,
}

impl Scaling {
    fn default_replicas() -> u32 {
        1
    }

    fn default_max_replicas() -> u32 {
        10
    }
}

impl Default for Scaling {
    fn default() -> Self {
        Self {
            dynamic: false,
            replicas: Self::default_replicas(),
            max_replicas: Self::default_max_replicas(),
        }
    }
}

/// Observable outcome of the last reconcile, stamped with the generation it reflects.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state")]
pub enum SolverStatus {
    #[serde(rename_all = "camelCase")]
    Ready {
        generation: i64,
        input_message_address: String,
        output_message_address: String,
    },
    #[serde(rename_all = "camelCase")]
    Unknown { generation: i64 },
    #[serde(rename_all = "camelCase")]
    Error { generation: i64, error_message: String },
}

impl SolverStatus {
    pub fn ready(
        generation: i64,
        input_message_address: impl Into<String>,
        output_message_address: impl Into<String>,
    ) -> Self {
        SolverStatus::Ready {
            generation,
            input_message_address: input_message_address.into(),
            output_message_address: output_message_address.into(),
        }
    }

    pub fn unknown(generation: i64) -> Self {
        SolverStatus::Unknown { generation }
    }

    pub fn error(generation: i64, error_message: impl Into<String>) -> Self {
        SolverStatus::Error {
            generation,
            error_message: error_message.into(),
        }
    }

    pub fn generation(&self) -> i64 {
        match self {
            SolverStatus::Ready { generation, .. }
            | SolverStatus::Unknown { generation }
            | SolverStatus::Error { generation, .. } => *generation,
        }
    }

    pub fn is_ready(&self) -> bool {
        matches!(self, SolverStatus::Ready { .. })
    }
}

impl Solver {
    pub fn new(metadata: ObjectMeta, spec: SolverSpec) -> Self {
        Self {
            metadata,
            spec,
            status: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.metadata.name
    }

    pub fn namespace(&self) -> &str {
        &self.metadata.namespace
    }

    pub fn is_dynamic(&self) -> bool {
        self.spec.scaling.dynamic
    }

    /// Metadata for an object owned by this solver.
    pub fn owned_meta(&self, name: impl Into<String>) -> ObjectMeta {
        ObjectMeta::new(self.metadata.namespace.clone(), name)
            .with_label("app", self.metadata.name.clone())
            .with_owner(Self::KIND, self.metadata.name.clone())
    }
}

impl PrimaryResource for Solver {
    const KIND: &'static str = "Solver";
    type Status = SolverStatus;

    fn metadata(&self) -> &ObjectMeta {
        &self.metadata
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_serializes_with_state_tag_and_camel_case_fields() {
        let ready = SolverStatus::ready(1, "q-in", "q-out");
        assert_eq!(
            serde_json::to_string(&ready).unwrap(),
            r#"{"state":"Ready","generation":1,"inputMessageAddress":"q-in","outputMessageAddress":"q-out"}"#
        );

        let error = SolverStatus::error(3, "boom");
        assert_eq!(
            serde_json::to_string(&error).unwrap(),
            r#"{"state":"Error","generation":3,"errorMessage":"boom"}"#
        );
    }

    #[test]
    fn generation_is_read_from_every_shape() {
        assert_eq!(SolverStatus::unknown(2).generation(), 2);
        assert_eq!(SolverStatus::error(5, "x").generation(), 5);
        assert!(!SolverStatus::unknown(2).is_ready());
    }

    #[test]
    fn spec_deserializes_with_scaling_defaults() {
        let spec: SolverSpec = serde_json::from_str(
            r#"{"solverImage":"solver:1","amqBroker":{"host":"amq","port":5672}}"#,
        )
        .unwrap();
        assert!(!spec.scaling.dynamic);
        assert_eq!(spec.scaling.replicas, 1);
        assert_eq!(spec.scaling.max_replicas, 10);
    }
}
