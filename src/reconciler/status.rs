//! Renders the status written back at the end of a successful pass.

use super::ReconcileError;
use crate::model::{MessageQueue, SolverStatus};

/// Ready with both queue names when the verdict holds, Unknown otherwise.
///
/// A positive verdict without both queues is a contract violation rather than a
/// half-filled Ready status.
pub fn render(
    generation: i64,
    ready: bool,
    input: Option<&MessageQueue>,
    output: Option<&MessageQueue>,
) -> Result<SolverStatus, ReconcileError> {
    if !ready {
        return Ok(SolverStatus::unknown(generation));
    }
    match (input, output) {
        (Some(input), Some(output)) => Ok(SolverStatus::ready(
            generation,
            input.queue_name.clone(),
            output.queue_name.clone(),
        )),
        (input, output) => Err(ReconcileError::ContractViolation(format!(
            "ready verdict without both queues (input present: {}, output present: {})",
            input.is_some(),
            output.is_some()
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::MessageAddress;
    use operator_framework::ObjectMeta;

    fn queue(name: &str, address: MessageAddress) -> MessageQueue {
        MessageQueue {
            metadata: ObjectMeta::new("default", name),
            address,
            queue_name: name.to_string(),
        }
    }

    #[test]
    fn ready_carries_queue_names_and_generation() {
        let input = queue("q-in", MessageAddress::Input);
        let output = queue("q-out", MessageAddress::Output);
        assert_eq!(
            render(4, true, Some(&input), Some(&output)),
            Ok(SolverStatus::ready(4, "q-in", "q-out"))
        );
    }

    #[test]
    fn negative_verdict_is_unknown_even_with_queues() {
        let input = queue("q-in", MessageAddress::Input);
        assert_eq!(
            render(2, false, Some(&input), None),
            Ok(SolverStatus::unknown(2))
        );
    }

    #[test]
    fn ready_without_queues_is_a_contract_violation() {
        let input = queue("q-in", MessageAddress::Input);
        assert!(matches!(
            render(1, true, Some(&input), None),
            Err(ReconcileError::ContractViolation(_))
        ));
    }
}
