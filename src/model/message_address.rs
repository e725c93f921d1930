use serde::{Deserialize, Serialize};
use std::fmt::{self, Display};

/// Label carried by every message queue object, holding the queue's role.
pub const MESSAGE_ADDRESS_LABEL: &str = "solver.operator/message-address";

/// Role of a message queue owned by a solver.
///
/// Both queues are the same resource type, so the role is what tells the two
/// instances apart: it is part of the queue's name and is carried as the
/// [`MESSAGE_ADDRESS_LABEL`] label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageAddress {
    Input,
    Output,
}

impl MessageAddress {
    pub const ALL: [MessageAddress; 2] = [MessageAddress::Input, MessageAddress::Output];

    pub fn name(self) -> &'static str {
        match self {
            MessageAddress::Input => "input",
            MessageAddress::Output => "output",
        }
    }

    /// Selector expression matching queues of this role.
    pub fn selector(self) -> String {
        format!("{MESSAGE_ADDRESS_LABEL}={}", self.name())
    }
}

impl Display for MessageAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
