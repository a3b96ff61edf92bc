use serde::{Deserialize, Serialize};

/// One message in the assistant chat transcript
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "role", rename_all = "snake_case")]
pub enum ChatTurn {
    /// Question typed by the traveler
    Traveler { content: String },
    /// Reply produced by the model
    Assistant { content: String },
}

impl ChatTurn {
    pub fn content(&self) -> &str {
        match self {
            ChatTurn::Traveler { content } | ChatTurn::Assistant { content } => content,
        }
    }

    /// Get a human-readable description of the turn
    pub fn describe(&self) -> String {
        match self {
            ChatTurn::Traveler { content } => format!("Traveler: {}", content),
            ChatTurn::Assistant { content } => format!("Assistant: {}", content),
        }
    }
}
