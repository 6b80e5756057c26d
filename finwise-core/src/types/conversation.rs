use serde::{Deserialize, Serialize};

/// Who authored a conversation turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    /// Speaker name used when the conversation is replayed inside a prompt.
    pub fn prompt_name(&self) -> &'static str {
        match self {
            Role::User => "User",
            Role::Assistant => "Advisor",
        }
    }
}

/// One prior exchange in the conversation. History is an ordered sequence
/// of these, oldest first, and is only ever appended to by the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationTurn {
    pub role: Role,
    pub text: String,
}

impl ConversationTurn {
    pub fn new(role: Role, text: impl Into<String>) -> Self {
        Self {
            role,
            text: text.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&Role::User).unwrap(), "\"user\"");
        assert_eq!(
            serde_json::to_string(&Role::Assistant).unwrap(),
            "\"assistant\""
        );
    }

    #[test]
    fn test_turn_construction() {
        let turn = ConversationTurn::new(Role::User, "What is a SIP?");
        assert_eq!(turn.role, Role::User);
        assert_eq!(turn.text, "What is a SIP?");
    }
}
