//! Auth statuses, control flags, and message policies

use serde::{Deserialize, Serialize};

/// Outcome reported by a single auth module invocation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthStatus {
    /// Authentication succeeded and processing may continue
    Success,
    /// Authentication failed
    Failure,
    /// Processing is complete and a success response was produced
    SendSuccess,
    /// Processing is complete and a failure response was produced
    SendFailure,
    /// More round trips are needed (e.g. a redirect workflow)
    SendContinue,
}

/// PAM-style control flag governing how one module's outcome folds into the
/// combined chain result
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ControlFlag {
    /// Must succeed; failure decides the overall result but later modules
    /// still run
    Required,
    /// Must succeed; failure stops the chain immediately
    Requisite,
    /// Success stops the chain immediately with that success
    Sufficient,
    /// Contributes a success only when nothing else decided the result
    Optional,
}

/// Direction of a message as declared by a module or required by a policy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageType {
    /// Inbound request message
    Request,
    /// Outbound response message
    Response,
}

/// Policy handed to a module at initialization
///
/// Modules must declare support for every message type the policy requires;
/// the chain builder rejects the configuration otherwise.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessagePolicy {
    /// Message types the module will be invoked with
    pub required_types: Vec<MessageType>,
    /// Whether authentication is mandatory for the protected resource
    pub mandatory: bool,
}

impl MessagePolicy {
    /// Policy covering inbound requests
    pub fn request(mandatory: bool) -> Self {
        Self {
            required_types: vec![MessageType::Request],
            mandatory,
        }
    }

    /// Policy covering outbound responses
    pub fn response(mandatory: bool) -> Self {
        Self {
            required_types: vec![MessageType::Response],
            mandatory,
        }
    }
}

/// Caller identity established by a module chain
///
/// Carries the optional principal name and group memberships back to the
/// host runtime alongside the combined status.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Subject {
    /// Authenticated caller principal, if any
    pub principal: Option<String>,
    /// Groups the caller belongs to
    pub groups: Vec<String>,
}

impl Subject {
    /// Create an empty subject
    pub fn new() -> Self {
        Self::default()
    }

    /// Reset the subject to its unauthenticated state
    pub fn clear(&mut self) {
        self.principal = None;
        self.groups.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_control_flag_config_spelling() {
        let flag: ControlFlag = serde_json::from_str("\"requisite\"").unwrap();
        assert_eq!(flag, ControlFlag::Requisite);
        assert_eq!(serde_json::to_string(&ControlFlag::Sufficient).unwrap(), "\"sufficient\"");
    }

    #[test]
    fn test_subject_clear() {
        let mut subject = Subject {
            principal: Some("alice".into()),
            groups: vec!["admin".into()],
        };
        subject.clear();
        assert_eq!(subject, Subject::new());
    }
}
