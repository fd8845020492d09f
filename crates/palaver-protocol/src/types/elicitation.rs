//! User input elicitation types.
//!
//! A tool may suspend mid-execution to request structured input from the end
//! user via the client. The user's answer is one of a closed set of actions;
//! declining or cancelling is a valid outcome, not an error, and every tool
//! using elicitation must define a fallback for it.

use serde::{Deserialize, Serialize};

/// Action taken by the user on an elicitation request.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "camelCase")]
pub enum ElicitationAction {
    /// User submitted an answer.
    Accepted,
    /// User explicitly declined to answer.
    Declined,
    /// User dismissed the request, or the client timed it out.
    Cancelled,
}

/// Shape of the answer a tool expects from an elicitation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ResponseShape {
    /// Free-form text.
    Text,
    /// One of a fixed list of options, presented in order.
    Choice {
        /// Options the user may pick from.
        options: Vec<String>,
    },
    /// Yes/no confirmation.
    Confirm,
}

/// A tool's request for structured user input.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ElicitationRequest {
    /// Human-readable message shown to the user.
    pub message: String,
    /// Expected shape of the answer.
    #[serde(rename = "expectedShape")]
    pub expected: ResponseShape,
}

impl ElicitationRequest {
    /// Request free-form text input.
    #[must_use]
    pub fn text(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            expected: ResponseShape::Text,
        }
    }

    /// Request a pick from a list of options.
    #[must_use]
    pub fn choice(message: impl Into<String>, options: Vec<String>) -> Self {
        Self {
            message: message.into(),
            expected: ResponseShape::Choice { options },
        }
    }

    /// Request a yes/no confirmation.
    #[must_use]
    pub fn confirm(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            expected: ResponseShape::Confirm,
        }
    }
}

/// The user's answer to an [`ElicitationRequest`].
///
/// Construct through [`accepted`](Self::accepted), [`declined`](Self::declined)
/// or [`cancelled`](Self::cancelled); the payload is present exactly when the
/// action is [`ElicitationAction::Accepted`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ElicitationResponse {
    /// Outcome of the elicitation.
    pub action: ElicitationAction,
    /// User input, shape-matched to the request. Present iff accepted.
    #[serde(skip_serializing_if = "Option::is_none")]
    content: Option<serde_json::Value>,
}

impl ElicitationResponse {
    /// The user answered with the given payload.
    #[must_use]
    pub fn accepted(content: serde_json::Value) -> Self {
        Self {
            action: ElicitationAction::Accepted,
            content: Some(content),
        }
    }

    /// The user explicitly declined.
    #[must_use]
    pub const fn declined() -> Self {
        Self {
            action: ElicitationAction::Declined,
            content: None,
        }
    }

    /// The user dismissed the request, or the client timed it out.
    #[must_use]
    pub const fn cancelled() -> Self {
        Self {
            action: ElicitationAction::Cancelled,
            content: None,
        }
    }

    /// Whether the user answered.
    #[must_use]
    pub const fn is_accepted(&self) -> bool {
        matches!(self.action, ElicitationAction::Accepted)
    }

    /// The payload, if the user answered.
    #[must_use]
    pub fn content(&self) -> Option<&serde_json::Value> {
        // The constructors keep content and action in lockstep; a
        // deserialized response may not, so gate on the action here too.
        match self.action {
            ElicitationAction::Accepted => self.content.as_ref(),
            _ => None,
        }
    }

    /// The payload as a string, for `ResponseShape::Text` and
    /// `ResponseShape::Choice` answers.
    #[must_use]
    pub fn text(&self) -> Option<&str> {
        self.content().and_then(serde_json::Value::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn payload_present_only_when_accepted() {
        let yes = ElicitationResponse::accepted(serde_json::json!("2"));
        assert!(yes.is_accepted());
        assert_eq!(yes.text(), Some("2"));

        assert!(ElicitationResponse::declined().content().is_none());
        assert!(ElicitationResponse::cancelled().content().is_none());
    }

    #[test]
    fn deserialized_payload_is_gated_on_action() {
        // A misbehaving client could send content alongside a decline; the
        // accessor must not surface it.
        let raw = r#"{"action":"declined","content":"sneaky"}"#;
        let response: ElicitationResponse = serde_json::from_str(raw).unwrap();
        assert!(response.content().is_none());
    }

    #[test]
    fn actions_use_camel_case_on_the_wire() {
        let json = serde_json::to_value(ElicitationResponse::cancelled()).unwrap();
        assert_eq!(json["action"], "cancelled");
    }

    #[test]
    fn choice_shape_carries_options() {
        let request = ElicitationRequest::choice(
            "Which article?",
            vec!["Python".into(), "C++".into()],
        );
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["expectedShape"]["type"], "choice");
        assert_eq!(json["expectedShape"]["options"][1], "C++");
    }
}
