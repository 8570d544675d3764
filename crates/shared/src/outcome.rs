//! Delivery outcomes for the notification fan-out.

use serde::{Deserialize, Serialize};

/// Why a mention produced no notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SkipReason {
    /// The mention's member id no longer exists in the roster.
    NotInRoster,
    /// The member has no email on file.
    NoEmail,
    /// Another mention in the same message already covered this email.
    DuplicateEmail,
}

impl SkipReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            SkipReason::NotInRoster => "not in roster",
            SkipReason::NoEmail => "no email",
            SkipReason::DuplicateEmail => "duplicate email",
        }
    }
}

/// Result of one attempted notification. Collected for observability only;
/// failures never retry and never block the send flow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum DeliveryOutcome {
    Sent {
        member: String,
        email: String,
    },
    Skipped {
        member: String,
        reason: SkipReason,
    },
    Failed {
        member: String,
        email: String,
        error: String,
    },
}

impl DeliveryOutcome {
    /// Member name the outcome refers to.
    pub fn member(&self) -> &str {
        match self {
            DeliveryOutcome::Sent { member, .. } => member,
            DeliveryOutcome::Skipped { member, .. } => member,
            DeliveryOutcome::Failed { member, .. } => member,
        }
    }

    pub fn is_sent(&self) -> bool {
        matches!(self, DeliveryOutcome::Sent { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outcome_member_accessor() {
        let outcome = DeliveryOutcome::Skipped {
            member: "Bob".into(),
            reason: SkipReason::NoEmail,
        };
        assert_eq!(outcome.member(), "Bob");
        assert!(!outcome.is_sent());
    }

    #[test]
    fn test_skip_reason_labels() {
        assert_eq!(SkipReason::DuplicateEmail.as_str(), "duplicate email");
    }
}
