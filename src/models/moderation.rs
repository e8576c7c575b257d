//! Moderation status shared by user-submitted content

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Tri-state review label.
///
/// Content starts `Pending`; an admin action moves it to `Approved` or
/// `Rejected`. There is no path back to `Pending`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ModerationStatus {
    #[default]
    Pending,
    Approved,
    Rejected,
}

impl ModerationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ModerationStatus::Pending => "pending",
            ModerationStatus::Approved => "approved",
            ModerationStatus::Rejected => "rejected",
        }
    }

    /// Only pending content may be moved, and never back to pending.
    pub fn can_transition_to(&self, target: ModerationStatus) -> bool {
        *self == ModerationStatus::Pending && target != ModerationStatus::Pending
    }
}

impl fmt::Display for ModerationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ModerationStatus {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pending" => Ok(ModerationStatus::Pending),
            "approved" => Ok(ModerationStatus::Approved),
            "rejected" => Ok(ModerationStatus::Rejected),
            _ => Err(anyhow::anyhow!("Invalid moderation status: {}", s)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_transitions_are_one_directional() {
        use ModerationStatus::*;
        assert!(Pending.can_transition_to(Approved));
        assert!(Pending.can_transition_to(Rejected));
        assert!(!Pending.can_transition_to(Pending));
        assert!(!Approved.can_transition_to(Rejected));
        assert!(!Rejected.can_transition_to(Approved));
    }

    #[test]
    fn test_default_is_pending() {
        assert_eq!(ModerationStatus::default(), ModerationStatus::Pending);
    }

    proptest! {
        #[test]
        fn prop_status_parse_is_case_insensitive(idx in 0usize..3, upper in any::<bool>()) {
            let status = [
                ModerationStatus::Pending,
                ModerationStatus::Approved,
                ModerationStatus::Rejected,
            ][idx];
            let text = if upper { status.to_string().to_uppercase() } else { status.to_string() };
            prop_assert_eq!(text.parse::<ModerationStatus>().unwrap(), status);
        }

        #[test]
        fn prop_unknown_status_rejected(text in "[a-z]{1,12}") {
            prop_assume!(!["pending", "approved", "rejected"].contains(&text.as_str()));
            prop_assert!(text.parse::<ModerationStatus>().is_err());
        }
    }
}
