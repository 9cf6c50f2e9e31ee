use serde::Serialize;

/// Whether a voter may cast a new vote in an election right now.
///
/// This is advisory: the vote ledger has the final say when the vote is cast.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Eligibility {
    pub can_vote: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    /// Set when an earlier vote was discarded because its option was removed.
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub previous_vote_invalidated: bool,
}

impl Eligibility {
    pub fn allowed() -> Self {
        Self {
            can_vote: true,
            reason: None,
            previous_vote_invalidated: false,
        }
    }

    pub fn denied(reason: impl Into<String>) -> Self {
        Self {
            can_vote: false,
            reason: Some(reason.into()),
            previous_vote_invalidated: false,
        }
    }

    pub fn after_retraction() -> Self {
        Self {
            can_vote: true,
            reason: Some("Your previous vote was for an option that no longer exists.".to_string()),
            previous_vote_invalidated: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use rocket::serde::json::{json, to_value};

    use super::*;

    #[test]
    fn optional_fields_are_omitted() {
        assert_eq!(
            to_value(Eligibility::allowed()).unwrap(),
            json!({ "canVote": true })
        );
        assert_eq!(
            to_value(Eligibility::after_retraction()).unwrap()["previousVoteInvalidated"],
            json!(true)
        );
    }
}
