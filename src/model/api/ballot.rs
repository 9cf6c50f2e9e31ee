use rocket::serde::json::Value;
use serde::{Deserialize, Serialize};

use crate::model::{
    api::id::ApiId,
    common::ballot::{Ballot, Choice},
};

/// A ballot that the voter wishes to cast, as submitted.
///
/// Every field is optional because which one is required depends on the
/// election type. The validator turns this into a [`Ballot`], rejecting
/// missing, malformed or foreign fields. Values are kept as raw JSON so that a
/// value of the wrong JSON type is a ballot error rather than a parse failure.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BallotSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub candidate_id: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub choice: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rating_value: Option<Value>,
    #[serde(
        default,
        alias = "selectedImageId",
        skip_serializing_if = "Option::is_none"
    )]
    pub selected_option_id: Option<Value>,
}

impl BallotSpec {
    /// The JSON names of the populated fields.
    pub fn populated_fields(&self) -> Vec<&'static str> {
        let mut fields = Vec::new();
        if self.candidate_id.is_some() {
            fields.push("candidateId");
        }
        if self.choice.is_some() {
            fields.push("choice");
        }
        if self.rating_value.is_some() {
            fields.push("ratingValue");
        }
        if self.selected_option_id.is_some() {
            fields.push("selectedOptionId");
        }
        fields
    }
}

/// A stored ballot, as reported to API callers.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum BallotDesc {
    #[serde(rename_all = "camelCase")]
    CandidateBased { candidate_id: ApiId },
    YesNo { choice: Choice },
    #[serde(rename_all = "camelCase")]
    Rating { rating_value: f64 },
    #[serde(rename_all = "camelCase")]
    ImageBased { selected_option_id: ApiId },
}

impl From<Ballot> for BallotDesc {
    fn from(ballot: Ballot) -> Self {
        match ballot {
            Ballot::CandidateBased { candidate_id } => Self::CandidateBased {
                candidate_id: candidate_id.into(),
            },
            Ballot::YesNo { choice } => Self::YesNo { choice },
            Ballot::Rating { rating_value } => Self::Rating { rating_value },
            Ballot::ImageBased { selected_option_id } => Self::ImageBased {
                selected_option_id: selected_option_id.into(),
            },
        }
    }
}
