use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::model::{common::options::ElectionType, mongodb::Id};

/// An answer to a yes/no proposition.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Choice {
    Yes,
    No,
}

impl Display for Choice {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Yes => write!(f, "yes"),
            Self::No => write!(f, "no"),
        }
    }
}

impl FromStr for Choice {
    type Err = ();

    /// Only the exact lowercase words are accepted.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "yes" => Ok(Self::Yes),
            "no" => Ok(Self::No),
            _ => Err(()),
        }
    }
}

/// A validated ballot payload, as stored in the vote ledger.
///
/// Exactly one payload exists per vote, and its variant always matches the
/// type of the election it was cast in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum Ballot {
    CandidateBased { candidate_id: Id },
    YesNo { choice: Choice },
    Rating { rating_value: f64 },
    ImageBased { selected_option_id: Id },
}

impl Ballot {
    pub fn election_type(&self) -> ElectionType {
        match self {
            Self::CandidateBased { .. } => ElectionType::CandidateBased,
            Self::YesNo { .. } => ElectionType::YesNo,
            Self::Rating { .. } => ElectionType::Rating,
            Self::ImageBased { .. } => ElectionType::ImageBased,
        }
    }
}
