use std::ops::{Deref, DerefMut};

use chrono::{DateTime, Utc};
use mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime;
use serde::{Deserialize, Serialize};

use crate::model::{common::ballot::Ballot, mongodb::Id};

/// Core vote data, as stored in the database.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VoteCore {
    /// Foreign key election ID.
    pub election_id: Id,
    /// Foreign key voter (user) ID. Unique together with `election_id`.
    pub voter_id: Id,
    /// The validated ballot.
    pub ballot: Ballot,
    /// When the vote was cast.
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
}

impl VoteCore {
    pub fn new(election_id: Id, voter_id: Id, ballot: Ballot, created_at: DateTime<Utc>) -> Self {
        Self {
            election_id,
            voter_id,
            ballot,
            created_at,
        }
    }
}

/// A vote without an ID.
pub type NewVote = VoteCore;

/// A vote from the database, with its unique ID.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Vote {
    #[serde(rename = "_id")]
    pub id: Id,
    #[serde(flatten)]
    pub vote: VoteCore,
}

impl Deref for Vote {
    type Target = VoteCore;

    fn deref(&self) -> &Self::Target {
        &self.vote
    }
}

impl DerefMut for Vote {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.vote
    }
}

/// The number of votes sharing an identical ballot, as produced by grouping
/// the ledger on the `ballot` field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BallotCount {
    #[serde(rename = "_id")]
    pub ballot: Ballot,
    pub votes: u64,
}
