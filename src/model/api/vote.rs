use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::model::{
    api::{ballot::BallotDesc, id::ApiId},
    common::{options::ElectionType, status::ElectionStatus},
    db::{election::Election, vote::Vote},
};

/// A cast vote, as returned by `castVote` and the admin listing.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VoteDesc {
    pub id: ApiId,
    pub election_id: ApiId,
    pub voter_id: ApiId,
    pub ballot: BallotDesc,
    pub created_at: DateTime<Utc>,
}

impl From<Vote> for VoteDesc {
    fn from(vote: Vote) -> Self {
        Self {
            id: vote.id.into(),
            election_id: vote.vote.election_id.into(),
            voter_id: vote.vote.voter_id.into(),
            ballot: vote.vote.ballot.into(),
            created_at: vote.vote.created_at,
        }
    }
}

/// Whether the caller has a vote recorded in an election.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VoteStatus {
    pub has_voted: bool,
}

/// The parts of an election shown next to a vote in the voter's history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ElectionSummary {
    pub id: ApiId,
    pub title: String,
    pub description: String,
    pub status: ElectionStatus,
    pub election_type: ElectionType,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
}

impl From<&Election> for ElectionSummary {
    fn from(election: &Election) -> Self {
        Self {
            id: election.id.into(),
            title: election.title.clone(),
            description: election.description.clone(),
            status: election.status,
            election_type: election.election_type(),
            start_date: election.start_date,
            end_date: election.end_date,
        }
    }
}

/// One entry of the voter's voting history.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VoteHistoryEntry {
    pub vote_id: ApiId,
    pub voted_at: DateTime<Utc>,
    pub election: ElectionSummary,
    pub ballot: BallotDesc,
}

impl VoteHistoryEntry {
    pub fn new(vote: Vote, election: &Election) -> Self {
        Self {
            vote_id: vote.id.into(),
            voted_at: vote.vote.created_at,
            election: election.into(),
            ballot: vote.vote.ballot.into(),
        }
    }
}

/// Outcome of deleting an election and its votes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ElectionDeletion {
    pub deleted_votes: u64,
    pub affected_voters: usize,
}
