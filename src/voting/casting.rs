//! Casting a vote, including replacing a vote that went stale.

use chrono::{DateTime, Utc};
use log::{info, warn};

use crate::error::{Error, Result};
use crate::model::{
    api::ballot::BallotSpec,
    db::vote::{NewVote, Vote},
    mongodb::Id,
};
use crate::store::Stores;

use super::eligibility::{is_stale, load_election, retract};
use super::validator::{ensure_open, validate_ballot};

/// Cast a vote for `voter_id` in `election_id`.
///
/// The checks here only give early, friendly errors. The ledger's uniqueness
/// on `(election, voter)` is what actually prevents double voting.
pub async fn cast_vote(
    stores: &Stores,
    election_id: Id,
    voter_id: Id,
    spec: &BallotSpec,
    now: DateTime<Utc>,
) -> Result<Vote> {
    let election = load_election(stores, election_id).await?;
    ensure_open(&election, now)?;

    let existing = stores
        .ledger
        .find_by_election_and_voter(election_id, voter_id)
        .await?;
    let stale = match existing {
        Some(vote) if is_stale(&election, &vote) => Some(vote),
        Some(_) => {
            return Err(Error::DuplicateVote(
                "You have already voted in this election".to_string(),
            ))
        }
        None => None,
    };

    // Validate before touching the ledger, so a bad ballot retracts nothing.
    let ballot = validate_ballot(&election, spec, now)?;

    let retracted = match stale {
        Some(vote) => {
            retract(stores, &vote).await?;
            true
        }
        None => false,
    };

    let vote = match stores
        .ledger
        .cast(NewVote::new(election_id, voter_id, ballot, now))
        .await
    {
        Ok(vote) => vote,
        Err(Error::DuplicateVote(_)) if retracted => {
            // Our retraction cleared `has_voted` after the winner had set it.
            mark_has_voted(stores, voter_id, election_id).await;
            return Err(Error::ConcurrentRequest(
                "Another request replaced your previous vote at the same time. Please try again."
                    .to_string(),
            ));
        }
        Err(e) => return Err(e),
    };
    info!(
        "Voter {voter_id} cast vote {} in election {election_id}",
        vote.id
    );

    mark_has_voted(stores, voter_id, election_id).await;
    Ok(vote)
}

async fn mark_has_voted(stores: &Stores, voter_id: Id, election_id: Id) {
    if let Err(e) = stores
        .voters
        .set_has_voted(voter_id, election_id, true)
        .await
    {
        warn!("Failed to set has_voted for voter {voter_id} in election {election_id}: {e}");
    }
}
