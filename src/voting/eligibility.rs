//! Eligibility checks and the self-healing retraction of stale votes.

use chrono::{DateTime, Utc};
use log::{info, warn};

use crate::error::{Error, Result};
use crate::model::{
    api::eligibility::Eligibility,
    common::{ballot::Ballot, options::ElectionOptions},
    db::{election::Election, vote::Vote},
    mongodb::Id,
};
use crate::store::Stores;

use super::validator::ensure_open;

/// May `voter_id` cast a new vote in `election_id` at `now`?
///
/// If the voter's earlier vote points at an image option that has since been
/// removed, that vote is retracted here and the voter may vote again.
pub async fn check_eligibility(
    stores: &Stores,
    election_id: Id,
    voter_id: Id,
    now: DateTime<Utc>,
) -> Result<Eligibility> {
    let election = load_election(stores, election_id).await?;
    if let Err(e) = ensure_open(&election, now) {
        return Ok(Eligibility::denied(e.to_string()));
    }

    let Some(existing) = stores
        .ledger
        .find_by_election_and_voter(election_id, voter_id)
        .await?
    else {
        return Ok(Eligibility::allowed());
    };

    if is_stale(&election, &existing) {
        retract(stores, &existing).await?;
        return Ok(Eligibility::after_retraction());
    }
    Ok(Eligibility::denied("You have already voted in this election."))
}

pub(super) async fn load_election(stores: &Stores, election_id: Id) -> Result<Election> {
    stores
        .elections
        .get(election_id)
        .await?
        .ok_or_else(|| Error::not_found(format!("Election with id {election_id}")))
}

/// Does this vote reference an option the election no longer has?
///
/// Only image-based elections retract; a removed candidate keeps its votes.
pub(super) fn is_stale(election: &Election, vote: &Vote) -> bool {
    match (&election.options, &vote.ballot) {
        (ElectionOptions::ImageBased { .. }, Ballot::ImageBased { selected_option_id }) => {
            election.options.image(*selected_option_id).is_none()
        }
        _ => false,
    }
}

/// Delete a stale vote and clear the voter's `has_voted` entry.
///
/// Returns true iff this call removed the vote. When a concurrent request got
/// there first, the entry is left to that request.
pub(super) async fn retract(stores: &Stores, vote: &Vote) -> Result<bool> {
    if !stores.ledger.delete_vote(vote.id).await? {
        info!(
            "Stale vote {} in election {} was already retracted",
            vote.id, vote.election_id
        );
        return Ok(false);
    }
    info!(
        "Retracted vote {} of voter {} in election {}: its option no longer exists",
        vote.id, vote.voter_id, vote.election_id
    );
    // A concurrent cast may set the entry before this clears it. Casts that
    // lose to it re-mark the voter.
    if let Err(e) = stores
        .voters
        .clear_has_voted(vote.voter_id, vote.election_id)
        .await
    {
        warn!(
            "Failed to clear has_voted for voter {} in election {}: {e}",
            vote.voter_id, vote.election_id
        );
    }
    Ok(true)
}
