use std::collections::HashMap;
use std::sync::Arc;

use log::{error, info};
use rocket::tokio::{self, task::JoinHandle};

use crate::error::Result;
use crate::model::{api::vote::VoteHistoryEntry, db::election::Election, mongodb::Id};
use crate::store::Stores;

/// A voter's votes, newest first, with any orphan cleanup still running.
pub struct VotingHistory {
    pub entries: Vec<VoteHistoryEntry>,
    /// Deletes votes whose election no longer exists. Nobody needs to wait for it.
    pub cleanup: Option<JoinHandle<()>>,
}

/// Everything `voter_id` has voted in.
///
/// Votes whose election has disappeared are left out of the history and
/// deleted in the background.
pub async fn voting_history(stores: &Stores, voter_id: Id) -> Result<VotingHistory> {
    let votes = stores.ledger.votes_by_voter(voter_id).await?;

    let mut elections: HashMap<Id, Option<Election>> = HashMap::new();
    let mut entries = Vec::with_capacity(votes.len());
    let mut orphans = Vec::new();
    for vote in votes {
        if !elections.contains_key(&vote.election_id) {
            let election = stores.elections.get(vote.election_id).await?;
            elections.insert(vote.election_id, election);
        }
        match elections.get(&vote.election_id) {
            Some(Some(election)) => entries.push(VoteHistoryEntry::new(vote, election)),
            _ => orphans.push(vote.id),
        }
    }

    let cleanup = (!orphans.is_empty()).then(|| {
        info!(
            "Found {} vote(s) of voter {voter_id} for deleted elections, cleaning up",
            orphans.len()
        );
        let ledger = Arc::clone(&stores.ledger);
        tokio::spawn(async move {
            match ledger.delete_votes(&orphans).await {
                Ok(deleted) => info!("Cleaned up {deleted} vote(s) for deleted elections"),
                Err(e) => error!("Failed to clean up votes for deleted elections: {e}"),
            }
        })
    });

    Ok(VotingHistory { entries, cleanup })
}
