use log::{info, warn};

use crate::error::Result;
use crate::model::{api::vote::ElectionDeletion, mongodb::Id};
use crate::store::{LedgerPurge, Stores};

use super::eligibility::load_election;

/// Delete an election together with all of its votes.
///
/// Votes go first, then the election, then any vote that slipped in between
/// is swept up, so no vote outlives its election. Clearing voters'
/// `has_voted` entries is best-effort.
pub async fn delete_election(stores: &Stores, election_id: Id) -> Result<ElectionDeletion> {
    load_election(stores, election_id).await?;

    let purge = stores.ledger.delete_all_for_election(election_id).await?;
    clear_has_voted(stores, election_id, &purge).await;

    stores.elections.delete(election_id).await?;

    let sweep = stores.ledger.delete_all_for_election(election_id).await?;
    if sweep.deleted > 0 {
        warn!(
            "Swept {} vote(s) cast while election {election_id} was being deleted",
            sweep.deleted
        );
        clear_has_voted(stores, election_id, &sweep).await;
    }

    let late_voters = sweep
        .voters
        .iter()
        .filter(|voter| !purge.voters.contains(voter))
        .count();
    let deletion = ElectionDeletion {
        deleted_votes: purge.deleted + sweep.deleted,
        affected_voters: purge.voters.len() + late_voters,
    };
    info!(
        "Deleted election {election_id} with {} vote(s) from {} voter(s)",
        deletion.deleted_votes, deletion.affected_voters
    );
    Ok(deletion)
}

async fn clear_has_voted(stores: &Stores, election_id: Id, purge: &LedgerPurge) {
    let mut failures = 0;
    for voter_id in &purge.voters {
        if let Err(e) = stores.voters.clear_has_voted(*voter_id, election_id).await {
            warn!("Failed to clear has_voted for voter {voter_id} in election {election_id}: {e}");
            failures += 1;
        }
    }
    if failures > 0 {
        warn!(
            "{failures} of {} has_voted entries for election {election_id} were left behind",
            purge.voters.len()
        );
    }
}
