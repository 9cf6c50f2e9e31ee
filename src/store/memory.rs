//! A process-local store with the same keying rules as the MongoDB backend.
//!
//! Used by the test suite and by `storage = "memory"` deployments. All state
//! sits behind one mutex, so each trait call is atomic with respect to every
//! other call, which is what the unique index gives us in MongoDB.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::error::{Error, Result};
use crate::model::{
    common::status::ElectionStatus,
    db::{
        election::{Election, NewElection},
        vote::{BallotCount, NewVote, Vote},
        voter::Voter,
    },
    mongodb::Id,
};

use super::{ElectionStore, LedgerPurge, Stores, VoteLedger, VoterDirectory};

#[derive(Debug, Default)]
struct Inner {
    elections: HashMap<Id, Election>,
    votes: HashMap<Id, Vote>,
    /// `(election_id, voter_id)` to vote ID.
    by_key: HashMap<(Id, Id), Id>,
    voters: HashMap<Id, Voter>,
    voter_updates_fail: bool,
}

/// Shared handle; clones see the same data.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Mutex<Inner>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Trait-object handles over this store.
    pub fn stores(&self) -> Stores {
        Stores::memory(self)
    }

    /// Register a voter account.
    pub fn insert_voter(&self, voter_id: Id) -> Voter {
        let voter = Voter::new(voter_id);
        self.lock().voters.insert(voter_id, voter.clone());
        voter
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        // Every mutation completes before the guard drops, so a poisoned lock
        // still holds consistent data.
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Make every `has_voted` write fail, to exercise best-effort paths.
    #[cfg(test)]
    pub fn fail_voter_updates(&self, fail: bool) {
        self.lock().voter_updates_fail = fail;
    }
}

#[rocket::async_trait]
impl ElectionStore for MemoryStore {
    async fn get(&self, election_id: Id) -> Result<Option<Election>> {
        Ok(self.lock().elections.get(&election_id).cloned())
    }

    async fn insert(&self, election: NewElection) -> Result<Election> {
        let election = Election {
            id: Id::new(),
            election,
        };
        self.lock().elections.insert(election.id, election.clone());
        Ok(election)
    }

    async fn remove_option(&self, election_id: Id, option_id: Id) -> Result<bool> {
        let mut inner = self.lock();
        let election = inner
            .elections
            .get_mut(&election_id)
            .ok_or_else(|| Error::not_found(format!("Election {election_id}")))?;
        if election.status == ElectionStatus::Completed {
            return Err(Error::InvalidElectionState(
                "Cannot remove options from a completed election".to_string(),
            ));
        }
        Ok(election.options.remove_option(option_id))
    }

    async fn delete(&self, election_id: Id) -> Result<bool> {
        Ok(self.lock().elections.remove(&election_id).is_some())
    }
}

#[rocket::async_trait]
impl VoteLedger for MemoryStore {
    async fn cast(&self, vote: NewVote) -> Result<Vote> {
        let mut inner = self.lock();
        let key = (vote.election_id, vote.voter_id);
        if inner.by_key.contains_key(&key) {
            return Err(Error::DuplicateVote(
                "You have already voted in this election".to_string(),
            ));
        }
        let vote = Vote {
            id: Id::new(),
            vote,
        };
        inner.by_key.insert(key, vote.id);
        inner.votes.insert(vote.id, vote.clone());
        Ok(vote)
    }

    async fn find_by_election_and_voter(
        &self,
        election_id: Id,
        voter_id: Id,
    ) -> Result<Option<Vote>> {
        let inner = self.lock();
        Ok(inner
            .by_key
            .get(&(election_id, voter_id))
            .and_then(|vote_id| inner.votes.get(vote_id))
            .cloned())
    }

    async fn delete_vote(&self, vote_id: Id) -> Result<bool> {
        let mut inner = self.lock();
        match inner.votes.remove(&vote_id) {
            Some(vote) => {
                inner.by_key.remove(&(vote.election_id, vote.voter_id));
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete_all_for_election(&self, election_id: Id) -> Result<LedgerPurge> {
        let mut inner = self.lock();
        let doomed = inner
            .votes
            .values()
            .filter(|vote| vote.election_id == election_id)
            .map(|vote| (vote.id, vote.voter_id))
            .collect::<Vec<_>>();

        let mut purge = LedgerPurge::default();
        for (vote_id, voter_id) in doomed {
            inner.votes.remove(&vote_id);
            inner.by_key.remove(&(election_id, voter_id));
            purge.deleted += 1;
            if !purge.voters.contains(&voter_id) {
                purge.voters.push(voter_id);
            }
        }
        Ok(purge)
    }

    async fn votes_for_election(&self, election_id: Id) -> Result<Vec<Vote>> {
        let mut votes = self
            .lock()
            .votes
            .values()
            .filter(|vote| vote.election_id == election_id)
            .cloned()
            .collect::<Vec<_>>();
        votes.sort_by_key(|vote| (vote.created_at, vote.id));
        Ok(votes)
    }

    async fn votes_by_voter(&self, voter_id: Id) -> Result<Vec<Vote>> {
        let mut votes = self
            .lock()
            .votes
            .values()
            .filter(|vote| vote.voter_id == voter_id)
            .cloned()
            .collect::<Vec<_>>();
        votes.sort_by(|a, b| (b.created_at, b.id).cmp(&(a.created_at, a.id)));
        Ok(votes)
    }

    async fn delete_votes(&self, vote_ids: &[Id]) -> Result<u64> {
        let mut inner = self.lock();
        let mut deleted = 0;
        for vote_id in vote_ids {
            if let Some(vote) = inner.votes.remove(vote_id) {
                inner.by_key.remove(&(vote.election_id, vote.voter_id));
                deleted += 1;
            }
        }
        Ok(deleted)
    }

    async fn tally(&self, election_id: Id) -> Result<Vec<BallotCount>> {
        let inner = self.lock();
        // Ballots hold floats, so group by equality rather than hashing.
        let mut counts: Vec<BallotCount> = Vec::new();
        for vote in inner.votes.values() {
            if vote.election_id != election_id {
                continue;
            }
            match counts.iter_mut().find(|count| count.ballot == vote.ballot) {
                Some(count) => count.votes += 1,
                None => counts.push(BallotCount {
                    ballot: vote.ballot.clone(),
                    votes: 1,
                }),
            }
        }
        Ok(counts)
    }
}

#[rocket::async_trait]
impl VoterDirectory for MemoryStore {
    async fn find(&self, voter_id: Id) -> Result<Option<Voter>> {
        Ok(self.lock().voters.get(&voter_id).cloned())
    }

    async fn set_has_voted(&self, voter_id: Id, election_id: Id, voted: bool) -> Result<()> {
        let mut inner = self.lock();
        if inner.voter_updates_fail {
            return Err(Error::Unavailable("Voter directory is unavailable".to_string()));
        }
        // Like an update against a missing document, an unknown voter is a no-op.
        if let Some(voter) = inner.voters.get_mut(&voter_id) {
            voter.has_voted.insert(election_id, voted);
        }
        Ok(())
    }

    async fn clear_has_voted(&self, voter_id: Id, election_id: Id) -> Result<()> {
        let mut inner = self.lock();
        if inner.voter_updates_fail {
            return Err(Error::Unavailable("Voter directory is unavailable".to_string()));
        }
        if let Some(voter) = inner.voters.get_mut(&voter_id) {
            voter.has_voted.remove(&election_id);
        }
        Ok(())
    }
}
