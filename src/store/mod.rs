//! Storage seams for the voting engine.
//!
//! Each collaborator is a trait so the engine can run against MongoDB in
//! production and against [`memory::MemoryStore`] in tests and local demos.
//! Every implementation must enforce one vote per `(election, voter)` at the
//! storage layer: [`VoteLedger::cast`] is the only authoritative guard
//! against double voting.

use std::sync::Arc;

use mongodb::Database;

use crate::error::Result;
use crate::model::{
    db::{
        election::{Election, NewElection},
        vote::{BallotCount, NewVote, Vote},
        voter::Voter,
    },
    mongodb::Id,
};

pub mod memory;
pub mod mongo;

/// Election records. Option mutation belongs to the admin workflow; the
/// engine only reads.
#[rocket::async_trait]
pub trait ElectionStore: Send + Sync {
    async fn get(&self, election_id: Id) -> Result<Option<Election>>;

    async fn insert(&self, election: NewElection) -> Result<Election>;

    /// Atomically remove a candidate or image option. Votes referencing it
    /// are left untouched. Fails for completed elections.
    async fn remove_option(&self, election_id: Id, option_id: Id) -> Result<bool>;

    async fn delete(&self, election_id: Id) -> Result<bool>;
}

/// The uniquely keyed store of cast votes.
#[rocket::async_trait]
pub trait VoteLedger: Send + Sync {
    /// Insert a vote. A second vote for the same `(election, voter)` fails
    /// with [`crate::error::Error::DuplicateVote`], however close together
    /// the two calls are.
    async fn cast(&self, vote: NewVote) -> Result<Vote>;

    async fn find_by_election_and_voter(
        &self,
        election_id: Id,
        voter_id: Id,
    ) -> Result<Option<Vote>>;

    /// Returns true iff this call removed the vote.
    async fn delete_vote(&self, vote_id: Id) -> Result<bool>;

    /// Delete every vote of an election, reporting who had voted.
    async fn delete_all_for_election(&self, election_id: Id) -> Result<LedgerPurge>;

    /// Oldest first.
    async fn votes_for_election(&self, election_id: Id) -> Result<Vec<Vote>>;

    /// Newest first.
    async fn votes_by_voter(&self, voter_id: Id) -> Result<Vec<Vote>>;

    async fn delete_votes(&self, vote_ids: &[Id]) -> Result<u64>;

    /// Count the votes of an election, grouped by identical ballot.
    async fn tally(&self, election_id: Id) -> Result<Vec<BallotCount>>;
}

/// The user accounts collaborator, reduced to what voting needs.
#[rocket::async_trait]
pub trait VoterDirectory: Send + Sync {
    async fn find(&self, voter_id: Id) -> Result<Option<Voter>>;

    async fn set_has_voted(&self, voter_id: Id, election_id: Id, voted: bool) -> Result<()>;

    async fn clear_has_voted(&self, voter_id: Id, election_id: Id) -> Result<()>;
}

/// Outcome of [`VoteLedger::delete_all_for_election`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LedgerPurge {
    pub deleted: u64,
    /// Distinct voters whose votes were removed.
    pub voters: Vec<Id>,
}

/// Handles on all stores, placed into Rocket managed state.
#[derive(Clone)]
pub struct Stores {
    pub elections: Arc<dyn ElectionStore>,
    pub ledger: Arc<dyn VoteLedger>,
    pub voters: Arc<dyn VoterDirectory>,
}

impl Stores {
    pub fn mongodb(db: &Database) -> Self {
        Self {
            elections: Arc::new(mongo::MongoElections::new(db)),
            ledger: Arc::new(mongo::MongoLedger::new(db)),
            voters: Arc::new(mongo::MongoVoters::new(db)),
        }
    }

    pub fn memory(store: &memory::MemoryStore) -> Self {
        Self {
            elections: Arc::new(store.clone()),
            ledger: Arc::new(store.clone()),
            voters: Arc::new(store.clone()),
        }
    }
}
