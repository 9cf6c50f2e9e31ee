use mongodb::{
    bson::{doc, from_document, Bson, Document},
    options::FindOptions,
    Database,
};
use rocket::futures::TryStreamExt;

use crate::error::{Error, Result};
use crate::model::{
    common::{options::ElectionOptions, status::ElectionStatus},
    db::{
        election::{Election, NewElection},
        vote::{BallotCount, NewVote, Vote},
        voter::Voter,
    },
    mongodb::{is_deserialization_error, is_duplicate_key_error, Coll, Id},
};

use super::{ElectionStore, LedgerPurge, VoteLedger, VoterDirectory};

/// Elections stored in the `elections` collection.
pub struct MongoElections {
    elections: Coll<Election>,
}

impl MongoElections {
    pub fn new(db: &Database) -> Self {
        Self {
            elections: Coll::from_db(db),
        }
    }
}

#[rocket::async_trait]
impl ElectionStore for MongoElections {
    async fn get(&self, election_id: Id) -> Result<Option<Election>> {
        self.elections
            .find_one(election_id.as_doc(), None)
            .await
            .map_err(|e| {
                if is_deserialization_error(&e) {
                    // Most likely an `election_type` this build doesn't know about.
                    Error::Configuration(format!("Election {election_id} is unreadable: {e}"))
                } else {
                    e.into()
                }
            })
    }

    async fn insert(&self, election: NewElection) -> Result<Election> {
        let election = Election {
            id: Id::new(),
            election,
        };
        self.elections.insert_one(&election, None).await?;
        Ok(election)
    }

    async fn remove_option(&self, election_id: Id, option_id: Id) -> Result<bool> {
        let election = self
            .get(election_id)
            .await?
            .ok_or_else(|| Error::not_found(format!("Election {election_id}")))?;
        if election.status == ElectionStatus::Completed {
            return Err(Error::InvalidElectionState(
                "Cannot remove options from a completed election".to_string(),
            ));
        }
        let list = match election.options {
            ElectionOptions::CandidateBased { .. } => "options.candidates",
            ElectionOptions::ImageBased { .. } => "options.images",
            ElectionOptions::YesNo { .. } | ElectionOptions::Rating { .. } => return Ok(false),
        };

        // Re-check the status in the filter so a concurrent completion wins.
        let filter = doc! {
            "_id": election_id,
            "status": { "$ne": ElectionStatus::Completed },
        };
        let update = doc! {
            "$pull": {
                list: { "option_id": option_id },
            }
        };
        let result = self.elections.update_one(filter, update, None).await?;
        Ok(result.modified_count == 1)
    }

    async fn delete(&self, election_id: Id) -> Result<bool> {
        let result = self
            .elections
            .delete_one(election_id.as_doc(), None)
            .await?;
        Ok(result.deleted_count == 1)
    }
}

/// Votes stored in the `votes` collection, guarded by the unique
/// `(election_id, voter_id)` index created at ignition.
pub struct MongoLedger {
    votes: Coll<Vote>,
}

impl MongoLedger {
    pub fn new(db: &Database) -> Self {
        Self {
            votes: Coll::from_db(db),
        }
    }

    async fn find_sorted(&self, filter: Document, newest_first: bool) -> Result<Vec<Vote>> {
        let options = FindOptions::builder()
            .sort(doc! { "created_at": if newest_first { -1 } else { 1 } })
            .build();
        let votes = self
            .votes
            .find(filter, options)
            .await?
            .try_collect()
            .await?;
        Ok(votes)
    }
}

#[rocket::async_trait]
impl VoteLedger for MongoLedger {
    async fn cast(&self, vote: NewVote) -> Result<Vote> {
        let vote = Vote {
            id: Id::new(),
            vote,
        };
        match self.votes.insert_one(&vote, None).await {
            Ok(_) => Ok(vote),
            Err(e) if is_duplicate_key_error(&e) => Err(Error::DuplicateVote(
                "You have already voted in this election".to_string(),
            )),
            Err(e) => Err(e.into()),
        }
    }

    async fn find_by_election_and_voter(
        &self,
        election_id: Id,
        voter_id: Id,
    ) -> Result<Option<Vote>> {
        let filter = doc! {
            "election_id": election_id,
            "voter_id": voter_id,
        };
        Ok(self.votes.find_one(filter, None).await?)
    }

    async fn delete_vote(&self, vote_id: Id) -> Result<bool> {
        let result = self.votes.delete_one(vote_id.as_doc(), None).await?;
        Ok(result.deleted_count == 1)
    }

    async fn delete_all_for_election(&self, election_id: Id) -> Result<LedgerPurge> {
        let filter = doc! {
            "election_id": election_id,
        };
        let voters = self
            .votes
            .distinct("voter_id", filter.clone(), None)
            .await?
            .into_iter()
            .filter_map(|voter| voter.as_object_id().map(Id::from))
            .collect();
        let result = self.votes.delete_many(filter, None).await?;
        Ok(LedgerPurge {
            deleted: result.deleted_count,
            voters,
        })
    }

    async fn votes_for_election(&self, election_id: Id) -> Result<Vec<Vote>> {
        self.find_sorted(doc! { "election_id": election_id }, false)
            .await
    }

    async fn votes_by_voter(&self, voter_id: Id) -> Result<Vec<Vote>> {
        self.find_sorted(doc! { "voter_id": voter_id }, true).await
    }

    async fn delete_votes(&self, vote_ids: &[Id]) -> Result<u64> {
        let ids = vote_ids.iter().copied().map(Bson::from).collect::<Vec<_>>();
        let filter = doc! {
            "_id": { "$in": ids },
        };
        let result = self.votes.delete_many(filter, None).await?;
        Ok(result.deleted_count)
    }

    async fn tally(&self, election_id: Id) -> Result<Vec<BallotCount>> {
        // Group on the whole ballot subdocument: it holds both the type tag and
        // the chosen value, so each group is exactly one distinct answer.
        let pipeline = vec![
            doc! { "$match": { "election_id": election_id } },
            doc! { "$group": { "_id": "$ballot", "votes": { "$sum": 1 } } },
        ];
        let mut cursor = self.votes.aggregate(pipeline, None).await?;
        let mut counts = Vec::new();
        while let Some(group) = cursor.try_next().await? {
            let count = from_document::<BallotCount>(group).map_err(|e| {
                Error::Configuration(format!(
                    "Election {election_id} has an unreadable ballot: {e}"
                ))
            })?;
            counts.push(count);
        }
        Ok(counts)
    }
}

/// The `has_voted` side-channel on user accounts in the `users` collection.
pub struct MongoVoters {
    voters: Coll<Voter>,
}

impl MongoVoters {
    pub fn new(db: &Database) -> Self {
        Self {
            voters: Coll::from_db(db),
        }
    }
}

#[rocket::async_trait]
impl VoterDirectory for MongoVoters {
    async fn find(&self, voter_id: Id) -> Result<Option<Voter>> {
        Ok(self.voters.find_one(voter_id.as_doc(), None).await?)
    }

    async fn set_has_voted(&self, voter_id: Id, election_id: Id, voted: bool) -> Result<()> {
        let field = format!("has_voted.{election_id}");
        let update = doc! {
            "$set": {
                field: voted,
            }
        };
        self.voters
            .update_one(voter_id.as_doc(), update, None)
            .await?;
        Ok(())
    }

    async fn clear_has_voted(&self, voter_id: Id, election_id: Id) -> Result<()> {
        let field = format!("has_voted.{election_id}");
        let update = doc! {
            "$unset": {
                field: "",
            }
        };
        self.voters
            .update_one(voter_id.as_doc(), update, None)
            .await?;
        Ok(())
    }
}
