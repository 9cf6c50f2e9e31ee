use log::info;
use rocket::{serde::json::Json, Route, State};

use crate::error::{Error, Result};
use crate::model::{
    api::{
        auth::{Admin, AuthToken},
        vote::{ElectionDeletion, VoteDesc},
    },
    mongodb::Id,
};
use crate::store::Stores;
use crate::voting;

pub fn routes() -> Vec<Route> {
    routes![election_votes, delete_election]
}

/// Every vote of an election, oldest first.
#[get("/elections/<election_id>/votes")]
async fn election_votes(
    _token: AuthToken<Admin>,
    election_id: Id,
    stores: &State<Stores>,
) -> Result<Json<Vec<VoteDesc>>> {
    if stores.elections.get(election_id).await?.is_none() {
        return Err(Error::not_found(format!("Election with id {election_id}")));
    }
    let votes = stores.ledger.votes_for_election(election_id).await?;
    Ok(Json(votes.into_iter().map(VoteDesc::from).collect()))
}

#[delete("/elections/<election_id>")]
async fn delete_election(
    token: AuthToken<Admin>,
    election_id: Id,
    stores: &State<Stores>,
) -> Result<Json<ElectionDeletion>> {
    info!("Admin {} is deleting election {election_id}", token.id());
    Ok(Json(voting::delete_election(stores, election_id).await?))
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use rocket::{
        http::Status,
        local::asynchronous::Client,
        serde::json::{json, Value},
    };

    use super::*;
    use crate::api::testing::{admin_cookie, voter_cookie};
    use crate::model::{
        api::ballot::BallotSpec,
        db::election::{Election, ElectionCore},
    };
    use crate::store::memory::MemoryStore;

    /// An election with two votes in it.
    async fn voted_election(client: &Client, store: &MemoryStore) -> (Election, Vec<Id>) {
        let stores = store.stores();
        let election = stores
            .elections
            .insert(ElectionCore::yes_no_example())
            .await
            .unwrap();
        let mut voters = Vec::new();
        for choice in ["yes", "no"] {
            let (voter_id, _) = voter_cookie(client, store);
            voting::cast_vote(
                &stores,
                election.id,
                voter_id,
                &BallotSpec::choice(choice),
                Utc::now(),
            )
            .await
            .unwrap();
            voters.push(voter_id);
        }
        (election, voters)
    }

    #[backend_test]
    async fn list_votes(client: Client, store: MemoryStore) {
        let (election, voters) = voted_election(&client, &store).await;

        let response = client
            .get(uri!(election_votes(election.id)))
            .cookie(admin_cookie(&client))
            .dispatch()
            .await;
        assert_eq!(Status::Ok, response.status());
        let votes = response.into_json::<Vec<Value>>().await.unwrap();
        let listed = votes
            .iter()
            .map(|vote| vote["voterId"].as_str().unwrap().to_string())
            .collect::<Vec<_>>();
        let expected = voters.iter().map(Id::to_string).collect::<Vec<_>>();
        assert_eq!(listed, expected);
        assert_eq!(votes[1]["ballot"], json!({"type": "yes-no", "choice": "no"}));
    }

    #[backend_test]
    async fn list_votes_of_missing_election(client: Client) {
        let response = client
            .get(uri!(election_votes(Id::new())))
            .cookie(admin_cookie(&client))
            .dispatch()
            .await;
        assert_eq!(Status::NotFound, response.status());
    }

    #[backend_test]
    async fn voters_are_not_admins(client: Client, store: MemoryStore) {
        let (election, _) = voted_election(&client, &store).await;
        let (_, cookie) = voter_cookie(&client, &store);

        let response = client
            .get(uri!(election_votes(election.id)))
            .cookie(cookie.clone())
            .dispatch()
            .await;
        assert_eq!(Status::Unauthorized, response.status());

        let response = client
            .delete(uri!(delete_election(election.id)))
            .cookie(cookie)
            .dispatch()
            .await;
        assert_eq!(Status::Unauthorized, response.status());
        assert!(store.stores().elections.get(election.id).await.unwrap().is_some());
    }

    #[backend_test]
    async fn delete_cascades(client: Client, store: MemoryStore) {
        let (election, voters) = voted_election(&client, &store).await;

        let response = client
            .delete(uri!(delete_election(election.id)))
            .cookie(admin_cookie(&client))
            .dispatch()
            .await;
        assert_eq!(Status::Ok, response.status());
        assert_eq!(
            response.into_json::<Value>().await.unwrap(),
            json!({"deletedVotes": 2, "affectedVoters": 2})
        );

        let stores = store.stores();
        assert!(stores.elections.get(election.id).await.unwrap().is_none());
        for voter_id in voters {
            assert!(stores
                .ledger
                .votes_by_voter(voter_id)
                .await
                .unwrap()
                .is_empty());
            let voter = stores.voters.find(voter_id).await.unwrap().unwrap();
            assert!(voter.has_voted.is_empty());
        }

        // Deleting again is a 404.
        let response = client
            .delete(uri!(delete_election(election.id)))
            .cookie(admin_cookie(&client))
            .dispatch()
            .await;
        assert_eq!(Status::NotFound, response.status());
    }
}
