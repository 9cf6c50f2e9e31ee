use chrono::Utc;
use log::debug;
use rocket::{http::Status, serde::json::Json, Route, State};

use crate::error::Result;
use crate::logging::RequestId;
use crate::model::{
    api::{
        auth::AuthToken,
        ballot::BallotSpec,
        eligibility::Eligibility,
        vote::{VoteDesc, VoteHistoryEntry, VoteStatus},
    },
    db::voter::Voter,
    mongodb::Id,
};
use crate::store::Stores;
use crate::voting;

pub fn routes() -> Vec<Route> {
    routes![eligibility, cast_vote, vote_status, my_votes]
}

#[get("/elections/<election_id>/votes/eligibility")]
async fn eligibility(
    token: AuthToken<Voter>,
    election_id: Id,
    stores: &State<Stores>,
) -> Result<Json<Eligibility>> {
    let eligibility =
        voting::check_eligibility(stores, election_id, token.id(), Utc::now()).await?;
    Ok(Json(eligibility))
}

#[post("/elections/<election_id>/votes", data = "<ballot>", format = "json")]
async fn cast_vote(
    token: AuthToken<Voter>,
    election_id: Id,
    ballot: Json<BallotSpec>,
    stores: &State<Stores>,
    request_id: &RequestId,
) -> Result<(Status, Json<VoteDesc>)> {
    let vote = voting::cast_vote(stores, election_id, token.id(), &ballot, Utc::now()).await?;
    debug!(
        "req{request_id}: voter {} cast vote {} in election {election_id}",
        token.id(),
        vote.id
    );
    Ok((Status::Created, Json(vote.into())))
}

#[get("/elections/<election_id>/votes/status")]
async fn vote_status(
    token: AuthToken<Voter>,
    election_id: Id,
    stores: &State<Stores>,
) -> Result<Json<VoteStatus>> {
    let vote = stores
        .ledger
        .find_by_election_and_voter(election_id, token.id())
        .await?;
    Ok(Json(VoteStatus {
        has_voted: vote.is_some(),
    }))
}

#[get("/votes/mine")]
async fn my_votes(
    token: AuthToken<Voter>,
    stores: &State<Stores>,
) -> Result<Json<Vec<VoteHistoryEntry>>> {
    let history = voting::voting_history(stores, token.id()).await?;
    Ok(Json(history.entries))
}

#[cfg(test)]
mod tests {
    use chrono::Duration;
    use rocket::{
        http::{ContentType, Cookie},
        local::asynchronous::Client,
        serde::json::{json, Value},
    };

    use super::*;
    use crate::api::testing::voter_cookie;
    use crate::model::db::election::{Election, ElectionCore};
    use crate::model::{
        api::auth::AUTH_TOKEN_COOKIE,
        common::{options::ElectionOptions, status::ElectionStatus},
    };
    use crate::store::memory::MemoryStore;
    use crate::Config;

    async fn insert(store: &MemoryStore, election: ElectionCore) -> Election {
        store.stores().elections.insert(election).await.unwrap()
    }

    async fn post_ballot(
        client: &Client,
        election_id: Id,
        cookie: &Cookie<'static>,
        ballot: Value,
    ) -> (Status, Value) {
        let response = client
            .post(uri!(cast_vote(election_id)))
            .header(ContentType::JSON)
            .cookie(cookie.clone())
            .body(ballot.to_string())
            .dispatch()
            .await;
        let status = response.status();
        (status, response.into_json::<Value>().await.unwrap())
    }

    #[backend_test]
    async fn cast_then_duplicate(client: Client, store: MemoryStore) {
        let election = insert(&store, ElectionCore::yes_no_example()).await;
        let (voter_id, cookie) = voter_cookie(&client, &store);

        let (status, body) = post_ballot(&client, election.id, &cookie, json!({"choice": "yes"})).await;
        assert_eq!(Status::Created, status);
        assert_eq!(body["electionId"], json!(election.id.to_string()));
        assert_eq!(body["voterId"], json!(voter_id.to_string()));
        assert_eq!(body["ballot"], json!({"type": "yes-no", "choice": "yes"}));

        let (status, body) = post_ballot(&client, election.id, &cookie, json!({"choice": "no"})).await;
        assert_eq!(Status::Conflict, status);
        assert_eq!(body["kind"], json!("duplicateVote"));

        let voter = store.stores().voters.find(voter_id).await.unwrap().unwrap();
        assert_eq!(voter.has_voted.get(&election.id), Some(&true));
    }

    #[backend_test]
    async fn invalid_ballots_are_bad_requests(client: Client, store: MemoryStore) {
        let election = insert(&store, ElectionCore::rating_example()).await;
        let (_, cookie) = voter_cookie(&client, &store);

        let (status, body) =
            post_ballot(&client, election.id, &cookie, json!({"ratingValue": 9})).await;
        assert_eq!(Status::BadRequest, status);
        assert_eq!(body["kind"], json!("invalidBallot"));
        assert_eq!(body["message"], json!("Rating value must be between 1 and 5."));

        let (status, body) =
            post_ballot(&client, election.id, &cookie, json!({"ratingValue": "four"})).await;
        assert_eq!(Status::BadRequest, status);
        assert_eq!(body["kind"], json!("invalidBallot"));

        // Nothing was recorded, so a valid ballot still goes through.
        let (status, _) = post_ballot(&client, election.id, &cookie, json!({"ratingValue": 4})).await;
        assert_eq!(Status::Created, status);
    }

    #[backend_test]
    async fn wrong_json_types_are_invalid_ballots(client: Client, store: MemoryStore) {
        let yes_no = insert(&store, ElectionCore::yes_no_example()).await;
        let candidates = insert(&store, ElectionCore::candidate_example()).await;
        let (voter_id, cookie) = voter_cookie(&client, &store);

        for ballot in [json!({"choice": 1}), json!({"choice": true})] {
            let (status, body) = post_ballot(&client, yes_no.id, &cookie, ballot).await;
            assert_eq!(Status::BadRequest, status);
            assert_eq!(body["kind"], json!("invalidBallot"));
            assert_eq!(
                body["message"],
                json!("Please provide a valid choice (yes/no) for this election type.")
            );
        }

        let (status, body) =
            post_ballot(&client, candidates.id, &cookie, json!({"candidateId": 5})).await;
        assert_eq!(Status::BadRequest, status);
        assert_eq!(body["kind"], json!("invalidBallot"));
        assert_eq!(
            body["message"],
            json!("Please provide a valid candidateId for this election type.")
        );

        assert!(store
            .stores()
            .ledger
            .votes_by_voter(voter_id)
            .await
            .unwrap()
            .is_empty());
    }

    #[backend_test]
    async fn closed_election_rejects_votes(client: Client, store: MemoryStore) {
        let mut core = ElectionCore::yes_no_example();
        core.status = ElectionStatus::Completed;
        let election = insert(&store, core).await;
        let (_, cookie) = voter_cookie(&client, &store);

        let (status, body) = post_ballot(&client, election.id, &cookie, json!({"choice": "yes"})).await;
        assert_eq!(Status::BadRequest, status);
        assert_eq!(body["kind"], json!("invalidElectionState"));
    }

    #[backend_test]
    async fn unknown_election_is_not_found(client: Client, store: MemoryStore) {
        let (_, cookie) = voter_cookie(&client, &store);
        let (status, body) = post_ballot(&client, Id::new(), &cookie, json!({"choice": "yes"})).await;
        assert_eq!(Status::NotFound, status);
        assert_eq!(body["kind"], json!("notFound"));
    }

    #[backend_test]
    async fn voter_routes_require_a_token(client: Client, store: MemoryStore) {
        let election = insert(&store, ElectionCore::yes_no_example()).await;

        let response = client
            .get(uri!(eligibility(election.id)))
            .dispatch()
            .await;
        assert_eq!(Status::Unauthorized, response.status());

        // Expired.
        let config = client.rocket().state::<Config>().unwrap();
        let voter = store.insert_voter(Id::new());
        let expired = AuthToken::<Voter>::new(voter.id).encode(config, -Duration::hours(1));
        let response = client
            .get(uri!(vote_status(election.id)))
            .cookie(Cookie::new(AUTH_TOKEN_COOKIE, expired))
            .dispatch()
            .await;
        assert_eq!(Status::Unauthorized, response.status());

        // Valid signature, but nobody by that ID.
        let stranger = AuthToken::<Voter>::new(Id::new()).into_cookie(config);
        let response = client
            .get(uri!(my_votes))
            .cookie(stranger)
            .dispatch()
            .await;
        assert_eq!(Status::Unauthorized, response.status());
    }

    #[backend_test]
    async fn bearer_header_is_accepted(client: Client, store: MemoryStore) {
        let election = insert(&store, ElectionCore::yes_no_example()).await;
        let config = client.rocket().state::<Config>().unwrap();
        let voter = store.insert_voter(Id::new());
        let token = AuthToken::<Voter>::new(voter.id).encode(config, Duration::hours(1));

        let response = client
            .get(uri!(eligibility(election.id)))
            .header(rocket::http::Header::new(
                "Authorization",
                format!("Bearer {token}"),
            ))
            .dispatch()
            .await;
        assert_eq!(Status::Ok, response.status());
        assert_eq!(
            response.into_json::<Value>().await.unwrap(),
            json!({"canVote": true})
        );
    }

    #[backend_test]
    async fn eligibility_and_status_follow_the_ledger(client: Client, store: MemoryStore) {
        let election = insert(&store, ElectionCore::candidate_example()).await;
        let (_, cookie) = voter_cookie(&client, &store);

        let response = client
            .get(uri!(vote_status(election.id)))
            .cookie(cookie.clone())
            .dispatch()
            .await;
        assert_eq!(Status::Ok, response.status());
        assert_eq!(
            response.into_json::<Value>().await.unwrap(),
            json!({"hasVoted": false})
        );

        let ElectionOptions::CandidateBased { candidates } = &election.options else {
            unreachable!()
        };
        let candidate = candidates[1].candidate_id;
        let (status, _) = post_ballot(
            &client,
            election.id,
            &cookie,
            json!({"candidateId": candidate.to_string()}),
        )
        .await;
        assert_eq!(Status::Created, status);

        let response = client
            .get(uri!(vote_status(election.id)))
            .cookie(cookie.clone())
            .dispatch()
            .await;
        assert_eq!(
            response.into_json::<Value>().await.unwrap(),
            json!({"hasVoted": true})
        );

        let response = client
            .get(uri!(eligibility(election.id)))
            .cookie(cookie)
            .dispatch()
            .await;
        assert_eq!(Status::Ok, response.status());
        assert_eq!(
            response.into_json::<Value>().await.unwrap(),
            json!({
                "canVote": false,
                "reason": "You have already voted in this election.",
            })
        );
    }

    #[backend_test]
    async fn removed_image_lets_the_voter_vote_again(client: Client, store: MemoryStore) {
        let election = insert(&store, ElectionCore::image_example()).await;
        let (_, cookie) = voter_cookie(&client, &store);
        let ElectionOptions::ImageBased { images } = election.options.clone() else {
            unreachable!()
        };

        let (status, _) = post_ballot(
            &client,
            election.id,
            &cookie,
            json!({"selectedOptionId": images[0].option_id.to_string()}),
        )
        .await;
        assert_eq!(Status::Created, status);

        assert!(store
            .stores()
            .elections
            .remove_option(election.id, images[0].option_id)
            .await
            .unwrap());

        let response = client
            .get(uri!(eligibility(election.id)))
            .cookie(cookie.clone())
            .dispatch()
            .await;
        let body = response.into_json::<Value>().await.unwrap();
        assert_eq!(body["canVote"], json!(true));
        assert_eq!(body["previousVoteInvalidated"], json!(true));

        // The legacy field name still works, and accepts the image URL.
        let (status, body) = post_ballot(
            &client,
            election.id,
            &cookie,
            json!({"selectedImageId": images[1].image_url}),
        )
        .await;
        assert_eq!(Status::Created, status);
        assert_eq!(
            body["ballot"]["selectedOptionId"],
            json!(images[1].option_id.to_string())
        );
    }

    #[backend_test]
    async fn history_lists_newest_first(client: Client, store: MemoryStore) {
        let first = insert(&store, ElectionCore::yes_no_example()).await;
        let second = insert(&store, ElectionCore::rating_example()).await;
        let (_, cookie) = voter_cookie(&client, &store);

        post_ballot(&client, first.id, &cookie, json!({"choice": "no"})).await;
        post_ballot(&client, second.id, &cookie, json!({"ratingValue": 3})).await;

        let response = client
            .get(uri!(my_votes))
            .cookie(cookie)
            .dispatch()
            .await;
        assert_eq!(Status::Ok, response.status());
        let history = response.into_json::<Vec<Value>>().await.unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0]["election"]["id"], json!(second.id.to_string()));
        assert_eq!(history[0]["election"]["electionType"], json!("rating"));
        assert_eq!(history[0]["ballot"], json!({"type": "rating", "ratingValue": 3.0}));
        assert_eq!(history[1]["election"]["title"], json!(first.title));
    }
}
