use rocket::{serde::json::Json, Route, State};

use crate::error::Result;
use crate::model::{api::results::ElectionResults, mongodb::Id};
use crate::store::Stores;
use crate::voting;

pub fn routes() -> Vec<Route> {
    routes![election_results]
}

/// Live results are public, whatever the election's status.
#[get("/elections/<election_id>/votes/results")]
async fn election_results(
    election_id: Id,
    stores: &State<Stores>,
) -> Result<Json<ElectionResults>> {
    Ok(Json(voting::compute_results(stores, election_id).await?))
}
