use rocket::Route;

mod admin;
mod results;
mod voting;

pub fn routes() -> Vec<Route> {
    let mut routes = Vec::new();
    routes.extend(admin::routes());
    routes.extend(results::routes());
    routes.extend(voting::routes());
    routes
}

/// Credentials for tests that talk to the routes.
#[cfg(test)]
mod testing {
    use rocket::{http::Cookie, local::asynchronous::Client};

    use crate::model::{
        api::auth::{Admin, AuthToken},
        db::voter::Voter,
        mongodb::Id,
    };
    use crate::store::memory::MemoryStore;
    use crate::Config;

    fn config(client: &Client) -> &Config {
        client.rocket().state::<Config>().unwrap()
    }

    /// Register a fresh voter and log them in.
    pub fn voter_cookie(client: &Client, store: &MemoryStore) -> (Id, Cookie<'static>) {
        let voter = store.insert_voter(Id::new());
        let cookie = AuthToken::<Voter>::new(voter.id).into_cookie(config(client));
        (voter.id, cookie)
    }

    pub fn admin_cookie(client: &Client) -> Cookie<'static> {
        AuthToken::<Admin>::new(Id::new()).into_cookie(config(client))
    }
}
