#[macro_use]
extern crate rocket;

#[cfg(test)]
#[macro_use]
extern crate backend_test;

use rocket::{Build, Rocket};

pub mod api;
pub mod config;
pub mod error;
pub mod logging;
pub mod model;
pub mod store;
pub mod voting;

pub use config::Config;

use config::{ConfigFairing, StoreFairing};
use logging::LoggerFairing;

/// Build the server, with storage chosen by the `storage` config key.
pub fn build() -> Rocket<Build> {
    rocket::build()
        .mount("/", api::routes())
        .attach(ConfigFairing)
        .attach(StoreFairing)
        .attach(LoggerFairing)
}

/// Build a server over stores opened by the caller.
#[cfg(test)]
pub(crate) fn rocket_for_stores(stores: store::Stores) -> Rocket<Build> {
    let figment = rocket::Config::figment()
        .merge(("jwt_secret", "not a real secret"))
        .merge(("storage", "memory"));
    rocket::custom(figment)
        .mount("/", api::routes())
        .attach(ConfigFairing)
        .attach(LoggerFairing)
        .manage(stores)
}
