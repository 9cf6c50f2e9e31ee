use log::{error, info};
use mongodb::Client as MongoClient;
use rocket::{
    fairing::{Fairing, Info, Kind},
    Build, Rocket,
};
use serde::Deserialize;

use crate::model::mongodb::ensure_indexes_exist;
use crate::store::{memory::MemoryStore, Stores};

/// Application configuration, derived from `Rocket.toml` and `ROCKET_*`
/// environment variables. This struct becomes managed state and can be
/// inspected by any endpoint.
#[derive(Debug, Deserialize)]
pub struct Config {
    // non-secrets
    #[serde(default)]
    storage: StorageKind,
    // secrets
    jwt_secret: String,
}

impl Config {
    /// Which backend holds elections, votes and voters.
    pub fn storage(&self) -> StorageKind {
        self.storage
    }

    /// Secret key used to verify JWTs.
    pub fn jwt_secret(&self) -> &[u8] {
        self.jwt_secret.as_bytes()
    }
}

/// Storage backends.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageKind {
    #[default]
    Mongodb,
    /// Process-local and lost on shutdown.
    Memory,
}

/// A fairing that loads the application config and puts it in managed state.
/// This could easily be achieved using `AdHoc::config`, but is written out
/// explicitly for symmetry with the other fairings and control over error
/// messages.
pub struct ConfigFairing;

#[rocket::async_trait]
impl Fairing for ConfigFairing {
    fn info(&self) -> Info {
        Info {
            name: "Config",
            kind: Kind::Ignite,
        }
    }

    async fn on_ignite(&self, mut rocket: Rocket<Build>) -> rocket::fairing::Result {
        // Load the config.
        let config = match rocket.figment().extract::<Config>() {
            Ok(config) => config,
            Err(e) => {
                error!("Failed to load application config");
                rocket::config::pretty_print_error(e);
                return Err(rocket);
            }
        };

        // Manage the state.
        rocket = rocket.manage(config);
        Ok(rocket)
    }
}

/// Configuration for the database.
#[derive(Deserialize)]
struct DbConfig {
    // non-secrets
    #[serde(default = "DbConfig::default_db_name")]
    db_name: String,
    // secrets
    db_uri: String,
}

impl DbConfig {
    fn default_db_name() -> String {
        "ballotbox".to_string()
    }
}

/// A fairing that opens the configured storage backend, performs any setup
/// necessary, and places the resulting [`Stores`] into managed state.
///
/// Must be attached after [`ConfigFairing`].
pub struct StoreFairing;

#[rocket::async_trait]
impl Fairing for StoreFairing {
    fn info(&self) -> Info {
        Info {
            name: "Storage",
            kind: Kind::Ignite,
        }
    }

    async fn on_ignite(&self, mut rocket: Rocket<Build>) -> rocket::fairing::Result {
        let Some(storage) = rocket.state::<Config>().map(Config::storage) else {
            error!("Storage fairing attached before the config fairing");
            return Err(rocket);
        };

        let stores = match storage {
            StorageKind::Memory => {
                info!("Using in-memory storage, nothing will be persisted");
                MemoryStore::new().stores()
            }
            StorageKind::Mongodb => {
                // Load the config.
                let config = match rocket.figment().extract::<DbConfig>() {
                    Ok(config) => config,
                    Err(e) => {
                        error!("Failed to load database config");
                        rocket::config::pretty_print_error(e);
                        return Err(rocket);
                    }
                };
                info!("Loaded database config, connecting...");
                // Construct the connection.
                let client = match MongoClient::with_uri_str(config.db_uri).await {
                    Ok(client) => client,
                    Err(e) => {
                        error!("Failed to connect to database: {e}");
                        return Err(rocket);
                    }
                };
                let db = client.database(&config.db_name);

                // Without the unique vote index, double voting is possible.
                if let Err(e) = ensure_indexes_exist(&db).await {
                    error!("Failed to create database indexes: {e}");
                    return Err(rocket);
                }
                info!("...database connection online!");

                Stores::mongodb(&db)
            }
        };

        // Manage the state.
        rocket = rocket.manage(stores);
        Ok(rocket)
    }
}
