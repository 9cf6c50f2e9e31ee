use std::ops::{Deref, DerefMut};

use chrono::{DateTime, Utc};
use mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime;
use serde::{Deserialize, Serialize};

use crate::model::{
    common::{
        options::{ElectionOptions, ElectionType},
        status::ElectionStatus,
    },
    mongodb::Id,
};

/// Core election data, as stored in the database.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElectionCore {
    /// Election title.
    pub title: String,
    /// Longer description shown to voters.
    pub description: String,
    /// Lifecycle status, owned by the admin workflow.
    pub status: ElectionStatus,
    /// Start of the voting window (inclusive).
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub start_date: DateTime<Utc>,
    /// End of the voting window (inclusive).
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub end_date: DateTime<Utc>,
    /// When set, automated jobs must not change `status`.
    #[serde(default = "default_manual_status")]
    pub manual_status: bool,
    /// Type-specific options; the variant is the election type.
    pub options: ElectionOptions,
}

fn default_manual_status() -> bool {
    true
}

impl ElectionCore {
    pub fn election_type(&self) -> ElectionType {
        self.options.election_type()
    }

    /// Is `now` inside the voting window?
    pub fn window_contains(&self, now: DateTime<Utc>) -> bool {
        self.start_date <= now && now <= self.end_date
    }
}

/// An election without an ID.
pub type NewElection = ElectionCore;

/// An election from the database, with its unique ID.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Election {
    #[serde(rename = "_id")]
    pub id: Id,
    #[serde(flatten)]
    pub election: ElectionCore,
}

impl Deref for Election {
    type Target = ElectionCore;

    fn deref(&self) -> &Self::Target {
        &self.election
    }
}

impl DerefMut for Election {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.election
    }
}
