use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::model::mongodb::{serde_string_map, Id};

/// The slice of a user account the voting engine cares about.
///
/// Accounts are created and managed elsewhere; any other fields on the
/// stored document are ignored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Voter {
    #[serde(rename = "_id")]
    pub id: Id,
    /// Denormalized record of the elections this user has voted in.
    /// The vote ledger is authoritative; this map only mirrors it.
    #[serde(default, with = "serde_string_map")]
    pub has_voted: HashMap<Id, bool>,
}

impl Voter {
    pub fn new(id: Id) -> Self {
        Self {
            id,
            has_voted: HashMap::new(),
        }
    }
}
