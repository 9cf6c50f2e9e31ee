use std::fmt::Display;

use serde_repr::{Deserialize_repr, Serialize_repr};

use crate::error::Result;
use crate::model::{db::voter::Voter, mongodb::Id};
use crate::store::Stores;

/// A kind of authenticated caller, having defined rights.
#[rocket::async_trait]
pub trait User {
    /// The rights a token must carry to act as this user type.
    const RIGHTS: Rights;

    /// Does an account with this ID exist?
    async fn exists(stores: &Stores, id: Id) -> Result<bool>;
}

/// Different privilege levels.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Serialize_repr, Deserialize_repr)]
#[repr(u8)]
pub enum Rights {
    Voter = 0,
    Admin = 1,
}

impl Display for Rights {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            formatter,
            "{}",
            match self {
                Self::Voter => "voter",
                Self::Admin => "admin",
            }
        )
    }
}

#[rocket::async_trait]
impl User for Voter {
    const RIGHTS: Rights = Rights::Voter;

    async fn exists(stores: &Stores, id: Id) -> Result<bool> {
        Ok(stores.voters.find(id).await?.is_some())
    }
}

/// An administrator. Admin accounts are managed by the account service, so a
/// valid admin token is all we check.
#[derive(Debug, Clone, Copy)]
pub struct Admin;

#[rocket::async_trait]
impl User for Admin {
    const RIGHTS: Rights = Rights::Admin;

    async fn exists(_stores: &Stores, _id: Id) -> Result<bool> {
        Ok(true)
    }
}
