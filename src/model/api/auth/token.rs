use std::marker::PhantomData;

use chrono::{serde::ts_seconds, DateTime, Utc};
use jsonwebtoken::{DecodingKey, TokenData, Validation};
use log::{error, warn};
use rocket::{
    http::Status,
    request::{FromRequest, Outcome},
    Request,
};
use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::error::Error;
use crate::model::{api::id::ApiId, mongodb::Id};
use crate::store::Stores;

use super::user::{Rights, User};

pub const AUTH_TOKEN_COOKIE: &str = "auth_token";

/// An authentication token representing a specific user with specific rights.
///
/// Tokens are issued by the account service; this backend only verifies them.
#[derive(Serialize, Deserialize)]
pub struct AuthToken<U> {
    #[serde(rename = "sub")]
    id: ApiId,
    #[serde(rename = "rgt")]
    pub rights: Rights,
    #[serde(skip)]
    phantom: PhantomData<U>,
}

impl<U> AuthToken<U> {
    /// The ID of the user this token was issued to.
    pub fn id(&self) -> Id {
        self.id.into()
    }

    /// Does this token permit the given rights?
    pub fn permits(&self, target: Rights) -> bool {
        self.rights == target
    }
}

impl<U> AuthToken<U>
where
    U: User,
{
    /// Decode and verify a raw JWT.
    pub fn decode(token: &str, config: &Config) -> Result<Self, Error> {
        let token = jsonwebtoken::decode(
            token,
            &DecodingKey::from_secret(config.jwt_secret()),
            &Validation::default(),
        )
        .map(|claims: TokenData<Claims<U>>| claims.claims.token)?;
        Ok(token)
    }
}

/// Token claims: the token itself plus an expiry datetime.
#[derive(Serialize, Deserialize)]
struct Claims<U> {
    #[serde(flatten, bound = "")]
    token: AuthToken<U>,
    #[serde(rename = "exp", with = "ts_seconds")]
    expire_at: DateTime<Utc>,
}

/// Find the raw token, preferring the cookie over an `Authorization: Bearer` header.
fn raw_token(req: &Request<'_>) -> Option<String> {
    if let Some(cookie) = req.cookies().get(AUTH_TOKEN_COOKIE) {
        return Some(cookie.value().to_string());
    }
    req.headers()
        .get_one("Authorization")
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(|token| token.trim().to_string())
}

fn unauthorized<T>(reason: &str) -> Outcome<T, Error> {
    warn!("Rejected credentials: {reason}");
    Outcome::Failure((Status::Unauthorized, Error::Unauthorized(reason.to_string())))
}

#[rocket::async_trait]
impl<'r, U> FromRequest<'r> for AuthToken<U>
where
    U: User + Send,
{
    type Error = Error;

    /// Get an [`AuthToken`] from the request, verify that it has the correct
    /// rights for this user type, and that the user exists.
    async fn from_request(req: &'r Request<'_>) -> Outcome<Self, Self::Error> {
        let (Some(config), Some(stores)) = (
            req.rocket().state::<Config>(),
            req.rocket().state::<Stores>(),
        ) else {
            error!("Authentication attempted before config and stores were managed");
            return Outcome::Failure((
                Status::InternalServerError,
                Error::Configuration("Server is not fully configured".to_string()),
            ));
        };

        let Some(raw) = raw_token(req) else {
            return unauthorized("no authentication token");
        };

        let token = match Self::decode(&raw, config) {
            Ok(token) => token,
            Err(e) => return unauthorized(&e.to_string()),
        };

        if !token.permits(U::RIGHTS) {
            return unauthorized(&format!("{} rights required", U::RIGHTS));
        }

        match U::exists(stores, token.id()).await {
            Ok(true) => Outcome::Success(token),
            Ok(false) => unauthorized(&format!("no {} with ID {}", U::RIGHTS, token.id)),
            Err(e) => Outcome::Failure((Status::InternalServerError, e)),
        }
    }
}
