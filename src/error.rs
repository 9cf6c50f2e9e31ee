use jsonwebtoken::errors::Error as JwtError;
use log::{error, warn};
use mongodb::error::Error as DbError;
use rocket::{
    http::Status,
    response::{self, Responder},
    serde::json::Json,
    Request, Response,
};
use serde::Serialize;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Db(#[from] DbError),
    #[error(transparent)]
    Jwt(#[from] JwtError),
    #[error("Unauthorized: {0}")]
    Unauthorized(String),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("{0}")]
    InvalidElectionState(String),
    #[error("{0}")]
    InvalidBallot(String),
    #[error("{0}")]
    DuplicateVote(String),
    #[error("{0}")]
    ConcurrentRequest(String),
    #[error("Configuration error: {0}")]
    Configuration(String),
    #[error("Service unavailable: {0}")]
    Unavailable(String),
}

/// Machine-readable error category, reported to API callers alongside the message.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ErrorKind {
    NotFound,
    InvalidElectionState,
    InvalidBallot,
    DuplicateVote,
    ConcurrentRequest,
    ConfigurationError,
    Unavailable,
    Unauthorized,
    Database,
}

impl Error {
    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound(what.into())
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Db(_) => ErrorKind::Database,
            Self::Jwt(_) | Self::Unauthorized(_) => ErrorKind::Unauthorized,
            Self::NotFound(_) => ErrorKind::NotFound,
            Self::InvalidElectionState(_) => ErrorKind::InvalidElectionState,
            Self::InvalidBallot(_) => ErrorKind::InvalidBallot,
            Self::DuplicateVote(_) => ErrorKind::DuplicateVote,
            Self::ConcurrentRequest(_) => ErrorKind::ConcurrentRequest,
            Self::Configuration(_) => ErrorKind::ConfigurationError,
            Self::Unavailable(_) => ErrorKind::Unavailable,
        }
    }

    pub fn status(&self) -> Status {
        match self {
            Self::NotFound(_) => Status::NotFound,
            Self::InvalidElectionState(_) | Self::InvalidBallot(_) => Status::BadRequest,
            Self::DuplicateVote(_) | Self::ConcurrentRequest(_) => Status::Conflict,
            Self::Jwt(_) | Self::Unauthorized(_) => Status::Unauthorized,
            Self::Db(_) | Self::Configuration(_) => Status::InternalServerError,
            Self::Unavailable(_) => Status::ServiceUnavailable,
        }
    }
}

/// JSON error body.
#[derive(Debug, Serialize)]
struct ErrorBody {
    kind: ErrorKind,
    message: String,
}

impl<'r, 'o: 'r> Responder<'r, 'o> for Error {
    fn respond_to(self, req: &'r Request<'_>) -> response::Result<'o> {
        let status = self.status();
        // Don't leak database internals to the caller.
        let message = match self {
            Self::Db(ref e) => {
                error!("Database error: {e}");
                "Internal database error".to_string()
            }
            Self::Configuration(_) | Self::Unavailable(_) => {
                error!("{self}");
                self.to_string()
            }
            _ => {
                warn!("{self}");
                self.to_string()
            }
        };
        let body = ErrorBody {
            kind: self.kind(),
            message,
        };
        Response::build_from(Json(body).respond_to(req)?)
            .status(status)
            .ok()
    }
}
