//! Ballot validation: does a proposed ballot fit an election right now?

use chrono::{DateTime, Utc};
use rocket::serde::json::Value;

use crate::error::{Error, Result};
use crate::model::{
    api::ballot::BallotSpec,
    common::{
        ballot::{Ballot, Choice},
        options::ElectionOptions,
        status::ElectionStatus,
    },
    db::election::Election,
    mongodb::Id,
};

/// Fail with [`Error::InvalidElectionState`] unless the election is active and
/// `now` is inside its voting window.
pub fn ensure_open(election: &Election, now: DateTime<Utc>) -> Result<()> {
    if election.status != ElectionStatus::Active {
        return Err(Error::InvalidElectionState(format!(
            "Election is not currently active. Status: {}",
            election.status
        )));
    }
    if !election.window_contains(now) {
        return Err(Error::InvalidElectionState(format!(
            "Voting period is not active. Election runs from {} to {}",
            election.start_date.to_rfc3339(),
            election.end_date.to_rfc3339()
        )));
    }
    Ok(())
}

/// Check a proposed ballot against the election's type and current options,
/// producing the ballot to store.
///
/// Image selections given by URL are resolved to the option's canonical ID.
pub fn validate_ballot(
    election: &Election,
    spec: &BallotSpec,
    now: DateTime<Utc>,
) -> Result<Ballot> {
    ensure_open(election, now)?;

    let election_type = election.election_type();
    let expected = field_for(&election.options);
    if let Some(foreign) = spec
        .populated_fields()
        .into_iter()
        .find(|field| *field != expected)
    {
        return Err(Error::InvalidBallot(format!(
            "Field `{foreign}` does not apply to {election_type} elections"
        )));
    }

    match &election.options {
        ElectionOptions::CandidateBased { .. } => {
            let candidate_id = spec
                .candidate_id
                .as_ref()
                .and_then(Value::as_str)
                .and_then(|raw| raw.parse::<Id>().ok())
                .ok_or_else(|| {
                    Error::InvalidBallot(
                        "Please provide a valid candidateId for this election type.".to_string(),
                    )
                })?;
            if election.options.candidate(candidate_id).is_none() {
                return Err(Error::InvalidBallot(format!(
                    "Candidate with id {candidate_id} is not participating in this election."
                )));
            }
            Ok(Ballot::CandidateBased { candidate_id })
        }
        ElectionOptions::YesNo { .. } => {
            let choice = spec
                .choice
                .as_ref()
                .and_then(Value::as_str)
                .and_then(|raw| raw.parse::<Choice>().ok())
                .ok_or_else(|| {
                    Error::InvalidBallot(
                        "Please provide a valid choice (yes/no) for this election type."
                            .to_string(),
                    )
                })?;
            Ok(Ballot::YesNo { choice })
        }
        ElectionOptions::Rating { rating_options } => {
            let rating_value = spec
                .rating_value
                .as_ref()
                .and_then(Value::as_f64)
                .ok_or_else(|| {
                    Error::InvalidBallot(
                        "Please provide a numeric ratingValue for this election type.".to_string(),
                    )
                })?;
            if !rating_options.accepts(rating_value) {
                return Err(Error::InvalidBallot(format!(
                    "Rating value must be between {} and {}.",
                    rating_options.min, rating_options.max
                )));
            }
            Ok(Ballot::Rating { rating_value })
        }
        ElectionOptions::ImageBased { .. } => {
            let selector = spec
                .selected_option_id
                .as_ref()
                .and_then(Value::as_str)
                .filter(|raw| !raw.is_empty())
                .ok_or_else(|| {
                    Error::InvalidBallot(
                        "Please provide a valid selectedOptionId for this election type."
                            .to_string(),
                    )
                })?;
            let image = election.options.image_by_selector(selector).ok_or_else(|| {
                Error::InvalidBallot(format!(
                    "Selected image with id {selector} is not a valid option for this election."
                ))
            })?;
            Ok(Ballot::ImageBased {
                selected_option_id: image.option_id,
            })
        }
    }
}

/// The one ballot field an election of this type accepts.
fn field_for(options: &ElectionOptions) -> &'static str {
    match options {
        ElectionOptions::CandidateBased { .. } => "candidateId",
        ElectionOptions::YesNo { .. } => "choice",
        ElectionOptions::Rating { .. } => "ratingValue",
        ElectionOptions::ImageBased { .. } => "selectedOptionId",
    }
}
