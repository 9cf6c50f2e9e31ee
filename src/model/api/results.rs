use serde::Serialize;

use crate::model::{
    api::id::ApiId,
    common::{
        ballot::Choice,
        options::{CandidateOption, ImageOption, RatingOptions},
    },
};

/// Live results of an election; the shape depends on the election type.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "electionType", rename_all = "kebab-case")]
pub enum ElectionResults {
    CandidateBased {
        /// Every current candidate, most votes first.
        candidates: Vec<CandidateResult>,
    },
    YesNo {
        proposition: String,
        /// Always `yes` then `no`.
        choices: Vec<ChoiceResult>,
    },
    #[serde(rename_all = "camelCase")]
    Rating {
        rating_options: RatingBounds,
        /// One bucket per distinct rating given, lowest first.
        distribution: Vec<RatingBucket>,
        average_rating: f64,
        total_votes: u64,
    },
    ImageBased {
        /// Every current image option, most votes first.
        images: Vec<ImageResult>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CandidateResult {
    pub option_id: ApiId,
    pub candidate_id: ApiId,
    pub display_name: String,
    pub display_image: Option<String>,
    pub votes: u64,
}

impl CandidateResult {
    pub fn new(candidate: &CandidateOption, votes: u64) -> Self {
        Self {
            option_id: candidate.option_id.into(),
            candidate_id: candidate.candidate_id.into(),
            display_name: candidate.display_name.clone(),
            display_image: candidate.display_image.clone(),
            votes,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ChoiceResult {
    pub choice: Choice,
    pub votes: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RatingBucket {
    pub rating: f64,
    pub votes: u64,
}

/// Rating scale, as shown to API callers.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RatingBounds {
    pub min: f64,
    pub max: f64,
    pub label_min: String,
    pub label_max: String,
}

impl From<&RatingOptions> for RatingBounds {
    fn from(options: &RatingOptions) -> Self {
        Self {
            min: options.min,
            max: options.max,
            label_min: options.label_min.clone(),
            label_max: options.label_max.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageResult {
    pub option_id: ApiId,
    pub image_url: String,
    pub label: Option<String>,
    pub votes: u64,
}

impl ImageResult {
    pub fn new(image: &ImageOption, votes: u64) -> Self {
        Self {
            option_id: image.option_id.into(),
            image_url: image.image_url.clone(),
            label: image.label.clone(),
            votes,
        }
    }
}
