use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};

use crate::model::mongodb::Id;

/// The four supported kinds of election.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ElectionType {
    CandidateBased,
    YesNo,
    Rating,
    ImageBased,
}

impl Display for ElectionType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::CandidateBased => "candidate-based",
            Self::YesNo => "yes-no",
            Self::Rating => "rating",
            Self::ImageBased => "image-based",
        };
        write!(f, "{name}")
    }
}

/// The votable options of an election. The variant is the election type, so
/// an election can never carry an option set belonging to another type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "election_type", rename_all = "kebab-case")]
pub enum ElectionOptions {
    CandidateBased { candidates: Vec<CandidateOption> },
    YesNo { proposition: String },
    Rating { rating_options: RatingOptions },
    ImageBased { images: Vec<ImageOption> },
}

impl ElectionOptions {
    pub fn election_type(&self) -> ElectionType {
        match self {
            Self::CandidateBased { .. } => ElectionType::CandidateBased,
            Self::YesNo { .. } => ElectionType::YesNo,
            Self::Rating { .. } => ElectionType::Rating,
            Self::ImageBased { .. } => ElectionType::ImageBased,
        }
    }

    /// Find a participating candidate by their candidate (user) ID.
    pub fn candidate(&self, candidate_id: Id) -> Option<&CandidateOption> {
        match self {
            Self::CandidateBased { candidates } => {
                candidates.iter().find(|c| c.candidate_id == candidate_id)
            }
            _ => None,
        }
    }

    /// Find an image option by its canonical option ID.
    pub fn image(&self, option_id: Id) -> Option<&ImageOption> {
        match self {
            Self::ImageBased { images } => images.iter().find(|i| i.option_id == option_id),
            _ => None,
        }
    }

    /// Resolve a voter-supplied image selector: an option ID, or failing
    /// that, the option's image URL.
    pub fn image_by_selector(&self, selector: &str) -> Option<&ImageOption> {
        if let Ok(option_id) = selector.parse::<Id>() {
            if let Some(image) = self.image(option_id) {
                return Some(image);
            }
        }
        match self {
            Self::ImageBased { images } => images.iter().find(|i| i.image_url == selector),
            _ => None,
        }
    }

    /// Remove the candidate or image option with the given option ID.
    /// Returns true iff something was removed.
    pub fn remove_option(&mut self, option_id: Id) -> bool {
        match self {
            Self::CandidateBased { candidates } => {
                let before = candidates.len();
                candidates.retain(|c| c.option_id != option_id);
                candidates.len() != before
            }
            Self::ImageBased { images } => {
                let before = images.len();
                images.retain(|i| i.option_id != option_id);
                images.len() != before
            }
            Self::YesNo { .. } | Self::Rating { .. } => false,
        }
    }
}

/// A candidate standing in a candidate-based election.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateOption {
    /// ID of this entry in the election's option list.
    pub option_id: Id,
    /// The user standing as candidate. Ballots reference this.
    pub candidate_id: Id,
    pub display_name: String,
    pub display_image: Option<String>,
}

/// An option in an image-based election.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageOption {
    /// Canonical option ID. Ballots reference this.
    pub option_id: Id,
    pub image_url: String,
    pub label: Option<String>,
}

/// Bounds and labels of a rating election.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RatingOptions {
    #[serde(default = "RatingOptions::default_min")]
    pub min: f64,
    #[serde(default = "RatingOptions::default_max")]
    pub max: f64,
    #[serde(default = "RatingOptions::default_label_min")]
    pub label_min: String,
    #[serde(default = "RatingOptions::default_label_max")]
    pub label_max: String,
}

impl RatingOptions {
    fn default_min() -> f64 {
        1.0
    }

    fn default_max() -> f64 {
        5.0
    }

    fn default_label_min() -> String {
        "Poor".to_string()
    }

    fn default_label_max() -> String {
        "Excellent".to_string()
    }

    /// Is the value within the inclusive bounds?
    pub fn accepts(&self, value: f64) -> bool {
        value >= self.min && value <= self.max
    }
}

impl Default for RatingOptions {
    fn default() -> Self {
        Self {
            min: Self::default_min(),
            max: Self::default_max(),
            label_min: Self::default_label_min(),
            label_max: Self::default_label_max(),
        }
    }
}
