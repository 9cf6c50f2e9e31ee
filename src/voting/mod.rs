//! The voting engine: eligibility, casting, tallying and the clean-up paths
//! that keep the vote ledger consistent with the elections it refers to.
//!
//! Every operation takes the current time explicitly so the time-dependent
//! rules (the voting window) stay deterministic under test.

mod cascade;
mod casting;
mod eligibility;
mod history;
mod tally;
pub mod validator;

pub use cascade::delete_election;
pub use casting::cast_vote;
pub use eligibility::check_eligibility;
pub use history::{voting_history, VotingHistory};
pub use tally::{compute_results, merge_counts};
