//! Live results, computed from the ledger on every request.

use std::collections::HashMap;

use crate::error::Result;
use crate::model::{
    api::results::{
        CandidateResult, ChoiceResult, ElectionResults, ImageResult, RatingBounds, RatingBucket,
    },
    common::{
        ballot::{Ballot, Choice},
        options::ElectionOptions,
    },
    db::{election::Election, vote::BallotCount},
    mongodb::Id,
};
use crate::store::Stores;

use super::eligibility::load_election;

/// Compute the current results of an election. Never writes.
pub async fn compute_results(stores: &Stores, election_id: Id) -> Result<ElectionResults> {
    let election = load_election(stores, election_id).await?;
    let counts = stores.ledger.tally(election_id).await?;
    Ok(merge_counts(&election, &counts))
}

/// Merge grouped ledger counts onto the election's current options.
///
/// Options without votes appear with zero; votes for options that have since
/// been removed are not shown. Ballots of another type are ignored.
pub fn merge_counts(election: &Election, counts: &[BallotCount]) -> ElectionResults {
    match &election.options {
        ElectionOptions::CandidateBased { candidates } => {
            let by_candidate = counts_by_id(counts, |ballot| match ballot {
                Ballot::CandidateBased { candidate_id } => Some(*candidate_id),
                _ => None,
            });
            let mut candidates = candidates
                .iter()
                .map(|c| CandidateResult::new(c, votes_for(&by_candidate, c.candidate_id)))
                .collect::<Vec<_>>();
            // Stable, so ties keep the election's candidate order.
            candidates.sort_by(|a, b| b.votes.cmp(&a.votes));
            ElectionResults::CandidateBased { candidates }
        }
        ElectionOptions::YesNo { proposition } => {
            let votes_for_choice = |choice: Choice| {
                counts
                    .iter()
                    .filter(|count| count.ballot == Ballot::YesNo { choice })
                    .map(|count| count.votes)
                    .sum::<u64>()
            };
            ElectionResults::YesNo {
                proposition: proposition.clone(),
                choices: vec![
                    ChoiceResult {
                        choice: Choice::Yes,
                        votes: votes_for_choice(Choice::Yes),
                    },
                    ChoiceResult {
                        choice: Choice::No,
                        votes: votes_for_choice(Choice::No),
                    },
                ],
            }
        }
        ElectionOptions::Rating { rating_options } => {
            let mut distribution: Vec<RatingBucket> = Vec::new();
            for count in counts {
                let Ballot::Rating { rating_value } = count.ballot else {
                    continue;
                };
                match distribution.iter_mut().find(|b| b.rating == rating_value) {
                    Some(bucket) => bucket.votes += count.votes,
                    None => distribution.push(RatingBucket {
                        rating: rating_value,
                        votes: count.votes,
                    }),
                }
            }
            distribution.sort_by(|a, b| a.rating.total_cmp(&b.rating));

            let total_votes = distribution.iter().map(|b| b.votes).sum::<u64>();
            let total_score = distribution
                .iter()
                .map(|b| b.rating * b.votes as f64)
                .sum::<f64>();
            let average_rating = if total_votes == 0 {
                0.0
            } else {
                round_to_hundredths(total_score / total_votes as f64)
            };
            ElectionResults::Rating {
                rating_options: RatingBounds::from(rating_options),
                distribution,
                average_rating,
                total_votes,
            }
        }
        ElectionOptions::ImageBased { images } => {
            let by_option = counts_by_id(counts, |ballot| match ballot {
                Ballot::ImageBased { selected_option_id } => Some(*selected_option_id),
                _ => None,
            });
            let mut images = images
                .iter()
                .map(|i| ImageResult::new(i, votes_for(&by_option, i.option_id)))
                .collect::<Vec<_>>();
            images.sort_by(|a, b| b.votes.cmp(&a.votes));
            ElectionResults::ImageBased { images }
        }
    }
}

fn counts_by_id(counts: &[BallotCount], key: impl Fn(&Ballot) -> Option<Id>) -> HashMap<Id, u64> {
    let mut by_id = HashMap::new();
    for count in counts {
        if let Some(id) = key(&count.ballot) {
            *by_id.entry(id).or_insert(0) += count.votes;
        }
    }
    by_id
}

fn votes_for(by_id: &HashMap<Id, u64>, id: Id) -> u64 {
    by_id.get(&id).copied().unwrap_or(0)
}

fn round_to_hundredths(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;
    use crate::model::{api::ballot::BallotSpec, db::election::ElectionCore};
    use crate::store::memory::MemoryStore;
    use crate::voting::cast_vote;

    async fn cast_all(store: &MemoryStore, election: &Election, ballots: Vec<BallotSpec>) {
        for ballot in ballots {
            cast_vote(&store.stores(), election.id, Id::new(), &ballot, Utc::now())
                .await
                .unwrap();
        }
    }

    #[backend_test]
    async fn untouched_candidates_are_zero_filled_in_order(store: MemoryStore) {
        let stores = store.stores();
        let election = stores
            .elections
            .insert(ElectionCore::candidate_example())
            .await
            .unwrap();

        let ElectionResults::CandidateBased { candidates } =
            compute_results(&stores, election.id).await.unwrap()
        else {
            panic!("wrong result shape");
        };
        let names = candidates
            .iter()
            .map(|c| (c.display_name.as_str(), c.votes))
            .collect::<Vec<_>>();
        assert_eq!(
            names,
            vec![("Anna Lindqvist", 0), ("Bram Okafor", 0), ("Chidi Mensah", 0)]
        );
    }

    #[backend_test]
    async fn candidates_sort_by_votes_with_stable_ties(store: MemoryStore) {
        let stores = store.stores();
        let election = stores
            .elections
            .insert(ElectionCore::candidate_example())
            .await
            .unwrap();
        let ElectionOptions::CandidateBased { candidates } = &election.options else {
            unreachable!()
        };
        let [anna, bram, chidi] = [0, 1, 2].map(|i| candidates[i].candidate_id);
        cast_all(
            &store,
            &election,
            vec![
                BallotSpec::candidate(bram),
                BallotSpec::candidate(chidi),
                BallotSpec::candidate(anna),
                BallotSpec::candidate(chidi),
            ],
        )
        .await;

        let ElectionResults::CandidateBased { candidates } =
            compute_results(&stores, election.id).await.unwrap()
        else {
            panic!("wrong result shape");
        };
        let order = candidates
            .iter()
            .map(|c| (Id::from(c.candidate_id), c.votes))
            .collect::<Vec<_>>();
        assert_eq!(order, vec![(chidi, 2), (anna, 1), (bram, 1)]);
    }

    #[backend_test]
    async fn yes_no_scenario(store: MemoryStore) {
        let stores = store.stores();
        let election = stores
            .elections
            .insert(ElectionCore::yes_no_example())
            .await
            .unwrap();
        cast_all(
            &store,
            &election,
            vec![
                BallotSpec::choice("yes"),
                BallotSpec::choice("no"),
                BallotSpec::choice("yes"),
            ],
        )
        .await;

        let results = compute_results(&stores, election.id).await.unwrap();
        assert_eq!(
            results,
            ElectionResults::YesNo {
                proposition: "Should the library stay open until midnight?".to_string(),
                choices: vec![
                    ChoiceResult {
                        choice: Choice::Yes,
                        votes: 2
                    },
                    ChoiceResult {
                        choice: Choice::No,
                        votes: 1
                    },
                ],
            }
        );
    }

    #[backend_test]
    async fn rating_scenario(store: MemoryStore) {
        let stores = store.stores();
        let election = stores
            .elections
            .insert(ElectionCore::rating_example())
            .await
            .unwrap();
        cast_all(
            &store,
            &election,
            [3.0, 5.0, 5.0, 1.0].map(BallotSpec::rating).to_vec(),
        )
        .await;

        let ElectionResults::Rating {
            rating_options,
            distribution,
            average_rating,
            total_votes,
        } = compute_results(&stores, election.id).await.unwrap()
        else {
            panic!("wrong result shape");
        };
        assert_eq!(
            distribution,
            vec![
                RatingBucket {
                    rating: 1.0,
                    votes: 1
                },
                RatingBucket {
                    rating: 3.0,
                    votes: 1
                },
                RatingBucket {
                    rating: 5.0,
                    votes: 2
                },
            ]
        );
        assert_eq!(average_rating, 3.5);
        assert_eq!(total_votes, 4);
        assert_eq!(rating_options.label_max, "Excellent");
    }

    #[backend_test]
    async fn results_are_repeatable(store: MemoryStore) {
        let stores = store.stores();
        let election = stores
            .elections
            .insert(ElectionCore::image_example())
            .await
            .unwrap();
        let ElectionOptions::ImageBased { images } = &election.options else {
            unreachable!()
        };
        cast_all(
            &store,
            &election,
            vec![
                BallotSpec::image(images[2].option_id),
                BallotSpec::image(&images[2].image_url),
                BallotSpec::image(images[0].option_id),
            ],
        )
        .await;

        let first = compute_results(&stores, election.id).await.unwrap();
        let second = compute_results(&stores, election.id).await.unwrap();
        assert_eq!(first, second);

        let ElectionResults::ImageBased { images: results } = first else {
            panic!("wrong result shape");
        };
        let votes = results.iter().map(|i| i.votes).collect::<Vec<_>>();
        assert_eq!(votes, vec![2, 1, 0]);
        assert_eq!(results[0].label.as_deref(), Some("meadow"));
    }

    #[test]
    fn empty_rating_averages_zero() {
        let election = Election {
            id: Id::new(),
            election: ElectionCore::rating_example(),
        };
        let ElectionResults::Rating {
            average_rating,
            total_votes,
            distribution,
            ..
        } = merge_counts(&election, &[])
        else {
            panic!("wrong result shape");
        };
        assert_eq!(average_rating, 0.0);
        assert_eq!(total_votes, 0);
        assert!(distribution.is_empty());
    }

    #[test]
    fn averages_round_to_two_places() {
        let election = Election {
            id: Id::new(),
            election: ElectionCore::rating_example(),
        };
        let counts = [(1.0, 1), (2.0, 2)]
            .map(|(rating_value, votes)| BallotCount {
                ballot: Ballot::Rating { rating_value },
                votes,
            });
        let ElectionResults::Rating { average_rating, .. } = merge_counts(&election, &counts)
        else {
            panic!("wrong result shape");
        };
        assert_eq!(average_rating, 1.67);
    }

    #[test]
    fn removed_options_drop_out_of_results() {
        let mut election = Election {
            id: Id::new(),
            election: ElectionCore::image_example(),
        };
        let ElectionOptions::ImageBased { images } = &election.options else {
            unreachable!()
        };
        let removed = images[0].option_id;
        let counts = [BallotCount {
            ballot: Ballot::ImageBased {
                selected_option_id: removed,
            },
            votes: 4,
        }];
        election.options.remove_option(removed);

        let ElectionResults::ImageBased { images } = merge_counts(&election, &counts) else {
            panic!("wrong result shape");
        };
        assert_eq!(images.len(), 2);
        assert!(images.iter().all(|i| i.votes == 0));
    }
}
