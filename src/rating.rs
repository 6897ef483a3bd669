// Elo rating for two-swarm games, and rating-aware opponent pairing.
//
// A game's outcome is decided by the swarms' final points; both brains are
// then updated with a fixed K-factor. New brains that pass qualification
// enter at STARTING_ELO.

use rand::distributions::{Distribution, WeightedIndex};
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::protocol::Standing;

pub const STARTING_ELO: i32 = 1200;

const K_FACTOR: f64 = 32.0;

/// Spread of the pairing weight: opponents about 45 points apart are
/// weighted ~0.6, 100 points apart ~0.08.
const PAIRING_SPREAD: f64 = 2000.0;

/// Game outcome from the perspective of one swarm.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Outcome {
    Win,
    Draw,
    Loss,
}

impl Outcome {
    pub fn score(self) -> f64 {
        match self {
            Outcome::Win => 1.0,
            Outcome::Draw => 0.5,
            Outcome::Loss => 0.0,
        }
    }

    /// Outcome for the swarm that scored `points` against `opponent_points`.
    pub fn from_points(points: i64, opponent_points: i64) -> Self {
        match points.cmp(&opponent_points) {
            std::cmp::Ordering::Greater => Outcome::Win,
            std::cmp::Ordering::Equal => Outcome::Draw,
            std::cmp::Ordering::Less => Outcome::Loss,
        }
    }
}

/// One side of a rated game.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Contender {
    pub rating: i32,
    pub points: i64,
}

/// Calculate expected score for player A against player B.
pub fn expected_score(rating_a: i32, rating_b: i32) -> f64 {
    1.0 / (1.0 + 10.0_f64.powf((rating_b as f64 - rating_a as f64) / 400.0))
}

/// Calculate new rating after a game.
pub fn calculate_new_rating(rating: i32, opponent_rating: i32, outcome: Outcome) -> i32 {
    let expected = expected_score(rating, opponent_rating);
    (rating as f64 + K_FACTOR * (outcome.score() - expected)).round() as i32
}

/// New ratings of both sides after a game.
pub fn rate_game(a: Contender, b: Contender) -> (i32, i32) {
    (
        calculate_new_rating(a.rating, b.rating, Outcome::from_points(a.points, b.points)),
        calculate_new_rating(b.rating, a.rating, Outcome::from_points(b.points, a.points)),
    )
}

/// Final score of `swarm_id` in a set of standings.
pub fn final_points(standings: &[Standing], swarm_id: &str) -> Option<i64> {
    standings
        .iter()
        .find(|s| s.swarm_id == swarm_id)
        .map(|s| s.score)
}

/// How strongly two brains should be paired: 1.0 for equal ratings,
/// falling off as a Gaussian of the rating difference.
pub fn pairing_weight(rating: i32, other: i32) -> f64 {
    let dist = other as f64 - rating as f64;
    (-(dist * dist) / PAIRING_SPREAD).exp()
}

/// Pick an opponent for a brain rated `rating`, favouring close ratings.
///
/// Returns the index into `candidates`. If every weight underflows to zero,
/// the closest-rated candidate is chosen.
pub fn pick_opponent<R: Rng + ?Sized>(rng: &mut R, rating: i32, candidates: &[i32]) -> Option<usize> {
    if candidates.is_empty() {
        return None;
    }
    let weights = candidates.iter().map(|&other| pairing_weight(rating, other));
    match WeightedIndex::new(weights) {
        Ok(dist) => Some(dist.sample(rng)),
        Err(_) => candidates
            .iter()
            .enumerate()
            .min_by_key(|(_, &other)| other.abs_diff(rating))
            .map(|(i, _)| i),
    }
}
