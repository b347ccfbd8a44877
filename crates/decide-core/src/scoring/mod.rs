//! Candidate scoring and ranking.
//!
//! - [`model`]: `ScoreModel`, `score`, `org_distance`
//! - [`ranking`]: `rank`, `score_pool`, `owner_org_path`, `RoutingResult`

pub mod model;
pub mod ranking;

pub use model::{org_distance, score, ScoreModel};
pub use ranking::{
    owner_org_path, rank, score_pool, RoutingResult, CANDIDATE_LIMIT, DECISION_SET_SIZE,
};
