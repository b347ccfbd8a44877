//! Weighted candidate score model.
//!
//! A person's fitness for an issue is the weighted sum of four components,
//! each in [0,1]:
//!
//! | component     | value                                             |
//! |---------------|---------------------------------------------------|
//! | participation | `min(past_decisions / 50, 1)`                     |
//! | domain        | mean tag strength, `0.1` for unknown tags         |
//! | tree          | `exp(-0.5 * org_distance(person, owner))`         |
//! | load          | `1 - current_load`                                |

use crate::domain::{Person, ScoreBreakdown};

/// Weights and constants of the score model.
///
/// The weights sum to 1.0, so a score stays in [0,1] whenever its
/// components do.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoreModel {
    pub participation_weight: f64,
    pub domain_weight: f64,
    pub tree_weight: f64,
    pub load_weight: f64,
    /// Past decisions at which participation credit saturates.
    pub participation_cap: f64,
    /// Strength assumed for an issue tag the person has no record for.
    pub domain_baseline: f64,
    /// Exponential decay per org-tree edge.
    pub tree_decay: f64,
}

impl ScoreModel {
    pub const STANDARD: ScoreModel = ScoreModel {
        participation_weight: 0.45,
        domain_weight: 0.30,
        tree_weight: 0.15,
        load_weight: 0.10,
        participation_cap: 50.0,
        domain_baseline: 0.1,
        tree_decay: 0.5,
    };

    pub fn participation(&self, past_decisions: u32) -> f64 {
        (f64::from(past_decisions) / self.participation_cap).min(1.0)
    }

    pub fn domain(&self, person: &Person, tags: &[String]) -> f64 {
        if tags.is_empty() {
            return self.domain_baseline;
        }
        let total: f64 = tags
            .iter()
            .map(|tag| person.strength(tag).unwrap_or(self.domain_baseline))
            .sum();
        clamp_unit(total / tags.len() as f64)
    }

    pub fn tree(&self, person_path: &str, owner_path: &str) -> f64 {
        (-self.tree_decay * org_distance(person_path, owner_path) as f64).exp()
    }

    pub fn load(&self, current_load: f64) -> f64 {
        1.0 - clamp_unit(current_load)
    }

    /// All four components for `person` against an issue's tags.
    pub fn breakdown(&self, person: &Person, tags: &[String], owner_path: &str) -> ScoreBreakdown {
        ScoreBreakdown {
            participation: self.participation(person.past_decisions_count),
            domain: self.domain(person, tags),
            tree: self.tree(&person.org_path, owner_path),
            load: self.load(person.current_load),
        }
    }

    /// Weighted sum of a breakdown.
    pub fn combine(&self, b: &ScoreBreakdown) -> f64 {
        self.participation_weight * b.participation
            + self.domain_weight * b.domain
            + self.tree_weight * b.tree
            + self.load_weight * b.load
    }
}

impl Default for ScoreModel {
    fn default() -> Self {
        Self::STANDARD
    }
}

/// Score `person` for an issue with `tags`, owned by `owner_path`.
pub fn score(person: &Person, tags: &[String], owner_path: &str) -> (f64, ScoreBreakdown) {
    let model = ScoreModel::STANDARD;
    let breakdown = model.breakdown(person, tags, owner_path);
    (model.combine(&breakdown), breakdown)
}

/// Tree-edge distance between two org paths via their nearest common ancestor.
///
/// Paths are split on `/` with empty segments ignored, so `/A/B` and `A/B/`
/// are the same node.
pub fn org_distance(a: &str, b: &str) -> usize {
    let parts_a: Vec<&str> = a.split('/').filter(|s| !s.is_empty()).collect();
    let parts_b: Vec<&str> = b.split('/').filter(|s| !s.is_empty()).collect();
    let common = parts_a
        .iter()
        .zip(parts_b.iter())
        .take_while(|(x, y)| x == y)
        .count();
    (parts_a.len() - common) + (parts_b.len() - common)
}

fn clamp_unit(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}
