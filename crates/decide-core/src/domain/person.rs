//! People in the organization and the pieces of their profile the scorer reads.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Seniority ladder used by the organization directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SeniorityLevel {
    IC1,
    IC2,
    IC3,
    IC4,
    IC5,
    IC6,
    M1,
    M2,
    D1,
    VP,
}

impl std::fmt::Display for SeniorityLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            SeniorityLevel::IC1 => "IC1",
            SeniorityLevel::IC2 => "IC2",
            SeniorityLevel::IC3 => "IC3",
            SeniorityLevel::IC4 => "IC4",
            SeniorityLevel::IC5 => "IC5",
            SeniorityLevel::IC6 => "IC6",
            SeniorityLevel::M1 => "M1",
            SeniorityLevel::M2 => "M2",
            SeniorityLevel::D1 => "D1",
            SeniorityLevel::VP => "VP",
        };
        write!(f, "{}", s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskTolerance {
    Low,
    Med,
    High,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DecisionStyle {
    Fast,
    Balanced,
    Conservative,
}

/// A member of the organization.
///
/// `org_path` is the slash-delimited position in the hierarchy
/// (`/Product/KR/Product Manager`). `domain_strength` maps topic tags to a
/// 0..1 strength, and `current_load` is the fraction of capacity in use.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Person {
    pub id: String,
    pub name: String,
    pub role: String,
    pub org_path: String,
    pub location: String,
    pub seniority_level: SeniorityLevel,
    pub years_experience: u32,
    pub domain_strength: BTreeMap<String, f64>,
    pub risk_tolerance: RiskTolerance,
    pub decision_style: DecisionStyle,
    pub past_decisions_count: u32,
    pub latency_profile_ms: u32,
    pub current_load: f64,
}

impl Person {
    /// Department segment of the org path (first non-empty segment).
    pub fn department(&self) -> Option<&str> {
        self.org_path.split('/').find(|s| !s.is_empty())
    }

    /// Strength for a topic tag, if the person has one recorded.
    pub fn strength(&self, tag: &str) -> Option<f64> {
        self.domain_strength.get(tag).copied()
    }
}
