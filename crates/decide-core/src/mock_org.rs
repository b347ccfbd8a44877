//! Deterministic mock organization used for offline ranking and as a
//! fallback graph when the backend is unreachable.

use std::collections::BTreeMap;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::domain::{DecisionStyle, Person, RiskTolerance, SeniorityLevel};
use crate::graph::{Graph, GraphEdge, GraphNode};

pub const DEPARTMENTS: [&str; 9] = [
    "Engineering",
    "Product",
    "Security",
    "Legal",
    "Finance",
    "Sales",
    "Operations",
    "HR",
    "Data",
];

pub const ROLES: [&str; 9] = [
    "Software Engineer",
    "Product Manager",
    "Security Engineer",
    "Legal Counsel",
    "Finance Analyst",
    "Sales Rep",
    "Ops Manager",
    "HR BP",
    "Data Scientist",
];

const NAMES: [&str; 20] = [
    "Kim", "Lee", "Park", "Choi", "Jung", "Kang", "Jo", "Yoon", "Jang", "Lim", "Han", "Oh", "Seo",
    "Shin", "Kwon", "Hwang", "Ahn", "Song", "Jeon", "Hong",
];

const REGIONS: [&str; 3] = ["KR", "US", "EU"];
const LOCATIONS: [&str; 4] = ["Seoul", "New York", "London", "Singapore"];
const TOPICS: [&str; 4] = ["privacy", "security", "finance", "tech"];

const PROJECT_COUNT: usize = 50;

/// A co-working relationship between two people.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrgEdge {
    pub source: String,
    pub target: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub weight: f64,
}

/// Generated people plus their project edges.
#[derive(Debug, Clone)]
pub struct MockOrg {
    pub people: Vec<Person>,
    pub edges: Vec<OrgEdge>,
}

impl MockOrg {
    pub const DEFAULT_SIZE: usize = 1200;
    pub const DEFAULT_SEED: u64 = 12345;

    /// Generate `count` people and project cliques from `seed`.
    ///
    /// Same seed and count always produce the same organization.
    pub fn generate(count: usize, seed: u64) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        let people: Vec<Person> = (0..count).map(|i| generate_person(&mut rng, i)).collect();
        let edges = generate_edges(&mut rng, &people);
        tracing::debug!(people = people.len(), edges = edges.len(), "mock organization generated");
        MockOrg { people, edges }
    }

    /// Graph view: one node per person, one edge per project link.
    pub fn to_graph(&self) -> Graph {
        let nodes = self
            .people
            .iter()
            .map(|p| GraphNode {
                id: p.id.clone(),
                name: p.name.clone(),
                node_type: Some("person".to_string()),
                department: p.department().map(str::to_string),
                properties: Default::default(),
            })
            .collect();
        let edges = self
            .edges
            .iter()
            .map(|e| GraphEdge {
                source: e.source.clone(),
                target: e.target.clone(),
                edge_type: Some(e.kind.clone()),
                properties: Default::default(),
            })
            .collect();
        Graph::normalize(nodes, edges)
    }
}

impl Default for MockOrg {
    fn default() -> Self {
        Self::generate(Self::DEFAULT_SIZE, Self::DEFAULT_SEED)
    }
}

fn pick<'a, R: Rng>(rng: &mut R, items: &[&'a str]) -> &'a str {
    items[rng.gen_range(0..items.len())]
}

fn generate_person(rng: &mut StdRng, index: usize) -> Person {
    let dept = pick(rng, &DEPARTMENTS);
    let role = pick(rng, &ROLES);
    let level = if rng.gen::<f64>() > 0.9 {
        SeniorityLevel::D1
    } else if rng.gen::<f64>() > 0.7 {
        SeniorityLevel::M1
    } else {
        SeniorityLevel::IC3
    };
    let name = format!("{} {}", pick(rng, &NAMES), pick(rng, &NAMES));
    let region = pick(rng, &REGIONS);
    let location = pick(rng, &LOCATIONS).to_string();
    let years_experience = rng.gen_range(1..=20);
    let domain_strength: BTreeMap<String, f64> = TOPICS
        .iter()
        .map(|topic| (topic.to_string(), rng.gen::<f64>()))
        .collect();
    let risk_tolerance = match rng.gen_range(0..3) {
        0 => RiskTolerance::Low,
        1 => RiskTolerance::Med,
        _ => RiskTolerance::High,
    };
    let decision_style = match rng.gen_range(0..3) {
        0 => DecisionStyle::Fast,
        1 => DecisionStyle::Balanced,
        _ => DecisionStyle::Conservative,
    };

    Person {
        id: format!("p-{}", index),
        name,
        role: format!("{} {}", level, role),
        org_path: format!("/{}/{}/{}", dept, region, role),
        location,
        seniority_level: level,
        years_experience,
        domain_strength,
        risk_tolerance,
        decision_style,
        past_decisions_count: rng.gen_range(0..=50),
        latency_profile_ms: rng.gen_range(100..=5000),
        current_load: rng.gen::<f64>(),
    }
}

/// Project cliques: each project draws 5..=12 members (with repeats) and
/// links each ordered pair of distinct members with probability 1/2.
fn generate_edges(rng: &mut StdRng, people: &[Person]) -> Vec<OrgEdge> {
    let mut edges = Vec::new();
    if people.is_empty() {
        return edges;
    }
    for _ in 0..PROJECT_COUNT {
        let team_size = rng.gen_range(5..=12);
        let team: Vec<&str> = (0..team_size)
            .map(|_| people[rng.gen_range(0..people.len())].id.as_str())
            .collect();
        for s in &team {
            for t in &team {
                if s != t && rng.gen::<f64>() > 0.5 {
                    edges.push(OrgEdge {
                        source: s.to_string(),
                        target: t.to_string(),
                        kind: "project".to_string(),
                        weight: rng.gen::<f64>(),
                    });
                }
            }
        }
    }
    edges
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generation_is_deterministic() {
        let a = MockOrg::generate(50, 99);
        let b = MockOrg::generate(50, 99);
        assert_eq!(a.people, b.people);
        assert_eq!(a.edges, b.edges);
    }

    #[test]
    fn people_fields_are_in_range() {
        let org = MockOrg::generate(300, MockOrg::DEFAULT_SEED);
        assert_eq!(org.people.len(), 300);
        for (i, p) in org.people.iter().enumerate() {
            assert_eq!(p.id, format!("p-{}", i));
            assert!(p.past_decisions_count <= 50);
            assert!((0.0..1.0).contains(&p.current_load));
            assert_eq!(p.org_path.split('/').filter(|s| !s.is_empty()).count(), 3);
            assert_eq!(p.domain_strength.len(), TOPICS.len());
        }
    }

    #[test]
    fn edges_reference_known_people_and_no_self_loops() {
        let org = MockOrg::generate(120, 5);
        assert!(!org.edges.is_empty());
        for e in &org.edges {
            assert_ne!(e.source, e.target);
            assert!(org.people.iter().any(|p| p.id == e.source));
            assert!(org.people.iter().any(|p| p.id == e.target));
        }
    }

    #[test]
    fn graph_view_keeps_every_edge() {
        let org = MockOrg::generate(40, 3);
        let graph = org.to_graph();
        assert_eq!(graph.nodes.len(), 40);
        assert_eq!(graph.edges.len(), org.edges.len());
    }

    #[test]
    fn empty_org_has_no_edges() {
        let org = MockOrg::generate(0, 1);
        assert!(org.people.is_empty());
        assert!(org.edges.is_empty());
    }
}
