//! Candidates for a decision: scored people from offline ranking, and the
//! partial candidate records streamed by the backend.

use serde::{Deserialize, Serialize};

use super::person::Person;

/// The four weighted components behind a candidate's score, each in [0,1].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    pub participation: f64,
    pub domain: f64,
    pub tree: f64,
    pub load: f64,
}

/// A person scored against an issue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    #[serde(flatten)]
    pub person: Person,
    pub score: f64,
    pub score_breakdown: ScoreBreakdown,
    pub reason: String,
}

impl Candidate {
    /// Project into the canonical live-candidate shape.
    pub fn to_routing(&self) -> RoutingCandidate {
        RoutingCandidate {
            id: self.person.id.clone(),
            name: Some(self.person.name.clone()),
            role: Some(self.person.role.clone()),
            level: Some(self.person.seniority_level.to_string()),
            team: None,
            department: self.person.department().map(str::to_string),
            org_path: Some(self.person.org_path.clone()),
            score: Some(self.score),
            reason: Some(self.reason.clone()),
            source: None,
        }
    }
}

/// Which pipeline stage reported a candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CandidateSource {
    Graph,
    Vector,
    Owner,
    Meeting,
    Reference,
}

/// A candidate as reported over the decision stream.
///
/// Everything but `id` is optional: each pipeline stage fills in what it
/// knows, and later reports are merged onto earlier ones with
/// [`RoutingCandidate::merge_from`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RoutingCandidate {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub level: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub team: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub department: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub org_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<CandidateSource>,
}

impl RoutingCandidate {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Default::default()
        }
    }

    /// Display name, falling back to the id.
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.id)
    }

    /// Field-level last-write-wins: every field present on `newer` replaces
    /// ours, absent fields leave ours untouched.
    pub fn merge_from(&mut self, newer: &RoutingCandidate) {
        fn take<T: Clone>(slot: &mut Option<T>, newer: &Option<T>) {
            if newer.is_some() {
                slot.clone_from(newer);
            }
        }
        take(&mut self.name, &newer.name);
        take(&mut self.role, &newer.role);
        take(&mut self.level, &newer.level);
        take(&mut self.team, &newer.team);
        take(&mut self.department, &newer.department);
        take(&mut self.org_path, &newer.org_path);
        take(&mut self.score, &newer.score);
        take(&mut self.reason, &newer.reason);
        take(&mut self.source, &newer.source);
    }
}

/// Merge `incoming` into `existing` keyed by id.
///
/// Known ids are merged in place (keeping their position); new ids are
/// appended in arrival order. Merging the same batch twice is a no-op the
/// second time.
pub fn merge_candidates(existing: &mut Vec<RoutingCandidate>, incoming: &[RoutingCandidate]) {
    for candidate in incoming {
        match existing.iter_mut().find(|c| c.id == candidate.id) {
            Some(current) => current.merge_from(candidate),
            None => existing.push(candidate.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn partial(id: &str, name: Option<&str>, score: Option<f64>) -> RoutingCandidate {
        RoutingCandidate {
            id: id.to_string(),
            name: name.map(str::to_string),
            score,
            ..Default::default()
        }
    }

    #[test]
    fn absent_fields_do_not_erase() {
        let mut current = RoutingCandidate {
            team: Some("Platform".to_string()),
            ..partial("p-1", Some("Kim"), None)
        };
        current.merge_from(&partial("p-1", None, Some(0.7)));
        assert_eq!(current.name.as_deref(), Some("Kim"));
        assert_eq!(current.team.as_deref(), Some("Platform"));
        assert_eq!(current.score, Some(0.7));
    }

    #[test]
    fn later_fields_win() {
        let mut current = partial("p-1", Some("Kim"), Some(0.2));
        current.merge_from(&partial("p-1", Some("Kim Lee"), Some(0.9)));
        assert_eq!(current.name.as_deref(), Some("Kim Lee"));
        assert_eq!(current.score, Some(0.9));
    }

    #[test]
    fn merge_appends_new_ids_in_order() {
        let mut set = vec![partial("a", Some("A"), None)];
        merge_candidates(
            &mut set,
            &[partial("b", Some("B"), None), partial("a", None, Some(0.5))],
        );
        let ids: Vec<_> = set.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b"]);
        assert_eq!(set[0].score, Some(0.5));
    }

    #[test]
    fn merge_is_idempotent() {
        let batch = vec![partial("a", Some("A"), Some(0.1)), partial("b", None, Some(0.4))];
        let mut once = vec![partial("a", None, None)];
        merge_candidates(&mut once, &batch);
        let mut twice = once.clone();
        merge_candidates(&mut twice, &batch);
        assert_eq!(once, twice);
    }

    #[test]
    fn display_name_falls_back_to_id() {
        assert_eq!(partial("p-7", None, None).display_name(), "p-7");
    }
}
