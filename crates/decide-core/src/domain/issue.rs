//! Issues submitted for routing, and the listing view of prior issues.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

use super::error::IntakeError;

/// How quickly a decision is needed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Urgency {
    #[default]
    Low,
    Mid,
    High,
}

impl Urgency {
    /// Normalize a free-form backend value (`high`, `MEDIUM`, `Mid`, ...).
    ///
    /// Unknown or missing values read as [`Urgency::Low`].
    pub fn normalize(value: Option<&str>) -> Self {
        let Some(value) = value else {
            return Urgency::Low;
        };
        let upper = value.to_ascii_uppercase();
        if upper.contains("HIGH") {
            Urgency::High
        } else if upper.contains("MID") || upper.contains("MED") {
            Urgency::Mid
        } else {
            Urgency::Low
        }
    }
}

impl std::fmt::Display for Urgency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Urgency::Low => write!(f, "LOW"),
            Urgency::Mid => write!(f, "MID"),
            Urgency::High => write!(f, "HIGH"),
        }
    }
}

/// Expected cost impact of the decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum CostImpact {
    #[default]
    None,
    Low,
    Mid,
    High,
}

/// Blast radius of the decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ImpactScope {
    Individual,
    Team,
    Department,
    Company,
    External,
}

/// A validated issue, ready to be submitted or ranked offline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Issue {
    pub title: String,
    pub description: String,
    pub tags: Vec<String>,
    pub urgency: Urgency,
    pub cost_impact: CostImpact,
    pub timeline_days: Option<u32>,
}

/// Issue as entered at intake, before validation.
#[derive(Debug, Clone, Default)]
pub struct IssueDraft {
    pub title: String,
    pub description: String,
    pub tags: Vec<String>,
    pub urgency: Urgency,
    pub cost_impact: CostImpact,
    pub due_date: Option<NaiveDate>,
}

impl IssueDraft {
    /// Validate the draft against `today` and produce an [`Issue`].
    ///
    /// Text must be non-empty and at least one tag must be selected. Tags
    /// are trimmed and deduplicated, keeping first-seen order.
    pub fn validate(self, today: NaiveDate) -> Result<Issue, IntakeError> {
        let description = self.description.trim().to_string();
        if description.is_empty() {
            return Err(IntakeError::EmptyText);
        }

        let mut tags: Vec<String> = Vec::new();
        for tag in self.tags {
            let tag = tag.trim().to_string();
            if !tag.is_empty() && !tags.contains(&tag) {
                tags.push(tag);
            }
        }
        if tags.is_empty() {
            return Err(IntakeError::NoTags);
        }

        Ok(Issue {
            title: self.title.trim().to_string(),
            description,
            tags,
            urgency: self.urgency,
            cost_impact: self.cost_impact,
            timeline_days: self.due_date.and_then(|due| timeline_days_until(due, today)),
        })
    }
}

/// Days from `today` until `due`, present only when strictly positive.
pub fn timeline_days_until(due: NaiveDate, today: NaiveDate) -> Option<u32> {
    let days = (due - today).num_days();
    if days > 0 {
        u32::try_from(days).ok()
    } else {
        None
    }
}

/// An issue as reported by the backend listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IssueRecord {
    pub id: String,
    #[serde(default)]
    pub title: Option<String>,
    pub text: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub urgency: Option<String>,
    #[serde(default)]
    pub cost_impact: Option<String>,
    #[serde(default)]
    pub impact_scope: Option<String>,
    pub status: String,
    #[serde(default)]
    pub risk_tier: Option<String>,
    #[serde(default)]
    pub budget_estimate: Option<f64>,
    #[serde(default)]
    pub timeline_days: Option<u32>,
    #[serde(default)]
    pub rollback_possible: Option<bool>,
    #[serde(default)]
    pub submitter_id: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

/// Listing row derived from an [`IssueRecord`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IssueSummary {
    pub id: String,
    pub title: String,
    pub tags: Vec<String>,
    pub urgency: Urgency,
    pub status: String,
    pub owner: Option<String>,
    pub age: String,
    pub run_id: Option<String>,
}

impl IssueSummary {
    /// Build a listing row. `run_id` comes from the local run cache.
    pub fn from_record(record: &IssueRecord, run_id: Option<String>, now: DateTime<Utc>) -> Self {
        let title = record
            .title
            .clone()
            .filter(|t| !t.is_empty())
            .unwrap_or_else(|| record.text.clone());
        IssueSummary {
            id: record.id.clone(),
            title,
            tags: record.tags.clone(),
            urgency: Urgency::normalize(record.urgency.as_deref()),
            status: status_label(&record.status).to_string(),
            owner: record.submitter_id.clone(),
            age: parse_timestamp(&record.created_at)
                .map(|created| format_age(created, now))
                .unwrap_or_else(|| "unknown".to_string()),
            run_id,
        }
    }
}

/// Human label for a backend issue status; unknown statuses pass through.
pub fn status_label(status: &str) -> &str {
    match status {
        "PENDING" => "Pending",
        "PROCESSING" => "In review",
        "DECIDED" => "Decided",
        "EXECUTED" => "Executed",
        "CANCELLED" => "Cancelled",
        other => other,
    }
}

/// Parse a backend timestamp. Offsetless timestamps are taken as UTC.
pub fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    if let Ok(parsed) = DateTime::parse_from_rfc3339(value) {
        return Some(parsed.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|naive| naive.and_utc())
}

/// Compact age such as `2d 3h`, `4h 10m` or `7m`. Never below one minute.
pub fn format_age(created: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let minutes = (now - created).num_minutes().max(1);
    let hours = minutes / 60;
    let days = hours / 24;
    if days > 0 {
        format!("{}d {}h", days, hours % 24)
    } else if hours > 0 {
        format!("{}h {}m", hours, minutes % 60)
    } else {
        format!("{}m", minutes)
    }
}
