//! Rendering of agent output for the log view.

use serde_json::Value;

use super::events::Finding;

/// JSON values worth printing: non-empty strings, non-zero numbers, `true`.
pub(crate) fn present(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) if n.as_f64() != Some(0.0) => Some(n.to_string()),
        Value::Bool(true) => Some("true".to_string()),
        _ => None,
    }
}

/// Render an agent message for display.
///
/// Code fences are stripped. A JSON object body is rendered as bullet
/// lines for its known keys (or pretty-printed when it has none); any
/// other text is returned trimmed.
pub fn format_structured_message(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return String::new();
    }
    let body = trimmed.replace("```json", "").replace("```", "");
    let body = body.trim();
    if !body.starts_with('{') {
        return body.to_string();
    }
    let parsed: Value = match serde_json::from_str(body) {
        Ok(v) => v,
        Err(_) => return body.to_string(),
    };

    let mut lines = Vec::new();
    if let Some(v) = present(parsed.get("risk_tier")) {
        lines.push(format!("- Risk: {}", v));
    }
    if let Some(v) = present(parsed.get("execution_path")) {
        lines.push(format!("- Path: {}", v));
    }
    if let Some(v) = present(parsed.get("reasoning")) {
        lines.push(format!("- Rationale: {}", v));
    }
    if let Some(Value::Array(factors)) = parsed.get("key_factors") {
        if !factors.is_empty() {
            let joined: Vec<String> = factors
                .iter()
                .map(|f| match f {
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                })
                .collect();
            lines.push(format!("- Key factors: {}", joined.join(", ")));
        }
    }
    if let Some(v) = present(parsed.get("escalation_required_to")) {
        lines.push(format!("- Approval needed: {}", v));
    }
    if let Some(v) = present(parsed.get("critical_note")) {
        lines.push(format!("- Note: {}", v));
    }

    if lines.is_empty() {
        serde_json::to_string_pretty(&parsed).unwrap_or_else(|_| body.to_string())
    } else {
        lines.join("\n")
    }
}

/// One bullet line per finding; empty when there are none.
pub fn format_findings(findings: &[Finding]) -> String {
    findings
        .iter()
        .map(|f| {
            let mut line = match f.risk_type.as_deref().filter(|s| !s.is_empty()) {
                Some(kind) => format!("- Risk {}", kind),
                None => "- Risk".to_string(),
            };
            if let Some(severity) = f.severity {
                line.push_str(&format!(" (severity {})", severity));
            }
            if let Some(evidence) = f.evidence.as_deref().filter(|s| !s.is_empty()) {
                line.push_str(&format!(" · evidence: {}", evidence));
            }
            if let Some(rec) = f.recommendation.as_deref().filter(|s| !s.is_empty()) {
                line.push_str(&format!(" · recommendation: {}", rec));
            }
            line
        })
        .collect::<Vec<_>>()
        .join("\n")
}
