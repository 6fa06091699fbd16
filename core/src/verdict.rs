//! Risk verdicts and generative-output parsing.
//!
//! Parsing never fails: unparsable or incomplete scorer output
//! degrades to an UNKNOWN verdict tagged `parse_error` so one bad
//! response never aborts a batch.

use serde_json::Value;

pub const PARSE_ERROR_REASON: &str = "parse_error";

/// Score assumed when the model returns a verdict without one.
const DEFAULT_SCORE: u8 = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RiskLevel {
    Low,
    Medium,
    High,
    Unknown,
}

impl RiskLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::Low => "LOW",
            RiskLevel::Medium => "MEDIUM",
            RiskLevel::High => "HIGH",
            RiskLevel::Unknown => "UNKNOWN",
        }
    }

    /// Case-insensitive match against the recognized vocabulary.
    pub fn parse(s: &str) -> Option<RiskLevel> {
        match s.trim().to_uppercase().as_str() {
            "LOW" => Some(RiskLevel::Low),
            "MEDIUM" => Some(RiskLevel::Medium),
            "HIGH" => Some(RiskLevel::High),
            "UNKNOWN" => Some(RiskLevel::Unknown),
            _ => None,
        }
    }
}

/// Rule-table and classifier outcome for an industry pairing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchVerdict {
    Valid,
    Mismatch,
    Unknown,
}

impl MatchVerdict {
    pub fn as_str(&self) -> &'static str {
        match self {
            MatchVerdict::Valid => "Valid",
            MatchVerdict::Mismatch => "Mismatch",
            MatchVerdict::Unknown => "Unknown",
        }
    }

    pub fn parse(s: &str) -> Option<MatchVerdict> {
        match s.trim().to_uppercase().as_str() {
            "VALID" => Some(MatchVerdict::Valid),
            "MISMATCH" => Some(MatchVerdict::Mismatch),
            "UNKNOWN" => Some(MatchVerdict::Unknown),
            _ => None,
        }
    }

    pub fn risk_level(&self) -> RiskLevel {
        match self {
            MatchVerdict::Valid => RiskLevel::Low,
            MatchVerdict::Mismatch => RiskLevel::High,
            MatchVerdict::Unknown => RiskLevel::Unknown,
        }
    }
}

/// One verdict per transaction, whatever the backend.
#[derive(Debug, Clone)]
pub struct Verdict {
    pub transaction_id: String,
    pub risk_level: RiskLevel,
    pub score: Option<u8>,
    pub reasons: Vec<String>,
    pub suggested_actions: Vec<String>,
    pub match_verdict: Option<MatchVerdict>,
}

impl Verdict {
    pub fn parse_error(transaction_id: &str) -> Verdict {
        Verdict {
            transaction_id: transaction_id.to_string(),
            risk_level: RiskLevel::Unknown,
            score: None,
            reasons: vec![PARSE_ERROR_REASON.to_string()],
            suggested_actions: Vec::new(),
            match_verdict: None,
        }
    }

    pub fn from_match(transaction_id: &str, verdict: MatchVerdict, reasons: Vec<String>) -> Verdict {
        Verdict {
            transaction_id: transaction_id.to_string(),
            risk_level: verdict.risk_level(),
            score: None,
            reasons,
            suggested_actions: Vec::new(),
            match_verdict: Some(verdict),
        }
    }

    /// The label aggregate summaries group by: the match verdict when
    /// one exists, otherwise the risk level.
    pub fn label(&self) -> &'static str {
        match self.match_verdict {
            Some(mv) => mv.as_str(),
            None => self.risk_level.as_str(),
        }
    }
}

/// Parse raw generative-model output into a verdict.
///
/// The response must be a JSON object with a `risk_level` (or `risk`)
/// string. A recognized value maps onto the vocabulary; an
/// unrecognized one defaults to MEDIUM. A missing `reasons` field
/// defaults to the empty list — `parse_error` is reserved for output
/// that is not a usable verdict at all.
pub fn parse_generative_verdict(transaction_id: &str, raw: &str) -> Verdict {
    let value: Value = match serde_json::from_str(raw.trim()) {
        Ok(v) => v,
        Err(_) => return Verdict::parse_error(transaction_id),
    };
    let Some(object) = value.as_object() else {
        return Verdict::parse_error(transaction_id);
    };
    let Some(risk_raw) = object
        .get("risk_level")
        .or_else(|| object.get("risk"))
        .and_then(Value::as_str)
    else {
        return Verdict::parse_error(transaction_id);
    };

    let risk_level = RiskLevel::parse(risk_raw).unwrap_or(RiskLevel::Medium);
    let reasons = string_list(object.get("reasons"));
    let suggested_actions = string_list(object.get("suggested_actions"));
    let score = Some(coerce_score(object.get("score")));

    Verdict {
        transaction_id: transaction_id.to_string(),
        risk_level,
        score,
        reasons,
        suggested_actions,
        match_verdict: None,
    }
}

/// Accepts a list of strings or a single consolidated string; absent
/// or malformed fields yield the empty list.
fn string_list(value: Option<&Value>) -> Vec<String> {
    match value {
        Some(Value::String(s)) => vec![s.clone()],
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(|item| match item {
                Value::String(s) => Some(s.clone()),
                Value::Number(n) => Some(n.to_string()),
                _ => None,
            })
            .collect(),
        _ => Vec::new(),
    }
}

/// Coerce to an integer clamped to [0, 100]; absent or non-numeric
/// scores default to 50.
fn coerce_score(value: Option<&Value>) -> u8 {
    let numeric = match value {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    match numeric {
        Some(n) => n.round().clamp(0.0, 100.0) as u8,
        None => DEFAULT_SCORE,
    }
}
