//! Rule-table scoring backend.
//!
//! A static allow-list from originator industry label to the set of
//! beneficiary industry labels it may plausibly pay. The mapping is
//! configuration, not learned — loadable from a JSON file or embedded.

use crate::{
    enrich::EnrichedRecord,
    error::PipelineResult,
    verdict::{MatchVerdict, Verdict},
};
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

/// Embedded default allow-list.
const BUILT_IN_RELATIONS: &[(&str, &[&str])] = &[
    (
        "Semiconductor Manufacturing",
        &["Metal Product Manufacturing", "Chemical Manufacturing"],
    ),
    (
        "Chemical Manufacturing",
        &["Hospital Activities", "Semiconductor Manufacturing"],
    ),
    (
        "Metal Product Manufacturing",
        &["Machinery Repair", "Semiconductor Manufacturing"],
    ),
    ("Hospital Activities", &["Chemical Manufacturing"]),
    ("Beverage Production", &["Wheat Farming"]),
    ("Machinery Repair", &["Metal Product Manufacturing"]),
    ("Wheat Farming", &["Beverage Production"]),
    (
        "Motor Vehicle Wholesale",
        &["Semiconductor Manufacturing", "Machinery Repair"],
    ),
    (
        "Business Consulting",
        &["Semiconductor Manufacturing", "Chemical Manufacturing"],
    ),
    ("Advertising Agencies", &["Business Consulting"]),
    (
        "Cleaning Services",
        &["Hospital Activities", "Business Consulting"],
    ),
];

#[derive(Debug, Clone)]
pub struct RuleTable {
    allowed: BTreeMap<String, BTreeSet<String>>,
}

impl RuleTable {
    pub fn built_in() -> Self {
        Self::from_pairs(BUILT_IN_RELATIONS)
    }

    /// Load from a JSON object mapping originator industry label to a
    /// list of compatible beneficiary labels.
    pub fn from_path(path: &Path) -> PipelineResult<Self> {
        let content = std::fs::read_to_string(path)?;
        let raw: BTreeMap<String, Vec<String>> = serde_json::from_str(&content)?;
        let allowed = raw
            .into_iter()
            .map(|(from, to)| (from, to.into_iter().collect()))
            .collect();
        Ok(Self { allowed })
    }

    pub fn from_pairs(pairs: &[(&str, &[&str])]) -> Self {
        let allowed = pairs
            .iter()
            .map(|(from, to)| {
                (
                    from.to_string(),
                    to.iter().map(|t| t.to_string()).collect(),
                )
            })
            .collect();
        Self { allowed }
    }

    /// Valid if the beneficiary label is allow-listed for the
    /// originator label, Mismatch otherwise, Unknown when either label
    /// is missing.
    pub fn validate(&self, originator: Option<&str>, beneficiary: Option<&str>) -> MatchVerdict {
        let (Some(originator), Some(beneficiary)) = (originator, beneficiary) else {
            return MatchVerdict::Unknown;
        };
        match self.allowed.get(originator) {
            Some(set) if set.contains(beneficiary) => MatchVerdict::Valid,
            _ => MatchVerdict::Mismatch,
        }
    }
}

pub struct RuleTableScorer {
    table: RuleTable,
}

impl RuleTableScorer {
    pub fn new(table: RuleTable) -> Self {
        Self { table }
    }

    pub fn score(&self, row: &EnrichedRecord) -> Verdict {
        let originator = row.originator.industry_label.as_deref();
        let beneficiary = row.beneficiary.industry_label.as_deref();
        let verdict = self.table.validate(originator, beneficiary);
        let reasons = match verdict {
            MatchVerdict::Valid => Vec::new(),
            MatchVerdict::Mismatch => vec![format!(
                "industry pair not allow-listed: {} -> {}",
                originator.unwrap_or(""),
                beneficiary.unwrap_or("")
            )],
            MatchVerdict::Unknown => vec!["missing industry label".to_string()],
        };
        Verdict::from_match(&row.record.transaction_id, verdict, reasons)
    }
}
