//! Engineered features for classifier scoring.

use crate::enrich::EnrichedBatch;

/// One feature row per transaction, carrying the transaction id for
/// rejoining. Output row count always equals input row count.
#[derive(Debug, Clone)]
pub struct FeatureRow {
    pub transaction_id: String,
    /// ln(1 + amount).
    pub amount_log: f64,
    /// True when both sides carry the same classification code.
    pub same_industry: bool,
    /// `"<originator label> <-> <beneficiary label>"`; None when either
    /// side has no industry label.
    pub combined_industries: Option<String>,
}

pub fn build_features(batch: &EnrichedBatch) -> Vec<FeatureRow> {
    batch
        .rows
        .iter()
        .map(|row| {
            let same_industry = matches!(
                (
                    row.originator.classification_key(),
                    row.beneficiary.classification_key(),
                ),
                (Some(a), Some(b)) if a == b
            );
            let combined_industries = match (
                &row.originator.industry_label,
                &row.beneficiary.industry_label,
            ) {
                (Some(a), Some(b)) => Some(format!("{a} <-> {b}")),
                _ => None,
            };
            FeatureRow {
                transaction_id: row.record.transaction_id.clone(),
                amount_log: (1.0 + row.record.amount).ln(),
                same_industry,
                combined_industries,
            }
        })
        .collect()
}
