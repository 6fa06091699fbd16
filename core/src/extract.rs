//! Extraction stage: column validation and typed-batch construction.
//!
//! One consolidated schema pass at ingestion. Downstream stages trust
//! the `TransactionBatch` by construction and never re-check columns.

use crate::{
    error::{PipelineError, PipelineResult},
    table::Table,
};
use std::collections::HashSet;

/// Columns every input batch must carry. A batch missing any of these
/// is rejected wholesale — no row-level partial admission.
pub const REQUIRED_COLUMNS: [&str; 9] = [
    "transaction_id",
    "originator_name",
    "beneficiary_name",
    "amount",
    "currency",
    "value_date",
    "originator_country",
    "beneficiary_country",
    "purpose",
];

/// Enrichment columns kept when present; everything else is dropped.
pub const OPTIONAL_COLUMNS: [&str; 6] = [
    "industry",
    "transaction_type",
    "channel",
    "customer_segment",
    "relationship_length",
    "product",
];

/// One validated transaction. Required fields are typed; allow-listed
/// optional columns pass through unchanged as (name, value) pairs.
#[derive(Debug, Clone)]
pub struct TransactionRecord {
    pub transaction_id: String,
    pub originator_name: String,
    pub beneficiary_name: String,
    pub amount: f64,
    pub currency: String,
    pub value_date: String,
    pub originator_country: String,
    pub beneficiary_country: String,
    pub purpose: String,
    pub extras: Vec<(String, String)>,
}

impl TransactionRecord {
    pub fn extra(&self, name: &str) -> Option<&str> {
        self.extras
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }
}

/// The typed batch handed forward through the pipeline. Each stage
/// owns its output outright; no stage mutates a batch it did not
/// produce.
#[derive(Debug, Clone)]
pub struct TransactionBatch {
    pub records: Vec<TransactionRecord>,
    /// The optional allow-listed columns present in this batch, in
    /// input order. Every record carries a value for each.
    pub extra_columns: Vec<String>,
}

/// Validate the input table and build the typed batch.
///
/// Column check first: fails with `Schema` naming every missing
/// required column. The table is then restricted to
/// {required} ∪ ({optional allow-list} ∩ {present}); unrecognized
/// columns are discarded. Finally the batch invariants are checked —
/// unique transaction ids, non-negative parseable amounts — and every
/// violation is reported at once.
pub fn extract(table: &Table) -> PipelineResult<TransactionBatch> {
    let present: HashSet<&str> = table.headers().iter().map(|h| h.as_str()).collect();
    let missing: Vec<String> = REQUIRED_COLUMNS
        .iter()
        .filter(|c| !present.contains(*c))
        .map(|c| c.to_string())
        .collect();
    if !missing.is_empty() {
        return Err(PipelineError::Schema { missing });
    }

    let extra_columns: Vec<String> = OPTIONAL_COLUMNS
        .iter()
        .filter(|c| present.contains(*c))
        .map(|c| c.to_string())
        .collect();

    let keep: Vec<&str> = REQUIRED_COLUMNS
        .iter()
        .copied()
        .chain(extra_columns.iter().map(|c| c.as_str()))
        .collect();
    let restricted = table.select(&keep);

    let mut records = Vec::with_capacity(restricted.len());
    let mut violations = Vec::new();
    let mut seen_ids: HashSet<String> = HashSet::new();

    for row in 0..restricted.len() {
        let cell = |column: &str| restricted.cell(row, column).unwrap_or("").to_string();

        let transaction_id = cell("transaction_id");
        if !seen_ids.insert(transaction_id.clone()) {
            violations.push(format!("duplicate transaction_id '{transaction_id}'"));
        }

        let amount_raw = cell("amount");
        let amount = match amount_raw.trim().parse::<f64>() {
            Ok(a) if a >= 0.0 => a,
            Ok(a) => {
                violations.push(format!(
                    "transaction '{transaction_id}': negative amount {a}"
                ));
                a
            }
            Err(_) => {
                violations.push(format!(
                    "transaction '{transaction_id}': unparseable amount '{amount_raw}'"
                ));
                0.0
            }
        };

        let extras = extra_columns
            .iter()
            .map(|c| (c.clone(), cell(c)))
            .collect();

        records.push(TransactionRecord {
            transaction_id,
            originator_name: cell("originator_name"),
            beneficiary_name: cell("beneficiary_name"),
            amount,
            currency: cell("currency"),
            value_date: cell("value_date"),
            originator_country: cell("originator_country"),
            beneficiary_country: cell("beneficiary_country"),
            purpose: cell("purpose"),
            extras,
        });
    }

    if !violations.is_empty() {
        return Err(PipelineError::Invariant { violations });
    }

    log::info!(
        "extracted {} transactions ({} optional columns kept)",
        records.len(),
        extra_columns.len()
    );

    Ok(TransactionBatch {
        records,
        extra_columns,
    })
}
