//! Enrichment stage: resolve every distinct counterparty once, then
//! join the profiles back onto each transaction row.

use crate::{
    extract::{TransactionBatch, TransactionRecord},
    registry::{CompanyProfile, ProfileResolver},
};
use std::{collections::HashMap, thread, time::Duration};

/// A transaction with both counterparty profiles attached.
#[derive(Debug, Clone)]
pub struct EnrichedRecord {
    pub record: TransactionRecord,
    pub originator: CompanyProfile,
    pub beneficiary: CompanyProfile,
}

#[derive(Debug, Clone)]
pub struct EnrichedBatch {
    pub rows: Vec<EnrichedRecord>,
    pub extra_columns: Vec<String>,
    pub distinct_counterparties: usize,
}

/// Resolve the union of distinct names across both roles — each name
/// exactly once, not once per transaction — then attach the profiles
/// to every row.
///
/// `pacing` inserts a delay between external lookups to respect
/// third-party rate limits. It is a policy knob, not a correctness
/// requirement; tests run with zero.
pub fn enrich(
    batch: TransactionBatch,
    resolver: &ProfileResolver<'_>,
    pacing: Duration,
) -> EnrichedBatch {
    let mut distinct: Vec<&str> = Vec::new();
    for record in &batch.records {
        for name in [&record.originator_name, &record.beneficiary_name] {
            if !distinct.contains(&name.as_str()) {
                distinct.push(name);
            }
        }
    }

    let mut profiles: HashMap<String, CompanyProfile> = HashMap::with_capacity(distinct.len());
    for (i, name) in distinct.iter().enumerate() {
        if i > 0 && resolver.uses_network() && !pacing.is_zero() {
            thread::sleep(pacing);
        }
        profiles.insert(name.to_string(), resolver.resolve(name));
    }

    log::info!(
        "enriched {} distinct counterparties across {} transactions",
        profiles.len(),
        batch.records.len()
    );

    let distinct_counterparties = profiles.len();
    let rows = batch
        .records
        .into_iter()
        .map(|record| {
            // Every name was resolved above, so the joins cannot miss.
            let originator = profiles[&record.originator_name].clone();
            let beneficiary = profiles[&record.beneficiary_name].clone();
            EnrichedRecord {
                record,
                originator,
                beneficiary,
            }
        })
        .collect();

    EnrichedBatch {
        rows,
        extra_columns: batch.extra_columns,
        distinct_counterparties,
    }
}
