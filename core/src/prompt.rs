//! Prompt builder for generative-model scoring.
//!
//! Every non-identifier column is serialized as `key: value` pairs and
//! embedded in a fixed instruction template. The template is fixed per
//! run; only the transaction-derived context varies.

use crate::{enrich::EnrichedBatch, registry::CompanyProfile, types::Role};

#[derive(Debug, Clone)]
pub struct PromptRow {
    pub transaction_id: String,
    pub prompt: String,
}

pub fn build_prompts(batch: &EnrichedBatch) -> Vec<PromptRow> {
    batch
        .rows
        .iter()
        .map(|row| {
            let mut pairs: Vec<String> = Vec::new();
            let r = &row.record;
            pairs.push(format!("originator_name: {}", r.originator_name));
            pairs.push(format!("beneficiary_name: {}", r.beneficiary_name));
            pairs.push(format!("amount: {}", r.amount));
            pairs.push(format!("currency: {}", r.currency));
            pairs.push(format!("value_date: {}", r.value_date));
            pairs.push(format!("originator_country: {}", r.originator_country));
            pairs.push(format!("beneficiary_country: {}", r.beneficiary_country));
            pairs.push(format!("purpose: {}", r.purpose));
            for (name, value) in &r.extras {
                pairs.push(format!("{name}: {value}"));
            }
            push_profile_pairs(&mut pairs, Role::Originator, &row.originator);
            push_profile_pairs(&mut pairs, Role::Beneficiary, &row.beneficiary);

            PromptRow {
                transaction_id: r.transaction_id.clone(),
                prompt: render_template(&pairs.join(", ")),
            }
        })
        .collect()
}

fn push_profile_pairs(pairs: &mut Vec<String>, role: Role, profile: &CompanyProfile) {
    let p = role.prefix();
    let fields = [
        ("industry_label", &profile.industry_label),
        ("sic", &profile.sic),
        ("nace", &profile.nace),
        ("naics", &profile.naics),
        ("jurisdiction", &profile.jurisdiction),
    ];
    for (name, value) in fields {
        if let Some(value) = value {
            pairs.push(format!("{p}_{name}: {value}"));
        }
    }
    pairs.push(format!("{p}_industry_source: {}", profile.source.as_str()));
}

fn render_template(context: &str) -> String {
    format!(
        "You are a FinCrime risk assistant. Given a transaction, decide if doing business is reasonable.\n\
         \n\
         Transaction Details: {context}\n\
         \n\
         Return ONLY strict JSON with fields:\n\
         - risk_level (LOW | MEDIUM | HIGH)\n\
         - reasons (list of strings)\n\
         - suggested_actions (list of strings)\n\
         \n\
         Consider:\n\
         - Sanctioned or high-risk regions\n\
         - Industry or customer profile mismatches\n\
         - Unusual amounts relative to segment/industry\n\
         - Cross-border and high-value red flags\n\
         - Channel-specific risk factors\n\
         - Transaction type anomalies"
    )
}
