//! Persister/Reporter: the scored table and its aggregate summaries.
//!
//! Write-only — nothing here feeds back into earlier stages. Both
//! histograms are recomputed fully on every run.

use crate::{
    enrich::{EnrichedBatch, EnrichedRecord},
    error::PipelineResult,
    registry::CompanyProfile,
    table::Table,
    types::Role,
    verdict::{MatchVerdict, RiskLevel, Verdict},
};
use std::path::{Path, PathBuf};

/// Cap on the flagged-subset export, matching the downstream review
/// queue size.
const SUSPICIOUS_ROW_CAP: usize = 100;

const REASON_SEPARATOR: &str = "; ";

/// Ordered label → count view. Entry order is deterministic:
/// first-seen for the verdict histogram, count-descending with a
/// first-seen tie-break for the reason histogram.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Histogram {
    pub entries: Vec<(String, u64)>,
}

impl Histogram {
    pub fn count(&self, label: &str) -> u64 {
        self.entries
            .iter()
            .find(|(l, _)| l == label)
            .map(|(_, c)| *c)
            .unwrap_or(0)
    }

    pub fn total(&self) -> u64 {
        self.entries.iter().map(|(_, c)| c).sum()
    }
}

/// Group verdicts by label (match verdict when present, risk level
/// otherwise). Counts sum to the batch row count.
pub fn verdict_histogram(verdicts: &[Verdict]) -> Histogram {
    let mut entries: Vec<(String, u64)> = Vec::new();
    for verdict in verdicts {
        let label = verdict.label();
        match entries.iter_mut().find(|(l, _)| l == label) {
            Some((_, count)) => *count += 1,
            None => entries.push((label.to_string(), 1)),
        }
    }
    Histogram { entries }
}

/// Explode multi-reason rows into (transaction, reason) pairs, count
/// per reason, sort descending. The stable sort keeps first-seen order
/// among ties.
pub fn reason_histogram(verdicts: &[Verdict]) -> Histogram {
    let mut entries: Vec<(String, u64)> = Vec::new();
    for verdict in verdicts {
        for reason in &verdict.reasons {
            match entries.iter_mut().find(|(l, _)| l == reason) {
                Some((_, count)) => *count += 1,
                None => entries.push((reason.clone(), 1)),
            }
        }
    }
    entries.sort_by_key(|(_, count)| std::cmp::Reverse(*count));
    Histogram { entries }
}

#[derive(Debug, Clone)]
pub struct ReportPaths {
    pub decisions: PathBuf,
    pub risk_summary: PathBuf,
    pub reason_summary: PathBuf,
    pub suspicious: PathBuf,
}

/// Write the scored table plus the three derived exports into
/// `output_dir` (created if absent).
pub fn write_reports(
    batch: &EnrichedBatch,
    verdicts: &[Verdict],
    output_dir: &Path,
) -> PipelineResult<ReportPaths> {
    std::fs::create_dir_all(output_dir)?;
    let paths = ReportPaths {
        decisions: output_dir.join("decisions.csv"),
        risk_summary: output_dir.join("risk_summary.csv"),
        reason_summary: output_dir.join("reason_summary.csv"),
        suspicious: output_dir.join("suspicious.csv"),
    };

    let decisions = decisions_table(batch, verdicts);
    decisions.write_csv(&paths.decisions)?;

    write_histogram(&verdict_histogram(verdicts), "risk_level", &paths.risk_summary)?;
    write_histogram(&reason_histogram(verdicts), "reason", &paths.reason_summary)?;

    let suspicious = suspicious_table(batch, verdicts);
    suspicious.write_csv(&paths.suspicious)?;

    log::info!(
        "wrote {} decisions ({} flagged) to {}",
        decisions.len(),
        suspicious.len(),
        output_dir.display()
    );
    Ok(paths)
}

fn write_histogram(histogram: &Histogram, label_header: &str, path: &Path) -> PipelineResult<()> {
    let mut table = Table::new(vec![label_header.to_string(), "count".to_string()]);
    for (label, count) in &histogram.entries {
        table.push_row(vec![label.clone(), count.to_string()]);
    }
    table.write_csv(path)
}

fn decision_headers(extra_columns: &[String]) -> Vec<String> {
    let mut headers: Vec<String> = vec![
        "transaction_id".to_string(),
        "originator_name".to_string(),
        "beneficiary_name".to_string(),
        "amount".to_string(),
        "currency".to_string(),
        "value_date".to_string(),
        "originator_country".to_string(),
        "beneficiary_country".to_string(),
        "purpose".to_string(),
    ];
    headers.extend(extra_columns.iter().cloned());
    for role in [Role::Originator, Role::Beneficiary] {
        let p = role.prefix();
        for field in [
            "canonical_name",
            "jurisdiction",
            "registry_url",
            "sic",
            "nace",
            "naics",
            "industry_label",
            "industry_source",
        ] {
            headers.push(format!("{p}_{field}"));
        }
    }
    headers.extend(
        ["risk_level", "score", "reasons", "suggested_actions", "match_verdict"]
            .iter()
            .map(|h| h.to_string()),
    );
    headers
}

fn decisions_table(batch: &EnrichedBatch, verdicts: &[Verdict]) -> Table {
    let mut table = Table::new(decision_headers(&batch.extra_columns));
    for (row, verdict) in batch.rows.iter().zip(verdicts) {
        table.push_row(decision_row(row, verdict, &batch.extra_columns));
    }
    table
}

fn decision_row(row: &EnrichedRecord, verdict: &Verdict, extra_columns: &[String]) -> Vec<String> {
    let r = &row.record;
    let mut cells = vec![
        r.transaction_id.clone(),
        r.originator_name.clone(),
        r.beneficiary_name.clone(),
        r.amount.to_string(),
        r.currency.clone(),
        r.value_date.clone(),
        r.originator_country.clone(),
        r.beneficiary_country.clone(),
        r.purpose.clone(),
    ];
    for column in extra_columns {
        cells.push(r.extra(column).unwrap_or("").to_string());
    }
    push_profile_cells(&mut cells, &row.originator);
    push_profile_cells(&mut cells, &row.beneficiary);

    cells.push(verdict.risk_level.as_str().to_string());
    cells.push(
        verdict
            .score
            .map(|s| s.to_string())
            .unwrap_or_default(),
    );
    cells.push(verdict.reasons.join(REASON_SEPARATOR));
    cells.push(verdict.suggested_actions.join(REASON_SEPARATOR));
    cells.push(
        verdict
            .match_verdict
            .map(|mv| mv.as_str().to_string())
            .unwrap_or_default(),
    );
    cells
}

fn push_profile_cells(cells: &mut Vec<String>, profile: &CompanyProfile) {
    cells.push(profile.canonical_name.clone());
    cells.push(profile.jurisdiction.clone().unwrap_or_default());
    cells.push(profile.registry_url.clone().unwrap_or_default());
    cells.push(profile.sic.clone().unwrap_or_default());
    cells.push(profile.nace.clone().unwrap_or_default());
    cells.push(profile.naics.clone().unwrap_or_default());
    cells.push(profile.industry_label.clone().unwrap_or_default());
    cells.push(profile.source.as_str().to_string());
}

/// The flagged subset — industry mismatches and HIGH-risk rows —
/// ordered most-suspicious first (ascending plausibility score, then
/// first-seen), capped for the review queue.
fn suspicious_table(batch: &EnrichedBatch, verdicts: &[Verdict]) -> Table {
    let mut flagged: Vec<(&EnrichedRecord, &Verdict)> = batch
        .rows
        .iter()
        .zip(verdicts)
        .filter(|(_, v)| {
            v.match_verdict == Some(MatchVerdict::Mismatch) || v.risk_level == RiskLevel::High
        })
        .collect();
    flagged.sort_by_key(|(_, v)| v.score.unwrap_or(50));
    flagged.truncate(SUSPICIOUS_ROW_CAP);

    let mut table = Table::new(decision_headers(&batch.extra_columns));
    for (row, verdict) in flagged {
        table.push_row(decision_row(row, verdict, &batch.extra_columns));
    }
    table
}
