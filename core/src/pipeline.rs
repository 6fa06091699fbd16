//! The pipeline — stage wiring in fixed order.
//!
//! EXECUTION ORDER (fixed, documented, never reordered):
//!   1. Extract   — read + validate the input table
//!   2. Enrich    — resolve counterparty profiles, join onto rows
//!   3. Build     — prompts or engineered features, per backend
//!   4. Score     — exactly one backend
//!   5. Persist   — scored table + aggregate summaries
//!
//! RULES:
//!   - Each stage owns its output and hands it forward by value.
//!   - External services are explicit dependency objects passed in at
//!     run start; nothing is held as process-wide state.
//!   - Per-row failures degrade in place; only schema, invariant, and
//!     backend-availability failures abort a run.

use crate::{
    config::{BackendChoice, RunConfig},
    enrich::enrich,
    error::{PipelineError, PipelineResult},
    extract::extract,
    llm_scorer::{GenerativeClient, GenerativeScorer, HttpGenerativeClient},
    classifier_scorer::ClassifierScorer,
    registry::{HttpRegistryClient, ProfileResolver, RegistryLookup},
    report::{reason_histogram, verdict_histogram, write_reports, Histogram, ReportPaths},
    rule_scorer::{RuleTable, RuleTableScorer},
    scorer::ScoringBackend,
    table::Table,
    types::RunId,
};
use chrono::{DateTime, Utc};
use uuid::Uuid;

/// External-service clients for one run. Constructed from config for
/// production, or handed in directly with fakes in tests.
#[derive(Default)]
pub struct PipelineDeps {
    pub registry: Option<Box<dyn RegistryLookup>>,
    pub generative: Option<Box<dyn GenerativeClient>>,
}

impl PipelineDeps {
    pub fn from_config(cfg: &RunConfig) -> PipelineResult<Self> {
        let registry = match cfg.registry.api_token() {
            Some(token) => {
                let client = HttpRegistryClient::new(&cfg.registry, token)
                    .map_err(PipelineError::Other)?;
                Some(Box::new(client) as Box<dyn RegistryLookup>)
            }
            None => {
                log::info!("no registry credentials; all profiles will be stubs");
                None
            }
        };
        let generative = match cfg.backend {
            BackendChoice::Generative => {
                let client = HttpGenerativeClient::new(&cfg.generative)
                    .map_err(PipelineError::Other)?;
                Some(Box::new(client) as Box<dyn GenerativeClient>)
            }
            _ => None,
        };
        Ok(Self {
            registry,
            generative,
        })
    }
}

#[derive(Debug, Clone)]
pub struct RunSummary {
    pub run_id: RunId,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub rows: usize,
    pub distinct_counterparties: usize,
    pub backend: &'static str,
    pub verdicts: Histogram,
    pub reasons: Histogram,
    pub paths: ReportPaths,
}

/// Run one batch end to end. Synchronous, single-threaded, row by
/// row; once started it proceeds to completion or fails with a
/// batch-fatal error — no checkpointing of partial results.
pub fn run(cfg: &RunConfig, deps: &PipelineDeps) -> PipelineResult<RunSummary> {
    let run_id: RunId = Uuid::new_v4().to_string();
    let started_at = Utc::now();
    log::info!(
        "run {run_id}: input={} backend={:?}",
        cfg.input_path.display(),
        cfg.backend
    );

    let table = Table::read_csv(&cfg.input_path)?;
    let batch = extract(&table)?;

    let resolver = ProfileResolver::new(deps.registry.as_deref(), cfg.registry.retry_policy());
    let enriched = enrich(batch, &resolver, cfg.registry.pacing());

    let backend = build_backend(cfg, deps)?;
    let verdicts = backend.score_batch(&enriched)?;

    let paths = write_reports(&enriched, &verdicts, &cfg.output_dir)?;

    let summary = RunSummary {
        run_id,
        started_at,
        finished_at: Utc::now(),
        rows: enriched.rows.len(),
        distinct_counterparties: enriched.distinct_counterparties,
        backend: backend.name(),
        verdicts: verdict_histogram(&verdicts),
        reasons: reason_histogram(&verdicts),
        paths,
    };
    log::info!(
        "run {} complete: {} rows, {} counterparties, verdicts {:?}",
        summary.run_id,
        summary.rows,
        summary.distinct_counterparties,
        summary.verdicts.entries
    );
    Ok(summary)
}

fn build_backend<'a>(cfg: &RunConfig, deps: &'a PipelineDeps) -> PipelineResult<ScoringBackend<'a>> {
    match cfg.backend {
        BackendChoice::Generative => {
            let client = deps.generative.as_deref().ok_or_else(|| {
                PipelineError::ModelUnavailable {
                    backend: "generative",
                    reason: "no generative client configured".to_string(),
                }
            })?;
            Ok(ScoringBackend::Generative(GenerativeScorer::new(
                client,
                cfg.generative.clone(),
            )))
        }
        BackendChoice::Classifier => Ok(ScoringBackend::Classifier(ClassifierScorer::load(
            &cfg.classifier.model_path,
        )?)),
        BackendChoice::RuleTable => {
            let table = match &cfg.rule_table.path {
                Some(path) => RuleTable::from_path(path)?,
                None => RuleTable::built_in(),
            };
            Ok(ScoringBackend::RuleTable(RuleTableScorer::new(table)))
        }
    }
}
