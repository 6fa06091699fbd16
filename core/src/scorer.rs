//! Backend selection and dispatch.
//!
//! Exactly one backend per run, chosen at configuration time. There is
//! no fallback chain across backends: a backend that cannot run fails
//! the run rather than silently handing off to another strategy.

use crate::{
    classifier_scorer::ClassifierScorer,
    enrich::EnrichedBatch,
    error::PipelineResult,
    features::build_features,
    llm_scorer::GenerativeScorer,
    prompt::build_prompts,
    rule_scorer::RuleTableScorer,
    verdict::Verdict,
};

pub enum ScoringBackend<'a> {
    Generative(GenerativeScorer<'a>),
    Classifier(ClassifierScorer),
    RuleTable(RuleTableScorer),
}

impl<'a> ScoringBackend<'a> {
    pub fn name(&self) -> &'static str {
        match self {
            ScoringBackend::Generative(_) => "generative",
            ScoringBackend::Classifier(_) => "classifier",
            ScoringBackend::RuleTable(_) => "rule_table",
        }
    }

    /// Score every row, one verdict per transaction, in row order.
    /// The prompt/feature building step runs here so each backend sees
    /// exactly the representation it needs.
    pub fn score_batch(&self, batch: &EnrichedBatch) -> PipelineResult<Vec<Verdict>> {
        match self {
            ScoringBackend::Generative(scorer) => build_prompts(batch)
                .iter()
                .map(|prompt| scorer.score(prompt))
                .collect(),
            ScoringBackend::Classifier(scorer) => Ok(build_features(batch)
                .iter()
                .map(|features| scorer.score(features))
                .collect()),
            ScoringBackend::RuleTable(scorer) => {
                Ok(batch.rows.iter().map(|row| scorer.score(row)).collect())
            }
        }
    }
}
