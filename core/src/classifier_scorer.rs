//! Text-classification scoring backend.
//!
//! Consumes a pre-trained artifact (vocabulary, per-class coefficient
//! rows, intercepts) and runs a deterministic linear forward pass over
//! the combined-industry feature string. Loading or shape problems are
//! fatal; prediction itself cannot fail.

use crate::{
    error::{PipelineError, PipelineResult},
    features::FeatureRow,
    verdict::{MatchVerdict, Verdict},
};
use serde::Deserialize;
use std::{collections::HashMap, path::Path};

const COMBINED_FEATURE: &str = "combined_industries";

/// Serialized model artifact. `feature_names_in` mirrors the trained
/// estimator's feature-selection introspection: the backend refuses an
/// artifact trained on features it does not build.
#[derive(Debug, Clone, Deserialize)]
pub struct ClassifierArtifact {
    pub feature_names_in: Vec<String>,
    pub classes: Vec<String>,
    pub vocabulary: HashMap<String, usize>,
    pub coefficients: Vec<Vec<f64>>,
    pub intercepts: Vec<f64>,
}

pub struct ClassifierScorer {
    artifact: ClassifierArtifact,
}

impl ClassifierScorer {
    pub fn load(path: &Path) -> PipelineResult<Self> {
        let content =
            std::fs::read_to_string(path).map_err(|e| PipelineError::ModelUnavailable {
                backend: "classifier",
                reason: format!("cannot read {}: {e}", path.display()),
            })?;
        let artifact: ClassifierArtifact =
            serde_json::from_str(&content).map_err(|e| PipelineError::ModelUnavailable {
                backend: "classifier",
                reason: format!("malformed model artifact {}: {e}", path.display()),
            })?;
        Self::from_artifact(artifact)
    }

    pub fn from_artifact(artifact: ClassifierArtifact) -> PipelineResult<Self> {
        let unavailable = |reason: String| PipelineError::ModelUnavailable {
            backend: "classifier",
            reason,
        };

        if !artifact
            .feature_names_in
            .iter()
            .any(|f| f == COMBINED_FEATURE)
        {
            return Err(unavailable(format!(
                "artifact expects features {:?}, not '{COMBINED_FEATURE}'",
                artifact.feature_names_in
            )));
        }
        if artifact.classes.len() < 2 {
            return Err(unavailable(format!(
                "artifact declares {} classes, need at least 2",
                artifact.classes.len()
            )));
        }
        // Binary models carry a single decision row, multiclass models
        // one row per class.
        let expected_rows = if artifact.classes.len() == 2 {
            1
        } else {
            artifact.classes.len()
        };
        if artifact.coefficients.len() != expected_rows
            || artifact.intercepts.len() != expected_rows
        {
            return Err(unavailable(format!(
                "artifact shape mismatch: {} classes, {} coefficient rows, {} intercepts",
                artifact.classes.len(),
                artifact.coefficients.len(),
                artifact.intercepts.len()
            )));
        }
        let width = artifact.vocabulary.len();
        if artifact.coefficients.iter().any(|row| row.len() != width) {
            return Err(unavailable(format!(
                "coefficient rows do not match vocabulary size {width}"
            )));
        }
        if artifact.vocabulary.values().any(|&idx| idx >= width) {
            return Err(unavailable(
                "vocabulary index out of range for coefficient rows".to_string(),
            ));
        }

        Ok(Self { artifact })
    }

    /// Deterministic forward pass: term counts over the vocabulary,
    /// then sign rule (binary) or arg-max (multiclass, ties to the
    /// lowest class index).
    pub fn predict(&self, text: &str) -> &str {
        let mut counts: HashMap<usize, f64> = HashMap::new();
        for token in tokenize(text) {
            if let Some(&idx) = self.artifact.vocabulary.get(&token) {
                *counts.entry(idx).or_insert(0.0) += 1.0;
            }
        }

        let decision = |row: &[f64], intercept: f64| {
            intercept
                + counts
                    .iter()
                    .map(|(&idx, &count)| row[idx] * count)
                    .sum::<f64>()
        };

        if self.artifact.classes.len() == 2 {
            let z = decision(
                self.artifact.coefficients[0].as_slice(),
                self.artifact.intercepts[0],
            );
            let idx = if z > 0.0 { 1 } else { 0 };
            return &self.artifact.classes[idx];
        }

        let mut best = 0;
        let mut best_score = f64::NEG_INFINITY;
        for (idx, (row, &intercept)) in self
            .artifact
            .coefficients
            .iter()
            .zip(&self.artifact.intercepts)
            .enumerate()
        {
            let z = decision(row.as_slice(), intercept);
            if z > best_score {
                best = idx;
                best_score = z;
            }
        }
        &self.artifact.classes[best]
    }

    /// Rows without an industry label on either side never reach the
    /// model: they score Unknown, keeping output rows equal to input
    /// rows.
    pub fn score(&self, features: &FeatureRow) -> Verdict {
        let Some(text) = &features.combined_industries else {
            return Verdict::from_match(
                &features.transaction_id,
                MatchVerdict::Unknown,
                vec!["missing industry label".to_string()],
            );
        };
        let label = self.predict(text);
        match MatchVerdict::parse(label) {
            Some(MatchVerdict::Valid) => {
                Verdict::from_match(&features.transaction_id, MatchVerdict::Valid, Vec::new())
            }
            Some(MatchVerdict::Mismatch) => Verdict::from_match(
                &features.transaction_id,
                MatchVerdict::Mismatch,
                vec![format!("model flagged industry pair: {text}")],
            ),
            Some(MatchVerdict::Unknown) => Verdict::from_match(
                &features.transaction_id,
                MatchVerdict::Unknown,
                Vec::new(),
            ),
            None => Verdict::from_match(
                &features.transaction_id,
                MatchVerdict::Unknown,
                vec![format!("unrecognized model label: {label}")],
            ),
        }
    }
}

/// Lowercased alphanumeric words of two or more characters — the same
/// token rule the artifact's vectorizer was trained with.
fn tokenize(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| w.len() >= 2)
        .map(|w| w.to_string())
        .collect()
}
