//! Scoring backend tests.
//!
//! Tests cover: generative verdict parsing and its degrade paths,
//! score/risk coercion rules, the rule-table verdicts, and the
//! classifier forward pass with its artifact validation.

use screening_core::{
    classifier_scorer::{ClassifierArtifact, ClassifierScorer},
    config::GenerativeConfig,
    error::PipelineError,
    features::FeatureRow,
    llm_scorer::{GenerationRequest, GenerativeClient, GenerativeScorer},
    prompt::PromptRow,
    rule_scorer::RuleTable,
    verdict::{MatchVerdict, RiskLevel},
};
use std::collections::HashMap;

// ── Generative backend ───────────────────────────────────────────────────────

struct CannedClient {
    response: String,
}

impl GenerativeClient for CannedClient {
    fn generate(&self, _request: &GenerationRequest<'_>) -> Result<String, String> {
        Ok(self.response.clone())
    }
}

struct UnreachableClient;

impl GenerativeClient for UnreachableClient {
    fn generate(&self, _request: &GenerationRequest<'_>) -> Result<String, String> {
        Err("connection refused".to_string())
    }
}

fn score_raw(raw: &str) -> screening_core::verdict::Verdict {
    let client = CannedClient {
        response: raw.to_string(),
    };
    let scorer = GenerativeScorer::new(&client, GenerativeConfig::default());
    let prompt = PromptRow {
        transaction_id: "tx-1".to_string(),
        prompt: "ignored".to_string(),
    };
    scorer.score(&prompt).expect("canned responses never fail transport")
}

#[test]
fn well_formed_response_parses_fully() {
    let verdict = score_raw(
        r#"{"risk_level": "HIGH", "score": 12,
            "reasons": ["high-risk corridor", "amount anomaly"],
            "suggested_actions": ["escalate to analyst"]}"#,
    );
    assert_eq!(verdict.risk_level, RiskLevel::High);
    assert_eq!(verdict.score, Some(12));
    assert_eq!(verdict.reasons, vec!["high-risk corridor", "amount anomaly"]);
    assert_eq!(verdict.suggested_actions, vec!["escalate to analyst"]);
}

#[test]
fn risk_key_alias_and_case_are_accepted() {
    let verdict = score_raw(r#"{"risk": "low", "reasons": []}"#);
    assert_eq!(verdict.risk_level, RiskLevel::Low);
}

#[test]
fn unrecognized_risk_string_defaults_to_medium() {
    let verdict = score_raw(r#"{"risk_level": "SEVERE", "reasons": []}"#);
    assert_eq!(verdict.risk_level, RiskLevel::Medium);
}

#[test]
fn non_json_output_degrades_to_unknown_parse_error() {
    let verdict = score_raw("The transaction looks risky to me.");
    assert_eq!(verdict.risk_level, RiskLevel::Unknown);
    assert_eq!(verdict.reasons, vec!["parse_error"]);
    assert!(verdict.suggested_actions.is_empty());
    assert_eq!(verdict.score, None);
}

#[test]
fn missing_risk_key_degrades_to_unknown_parse_error() {
    let verdict = score_raw(r#"{"reasons": ["no verdict"], "score": 10}"#);
    assert_eq!(verdict.risk_level, RiskLevel::Unknown);
    assert_eq!(verdict.reasons, vec!["parse_error"]);
}

#[test]
fn missing_reasons_defaults_to_empty_list_not_parse_error() {
    let verdict = score_raw(r#"{"risk_level": "LOW"}"#);
    assert_eq!(verdict.risk_level, RiskLevel::Low);
    assert!(verdict.reasons.is_empty());
}

#[test]
fn consolidated_text_reasons_are_accepted() {
    let verdict = score_raw(r#"{"risk_level": "MEDIUM", "reasons": "cross-border and high value"}"#);
    assert_eq!(verdict.reasons, vec!["cross-border and high value"]);
}

#[test]
fn score_is_clamped_and_defaulted() {
    assert_eq!(score_raw(r#"{"risk_level": "LOW", "score": 150}"#).score, Some(100));
    assert_eq!(score_raw(r#"{"risk_level": "LOW", "score": -3}"#).score, Some(0));
    assert_eq!(score_raw(r#"{"risk_level": "LOW", "score": "72"}"#).score, Some(72));
    assert_eq!(score_raw(r#"{"risk_level": "LOW"}"#).score, Some(50));
}

#[test]
fn unreachable_endpoint_is_fatal_not_degraded() {
    let client = UnreachableClient;
    let scorer = GenerativeScorer::new(&client, GenerativeConfig::default());
    let prompt = PromptRow {
        transaction_id: "tx-1".to_string(),
        prompt: "p".to_string(),
    };
    match scorer.score(&prompt) {
        Err(PipelineError::ModelUnavailable { backend, .. }) => {
            assert_eq!(backend, "generative");
        }
        other => panic!("expected ModelUnavailable, got {other:?}"),
    }
}

// ── Rule-table backend ───────────────────────────────────────────────────────

#[test]
fn rule_table_validates_allow_listed_pairs() {
    let table = RuleTable::built_in();
    assert_eq!(
        table.validate(
            Some("Semiconductor Manufacturing"),
            Some("Metal Product Manufacturing"),
        ),
        MatchVerdict::Valid
    );
    assert_eq!(
        table.validate(
            Some("Semiconductor Manufacturing"),
            Some("Beverage Production"),
        ),
        MatchVerdict::Mismatch
    );
    assert_eq!(
        table.validate(None, Some("Beverage Production")),
        MatchVerdict::Unknown
    );
    assert_eq!(
        table.validate(Some("Semiconductor Manufacturing"), None),
        MatchVerdict::Unknown
    );
}

#[test]
fn unlisted_originator_is_a_mismatch_not_unknown() {
    let table = RuleTable::built_in();
    assert_eq!(
        table.validate(Some("Deep Sea Fishing"), Some("Wheat Farming")),
        MatchVerdict::Mismatch
    );
}

#[test]
fn match_verdicts_map_onto_risk_levels() {
    assert_eq!(MatchVerdict::Valid.risk_level(), RiskLevel::Low);
    assert_eq!(MatchVerdict::Mismatch.risk_level(), RiskLevel::High);
    assert_eq!(MatchVerdict::Unknown.risk_level(), RiskLevel::Unknown);
}

// ── Classifier backend ───────────────────────────────────────────────────────

fn artifact() -> ClassifierArtifact {
    // Vocabulary over the tokens the combined-industry strings produce.
    let vocabulary = HashMap::from([
        ("semiconductor".to_string(), 0),
        ("manufacturing".to_string(), 1),
        ("metal".to_string(), 2),
        ("product".to_string(), 3),
        ("beverage".to_string(), 4),
        ("production".to_string(), 5),
    ]);
    ClassifierArtifact {
        feature_names_in: vec!["combined_industries".to_string()],
        classes: vec!["Mismatch".to_string(), "Valid".to_string()],
        vocabulary,
        // Positive decision when a metal/product counterpart appears,
        // strongly negative on beverage tokens.
        coefficients: vec![vec![0.4, 0.1, 0.9, 0.9, -2.0, -2.0]],
        intercepts: vec![-1.0],
    }
}

fn features(combined: Option<&str>) -> FeatureRow {
    FeatureRow {
        transaction_id: "tx-1".to_string(),
        amount_log: 7.0,
        same_industry: false,
        combined_industries: combined.map(|s| s.to_string()),
    }
}

#[test]
fn classifier_forward_pass_is_deterministic() {
    let scorer = ClassifierScorer::from_artifact(artifact()).unwrap();
    let valid = "Semiconductor Manufacturing <-> Metal Product Manufacturing";
    let mismatch = "Semiconductor Manufacturing <-> Beverage Production";
    for _ in 0..5 {
        assert_eq!(scorer.predict(valid), "Valid");
        assert_eq!(scorer.predict(mismatch), "Mismatch");
    }
}

#[test]
fn classifier_scores_rows_into_match_verdicts() {
    let scorer = ClassifierScorer::from_artifact(artifact()).unwrap();
    let verdict = scorer.score(&features(Some(
        "Semiconductor Manufacturing <-> Metal Product Manufacturing",
    )));
    assert_eq!(verdict.match_verdict, Some(MatchVerdict::Valid));
    assert_eq!(verdict.risk_level, RiskLevel::Low);

    let verdict = scorer.score(&features(Some(
        "Semiconductor Manufacturing <-> Beverage Production",
    )));
    assert_eq!(verdict.match_verdict, Some(MatchVerdict::Mismatch));
    assert_eq!(verdict.risk_level, RiskLevel::High);
}

#[test]
fn missing_industry_label_scores_unknown_without_the_model() {
    let scorer = ClassifierScorer::from_artifact(artifact()).unwrap();
    let verdict = scorer.score(&features(None));
    assert_eq!(verdict.match_verdict, Some(MatchVerdict::Unknown));
    assert_eq!(verdict.reasons, vec!["missing industry label"]);
}

#[test]
fn artifact_with_wrong_features_is_model_unavailable() {
    let mut bad = artifact();
    bad.feature_names_in = vec!["amount_log".to_string()];
    match ClassifierScorer::from_artifact(bad) {
        Err(PipelineError::ModelUnavailable { backend, .. }) => {
            assert_eq!(backend, "classifier");
        }
        other => panic!("expected ModelUnavailable, got {:?}", other.map(|_| ())),
    }
}

#[test]
fn artifact_with_mismatched_shapes_is_model_unavailable() {
    let mut bad = artifact();
    bad.intercepts = vec![0.0, 0.0]; // one row expected for 2 classes
    assert!(matches!(
        ClassifierScorer::from_artifact(bad),
        Err(PipelineError::ModelUnavailable { .. })
    ));

    let mut bad = artifact();
    bad.coefficients = vec![vec![0.1; 3]]; // narrower than the vocabulary
    assert!(matches!(
        ClassifierScorer::from_artifact(bad),
        Err(PipelineError::ModelUnavailable { .. })
    ));
}

#[test]
fn multiclass_artifact_uses_argmax() {
    let vocabulary = HashMap::from([
        ("wheat".to_string(), 0),
        ("farming".to_string(), 1),
        ("beverage".to_string(), 2),
    ]);
    let artifact = ClassifierArtifact {
        feature_names_in: vec!["combined_industries".to_string()],
        classes: vec![
            "Mismatch".to_string(),
            "Unknown".to_string(),
            "Valid".to_string(),
        ],
        vocabulary,
        coefficients: vec![
            vec![-1.0, -1.0, 0.2],
            vec![0.0, 0.0, 0.0],
            vec![1.5, 1.5, 0.1],
        ],
        intercepts: vec![0.1, 0.0, -0.5],
    };
    let scorer = ClassifierScorer::from_artifact(artifact).unwrap();
    assert_eq!(scorer.predict("Wheat Farming <-> Beverage Production"), "Valid");
    assert_eq!(scorer.predict("no known tokens"), "Mismatch");
}
