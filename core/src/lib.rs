//! screening-core — counterparty-risk screening pipeline.
//!
//! A five-stage batch pipeline over transaction CSVs: extract and
//! validate, enrich counterparties with industry profiles, build
//! prompts or engineered features, score through exactly one of three
//! backends (generative model, text classifier, rule table), and
//! persist the scored table with its aggregate summaries.

pub mod classifier_scorer;
pub mod config;
pub mod enrich;
pub mod error;
pub mod extract;
pub mod features;
pub mod llm_scorer;
pub mod name_norm;
pub mod pipeline;
pub mod prompt;
pub mod registry;
pub mod report;
pub mod rule_scorer;
pub mod scorer;
pub mod table;
pub mod types;
pub mod verdict;
