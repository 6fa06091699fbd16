//! Enrichment stage tests.
//!
//! Tests cover: lookup deduplication across roles, the retry taxonomy
//! (transient retries then degrades, permanent degrades immediately),
//! registry code extraction, and the stub heuristic.

use screening_core::{
    enrich::enrich,
    extract::{TransactionBatch, TransactionRecord},
    registry::{
        CompanyProfile, IndustryCode, IndustryCodeEntry, LookupError, ProfileResolver,
        ProfileSource, RegistryCompany, RegistryLookup, RetryPolicy,
    },
};
use std::cell::RefCell;
use std::collections::HashMap;
use std::time::Duration;

fn record(id: &str, orig: &str, bene: &str) -> TransactionRecord {
    TransactionRecord {
        transaction_id: id.to_string(),
        originator_name: orig.to_string(),
        beneficiary_name: bene.to_string(),
        amount: 1000.0,
        currency: "EUR".to_string(),
        value_date: "2024-03-01".to_string(),
        originator_country: "GB".to_string(),
        beneficiary_country: "DE".to_string(),
        purpose: "goods".to_string(),
        extras: Vec::new(),
    }
}

fn batch(records: Vec<TransactionRecord>) -> TransactionBatch {
    TransactionBatch {
        records,
        extra_columns: Vec::new(),
    }
}

fn no_backoff() -> RetryPolicy {
    RetryPolicy {
        max_attempts: 3,
        backoff_base: Duration::ZERO,
        backoff_cap: Duration::ZERO,
    }
}

/// Scripted registry double: answers from a fixed map and records
/// every search it receives.
struct FakeRegistry {
    calls: RefCell<Vec<String>>,
    companies: HashMap<String, RegistryCompany>,
    failure: Option<fn() -> LookupError>,
}

impl FakeRegistry {
    fn with_companies(companies: HashMap<String, RegistryCompany>) -> Self {
        Self {
            calls: RefCell::new(Vec::new()),
            companies,
            failure: None,
        }
    }

    fn always_failing(failure: fn() -> LookupError) -> Self {
        Self {
            calls: RefCell::new(Vec::new()),
            companies: HashMap::new(),
            failure: Some(failure),
        }
    }

    fn call_count(&self) -> usize {
        self.calls.borrow().len()
    }
}

impl RegistryLookup for FakeRegistry {
    fn search(&self, normalized_name: &str) -> Result<Option<RegistryCompany>, LookupError> {
        self.calls.borrow_mut().push(normalized_name.to_string());
        if let Some(failure) = self.failure {
            return Err(failure());
        }
        Ok(self.companies.get(normalized_name).cloned())
    }
}

fn company(name: &str, codes: Vec<(&str, &str, &str)>) -> RegistryCompany {
    RegistryCompany {
        name: Some(name.to_string()),
        jurisdiction_code: Some("gb".to_string()),
        opencorporates_url: None,
        industry_codes: codes
            .into_iter()
            .map(|(scheme, code, description)| IndustryCodeEntry {
                industry_code: IndustryCode {
                    code: Some(code.to_string()),
                    description: Some(description.to_string()),
                    industry_code_scheme_name: scheme.to_string(),
                },
            })
            .collect(),
    }
}

#[test]
fn lookups_equal_distinct_names_not_transactions() {
    // 100 transactions over 5 distinct counterparties → exactly 5
    // lookups.
    let names = ["Acme Ltd", "Globex GmbH", "Initech Inc", "Umbrella PLC", "Hooli LLC"];
    let records: Vec<TransactionRecord> = (0..100)
        .map(|i| {
            record(
                &format!("tx-{i}"),
                names[i % names.len()],
                names[(i + 1) % names.len()],
            )
        })
        .collect();

    let registry = FakeRegistry::with_companies(HashMap::new());
    let resolver = ProfileResolver::new(Some(&registry), no_backoff());
    let enriched = enrich(batch(records), &resolver, Duration::ZERO);

    assert_eq!(registry.call_count(), 5);
    assert_eq!(enriched.distinct_counterparties, 5);
    assert_eq!(enriched.rows.len(), 100);
}

#[test]
fn transient_failure_retries_to_the_ceiling_then_degrades_to_stub() {
    let registry =
        FakeRegistry::always_failing(|| LookupError::Transient("HTTP 503".to_string()));
    let resolver = ProfileResolver::new(Some(&registry), no_backoff());

    let profile = resolver.resolve("Acme Ltd");
    assert_eq!(registry.call_count(), 3, "one call per attempt");
    assert_eq!(profile.source, ProfileSource::Stub);
}

#[test]
fn permanent_failure_degrades_immediately_without_retry() {
    let registry =
        FakeRegistry::always_failing(|| LookupError::Permanent("HTTP 403".to_string()));
    let resolver = ProfileResolver::new(Some(&registry), no_backoff());

    let profile = resolver.resolve("Acme Ltd");
    assert_eq!(registry.call_count(), 1);
    assert_eq!(profile.source, ProfileSource::Stub);
}

#[test]
fn registry_answer_takes_first_code_per_scheme_with_sic_label_priority() {
    let companies = HashMap::from([(
        "ACME".to_string(),
        company(
            "ACME HOLDINGS LIMITED",
            vec![
                // NAICS listed first, but the label must come from the
                // SIC entry — sic → nace → naics priority.
                ("US NAICS 2017", "334413", "Semiconductor Device Manufacturing"),
                ("UK SIC Classification 2007", "2611", "Manufacture of electronic components"),
                ("UK SIC Classification 2007", "9999", "Second SIC entry, ignored"),
            ],
        ),
    )]);
    let registry = FakeRegistry::with_companies(companies);
    let resolver = ProfileResolver::new(Some(&registry), no_backoff());

    let profile = resolver.resolve("Acme Ltd");
    assert_eq!(profile.source, ProfileSource::Registry);
    assert_eq!(profile.canonical_name, "ACME HOLDINGS LIMITED");
    assert_eq!(profile.sic.as_deref(), Some("2611"));
    assert_eq!(profile.naics.as_deref(), Some("334413"));
    assert_eq!(profile.nace, None);
    assert_eq!(
        profile.industry_label.as_deref(),
        Some("Manufacture of electronic components")
    );
}

#[test]
fn no_registry_match_falls_back_to_first_word_heuristic() {
    let registry = FakeRegistry::with_companies(HashMap::new());
    let resolver = ProfileResolver::new(Some(&registry), no_backoff());

    let profile = resolver.resolve("Tesco Stores Ltd");
    assert_eq!(profile.source, ProfileSource::Stub);
    assert_eq!(profile.nace.as_deref(), Some("4711"));
    assert_eq!(profile.industry_label.as_deref(), Some("Supermarkets"));

    let unmatched = resolver.resolve("Wayne Enterprises");
    assert_eq!(unmatched.source, ProfileSource::Stub);
    assert_eq!(unmatched.nace, None);
    assert_eq!(unmatched.industry_label, None);
}

#[test]
fn no_credentials_means_no_network_at_all() {
    let resolver = ProfileResolver::new(None, no_backoff());
    let profile = resolver.resolve("Microsoft Ireland Operations Ltd");
    assert_eq!(profile.source, ProfileSource::Stub);
    assert_eq!(profile.industry_label.as_deref(), Some("Software development"));
}

#[test]
fn profiles_are_joined_onto_every_row_by_role() {
    let companies = HashMap::from([
        ("ACME".to_string(), company("ACME", vec![("UK SIC", "2611", "Semiconductors")])),
        ("GLOBEX".to_string(), company("GLOBEX", vec![("UK SIC", "2410", "Metals")])),
    ]);
    let registry = FakeRegistry::with_companies(companies);
    let resolver = ProfileResolver::new(Some(&registry), no_backoff());

    let records = vec![
        record("tx-1", "Acme Ltd", "Globex GmbH"),
        record("tx-2", "Globex GmbH", "Acme Ltd"),
    ];
    let enriched = enrich(batch(records), &resolver, Duration::ZERO);

    assert_eq!(enriched.rows[0].originator.industry_label.as_deref(), Some("Semiconductors"));
    assert_eq!(enriched.rows[0].beneficiary.industry_label.as_deref(), Some("Metals"));
    // Same profiles, swapped roles.
    assert_eq!(enriched.rows[1].originator.industry_label.as_deref(), Some("Metals"));
    assert_eq!(enriched.rows[1].beneficiary.industry_label.as_deref(), Some("Semiconductors"));
}

#[test]
fn classification_key_prefers_sic_then_nace_then_naics() {
    let profile = CompanyProfile {
        input_name: "X".to_string(),
        canonical_name: "X".to_string(),
        jurisdiction: None,
        registry_url: None,
        sic: None,
        nace: Some("4711".to_string()),
        naics: Some("445110".to_string()),
        industry_label: None,
        source: ProfileSource::Registry,
    };
    assert_eq!(profile.classification_key(), Some("4711"));
}
