//! Corporate-registry enrichment: company profiles, the external
//! lookup seam, and the stub fallback.
//!
//! Lookup failures never leave this module as errors. Transient
//! failures are retried with bounded exponential backoff; anything
//! that still fails degrades to a stub profile so one unreachable
//! counterparty never aborts a batch.

use crate::{config::RegistryConfig, name_norm::normalize_company_name};
use serde::Deserialize;
use std::{thread, time::Duration};
use thiserror::Error;

// ── Profiles ─────────────────────────────────────────────────────────────────

/// Where a profile's classification data came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProfileSource {
    /// Local heuristic; no registry answer was available.
    Stub,
    /// Backed by a real registry lookup.
    Registry,
}

impl ProfileSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProfileSource::Stub => "stub",
            ProfileSource::Registry => "registry",
        }
    }
}

/// One profile per distinct counterparty name per batch. Never
/// persisted on its own — it exists to be joined onto transaction
/// rows.
#[derive(Debug, Clone, PartialEq)]
pub struct CompanyProfile {
    pub input_name: String,
    pub canonical_name: String,
    pub jurisdiction: Option<String>,
    pub registry_url: Option<String>,
    /// Four-digit UK-style code.
    pub sic: Option<String>,
    /// Four-digit EU-style code.
    pub nace: Option<String>,
    /// Six-digit North-American code.
    pub naics: Option<String>,
    pub industry_label: Option<String>,
    pub source: ProfileSource,
}

impl CompanyProfile {
    /// First available classification code in sic → nace → naics
    /// priority order. Used by the feature builder's same-industry
    /// flag.
    pub fn classification_key(&self) -> Option<&str> {
        self.sic
            .as_deref()
            .or(self.nace.as_deref())
            .or(self.naics.as_deref())
    }
}

// ── Lookup seam ──────────────────────────────────────────────────────────────

/// Registry failure taxonomy. Transient classes are retried; permanent
/// classes fall straight through to the stub.
#[derive(Error, Debug)]
pub enum LookupError {
    #[error("transient registry failure: {0}")]
    Transient(String),
    #[error("permanent registry failure: {0}")]
    Permanent(String),
}

/// One registry search per normalized name. Implementations are
/// blocking; calls happen one at a time.
pub trait RegistryLookup {
    fn search(&self, normalized_name: &str) -> Result<Option<RegistryCompany>, LookupError>;
}

/// The company shape returned by an OpenCorporates-style registry.
#[derive(Debug, Clone, Deserialize)]
pub struct RegistryCompany {
    pub name: Option<String>,
    pub jurisdiction_code: Option<String>,
    pub opencorporates_url: Option<String>,
    #[serde(default)]
    pub industry_codes: Vec<IndustryCodeEntry>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct IndustryCodeEntry {
    pub industry_code: IndustryCode,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct IndustryCode {
    pub code: Option<String>,
    pub description: Option<String>,
    #[serde(default)]
    pub industry_code_scheme_name: String,
}

#[derive(Debug, Default, Deserialize)]
struct SearchEnvelope {
    #[serde(default)]
    results: SearchResults,
}

#[derive(Debug, Default, Deserialize)]
struct SearchResults {
    #[serde(default)]
    companies: Vec<CompanyEnvelope>,
}

#[derive(Debug, Deserialize)]
struct CompanyEnvelope {
    company: RegistryCompany,
}

// ── HTTP client ──────────────────────────────────────────────────────────────

pub struct HttpRegistryClient {
    http: reqwest::blocking::Client,
    base_url: String,
    api_token: String,
}

impl HttpRegistryClient {
    pub fn new(cfg: &RegistryConfig, api_token: String) -> anyhow::Result<Self> {
        let http = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(cfg.timeout_secs))
            .build()?;
        Ok(Self {
            http,
            base_url: cfg.base_url.trim_end_matches('/').to_string(),
            api_token,
        })
    }
}

impl RegistryLookup for HttpRegistryClient {
    fn search(&self, normalized_name: &str) -> Result<Option<RegistryCompany>, LookupError> {
        let url = format!("{}/companies/search", self.base_url);
        let response = self
            .http
            .get(&url)
            .query(&[("q", normalized_name), ("api_token", self.api_token.as_str())])
            .send()
            .map_err(|e| LookupError::Transient(e.to_string()))?;

        let status = response.status();
        if status.is_server_error() || status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(LookupError::Transient(format!("HTTP {status}")));
        }
        if status.is_client_error() {
            return Err(LookupError::Permanent(format!("HTTP {status}")));
        }

        let envelope: SearchEnvelope = response
            .json()
            .map_err(|e| LookupError::Permanent(format!("malformed registry body: {e}")))?;
        Ok(envelope
            .results
            .companies
            .into_iter()
            .next()
            .map(|c| c.company))
    }
}

// ── Resolution ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub backoff_base: Duration,
    pub backoff_cap: Duration,
}

impl RetryPolicy {
    fn delay(&self, attempt: u32) -> Duration {
        let exp = self
            .backoff_base
            .saturating_mul(1u32 << attempt.saturating_sub(1).min(16));
        exp.min(self.backoff_cap)
    }
}

/// Resolves raw counterparty names into profiles. Holds the lookup
/// client by reference — dependencies are constructed per run and
/// passed in, never held as process-wide state.
pub struct ProfileResolver<'a> {
    lookup: Option<&'a dyn RegistryLookup>,
    retry: RetryPolicy,
}

impl<'a> ProfileResolver<'a> {
    /// `lookup` is None when no registry credentials are configured;
    /// every name then resolves to a stub without touching the
    /// network.
    pub fn new(lookup: Option<&'a dyn RegistryLookup>, retry: RetryPolicy) -> Self {
        Self { lookup, retry }
    }

    pub fn uses_network(&self) -> bool {
        self.lookup.is_some()
    }

    /// Never fails: any lookup outcome that is not a usable registry
    /// answer degrades to the stub profile.
    pub fn resolve(&self, raw_name: &str) -> CompanyProfile {
        let normalized = normalize_company_name(raw_name);
        let Some(lookup) = self.lookup else {
            return stub_profile(raw_name, &normalized);
        };
        match self.search_with_retry(lookup, &normalized) {
            Ok(Some(company)) => profile_from_registry(raw_name, company),
            Ok(None) => {
                log::debug!("no registry match for '{normalized}', using stub");
                stub_profile(raw_name, &normalized)
            }
            Err(e) => {
                log::warn!("registry lookup for '{normalized}' degraded to stub: {e}");
                stub_profile(raw_name, &normalized)
            }
        }
    }

    fn search_with_retry(
        &self,
        lookup: &dyn RegistryLookup,
        normalized: &str,
    ) -> Result<Option<RegistryCompany>, LookupError> {
        let mut attempt = 1;
        loop {
            match lookup.search(normalized) {
                Err(LookupError::Transient(msg)) if attempt < self.retry.max_attempts => {
                    let wait = self.retry.delay(attempt);
                    log::debug!(
                        "transient registry failure for '{normalized}' \
                         (attempt {attempt}/{}): {msg}; retrying in {wait:?}",
                        self.retry.max_attempts
                    );
                    if !wait.is_zero() {
                        thread::sleep(wait);
                    }
                    attempt += 1;
                }
                other => return other,
            }
        }
    }
}

/// Extract the first code per scheme. The industry label comes from
/// whichever scheme yields a code first in sic → nace → naics order.
fn profile_from_registry(raw_name: &str, company: RegistryCompany) -> CompanyProfile {
    let mut sic: Option<(String, Option<String>)> = None;
    let mut nace: Option<(String, Option<String>)> = None;
    let mut naics: Option<(String, Option<String>)> = None;

    for entry in &company.industry_codes {
        let ic = &entry.industry_code;
        let Some(code) = ic.code.clone() else {
            continue;
        };
        let scheme = ic.industry_code_scheme_name.to_lowercase();
        let slot = if scheme.contains("naics") {
            &mut naics
        } else if scheme.contains("nace") {
            &mut nace
        } else if scheme.contains("sic") {
            &mut sic
        } else {
            continue;
        };
        if slot.is_none() {
            *slot = Some((code, ic.description.clone()));
        }
    }

    let industry_label = [&sic, &nace, &naics]
        .into_iter()
        .flatten()
        .find_map(|(_, desc)| desc.clone());

    let canonical_name = company
        .name
        .clone()
        .unwrap_or_else(|| raw_name.to_string());

    CompanyProfile {
        input_name: raw_name.to_string(),
        canonical_name,
        jurisdiction: company.jurisdiction_code,
        registry_url: company.opencorporates_url,
        sic: sic.map(|(code, _)| code),
        nace: nace.map(|(code, _)| code),
        naics: naics.map(|(code, _)| code),
        industry_label,
        source: ProfileSource::Registry,
    }
}

// ── Stub fallback ────────────────────────────────────────────────────────────

/// Heuristic keyed on the first word of the normalized name:
/// (first word, NACE code, industry label).
const STUB_HEURISTICS: &[(&str, &str, &str)] = &[
    ("SHELL", "4731", "Wholesale of fuel"),
    ("TESCO", "4711", "Supermarkets"),
    ("MICROSOFT", "6201", "Software development"),
    ("APPLE", "4651", "Wholesale of computers"),
    ("AMAZON", "4791", "E-commerce"),
];

pub fn stub_profile(raw_name: &str, normalized: &str) -> CompanyProfile {
    let first_word = normalized.split(' ').next().unwrap_or("");
    let hit = STUB_HEURISTICS.iter().find(|(word, _, _)| *word == first_word);
    CompanyProfile {
        input_name: raw_name.to_string(),
        canonical_name: raw_name.to_string(),
        jurisdiction: None,
        registry_url: None,
        sic: None,
        nace: hit.map(|(_, code, _)| code.to_string()),
        naics: None,
        industry_label: hit.map(|(_, _, label)| label.to_string()),
        source: ProfileSource::Stub,
    }
}
