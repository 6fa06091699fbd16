//! Shared primitive types used across the entire pipeline.

/// The canonical run identifier (uuid v4, assigned when a run starts).
pub type RunId = String;

/// The two sides of a transaction. Profile columns are prefixed with
/// the role name (`originator_*`, `beneficiary_*`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Originator,
    Beneficiary,
}

impl Role {
    pub fn prefix(&self) -> &'static str {
        match self {
            Role::Originator => "originator",
            Role::Beneficiary => "beneficiary",
        }
    }
}
