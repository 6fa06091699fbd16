//! Counterparty name normalization.
//!
//! Registry queries and the stub heuristic both key on the normalized
//! form, so normalization must be idempotent: normalizing an already
//! normalized name returns it unchanged.

/// Legal-entity suffixes dropped during normalization, compared after
/// punctuation is removed from the word ("S.A." and "SA" both match
/// the SA entry).
const LEGAL_SUFFIXES: &[&str] = &[
    "LTD",
    "LIMITED",
    "PLC",
    "LLC",
    "INC",
    "INCORPORATED",
    "GMBH",
    "SAS",
    "BV",
    "OY",
    "AB",
    "AG",
    "NV",
    "PTY",
    "PTE",
    "KFT",
    "SRL",
    "SL",
    "SA",
];

/// Uppercase, strip legal-entity suffixes by whole-word match,
/// collapse non-alphanumeric characters (except `&`) to spaces, and
/// collapse repeated whitespace.
pub fn normalize_company_name(name: &str) -> String {
    let mut words: Vec<String> = Vec::new();
    for token in name.trim().to_uppercase().split_whitespace() {
        let cleaned: String = token
            .chars()
            .map(|c| {
                if c.is_alphanumeric() || c == '&' {
                    c
                } else {
                    ' '
                }
            })
            .collect();
        let parts: Vec<&str> = cleaned.split_whitespace().collect();

        // A dotted suffix ("S.A.", "L.T.D.") splits into fragments;
        // match the whole token with punctuation removed first.
        let joined: String = parts.concat();
        if LEGAL_SUFFIXES.contains(&joined.as_str()) {
            continue;
        }
        for part in parts {
            if !LEGAL_SUFFIXES.contains(&part) {
                words.push(part.to_string());
            }
        }
    }
    words.join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uppercases_and_strips_suffix() {
        assert_eq!(normalize_company_name("Acme Ltd"), "ACME");
        assert_eq!(normalize_company_name("acme limited"), "ACME");
        assert_eq!(normalize_company_name("Acme Holdings PLC"), "ACME HOLDINGS");
    }

    #[test]
    fn strips_dotted_suffixes() {
        assert_eq!(normalize_company_name("Grupo Acme S.A."), "GRUPO ACME");
        assert_eq!(normalize_company_name("Acme Inc."), "ACME");
    }

    #[test]
    fn suffix_match_is_whole_word_only() {
        // "INCREDIBLE" contains "INC" but is not a suffix.
        assert_eq!(
            normalize_company_name("Incredible Machines"),
            "INCREDIBLE MACHINES"
        );
        assert_eq!(normalize_company_name("Salta Trading"), "SALTA TRADING");
    }

    #[test]
    fn collapses_punctuation_but_keeps_ampersand() {
        assert_eq!(
            normalize_company_name("Smith & Sons (Holdings), Ltd"),
            "SMITH & SONS HOLDINGS"
        );
        assert_eq!(normalize_company_name("A.B.C-Trading"), "A B C TRADING");
    }

    #[test]
    fn collapses_repeated_whitespace() {
        assert_eq!(normalize_company_name("  Acme    Corp Trading  "), "ACME CORP TRADING");
    }

    #[test]
    fn normalization_is_idempotent() {
        let inputs = [
            "Grupo Acme S.A.",
            "Smith & Sons (Holdings), Ltd",
            "  Tesco   Stores Limited ",
            "Incredible Machines",
            "",
        ];
        for input in inputs {
            let once = normalize_company_name(input);
            let twice = normalize_company_name(&once);
            assert_eq!(once, twice, "not idempotent for {input:?}");
        }
    }

    #[test]
    fn empty_and_suffix_only_names_normalize_to_empty() {
        assert_eq!(normalize_company_name(""), "");
        assert_eq!(normalize_company_name("Ltd"), "");
    }
}
