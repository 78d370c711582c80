use crate::domain::model::PersistentIdentifier;
use crate::domain::ports::IdentifierParser;
use crate::utils::error::{CorrecterError, Result};
use regex::Regex;
use std::collections::HashMap;
use std::sync::Arc;

pub const DNB_URN_TYPE: &str = "dnbUrn";

/// URN:NBN grammar as issued by the German National Library.
///
/// `urn:nbn:<cc>` followed by one or more non-empty segments, each introduced
/// by `:` or `-`. The namespace and country code match case-insensitively.
/// Check digits are not verified.
pub struct DnbUrnParser {
    pattern: Regex,
}

impl DnbUrnParser {
    pub fn new() -> Self {
        Self {
            pattern: Regex::new(r"^(?i:urn:nbn:[a-z]{2})(?:[:\-][A-Za-z0-9._/]+)+$").unwrap(),
        }
    }
}

impl Default for DnbUrnParser {
    fn default() -> Self {
        Self::new()
    }
}

impl IdentifierParser for DnbUrnParser {
    fn identifier_type(&self) -> &str {
        DNB_URN_TYPE
    }

    fn separator(&self) -> char {
        '-'
    }

    fn parse(&self, raw: &str) -> Option<PersistentIdentifier> {
        self.pattern
            .is_match(raw)
            .then(|| PersistentIdentifier::new(DNB_URN_TYPE, raw))
    }
}

/// Identifier type name to grammar.
#[derive(Clone, Default)]
pub struct GrammarRegistry {
    parsers: HashMap<String, Arc<dyn IdentifierParser>>,
}

impl GrammarRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding every grammar this crate ships.
    pub fn with_builtin() -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(DnbUrnParser::new()));
        registry
    }

    pub fn register(&mut self, parser: Arc<dyn IdentifierParser>) {
        self.parsers
            .insert(parser.identifier_type().to_string(), parser);
    }

    pub fn contains(&self, identifier_type: &str) -> bool {
        self.parsers.contains_key(identifier_type)
    }

    pub fn parser(&self, identifier_type: &str) -> Result<Arc<dyn IdentifierParser>> {
        self.parsers
            .get(identifier_type)
            .cloned()
            .ok_or_else(|| CorrecterError::UnknownIdentifierType {
                identifier_type: identifier_type.to_string(),
            })
    }
}

/// Collapses every run of two or more `separator` characters into one.
pub fn collapse_separators(raw: &str, separator: char) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut previous_was_separator = false;
    for c in raw.chars() {
        let is_separator = c == separator;
        if !(is_separator && previous_was_separator) {
            out.push(c);
        }
        previous_was_separator = is_separator;
    }
    out
}

/// Repairs doubled separators and re-validates against the grammar. Idempotent.
pub fn normalize(raw: &str, parser: &dyn IdentifierParser) -> Result<PersistentIdentifier> {
    let collapsed = collapse_separators(raw, parser.separator());
    parser
        .parse(&collapsed)
        .ok_or_else(|| CorrecterError::MalformedIdentifier {
            value: collapsed,
            identifier_type: parser.identifier_type().to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_normalize_collapses_doubled_separator() {
        let parser = DnbUrnParser::new();
        let urn = normalize("urn:nbn:de--1234--5", &parser).unwrap();
        assert_eq!(urn.as_str(), "urn:nbn:de-1234-5");
        assert_eq!(urn.identifier_type(), DNB_URN_TYPE);
    }

    #[test]
    fn test_normalize_collapses_longer_runs() {
        let parser = DnbUrnParser::new();
        let urn = normalize("urn:nbn:de:gbv:089---332175294-5", &parser).unwrap();
        assert_eq!(urn.as_str(), "urn:nbn:de:gbv:089-332175294-5");
    }

    #[test]
    fn test_normalize_is_idempotent() {
        let parser = DnbUrnParser::new();
        for raw in [
            "urn:nbn:de--1234--5",
            "urn:nbn:de-1234-5",
            "urn:nbn:de:hbz:6----4711",
            "URN:NBN:de:0111-2011040512",
        ] {
            let once = normalize(raw, &parser).unwrap();
            let twice = normalize(once.as_str(), &parser).unwrap();
            assert_eq!(once, twice, "not idempotent for {}", raw);
        }
    }

    #[test]
    fn test_namespace_is_case_insensitive() {
        let parser = DnbUrnParser::new();
        for raw in ["urn:nbn:DE-1234-5", "URN:NBN:De:gbv:089-1", "urn:nbn:de-1234-5"] {
            assert!(parser.parse(raw).is_some(), "{} rejected", raw);
        }
        let urn = normalize("urn:nbn:DE--1234-5", &parser).unwrap();
        assert_eq!(urn.as_str(), "urn:nbn:DE-1234-5");
        assert!(parser.parse("urn:nbn:D3-1234").is_none());
    }

    proptest! {
        #[test]
        fn prop_normalize_is_idempotent(tail in "[a-z0-9:\\-]{0,24}") {
            let parser = DnbUrnParser::new();
            let raw = format!("urn:nbn:de{}", tail);
            if let Ok(once) = normalize(&raw, &parser) {
                prop_assert!(!once.as_str().contains("--"), "{} kept a doubled separator", once);
                let twice = normalize(once.as_str(), &parser).unwrap();
                prop_assert_eq!(once, twice);
            }
        }

        #[test]
        fn prop_collapsed_output_has_no_doubled_separator(raw in "[a-z0-9:\\-]{0,32}") {
            let collapsed = collapse_separators(&raw, '-');
            prop_assert!(!collapsed.contains("--"));
            prop_assert_eq!(collapse_separators(&collapsed, '-'), collapsed);
        }
    }

    #[test]
    fn test_normalize_leaves_colons_alone() {
        let parser = DnbUrnParser::new();
        assert!(matches!(
            normalize("urn:nbn:de::1234", &parser),
            Err(CorrecterError::MalformedIdentifier { .. })
        ));
    }

    #[test]
    fn test_normalize_rejects_non_urn() {
        let parser = DnbUrnParser::new();
        let err = normalize("doi:10.1000--182", &parser).unwrap_err();
        match err {
            CorrecterError::MalformedIdentifier {
                value,
                identifier_type,
            } => {
                assert_eq!(value, "doi:10.1000-182");
                assert_eq!(identifier_type, DNB_URN_TYPE);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_parser_requires_a_segment_after_country_code() {
        let parser = DnbUrnParser::new();
        assert!(parser.parse("urn:nbn:de").is_none());
        assert!(parser.parse("urn:nbn:de-").is_none());
        assert!(parser.parse("urn:nbn:de-1234-5").is_some());
    }

    #[test]
    fn test_registry_lookup() {
        let registry = GrammarRegistry::with_builtin();
        assert!(registry.contains(DNB_URN_TYPE));
        assert!(registry.parser(DNB_URN_TYPE).is_ok());
        assert!(matches!(
            registry.parser("doi"),
            Err(CorrecterError::UnknownIdentifierType { .. })
        ));
    }
}
