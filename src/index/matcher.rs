//! Reference identifier detection.

use std::collections::BTreeSet;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// A named identifier pattern.
///
/// Patterns are compiled case-insensitively; matches are reported in upper
/// case.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatternFamily {
    /// Family name, used in diagnostics
    pub name: String,

    /// Regular expression for one identifier
    pub pattern: String,
}

impl PatternFamily {
    /// Create a pattern family.
    pub fn new(name: impl Into<String>, pattern: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            pattern: pattern.into(),
        }
    }

    /// The built-in families: case-record codes and evidence numbers.
    ///
    /// Every pattern is bounded by `\b` so evidence numbers are not picked out
    /// of the middle of a longer code (`P-0001` inside `CAR-OTP-0001-0023`).
    pub fn defaults() -> Vec<Self> {
        vec![
            Self::new("CAR-OTP", r"\bCAR-OTP-\d+-\d+(?:-R\d+)?\b"),
            Self::new("CAR-D", r"\bCAR-D\d+-\d+-\d+(?:-R\d+)?\b"),
            Self::new("CAR-V", r"\bCAR-V\d+-\d+-\d+(?:-R\d+)?\b"),
            Self::new("CAR-General", r"\bCAR-[A-Z]+\d*-\d+-\d+(?:-R\d+)?\b"),
            Self::new("CAR-Extended", r"\bCAR-[A-Z]{2,}-\d+-\d+(?:-R\d+)?\b"),
            Self::new("P-Evidence", r"\bP-\d+\b"),
            Self::new("D-Evidence", r"\bD-\d+\b"),
            Self::new("V-Evidence", r"\bV-\d+\b"),
        ]
    }
}

/// A set of pattern families as stored in a patterns file.
///
/// ```json
/// { "families": [ { "name": "Exhibit", "pattern": "\\bEXH-\\d+\\b" } ] }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatternSet {
    /// The families in the file
    pub families: Vec<PatternFamily>,
}

impl PatternSet {
    /// Load a patterns file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let reader = BufReader::new(File::open(path)?);
        Ok(serde_json::from_reader(reader)?)
    }
}

/// Scans text blocks for every registered identifier family.
///
/// Families are independent: a block's result is the union of all their
/// matches, upper-cased and deduplicated.
#[derive(Debug, Clone)]
pub struct ReferenceMatcher {
    families: Vec<(String, Regex)>,
}

impl ReferenceMatcher {
    /// Compile the built-in families.
    pub fn new() -> Result<Self> {
        Self::from_families(&PatternFamily::defaults())
    }

    /// Compile a custom registry.
    ///
    /// Fails on the first family whose pattern does not compile.
    pub fn from_families(families: &[PatternFamily]) -> Result<Self> {
        let compiled = families
            .iter()
            .map(|family| {
                RegexBuilder::new(&family.pattern)
                    .case_insensitive(true)
                    .build()
                    .map(|re| (family.name.clone(), re))
                    .map_err(|source| Error::InvalidPattern {
                        family: family.name.clone(),
                        source,
                    })
            })
            .collect::<Result<Vec<_>>>()?;

        if compiled.is_empty() {
            log::warn!("Reference matcher has no pattern families; nothing will be indexed");
        }

        Ok(Self { families: compiled })
    }

    /// Names of the registered families, in registration order.
    pub fn family_names(&self) -> impl Iterator<Item = &str> {
        self.families.iter().map(|(name, _)| name.as_str())
    }

    /// Check whether any family matches anywhere in `text`.
    pub fn is_match(&self, text: &str) -> bool {
        self.families.iter().any(|(_, re)| re.is_match(text))
    }

    /// All canonical identifiers in `block`.
    pub fn find(&self, block: &str) -> BTreeSet<String> {
        let mut found = BTreeSet::new();
        for (_, re) in &self.families {
            for m in re.find_iter(block) {
                found.insert(m.as_str().to_uppercase());
            }
        }
        found
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(items: &[&str]) -> BTreeSet<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_case_folding_and_dedup() {
        let matcher = ReferenceMatcher::new().unwrap();
        let found =
            matcher.find("See CAR-OTP-0001-0023 and car-otp-0001-0023 duplicated, also P-100.");
        assert_eq!(found, set(&["CAR-OTP-0001-0023", "P-100"]));
    }

    #[test]
    fn test_revision_suffix() {
        let matcher = ReferenceMatcher::new().unwrap();
        let found = matcher.find("Filed as CAR-D29-0001-0001-R02 on the record.");
        assert_eq!(found, set(&["CAR-D29-0001-0001-R02"]));
    }

    #[test]
    fn test_families_union() {
        let matcher = ReferenceMatcher::new().unwrap();
        let found = matcher.find(
            "Exhibits CAR-V45-0002-0010, CAR-ICC-0003-0004, D-17 and v-3 were admitted.",
        );
        assert_eq!(
            found,
            set(&["CAR-ICC-0003-0004", "CAR-V45-0002-0010", "D-17", "V-3"])
        );
    }

    #[test]
    fn test_no_evidence_number_inside_codes() {
        let matcher = ReferenceMatcher::new().unwrap();
        let found = matcher.find("CAR-OTP-0004-0567");
        assert_eq!(found, set(&["CAR-OTP-0004-0567"]));
        assert!(matcher.find("APP-12 and XP-9").is_empty());
    }

    #[test]
    fn test_no_match() {
        let matcher = ReferenceMatcher::new().unwrap();
        assert!(matcher.find("Nothing to see here.").is_empty());
        assert!(!matcher.is_match("Nothing to see here."));
        assert!(matcher.is_match("see p-1"));
    }

    #[test]
    fn test_invalid_pattern_is_fatal() {
        let families = vec![
            PatternFamily::new("Good", r"\bX-\d+\b"),
            PatternFamily::new("Broken", r"CAR-(\d+"),
        ];
        match ReferenceMatcher::from_families(&families) {
            Err(Error::InvalidPattern { family, .. }) => assert_eq!(family, "Broken"),
            other => panic!("expected InvalidPattern, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn test_custom_family() {
        let matcher =
            ReferenceMatcher::from_families(&[PatternFamily::new("Exhibit", r"\bEXH-\d+\b")])
                .unwrap();
        assert_eq!(matcher.family_names().collect::<Vec<_>>(), vec!["Exhibit"]);
        assert_eq!(matcher.find("see exh-4"), set(&["EXH-4"]));
    }

    #[test]
    fn test_pattern_set_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("patterns.json");
        std::fs::write(
            &path,
            r#"{"families":[{"name":"Exhibit","pattern":"\\bEXH-\\d+\\b"}]}"#,
        )
        .unwrap();
        let loaded = PatternSet::load(&path).unwrap();
        assert_eq!(
            loaded.families,
            vec![PatternFamily::new("Exhibit", r"\bEXH-\d+\b")]
        );
    }
}
