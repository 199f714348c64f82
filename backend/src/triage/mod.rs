//! Condition → specialty triage
//!
//! Patient records may name a condition instead of a specialty. The triage
//! table resolves such conditions to a specialty label by keyword lookup.
//! This is a labelling heuristic only; no clinical reasoning happens here.
//!
//! # Lookup order
//!
//! 1. The whole condition, lower-cased
//! 2. Each whitespace-separated word, left to right
//!
//! Keywords match in both singular and plural (`s` suffix) form.
//!
//! # Example
//!
//! ```
//! use clinic_simulator_core_rs::triage::TriageTable;
//!
//! let triage = TriageTable::default();
//! assert_eq!(triage.specialty_for("Heart palpitations"), Some("Cardiology"));
//! assert_eq!(triage.specialty_for("fractures"), Some("Orthopedics"));
//! assert_eq!(triage.specialty_for("headache"), None);
//! ```

use std::collections::HashMap;

/// Built-in keyword table
const DEFAULT_KEYWORDS: &[(&str, &str)] = &[
    ("fever", "General"),
    ("flu", "General"),
    ("pain", "General"),
    ("lumbar", "Orthopedics"),
    ("fracture", "Orthopedics"),
    ("cardiac", "Cardiology"),
    ("heart", "Cardiology"),
    ("pulmonary", "Pulmonology"),
    ("asthma", "Pulmonology"),
    ("skin", "Dermatology"),
    ("acne", "Dermatology"),
];

/// Keyword → specialty lookup table
#[derive(Debug, Clone, PartialEq)]
pub struct TriageTable {
    keywords: HashMap<String, String>,
}

impl TriageTable {
    /// Build a table from `(keyword, specialty)` pairs
    ///
    /// Both the singular and plural form of every keyword are registered.
    pub fn from_pairs<K, S>(pairs: impl IntoIterator<Item = (K, S)>) -> Self
    where
        K: AsRef<str>,
        S: AsRef<str>,
    {
        let mut keywords = HashMap::new();
        for (keyword, specialty) in pairs {
            let keyword = keyword.as_ref().trim().to_lowercase();
            if keyword.is_empty() {
                continue;
            }
            let specialty = specialty.as_ref().to_string();

            let alternate = match keyword.strip_suffix('s') {
                Some(singular) if !singular.is_empty() => singular.to_string(),
                _ => format!("{}s", keyword),
            };
            keywords.entry(alternate).or_insert_with(|| specialty.clone());
            keywords.insert(keyword, specialty);
        }
        Self { keywords }
    }

    /// Specialty for a free-text condition, if any keyword matches
    pub fn specialty_for(&self, condition: &str) -> Option<&str> {
        let condition = condition.trim().to_lowercase();
        if let Some(specialty) = self.keywords.get(&condition) {
            return Some(specialty);
        }
        condition
            .split_whitespace()
            .find_map(|word| self.keywords.get(word))
            .map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.keywords.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keywords.is_empty()
    }
}

impl Default for TriageTable {
    fn default() -> Self {
        Self::from_pairs(DEFAULT_KEYWORDS.iter().copied())
    }
}
